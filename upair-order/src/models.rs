use serde::{Deserialize, Serialize};
use upair_catalog::{FareError, FlightStatus, SeatError};
use upair_core::{BookingStatus, PaymentMethod, SeatClass, TripType};

/// What the passenger filled in besides seats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDraft {
    pub passenger_username: String,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub seat_class: SeatClass,
    pub voucher_code: Option<String>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Schedule {schedule_id} is not bookable ({status})")]
    NotBookable {
        schedule_id: String,
        status: FlightStatus,
    },

    #[error("A booking needs at least one passenger")]
    InvalidPassengerCount,

    #[error("Seats selected for {selected} of {required} passenger(s)")]
    IncompleteSelection { selected: usize, required: u32 },

    #[error("No return flight from {origin} to {destination}")]
    NoReturnFlight { origin: String, destination: String },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Invalid booking status transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error(transparent)]
    Seat(#[from] SeatError),

    #[error(transparent)]
    Fare(#[from] FareError),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl BookingError {
    pub(crate) fn repository(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        BookingError::Repository(e.to_string())
    }
}
