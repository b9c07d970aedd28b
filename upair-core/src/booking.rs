use crate::flight::SeatClass;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status as tracked by the booking desk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Cash booking waiting for payment at the counter.
    PayAtCounter,
    Confirmed,
    /// Passenger asked to cancel, pending admin approval.
    CancelRequested,
    Cancelled,
}

impl BookingStatus {
    /// Every status except `Cancelled` keeps its seats out of the free pool.
    pub fn holds_seats(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Allowed moves: payment received at the counter, a cancellation
    /// request from either open state, and the admin's answer to it.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (PayAtCounter, Confirmed)
                | (PayAtCounter, CancelRequested)
                | (Confirmed, CancelRequested)
                | (CancelRequested, Cancelled)
                | (CancelRequested, Confirmed)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    PayPal,
}

impl PaymentMethod {
    /// Online payments are confirmed immediately; cash waits for the counter.
    pub fn initial_status(&self) -> BookingStatus {
        match self {
            PaymentMethod::Cash => BookingStatus::PayAtCounter,
            _ => BookingStatus::Confirmed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
}

/// A seat label bound to the passenger who will sit there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatAssignment {
    pub seat_label: String,
    pub passenger_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReturnLeg {
    pub schedule_id: String,
    pub flight_code: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
}

/// The fields a booking must carry when handed to the persistence collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub passenger_username: String,
    pub trip_type: TripType,
    pub schedule_id: String,
    pub flight_code: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub return_leg: Option<ReturnLeg>,
    pub adults: u32,
    pub minors: u32,
    pub seats: Vec<SeatAssignment>,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub seat_class: SeatClass,
    pub voucher_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn passenger_count(&self) -> u32 {
        self.adults.saturating_add(self.minors)
    }

    pub fn seat_labels(&self) -> Vec<&str> {
        self.seats.iter().map(|s| s.seat_label.as_str()).collect()
    }

    pub fn passenger_names(&self) -> Vec<&str> {
        self.seats.iter().map(|s| s.passenger_name.as_str()).collect()
    }

    /// Update booking status
    pub fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status_from_payment_method() {
        assert_eq!(PaymentMethod::Cash.initial_status(), BookingStatus::PayAtCounter);
        assert_eq!(PaymentMethod::CreditCard.initial_status(), BookingStatus::Confirmed);
        assert_eq!(PaymentMethod::PayPal.initial_status(), BookingStatus::Confirmed);
    }

    #[test]
    fn test_only_cancelled_bookings_release_seats() {
        assert!(BookingStatus::PayAtCounter.holds_seats());
        assert!(BookingStatus::Confirmed.holds_seats());
        assert!(BookingStatus::CancelRequested.holds_seats());
        assert!(!BookingStatus::Cancelled.holds_seats());
    }

    #[test]
    fn test_status_transitions() {
        use BookingStatus::*;
        assert!(PayAtCounter.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(CancelRequested));
        assert!(CancelRequested.can_transition_to(Cancelled));
        assert!(CancelRequested.can_transition_to(Confirmed));

        assert!(!Confirmed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(PayAtCounter));
    }
}
