use crate::booking::{Booking, BookingStatus};
use crate::flight::{FlightCatalogEntry, FlightOffer};
use crate::schedule::ScheduleInstance;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use uuid::Uuid;

pub type RepositoryResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Read access to the flight catalog
#[async_trait]
pub trait FlightCatalog: Send + Sync {
    async fn get_flight_by_code(&self, flight_code: &str) -> RepositoryResult<Option<FlightCatalogEntry>>;

    async fn get_offer(&self, flight_code: &str) -> RepositoryResult<Option<FlightOffer>>;
}

/// Schedule listing owned by the scheduling side of the application
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn list_schedules(&self) -> RepositoryResult<Vec<ScheduleInstance>>;

    async fn get_schedule(&self, schedule_id: &str) -> RepositoryResult<Option<ScheduleInstance>>;

    /// Returns `false` when no instance with that id existed.
    async fn delete_schedule(&self, schedule_id: &str) -> RepositoryResult<bool>;
}

/// Committed seat labels for a flight instance, across all non-cancelled bookings
#[async_trait]
pub trait SeatLedger: Send + Sync {
    async fn reserved_seats(
        &self,
        flight_code: &str,
        departure_date: NaiveDate,
    ) -> RepositoryResult<HashSet<String>>;
}

/// Booking persistence
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn save_booking(&self, booking: &Booking) -> RepositoryResult<()>;

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>>;

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> RepositoryResult<()>;

    async fn list_bookings(&self, passenger_username: &str) -> RepositoryResult<Vec<Booking>>;
}
