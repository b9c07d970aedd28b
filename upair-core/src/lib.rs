pub mod booking;
pub mod clock;
pub mod flight;
pub mod repository;
pub mod schedule;
pub mod search;

pub use booking::{Booking, BookingStatus, PaymentMethod, ReturnLeg, SeatAssignment, TripType};
pub use clock::{Clock, FixedClock, SystemClock};
pub use flight::{CabinClass, FlightCatalogEntry, FlightOffer, SeatClass};
pub use schedule::ScheduleInstance;
pub use search::ScheduleQuery;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Catalog entry missing for flight {0}")]
    CatalogEntryMissing(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
