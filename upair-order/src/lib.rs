mod lookup;

pub mod manager;
pub mod models;
pub mod sweep;

pub use manager::BookingManager;
pub use models::{BookingDraft, BookingError};
pub use sweep::{RetirementSweep, SweepError, SweepReport};
