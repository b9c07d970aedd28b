pub mod duration;
pub mod inventory;
pub mod pricing;
pub mod status;

pub use duration::{duration_minutes_or_default, parse_duration_minutes, DurationError};
pub use inventory::{BookingSession, SeatError, SeatInventory, SeatKey, SeatLayout, SeatMap, SeatState};
pub use pricing::{BookingQuote, FareCalculator, FareConfig, FareError, FareRequest};
pub use status::{FlightStatus, LifecycleRules, ScheduleWithStatus, StatusBatch, StatusEngine};
