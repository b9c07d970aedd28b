pub mod models;
pub mod pii;

pub use models::events::{ScheduleRetiredEvent, SeatsCommittedEvent};
pub use pii::Masked;
