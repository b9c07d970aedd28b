use crate::{CoreError, CoreResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One dated occurrence of a catalog flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleInstance {
    pub schedule_id: String,
    #[serde(default)]
    pub airline: String,
    pub flight_code: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
}

impl ScheduleInstance {
    pub fn departure_instant(&self) -> NaiveDateTime {
        self.departure_date.and_time(self.departure_time)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.schedule_id.trim().is_empty() || self.flight_code.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "schedule id and flight code are required".to_string(),
            ));
        }
        if self.origin.trim().eq_ignore_ascii_case(self.destination.trim()) {
            return Err(CoreError::ValidationError(format!(
                "schedule {} departs and arrives at {}",
                self.schedule_id, self.origin
            )));
        }
        Ok(())
    }
}
