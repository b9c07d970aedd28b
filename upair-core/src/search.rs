use crate::schedule::ScheduleInstance;
use chrono::NaiveDate;
use serde::Deserialize;

/// Filters for the schedule listing. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<NaiveDate>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl ScheduleQuery {
    pub fn matches(&self, schedule: &ScheduleInstance) -> bool {
        if let Some(date) = self.date {
            if schedule.departure_date != date {
                return false;
            }
        }
        contains_ignore_case(&schedule.origin, self.origin.as_deref())
            && contains_ignore_case(&schedule.destination, self.destination.as_deref())
    }
}

// Blank needles match everything.
fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}
