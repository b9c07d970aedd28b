use crate::duration::{duration_minutes_or_default, DEFAULT_DURATION_MINUTES};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use upair_core::{FlightCatalogEntry, ScheduleInstance};

/// Operational status of a schedule instance, derived from the clock.
///
/// Variants are declared in lifecycle order, so `Ord` follows real time for a
/// fixed instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Departed,
    OnAir,
    Arrived,
    /// Terminal: the caller should delete the instance from the active schedule.
    Retired,
}

impl FlightStatus {
    pub fn is_bookable(&self) -> bool {
        matches!(self, FlightStatus::Scheduled)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlightStatus::Scheduled => "Scheduled",
            FlightStatus::Departed => "Departed",
            FlightStatus::OnAir => "On Air",
            FlightStatus::Arrived => "Arrived",
            FlightStatus::Retired => "Retired",
        };
        f.write_str(label)
    }
}

/// Time windows and the route rule for retirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleRules {
    /// Length of the "just left the gate" window after departure.
    pub departed_window_minutes: i64,
    /// How long after arrival a retirement-route instance stays listed as arrived.
    pub retirement_grace_minutes: i64,
    /// Used when the catalog duration cannot be parsed.
    pub default_duration_minutes: u32,
    /// Matched against the destination, by code or city name.
    pub terminus_airports: Vec<String>,
    /// Matched against the origin, by code or city name.
    pub hub_airports: Vec<String>,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self {
            departed_window_minutes: 2,
            retirement_grace_minutes: 2,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            terminus_airports: vec!["DRP".to_string(), "Daraga".to_string()],
            hub_airports: vec![
                "MNL".to_string(),
                "Manila".to_string(),
                "CEB".to_string(),
                "Cebu".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduleWithStatus {
    pub schedule: ScheduleInstance,
    pub status: FlightStatus,
}

/// Result of evaluating a whole schedule listing at one instant.
#[derive(Debug, Default)]
pub struct StatusBatch {
    /// Every instance that is still listed, in input order.
    pub listed: Vec<ScheduleWithStatus>,
    /// Instances eligible for deletion.
    pub retired: Vec<ScheduleInstance>,
}

/// Pure status derivation; never touches storage.
#[derive(Debug, Clone, Default)]
pub struct StatusEngine {
    rules: LifecycleRules,
}

impl StatusEngine {
    pub fn new(rules: LifecycleRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &LifecycleRules {
        &self.rules
    }

    /// Status of `schedule` at `now` for a known flight duration.
    pub fn status_at(
        &self,
        schedule: &ScheduleInstance,
        duration_minutes: u32,
        now: NaiveDateTime,
    ) -> FlightStatus {
        let departure = schedule.departure_instant();
        let arrival = departure + Duration::minutes(i64::from(duration_minutes));

        if now < departure {
            FlightStatus::Scheduled
        } else if now < departure + Duration::minutes(self.rules.departed_window_minutes) {
            FlightStatus::Departed
        } else if now < arrival {
            FlightStatus::OnAir
        } else if self.is_retirement_eligible(schedule, duration_minutes, now) {
            FlightStatus::Retired
        } else {
            FlightStatus::Arrived
        }
    }

    /// Status using the catalog entry for the duration. A missing entry
    /// degrades to `Scheduled` so one bad row cannot block a listing.
    pub fn evaluate(
        &self,
        schedule: &ScheduleInstance,
        entry: Option<&FlightCatalogEntry>,
        now: NaiveDateTime,
    ) -> FlightStatus {
        match entry {
            Some(entry) => {
                let minutes =
                    duration_minutes_or_default(&entry.duration, self.rules.default_duration_minutes);
                self.status_at(schedule, minutes, now)
            }
            None => {
                warn!(
                    "Catalog entry missing for flight {} (schedule {}); reporting as scheduled",
                    schedule.flight_code, schedule.schedule_id
                );
                FlightStatus::Scheduled
            }
        }
    }

    /// Hub-to-terminus instances are retired once the grace period after
    /// arrival has elapsed. No other route is ever retired.
    pub fn is_retirement_eligible(
        &self,
        schedule: &ScheduleInstance,
        duration_minutes: u32,
        now: NaiveDateTime,
    ) -> bool {
        if !self.is_retirement_route(schedule) {
            return false;
        }
        let arrival = schedule.departure_instant() + Duration::minutes(i64::from(duration_minutes));
        now >= arrival + Duration::minutes(self.rules.retirement_grace_minutes)
    }

    pub fn is_retirement_route(&self, schedule: &ScheduleInstance) -> bool {
        mentions_any(&schedule.origin, &self.rules.hub_airports)
            && mentions_any(&schedule.destination, &self.rules.terminus_airports)
    }

    /// Evaluates a listing in one pass, splitting off retired instances.
    pub fn evaluate_batch(
        &self,
        schedules: Vec<ScheduleInstance>,
        catalog: &HashMap<String, FlightCatalogEntry>,
        now: NaiveDateTime,
    ) -> StatusBatch {
        let mut batch = StatusBatch::default();

        for schedule in schedules {
            let status = self.evaluate(&schedule, catalog.get(&schedule.flight_code), now);
            debug!("Schedule {} is {}", schedule.schedule_id, status);

            if status == FlightStatus::Retired {
                batch.retired.push(schedule);
            } else {
                batch.listed.push(ScheduleWithStatus { schedule, status });
            }
        }

        batch
    }
}

fn mentions_any(airport: &str, names: &[String]) -> bool {
    let airport = airport.to_lowercase();
    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .any(|name| airport.contains(&name.trim().to_lowercase()))
}
