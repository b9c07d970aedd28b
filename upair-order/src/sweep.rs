use crate::lookup::catalog_for;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use upair_catalog::StatusEngine;
use upair_core::repository::{FlightCatalog, ScheduleRepository};
use upair_core::Clock;
use upair_shared::ScheduleRetiredEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evaluated: usize,
    pub retired: Vec<String>,
    /// Retired instances whose deletion failed; retried on the next pass.
    pub failed: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Repository error: {0}")]
    Repository(String),
}

/// Deletes schedule instances the status engine reports as retired.
pub struct RetirementSweep {
    engine: StatusEngine,
    catalog: Arc<dyn FlightCatalog>,
    schedules: Arc<dyn ScheduleRepository>,
    clock: Arc<dyn Clock>,
    events: Option<broadcast::Sender<ScheduleRetiredEvent>>,
}

impl RetirementSweep {
    pub fn new(
        engine: StatusEngine,
        catalog: Arc<dyn FlightCatalog>,
        schedules: Arc<dyn ScheduleRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            catalog,
            schedules,
            clock,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: broadcast::Sender<ScheduleRetiredEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub async fn run_once(&self) -> Result<SweepReport, SweepError> {
        let schedules = self
            .schedules
            .list_schedules()
            .await
            .map_err(|e| SweepError::Repository(e.to_string()))?;

        let mut report = SweepReport {
            evaluated: schedules.len(),
            ..SweepReport::default()
        };

        let entries = catalog_for(self.catalog.as_ref(), &schedules).await;
        let batch = self.engine.evaluate_batch(schedules, &entries, self.clock.now());

        for schedule in batch.retired {
            match self.schedules.delete_schedule(&schedule.schedule_id).await {
                Ok(true) => {
                    info!(
                        "Retired schedule {} ({} {} -> {})",
                        schedule.schedule_id, schedule.flight_code, schedule.origin, schedule.destination
                    );
                    if let Some(events) = &self.events {
                        let _ = events.send(ScheduleRetiredEvent {
                            schedule_id: schedule.schedule_id.clone(),
                            flight_code: schedule.flight_code.clone(),
                            departure_date: schedule.departure_date,
                            retired_at: Utc::now().timestamp(),
                        });
                    }
                    report.retired.push(schedule.schedule_id);
                }
                // Already gone, e.g. removed by an admin between list and delete
                Ok(false) => {
                    warn!("Schedule {} vanished before retirement", schedule.schedule_id);
                }
                Err(e) => {
                    error!("Failed to retire schedule {}: {}", schedule.schedule_id, e);
                    report.failed.push(schedule.schedule_id);
                }
            }
        }

        Ok(report)
    }

    /// Runs `run_once` every `every` until the task is aborted.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Retirement sweep started, every {:?}", every);

            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(report) if !report.retired.is_empty() || !report.failed.is_empty() => {
                        info!(
                            "Sweep evaluated {} schedule(s): {} retired, {} failed",
                            report.evaluated,
                            report.retired.len(),
                            report.failed.len()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => error!("Retirement sweep failed: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use tokio::sync::RwLock;
    use upair_core::repository::RepositoryResult;
    use upair_core::{FixedClock, FlightCatalogEntry, FlightOffer, ScheduleInstance};

    struct Fleet {
        schedules: RwLock<Vec<ScheduleInstance>>,
        broken_deletes: HashSet<String>,
    }

    #[async_trait]
    impl FlightCatalog for Fleet {
        async fn get_flight_by_code(&self, code: &str) -> RepositoryResult<Option<FlightCatalogEntry>> {
            Ok(Some(FlightCatalogEntry {
                flight_code: code.to_string(),
                airline: "PAL".to_string(),
                origin: "MNL".to_string(),
                destination: "DRP".to_string(),
                duration: "2h".to_string(),
                aircraft_model: String::new(),
                base_fare: Decimal::new(5000, 0),
                seat_capacity: 184,
            }))
        }

        async fn get_offer(&self, _code: &str) -> RepositoryResult<Option<FlightOffer>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl ScheduleRepository for Fleet {
        async fn list_schedules(&self) -> RepositoryResult<Vec<ScheduleInstance>> {
            Ok(self.schedules.read().await.clone())
        }

        async fn get_schedule(&self, id: &str) -> RepositoryResult<Option<ScheduleInstance>> {
            Ok(self.schedules.read().await.iter().find(|s| s.schedule_id == id).cloned())
        }

        async fn delete_schedule(&self, id: &str) -> RepositoryResult<bool> {
            if self.broken_deletes.contains(id) {
                return Err("storage offline".into());
            }
            let mut schedules = self.schedules.write().await;
            let before = schedules.len();
            schedules.retain(|s| s.schedule_id != id);
            Ok(schedules.len() < before)
        }
    }

    fn schedule(id: &str, origin: &str, destination: &str) -> ScheduleInstance {
        ScheduleInstance {
            schedule_id: id.to_string(),
            airline: "PAL".to_string(),
            flight_code: format!("PR-{}", id),
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 12, 10).expect("valid date"),
            departure_time: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 10)
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
    }

    fn sweep_over(fleet: Arc<Fleet>, now: NaiveDateTime) -> RetirementSweep {
        RetirementSweep::new(
            StatusEngine::default(),
            fleet.clone(),
            fleet,
            Arc::new(FixedClock::new(now)),
        )
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_retired_instances() {
        let fleet = Arc::new(Fleet {
            schedules: RwLock::new(vec![
                schedule("1", "MNL", "DRP"),
                schedule("2", "DRP", "MNL"),
                schedule("3", "MNL", "CEB"),
            ]),
            broken_deletes: HashSet::new(),
        });
        let (tx, mut rx) = broadcast::channel(8);
        let sweep = sweep_over(fleet.clone(), at(10, 3)).with_events(tx);

        let report = sweep.run_once().await.expect("sweep runs");

        assert_eq!(report.evaluated, 3);
        assert_eq!(report.retired, vec!["1".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(fleet.schedules.read().await.len(), 2);

        let event = rx.recv().await.expect("retirement event");
        assert_eq!(event.schedule_id, "1");
        assert_eq!(event.flight_code, "PR-1");
    }

    #[tokio::test]
    async fn test_sweep_before_grace_retires_nothing() {
        let fleet = Arc::new(Fleet {
            schedules: RwLock::new(vec![schedule("1", "CEB", "DRP")]),
            broken_deletes: HashSet::new(),
        });
        let report = sweep_over(fleet.clone(), at(10, 1)).run_once().await.expect("sweep runs");

        assert!(report.retired.is_empty());
        assert_eq!(fleet.schedules.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_deletion_is_reported_not_fatal() {
        let fleet = Arc::new(Fleet {
            schedules: RwLock::new(vec![schedule("1", "MNL", "DRP"), schedule("2", "CEB", "DRP")]),
            broken_deletes: HashSet::from(["1".to_string()]),
        });
        let report = sweep_over(fleet.clone(), at(12, 0)).run_once().await.expect("sweep runs");

        assert_eq!(report.retired, vec!["2".to_string()]);
        assert_eq!(report.failed, vec!["1".to_string()]);
    }
}
