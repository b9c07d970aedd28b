use std::collections::HashMap;
use tracing::warn;
use upair_core::repository::FlightCatalog;
use upair_core::{FlightCatalogEntry, ScheduleInstance};

/// Catalog entries for every flight code in `schedules`, one lookup per code.
///
/// Codes that fail to resolve are simply absent; the status engine treats
/// them as scheduled instead of failing the whole listing.
pub(crate) async fn catalog_for(
    catalog: &dyn FlightCatalog,
    schedules: &[ScheduleInstance],
) -> HashMap<String, FlightCatalogEntry> {
    let mut entries = HashMap::new();

    for schedule in schedules {
        if entries.contains_key(&schedule.flight_code) {
            continue;
        }
        match catalog.get_flight_by_code(&schedule.flight_code).await {
            Ok(Some(entry)) => {
                entries.insert(schedule.flight_code.clone(), entry);
            }
            Ok(None) => {}
            Err(e) => warn!("Catalog lookup for {} failed: {}", schedule.flight_code, e),
        }
    }

    entries
}
