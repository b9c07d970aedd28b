use crate::app_config::Fixtures;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};
use upair_core::repository::{
    BookingRepository, FlightCatalog, RepositoryResult, ScheduleRepository, SeatLedger,
};
use upair_core::{
    Booking, BookingStatus, CoreError, CoreResult, FlightCatalogEntry, FlightOffer, ScheduleInstance,
};
use upair_shared::Masked;
use uuid::Uuid;

/// Process-local storage behind every collaborator trait.
///
/// Each table has its own lock; no operation holds two at once.
#[derive(Default)]
pub struct InMemoryStore {
    flights: RwLock<HashMap<String, FlightCatalogEntry>>,
    offers: RwLock<HashMap<String, FlightOffer>>,
    schedules: RwLock<HashMap<String, ScheduleInstance>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_flight(&self, entry: FlightCatalogEntry) -> CoreResult<()> {
        entry.validate()?;
        debug!("Catalog entry {} stored", entry.flight_code);
        self.flights.write().await.insert(entry.flight_code.clone(), entry);
        Ok(())
    }

    pub async fn upsert_offer(&self, offer: FlightOffer) -> CoreResult<()> {
        if !self.flights.read().await.contains_key(&offer.flight_code) {
            return Err(CoreError::CatalogEntryMissing(offer.flight_code));
        }
        self.offers.write().await.insert(offer.flight_code.clone(), offer);
        Ok(())
    }

    /// Schedules may only reference flights already in the catalog.
    pub async fn add_schedule(&self, schedule: ScheduleInstance) -> CoreResult<()> {
        schedule.validate()?;
        if !self.flights.read().await.contains_key(&schedule.flight_code) {
            return Err(CoreError::CatalogEntryMissing(schedule.flight_code));
        }

        let mut schedules = self.schedules.write().await;
        if schedules.contains_key(&schedule.schedule_id) {
            return Err(CoreError::ValidationError(format!(
                "schedule {} already exists",
                schedule.schedule_id
            )));
        }
        debug!(
            "Schedule {} added for {} on {}",
            schedule.schedule_id, schedule.flight_code, schedule.departure_date
        );
        schedules.insert(schedule.schedule_id.clone(), schedule);
        Ok(())
    }

    /// Loads fixture rows: flights first, so offers and schedules can reference them.
    pub async fn seed(&self, fixtures: &Fixtures) -> CoreResult<()> {
        for entry in &fixtures.flights {
            self.upsert_flight(entry.clone()).await?;
        }
        for offer in &fixtures.offers {
            self.upsert_offer(offer.clone()).await?;
        }
        for schedule in &fixtures.schedules {
            self.add_schedule(schedule.clone()).await?;
        }

        info!(
            "Seeded {} flight(s), {} offer(s), {} schedule(s)",
            fixtures.flights.len(),
            fixtures.offers.len(),
            fixtures.schedules.len()
        );
        Ok(())
    }
}

#[async_trait]
impl FlightCatalog for InMemoryStore {
    async fn get_flight_by_code(&self, flight_code: &str) -> RepositoryResult<Option<FlightCatalogEntry>> {
        Ok(self.flights.read().await.get(flight_code).cloned())
    }

    async fn get_offer(&self, flight_code: &str) -> RepositoryResult<Option<FlightOffer>> {
        Ok(self.offers.read().await.get(flight_code).cloned())
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryStore {
    /// Ordered by departure so listings are stable.
    async fn list_schedules(&self) -> RepositoryResult<Vec<ScheduleInstance>> {
        let mut schedules: Vec<ScheduleInstance> = self.schedules.read().await.values().cloned().collect();
        schedules.sort_by(|a, b| {
            a.departure_instant()
                .cmp(&b.departure_instant())
                .then_with(|| a.schedule_id.cmp(&b.schedule_id))
        });
        Ok(schedules)
    }

    async fn get_schedule(&self, schedule_id: &str) -> RepositoryResult<Option<ScheduleInstance>> {
        Ok(self.schedules.read().await.get(schedule_id).cloned())
    }

    async fn delete_schedule(&self, schedule_id: &str) -> RepositoryResult<bool> {
        Ok(self.schedules.write().await.remove(schedule_id).is_some())
    }
}

#[async_trait]
impl SeatLedger for InMemoryStore {
    async fn reserved_seats(
        &self,
        flight_code: &str,
        departure_date: NaiveDate,
    ) -> RepositoryResult<HashSet<String>> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|b| b.flight_code == flight_code && b.departure_date == departure_date)
            .filter(|b| b.status.holds_seats())
            .flat_map(|b| b.seats.iter().map(|s| s.seat_label.clone()))
            .collect())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn save_booking(&self, booking: &Booking) -> RepositoryResult<()> {
        debug!(
            "Saving booking {} for {}",
            booking.id,
            Masked(&booking.passenger_username)
        );
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> RepositoryResult<()> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| format!("Booking not found: {}", id))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn list_bookings(&self, passenger_username: &str) -> RepositoryResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.passenger_username == passenger_username)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.created_at);
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use rust_decimal::Decimal;
    use upair_core::{PaymentMethod, SeatAssignment, SeatClass, TripType};

    fn flight(code: &str) -> FlightCatalogEntry {
        FlightCatalogEntry {
            flight_code: code.to_string(),
            airline: "Cebu Pacific".to_string(),
            origin: "CEB".to_string(),
            destination: "DRP".to_string(),
            duration: "1h 30m".to_string(),
            aircraft_model: "A320".to_string(),
            base_fare: Decimal::new(4200, 0),
            seat_capacity: 180,
        }
    }

    fn schedule(id: &str, code: &str, day: u32) -> ScheduleInstance {
        ScheduleInstance {
            schedule_id: id.to_string(),
            airline: "Cebu Pacific".to_string(),
            flight_code: code.to_string(),
            origin: "CEB".to_string(),
            destination: "DRP".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date"),
            departure_time: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
        }
    }

    fn booking(code: &str, labels: &[&str], status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            passenger_username: "maria".to_string(),
            trip_type: TripType::OneWay,
            schedule_id: "S1".to_string(),
            flight_code: code.to_string(),
            origin: "CEB".to_string(),
            destination: "DRP".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
            departure_time: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            return_leg: None,
            adults: labels.len() as u32,
            minors: 0,
            seats: labels
                .iter()
                .map(|l| SeatAssignment {
                    seat_label: l.to_string(),
                    passenger_name: "Maria Santos".to_string(),
                })
                .collect(),
            total_price: Decimal::new(4200, 0),
            status,
            seat_class: SeatClass::Standard,
            voucher_code: None,
            payment_method: PaymentMethod::Cash,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_schedule_requires_catalog_entry() {
        let store = InMemoryStore::new();
        let err = store.add_schedule(schedule("S1", "5J-101", 3)).await.unwrap_err();
        assert!(matches!(err, CoreError::CatalogEntryMissing(code) if code == "5J-101"));

        store.upsert_flight(flight("5J-101")).await.expect("flight stored");
        store.add_schedule(schedule("S1", "5J-101", 3)).await.expect("schedule stored");

        let duplicate = store.add_schedule(schedule("S1", "5J-101", 4)).await;
        assert!(matches!(duplicate, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_invalid_flight_rejected() {
        let store = InMemoryStore::new();
        let mut entry = flight("5J-101");
        entry.base_fare = Decimal::ZERO;
        assert!(store.upsert_flight(entry).await.is_err());
    }

    #[tokio::test]
    async fn test_schedules_listed_in_departure_order_and_deleted_once() {
        let store = InMemoryStore::new();
        store.upsert_flight(flight("5J-101")).await.expect("flight stored");
        store.add_schedule(schedule("LATE", "5J-101", 9)).await.expect("schedule stored");
        store.add_schedule(schedule("EARLY", "5J-101", 2)).await.expect("schedule stored");

        let ids: Vec<String> = store
            .list_schedules()
            .await
            .expect("list")
            .into_iter()
            .map(|s| s.schedule_id)
            .collect();
        assert_eq!(ids, vec!["EARLY", "LATE"]);

        assert!(store.delete_schedule("EARLY").await.expect("delete"));
        assert!(!store.delete_schedule("EARLY").await.expect("delete"));
    }

    #[tokio::test]
    async fn test_cancelled_bookings_release_seats() {
        let store = InMemoryStore::new();
        let held = booking("5J-101", &["C1", "C2"], BookingStatus::PayAtCounter);
        let cancelled = booking("5J-101", &["D1"], BookingStatus::Cancelled);
        let other_flight = booking("5J-202", &["E1"], BookingStatus::Confirmed);
        for b in [&held, &cancelled, &other_flight] {
            store.save_booking(b).await.expect("saved");
        }

        let date = NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date");
        let seats = store.reserved_seats("5J-101", date).await.expect("ledger");
        assert_eq!(seats, HashSet::from(["C1".to_string(), "C2".to_string()]));

        store
            .update_booking_status(held.id, BookingStatus::Cancelled)
            .await
            .expect("status updated");
        assert!(store.reserved_seats("5J-101", date).await.expect("ledger").is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_booking_fails() {
        let store = InMemoryStore::new();
        let result = store.update_booking_status(Uuid::new_v4(), BookingStatus::Confirmed).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_seed_loads_fixtures() {
        let store = InMemoryStore::new();
        let fixtures = Fixtures {
            flights: vec![flight("5J-101")],
            offers: vec![FlightOffer {
                flight_code: "5J-101".to_string(),
                cabin_class: upair_core::CabinClass::Business,
                seat_type: "Recliner".to_string(),
                food_and_beverages: String::new(),
                entertainment: String::new(),
                amenity: String::new(),
                more_details: String::new(),
            }],
            schedules: vec![schedule("S1", "5J-101", 3)],
        };
        store.seed(&fixtures).await.expect("seeded");

        assert!(store.get_offer("5J-101").await.expect("offer").is_some());
        assert!(store.get_schedule("S1").await.expect("schedule").is_some());
        assert_eq!(store.list_bookings("maria").await.expect("bookings").len(), 0);
    }
}
