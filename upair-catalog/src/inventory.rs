use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use upair_core::repository::{BookingRepository, SeatLedger};
use upair_core::{Booking, ScheduleInstance, SeatAssignment};
use upair_shared::{Masked, SeatsCommittedEvent};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinSection {
    Business,
    Economy,
}

/// One lettered column of seats, numbered from 1 to `rows`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatColumn {
    pub letter: String,
    pub rows: u32,
}

impl SeatColumn {
    pub fn new(letter: &str, rows: u32) -> Self {
        Self {
            letter: letter.to_uppercase(),
            rows,
        }
    }
}

/// Seat map of the aircraft: business columns first, then economy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SeatLayout {
    pub business: Vec<SeatColumn>,
    pub economy: Vec<SeatColumn>,
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self {
            business: vec![SeatColumn::new("A", 20), SeatColumn::new("B", 20)],
            economy: vec![
                SeatColumn::new("C", 36),
                SeatColumn::new("D", 36),
                SeatColumn::new("E", 36),
                SeatColumn::new("F", 36),
            ],
        }
    }
}

impl SeatLayout {
    pub fn capacity(&self) -> u32 {
        self.columns().map(|(_, column)| column.rows).sum()
    }

    /// Every label in display order ("A1".."A20", "B1"..)
    pub fn labels(&self) -> Vec<(CabinSection, String)> {
        self.columns()
            .flat_map(|(section, column)| {
                (1..=column.rows).map(move |row| (section, format!("{}{}", column.letter, row)))
            })
            .collect()
    }

    pub fn section_of(&self, label: &str) -> Option<CabinSection> {
        let split = label.find(|c: char| c.is_ascii_digit())?;
        let (letter, row) = label.split_at(split);
        let row: u32 = row.parse().ok()?;

        self.columns()
            .find(|(_, column)| column.letter.eq_ignore_ascii_case(letter))
            .filter(|(_, column)| row >= 1 && row <= column.rows)
            .map(|(section, _)| section)
    }

    fn columns(&self) -> impl Iterator<Item = (CabinSection, &SeatColumn)> {
        self.business
            .iter()
            .map(|c| (CabinSection::Business, c))
            .chain(self.economy.iter().map(|c| (CabinSection::Economy, c)))
    }
}

/// Availability of a single seat as seen from one booking session
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Free,
    /// Held by a committed booking.
    Reserved,
    /// Picked in this session, not yet committed.
    Selected { passenger_name: String },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeatMapEntry {
    pub label: String,
    pub section: CabinSection,
    pub state: SeatState,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatMap {
    pub flight_code: String,
    pub departure_date: NaiveDate,
    pub seats: Vec<SeatMapEntry>,
}

impl SeatMap {
    pub fn state(&self, label: &str) -> Option<&SeatState> {
        self.seats
            .iter()
            .find(|seat| seat.label.eq_ignore_ascii_case(label))
            .map(|seat| &seat.state)
    }

    pub fn free_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.state == SeatState::Free).count()
    }
}

/// Identity of a flight instance for seat purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatKey {
    pub flight_code: String,
    pub departure_date: NaiveDate,
}

/// In-progress seat selection for one booking attempt
#[derive(Debug, Clone)]
pub struct BookingSession {
    pub id: Uuid,
    pub schedule_id: String,
    pub key: SeatKey,
    pub adults: u32,
    pub minors: u32,
    selections: Vec<SeatAssignment>,
}

impl BookingSession {
    pub fn new(schedule: &ScheduleInstance, adults: u32, minors: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            schedule_id: schedule.schedule_id.clone(),
            key: SeatKey {
                flight_code: schedule.flight_code.clone(),
                departure_date: schedule.departure_date,
            },
            adults,
            minors,
            selections: Vec::new(),
        }
    }

    pub fn passenger_count(&self) -> u32 {
        self.adults.saturating_add(self.minors)
    }

    pub fn selections(&self) -> &[SeatAssignment] {
        &self.selections
    }

    pub fn is_complete(&self) -> bool {
        self.selections.len() == self.passenger_count() as usize
    }

    pub fn is_selected(&self, label: &str) -> bool {
        self.selections.iter().any(|s| s.seat_label == label)
    }

    /// Adds a seat to the pending selection. Nothing changes on error.
    pub fn select(
        &mut self,
        label: &str,
        passenger_name: &str,
        committed: &HashSet<String>,
        layout: &SeatLayout,
    ) -> Result<(), SeatError> {
        let label = normalize_label(label);

        if layout.section_of(&label).is_none() {
            return Err(SeatError::UnknownSeat(label));
        }
        if committed.contains(&label) {
            return Err(SeatError::SeatAlreadyReserved(label));
        }
        if self.selections.len() >= self.passenger_count() as usize {
            return Err(SeatError::SelectionLimitReached {
                limit: self.passenger_count(),
            });
        }
        if self.is_selected(&label) {
            return Err(SeatError::SeatAlreadySelected(label));
        }
        let passenger_name = passenger_name.trim();
        if passenger_name.is_empty() {
            return Err(SeatError::PassengerNameRequired(label));
        }

        self.selections.push(SeatAssignment {
            seat_label: label,
            passenger_name: passenger_name.to_string(),
        });
        Ok(())
    }

    /// Drops a pending pick. Returns `false` if the seat was not selected.
    pub fn release(&mut self, label: &str) -> bool {
        let label = normalize_label(label);
        let before = self.selections.len();
        self.selections.retain(|s| s.seat_label != label);
        before != self.selections.len()
    }

    /// Drops only the picks that lost a commit race, keeping the rest.
    pub fn drop_conflicts(&mut self, labels: &[String]) {
        self.selections.retain(|s| !labels.contains(&s.seat_label));
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }
}

/// Derives the three-state seat map for a flight instance.
pub fn available_seats(
    layout: &SeatLayout,
    key: &SeatKey,
    committed: &HashSet<String>,
    session: Option<&BookingSession>,
) -> SeatMap {
    let seats = layout
        .labels()
        .into_iter()
        .map(|(section, label)| {
            let selected = session
                .filter(|s| s.key == *key)
                .and_then(|s| s.selections.iter().find(|a| a.seat_label == label));

            let state = if committed.contains(&label) {
                SeatState::Reserved
            } else if let Some(assignment) = selected {
                SeatState::Selected {
                    passenger_name: assignment.passenger_name.clone(),
                }
            } else {
                SeatState::Free
            };

            SeatMapEntry { label, section, state }
        })
        .collect();

    SeatMap {
        flight_code: key.flight_code.clone(),
        departure_date: key.departure_date,
        seats,
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// Seat allocation across concurrent booking sessions
pub struct SeatInventory {
    layout: SeatLayout,
    ledger: Arc<dyn SeatLedger>,
    bookings: Arc<dyn BookingRepository>,
    locks: DashMap<SeatKey, Arc<Mutex<()>>>,
    events: Option<broadcast::Sender<SeatsCommittedEvent>>,
}

impl SeatInventory {
    pub fn new(
        layout: SeatLayout,
        ledger: Arc<dyn SeatLedger>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            layout,
            ledger,
            bookings,
            locks: DashMap::new(),
            events: None,
        }
    }

    pub fn with_events(mut self, sender: broadcast::Sender<SeatsCommittedEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn layout(&self) -> &SeatLayout {
        &self.layout
    }

    /// Committed labels in canonical form, whatever the ledger stored.
    async fn committed(&self, key: &SeatKey) -> Result<HashSet<String>, SeatError> {
        let reserved = self
            .ledger
            .reserved_seats(&key.flight_code, key.departure_date)
            .await
            .map_err(|e| SeatError::Repository(e.to_string()))?;
        Ok(reserved.iter().map(|label| normalize_label(label)).collect())
    }

    pub async fn seat_map(&self, session: &BookingSession) -> Result<SeatMap, SeatError> {
        let committed = self.committed(&session.key).await?;
        Ok(available_seats(&self.layout, &session.key, &committed, Some(session)))
    }

    /// Tentatively picks `label` for `passenger_name` in the session.
    pub async fn reserve(
        &self,
        session: &mut BookingSession,
        label: &str,
        passenger_name: &str,
    ) -> Result<(), SeatError> {
        let committed = self.committed(&session.key).await?;
        session.select(label, passenger_name, &committed, &self.layout)?;
        debug!(
            "Session {} picked {} for {}",
            session.id,
            normalize_label(label),
            Masked(passenger_name)
        );
        Ok(())
    }

    /// Commits all seats of `booking` or none.
    ///
    /// Labels are normalized in place first, so the stored booking only
    /// carries canonical labels. The committed set is re-read under a lock
    /// scoped to the flight instance, so two sessions racing for the same seat
    /// cannot both succeed. The booking is persisted inside the same critical
    /// section.
    pub async fn commit(&self, booking: &mut Booking, seat_capacity: u32) -> Result<(), SeatError> {
        let key = SeatKey {
            flight_code: booking.flight_code.clone(),
            departure_date: booking.departure_date,
        };

        let mut requested = HashSet::new();
        let mut duplicates = Vec::new();
        for seat in booking.seats.iter_mut() {
            seat.seat_label = normalize_label(&seat.seat_label);
            if self.layout.section_of(&seat.seat_label).is_none() {
                return Err(SeatError::UnknownSeat(seat.seat_label.clone()));
            }
            if !requested.insert(seat.seat_label.clone()) {
                duplicates.push(seat.seat_label.clone());
            }
        }
        if !duplicates.is_empty() {
            return Err(SeatError::SeatConflictOnCommit { labels: duplicates });
        }

        let lock = self.lock_for(&key);
        let result = {
            let _guard = lock.lock().await;
            self.commit_locked(&key, booking, seat_capacity).await
        };
        drop(lock);
        // Entries nobody else is waiting on are dropped so the table tracks
        // only flight instances with a commit in flight.
        self.locks.remove_if(&key, |_, held| Arc::strong_count(held) == 1);
        result?;

        if let Some(events) = &self.events {
            let event = SeatsCommittedEvent {
                booking_id: booking.id,
                flight_code: key.flight_code.clone(),
                departure_date: key.departure_date,
                seat_labels: booking.seat_labels().into_iter().map(str::to_string).collect(),
                committed_at: Utc::now().timestamp(),
            };
            // No subscribers is fine
            let _ = events.send(event);
        }

        Ok(())
    }

    /// Conflict check, capacity check and save. Caller holds the key's lock.
    async fn commit_locked(&self, key: &SeatKey, booking: &Booking, seat_capacity: u32) -> Result<(), SeatError> {
        let committed = self.committed(key).await?;
        let conflicts: Vec<String> = booking
            .seat_labels()
            .into_iter()
            .filter(|label| committed.contains(*label))
            .map(str::to_string)
            .collect();
        if !conflicts.is_empty() {
            warn!(
                "Booking {} lost seats {:?} on {} {}",
                booking.id, conflicts, key.flight_code, key.departure_date
            );
            return Err(SeatError::SeatConflictOnCommit { labels: conflicts });
        }

        let capacity = seat_capacity.min(self.layout.capacity());
        let available = capacity.saturating_sub(committed.len() as u32);
        let wanted = booking.seats.len() as u32;
        if wanted > available {
            return Err(SeatError::CapacityExceeded {
                requested: wanted,
                available,
            });
        }

        self.bookings
            .save_booking(booking)
            .await
            .map_err(|e| SeatError::Repository(e.to_string()))?;

        info!(
            "Committed {} seat(s) for booking {} on {} {}",
            wanted, booking.id, key.flight_code, key.departure_date
        );
        Ok(())
    }

    fn lock_for(&self, key: &SeatKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    #[error("Seat {0} is already reserved")]
    SeatAlreadyReserved(String),

    #[error("Seat {0} is already selected in this session")]
    SeatAlreadySelected(String),

    #[error("Seats already selected for all {limit} passenger(s)")]
    SelectionLimitReached { limit: u32 },

    #[error("Passenger name is required for seat {0}")]
    PassengerNameRequired(String),

    #[error("Unknown seat: {0}")]
    UnknownSeat(String),

    #[error("Seats taken before commit: {labels:?}")]
    SeatConflictOnCommit { labels: Vec<String> },

    #[error("Insufficient seats: requested {requested}, available {available}")]
    CapacityExceeded { requested: u32, available: u32 },

    #[error("Seat ledger error: {0}")]
    Repository(String),
}
