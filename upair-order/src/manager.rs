use crate::lookup::catalog_for;
use crate::models::{BookingDraft, BookingError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use upair_catalog::{
    BookingQuote, BookingSession, FareCalculator, FareError, FareRequest, FlightStatus, ScheduleWithStatus,
    SeatError, SeatInventory, SeatMap, StatusEngine,
};
use upair_core::repository::{BookingRepository, FlightCatalog, ScheduleRepository};
use upair_core::{
    Booking, BookingStatus, Clock, FlightCatalogEntry, ReturnLeg, ScheduleInstance, ScheduleQuery, SeatClass,
    TripType,
};
use uuid::Uuid;

/// Drives a booking from flight listing to committed seats.
pub struct BookingManager {
    catalog: Arc<dyn FlightCatalog>,
    schedules: Arc<dyn ScheduleRepository>,
    bookings: Arc<dyn BookingRepository>,
    inventory: SeatInventory,
    clock: Arc<dyn Clock>,
    engine: StatusEngine,
    fares: FareCalculator,
}

impl BookingManager {
    pub fn new(
        catalog: Arc<dyn FlightCatalog>,
        schedules: Arc<dyn ScheduleRepository>,
        bookings: Arc<dyn BookingRepository>,
        inventory: SeatInventory,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            schedules,
            bookings,
            inventory,
            clock,
            engine: StatusEngine::default(),
            fares: FareCalculator::default(),
        }
    }

    pub fn with_engine(mut self, engine: StatusEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_fares(mut self, fares: FareCalculator) -> Self {
        self.fares = fares;
        self
    }

    /// Every listed instance matching `query`, with its current status.
    /// Retired instances are left to the sweep and never listed.
    pub async fn flight_board(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleWithStatus>, BookingError> {
        let schedules: Vec<ScheduleInstance> = self
            .schedules
            .list_schedules()
            .await
            .map_err(BookingError::repository)?
            .into_iter()
            .filter(|s| query.matches(s))
            .collect();

        let entries = catalog_for(self.catalog.as_ref(), &schedules).await;
        let batch = self.engine.evaluate_batch(schedules, &entries, self.clock.now());
        Ok(batch.listed)
    }

    /// Only instances that can still be booked.
    pub async fn bookable_schedules(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleWithStatus>, BookingError> {
        let mut board = self.flight_board(query).await?;
        board.retain(|s| s.status.is_bookable());
        Ok(board)
    }

    pub async fn quote(
        &self,
        schedule_id: &str,
        adults: u32,
        minors: u32,
        seat_class: SeatClass,
        voucher_code: Option<&str>,
    ) -> Result<BookingQuote, BookingError> {
        let schedule = self.schedule(schedule_id).await?;
        let quote = self
            .fares
            .quote(
                self.catalog.as_ref(),
                &schedule.flight_code,
                adults,
                minors,
                schedule.departure_date,
                seat_class,
                voucher_code,
            )
            .await?;
        Ok(quote)
    }

    pub async fn start_session(
        &self,
        schedule_id: &str,
        adults: u32,
        minors: u32,
    ) -> Result<BookingSession, BookingError> {
        match adults.checked_add(minors) {
            None | Some(0) => return Err(BookingError::InvalidPassengerCount),
            Some(_) => {}
        }
        let schedule = self.schedule(schedule_id).await?;
        let entry = self.catalog_entry(&schedule.flight_code).await?;
        self.ensure_bookable(&schedule, &entry)?;

        Ok(BookingSession::new(&schedule, adults, minors))
    }

    pub async fn seat_map(&self, session: &BookingSession) -> Result<SeatMap, BookingError> {
        Ok(self.inventory.seat_map(session).await?)
    }

    pub async fn select_seat(
        &self,
        session: &mut BookingSession,
        label: &str,
        passenger_name: &str,
    ) -> Result<(), BookingError> {
        Ok(self.inventory.reserve(session, label, passenger_name).await?)
    }

    pub fn release_seat(&self, session: &mut BookingSession, label: &str) -> bool {
        session.release(label)
    }

    /// Prices and commits the session as a booking.
    ///
    /// On a lost seat race the conflicting picks are removed from `session`,
    /// the others stay selected, and `SeatConflictOnCommit` is returned.
    pub async fn place_booking(
        &self,
        session: &mut BookingSession,
        draft: BookingDraft,
    ) -> Result<Booking, BookingError> {
        if !session.is_complete() {
            return Err(BookingError::IncompleteSelection {
                selected: session.selections().len(),
                required: session.passenger_count(),
            });
        }

        let schedule = self.schedule(&session.schedule_id).await?;
        let entry = self.catalog_entry(&schedule.flight_code).await?;
        self.ensure_bookable(&schedule, &entry)?;

        let offer = self
            .catalog
            .get_offer(&schedule.flight_code)
            .await
            .map_err(BookingError::repository)?;
        let quote = self.fares.calculate(&FareRequest {
            base_fare: entry.base_fare,
            adults: session.adults,
            minors: session.minors,
            departure_date: schedule.departure_date,
            seat_class: draft.seat_class,
            voucher_code: draft.voucher_code.as_deref(),
            offer_cabin: offer.as_ref().map(|o| &o.cabin_class),
        });

        let return_leg = match draft.trip_type {
            TripType::OneWay => None,
            TripType::RoundTrip => Some(self.find_return_leg(&schedule).await?.ok_or_else(|| {
                BookingError::NoReturnFlight {
                    origin: schedule.destination.clone(),
                    destination: schedule.origin.clone(),
                }
            })?),
        };

        let now = Utc::now();
        let mut booking = Booking {
            id: Uuid::new_v4(),
            passenger_username: draft.passenger_username,
            trip_type: draft.trip_type,
            schedule_id: schedule.schedule_id.clone(),
            flight_code: schedule.flight_code.clone(),
            origin: schedule.origin.clone(),
            destination: schedule.destination.clone(),
            departure_date: schedule.departure_date,
            departure_time: schedule.departure_time,
            return_leg,
            adults: session.adults,
            minors: session.minors,
            seats: session.selections().to_vec(),
            total_price: quote.total,
            status: draft.payment_method.initial_status(),
            seat_class: draft.seat_class,
            voucher_code: draft.voucher_code.filter(|code| !code.trim().is_empty()),
            payment_method: draft.payment_method,
            created_at: now,
            updated_at: now,
        };

        match self.inventory.commit(&mut booking, entry.seat_capacity).await {
            Ok(()) => {
                info!(
                    "Booking {} placed on {} {} for {}",
                    booking.id, booking.flight_code, booking.departure_date, quote.total
                );
                session.clear();
                Ok(booking)
            }
            Err(SeatError::SeatConflictOnCommit { labels }) => {
                session.drop_conflicts(&labels);
                Err(SeatError::SeatConflictOnCommit { labels }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Earliest bookable instance flying the reverse route on a later date.
    pub async fn find_return_leg(&self, outbound: &ScheduleInstance) -> Result<Option<ReturnLeg>, BookingError> {
        let query = ScheduleQuery::default();
        let candidate = self
            .bookable_schedules(&query)
            .await?
            .into_iter()
            .map(|s| s.schedule)
            .filter(|s| {
                s.origin == outbound.destination
                    && s.destination == outbound.origin
                    && s.departure_date > outbound.departure_date
            })
            .min_by_key(|s| s.departure_instant());

        Ok(candidate.map(|s| ReturnLeg {
            schedule_id: s.schedule_id,
            flight_code: s.flight_code,
            departure_date: s.departure_date,
            departure_time: s.departure_time,
        }))
    }

    pub async fn bookings_for(&self, passenger_username: &str) -> Result<Vec<Booking>, BookingError> {
        self.bookings
            .list_bookings(passenger_username)
            .await
            .map_err(BookingError::repository)
    }

    /// Cash received at the counter.
    pub async fn confirm_payment(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.transition(booking_id, BookingStatus::Confirmed).await
    }

    pub async fn request_cancellation(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.transition(booking_id, BookingStatus::CancelRequested).await
    }

    /// Approving a cancellation releases the booking's seats.
    pub async fn approve_cancellation(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.transition(booking_id, BookingStatus::Cancelled).await
    }

    pub async fn reject_cancellation(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let booking = self.booking(booking_id).await?;
        if booking.status != BookingStatus::CancelRequested {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Confirmed,
            });
        }
        self.transition(booking_id, BookingStatus::Confirmed).await
    }

    async fn transition(&self, booking_id: Uuid, to: BookingStatus) -> Result<Booking, BookingError> {
        let mut booking = self.booking(booking_id).await?;

        if !booking.status.can_transition_to(to) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to,
            });
        }

        self.bookings
            .update_booking_status(booking_id, to)
            .await
            .map_err(BookingError::repository)?;
        info!("Booking {} moved from {:?} to {:?}", booking_id, booking.status, to);

        booking.update_status(to);
        Ok(booking)
    }

    async fn booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .get_booking(booking_id)
            .await
            .map_err(BookingError::repository)?
            .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))
    }

    async fn schedule(&self, schedule_id: &str) -> Result<ScheduleInstance, BookingError> {
        self.schedules
            .get_schedule(schedule_id)
            .await
            .map_err(BookingError::repository)?
            .ok_or_else(|| BookingError::ScheduleNotFound(schedule_id.to_string()))
    }

    async fn catalog_entry(&self, flight_code: &str) -> Result<FlightCatalogEntry, BookingError> {
        match self
            .catalog
            .get_flight_by_code(flight_code)
            .await
            .map_err(BookingError::repository)?
        {
            Some(entry) => Ok(entry),
            None => {
                warn!("No catalog entry for flight {}", flight_code);
                Err(FareError::CatalogEntryMissing(flight_code.to_string()).into())
            }
        }
    }

    fn ensure_bookable(&self, schedule: &ScheduleInstance, entry: &FlightCatalogEntry) -> Result<(), BookingError> {
        let status = self.engine.evaluate(schedule, Some(entry), self.clock.now());
        if status != FlightStatus::Scheduled {
            return Err(BookingError::NotBookable {
                schedule_id: schedule.schedule_id.clone(),
                status,
            });
        }
        Ok(())
    }
}
