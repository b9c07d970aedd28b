use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use upair_core::repository::FlightCatalog;
use upair_core::{CabinClass, SeatClass};

/// Multipliers used by the fare calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FareConfig {
    /// Calendar months (1-12) priced as peak season
    pub peak_months: Vec<u32>,
    pub peak_multiplier: Decimal,
    pub regular_multiplier: Decimal,
    pub front_seat_multiplier: Decimal,
    pub business_seat_multiplier: Decimal,
    pub adult_multiplier: Decimal,
    /// Minors pay 75% of the adjusted unit price
    pub minor_multiplier: Decimal,
    pub business_offer_multiplier: Decimal,
    pub first_class_offer_multiplier: Decimal,
    /// Any voucher takes 10% off the subtotal
    pub voucher_multiplier: Decimal,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            // December, January and April (Holy Week)
            peak_months: vec![12, 1, 4],
            peak_multiplier: Decimal::new(13, 1),
            regular_multiplier: Decimal::ONE,
            front_seat_multiplier: Decimal::new(115, 2),
            business_seat_multiplier: Decimal::new(15, 1),
            adult_multiplier: Decimal::ONE,
            minor_multiplier: Decimal::new(75, 2),
            business_offer_multiplier: Decimal::new(11, 1),
            first_class_offer_multiplier: Decimal::new(12, 1),
            voucher_multiplier: Decimal::new(9, 1),
        }
    }
}

/// Everything a fare depends on. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct FareRequest<'a> {
    pub base_fare: Decimal,
    pub adults: u32,
    pub minors: u32,
    pub departure_date: NaiveDate,
    pub seat_class: SeatClass,
    pub voucher_code: Option<&'a str>,
    pub offer_cabin: Option<&'a CabinClass>,
}

/// A priced booking. Recomputed on demand, never stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookingQuote {
    /// Base fare after season and seat-class adjustments
    pub unit_price: Decimal,
    pub adult_subtotal: Decimal,
    pub minor_subtotal: Decimal,
    pub season_multiplier: Decimal,
    pub seat_multiplier: Decimal,
    pub offer_multiplier: Decimal,
    pub voucher_applied: bool,
    /// Rounded to the cent
    pub total: Decimal,
}

#[derive(Debug, thiserror::Error)]
pub enum FareError {
    #[error("Cannot price flight {0}: catalog entry missing")]
    CatalogEntryMissing(String),

    #[error("Catalog lookup failed: {0}")]
    Repository(String),
}

/// Deterministic fare calculation
#[derive(Debug, Clone, Default)]
pub struct FareCalculator {
    config: FareConfig,
}

impl FareCalculator {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    pub fn season_multiplier(&self, departure_date: NaiveDate) -> Decimal {
        if self.config.peak_months.contains(&departure_date.month()) {
            self.config.peak_multiplier
        } else {
            self.config.regular_multiplier
        }
    }

    pub fn seat_multiplier(&self, seat_class: SeatClass) -> Decimal {
        match seat_class {
            SeatClass::Front => self.config.front_seat_multiplier,
            SeatClass::Business => self.config.business_seat_multiplier,
            SeatClass::Standard => Decimal::ONE,
        }
    }

    pub fn offer_multiplier(&self, cabin: Option<&CabinClass>) -> Decimal {
        match cabin {
            Some(CabinClass::Business) => self.config.business_offer_multiplier,
            Some(CabinClass::FirstClass) => self.config.first_class_offer_multiplier,
            _ => Decimal::ONE,
        }
    }

    /// Prices a booking.
    ///
    /// Season and seat class adjust the unit price; the offer surcharge and the
    /// voucher discount apply to the subtotal. Zero passengers price to zero,
    /// callers must reject that case before asking.
    pub fn calculate(&self, request: &FareRequest<'_>) -> BookingQuote {
        let season_multiplier = self.season_multiplier(request.departure_date);
        let seat_multiplier = self.seat_multiplier(request.seat_class);
        let unit_price = request.base_fare * season_multiplier * seat_multiplier;

        let adult_subtotal = unit_price * Decimal::from(request.adults) * self.config.adult_multiplier;
        let minor_subtotal = unit_price * Decimal::from(request.minors) * self.config.minor_multiplier;

        let offer_multiplier = self.offer_multiplier(request.offer_cabin);
        let mut subtotal = (adult_subtotal + minor_subtotal) * offer_multiplier;

        let voucher_applied = request
            .voucher_code
            .map(|code| !code.trim().is_empty())
            .unwrap_or(false);
        if voucher_applied {
            subtotal *= self.config.voucher_multiplier;
        }

        let total = subtotal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        debug!(
            "Priced {} adult(s) + {} minor(s) at unit {} -> {}",
            request.adults, request.minors, unit_price, total
        );

        BookingQuote {
            unit_price,
            adult_subtotal,
            minor_subtotal,
            season_multiplier,
            seat_multiplier,
            offer_multiplier,
            voucher_applied,
            total,
        }
    }

    /// Looks up base fare and offer in the catalog, then prices.
    #[allow(clippy::too_many_arguments)]
    pub async fn quote(
        &self,
        catalog: &dyn FlightCatalog,
        flight_code: &str,
        adults: u32,
        minors: u32,
        departure_date: NaiveDate,
        seat_class: SeatClass,
        voucher_code: Option<&str>,
    ) -> Result<BookingQuote, FareError> {
        let entry = catalog
            .get_flight_by_code(flight_code)
            .await
            .map_err(|e| FareError::Repository(e.to_string()))?
            .ok_or_else(|| {
                warn!("Cannot quote flight {}: no catalog entry", flight_code);
                FareError::CatalogEntryMissing(flight_code.to_string())
            })?;

        let offer = catalog
            .get_offer(flight_code)
            .await
            .map_err(|e| FareError::Repository(e.to_string()))?;

        Ok(self.calculate(&FareRequest {
            base_fare: entry.base_fare,
            adults,
            minors,
            departure_date,
            seat_class,
            voucher_code,
            offer_cabin: offer.as_ref().map(|o| &o.cabin_class),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use upair_core::repository::RepositoryResult;
    use upair_core::{FlightCatalogEntry, FlightOffer};

    fn request<'a>(month: u32) -> FareRequest<'a> {
        FareRequest {
            base_fare: Decimal::new(200000, 2),
            adults: 2,
            minors: 1,
            departure_date: NaiveDate::from_ymd_opt(2025, month, 10).unwrap(),
            seat_class: SeatClass::Standard,
            voucher_code: None,
            offer_cabin: None,
        }
    }

    #[test]
    fn test_peak_season_fare() {
        let calculator = FareCalculator::default();
        let quote = calculator.calculate(&request(12));

        assert_eq!(quote.unit_price, Decimal::new(260000, 2));
        assert_eq!(quote.adult_subtotal, Decimal::new(520000, 2));
        assert_eq!(quote.minor_subtotal, Decimal::new(195000, 2));
        assert_eq!(quote.total, Decimal::new(715000, 2));
        assert!(!quote.voucher_applied);
    }

    #[test]
    fn test_voucher_takes_ten_percent() {
        let calculator = FareCalculator::default();
        let mut req = request(12);
        req.voucher_code = Some("ANYTHING");
        assert_eq!(calculator.calculate(&req).total, Decimal::new(643500, 2));

        // Blank codes are not vouchers
        req.voucher_code = Some("   ");
        assert_eq!(calculator.calculate(&req).total, Decimal::new(715000, 2));
    }

    #[test]
    fn test_business_seat_with_business_offer() {
        let calculator = FareCalculator::default();
        let cabin = CabinClass::Business;
        let mut req = request(6);
        req.seat_class = SeatClass::Business;
        req.offer_cabin = Some(&cabin);

        let quote = calculator.calculate(&req);
        assert_eq!(quote.unit_price, Decimal::new(300000, 2));
        assert_eq!(quote.adult_subtotal + quote.minor_subtotal, Decimal::new(825000, 2));
        assert_eq!(quote.total, Decimal::new(907500, 2));
    }

    #[test]
    fn test_season_and_seat_multipliers() {
        let calculator = FareCalculator::default();
        for month in [1, 4, 12] {
            assert_eq!(
                calculator.season_multiplier(NaiveDate::from_ymd_opt(2026, month, 1).unwrap()),
                Decimal::new(13, 1)
            );
        }
        for month in [2, 3, 5, 6, 7, 8, 9, 10, 11] {
            assert_eq!(
                calculator.season_multiplier(NaiveDate::from_ymd_opt(2026, month, 1).unwrap()),
                Decimal::ONE
            );
        }
        assert_eq!(calculator.seat_multiplier(SeatClass::Front), Decimal::new(115, 2));
        assert_eq!(
            calculator.offer_multiplier(Some(&CabinClass::FirstClass)),
            Decimal::new(12, 1)
        );
        assert_eq!(
            calculator.offer_multiplier(Some(&CabinClass::Other("Economy".to_string()))),
            Decimal::ONE
        );
    }

    #[test]
    fn test_total_rounds_half_up_on_the_cent() {
        let calculator = FareCalculator::default();
        // 0.05 * 1.15 * 0.9 = 0.05175 -> 0.05; 0.15 * 1.15 * 0.9 = 0.15525 -> 0.16
        let mut req = request(6);
        req.adults = 1;
        req.minors = 0;
        req.seat_class = SeatClass::Front;
        req.voucher_code = Some("PROMO");

        req.base_fare = Decimal::new(5, 2);
        assert_eq!(calculator.calculate(&req).total, Decimal::new(5, 2));

        req.base_fare = Decimal::new(15, 2);
        assert_eq!(calculator.calculate(&req).total, Decimal::new(16, 2));

        // exact midpoint: 1.125 -> 1.13
        req.seat_class = SeatClass::Standard;
        req.voucher_code = None;
        req.base_fare = Decimal::new(1125, 3);
        assert_eq!(calculator.calculate(&req).total, Decimal::new(113, 2));
    }

    #[test]
    fn test_zero_passengers_price_to_zero() {
        let calculator = FareCalculator::default();
        let mut req = request(12);
        req.adults = 0;
        req.minors = 0;
        assert_eq!(calculator.calculate(&req).total, Decimal::ZERO);
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let calculator = FareCalculator::default();
        let cabin = CabinClass::FirstClass;
        let mut req = request(4);
        req.seat_class = SeatClass::Front;
        req.voucher_code = Some("SUMMER");
        req.offer_cabin = Some(&cabin);

        assert_eq!(calculator.calculate(&req), calculator.calculate(&req));
    }

    struct OneFlightCatalog;

    #[async_trait]
    impl FlightCatalog for OneFlightCatalog {
        async fn get_flight_by_code(&self, flight_code: &str) -> RepositoryResult<Option<FlightCatalogEntry>> {
            Ok((flight_code == "UP101").then(|| FlightCatalogEntry {
                flight_code: "UP101".to_string(),
                airline: "UpAir".to_string(),
                origin: "MNL".to_string(),
                destination: "DRP".to_string(),
                duration: "2h".to_string(),
                aircraft_model: "A320".to_string(),
                base_fare: Decimal::new(200000, 2),
                seat_capacity: 184,
            }))
        }

        async fn get_offer(&self, flight_code: &str) -> RepositoryResult<Option<FlightOffer>> {
            Ok((flight_code == "UP101").then(|| FlightOffer {
                flight_code: "UP101".to_string(),
                cabin_class: CabinClass::Business,
                seat_type: String::new(),
                food_and_beverages: String::new(),
                entertainment: String::new(),
                amenity: String::new(),
                more_details: String::new(),
            }))
        }
    }

    #[tokio::test]
    async fn test_quote_uses_catalog_fare_and_offer() {
        let calculator = FareCalculator::default();
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        let quote = calculator
            .quote(&OneFlightCatalog, "UP101", 2, 1, date, SeatClass::Business, None)
            .await
            .unwrap();
        assert_eq!(quote.total, Decimal::new(907500, 2));

        let missing = calculator
            .quote(&OneFlightCatalog, "UP404", 1, 0, date, SeatClass::Standard, None)
            .await;
        assert!(matches!(missing, Err(FareError::CatalogEntryMissing(code)) if code == "UP404"));
    }
}
