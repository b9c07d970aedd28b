use crate::{CoreError, CoreResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static route, fare and aircraft facts for one flight code.
///
/// Owned by the admin side of the application; the engines only read it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightCatalogEntry {
    pub flight_code: String,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    /// Free-text elapsed time as typed by the admin ("2h 30m", "150m", "2.5h").
    pub duration: String,
    #[serde(default)]
    pub aircraft_model: String,
    pub base_fare: Decimal,
    pub seat_capacity: u32,
}

impl FlightCatalogEntry {
    pub fn validate(&self) -> CoreResult<()> {
        if self.flight_code.trim().is_empty() {
            return Err(CoreError::ValidationError("flight code is required".to_string()));
        }
        if self.base_fare <= Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "base fare for {} must be positive",
                self.flight_code
            )));
        }
        if self.seat_capacity == 0 {
            return Err(CoreError::ValidationError(format!(
                "seat capacity for {} must be at least 1",
                self.flight_code
            )));
        }
        Ok(())
    }
}

/// Cabin class advertised by a flight offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum CabinClass {
    Business,
    FirstClass,
    Other(String),
}

impl From<String> for CabinClass {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "business" => CabinClass::Business,
            "first class" => CabinClass::FirstClass,
            _ => CabinClass::Other(value),
        }
    }
}

impl From<&str> for CabinClass {
    fn from(value: &str) -> Self {
        CabinClass::from(value.to_string())
    }
}

impl From<CabinClass> for String {
    fn from(value: CabinClass) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CabinClass::Business => write!(f, "Business"),
            CabinClass::FirstClass => write!(f, "First Class"),
            CabinClass::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Marketing details attached to a flight code. At most one per flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightOffer {
    pub flight_code: String,
    pub cabin_class: CabinClass,
    #[serde(default)]
    pub seat_type: String,
    #[serde(default)]
    pub food_and_beverages: String,
    #[serde(default)]
    pub entertainment: String,
    #[serde(default)]
    pub amenity: String,
    #[serde(default)]
    pub more_details: String,
}

/// Seat preference chosen by the passenger at booking time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatClass {
    #[default]
    Standard,
    Front,
    Business,
}

impl SeatClass {
    /// Lenient parse; unknown preferences fall back to `Standard`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "front" => SeatClass::Front,
            "business" => SeatClass::Business,
            _ => SeatClass::Standard,
        }
    }
}
