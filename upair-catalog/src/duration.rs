use tracing::warn;

pub const DEFAULT_DURATION_MINUTES: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("Invalid duration: {0:?}")]
    InvalidDuration(String),
}

/// Parses the free-text duration kept in the catalog into whole minutes.
///
/// Accepts an hour component (integer or fractional) followed by an optional
/// minute component, or minutes alone: `"2h 30m"`, `"2h30m"`, `"2.5h"`,
/// `"150m"`, `"150"`, `"2 hours 30 minutes"`. Zero or negative results are
/// rejected.
pub fn parse_duration_minutes(raw: &str) -> Result<u32, DurationError> {
    let invalid = || DurationError::InvalidDuration(raw.to_string());
    let text = raw.trim().to_lowercase();

    let total = match text.split_once('h') {
        Some((hours, rest)) => {
            let hours: f64 = hours.trim().parse().map_err(|_| invalid())?;
            hours * 60.0 + leading_number(rest).unwrap_or(0.0)
        }
        None => leading_number(&text).ok_or_else(invalid)?,
    };

    if !total.is_finite() || total < 0.5 || total > f64::from(u32::MAX) {
        return Err(invalid());
    }
    Ok(total.round() as u32)
}

/// Same as [`parse_duration_minutes`] but never fails: bad catalog data is
/// logged and replaced with `default_minutes`.
pub fn duration_minutes_or_default(raw: &str, default_minutes: u32) -> u32 {
    match parse_duration_minutes(raw) {
        Ok(minutes) => minutes,
        Err(e) => {
            warn!("{}; falling back to {} minutes", e, default_minutes);
            default_minutes
        }
    }
}

// First run of digits/dots in `text`, e.g. "ours 30 minutes" -> 30.
fn leading_number(text: &str) -> Option<f64> {
    let is_numeric = |c: char| c.is_ascii_digit() || c == '.';
    let start = text.find(is_numeric)?;
    let tail = &text[start..];
    let end = tail.find(|c: char| !is_numeric(c)).unwrap_or(tail.len());
    tail[..end].parse().ok()
}
