use chrono::NaiveDate;
use uuid::Uuid;

/// Emitted once a booking's seats are part of the committed assignment set.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatsCommittedEvent {
    pub booking_id: Uuid,
    pub flight_code: String,
    pub departure_date: NaiveDate,
    pub seat_labels: Vec<String>,
    pub committed_at: i64,
}

/// Emitted by the retirement sweep after a schedule instance was removed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ScheduleRetiredEvent {
    pub schedule_id: String,
    pub flight_code: String,
    pub departure_date: NaiveDate,
    pub retired_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seats_committed_event_serialization() {
        let event = SeatsCommittedEvent {
            booking_id: Uuid::nil(),
            flight_code: "UP101".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 12, 10).unwrap(),
            seat_labels: vec!["A1".to_string(), "A2".to_string()],
            committed_at: 0,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["flight_code"], "UP101");
        assert_eq!(json["departure_date"], "2025-12-10");
        assert_eq!(json["seat_labels"][1], "A2");
    }
}
