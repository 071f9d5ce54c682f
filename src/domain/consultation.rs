//! Consultation entity - a timed review of one uploaded record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Consultation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Active,
    Completed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Active => "active",
            ConsultationStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A doctor's consultation over a single medical record.
///
/// A doctor has at most one `Active` consultation at a time; completing it
/// records the end time and the duration in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: String,
    pub doctor_username: String,
    /// File name of the record under review
    pub record_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: Option<f64>,
    pub status: ConsultationStatus,
}

impl Consultation {
    pub fn start(
        id: String,
        doctor_username: String,
        record_id: String,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            doctor_username,
            record_id,
            start_time,
            end_time: None,
            duration_secs: None,
            status: ConsultationStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ConsultationStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == ConsultationStatus::Completed
    }

    /// Close the consultation at `now`, returning its duration in seconds.
    ///
    /// Clock skew never produces a negative duration.
    pub fn complete(&mut self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.start_time).num_milliseconds().max(0);
        let duration = millis as f64 / 1000.0;

        self.end_time = Some(now);
        self.duration_secs = Some(duration);
        self.status = ConsultationStatus::Completed;
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_complete_records_duration() {
        let start = Utc::now() - Duration::seconds(90);
        let mut consultation =
            Consultation::start("c1".into(), "dr".into(), "scan.pdf".into(), start);
        assert!(consultation.is_active());

        let duration = consultation.complete(start + Duration::seconds(90));

        assert_eq!(duration, 90.0);
        assert!(consultation.is_completed());
        assert_eq!(consultation.duration_secs, Some(90.0));
        assert!(consultation.end_time.is_some());
    }

    #[test]
    fn test_complete_before_start_clamps_to_zero() {
        let start = Utc::now();
        let mut consultation =
            Consultation::start("c1".into(), "dr".into(), "scan.pdf".into(), start);
        assert_eq!(consultation.complete(start - Duration::seconds(5)), 0.0);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConsultationStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(ConsultationStatus::Completed.to_string(), "completed");
    }
}
