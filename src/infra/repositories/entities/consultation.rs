//! Consultation document for the `consultations` collection.

use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::{from_bson, to_bson};
use crate::domain::{Consultation, ConsultationStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsultationDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub doctor_username: String,
    pub record_id: String,
    pub start_time: bson::DateTime,
    #[serde(default)]
    pub end_time: Option<bson::DateTime>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<f64>,
    pub status: ConsultationStatus,
}

impl ConsultationDocument {
    pub fn active(
        doctor_username: String,
        record_id: String,
        start_time: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: None,
            doctor_username,
            record_id,
            start_time: to_bson(start_time),
            end_time: None,
            duration: None,
            status: ConsultationStatus::Active,
        }
    }
}

impl From<ConsultationDocument> for Consultation {
    fn from(document: ConsultationDocument) -> Self {
        Consultation {
            id: document.id.map(|id| id.to_hex()).unwrap_or_default(),
            doctor_username: document.doctor_username,
            record_id: document.record_id,
            start_time: from_bson(document.start_time),
            end_time: document.end_time.map(from_bson),
            duration_secs: document.duration,
            status: document.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_round_trip_keeps_millisecond_precision() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap();
        let mut document = ConsultationDocument::active("dr".into(), "scan.pdf".into(), start);
        document.id = Some(ObjectId::new());

        let consultation = Consultation::from(document);

        assert_eq!(consultation.start_time, start);
        assert!(consultation.is_active());
        assert!(consultation.end_time.is_none());
    }
}
