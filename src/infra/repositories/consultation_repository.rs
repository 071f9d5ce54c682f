//! Consultation repository backed by the `consultations` collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Collection,
};

use super::entities::{consultation::ConsultationDocument, to_bson};
use super::is_duplicate_key;
use crate::domain::{Consultation, ConsultationStatus, TimeWindow};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Consultation repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ConsultationRepository: Send + Sync {
    /// The doctor's active consultation, if any
    async fn find_active(&self, username: &str) -> AppResult<Option<Consultation>>;

    /// An active consultation by id, scoped to its doctor.
    /// Malformed ids are treated as unknown.
    async fn find_active_by_id(&self, id: &str, username: &str)
        -> AppResult<Option<Consultation>>;

    /// Open a consultation.
    ///
    /// Returns `AppError::Conflict` when the doctor already has one open.
    async fn start(
        &self,
        username: &str,
        record_id: &str,
        start_time: DateTime<Utc>,
    ) -> AppResult<Consultation>;

    /// Persist a completion. Returns false when the consultation was no
    /// longer active.
    async fn save_completion(&self, consultation: &Consultation) -> AppResult<bool>;

    /// Every completed consultation of a doctor
    async fn list_completed(&self, username: &str) -> AppResult<Vec<Consultation>>;

    /// Consultations (any status) started inside the window, oldest first
    async fn list_started_in(
        &self,
        username: &str,
        window: TimeWindow,
    ) -> AppResult<Vec<Consultation>>;
}

/// Concrete implementation of ConsultationRepository
pub struct ConsultationStore {
    collection: Collection<ConsultationDocument>,
}

impl ConsultationStore {
    /// Create new repository instance
    pub fn new(collection: Collection<ConsultationDocument>) -> Self {
        Self { collection }
    }

    async fn find_many(&self, filter: Document) -> AppResult<Vec<Consultation>> {
        let documents: Vec<ConsultationDocument> = self
            .collection
            .find(filter)
            .sort(doc! { "start_time": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(documents.into_iter().map(Consultation::from).collect())
    }
}

fn window_filter(username: &str, window: TimeWindow) -> Document {
    let mut range = doc! { "$gte": to_bson(window.start) };
    if let Some(end) = window.end {
        range.insert("$lt", to_bson(end));
    }
    doc! { "doctor_username": username, "start_time": range }
}

#[async_trait]
impl ConsultationRepository for ConsultationStore {
    async fn find_active(&self, username: &str) -> AppResult<Option<Consultation>> {
        let result = self
            .collection
            .find_one(doc! {
                "doctor_username": username,
                "status": ConsultationStatus::Active.as_str(),
            })
            .await?;

        Ok(result.map(Consultation::from))
    }

    async fn find_active_by_id(
        &self,
        id: &str,
        username: &str,
    ) -> AppResult<Option<Consultation>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            tracing::debug!(consultation_id = %id, "Malformed consultation id");
            return Ok(None);
        };

        let result = self
            .collection
            .find_one(doc! {
                "_id": object_id,
                "doctor_username": username,
                "status": ConsultationStatus::Active.as_str(),
            })
            .await?;

        Ok(result.map(Consultation::from))
    }

    async fn start(
        &self,
        username: &str,
        record_id: &str,
        start_time: DateTime<Utc>,
    ) -> AppResult<Consultation> {
        let mut document =
            ConsultationDocument::active(username.to_string(), record_id.to_string(), start_time);

        let inserted = self.collection.insert_one(&document).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::conflict("An active consultation")
            } else {
                AppError::from(e)
            }
        })?;

        document.id = inserted.inserted_id.as_object_id();
        let consultation = Consultation::from(document);
        tracing::info!(
            consultation_id = %consultation.id,
            username = %username,
            "Consultation started"
        );
        Ok(consultation)
    }

    async fn save_completion(&self, consultation: &Consultation) -> AppResult<bool> {
        let object_id = ObjectId::parse_str(&consultation.id)
            .map_err(|_| AppError::not_found("Consultation not found or already closed"))?;

        let (Some(end_time), Some(duration)) = (consultation.end_time, consultation.duration_secs)
        else {
            return Err(AppError::internal("Consultation has not been completed"));
        };

        let result = self
            .collection
            .update_one(
                doc! {
                    "_id": object_id,
                    "doctor_username": consultation.doctor_username.as_str(),
                    "status": ConsultationStatus::Active.as_str(),
                },
                doc! {
                    "$set": {
                        "end_time": to_bson(end_time),
                        "duration": duration,
                        "status": ConsultationStatus::Completed.as_str(),
                    }
                },
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn list_completed(&self, username: &str) -> AppResult<Vec<Consultation>> {
        self.find_many(doc! {
            "doctor_username": username,
            "status": ConsultationStatus::Completed.as_str(),
        })
        .await
    }

    async fn list_started_in(
        &self,
        username: &str,
        window: TimeWindow,
    ) -> AppResult<Vec<Consultation>> {
        self.find_many(window_filter(username, window)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_filter_open_end() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let filter = window_filter("dr", TimeWindow { start, end: None });

        let range = filter.get_document("start_time").unwrap();
        assert!(range.contains_key("$gte"));
        assert!(!range.contains_key("$lt"));
        assert_eq!(filter.get_str("doctor_username").unwrap(), "dr");
    }

    #[test]
    fn test_window_filter_closed_end() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let filter = window_filter("dr", TimeWindow { start, end: Some(end) });

        let range = filter.get_document("start_time").unwrap();
        assert_eq!(range.get_datetime("$lt").unwrap(), &to_bson(end));
    }
}
