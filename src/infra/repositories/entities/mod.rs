//! MongoDB document definitions
//!
//! These are storage-specific shapes separate from domain models.

pub mod consultation;
pub mod user;

pub use consultation::ConsultationDocument;
pub use user::UserDocument;

use chrono::{DateTime, Utc};
use mongodb::bson;

pub(crate) fn to_bson(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

pub(crate) fn from_bson(at: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or_default()
}
