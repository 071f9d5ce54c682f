//! Index definitions, applied on every start.
//!
//! `createIndexes` is idempotent, so there is no version table.

use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    IndexModel,
};

use crate::config::{COLLECTION_CONSULTATIONS, COLLECTION_USERS};
use crate::errors::AppResult;

pub(super) async fn ensure(db: &mongodb::Database) -> AppResult<()> {
    db.collection::<Document>(COLLECTION_USERS)
        .create_index(unique_username())
        .await?;

    db.collection::<Document>(COLLECTION_CONSULTATIONS)
        .create_indexes([one_active_per_doctor(), doctor_by_start_time()])
        .await?;

    Ok(())
}

fn unique_username() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "username": 1 })
        .options(
            IndexOptions::builder()
                .name("username_unique".to_string())
                .unique(true)
                .build(),
        )
        .build()
}

/// At most one active consultation per doctor.
fn one_active_per_doctor() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "doctor_username": 1 })
        .options(
            IndexOptions::builder()
                .name("one_active_consultation_per_doctor".to_string())
                .unique(true)
                .partial_filter_expression(doc! { "status": "active" })
                .build(),
        )
        .build()
}

fn doctor_by_start_time() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "doctor_username": 1, "start_time": -1 })
        .options(
            IndexOptions::builder()
                .name("doctor_start_time".to_string())
                .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_index_is_partial_and_unique() {
        let index = one_active_per_doctor();
        let options = index.options.unwrap();
        assert_eq!(options.unique, Some(true));
        assert_eq!(
            options.partial_filter_expression,
            Some(doc! { "status": "active" })
        );
    }

    #[test]
    fn test_username_index_is_unique() {
        let index = unique_username();
        assert_eq!(index.keys, doc! { "username": 1 });
        assert_eq!(index.options.unwrap().unique, Some(true));
    }
}
