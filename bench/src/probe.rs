//! Schema-validation probe: a project document without `name` and
//! `sprint_duration` must be rejected by the validated collection and
//! accepted by the plain one.

use crate::error::BenchError;
use dbi_core::infra::{PROJECTS_COLLECTION, VALIDATED_PROJECTS_COLLECTION};
use log::info;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::Database;

/// Server error code for `DocumentValidationFailure`.
pub const DOCUMENT_VALIDATION_FAILURE: i32 = 121;

/// A project that violates the validator: `name` and `sprint_duration` are
/// missing.
pub fn violating_project() -> Document {
    doc! {
        "identifier": "PX",
        "invite_code": "AS)D(Zaihz2e)",
        "owner": {
            "username": "maxmuster",
            "first_name": "Max",
            "last_name": "Muster",
        },
        "sprints": [
            { "name": "Sprint 1", "start_date": 0_i64, "end_date": 1_i64 },
        ],
    }
}

pub fn is_validation_failure(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DOCUMENT_VALIDATION_FAILURE
        }
        _ => false,
    }
}

/// Runs the probe against `db`. The accepted copy in the plain collection is
/// removed again before returning.
pub async fn probe_schema_validation(db: &Database) -> Result<(), BenchError> {
    let validated = db.collection::<Document>(VALIDATED_PROJECTS_COLLECTION);
    match validated.insert_one(violating_project(), None).await {
        Ok(_) => {
            return Err(BenchError::ValidationProbe(format!(
                "{VALIDATED_PROJECTS_COLLECTION} accepted a document missing required fields"
            )))
        }
        Err(err) if is_validation_failure(&err) => {
            info!("Invalid project rejected by {VALIDATED_PROJECTS_COLLECTION} as expected");
        }
        Err(err) => {
            return Err(BenchError::ValidationProbe(format!(
                "insert into {VALIDATED_PROJECTS_COLLECTION} failed for another reason: {err}"
            )))
        }
    }

    let plain = db.collection::<Document>(PROJECTS_COLLECTION);
    let inserted = plain
        .insert_one(violating_project(), None)
        .await
        .map_err(|err| {
            BenchError::ValidationProbe(format!(
                "{PROJECTS_COLLECTION} rejected an unvalidated document: {err}"
            ))
        })?;
    plain
        .delete_one(doc! { "_id": inserted.inserted_id }, None)
        .await
        .map_err(|err| {
            BenchError::ValidationProbe(format!("removing the probe document failed: {err}"))
        })?;

    info!("Invalid project accepted by {PROJECTS_COLLECTION} as expected");
    Ok(())
}
