//! Single-document CRUD against the `crud_users`, `crud_projects` and
//! `crud_sprints` collections. Projects reference their owner through
//! `owner_id` and sprints their project through `project_id`, both stored as
//! object ids. The prefix keeps them apart from the benchmark collections,
//! which are wiped at the start of every batch.

use crate::error::ApiError;
use crate::helpers::{name_contains, parse_number, parse_object_id};
use crate::types::{ProjectForm, ProjectRow, SprintForm, SprintRow, UserForm, UserRow};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

pub const USERS: &str = "crud_users";
pub const PROJECTS: &str = "crud_projects";
pub const SPRINTS: &str = "crud_sprints";

fn collection(db: &Database, name: &str) -> Collection<Document> {
    db.collection::<Document>(name)
}

fn hex_id(document: &Document, key: &str) -> String {
    match document.get(key) {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(value)) => value.clone(),
        _ => String::new(),
    }
}

fn text(document: &Document, key: &str) -> String {
    document.get_str(key).unwrap_or_default().to_string()
}

fn integer(document: &Document, key: &str) -> i64 {
    match document.get(key) {
        Some(Bson::Int32(value)) => i64::from(*value),
        Some(Bson::Int64(value)) => *value,
        Some(Bson::Double(value)) => *value as i64,
        _ => 0,
    }
}

pub(crate) fn user_row(document: &Document) -> UserRow {
    UserRow {
        id: hex_id(document, "_id"),
        username: text(document, "username"),
        first_name: text(document, "first_name"),
        last_name: text(document, "last_name"),
    }
}

pub(crate) fn project_row(document: &Document) -> ProjectRow {
    ProjectRow {
        id: hex_id(document, "_id"),
        name: text(document, "name"),
        identifier: text(document, "identifier"),
        invite_code: text(document, "invite_code"),
        sprint_duration: i32::try_from(integer(document, "sprint_duration")).unwrap_or_default(),
        owner_id: hex_id(document, "owner_id"),
    }
}

pub(crate) fn sprint_row(document: &Document) -> SprintRow {
    SprintRow {
        id: hex_id(document, "_id"),
        name: text(document, "name"),
        start_date: integer(document, "start_date"),
        end_date: integer(document, "end_date"),
        project_id: hex_id(document, "project_id"),
    }
}

pub(crate) fn user_document(form: &UserForm) -> Document {
    doc! {
        "username": form.username.as_str(),
        "first_name": form.first_name.as_str(),
        "last_name": form.last_name.as_str(),
    }
}

pub(crate) fn project_document(form: &ProjectForm) -> Result<Document, ApiError> {
    let sprint_duration: i32 = parse_number("sprint_duration", &form.sprint_duration)?;
    let owner_id = parse_object_id("owner_id", &form.owner_id)?;
    Ok(doc! {
        "name": form.name.as_str(),
        "identifier": form.identifier.as_str(),
        "invite_code": form.invite_code.as_str(),
        "sprint_duration": sprint_duration,
        "owner_id": owner_id,
    })
}

pub(crate) fn sprint_document(form: &SprintForm) -> Result<Document, ApiError> {
    let start_date: i64 = parse_number("start_date", &form.start_date)?;
    let end_date: i64 = parse_number("end_date", &form.end_date)?;
    let project_id = parse_object_id("project_id", &form.project_id)?;
    Ok(doc! {
        "name": form.name.as_str(),
        "start_date": start_date,
        "end_date": end_date,
        "project_id": project_id,
    })
}

async fn list(db: &Database, name: &str, filter: Document) -> Result<Vec<Document>, ApiError> {
    let oldest_first = FindOptions::builder().sort(doc! { "_id": 1 }).build();
    let cursor = collection(db, name).find(filter, oldest_first).await?;
    Ok(cursor.try_collect::<Vec<Document>>().await?)
}

async fn get(db: &Database, name: &str, what: &str, id: &str) -> Result<Document, ApiError> {
    let oid = parse_object_id("id", id)?;
    collection(db, name)
        .find_one(doc! { "_id": oid }, None)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{what} {oid} does not exist")))
}

async fn insert(db: &Database, name: &str, document: Document) -> Result<(), ApiError> {
    collection(db, name).insert_one(document, None).await?;
    Ok(())
}

async fn update(
    db: &Database,
    name: &str,
    what: &str,
    id: &str,
    fields: Document,
) -> Result<(), ApiError> {
    let oid: ObjectId = parse_object_id("id", id)?;
    let result = collection(db, name)
        .update_one(doc! { "_id": oid }, doc! { "$set": fields }, None)
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound(format!("{what} {oid} does not exist")));
    }
    Ok(())
}

async fn delete(db: &Database, name: &str, what: &str, id: &str) -> Result<(), ApiError> {
    let oid = parse_object_id("id", id)?;
    let result = collection(db, name)
        .delete_one(doc! { "_id": oid }, None)
        .await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound(format!("{what} {oid} does not exist")));
    }
    Ok(())
}

// Users

pub(crate) async fn list_users(db: &Database) -> Result<Vec<UserRow>, ApiError> {
    let documents = list(db, USERS, Document::new()).await?;
    Ok(documents.iter().map(user_row).collect())
}

pub(crate) async fn get_user(db: &Database, id: &str) -> Result<UserRow, ApiError> {
    Ok(user_row(&get(db, USERS, "user", id).await?))
}

pub(crate) async fn insert_user(db: &Database, form: &UserForm) -> Result<(), ApiError> {
    insert(db, USERS, user_document(form)).await
}

pub(crate) async fn update_user(db: &Database, id: &str, form: &UserForm) -> Result<(), ApiError> {
    update(db, USERS, "user", id, user_document(form)).await
}

pub(crate) async fn delete_user(db: &Database, id: &str) -> Result<(), ApiError> {
    delete(db, USERS, "user", id).await
}

// Projects

pub(crate) async fn list_projects(
    db: &Database,
    search: Option<&str>,
) -> Result<Vec<ProjectRow>, ApiError> {
    let filter = search.map(name_contains).unwrap_or_default();
    let documents = list(db, PROJECTS, filter).await?;
    Ok(documents.iter().map(project_row).collect())
}

pub(crate) async fn get_project(db: &Database, id: &str) -> Result<ProjectRow, ApiError> {
    Ok(project_row(&get(db, PROJECTS, "project", id).await?))
}

pub(crate) async fn insert_project(db: &Database, form: &ProjectForm) -> Result<(), ApiError> {
    insert(db, PROJECTS, project_document(form)?).await
}

pub(crate) async fn update_project(
    db: &Database,
    id: &str,
    form: &ProjectForm,
) -> Result<(), ApiError> {
    update(db, PROJECTS, "project", id, project_document(form)?).await
}

pub(crate) async fn delete_project(db: &Database, id: &str) -> Result<(), ApiError> {
    delete(db, PROJECTS, "project", id).await
}

// Sprints

pub(crate) async fn list_sprints(db: &Database) -> Result<Vec<SprintRow>, ApiError> {
    let documents = list(db, SPRINTS, Document::new()).await?;
    Ok(documents.iter().map(sprint_row).collect())
}

pub(crate) async fn get_sprint(db: &Database, id: &str) -> Result<SprintRow, ApiError> {
    Ok(sprint_row(&get(db, SPRINTS, "sprint", id).await?))
}

pub(crate) async fn insert_sprint(db: &Database, form: &SprintForm) -> Result<(), ApiError> {
    insert(db, SPRINTS, sprint_document(form)?).await
}

pub(crate) async fn update_sprint(
    db: &Database,
    id: &str,
    form: &SprintForm,
) -> Result<(), ApiError> {
    update(db, SPRINTS, "sprint", id, sprint_document(form)?).await
}

pub(crate) async fn delete_sprint(db: &Database, id: &str) -> Result<(), ApiError> {
    delete(db, SPRINTS, "sprint", id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_form(owner_id: &str) -> ProjectForm {
        ProjectForm {
            name: "Apollo".to_string(),
            identifier: "APL".to_string(),
            invite_code: "join-me".to_string(),
            sprint_duration: "14".to_string(),
            owner_id: owner_id.to_string(),
        }
    }

    #[test]
    fn project_documents_store_typed_references() {
        let owner = ObjectId::new();
        let document = project_document(&project_form(&owner.to_hex())).unwrap();
        assert_eq!(document.get_object_id("owner_id").unwrap(), owner);
        assert_eq!(document.get_i32("sprint_duration").unwrap(), 14);
    }

    #[test]
    fn project_documents_reject_bad_owner_ids() {
        assert!(matches!(
            project_document(&project_form("17")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn sprint_documents_parse_timestamps() {
        let project = ObjectId::new();
        let form = SprintForm {
            name: "Sprint 1".to_string(),
            start_date: "1700000000".to_string(),
            end_date: "1700086400".to_string(),
            project_id: project.to_hex(),
        };
        let document = sprint_document(&form).unwrap();
        assert_eq!(document.get_i64("start_date").unwrap(), 1_700_000_000);
        assert_eq!(document.get_object_id("project_id").unwrap(), project);

        let bad = SprintForm {
            end_date: "tomorrow".to_string(),
            ..form
        };
        assert!(sprint_document(&bad).is_err());
    }

    #[test]
    fn rows_tolerate_missing_and_loosely_typed_fields() {
        let oid = ObjectId::new();
        let row = project_row(&doc! {
            "_id": oid,
            "name": "Apollo",
            "sprint_duration": 30_i64,
            "owner_id": "legacy-owner",
        });
        assert_eq!(row.id, oid.to_hex());
        assert_eq!(row.sprint_duration, 30);
        assert_eq!(row.owner_id, "legacy-owner");
        assert_eq!(row.identifier, "");

        let sprint = sprint_row(&doc! { "start_date": 5_i32 });
        assert_eq!(sprint.start_date, 5);
        assert_eq!(sprint.id, "");
    }

    #[test]
    fn out_of_range_durations_read_as_zero() {
        let row = project_row(&doc! { "sprint_duration": 5_000_000_000_i64 });
        assert_eq!(row.sprint_duration, 0);
        let row = project_row(&doc! { "sprint_duration": -1e12 });
        assert_eq!(row.sprint_duration, 0);
        let row = project_row(&doc! { "sprint_duration": 21.0 });
        assert_eq!(row.sprint_duration, 21);
    }

    #[test]
    fn collections_do_not_overlap_benchmark_collections() {
        use dbi_core::infra::{PROJECTS_COLLECTION, VALIDATED_PROJECTS_COLLECTION};

        for name in [USERS, PROJECTS, SPRINTS] {
            assert!(name.starts_with("crud_"), "{name}");
            assert_ne!(name, PROJECTS_COLLECTION);
            assert_ne!(name, VALIDATED_PROJECTS_COLLECTION);
        }
    }
}
