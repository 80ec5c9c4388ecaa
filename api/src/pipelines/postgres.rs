//! Single-statement CRUD against the relational tables.

use crate::error::ApiError;
use crate::helpers::{like_pattern, parse_number, parse_pg_id};
use crate::types::{ProjectForm, ProjectRow, SprintForm, SprintRow, UserForm, UserRow};
use tokio_postgres::{Client, Row};

fn user_row(row: &Row) -> UserRow {
    UserRow {
        id: row.get::<_, i32>("id").to_string(),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
    }
}

fn project_row(row: &Row) -> ProjectRow {
    ProjectRow {
        id: row.get::<_, i32>("id").to_string(),
        name: row.get("name"),
        identifier: row.get("identifier"),
        invite_code: row.get("invite_code"),
        sprint_duration: row.get("sprint_duration"),
        owner_id: row.get::<_, i32>("owner_id").to_string(),
    }
}

fn sprint_row(row: &Row) -> SprintRow {
    SprintRow {
        id: row.get::<_, i32>("id").to_string(),
        name: row.get("name"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        project_id: row.get::<_, i32>("project_id").to_string(),
    }
}

/// Fails with `NotFound` when a write touched no row.
fn expect_affected(affected: u64, what: &str, id: i32) -> Result<(), ApiError> {
    if affected == 0 {
        return Err(ApiError::NotFound(format!("{what} {id} does not exist")));
    }
    Ok(())
}

// Users

pub(crate) async fn list_users(client: &Client) -> Result<Vec<UserRow>, ApiError> {
    let rows = client
        .query(
            "SELECT id, username, first_name, last_name FROM users ORDER BY id",
            &[],
        )
        .await?;
    Ok(rows.iter().map(user_row).collect())
}

pub(crate) async fn get_user(client: &Client, id: &str) -> Result<UserRow, ApiError> {
    let id = parse_pg_id("id", id)?;
    client
        .query_opt(
            "SELECT id, username, first_name, last_name FROM users WHERE id = $1",
            &[&id],
        )
        .await?
        .map(|row| user_row(&row))
        .ok_or_else(|| ApiError::NotFound(format!("user {id} does not exist")))
}

pub(crate) async fn insert_user(client: &Client, form: &UserForm) -> Result<(), ApiError> {
    client
        .execute(
            "INSERT INTO users (username, first_name, last_name) VALUES ($1, $2, $3)",
            &[&form.username, &form.first_name, &form.last_name],
        )
        .await?;
    Ok(())
}

pub(crate) async fn update_user(client: &Client, id: &str, form: &UserForm) -> Result<(), ApiError> {
    let id = parse_pg_id("id", id)?;
    let affected = client
        .execute(
            "UPDATE users SET username = $1, first_name = $2, last_name = $3 WHERE id = $4",
            &[&form.username, &form.first_name, &form.last_name, &id],
        )
        .await?;
    expect_affected(affected, "user", id)
}

pub(crate) async fn delete_user(client: &Client, id: &str) -> Result<(), ApiError> {
    let id = parse_pg_id("id", id)?;
    let affected = client
        .execute("DELETE FROM users WHERE id = $1", &[&id])
        .await?;
    expect_affected(affected, "user", id)
}

// Projects

pub(crate) async fn list_projects(
    client: &Client,
    search: Option<&str>,
) -> Result<Vec<ProjectRow>, ApiError> {
    const COLUMNS: &str = "SELECT id, name, identifier, invite_code, sprint_duration, owner_id FROM projects";
    let rows = match search {
        Some(term) => {
            client
                .query(
                    format!("{COLUMNS} WHERE name LIKE $1 ORDER BY id").as_str(),
                    &[&like_pattern(term)],
                )
                .await?
        }
        None => {
            client
                .query(format!("{COLUMNS} ORDER BY id").as_str(), &[])
                .await?
        }
    };
    Ok(rows.iter().map(project_row).collect())
}

pub(crate) async fn get_project(client: &Client, id: &str) -> Result<ProjectRow, ApiError> {
    let id = parse_pg_id("id", id)?;
    client
        .query_opt(
            "SELECT id, name, identifier, invite_code, sprint_duration, owner_id \
             FROM projects WHERE id = $1",
            &[&id],
        )
        .await?
        .map(|row| project_row(&row))
        .ok_or_else(|| ApiError::NotFound(format!("project {id} does not exist")))
}

pub(crate) async fn insert_project(client: &Client, form: &ProjectForm) -> Result<(), ApiError> {
    let sprint_duration: i32 = parse_number("sprint_duration", &form.sprint_duration)?;
    let owner_id = parse_pg_id("owner_id", &form.owner_id)?;
    client
        .execute(
            "INSERT INTO projects (name, identifier, invite_code, sprint_duration, owner_id) \
             VALUES ($1, $2, $3, $4, $5)",
            &[
                &form.name,
                &form.identifier,
                &form.invite_code,
                &sprint_duration,
                &owner_id,
            ],
        )
        .await?;
    Ok(())
}

pub(crate) async fn update_project(
    client: &Client,
    id: &str,
    form: &ProjectForm,
) -> Result<(), ApiError> {
    let id = parse_pg_id("id", id)?;
    let sprint_duration: i32 = parse_number("sprint_duration", &form.sprint_duration)?;
    let owner_id = parse_pg_id("owner_id", &form.owner_id)?;
    let affected = client
        .execute(
            "UPDATE projects SET name = $1, identifier = $2, invite_code = $3, \
             sprint_duration = $4, owner_id = $5 WHERE id = $6",
            &[
                &form.name,
                &form.identifier,
                &form.invite_code,
                &sprint_duration,
                &owner_id,
                &id,
            ],
        )
        .await?;
    expect_affected(affected, "project", id)
}

pub(crate) async fn delete_project(client: &Client, id: &str) -> Result<(), ApiError> {
    let id = parse_pg_id("id", id)?;
    let affected = client
        .execute("DELETE FROM projects WHERE id = $1", &[&id])
        .await?;
    expect_affected(affected, "project", id)
}

// Sprints

pub(crate) async fn list_sprints(client: &Client) -> Result<Vec<SprintRow>, ApiError> {
    let rows = client
        .query(
            "SELECT id, name, start_date, end_date, project_id FROM sprints ORDER BY id",
            &[],
        )
        .await?;
    Ok(rows.iter().map(sprint_row).collect())
}

pub(crate) async fn get_sprint(client: &Client, id: &str) -> Result<SprintRow, ApiError> {
    let id = parse_pg_id("id", id)?;
    client
        .query_opt(
            "SELECT id, name, start_date, end_date, project_id FROM sprints WHERE id = $1",
            &[&id],
        )
        .await?
        .map(|row| sprint_row(&row))
        .ok_or_else(|| ApiError::NotFound(format!("sprint {id} does not exist")))
}

pub(crate) async fn insert_sprint(client: &Client, form: &SprintForm) -> Result<(), ApiError> {
    let start_date: i64 = parse_number("start_date", &form.start_date)?;
    let end_date: i64 = parse_number("end_date", &form.end_date)?;
    let project_id = parse_pg_id("project_id", &form.project_id)?;
    client
        .execute(
            "INSERT INTO sprints (name, start_date, end_date, project_id) VALUES ($1, $2, $3, $4)",
            &[&form.name, &start_date, &end_date, &project_id],
        )
        .await?;
    Ok(())
}

pub(crate) async fn update_sprint(
    client: &Client,
    id: &str,
    form: &SprintForm,
) -> Result<(), ApiError> {
    let id = parse_pg_id("id", id)?;
    let start_date: i64 = parse_number("start_date", &form.start_date)?;
    let end_date: i64 = parse_number("end_date", &form.end_date)?;
    let project_id = parse_pg_id("project_id", &form.project_id)?;
    let affected = client
        .execute(
            "UPDATE sprints SET name = $1, start_date = $2, end_date = $3, project_id = $4 \
             WHERE id = $5",
            &[&form.name, &start_date, &end_date, &project_id, &id],
        )
        .await?;
    expect_affected(affected, "sprint", id)
}

pub(crate) async fn delete_sprint(client: &Client, id: &str) -> Result<(), ApiError> {
    let id = parse_pg_id("id", id)?;
    let affected = client
        .execute("DELETE FROM sprints WHERE id = $1", &[&id])
        .await?;
    expect_affected(affected, "sprint", id)
}
