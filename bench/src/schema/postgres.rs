//! Normalized schema: users, projects and sprints in separate tables joined
//! on foreign keys.
//!
//! Inserts run row by row, three statements per project hierarchy, with the
//! generated ids propagated from parent to child through `RETURNING id`.

use super::BenchSchema;
use crate::operation::{FindQuery, SPRINT_DURATION_THRESHOLD};
use anyhow::{Context, Result};
use async_trait::async_trait;
use dbi_core::models::Project;
use tokio_postgres::Client;

const JOINED_TABLES: &str = "FROM sprints \
     INNER JOIN projects ON sprints.project_id = projects.id \
     INNER JOIN users ON projects.owner_id = users.id";

const PROJECTED_COLUMNS: &str = "projects.name, projects.identifier, projects.invite_code, \
     users.username, users.first_name, users.last_name, \
     sprints.name, sprints.start_date, sprints.end_date";

const INSERT_USER: &str =
    "INSERT INTO users (username, first_name, last_name) VALUES ($1, $2, $3) RETURNING id";
const INSERT_PROJECT: &str = "INSERT INTO projects (name, identifier, invite_code, sprint_duration, owner_id) \
     VALUES ($1, $2, $3, $4, $5) RETURNING id";
const INSERT_SPRINT: &str =
    "INSERT INTO sprints (name, project_id, start_date, end_date) VALUES ($1, $2, $3, $4)";

const AGGREGATE_BY_OWNER: &str = "SELECT users.username AS owner, COUNT(*) AS count \
     FROM projects INNER JOIN users ON projects.owner_id = users.id \
     GROUP BY users.username";

pub struct PostgresSchema {
    client: Client,
}

impl PostgresSchema {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Builds the three-way join for `query`.
pub fn find_sql(query: FindQuery) -> String {
    let columns = if query.projection {
        PROJECTED_COLUMNS
    } else {
        "*"
    };
    let mut sql = format!("SELECT {columns} {JOINED_TABLES}");
    if query.filter {
        sql.push_str(&format!(
            " WHERE projects.sprint_duration > {SPRINT_DURATION_THRESHOLD}"
        ));
    }
    if query.sort {
        sql.push_str(" ORDER BY sprints.start_date DESC");
    }
    sql
}

#[async_trait]
impl BenchSchema for PostgresSchema {
    async fn insert(&self, projects: &[Project]) -> Result<u64> {
        let insert_user = self.client.prepare(INSERT_USER).await?;
        let insert_project = self.client.prepare(INSERT_PROJECT).await?;
        let insert_sprint = self.client.prepare(INSERT_SPRINT).await?;

        let mut inserted = 0;
        for project in projects {
            let owner = &project.owner;
            let user_id: i32 = self
                .client
                .query_one(
                    &insert_user,
                    &[&owner.username, &owner.first_name, &owner.last_name],
                )
                .await
                .context("inserting user")?
                .get(0);

            let project_id: i32 = self
                .client
                .query_one(
                    &insert_project,
                    &[
                        &project.name,
                        &project.identifier,
                        &project.invite_code,
                        &project.sprint_duration,
                        &user_id,
                    ],
                )
                .await
                .context("inserting project")?
                .get(0);

            for sprint in &project.sprints {
                self.client
                    .execute(
                        &insert_sprint,
                        &[&sprint.name, &project_id, &sprint.start_date, &sprint.end_date],
                    )
                    .await
                    .context("inserting sprint")?;
            }
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn find(&self, query: FindQuery) -> Result<u64> {
        let rows = self.client.query(find_sql(query).as_str(), &[]).await?;
        Ok(rows.len() as u64)
    }

    async fn aggregate(&self) -> Result<u64> {
        let rows = self.client.query(AGGREGATE_BY_OWNER, &[]).await?;
        Ok(rows.len() as u64)
    }

    async fn update_sprint_start(&self, offset: i64) -> Result<u64> {
        let updated = self
            .client
            .execute(
                "UPDATE sprints SET start_date = start_date + $1",
                &[&offset],
            )
            .await?;
        Ok(updated)
    }

    async fn delete_all(&self) -> Result<u64> {
        // Children first; the foreign keys do not cascade.
        let mut deleted = 0;
        for table in ["sprints", "projects", "users"] {
            deleted += self
                .client
                .execute(format!("DELETE FROM {table}").as_str(), &[])
                .await
                .with_context(|| format!("deleting from {table}"))?;
        }
        Ok(deleted)
    }

    async fn sprint_start_dates(&self) -> Result<Vec<i64>> {
        let rows = self
            .client
            .query("SELECT start_date FROM sprints ORDER BY id", &[])
            .await?;
        Ok(rows.iter().map(|row| row.get::<_, i64>(0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_find_selects_everything_from_the_join() {
        let sql = find_sql(FindQuery::ALL);
        assert!(sql.starts_with("SELECT * FROM sprints"));
        assert!(sql.contains("INNER JOIN users ON projects.owner_id = users.id"));
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn filter_projection_and_sort_compose() {
        let sql = find_sql(FindQuery {
            filter: true,
            projection: true,
            sort: true,
        });
        assert!(sql.starts_with("SELECT projects.name, projects.identifier"));
        assert!(sql.contains("WHERE projects.sprint_duration > 50"));
        assert!(sql.ends_with("ORDER BY sprints.start_date DESC"));
    }

    #[test]
    fn projection_covers_owner_and_sprint_fields() {
        let sql = find_sql(FindQuery {
            filter: true,
            projection: true,
            sort: false,
        });
        for column in [
            "projects.invite_code",
            "users.first_name",
            "users.last_name",
            "sprints.start_date",
            "sprints.end_date",
        ] {
            assert!(sql.contains(column), "missing {column}");
        }
    }
}
