//! Document schemas, parameterized by layout.
//!
//! - [`DocumentLayout::Embedded`]: one document per project with the owner
//!   and sprints nested inside it. The plain, indexed and remote variants all
//!   use this layout and differ only in the collection and client they target.
//! - [`DocumentLayout::Referenced`]: users, projects and sprints in separate
//!   collections linked by object id, mirroring the relational tables. Reads
//!   join them back together with `$lookup`.

use super::BenchSchema;
use crate::operation::{FindQuery, SPRINT_DURATION_THRESHOLD};
use anyhow::{Context, Result};
use async_trait::async_trait;
use dbi_core::models::Project;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::FindOptions;
use mongodb::{Collection, Cursor, Database};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLayout {
    Embedded {
        collection: String,
    },
    Referenced {
        users: String,
        projects: String,
        sprints: String,
    },
}

impl DocumentLayout {
    pub fn embedded(collection: &str) -> Self {
        DocumentLayout::Embedded {
            collection: collection.to_string(),
        }
    }

    pub fn referenced(users: &str, projects: &str, sprints: &str) -> Self {
        DocumentLayout::Referenced {
            users: users.to_string(),
            projects: projects.to_string(),
            sprints: sprints.to_string(),
        }
    }
}

pub struct MongoSchema {
    db: Database,
    layout: DocumentLayout,
}

impl MongoSchema {
    pub fn new(db: Database, layout: DocumentLayout) -> Self {
        Self { db, layout }
    }

    fn documents(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

pub fn sprint_duration_filter() -> Document {
    doc! { "sprint_duration": { "$gt": SPRINT_DURATION_THRESHOLD } }
}

/// Fields kept by projected finds, in the embedded document shape.
pub fn projection() -> Document {
    doc! {
        "name": 1,
        "identifier": 1,
        "invite_code": 1,
        "owner.username": 1,
        "owner.first_name": 1,
        "owner.last_name": 1,
        "sprints.name": 1,
        "sprints.start_date": 1,
        "sprints.end_date": 1,
    }
}

fn newest_sprint_first() -> Document {
    doc! { "sprints.start_date": -1 }
}

/// Filter and options for a find against an embedded collection.
pub fn embedded_find(query: FindQuery) -> (Document, FindOptions) {
    let filter = if query.filter {
        sprint_duration_filter()
    } else {
        Document::new()
    };
    let options = FindOptions::builder()
        .projection(query.projection.then(projection))
        .sort(query.sort.then(newest_sprint_first))
        .build();
    (filter, options)
}

/// Aggregation pipeline rebuilding the embedded shape from referenced
/// collections, with the clauses of `query` applied.
pub fn referenced_find_pipeline(query: FindQuery, users: &str, sprints: &str) -> Vec<Document> {
    let mut pipeline = Vec::new();
    if query.filter {
        pipeline.push(doc! { "$match": sprint_duration_filter() });
    }
    pipeline.push(doc! {
        "$lookup": { "from": users, "localField": "owner", "foreignField": "_id", "as": "owner" }
    });
    pipeline.push(doc! { "$unwind": "$owner" });
    pipeline.push(doc! {
        "$lookup": { "from": sprints, "localField": "_id", "foreignField": "project", "as": "sprints" }
    });
    if query.projection {
        pipeline.push(doc! { "$project": projection() });
    }
    if query.sort {
        pipeline.push(doc! { "$sort": newest_sprint_first() });
    }
    pipeline
}

fn group_by_owner() -> Document {
    doc! { "$group": { "_id": "$owner.username", "count": { "$sum": 1 } } }
}

pub fn embedded_aggregate_pipeline() -> Vec<Document> {
    vec![group_by_owner()]
}

pub fn referenced_aggregate_pipeline(users: &str) -> Vec<Document> {
    vec![
        doc! {
            "$lookup": { "from": users, "localField": "owner", "foreignField": "_id", "as": "owner" }
        },
        doc! { "$unwind": "$owner" },
        group_by_owner(),
    ]
}

async fn count_documents(mut cursor: Cursor<Document>) -> Result<u64> {
    let mut seen = 0;
    while cursor.advance().await? {
        seen += 1;
    }
    Ok(seen)
}

async fn insert_embedded(collection: Collection<Project>, projects: &[Project]) -> Result<u64> {
    let mut inserted = 0;
    for project in projects {
        collection
            .insert_one(project, None)
            .await
            .context("inserting project document")?;
        inserted += 1;
    }
    Ok(inserted)
}

#[async_trait]
impl BenchSchema for MongoSchema {
    async fn insert(&self, projects: &[Project]) -> Result<u64> {
        match &self.layout {
            DocumentLayout::Embedded { collection } => {
                insert_embedded(self.db.collection::<Project>(collection), projects).await
            }
            DocumentLayout::Referenced {
                users,
                projects: project_collection,
                sprints,
            } => {
                let users = self.documents(users);
                let project_collection = self.documents(project_collection);
                let sprints = self.documents(sprints);

                let mut inserted = 0;
                for project in projects {
                    let owner = &project.owner;
                    let owner_id = users
                        .insert_one(
                            doc! {
                                "username": owner.username.as_str(),
                                "first_name": owner.first_name.as_str(),
                                "last_name": owner.last_name.as_str(),
                            },
                            None,
                        )
                        .await
                        .context("inserting user document")?
                        .inserted_id;

                    let project_id = project_collection
                        .insert_one(
                            doc! {
                                "name": project.name.as_str(),
                                "identifier": project.identifier.as_str(),
                                "invite_code": project.invite_code.as_str(),
                                "sprint_duration": project.sprint_duration,
                                "owner": owner_id,
                            },
                            None,
                        )
                        .await
                        .context("inserting project document")?
                        .inserted_id;

                    for sprint in &project.sprints {
                        sprints
                            .insert_one(
                                doc! {
                                    "name": sprint.name.as_str(),
                                    "project": project_id.clone(),
                                    "start_date": sprint.start_date,
                                    "end_date": sprint.end_date,
                                },
                                None,
                            )
                            .await
                            .context("inserting sprint document")?;
                    }
                    inserted += 1;
                }
                Ok(inserted)
            }
        }
    }

    async fn find(&self, query: FindQuery) -> Result<u64> {
        let cursor = match &self.layout {
            DocumentLayout::Embedded { collection } => {
                let (filter, options) = embedded_find(query);
                self.documents(collection).find(filter, options).await?
            }
            DocumentLayout::Referenced {
                users,
                projects,
                sprints,
            } => {
                self.documents(projects)
                    .aggregate(referenced_find_pipeline(query, users, sprints), None)
                    .await?
            }
        };
        count_documents(cursor).await
    }

    async fn aggregate(&self) -> Result<u64> {
        let cursor = match &self.layout {
            DocumentLayout::Embedded { collection } => {
                self.documents(collection)
                    .aggregate(embedded_aggregate_pipeline(), None)
                    .await?
            }
            DocumentLayout::Referenced {
                users, projects, ..
            } => {
                self.documents(projects)
                    .aggregate(referenced_aggregate_pipeline(users), None)
                    .await?
            }
        };
        count_documents(cursor).await
    }

    async fn update_sprint_start(&self, offset: i64) -> Result<u64> {
        let result = match &self.layout {
            DocumentLayout::Embedded { collection } => {
                self.documents(collection)
                    .update_many(
                        doc! {},
                        doc! { "$inc": { "sprints.$[].start_date": offset } },
                        None,
                    )
                    .await?
            }
            DocumentLayout::Referenced { sprints, .. } => {
                self.documents(sprints)
                    .update_many(doc! {}, doc! { "$inc": { "start_date": offset } }, None)
                    .await?
            }
        };
        Ok(result.modified_count)
    }

    async fn delete_all(&self) -> Result<u64> {
        let collections: Vec<&String> = match &self.layout {
            DocumentLayout::Embedded { collection } => vec![collection],
            DocumentLayout::Referenced {
                users,
                projects,
                sprints,
            } => vec![sprints, projects, users],
        };

        let mut deleted = 0;
        for name in collections {
            deleted += self
                .documents(name)
                .delete_many(doc! {}, None)
                .await
                .with_context(|| format!("deleting from {name}"))?
                .deleted_count;
        }
        Ok(deleted)
    }

    async fn sprint_start_dates(&self) -> Result<Vec<i64>> {
        let oldest_first = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let mut dates = Vec::new();
        match &self.layout {
            DocumentLayout::Embedded { collection } => {
                let mut cursor = self.documents(collection).find(doc! {}, oldest_first).await?;
                while let Some(project) = cursor.try_next().await? {
                    for sprint in project.get_array("sprints")? {
                        let sprint = sprint
                            .as_document()
                            .context("sprint entry is not a document")?;
                        dates.push(sprint.get_i64("start_date")?);
                    }
                }
            }
            DocumentLayout::Referenced { sprints, .. } => {
                let mut cursor = self.documents(sprints).find(doc! {}, oldest_first).await?;
                while let Some(sprint) = cursor.try_next().await? {
                    dates.push(sprint.get_i64("start_date")?);
                }
            }
        }
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_names(pipeline: &[Document]) -> Vec<String> {
        pipeline
            .iter()
            .map(|stage| stage.keys().next().cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn embedded_find_without_clauses_is_a_bare_scan() {
        let (filter, options) = embedded_find(FindQuery::ALL);
        assert!(filter.is_empty());
        assert!(options.projection.is_none());
        assert!(options.sort.is_none());
    }

    #[test]
    fn embedded_find_applies_filter_projection_and_sort() {
        let (filter, options) = embedded_find(FindQuery {
            filter: true,
            projection: true,
            sort: true,
        });
        let threshold = filter
            .get_document("sprint_duration")
            .unwrap()
            .get_i32("$gt")
            .unwrap();
        assert_eq!(threshold, SPRINT_DURATION_THRESHOLD);
        assert_eq!(options.projection, Some(projection()));
        assert_eq!(options.sort, Some(doc! { "sprints.start_date": -1 }));
    }

    #[test]
    fn referenced_find_joins_owner_and_sprints() {
        let pipeline = referenced_find_pipeline(FindQuery::ALL, "ref_users", "ref_sprints");
        assert_eq!(stage_names(&pipeline), ["$lookup", "$unwind", "$lookup"]);
        let owner_lookup = pipeline[0].get_document("$lookup").unwrap();
        assert_eq!(owner_lookup.get_str("from").unwrap(), "ref_users");
        let sprint_lookup = pipeline[2].get_document("$lookup").unwrap();
        assert_eq!(sprint_lookup.get_str("foreignField").unwrap(), "project");
    }

    #[test]
    fn referenced_find_filters_before_joining() {
        let pipeline = referenced_find_pipeline(
            FindQuery {
                filter: true,
                projection: true,
                sort: true,
            },
            "u",
            "s",
        );
        assert_eq!(
            stage_names(&pipeline),
            ["$match", "$lookup", "$unwind", "$lookup", "$project", "$sort"]
        );
    }

    #[test]
    fn aggregations_group_by_owner_username() {
        let embedded = embedded_aggregate_pipeline();
        assert_eq!(stage_names(&embedded), ["$group"]);
        let group = embedded[0].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$owner.username");

        let referenced = referenced_aggregate_pipeline("ref_users");
        assert_eq!(stage_names(&referenced), ["$lookup", "$unwind", "$group"]);
    }
}
