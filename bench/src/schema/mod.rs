//! Backend variants and the common `BenchSchema` trait.
//!
//! Two implementations are provided:
//! - [`postgres::PostgresSchema`]: normalized tables with foreign keys
//! - [`mongo::MongoSchema`]: documents, either embedded or referenced,
//!   parameterized by a [`mongo::DocumentLayout`]

pub mod mongo;
pub mod postgres;

use crate::operation::FindQuery;
use anyhow::Result;
use async_trait::async_trait;
use dbi_core::infra::{PROJECTS_COLLECTION, VALIDATED_PROJECTS_COLLECTION};
use dbi_core::models::Project;
use mongo::{DocumentLayout, MongoSchema};
use postgres::PostgresSchema;

/// Trait implemented by each storage strategy.
///
/// Each method is one logical benchmark operation; the driver owns the
/// timing, so implementations only issue the database calls. Find and
/// aggregate methods drain their result sets and return the number of
/// records seen; write methods return the number of rows or documents
/// affected.
#[async_trait]
pub trait BenchSchema: Send + Sync {
    /// Insert every project hierarchy one record at a time.
    async fn insert(&self, projects: &[Project]) -> Result<u64>;

    /// Full scan over projects joined with their owner and sprints.
    async fn find(&self, query: FindQuery) -> Result<u64>;

    /// Count projects grouped by owner username; returns the group count.
    async fn aggregate(&self) -> Result<u64>;

    /// Shift every sprint start date by `offset`.
    async fn update_sprint_start(&self, offset: i64) -> Result<u64>;

    /// Remove every seeded record.
    async fn delete_all(&self) -> Result<u64>;

    /// Start dates of all sprints in insertion order (used for verification).
    async fn sprint_start_dates(&self) -> Result<Vec<i64>>;
}

/// One configuration compared in a benchmark pass.
pub struct BackendVariant {
    /// Column header in the results table.
    pub label: String,
    /// Whether the variant gets a line on the chart page.
    pub charted: bool,
    pub schema: Box<dyn BenchSchema>,
}

impl BackendVariant {
    pub fn new(label: impl Into<String>, charted: bool, schema: impl BenchSchema + 'static) -> Self {
        Self {
            label: label.into(),
            charted,
            schema: Box::new(schema),
        }
    }
}

/// Collection names used by the referencing layout.
pub const REFERENCED_USERS: &str = "ref_users";
pub const REFERENCED_PROJECTS: &str = "ref_projects";
pub const REFERENCED_SPRINTS: &str = "ref_sprints";

/// The full comparison menu: Postgres, plain, indexed, optional remote and
/// referencing Mongo variants. Only Postgres and plain Mongo are charted.
pub fn standard_variants(
    postgres: tokio_postgres::Client,
    local: &mongodb::Database,
    remote: Option<&mongodb::Database>,
) -> Vec<BackendVariant> {
    let mut variants = vec![
        BackendVariant::new("Postgres", true, PostgresSchema::new(postgres)),
        BackendVariant::new(
            "Mongo",
            true,
            MongoSchema::new(local.clone(), DocumentLayout::embedded(PROJECTS_COLLECTION)),
        ),
        BackendVariant::new(
            "Mongo (Index)",
            false,
            MongoSchema::new(
                local.clone(),
                DocumentLayout::embedded(VALIDATED_PROJECTS_COLLECTION),
            ),
        ),
    ];

    if let Some(remote) = remote {
        variants.push(BackendVariant::new(
            "Mongo (Atlas)",
            false,
            MongoSchema::new(remote.clone(), DocumentLayout::embedded(PROJECTS_COLLECTION)),
        ));
    }

    variants.push(BackendVariant::new(
        "Mongo (Referencing)",
        false,
        MongoSchema::new(
            local.clone(),
            DocumentLayout::referenced(REFERENCED_USERS, REFERENCED_PROJECTS, REFERENCED_SPRINTS),
        ),
    ));

    variants
}
