//! Records shared by the benchmark and the CRUD service.
//!
//! Field names double as document field names, so a [`Project`] serializes
//! straight into the embedded document shape accepted by the validated
//! `projects_index` collection.

use serde::{Deserialize, Serialize};

/// Project owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// One sprint; timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub name: String,
    pub start_date: i64,
    pub end_date: i64,
}

/// A project hierarchy as produced by the generator: one owner, its sprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub identifier: String,
    pub invite_code: String,
    pub sprint_duration: i32,
    pub owner: User,
    pub sprints: Vec<Sprint>,
}
