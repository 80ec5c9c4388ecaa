use serde::Deserialize;
use std::fmt;

/// Store addressed by the first path segment of every CRUD route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Postgres,
    Mongo,
}

impl Backend {
    /// Path segment used in routes and form actions.
    pub fn slug(self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Mongo => "mongo",
        }
    }

    /// Index page the CRUD handlers redirect back to.
    pub fn index_path(self) -> &'static str {
        match self {
            Backend::Postgres => "/",
            Backend::Mongo => "/mongo",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Backend::Postgres => "PostgreSQL",
            Backend::Mongo => "MongoDB",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// Rows shown in the views. Ids are rendered as text: integer keys for
// Postgres, hex object ids for Mongo.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub identifier: String,
    pub invite_code: String,
    pub sprint_duration: i32,
    pub owner_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SprintRow {
    pub id: String,
    pub name: String,
    pub start_date: i64,
    pub end_date: i64,
    pub project_id: String,
}

// Form payloads. Numeric and id fields arrive as text and are parsed by the
// store layer so a bad value becomes a 400 page instead of a rejection.

#[derive(Debug, Clone, Deserialize)]
pub struct UserForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectForm {
    pub name: String,
    pub identifier: String,
    pub invite_code: String,
    pub sprint_duration: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SprintForm {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdForm {
    pub id: String,
}

/// Update payload: the record id plus the full set of editable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateForm<T> {
    pub id: String,
    #[serde(flatten)]
    pub fields: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    /// The trimmed search term, if any.
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
