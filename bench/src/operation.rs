//! The fixed operation menu run against every backend variant.

use std::fmt;

/// Every sprint start date moves by one day on the Update pass.
pub const SPRINT_START_OFFSET: i64 = 24 * 60 * 60;

/// Projects with a sprint duration above this value match the find filter.
pub const SPRINT_DURATION_THRESHOLD: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Find,
    FindWithFilter,
    FindWithFilterAndProjection,
    FindWithFilterProjectionAndSort,
    Aggregate,
    Update,
    Delete,
}

impl Operation {
    /// Execution order within one batch.
    pub const ALL: [Operation; 8] = [
        Operation::Insert,
        Operation::Find,
        Operation::FindWithFilter,
        Operation::FindWithFilterAndProjection,
        Operation::FindWithFilterProjectionAndSort,
        Operation::Aggregate,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Operation::Insert => "Insert",
            Operation::Find => "Find",
            Operation::FindWithFilter => "Find with filter",
            Operation::FindWithFilterAndProjection => "Find with filter and projection",
            Operation::FindWithFilterProjectionAndSort => {
                "Find with filter and projection and sort"
            }
            Operation::Aggregate => "Find with aggregation",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
        }
    }

    /// Query shape for the find family; `None` for every other operation.
    pub fn find_query(self) -> Option<FindQuery> {
        match self {
            Operation::Find => Some(FindQuery::ALL),
            Operation::FindWithFilter => Some(FindQuery {
                filter: true,
                ..FindQuery::ALL
            }),
            Operation::FindWithFilterAndProjection => Some(FindQuery {
                filter: true,
                projection: true,
                sort: false,
            }),
            Operation::FindWithFilterProjectionAndSort => Some(FindQuery {
                filter: true,
                projection: true,
                sort: true,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which clauses a find query carries.
///
/// - `filter`: only projects with `sprint_duration > 50`
/// - `projection`: only name, identifier, invite code, owner and sprint fields
/// - `sort`: newest sprint start date first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindQuery {
    pub filter: bool,
    pub projection: bool,
    pub sort: bool,
}

impl FindQuery {
    /// Unfiltered full scan.
    pub const ALL: FindQuery = FindQuery {
        filter: false,
        projection: false,
        sort: false,
    };
}
