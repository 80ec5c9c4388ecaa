//! PostgreSQL vs MongoDB latency benchmark
//!
//! Seeds generated project hierarchies (owner → project → sprint) at
//! increasing batch sizes and times a fixed operation menu against several
//! backend variants:
//! - **Postgres**: normalized tables joined on foreign keys
//! - **Mongo**: embedded documents in a plain collection
//! - **Mongo (Index)**: embedded documents in a validated, indexed collection
//! - **Mongo (Atlas)**: embedded documents on a remote managed cluster
//! - **Mongo (Referencing)**: one collection per entity, linked by object id
//!
//! Run the benchmark: `cargo run --release -p dbi-bench`
//! Run tests: `cargo test -p dbi-bench` (Docker-backed tests: `-- --ignored`)

pub mod chart;
pub mod config;
pub mod driver;
pub mod error;
pub mod operation;
pub mod probe;
pub mod report;
pub mod schema;

pub use error::{BenchError, ErrorPolicy};
