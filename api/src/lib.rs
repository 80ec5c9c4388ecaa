//! CRUD web UI over both stores of the benchmark.
//!
//! Every route under `/{backend}/...` exists once for `postgres` and once
//! for `mongo`; the two index pages live at `/` and `/mongo`.

pub mod error;
pub mod helpers;
pub mod pipelines;
pub mod routes;
pub mod types;
pub mod views;

use axum::Router;
use axum::routing::{get, post};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

pub use error::ApiError;

/// Clients shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<tokio_postgres::Client>,
    pub mongo: mongodb::Database,
}

impl AppState {
    pub fn new(postgres: tokio_postgres::Client, mongo: mongodb::Database) -> Self {
        Self {
            postgres: Arc::new(postgres),
            mongo,
        }
    }
}

/// Builds the full router; static assets are served from `static_dir`.
pub fn app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(routes::postgres_index))
        .route("/mongo", get(routes::mongo_index))
        // Users
        .route("/{backend}/users", post(routes::create_user))
        .route("/{backend}/users/update", post(routes::update_user))
        .route("/{backend}/users/delete", post(routes::delete_user))
        .route("/{backend}/users/{id}", get(routes::show_user))
        // Projects
        .route("/{backend}/projects", post(routes::create_project))
        .route("/{backend}/projects/update", post(routes::update_project))
        .route("/{backend}/projects/delete", post(routes::delete_project))
        .route("/{backend}/projects/{id}", get(routes::show_project))
        // Sprints
        .route("/{backend}/sprints", post(routes::create_sprint))
        .route("/{backend}/sprints/update", post(routes::update_sprint))
        .route("/{backend}/sprints/delete", post(routes::delete_sprint))
        .route("/{backend}/sprints/{id}", get(routes::show_sprint))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}
