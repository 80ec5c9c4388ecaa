use thiserror::Error;

/// Failure while provisioning or preparing a database. Always fatal.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to start {image} container: {source}")]
    Container {
        image: &'static str,
        #[source]
        source: testcontainers_modules::testcontainers::TestcontainersError,
    },
    #[error("postgres setup failed while {context}: {source}")]
    Postgres {
        context: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },
    #[error("mongodb setup failed while {context}: {source}")]
    Mongo {
        context: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
}

impl SetupError {
    pub(crate) fn postgres(context: &'static str) -> impl FnOnce(tokio_postgres::Error) -> Self {
        move |source| SetupError::Postgres { context, source }
    }

    pub(crate) fn mongo(context: &'static str) -> impl FnOnce(mongodb::error::Error) -> Self {
        move |source| SetupError::Mongo { context, source }
    }
}
