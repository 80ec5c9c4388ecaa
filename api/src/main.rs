use dbi_core::infra::{
    DATABASE_NAME, MongoInstance, PostgresInstance, connect_mongo, connect_postgres,
    initialize_postgres,
};
use dbi_core::{SetupError, parse_log_file, parse_log_level};
use log::{LevelFilter, info, warn};
use std::env;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

fn resolve_log_level() -> LevelFilter {
    env::var("API_LOG_LEVEL")
        .ok()
        .as_deref()
        .and_then(parse_log_level)
        .unwrap_or(LevelFilter::Info)
}

fn resolve_log_file() -> Option<String> {
    parse_log_file(env::var("API_LOG_FILE").ok().as_deref(), "api.log")
}

fn resolve_api_bind_addr() -> String {
    env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string())
}

fn resolve_api_port() -> u16 {
    env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000)
}

fn resolve_static_dir() -> String {
    env::var("API_STATIC_DIR").unwrap_or_else(|_| "static".to_string())
}

fn resolve_url(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Retries `connect` a few times so the service can start alongside a
/// database that is still booting.
async fn connect_with_retry<T, F, Fut>(what: &str, mut connect: F) -> Result<T, SetupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SetupError>>,
{
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY_SECS: u64 = 6;

    let mut attempt = 0;
    loop {
        match connect().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_RETRIES => {
                attempt += 1;
                warn!(
                    "Failed to connect to {} (attempt {}/{}): {}; retrying in {}s",
                    what,
                    attempt,
                    MAX_RETRIES + 1,
                    err,
                    RETRY_DELAY_SECS
                );
                sleep(Duration::from_secs(RETRY_DELAY_SECS)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = resolve_log_level();
    let log_file = resolve_log_file();
    dbi_core::initialize_logger(log_level, log_file.as_deref())?;

    info!(
        "API starting (level={}, logfile={})",
        log_level,
        log_file.as_deref().unwrap_or("none")
    );

    // Containers are stopped when these handles drop at shutdown.
    let postgres = PostgresInstance::provision(resolve_url("API_POSTGRES_URL")).await?;
    let mongo = MongoInstance::provision(resolve_url("API_MONGO_URL")).await?;

    let postgres_client = connect_with_retry("Postgres", || connect_postgres(&postgres.url)).await?;
    initialize_postgres(&postgres_client).await?;
    info!("Connected to Postgres");

    let mongo_client = connect_with_retry("MongoDB", || connect_mongo(&mongo.uri, false)).await?;
    info!("Connected to MongoDB");

    let state = dbi_api::AppState::new(postgres_client, mongo_client.database(DATABASE_NAME));
    let app = dbi_api::app(state, resolve_static_dir());

    let bind_address = format!("{}:{}", resolve_api_bind_addr(), resolve_api_port());
    info!("Listening on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    info!("Server shutdown");
    Ok(())
}
