//! Benchmark runner: provisions both stores, runs every batch size through the
//! operation menu and prints the result table.
//!
//! Settings come from the environment or a `.env` file (see
//! [`dbi_bench::config::BenchConfig`]). Without `BENCH_POSTGRES_URL` /
//! `BENCH_MONGO_URL` both servers are started as throwaway containers.
//!
//! Usage:
//!   cargo run --release -p dbi-bench
//!   BENCH_BATCH_SIZES=100,1000 BENCH_VERIFY=1 cargo run --release -p dbi-bench

use anyhow::Context;
use dbi_bench::chart::write_page;
use dbi_bench::config::BenchConfig;
use dbi_bench::driver::Driver;
use dbi_bench::probe::probe_schema_validation;
use dbi_bench::report::{print_batch_report, print_report, ResultTable};
use dbi_bench::schema::standard_variants;
use dbi_core::generator::generate_projects;
use dbi_core::infra::{
    connect_mongo, connect_postgres, initialize_mongo, initialize_postgres, MongoInstance,
    PostgresInstance, DATABASE_NAME,
};
use log::{error, info};

async fn run(config: BenchConfig) -> anyhow::Result<()> {
    let postgres = PostgresInstance::provision(config.postgres_url.clone()).await?;
    let mongo = MongoInstance::provision(config.mongo_url.clone()).await?;

    let postgres_client = connect_postgres(&postgres.url).await?;
    initialize_postgres(&postgres_client).await?;
    info!("Connected to Postgres");

    let mongo_db = connect_mongo(&mongo.uri, false).await?.database(DATABASE_NAME);
    initialize_mongo(&mongo_db).await?;
    info!("Connected to MongoDB");

    let remote_db = match config.remote_mongo_uri.as_deref() {
        Some(uri) => {
            let db = connect_mongo(uri, true).await?.database(DATABASE_NAME);
            info!("Connected to remote MongoDB cluster");
            Some(db)
        }
        None => {
            info!("BENCH_REMOTE_MONGO_URI not set, skipping the Atlas variant");
            None
        }
    };

    println!("\n── Schema validation ──────────────────────────────────");
    probe_schema_validation(&mongo_db).await?;
    println!("  Invalid project rejected by the validated collection");

    let variants = standard_variants(postgres_client, &mongo_db, remote_db.as_ref());
    let labels: Vec<String> = variants.iter().map(|v| v.label.clone()).collect();
    let charted: Vec<usize> = variants
        .iter()
        .enumerate()
        .filter(|(_, v)| v.charted)
        .map(|(idx, _)| idx)
        .collect();

    let driver = Driver::new(config.policy, config.verify);
    let mut table = ResultTable::new(labels);

    println!("\n── Performance ────────────────────────────────────────");
    for &size in &config.batch_sizes {
        let projects = generate_projects(size);
        driver.run_batch(&variants, &projects, &mut table).await?;
        print_batch_report(&table, size);
    }

    print_report(&table);

    if let Some(path) = &config.chart_path {
        write_page(path, &table, &charted)
            .with_context(|| format!("writing chart page to {}", path.display()))?;
        println!("\n  Charts written to {}", path.display());
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = BenchConfig::from_env()?;
    dbi_core::initialize_logger(config.log_level, config.log_file.as_deref())?;

    info!(
        "Benchmark starting (batches={:?}, policy={:?}, verify={}, logfile={})",
        config.batch_sizes,
        config.policy,
        config.verify,
        config.log_file.as_deref().unwrap_or("none")
    );

    if let Err(err) = run(config).await {
        error!("Benchmark aborted: {:#}", err);
        return Err(err);
    }

    info!("Benchmark finished");
    Ok(())
}
