//! Integration tests against real servers started in containers.
//!
//! These need a Docker daemon and are ignored by default:
//! `cargo test -p dbi-bench -- --ignored`

use dbi_bench::driver::{run_operation, Driver};
use dbi_bench::operation::{FindQuery, Operation, SPRINT_START_OFFSET};
use dbi_bench::probe::{is_validation_failure, probe_schema_validation, violating_project};
use dbi_bench::report::{Cell, ResultTable};
use dbi_bench::schema::mongo::{DocumentLayout, MongoSchema};
use dbi_bench::schema::postgres::PostgresSchema;
use dbi_bench::schema::{
    standard_variants, BenchSchema, REFERENCED_PROJECTS, REFERENCED_SPRINTS, REFERENCED_USERS,
};
use dbi_bench::ErrorPolicy;
use dbi_core::generator::generate_projects;
use dbi_core::infra::{
    connect_mongo, connect_postgres, initialize_mongo, initialize_postgres, MongoInstance,
    PostgresInstance, DATABASE_NAME, PROJECTS_COLLECTION, VALIDATED_PROJECTS_COLLECTION,
};
use mongodb::bson::Document;
use mongodb::Database;

async fn postgres() -> (PostgresInstance, tokio_postgres::Client) {
    let instance = PostgresInstance::start().await.expect("start postgres");
    let client = connect_postgres(&instance.url).await.expect("connect postgres");
    initialize_postgres(&client).await.expect("create tables");
    (instance, client)
}

async fn mongo() -> (MongoInstance, Database) {
    let instance = MongoInstance::start().await.expect("start mongo");
    let db = connect_mongo(&instance.uri, false)
        .await
        .expect("connect mongo")
        .database(DATABASE_NAME);
    initialize_mongo(&db).await.expect("initialize mongo");
    (instance, db)
}

/// Seed 100, find 100, delete, find 0.
async fn assert_round_trip(schema: &dyn BenchSchema) {
    let projects = generate_projects(100);

    let inserted = run_operation(schema, Operation::Insert, &projects).await.unwrap();
    assert_eq!(inserted.records, 100);

    let found = run_operation(schema, Operation::Find, &projects).await.unwrap();
    assert_eq!(found.records, 100);

    run_operation(schema, Operation::Delete, &projects).await.unwrap();
    let found = schema.find(FindQuery::ALL).await.unwrap();
    assert_eq!(found, 0);
}

async fn assert_update_shifts_by_one_day(schema: &dyn BenchSchema) {
    let projects = generate_projects(20);
    schema.insert(&projects).await.unwrap();

    let before = schema.sprint_start_dates().await.unwrap();
    let expected: Vec<i64> = projects.iter().map(|p| p.sprints[0].start_date).collect();
    assert_eq!(before, expected);

    schema.update_sprint_start(SPRINT_START_OFFSET).await.unwrap();
    let after = schema.sprint_start_dates().await.unwrap();
    let shifted: Vec<i64> = expected.iter().map(|d| d + 86400).collect();
    assert_eq!(after, shifted);

    schema.delete_all().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn postgres_round_trip() {
    let (_instance, client) = postgres().await;
    assert_round_trip(&PostgresSchema::new(client)).await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn postgres_update_shifts_start_dates() {
    let (_instance, client) = postgres().await;
    assert_update_shifts_by_one_day(&PostgresSchema::new(client)).await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn mongo_layouts_round_trip() {
    let (_instance, db) = mongo().await;
    for layout in [
        DocumentLayout::embedded(PROJECTS_COLLECTION),
        DocumentLayout::embedded(VALIDATED_PROJECTS_COLLECTION),
        DocumentLayout::referenced(REFERENCED_USERS, REFERENCED_PROJECTS, REFERENCED_SPRINTS),
    ] {
        assert_round_trip(&MongoSchema::new(db.clone(), layout)).await;
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn mongo_update_shifts_start_dates() {
    let (_instance, db) = mongo().await;
    for layout in [
        DocumentLayout::embedded(PROJECTS_COLLECTION),
        DocumentLayout::referenced(REFERENCED_USERS, REFERENCED_PROJECTS, REFERENCED_SPRINTS),
    ] {
        assert_update_shifts_by_one_day(&MongoSchema::new(db.clone(), layout)).await;
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn validated_collection_rejects_incomplete_projects() {
    let (_instance, db) = mongo().await;

    let err = db
        .collection::<Document>(VALIDATED_PROJECTS_COLLECTION)
        .insert_one(violating_project(), None)
        .await
        .unwrap_err();
    assert!(is_validation_failure(&err), "unexpected error: {err}");

    probe_schema_validation(&db).await.unwrap();
    let leftover = db
        .collection::<Document>(PROJECTS_COLLECTION)
        .count_documents(None, None)
        .await
        .unwrap();
    assert_eq!(leftover, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn full_menu_with_verification() {
    let (_pg, client) = postgres().await;
    let (_mongo, db) = mongo().await;

    let variants = standard_variants(client, &db, None);
    let labels: Vec<String> = variants.iter().map(|v| v.label.clone()).collect();
    assert_eq!(
        labels,
        ["Postgres", "Mongo", "Mongo (Index)", "Mongo (Referencing)"]
    );

    let mut table = ResultTable::new(labels);
    let driver = Driver::new(ErrorPolicy::Halt, true);
    for size in [10, 50] {
        driver
            .run_batch(&variants, &generate_projects(size), &mut table)
            .await
            .unwrap();
    }

    for operation in Operation::ALL {
        for idx in 0..variants.len() {
            let cell = table.get(50, operation, idx);
            assert!(
                matches!(cell, Some(Cell::Measured(_))),
                "{operation} / {idx}: {cell:?}"
            );
        }
    }
    let filtered = table.get(50, Operation::FindWithFilter, 0);
    assert!(matches!(filtered, Some(Cell::Measured(m)) if m.records <= 50));
}
