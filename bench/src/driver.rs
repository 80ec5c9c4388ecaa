//! Benchmark driver: runs the operation menu against every variant, one
//! call at a time, and records how long each call took.
//!
//! | Step          | Timed | Notes                                      |
//! |---------------|-------|--------------------------------------------|
//! | Reset         | no    | clears leftovers from an earlier run       |
//! | Operation     | yes   | one variant at a time, never concurrently  |
//! | Verification  | no    | only when enabled; checks record counts    |

use crate::error::{BenchError, ErrorPolicy};
use crate::operation::{FindQuery, Operation, SPRINT_START_OFFSET};
use crate::report::{Cell, ResultTable};
use crate::schema::{BackendVariant, BenchSchema};
use anyhow::Result;
use dbi_core::models::Project;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Outcome of one timed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub elapsed: Duration,
    /// Records returned (reads) or affected (writes).
    pub records: u64,
}

/// Runs `operation` once against `schema` and times it.
pub async fn run_operation(
    schema: &dyn BenchSchema,
    operation: Operation,
    projects: &[Project],
) -> Result<Measurement> {
    let start = Instant::now();
    let records = match operation {
        Operation::Insert => schema.insert(projects).await?,
        Operation::Find
        | Operation::FindWithFilter
        | Operation::FindWithFilterAndProjection
        | Operation::FindWithFilterProjectionAndSort => {
            let query = operation.find_query().unwrap_or(FindQuery::ALL);
            schema.find(query).await?
        }
        Operation::Aggregate => schema.aggregate().await?,
        Operation::Update => schema.update_sprint_start(SPRINT_START_OFFSET).await?,
        Operation::Delete => schema.delete_all().await?,
    };
    Ok(Measurement {
        elapsed: start.elapsed(),
        records,
    })
}

pub struct Driver {
    policy: ErrorPolicy,
    verify: bool,
}

impl Driver {
    pub fn new(policy: ErrorPolicy, verify: bool) -> Self {
        Self { policy, verify }
    }

    /// Runs the full menu for one batch and records every cell in `table`.
    ///
    /// Under [`ErrorPolicy::Skip`] a failed cell is recorded and the variant
    /// is excluded from verification for the rest of the batch.
    pub async fn run_batch(
        &self,
        variants: &[BackendVariant],
        projects: &[Project],
        table: &mut ResultTable,
    ) -> Result<(), BenchError> {
        let batch_size = projects.len();
        info!("Running batch of {} projects", batch_size);

        for variant in variants {
            let cleared = variant
                .schema
                .delete_all()
                .await
                .map_err(|err| operation_error(Operation::Delete, variant, err))?;
            if cleared > 0 {
                debug!("{}: cleared {} leftover records", variant.label, cleared);
            }
        }

        let mut failed: HashSet<usize> = HashSet::new();
        let mut dates_before: Vec<Option<Vec<i64>>> = vec![None; variants.len()];

        for operation in Operation::ALL {
            for (idx, variant) in variants.iter().enumerate() {
                if operation == Operation::Update && self.verify && !failed.contains(&idx) {
                    dates_before[idx] = Some(
                        variant
                            .schema
                            .sprint_start_dates()
                            .await
                            .map_err(|err| operation_error(operation, variant, err))?,
                    );
                }

                match run_operation(variant.schema.as_ref(), operation, projects).await {
                    Ok(measurement) => {
                        debug!(
                            "{} / {} / {}: {:?} ({} records)",
                            batch_size, operation, variant.label, measurement.elapsed,
                            measurement.records
                        );
                        table.record(batch_size, operation, idx, Cell::Measured(measurement));
                    }
                    Err(err) => {
                        let err = operation_error(operation, variant, err);
                        if err.is_fatal(self.policy) {
                            return Err(err);
                        }
                        warn!("Skipping failed operation: {}", err);
                        table.record(batch_size, operation, idx, Cell::Failed(err.to_string()));
                        failed.insert(idx);
                        continue;
                    }
                }

                if self.verify && !failed.contains(&idx) {
                    self.verify_after(operation, variant, batch_size, dates_before[idx].take())
                        .await?;
                }
            }
        }

        info!("Finished batch of {} projects", batch_size);
        Ok(())
    }

    async fn verify_after(
        &self,
        operation: Operation,
        variant: &BackendVariant,
        batch_size: usize,
        dates_before: Option<Vec<i64>>,
    ) -> Result<(), BenchError> {
        let schema = variant.schema.as_ref();
        let check = |message: String| BenchError::Verification {
            operation,
            variant: variant.label.clone(),
            message,
        };

        match operation {
            Operation::Insert | Operation::Delete => {
                let expected = if operation == Operation::Insert {
                    batch_size as u64
                } else {
                    0
                };
                let found = schema
                    .find(FindQuery::ALL)
                    .await
                    .map_err(|err| operation_error(operation, variant, err))?;
                if found != expected {
                    return Err(check(format!(
                        "unfiltered find returned {found} records, expected {expected}"
                    )));
                }
            }
            Operation::Update => {
                let before = dates_before.unwrap_or_default();
                let after = schema
                    .sprint_start_dates()
                    .await
                    .map_err(|err| operation_error(operation, variant, err))?;
                if let Some(message) = check_shifted(&before, &after, SPRINT_START_OFFSET) {
                    return Err(check(message));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn operation_error(operation: Operation, variant: &BackendVariant, err: anyhow::Error) -> BenchError {
    BenchError::Operation {
        operation,
        variant: variant.label.clone(),
        source: err.into(),
    }
}

/// Describes the first sprint whose start date did not move by exactly `offset`.
pub fn check_shifted(before: &[i64], after: &[i64], offset: i64) -> Option<String> {
    if before.len() != after.len() {
        return Some(format!(
            "sprint count changed from {} to {}",
            before.len(),
            after.len()
        ));
    }
    before
        .iter()
        .zip(after)
        .position(|(b, a)| a - b != offset)
        .map(|idx| {
            format!(
                "sprint {idx} start date moved from {} to {}, expected +{offset}",
                before[idx], after[idx]
            )
        })
}
