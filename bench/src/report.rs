//! Report module: accumulates per-operation timings and renders them as a
//! console table.

use crate::driver::Measurement;
use crate::operation::Operation;
use comfy_table::Table;
use std::time::Duration;

/// One table cell: a timing, or the reason the operation was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Measured(Measurement),
    Failed(String),
}

impl Cell {
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Cell::Measured(m) => Some(m.elapsed),
            Cell::Failed(_) => None,
        }
    }
}

/// Timings for one (batch size, operation) pair across all variants.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub batch_size: usize,
    pub operation: Operation,
    pub cells: Vec<Option<Cell>>,
}

/// Row-oriented results keyed by (batch size, operation, variant index).
#[derive(Debug, Clone)]
pub struct ResultTable {
    variants: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(variants: Vec<String>) -> Self {
        Self {
            variants,
            rows: Vec::new(),
        }
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Batch sizes in the order they were first recorded.
    pub fn batch_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = Vec::new();
        for row in &self.rows {
            if !sizes.contains(&row.batch_size) {
                sizes.push(row.batch_size);
            }
        }
        sizes
    }

    pub fn record(&mut self, batch_size: usize, operation: Operation, variant: usize, cell: Cell) {
        let width = self.variants.len();
        let row = match self
            .rows
            .iter()
            .position(|r| r.batch_size == batch_size && r.operation == operation)
        {
            Some(pos) => &mut self.rows[pos],
            None => {
                self.rows.push(ResultRow {
                    batch_size,
                    operation,
                    cells: vec![None; width],
                });
                let last = self.rows.len() - 1;
                &mut self.rows[last]
            }
        };
        if let Some(slot) = row.cells.get_mut(variant) {
            *slot = Some(cell);
        }
    }

    pub fn get(&self, batch_size: usize, operation: Operation, variant: usize) -> Option<&Cell> {
        self.rows
            .iter()
            .find(|r| r.batch_size == batch_size && r.operation == operation)
            .and_then(|r| r.cells.get(variant))
            .and_then(Option::as_ref)
    }

    /// Elapsed time of `operation` on `variant` for every batch size, in
    /// batch order. Missing or failed cells yield `None`.
    pub fn series(&self, operation: Operation, variant: usize) -> Vec<(usize, Option<Duration>)> {
        self.batch_sizes()
            .into_iter()
            .map(|size| {
                let elapsed = self
                    .get(size, operation, variant)
                    .and_then(Cell::elapsed);
                (size, elapsed)
            })
            .collect()
    }

    /// Renders every row, or only the rows of `batch_size` when given.
    /// Batches are separated by an empty row.
    pub fn render(&self, batch_size: Option<usize>) -> Table {
        let mut header = vec!["#".to_string(), "Query".to_string()];
        header.extend(self.variants.iter().cloned());

        let mut table = Table::new();
        table.set_header(header);

        let mut previous: Option<usize> = None;
        for row in &self.rows {
            if batch_size.is_some_and(|size| size != row.batch_size) {
                continue;
            }
            if previous.is_some_and(|size| size != row.batch_size) {
                table.add_row(vec![String::new(); self.variants.len() + 2]);
            }
            previous = Some(row.batch_size);

            let mut cells = vec![row.batch_size.to_string(), row.operation.to_string()];
            cells.extend(row.cells.iter().map(format_cell));
            table.add_row(cells);
        }
        table
    }
}

/// Prints the rows of one finished batch.
pub fn print_batch_report(table: &ResultTable, batch_size: usize) {
    println!("\n  Batch of {batch_size} projects");
    println!("{}", table.render(Some(batch_size)));
}

/// Prints every batch recorded so far under a banner.
pub fn print_report(table: &ResultTable) {
    println!("\n{}", "=".repeat(80));
    println!("  Postgres vs MongoDB Benchmark Report");
    println!("  Variants: {}", table.variants().join(", "));
    println!("{}", "=".repeat(80));
    println!("{}", table.render(None));
}

fn format_cell(cell: &Option<Cell>) -> String {
    match cell {
        Some(Cell::Measured(m)) => format_duration(m.elapsed),
        Some(Cell::Failed(_)) => "error".to_string(),
        None => "-".to_string(),
    }
}

pub fn format_duration(elapsed: Duration) -> String {
    format!("{:.2?}", elapsed)
}
