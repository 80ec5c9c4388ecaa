//! Line-chart page: one chart per charted operation, x = batch size,
//! y = milliseconds, one line per charted variant.

use crate::error::BenchError;
use crate::operation::Operation;
use crate::report::ResultTable;
use charming::component::{Axis, Legend, Title};
use charming::element::{AxisType, Tooltip, Trigger};
use charming::series::Line;
use charming::Chart;
use std::path::Path;

/// Operations that get a chart, with their chart titles.
pub const CHARTED_OPERATIONS: [(Operation, &str); 4] = [
    (Operation::Insert, "Insert"),
    (Operation::FindWithFilter, "Find (With Filter)"),
    (Operation::Update, "Update"),
    (Operation::Delete, "Delete"),
];

const ECHARTS_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts@5.4.3/dist/echarts.min.js";

/// Millisecond values for `operation` on `variant`, one per batch size.
/// Missing or failed cells become NaN, which serializes to a gap.
pub fn series_ms(table: &ResultTable, operation: Operation, variant: usize) -> Vec<f64> {
    table
        .series(operation, variant)
        .into_iter()
        .map(|(_, elapsed)| elapsed.map_or(f64::NAN, |d| d.as_nanos() as f64 / 1_000_000.0))
        .collect()
}

pub fn operation_chart(
    table: &ResultTable,
    operation: Operation,
    title: &str,
    charted: &[usize],
) -> Chart {
    let batches: Vec<String> = table
        .batch_sizes()
        .iter()
        .map(|size| size.to_string())
        .collect();

    let mut chart = Chart::new()
        .title(Title::new().text(title))
        .tooltip(Tooltip::new().trigger(Trigger::Axis))
        .legend(Legend::new().top("bottom"))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("Batch Size")
                .data(batches),
        )
        .y_axis(Axis::new().type_(AxisType::Value).name("Time (ms)"));

    for &idx in charted {
        if let Some(label) = table.variants().get(idx) {
            chart = chart.series(
                Line::new()
                    .name(label.as_str())
                    .data(series_ms(table, operation, idx)),
            );
        }
    }
    chart
}

/// Self-contained HTML page holding every chart in [`CHARTED_OPERATIONS`].
pub fn render_page(table: &ResultTable, charted: &[usize]) -> String {
    let mut divs = String::new();
    let mut scripts = String::new();
    for (i, (operation, title)) in CHARTED_OPERATIONS.iter().enumerate() {
        let chart = operation_chart(table, *operation, title, charted);
        divs.push_str(&format!(
            "  <div id=\"chart-{i}\" style=\"width: 900px; height: 400px;\"></div>\n"
        ));
        scripts.push_str(&format!(
            "  echarts.init(document.getElementById('chart-{i}')).setOption({chart});\n"
        ));
    }

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Postgres vs MongoDB</title>\n\
         <script src=\"{ECHARTS_CDN}\"></script>\n\
         </head>\n\
         <body>\n\
         {divs}\
         <script>\n\
         {scripts}\
         </script>\n\
         </body>\n\
         </html>\n"
    )
}

pub fn write_page(path: &Path, table: &ResultTable, charted: &[usize]) -> Result<(), BenchError> {
    std::fs::write(path, render_page(table, charted))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Measurement;
    use crate::report::Cell;
    use std::time::Duration;

    fn table() -> ResultTable {
        let mut table = ResultTable::new(vec![
            "Postgres".to_string(),
            "Mongo".to_string(),
            "Mongo (Index)".to_string(),
        ]);
        for (batch, ms) in [(100, 5), (1000, 50)] {
            for idx in 0..3 {
                let cell = Cell::Measured(Measurement {
                    elapsed: Duration::from_millis(ms),
                    records: batch as u64,
                });
                table.record(batch, Operation::Insert, idx, cell);
            }
        }
        table.record(1000, Operation::Update, 1, Cell::Failed("timeout".to_string()));
        table
    }

    #[test]
    fn series_are_in_milliseconds_with_gaps() {
        let table = table();
        assert_eq!(series_ms(&table, Operation::Insert, 0), vec![5.0, 50.0]);
        let update = series_ms(&table, Operation::Update, 1);
        assert_eq!(update.len(), 2);
        assert!(update.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn page_has_one_chart_per_charted_operation() {
        let page = render_page(&table(), &[0, 1]);
        for i in 0..CHARTED_OPERATIONS.len() {
            assert!(page.contains(&format!("id=\"chart-{i}\"")));
        }
        assert!(page.contains("Find (With Filter)"));
        assert!(page.contains("Batch Size"));
        assert!(page.contains(ECHARTS_CDN));
    }

    #[test]
    fn only_charted_variants_get_lines() {
        let page = render_page(&table(), &[0, 1]);
        assert!(page.contains("\"Postgres\""));
        assert!(page.contains("\"Mongo\""));
        assert!(!page.contains("Mongo (Index)"));
    }

    #[test]
    fn page_is_written_to_disk() {
        let path = std::env::temp_dir().join(format!("dbi-charts-{}.html", std::process::id()));
        write_page(&path, &table(), &[0]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        std::fs::remove_file(&path).unwrap();
    }
}
