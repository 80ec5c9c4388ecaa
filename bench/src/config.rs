//! Benchmark settings resolved from the environment (optionally seeded from a
//! `.env` file by the binary).

use crate::error::{BenchError, ErrorPolicy};
use dbi_core::{parse_log_file, parse_log_level};
use log::LevelFilter;
use std::path::PathBuf;

pub const DEFAULT_BATCH_SIZES: [usize; 3] = [100, 1000, 10000];
pub const DEFAULT_CHART_PATH: &str = "charts.html";
pub const DEFAULT_LOG_FILE: &str = "bench.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub batch_sizes: Vec<usize>,
    /// `None` disables the chart page.
    pub chart_path: Option<PathBuf>,
    pub remote_mongo_uri: Option<String>,
    pub policy: ErrorPolicy,
    pub verify: bool,
    /// Existing servers to use instead of starting containers.
    pub postgres_url: Option<String>,
    pub mongo_url: Option<String>,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
}

impl BenchConfig {
    pub fn from_env() -> Result<Self, BenchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BenchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let batch_sizes = match non_empty("BENCH_BATCH_SIZES") {
            Some(value) => parse_batch_sizes(&value)?,
            None => DEFAULT_BATCH_SIZES.to_vec(),
        };

        let chart_path = match lookup("BENCH_CHART_PATH") {
            Some(value) if value.trim().eq_ignore_ascii_case("none") => None,
            Some(value) if !value.trim().is_empty() => Some(PathBuf::from(value.trim())),
            _ => Some(PathBuf::from(DEFAULT_CHART_PATH)),
        };

        let policy = match non_empty("BENCH_ON_OPERATION_ERROR") {
            Some(value) => ErrorPolicy::parse(&value).ok_or_else(|| {
                BenchError::Config(format!(
                    "BENCH_ON_OPERATION_ERROR must be `halt` or `skip`, got `{value}`"
                ))
            })?,
            None => ErrorPolicy::default(),
        };

        let verify = match non_empty("BENCH_VERIFY") {
            Some(value) => parse_flag(&value).ok_or_else(|| {
                BenchError::Config(format!("BENCH_VERIFY is not a boolean: `{value}`"))
            })?,
            None => false,
        };

        let log_level = match non_empty("BENCH_LOG_LEVEL") {
            Some(value) => parse_log_level(&value).ok_or_else(|| {
                BenchError::Config(format!("unknown BENCH_LOG_LEVEL `{value}`"))
            })?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            batch_sizes,
            chart_path,
            remote_mongo_uri: non_empty("BENCH_REMOTE_MONGO_URI"),
            policy,
            verify,
            postgres_url: non_empty("BENCH_POSTGRES_URL"),
            mongo_url: non_empty("BENCH_MONGO_URL"),
            log_level,
            log_file: parse_log_file(lookup("BENCH_LOG_FILE").as_deref(), DEFAULT_LOG_FILE),
        })
    }
}

/// Parses a comma-separated list of distinct positive batch sizes, e.g.
/// `100,1000`. Results are keyed by batch size, so repeats are rejected.
pub fn parse_batch_sizes(value: &str) -> Result<Vec<usize>, BenchError> {
    let sizes = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.replace('_', "").parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(BenchError::Config(format!("invalid batch size `{part}`"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if sizes.is_empty() {
        return Err(BenchError::Config(
            "BENCH_BATCH_SIZES lists no batch sizes".to_string(),
        ));
    }
    for (i, size) in sizes.iter().enumerate() {
        if sizes[..i].contains(size) {
            return Err(BenchError::Config(format!("duplicate batch size `{size}`")));
        }
    }
    Ok(sizes)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<BenchConfig, BenchError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BenchConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.batch_sizes, vec![100, 1000, 10000]);
        assert_eq!(config.chart_path, Some(PathBuf::from("charts.html")));
        assert_eq!(config.policy, ErrorPolicy::Halt);
        assert!(!config.verify);
        assert!(config.remote_mongo_uri.is_none());
        assert!(config.postgres_url.is_none());
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.log_file.as_deref(), Some("bench.log"));
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("BENCH_BATCH_SIZES", "10, 20,1_000"),
            ("BENCH_CHART_PATH", "out/page.html"),
            ("BENCH_REMOTE_MONGO_URI", "mongodb+srv://cluster.example"),
            ("BENCH_ON_OPERATION_ERROR", "skip"),
            ("BENCH_VERIFY", "yes"),
            ("BENCH_LOG_LEVEL", "debug"),
            ("BENCH_LOG_FILE", "none"),
        ])
        .unwrap();
        assert_eq!(config.batch_sizes, vec![10, 20, 1000]);
        assert_eq!(config.chart_path, Some(PathBuf::from("out/page.html")));
        assert_eq!(
            config.remote_mongo_uri.as_deref(),
            Some("mongodb+srv://cluster.example")
        );
        assert_eq!(config.policy, ErrorPolicy::Skip);
        assert!(config.verify);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn repeated_batch_sizes_are_rejected() {
        let err = parse_batch_sizes("100,100").unwrap_err();
        assert!(err.to_string().contains("duplicate batch size `100`"), "{err}");
        assert_eq!(parse_batch_sizes("100,1000").unwrap(), vec![100, 1000]);
    }

    #[test]
    fn chart_page_can_be_disabled() {
        let config = config(&[("BENCH_CHART_PATH", "None")]).unwrap();
        assert_eq!(config.chart_path, None);
    }

    #[test]
    fn blank_remote_uri_is_treated_as_unset() {
        let config = config(&[("BENCH_REMOTE_MONGO_URI", "  ")]).unwrap();
        assert!(config.remote_mongo_uri.is_none());
    }

    #[test]
    fn bad_values_are_config_errors() {
        for pairs in [
            [("BENCH_BATCH_SIZES", "100,abc")],
            [("BENCH_BATCH_SIZES", "0")],
            [("BENCH_BATCH_SIZES", ",,")],
            [("BENCH_BATCH_SIZES", "100,1000,100")],
            [("BENCH_BATCH_SIZES", "1_000,1000")],
            [("BENCH_ON_OPERATION_ERROR", "retry")],
            [("BENCH_VERIFY", "maybe")],
            [("BENCH_LOG_LEVEL", "loud")],
        ] {
            assert!(
                matches!(config(&pairs), Err(BenchError::Config(_))),
                "{pairs:?} should be rejected"
            );
        }
    }
}
