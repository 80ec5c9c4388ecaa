use crate::operation::Operation;
use dbi_core::SetupError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What the driver does when a single timed operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the whole run on the first failing operation.
    #[default]
    Halt,
    /// Record the cell as failed and keep going.
    Skip,
}

impl ErrorPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "halt" | "abort" => Some(ErrorPolicy::Halt),
            "skip" | "continue" => Some(ErrorPolicy::Skip),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("{operation} against {variant} failed: {source}")]
    Operation {
        operation: Operation,
        variant: String,
        #[source]
        source: BoxError,
    },

    #[error("schema validation probe failed: {0}")]
    ValidationProbe(String),

    #[error("verification failed for {variant} after {operation}: {message}")]
    Verification {
        operation: Operation,
        variant: String,
        message: String,
    },

    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl BenchError {
    /// Whether this error must stop the run under `policy`.
    ///
    /// Only operation failures are recoverable, and only when the policy
    /// allows skipping them.
    pub fn is_fatal(&self, policy: ErrorPolicy) -> bool {
        match self {
            BenchError::Operation { .. } => policy == ErrorPolicy::Halt,
            _ => true,
        }
    }
}
