use thiserror::Error;

/// Status kinds an analysis can end with.
///
/// Field-level problems abort the walk as `Unknown`; precondition and
/// lookup failures are distinguished so drivers can triage batches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown: {0}")]
    Unknown(String),
}
