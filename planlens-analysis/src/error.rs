//! Error taxonomy for the engine. Per-resource failures degrade and are
//! collected in the report; cancellation is the only batch-fatal condition.

use thiserror::Error;

use crate::types::AnalysisReport;

pub type PlanLensResult<T> = Result<T, PlanLensError>;

#[derive(Error, Debug)]
pub enum PlanLensError {
    /// The only condition that halts a whole batch. Carries the partial
    /// report: in-flight resources completed, nothing new was dispatched.
    #[error("analysis cancelled after {completed} of {total} resources")]
    Cancelled {
        completed: usize,
        total: usize,
        partial: Box<AnalysisReport>,
    },
}

/// A dependency lookup that could not run. The orchestrator degrades it to
/// an empty `DependencyInfo` and records the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency lookup failed for '{address}': {reason}")]
pub struct DependencyError {
    pub address: String,
    pub reason: String,
}
