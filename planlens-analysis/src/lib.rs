//! # PlanLens Analysis — Plan Change Analysis & Risk Engine
//!
//! Turns a normalized infrastructure-change plan into an annotated,
//! risk-scored, grouped report for a progressive-disclosure renderer:
//! - **Sensitivity index** — O(1) sensitive resource/property membership
//! - **Risk assessor** — deterministic action × sensitivity rule table
//! - **Dependency extractor** — direct depends-on / used-by lookups
//! - **Grouping engine** — provider partitioning behind size/diversity gates
//! - **Orchestrator** — bounded worker pool with partial-failure isolation:
//!   one malformed resource never aborts a plan's analysis
//!
//! Parsing plan formats, loading sensitivity config, rendering, and the
//! apply workflow all live outside this crate; it consumes read-only inputs
//! and hands back an immutable report.

pub mod analyzer;
pub mod deps;
pub mod error;
pub mod grouping;
pub mod risk;
pub mod sensitivity;
pub mod types;


pub use analyzer::{Analyzer, AnalyzerConfig};
pub use error::{DependencyError, PlanLensError, PlanLensResult};
pub use sensitivity::{SensitivityIndex, SensitivityRule, ValidationError};
pub use types::{
    AnalysisError, AnalysisReport, AnalysisStage, AnalysisStats, ChangeAction, DependencyInfo,
    ProviderGroup, ProviderGroups, ResourceAnalysis, ResourceChangeInput, RiskLevel,
};
