//! # PlanLens Core — Shared Analysis Primitives
//!
//! Everything the analysis layer links against:
//! - **Property diff engine** — bounded recursive before/after comparison
//! - **Collapsible values** — progressive-disclosure wrappers with redaction
//! - **Provider resolution** — resource type → provider key capability
//! - **Cancellation** — cooperative token observed between resources
//! - **Typed errors** — structured variants callers can branch on

pub mod cancel;
pub mod collapsible;
pub mod diff;
pub mod error;
pub mod provider;

pub use cancel::CancelToken;
pub use collapsible::CollapsibleValue;
pub use diff::{DiffLimits, PathSegment, PropertyChange, PropertyChangeSet};
pub use error::DiffError;
pub use provider::{ProviderResolver, UnderscorePrefixResolver};

/// Fixed-width marker substituted for sensitive values in detail payloads.
pub const REDACTION_MARKER: &str = "********";
