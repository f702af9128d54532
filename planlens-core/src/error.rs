//! Typed diff failures. Error text carries only paths and value kinds —
//! raw values never leak into logs.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// Two present values whose shapes admit no structural diff
    /// (map vs scalar, map vs sequence, sequence vs scalar). The engine
    /// degrades to a whole-value change; this records that it happened.
    #[error("cannot compare {left_kind} with {right_kind} at '{path}'")]
    ShapeMismatch {
        path: String,
        left_kind: &'static str,
        right_kind: &'static str,
    },
}
