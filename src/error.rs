//! Error types for the analysis pipeline.
//!
//! Errors are never swallowed inside helpers; they propagate to the
//! per-function boundary, where the failing function is logged and dropped.
//! No partial graph is ever emitted for a failing function.

use thiserror::Error;

/// Errors produced while building or analyzing a function.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The dump is internally inconsistent: dangling id references, missing
    /// scope start/end tokens, unconsumed scopes after parsing, etc.
    #[error("malformed dump: {0}")]
    MalformedDump(String),

    /// The function uses a construct the pipeline does not model
    /// (for example a switch nested inside another switch).
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A `break`/`continue` appeared outside any enclosing loop, or a
    /// `return` outside a function context.
    #[error("context violation: {0}")]
    ContextViolation(String),

    /// An internal invariant was violated. Always a bug, never bad input.
    #[error("invariant failure: {0}")]
    InvariantFailure(String),

    /// The units report does not line up with the dump (unknown token or
    /// variable ids, missing unit assignments).
    #[error("malformed units report: {0}")]
    MalformedReport(String),

    /// I/O failure while reading a dump or report file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// XML-level failure while decoding a dump.
    #[error("dump decode error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON-level failure while decoding a units report.
    #[error("report decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;
