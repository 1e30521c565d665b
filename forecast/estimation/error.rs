use thiserror::Error;

/// Errors surfaced by the estimation engine.
///
/// Scoring itself is total over validated input; only request validation,
/// label parsing and configuration can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EstimationError {
    /// A request field is outside its accepted range.
    #[error("invalid request field `{field}`: {reason}")]
    InvalidRequest {
        /// Offending field.
        field: &'static str,
        /// Human readable detail.
        reason: String,
    },
    /// Scope label is not one of small/medium/large.
    #[error("unknown scope size: {0}")]
    UnknownScope(String),
    /// Configuration could not be applied.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EstimationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            field,
            reason: reason.into(),
        }
    }
}
