// Error taxonomy shared by the upstream clients and the warband aggregator.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    /// The upstream service has no such entity.
    #[error("{0} not found")]
    NotFound(String),

    /// Non-success status, transport failure, or a payload we could not read.
    #[error("upstream service error: {0}")]
    Service(String),

    /// Rejected before any network call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backing service is not configured on this deployment.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Service(e.to_string())
    }
}

/// Reject empty (after trimming) request parameters.
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, LookupError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LookupError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed)
}
