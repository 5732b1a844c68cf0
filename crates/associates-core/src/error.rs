//! Error types for associate onboarding
//!
//! Every error raised here is recoverable from the caller's point of view.
//! Only [`StoreError::Unavailable`] is transient and eligible for an
//! automatic retry; everything else is surfaced verbatim.

use thiserror::Error;

use crate::model::{AssociateId, AssociateStatus};
use crate::validators::FieldError;

/// Errors raised by a [`RecordStore`](crate::store::RecordStore)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the given id
    #[error("Associate not found: {0}")]
    NotFound(AssociateId),

    /// Compare-and-set on the status lost against a concurrent writer
    #[error("Status conflict for {id}: expected {expected}, found {actual}")]
    Conflict {
        id: AssociateId,
        expected: AssociateStatus,
        actual: AssociateStatus,
    },

    /// A unique value (id, token) is already taken
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),

    /// Transient failure of the backing store
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the operation may succeed if simply attempted again
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised while issuing or resolving access tokens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Unknown, expired, or already consumed token
    #[error("Token not found")]
    NotFound,

    /// Tokens are only issued for pending associates
    #[error("Associate {id} is {status}, tokens are only issued while pending")]
    NotPending {
        id: AssociateId,
        status: AssociateStatus,
    },

    /// The random source failed or kept colliding with existing tokens
    #[error("Token generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a rejected submission, or a failure to process it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Unknown, expired, or already consumed token
    #[error("Invalid token")]
    InvalidToken,

    /// One or more fields failed validation; every failing field is listed
    #[error("Validation failed: {}", join_reasons(.0))]
    ValidationFailed(Vec<FieldError>),

    /// A concurrent submission consumed the token first
    #[error("Token already used")]
    TokenAlreadyUsed,

    /// The record store stayed unavailable after the bounded retry
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store invariant was violated or a token could not be generated
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubmissionError {
    /// Snake-case reason codes suitable for clients
    pub fn reason_codes(&self) -> Vec<&'static str> {
        match self {
            SubmissionError::InvalidToken => vec!["invalid_token"],
            SubmissionError::ValidationFailed(fields) => {
                fields.iter().map(|f| f.reason.as_str()).collect()
            }
            SubmissionError::TokenAlreadyUsed => vec!["token_already_used"],
            SubmissionError::StoreUnavailable(_) => vec!["store_unavailable"],
            SubmissionError::Internal(_) => vec!["internal_error"],
        }
    }

    /// Only a store outage is worth retrying the whole submission for
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::StoreUnavailable(_))
    }

    /// Whether the submission itself was turned down, as opposed to failing
    /// to be processed
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SubmissionError::InvalidToken
                | SubmissionError::ValidationFailed(_)
                | SubmissionError::TokenAlreadyUsed
        )
    }
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => SubmissionError::TokenAlreadyUsed,
            StoreError::NotFound(_) => SubmissionError::InvalidToken,
            err @ StoreError::Duplicate(_) => SubmissionError::Internal(err.to_string()),
            StoreError::Unavailable(msg) => SubmissionError::StoreUnavailable(msg),
        }
    }
}

impl From<TokenError> for SubmissionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Store(store) => store.into(),
            err @ TokenError::Generation(_) => SubmissionError::Internal(err.to_string()),
            TokenError::NotFound | TokenError::NotPending { .. } => SubmissionError::InvalidToken,
        }
    }
}

/// Errors raised by admin directory operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Invalid associate: {}", join_reasons(.0))]
    Invalid(Vec<FieldError>),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn join_reasons(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.reason.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
