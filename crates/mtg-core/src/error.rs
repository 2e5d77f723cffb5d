//! # Store Error Types
//!
//! Typed error handling for the mtg-store backend.
//! Every data-access, auth and checkout operation returns `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Record not found
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Unique field collision (user email, set code)
    #[error("{entity} already registered with {field} {value}")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Malformed checkout payload
    #[error("Invalid order format: {0}")]
    InvalidOrder(String),

    /// Requested page starts beyond the last record
    #[error("Page out of range: page {page_num} of size {page_size} with {count} records")]
    OutOfRange {
        page_size: u64,
        page_num: u64,
        count: u64,
    },

    /// Password did not match the stored hash
    #[error("The password is incorrect")]
    IncorrectPassword,

    /// Refused to remove the only address of a user
    #[error("Cannot delete the last address of an account")]
    LastAddress,

    /// A record kept changing underneath a read-modify-write
    #[error("Concurrent update of {0}, try again")]
    Conflict(&'static str),

    /// Missing, malformed or expired token
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated caller is not allowed to do this
    #[error("Access not allowed: {0}")]
    Unauthorized(String),

    /// Database or image host failure
    #[error("Upstream error [{service}]: {message}")]
    Upstream { service: String, message: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Uploaded file over the size cap
    #[error("File too big: {size} bytes (limit {limit} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Configuration errors (missing env vars, invalid secrets)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        ShopError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, message: impl ToString) -> Self {
        ShopError::Upstream {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Returns true if the failure came from a collaborator and may succeed later.
    /// Nothing retries automatically; callers use this for logging only.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::Upstream { .. })
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Unauthenticated(_) => 401,
            ShopError::Unauthorized(_) => 403,
            ShopError::PayloadTooLarge { .. } => 413,
            ShopError::Configuration(_) | ShopError::Internal(_) => 500,
            ShopError::Upstream { .. } => 502,
            ShopError::NotFound { .. }
            | ShopError::Duplicate { .. }
            | ShopError::InvalidOrder(_)
            | ShopError::OutOfRange { .. }
            | ShopError::IncorrectPassword
            | ShopError::LastAddress
            | ShopError::Conflict(_)
            | ShopError::InvalidRequest(_) => 422,
        }
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;
