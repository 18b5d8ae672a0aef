//! Error types for authkit

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token revoked")]
    Revoked,

    #[error("wrong token kind")]
    WrongKind,

    #[error("insufficient role")]
    InsufficientRole,

    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Authentication failures that must collapse into a single
    /// undifferentiated "unauthorized" outcome at the transport boundary.
    /// The specific variant is for logging only, never for clients.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::Malformed(_)
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::Revoked
                | AuthError::WrongKind
        )
    }
}
