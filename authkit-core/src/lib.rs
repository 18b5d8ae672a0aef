//! Core authentication and authorization for authkit
//!
//! Issues signed, time-bounded token pairs after login, verifies them on
//! every request, and maps the result to an enforceable permission level:
//! - Token codec: compact signed claim sets (keyed BLAKE3 MAC)
//! - Issuer: login, refresh rotation, logout
//! - Verifier: signature, expiry, kind, and revocation checks
//! - Revocation registry: invalidated token IDs until natural expiry
//! - Guard: role-ordered authorization

pub mod codec;
pub mod error;
pub mod guard;
pub mod issuer;
pub mod revocation;
pub mod store;
pub mod timing;
pub mod types;
pub mod verifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use codec::{Claims, TokenCodec};
pub use error::AuthError;
pub use guard::authorize;
pub use issuer::{TokenConfig, TokenIssuer};
pub use revocation::RevocationRegistry;
pub use store::{CredentialStore, MemoryCredentialStore};
pub use types::{Principal, Role, TokenId, TokenKind, TokenPair, User, UserId};
pub use verifier::TokenVerifier;

/// Result type alias for authkit operations
pub type Result<T> = std::result::Result<T, AuthError>;
