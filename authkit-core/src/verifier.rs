//! Token verification
//!
//! Turns an incoming token string into an authenticated [`Principal`], or
//! fails with the precise reason (kept internal; the transport layer
//! collapses all of these into one "unauthorized" outcome).

use crate::{
    codec::{Claims, TokenCodec},
    AuthError, Principal, Result, RevocationRegistry, TokenKind,
};
use std::sync::Arc;

/// Validates signature, expiry, kind, and revocation status of tokens.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    codec: TokenCodec,
    revocations: Arc<RevocationRegistry>,
}

impl TokenVerifier {
    pub fn new(codec: TokenCodec, revocations: Arc<RevocationRegistry>) -> Self {
        TokenVerifier { codec, revocations }
    }

    /// Verify a token and return its full claim set.
    ///
    /// Used directly by refresh rotation and logout, which need the `jti`
    /// and `exp` in addition to the principal.
    pub fn verify_claims(&self, token: &str, required_kind: TokenKind) -> Result<Claims> {
        let claims = self.codec.decode(token)?;

        if claims.kind != required_kind {
            return Err(AuthError::WrongKind);
        }

        if self.revocations.is_revoked(&claims.jti) {
            return Err(AuthError::Revoked);
        }

        Ok(claims)
    }

    /// Verify a token and return the authenticated principal.
    ///
    /// The role is the one embedded at issuance time, never re-fetched from
    /// the credential store: a role change takes effect only once the user's
    /// current tokens expire or are revoked.
    pub fn verify(&self, token: &str, required_kind: TokenKind) -> Result<Principal> {
        let claims = self.verify_claims(token, required_kind)?;

        Ok(Principal {
            subject_id: claims.sub,
            role: claims.role,
        })
    }

    pub fn revocations(&self) -> &Arc<RevocationRegistry> {
        &self.revocations
    }
}
