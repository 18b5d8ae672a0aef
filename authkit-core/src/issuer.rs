//! Token issuance
//!
//! Authenticates login credentials against the credential store and mints
//! access/refresh token pairs. Also owns the two revocation-driven
//! transitions: refresh rotation and logout.

use crate::{
    codec::{now_unix, Claims, TokenCodec},
    store::{hash_password, verify_password, CredentialStore},
    AuthError, Result, RevocationRegistry, Role, TokenKind, TokenPair, TokenVerifier, UserId,
};
use std::sync::Arc;
use std::time::Duration;

/// Token lifetimes, injected at startup.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Lifetime of access tokens (short)
    pub access_ttl: Duration,

    /// Lifetime of refresh tokens (longer)
    pub refresh_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        TokenConfig {
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Issues token pairs after authenticating against the credential store.
pub struct TokenIssuer {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    verifier: TokenVerifier,
    revocations: Arc<RevocationRegistry>,
    config: TokenConfig,
    /// Hash of a throwaway password, verified against on the unknown-login
    /// path so that "no such user" and "wrong password" take comparable time.
    dummy_hash: String,
}

impl TokenIssuer {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        revocations: Arc<RevocationRegistry>,
        config: TokenConfig,
    ) -> Result<Self> {
        let dummy_hash = hash_password("authkit-dummy-password")?;
        let verifier = TokenVerifier::new(codec.clone(), Arc::clone(&revocations));

        Ok(TokenIssuer {
            store,
            codec,
            verifier,
            revocations,
            config,
            dummy_hash,
        })
    }

    /// Authenticate a login/password pair and issue a fresh token pair.
    ///
    /// Unknown login and wrong password both fail with `InvalidCredentials`;
    /// the two cases are never distinguished, to prevent user enumeration.
    /// Store failures propagate as `StoreUnavailable` and are never retried.
    pub fn login(&self, login: &str, password: &str) -> Result<TokenPair> {
        let user = match self.store.find_by_login(login) {
            Ok(user) => user,
            Err(err @ AuthError::StoreUnavailable(_)) => return Err(err),
            Err(_) => return Err(AuthError::InvalidCredentials),
        };

        match user {
            Some(user) => {
                if !verify_password(password, &user.password_hash) {
                    return Err(AuthError::InvalidCredentials);
                }
                self.issue_pair(user.id, user.role)
            }
            None => {
                // Burn the same hashing work as the wrong-password path
                let _ = verify_password(password, &self.dummy_hash);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Rotate a refresh token: revoke the presented token and issue a new
    /// access/refresh pair.
    ///
    /// The old token's `jti` is revoked before the new pair is minted, so a
    /// replay of the presented token fails with `Revoked`. The role snapshot
    /// is carried forward from the presented token.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self
            .verifier
            .verify_claims(refresh_token, TokenKind::Refresh)?;

        self.revocations.revoke(claims.jti.clone(), claims.exp);

        self.issue_pair(claims.sub, claims.role)
    }

    /// Revoke both tokens of a session.
    ///
    /// Idempotent with respect to revocation: a token that is already revoked
    /// still counts as logged out. Any other verification failure is an error.
    pub fn logout(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.revoke_token(access_token, TokenKind::Access)?;
        self.revoke_token(refresh_token, TokenKind::Refresh)?;
        Ok(())
    }

    fn revoke_token(&self, token: &str, kind: TokenKind) -> Result<()> {
        match self.verifier.verify_claims(token, kind) {
            Ok(claims) => {
                self.revocations.revoke(claims.jti, claims.exp);
                Ok(())
            }
            Err(AuthError::Revoked) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn issue_pair(&self, subject: UserId, role: Role) -> Result<TokenPair> {
        let now = now_unix();

        let access = Claims::new(subject, role, TokenKind::Access, now, self.config.access_ttl);
        let refresh = Claims::new(
            subject,
            role,
            TokenKind::Refresh,
            now,
            self.config.refresh_ttl,
        );

        Ok(TokenPair {
            access_token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
        })
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
