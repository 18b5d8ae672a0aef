//! Token encode/decode
//!
//! Tokens are three dot-separated URL-safe base64 segments:
//! header, payload, signature. The header pins the algorithm
//! (`B3K256`, a keyed BLAKE3 MAC over the `header.payload` signing input).
//! The MAC key is derived once at startup from a configured secret and is
//! never rotated mid-process; rotation is an extension point.
//!
//! Decoding is a pure transformation: no clock is read more than once per
//! call and no shared state is touched.

use crate::{
    timing::constant_time_mac_compare, AuthError, Result, Role, TokenId, TokenKind, UserId,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Algorithm identifier carried in the token header
pub const TOKEN_ALG: &str = "B3K256";

/// Token type identifier carried in the token header
pub const TOKEN_TYP: &str = "JWT";

/// Fixed context string for MAC key derivation
const KEY_CONTEXT: &str = "authkit v1 token signing";

/// Current unix time in whole seconds
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Token header (algorithm identifier)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Signed claim set embedded in every token.
///
/// Wire field names are fixed for cross-implementation compatibility:
/// `sub`, `role`, `iat`, `exp`, `jti`, `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: UserId,

    /// Role snapshot taken at issuance time
    pub role: Role,

    /// Issued-at, unix seconds
    pub iat: u64,

    /// Expiry, unix seconds. Invariant: `exp > iat`.
    pub exp: u64,

    /// Unique token ID, used for revocation
    pub jti: TokenId,

    /// Access or refresh
    pub kind: TokenKind,
}

impl Claims {
    /// Build claims for a token issued at `issued_at` with the given lifetime
    /// and a freshly generated `jti`.
    pub fn new(sub: UserId, role: Role, kind: TokenKind, issued_at: u64, ttl: Duration) -> Self {
        Claims {
            sub,
            role,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl.as_secs().max(1)),
            jti: TokenId::new(),
            kind,
        }
    }
}

/// Encodes and decodes signed tokens with a process-wide MAC key.
///
/// Stateless and pure; safe for unrestricted concurrent use.
#[derive(Clone)]
pub struct TokenCodec {
    key: [u8; 32],
}

impl TokenCodec {
    /// Derive the MAC key from a configured secret.
    ///
    /// Distinct secrets yield unrelated keys, so tests can instantiate
    /// isolated codecs.
    pub fn from_secret(secret: &[u8]) -> Self {
        TokenCodec {
            key: blake3::derive_key(KEY_CONTEXT, secret),
        }
    }

    /// Serialize and sign a claim set into a compact token string
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        let header = Header {
            alg: TOKEN_ALG.to_string(),
            typ: TOKEN_TYP.to_string(),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);

        let signing_input = format!("{}.{}", header_b64, payload_b64);
        let mac = blake3::keyed_hash(&self.key, signing_input.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(mac.as_bytes());

        Ok(format!("{}.{}", signing_input, sig_b64))
    }

    /// Decode a token against the current clock
    pub fn decode(&self, token: &str) -> Result<Claims> {
        self.decode_at(token, now_unix())
    }

    /// Decode a token against an explicit clock reading.
    ///
    /// The signature is recomputed over the received `header.payload` bytes
    /// and compared in constant time before anything else is trusted.
    pub fn decode_at(&self, token: &str, now: u64) -> Result<Claims> {
        let mut segments = token.split('.');
        let (header_b64, payload_b64, sig_b64) =
            match (segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s)) if segments.next().is_none() => (h, p, s),
                _ => return Err(AuthError::Malformed("expected three segments".to_string())),
            };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| AuthError::Malformed("invalid header encoding".to_string()))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|_| AuthError::Malformed("invalid header".to_string()))?;

        if header.alg != TOKEN_ALG || header.typ != TOKEN_TYP {
            return Err(AuthError::Malformed(format!(
                "unsupported algorithm '{}'",
                header.alg
            )));
        }

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| AuthError::Malformed("invalid signature encoding".to_string()))?;
        let sig: [u8; 32] = sig_bytes
            .try_into()
            .map_err(|_| AuthError::Malformed("invalid signature length".to_string()))?;

        let signing_input = format!("{}.{}", header_b64, payload_b64);
        let expected = blake3::keyed_hash(&self.key, signing_input.as_bytes());

        if !constant_time_mac_compare(expected.as_bytes(), &sig) {
            return Err(AuthError::InvalidSignature);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::Malformed("invalid payload encoding".to_string()))?;
        let claims: Claims = serde_json::from_slice(&payload_bytes)
            .map_err(|_| AuthError::Malformed("invalid claims".to_string()))?;

        if now > claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_claims(now: u64) -> Claims {
        Claims::new(
            UserId::new(42),
            Role::User,
            TokenKind::Access,
            now,
            Duration::from_secs(900),
        )
    }

    #[test]
    fn codec_roundtrip_preserves_claims() {
        let codec = TokenCodec::from_secret(b"test-secret");
        let now = now_unix();
        let claims = test_claims(now);

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode_at(&token, now).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn codec_huge_ttl_saturates_instead_of_wrapping() {
        let codec = TokenCodec::from_secret(b"test-secret");
        let now = now_unix();
        let claims = Claims::new(
            UserId::new(42),
            Role::User,
            TokenKind::Refresh,
            now,
            Duration::from_secs(u64::MAX),
        );

        // A wrap here would put exp in the past and expire the token on issue
        assert_eq!(claims.exp, u64::MAX);

        let token = codec.encode(&claims).unwrap();
        assert!(codec.decode_at(&token, now).is_ok());
    }

    #[test]
    fn codec_rejects_expired_token() {
        let codec = TokenCodec::from_secret(b"test-secret");
        let claims = test_claims(1_000_000);

        let token = codec.encode(&claims).unwrap();

        // One second past expiry
        match codec.decode_at(&token, claims.exp + 1) {
            Err(AuthError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other),
        }

        // Exactly at expiry is still valid
        assert!(codec.decode_at(&token, claims.exp).is_ok());
    }

    #[test]
    fn codec_rejects_tampered_payload() {
        let codec = TokenCodec::from_secret(b"test-secret");
        let now = now_unix();
        let token = codec.encode(&test_claims(now)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let mut payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        // Flip a byte inside the claims JSON
        payload[10] ^= 0x01;
        let tampered = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(&payload),
            parts[2]
        );

        match codec.decode_at(&tampered, now) {
            Err(AuthError::InvalidSignature) | Err(AuthError::Malformed(_)) => {}
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn codec_rejects_tampered_signature() {
        let codec = TokenCodec::from_secret(b"test-secret");
        let now = now_unix();
        let token = codec.encode(&test_claims(now)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let mut sig = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        sig[0] ^= 0xff;
        let tampered = format!("{}.{}.{}", parts[0], parts[1], URL_SAFE_NO_PAD.encode(&sig));

        match codec.decode_at(&tampered, now) {
            Err(AuthError::InvalidSignature) => {}
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn codec_rejects_wrong_key() {
        let codec = TokenCodec::from_secret(b"secret-a");
        let other = TokenCodec::from_secret(b"secret-b");
        let now = now_unix();

        let token = codec.encode(&test_claims(now)).unwrap();

        match other.decode_at(&token, now) {
            Err(AuthError::InvalidSignature) => {}
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn codec_rejects_garbage() {
        let codec = TokenCodec::from_secret(b"test-secret");

        for garbage in ["", "abc", "a.b", "a.b.c.d", "!!!.???.###"] {
            match codec.decode_at(garbage, 0) {
                Err(AuthError::Malformed(_)) => {}
                other => panic!("expected Malformed for {:?}, got {:?}", garbage, other),
            }
        }
    }

    #[test]
    fn codec_rejects_unknown_algorithm() {
        let codec = TokenCodec::from_secret(b"test-secret");
        let now = now_unix();
        let token = codec.encode(&test_claims(now)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let swapped = format!("{}.{}.{}", header, parts[1], parts[2]);

        match codec.decode_at(&swapped, now) {
            Err(AuthError::Malformed(_)) => {}
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn codec_expiry_wins_over_valid_signature() {
        let codec = TokenCodec::from_secret(b"test-secret");
        let claims = test_claims(1_000);
        let token = codec.encode(&claims).unwrap();

        // Signature is valid, token is long past expiry
        match codec.decode_at(&token, claims.exp + 100_000) {
            Err(AuthError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other),
        }
    }
}
