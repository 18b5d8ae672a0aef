//! Core data types for authkit

use serde::{Deserialize, Serialize};

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Self {
        UserId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authorization level. Closed set with a total order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    /// Explicit privilege rank table. Ordering comes from here, never from
    /// lexical comparison of role names.
    fn rank(&self) -> u8 {
        match self {
            Role::User => 0,
            Role::Admin => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User identity record. Owned by the credential store; the auth core only
/// ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub login: String,
    /// Opaque PHC-format password hash
    pub password_hash: String,
    pub role: Role,
}

/// Kind of a token. A refresh token must never be accepted where an access
/// token is required, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "ACCESS")]
    Access,
    #[serde(rename = "REFRESH")]
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "ACCESS"),
            TokenKind::Refresh => write!(f, "REFRESH"),
        }
    }
}

/// Unique token identifier using ULID for time-ordering
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Generate a fresh token ID
    pub fn new() -> Self {
        TokenId(ulid::Ulid::new().to_string())
    }

    /// Create from string representation
    pub fn from_string(s: String) -> Self {
        TokenId(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The verified result of decoding a valid token. Held only for the duration
/// of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: UserId,
    /// Role as snapshotted at token issuance time, not re-fetched from the
    /// credential store. A role change takes effect once the user's current
    /// tokens expire or are revoked.
    pub role: Role,
}

/// Access/refresh token pair returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_privilege_order() {
        assert!(Role::Admin > Role::User);
        assert!(Role::User >= Role::User);
        assert!(!(Role::User >= Role::Admin));
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_token_id_uniqueness() {
        let a = TokenId::new();
        let b = TokenId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&TokenKind::Refresh).unwrap(),
            "\"REFRESH\""
        );
        let kind: TokenKind = serde_json::from_str("\"ACCESS\"").unwrap();
        assert_eq!(kind, TokenKind::Access);
    }
}
