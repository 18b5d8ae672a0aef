//! Authorization guard
//!
//! Pure function of a verified principal and a required role; no side
//! effects, safe for unrestricted concurrent use.

use crate::{AuthError, Principal, Result, Role};

/// Allow the operation iff the principal's role meets or exceeds the
/// required role under the privilege order (`USER < ADMIN`).
pub fn authorize(principal: &Principal, required: Role) -> Result<()> {
    if principal.role >= required {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}
