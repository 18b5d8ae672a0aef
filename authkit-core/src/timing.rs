//! Constant-time cryptographic comparisons
//!
//! Used wherever an attacker-supplied value is compared against a secret
//! derived value, so the comparison duration does not leak match position.

use subtle::ConstantTimeEq;

/// Constant-time byte slice comparison
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Constant-time 32-byte MAC comparison
pub fn constant_time_mac_compare(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_equal_and_unequal() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }

    #[test]
    fn test_mac_compare() {
        let a = [7u8; 32];
        let b = [7u8; 32];
        let c = [8u8; 32];
        assert!(constant_time_mac_compare(&a, &b));
        assert!(!constant_time_mac_compare(&a, &c));
    }
}
