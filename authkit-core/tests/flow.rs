//! End-to-end session lifecycle scenarios

use authkit_core::test_utils::{test_auth, ALICE_PASSWORD, ROOT_PASSWORD};
use authkit_core::{authorize, AuthError, CredentialStore, Role, TokenKind};

#[test]
fn flow_login_verify_authorize() {
    let auth = test_auth(b"flow-secret");
    let alice = auth.store.find_by_login("alice").unwrap().unwrap();

    let pair = auth.issuer.login("alice", ALICE_PASSWORD).unwrap();

    let principal = auth
        .verifier
        .verify(&pair.access_token, TokenKind::Access)
        .unwrap();
    assert_eq!(principal.subject_id, alice.id);
    assert_eq!(principal.role, Role::User);

    // USER-level resource is allowed, ADMIN-level is not
    assert!(authorize(&principal, Role::User).is_ok());
    assert!(matches!(
        authorize(&principal, Role::Admin),
        Err(AuthError::InsufficientRole)
    ));
}

#[test]
fn flow_admin_reaches_admin_resources() {
    let auth = test_auth(b"flow-secret");

    let pair = auth.issuer.login("root", ROOT_PASSWORD).unwrap();
    let principal = auth
        .verifier
        .verify(&pair.access_token, TokenKind::Access)
        .unwrap();

    assert_eq!(principal.role, Role::Admin);
    assert!(authorize(&principal, Role::User).is_ok());
    assert!(authorize(&principal, Role::Admin).is_ok());
}

#[test]
fn flow_rotation_then_logout_kills_session() {
    let auth = test_auth(b"flow-secret");

    let initial = auth.issuer.login("alice", ALICE_PASSWORD).unwrap();
    let rotated = auth.issuer.refresh(&initial.refresh_token).unwrap();

    // The consumed refresh token is dead, the rotated pair is live
    assert!(matches!(
        auth.issuer.refresh(&initial.refresh_token),
        Err(AuthError::Revoked)
    ));
    assert!(auth
        .verifier
        .verify(&rotated.access_token, TokenKind::Access)
        .is_ok());

    auth.issuer
        .logout(&rotated.access_token, &rotated.refresh_token)
        .unwrap();

    assert!(matches!(
        auth.verifier.verify(&rotated.access_token, TokenKind::Access),
        Err(AuthError::Revoked)
    ));
    assert!(matches!(
        auth.issuer.refresh(&rotated.refresh_token),
        Err(AuthError::Revoked)
    ));
}

#[test]
fn flow_distinct_secrets_are_isolated() {
    let auth_a = test_auth(b"secret-a");
    let auth_b = test_auth(b"secret-b");

    let pair = auth_a.issuer.login("alice", ALICE_PASSWORD).unwrap();

    assert!(matches!(
        auth_b.verifier.verify(&pair.access_token, TokenKind::Access),
        Err(AuthError::InvalidSignature)
    ));
}

#[test]
fn flow_pruning_does_not_resurrect_live_revocations() {
    let auth = test_auth(b"flow-secret");

    let pair = auth.issuer.login("alice", ALICE_PASSWORD).unwrap();
    auth.issuer
        .logout(&pair.access_token, &pair.refresh_token)
        .unwrap();
    assert_eq!(auth.revocations.len(), 2);

    // Both entries expire well in the future; pruning now removes nothing
    assert_eq!(auth.revocations.prune(authkit_core::codec::now_unix()), 0);
    assert!(matches!(
        auth.verifier.verify(&pair.access_token, TokenKind::Access),
        Err(AuthError::Revoked)
    ));
}
