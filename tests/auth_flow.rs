//! End-to-end authentication flow over a temp database: account
//! creation, credential checks, token round trips and role gates.

use innkeep_backend::auth::{
    jwt::{JwtHandler, TokenError},
    models::{Role, UserStatus},
    rbac::{authorize, check_role, Permission},
    UserStore,
};
use tempfile::NamedTempFile;

// Minimum bcrypt cost keeps the suite fast; production cost comes from
// configuration.
const TEST_COST: u32 = 4;

fn store() -> (UserStore, NamedTempFile) {
    let temp = NamedTempFile::new().unwrap();
    let store = UserStore::new(temp.path().to_str().unwrap(), TEST_COST).unwrap();
    (store, temp)
}

#[test]
fn registered_credentials_log_in_and_others_fail() {
    let (store, _temp) = store();

    let created = store
        .create_user("frontdesk", "correct-horse", Role::Receptionist, None)
        .unwrap();

    let user = store
        .verify_login("frontdesk", "correct-horse")
        .unwrap()
        .expect("matching credentials must log in");
    assert_eq!(user.id, created.id);
    assert_eq!(user.role, Role::Receptionist);

    assert!(store.verify_login("frontdesk", "battery-staple").unwrap().is_none());
    assert!(store.verify_login("frontdesk", "").unwrap().is_none());
    assert!(store.verify_login("no-such-user", "correct-horse").unwrap().is_none());
}

#[test]
fn fresh_token_verifies_and_carries_the_registration_role() {
    let (store, _temp) = store();
    let jwt = JwtHandler::new("integration-secret".to_string(), 30);

    let user = store
        .create_user("auditor", "ledger-pass", Role::Accountant, None)
        .unwrap();
    let logged_in = store
        .verify_login("auditor", "ledger-pass")
        .unwrap()
        .unwrap();

    let (token, expires_in) = jwt.issue_token(&logged_in).unwrap();
    assert_eq!(expires_in, 30 * 60);

    let claims = jwt.verify_token(&token).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.username, "auditor");
    assert_eq!(claims.role, Role::Accountant);
    assert!(claims.exp > claims.iat);
}

#[test]
fn expired_and_tampered_tokens_fail_distinctly() {
    let (store, _temp) = store();
    let user = store
        .create_user("frontdesk", "password1", Role::Receptionist, None)
        .unwrap();

    // Past the default validation leeway
    let stale_issuer = JwtHandler::new("integration-secret".to_string(), -5);
    let (stale_token, _) = stale_issuer.issue_token(&user).unwrap();
    assert_eq!(
        stale_issuer.verify_token(&stale_token).unwrap_err(),
        TokenError::Expired
    );

    let jwt = JwtHandler::new("integration-secret".to_string(), 30);
    let (token, _) = jwt.issue_token(&user).unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[2] = "forged-signature-material-goes-here";
    assert_eq!(
        jwt.verify_token(&parts.join(".")).unwrap_err(),
        TokenError::Invalid
    );

    let other = JwtHandler::new("some-other-secret".to_string(), 30);
    assert_eq!(other.verify_token(&token).unwrap_err(), TokenError::Invalid);
}

#[test]
fn role_gates_match_the_capability_table() {
    // The spec-level contract over an explicit capability set
    let front_desk = [Role::Manager, Role::Receptionist];
    assert!(!check_role(Role::Housekeeping, &front_desk));
    assert!(check_role(Role::Manager, &front_desk));

    // And through the static table
    assert!(authorize(Role::Receptionist, Permission::BookingWrite).is_ok());
    assert!(authorize(Role::Housekeeping, Permission::BookingWrite).is_err());
    assert!(authorize(Role::Housekeeping, Permission::RoomHousekeepingUpdate).is_ok());
    assert!(authorize(Role::Accountant, Permission::ReportView).is_ok());
    assert!(authorize(Role::Accountant, Permission::GuestWrite).is_err());
}

#[test]
fn deactivated_accounts_keep_their_record_but_stop_logging_in() {
    let (store, _temp) = store();

    let user = store
        .create_user("leaver", "password1", Role::Housekeeping, None)
        .unwrap();

    assert!(store.set_status(user.id, UserStatus::Locked, 1).unwrap());

    // The credential check still passes at the store layer; the login
    // surface rejects Locked accounts before issuing a token.
    let after = store.verify_login("leaver", "password1").unwrap().unwrap();
    assert_eq!(after.status, UserStatus::Locked);

    // Audit trail preserved
    let kept = store.get_by_id(user.id).unwrap().unwrap();
    assert_eq!(kept.username, "leaver");
    assert_eq!(kept.created_at, user.created_at);
}

#[test]
fn duplicate_hashes_differ_but_both_verify() {
    let (store, _temp) = store();

    let alice = store
        .create_user("alice", "same-password", Role::Receptionist, None)
        .unwrap();
    let bob = store
        .create_user("bob", "same-password", Role::Receptionist, None)
        .unwrap();

    assert_ne!(alice.password_hash, bob.password_hash);
    assert!(store.verify_login("alice", "same-password").unwrap().is_some());
    assert!(store.verify_login("bob", "same-password").unwrap().is_some());
}
