use crate::credentials::{
    ClientCredentials, CredentialItem, CredentialKey, CredentialStore, Credentials,
    FileCredentialStore, InMemoryCredentialStore, ServiceClass, UserCredentials,
};
use crate::resource::UserAuth;

use models::{AccessToken, TokenType};

use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn client() -> ClientCredentials {
    ClientCredentials {
        id: "client".to_string(),
        secret: "secret".into(),
        domain: "example.com".to_string(),
    }
}

/// **VALUE**: Verifies multi-key writes and deletes in the in-memory store.
///
/// **WHY THIS MATTERS**: Token and expiration are one logical credential; a partial delete
/// leaves an expiration without a token.
///
/// **BUG THIS CATCHES**: Would catch `delete_all` only removing the first key.
#[test]
fn given_items_when_set_all_and_delete_all_then_store_consistent() {
    // GIVEN: A store with user values
    let store = InMemoryCredentialStore::new();
    store
        .set_all(vec![
            CredentialItem::new(CredentialKey::UserEmail, "a@example.com"),
            CredentialItem::new(CredentialKey::UserPassword, "pw"),
            CredentialItem::new(CredentialKey::UserAccessToken, "token"),
        ])
        .expect("set_all");

    // WHEN: Deleting two of them
    store
        .delete_all(
            ServiceClass::User,
            &[CredentialKey::UserEmail, CredentialKey::UserPassword],
        )
        .expect("delete_all");

    // THEN: Only the remaining value is readable
    assert!(store.get(ServiceClass::User, CredentialKey::UserEmail).expect("get").is_none());
    assert_eq!(
        store
            .get(ServiceClass::User, CredentialKey::UserAccessToken)
            .expect("get")
            .map(|v| v.expose().to_string()),
        Some("token".to_string())
    );
    assert_eq!(store.len(), 1);
}

/// **VALUE**: Verifies the client basic authorization is `Basic base64(id:secret)`.
///
/// **WHY THIS MATTERS**: The user center rejects anything else with a 401, which would look like
/// a wrong secret.
///
/// **BUG THIS CATCHES**: Would catch URL-safe base64 or a missing colon.
#[test]
fn given_client_credentials_when_basic_authorization_then_standard_base64() {
    let credentials = Credentials::new(Arc::new(InMemoryCredentialStore::new()));
    credentials.save_client_credentials(&client()).expect("save");

    let value = credentials
        .user_authorization(UserAuth::Basic)
        .expect("basic authorization");

    // base64("client:secret")
    assert_eq!(value.expose(), "Basic Y2xpZW50OnNlY3JldA==");
}

/// **VALUE**: Verifies an expired stored token is treated as absent.
///
/// **WHY THIS MATTERS**: Sending a known-expired token wastes a round trip on a guaranteed 401.
///
/// **BUG THIS CATCHES**: Would catch the expiration being stored but never checked.
#[test]
fn given_expired_user_token_when_read_then_absent() {
    // GIVEN: One expired and then one valid token
    let credentials = Credentials::new(Arc::new(InMemoryCredentialStore::new()));
    let expired = AccessToken::new("old", SystemTime::now() - Duration::from_secs(1));
    credentials.save_user_token(&expired).expect("save");

    // WHEN/THEN: The expired one is absent
    assert!(credentials.user_access_token().is_none());
    assert!(credentials.user_authorization(UserAuth::Bearer).is_none());

    // AND: A valid one is returned with its bearer header
    let valid = AccessToken::new("fresh", SystemTime::now() + Duration::from_secs(600));
    credentials.save_user_token(&valid).expect("save");
    assert_eq!(
        credentials
            .user_authorization(UserAuth::Bearer)
            .map(|v| v.expose().to_string()),
        Some("Bearer fresh".to_string())
    );
}

/// **VALUE**: Verifies invalidation removes only the user access token, not the login.
///
/// **WHY THIS MATTERS**: After a 401 the transport logs in again with the stored login; losing
/// it would create a new anonymous user every time.
///
/// **BUG THIS CATCHES**: Would catch invalidation calling `forget_user`.
#[test]
fn given_user_login_and_token_when_invalidated_then_login_kept() {
    let credentials = Credentials::new(Arc::new(InMemoryCredentialStore::new()));
    let user = UserCredentials::anonymous("example.com");
    credentials.save_user_credentials(&user).expect("save");
    credentials
        .save_user_token(&AccessToken::new("t", SystemTime::now() + Duration::from_secs(60)))
        .expect("save");

    credentials.invalidate_user_token().expect("invalidate");

    assert!(credentials.user_access_token().is_none());
    let kept = credentials.user_credentials().expect("login kept");
    assert_eq!(kept.email, user.email);
    assert!(kept.email.ends_with("@example.com"));
}

/// **VALUE**: Verifies the file store persists across instances and never keeps a temp file.
///
/// **WHY THIS MATTERS**: The anonymous user must survive app restarts or its documents are lost.
///
/// **BUG THIS CATCHES**: Would catch writes that never rename the temp file into place.
#[test]
fn given_file_store_when_reopened_then_values_persist() {
    // GIVEN: A file store with a login
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("credentials.json");
    let store = FileCredentialStore::new(&path);
    store
        .set_all(vec![
            CredentialItem::new(CredentialKey::UserEmail, "a@example.com"),
            CredentialItem::new(CredentialKey::ClientId, "client"),
        ])
        .expect("set_all");

    // WHEN: Reopening
    let reopened = FileCredentialStore::new(&path);

    // THEN: Values are there and no temp file is left behind
    assert_eq!(
        reopened
            .get(ServiceClass::User, CredentialKey::UserEmail)
            .expect("get")
            .map(|v| v.expose().to_string()),
        Some("a@example.com".to_string())
    );
    assert!(!path.with_extension("json.tmp").exists());

    // AND: clear_all removes everything
    reopened.clear_all().expect("clear");
    assert!(reopened.get(ServiceClass::Client, CredentialKey::ClientId).expect("get").is_none());
}

/// **VALUE**: Verifies a corrupted credentials file is reported, and the typed view treats it
/// as "no credential".
///
/// **WHY THIS MATTERS**: A broken file must lead to a fresh login, not a crash.
///
/// **BUG THIS CATCHES**: Would catch read errors propagated as panics through the transport.
#[test]
fn given_corrupted_file_when_read_then_error_and_typed_view_absent() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{ not json").expect("write");
    let store = Arc::new(FileCredentialStore::new(&path));

    assert!(store.get(ServiceClass::User, CredentialKey::UserEmail).is_err());

    let credentials = Credentials::new(store);
    assert!(credentials.user_credentials().is_none());
}

/// **VALUE**: Verifies a saved token reads back as a bearer token with value and expiry intact.
///
/// **WHY THIS MATTERS**: Both grants issue bearer tokens; the store keeps value and expiry
/// only, so the read side must rebuild exactly the `Bearer` header the server expects.
///
/// **BUG THIS CATCHES**: Would catch a lossy expiry round trip that expires tokens early.
#[test]
fn given_saved_user_token_when_read_then_bearer_with_same_value_and_expiry() {
    // GIVEN: A token saved with whole-second expiry
    let credentials = Credentials::new(Arc::new(InMemoryCredentialStore::new()));
    let expiration = SystemTime::UNIX_EPOCH + Duration::from_secs(4_102_444_800);
    let token = AccessToken::new("user-token", expiration);
    credentials.save_user_token(&token).expect("save");

    // WHEN: Reading it back
    let stored = credentials.user_access_token().expect("token present");

    // THEN: Same value and expiry, bearer authorization
    assert_eq!(stored.token_type, TokenType::Bearer);
    assert_eq!(stored.value.expose(), "user-token");
    assert_eq!(stored.expiration, expiration);
    assert_eq!(
        credentials
            .user_authorization(UserAuth::Bearer)
            .map(|v| v.expose().to_string()),
        Some("Bearer user-token".to_string())
    );
}

/// **VALUE**: Verifies the credentials file is owner-only, even over a stale temp file.
///
/// **WHY THIS MATTERS**: The file holds the client secret and the user password; other local
/// users must never be able to read it, not even during a write.
///
/// **BUG THIS CATCHES**: Would catch permissions applied after the secrets are written, or a
/// world-readable leftover temp file being reused.
#[cfg(unix)]
#[test]
fn given_stale_readable_temp_file_when_written_then_credentials_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    // GIVEN: A leftover temp file readable by everyone
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("credentials.json");
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, "{}").expect("write stale temp");
    std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o644))
        .expect("chmod");
    let store = FileCredentialStore::new(&path);

    // WHEN: Writing a secret
    store
        .set(CredentialItem::new(CredentialKey::UserPassword, "hunter2"))
        .expect("set");

    // THEN: The file is 0600 and the temp file is gone
    let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert!(!temp_path.exists());
}
