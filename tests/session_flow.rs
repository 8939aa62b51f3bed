use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use hoops_terminal::api::Api;
use hoops_terminal::http_client::{Method, StubTransport};
use hoops_terminal::session::{Credentials, SessionStore};
use hoops_terminal::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

// base64url of {"sub":"fan@example.com","exp":1900000000}
const JWT: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJmYW5AZXhhbXBsZS5jb20iLCJleHAiOjE5MDAwMDAwMDB9.sig";

/// The directory is removed when the returned guard drops.
fn scratch_file() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("hoops_terminal").join("session.json");
    (dir, path)
}

fn backend() -> (Arc<StubTransport>, Api) {
    let stub = Arc::new(StubTransport::new());
    stub.reply(
        Method::Post,
        "/auth/login",
        200,
        &format!(r#"{{"access_token":"{JWT}","token_type":"bearer"}}"#),
    );
    stub.reply(
        Method::Get,
        "/users/me",
        200,
        r#"{"id":"u1","username":"courtside","email":"fan@example.com"}"#,
    );
    stub.reply(Method::Get, "/teams/standings", 200, "[]");
    let api = Api::new(stub.clone());
    (stub, api)
}

#[test]
fn login_persists_token_and_later_requests_carry_it() {
    let (_dir, path) = scratch_file();
    let (stub, api) = backend();
    let mut store = SessionStore::rehydrate(FileTokenStore::at(&path));
    assert!(!store.session().is_authenticated());

    assert!(store.login(&api, &Credentials::new("fan@example.com", "pw")));
    assert_eq!(store.current_token(), Some(JWT));
    assert_eq!(
        store.session().user().map(|u| u.username.as_str()),
        Some("courtside")
    );
    assert_eq!(
        FileTokenStore::at(&path).load().expect("load token").as_deref(),
        Some(JWT)
    );

    api.standings(store.session(), None).expect("standings");
    let req = stub.last_request().expect("request recorded");
    assert_eq!(req.authorization(), Some(format!("Bearer {JWT}")));

    let restored = SessionStore::rehydrate(FileTokenStore::at(&path));
    assert_eq!(restored.current_token(), Some(JWT));
    assert_eq!(
        restored.session().display_name().as_deref(),
        Some("fan@example.com")
    );
}

#[test]
fn logout_clears_storage_and_memory() {
    let (_dir, path) = scratch_file();
    let (_stub, api) = backend();
    let mut store = SessionStore::rehydrate(FileTokenStore::at(&path));
    assert!(store.login(&api, &Credentials::new("fan@example.com", "pw")));

    store.logout().expect("logout");
    assert_eq!(store.current_token(), None);
    assert!(store.session().user().is_none());
    assert_eq!(FileTokenStore::at(&path).load().expect("load token"), None);

    // Signing out twice is harmless.
    store.logout().expect("second logout");
}

#[test]
fn rejected_credentials_return_false_and_store_nothing() {
    let (_dir, path) = scratch_file();
    let stub = Arc::new(StubTransport::new());
    stub.reply(
        Method::Post,
        "/auth/login",
        401,
        r#"{"detail":"Incorrect email or password"}"#,
    );
    let api = Api::new(stub.clone());
    let mut store = SessionStore::rehydrate(FileTokenStore::at(&path));

    assert!(!store.login(&api, &Credentials::new("fan@example.com", "wrong")));
    assert_eq!(store.current_token(), None);
    assert_eq!(FileTokenStore::at(&path).load().expect("load token"), None);
    assert_eq!(stub.request_count(), 1);
}

#[test]
fn network_failure_on_login_returns_false() {
    let stub = Arc::new(StubTransport::new());
    stub.fail(Method::Post, "/auth/login", "connection refused");
    let api = Api::new(stub.clone());
    let mut store = SessionStore::rehydrate(MemoryTokenStore::default());

    assert!(!store.login(&api, &Credentials::new("fan@example.com", "pw")));
    assert!(!store.session().is_authenticated());
}

#[test]
fn login_succeeds_even_when_profile_lookup_fails() {
    let stub = Arc::new(StubTransport::new());
    stub.reply(Method::Post, "/auth/login", 200, r#"{"access_token":"opaque"}"#);
    stub.reply(Method::Get, "/users/me", 500, r#"{"detail":"boom"}"#);
    let api = Api::new(stub.clone());
    let mut store = SessionStore::rehydrate(MemoryTokenStore::default());

    assert!(store.login(&api, &Credentials::new("fan@example.com", "pw")));
    assert_eq!(store.current_token(), Some("opaque"));
    assert!(store.session().user().is_none());

    stub.reply(
        Method::Get,
        "/users/me",
        200,
        r#"{"id":"u1","username":"courtside","email":"fan@example.com"}"#,
    );
    store.refresh_user(&api).expect("refresh user");
    assert_eq!(
        store.session().display_name().as_deref(),
        Some("courtside")
    );
}

#[test]
fn saved_token_is_rehydrated_from_memory_store() {
    let store = SessionStore::rehydrate(MemoryTokenStore::with_token("saved"));
    assert_eq!(store.current_token(), Some("saved"));
    assert!(store.session().user().is_none());
}

#[test]
fn corrupt_session_file_starts_signed_out() {
    let (_dir, path) = scratch_file();
    fs::create_dir_all(path.parent().expect("scratch dir")).expect("create dir");
    fs::write(&path, "not json").expect("write file");

    let mut store = SessionStore::rehydrate(FileTokenStore::at(&path));
    assert_eq!(store.current_token(), None);
    store.logout().expect("logout tolerates corrupt file");
}

#[test]
fn register_reports_success_and_failure() {
    let stub = Arc::new(StubTransport::new());
    stub.reply(
        Method::Post,
        "/auth/register",
        200,
        r#"{"id":"u2","username":"newfan","email":"new@example.com"}"#,
    );
    let api = Api::new(stub.clone());
    let store = SessionStore::rehydrate(MemoryTokenStore::default());

    assert!(store.register(&api, "newfan", "new@example.com", "pw"));
    // Registration does not sign in.
    assert!(!store.session().is_authenticated());

    stub.reply(
        Method::Post,
        "/auth/register",
        400,
        r#"{"detail":"Email already registered"}"#,
    );
    assert!(!store.register(&api, "newfan", "new@example.com", "pw"));
}

#[test]
fn refresh_user_drops_a_rejected_saved_token() {
    let (_dir, path) = scratch_file();
    let mut saved = FileTokenStore::at(&path);
    saved.save("expired").expect("save token");

    let stub = Arc::new(StubTransport::new());
    stub.reply(
        Method::Get,
        "/users/me",
        401,
        r#"{"detail":"Could not validate credentials"}"#,
    );
    let api = Api::new(stub.clone());
    let mut store = SessionStore::rehydrate(FileTokenStore::at(&path));
    assert_eq!(store.current_token(), Some("expired"));

    let err = store.refresh_user(&api).expect_err("token is rejected");
    assert!(err.is_unauthorized());
    assert_eq!(store.current_token(), None);
    assert_eq!(FileTokenStore::at(&path).load().expect("load token"), None);
}
