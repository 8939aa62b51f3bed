use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use hoops_terminal::api::Api;
use hoops_terminal::error::ApiError;
use hoops_terminal::http_client::{Body, Method, StubTransport};
use hoops_terminal::models::{FavoriteKind, ProfileUpdate, RegisterRequest};
use hoops_terminal::session::{Credentials, Session};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn stub_api() -> (Arc<StubTransport>, Api) {
    let stub = Arc::new(StubTransport::new());
    let api = Api::new(stub.clone());
    (stub, api)
}

#[test]
fn conference_filter_is_sent_verbatim() {
    let (stub, api) = stub_api();
    stub.reply(Method::Get, "/teams/standings", 200, "[]");
    let session = Session::anonymous();

    api.standings(&session, Some("WEST")).expect("standings");
    let req = stub.last_request().expect("request recorded");
    assert_eq!(req.path(), "/teams/standings");
    assert_eq!(req.query_value("conference"), Some("WEST"));

    api.standings(&session, Some("west")).expect("standings");
    let req = stub.last_request().expect("request recorded");
    assert_eq!(req.query_value("conference"), Some("west"));

    api.standings(&session, None).expect("standings");
    assert!(stub.last_request().expect("request recorded").query.is_empty());
}

#[test]
fn bearer_token_follows_the_session() {
    let (stub, api) = stub_api();
    stub.reply(Method::Get, "/players", 200, &read_fixture("players.json"));

    api.players(&Session::with_token("abc123"), Some("G"))
        .expect("players");
    let req = stub.last_request().expect("request recorded");
    assert_eq!(req.authorization().as_deref(), Some("Bearer abc123"));
    assert_eq!(req.query_value("position"), Some("G"));

    api.players(&Session::anonymous(), None).expect("players");
    let req = stub.last_request().expect("request recorded");
    assert_eq!(req.authorization(), None);
}

#[test]
fn login_posts_oauth_form_with_email_as_username() {
    let (stub, api) = stub_api();
    stub.reply(
        Method::Post,
        "/auth/login",
        200,
        r#"{"access_token":"tok","token_type":"bearer"}"#,
    );

    let token = api
        .login(&Credentials::new("fan@example.com", "hunter2"))
        .expect("login");
    assert_eq!(token.access_token, "tok");

    let req = stub.last_request().expect("request recorded");
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.bearer, None);
    assert_eq!(
        req.body,
        Body::Form(vec![
            ("username".to_string(), "fan@example.com".to_string()),
            ("password".to_string(), "hunter2".to_string()),
        ])
    );
}

#[test]
fn login_with_empty_token_is_a_decode_error() {
    let (stub, api) = stub_api();
    stub.reply(Method::Post, "/auth/login", 200, r#"{"access_token":""}"#);
    let err = api
        .login(&Credentials::new("fan@example.com", "pw"))
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn register_sends_json_body() {
    let (stub, api) = stub_api();
    stub.reply(Method::Post, "/auth/register", 200, &read_fixture("me.json"));

    let user = api
        .register(&RegisterRequest {
            username: "courtside".to_string(),
            email: "fan@example.com".to_string(),
            password: "pw".to_string(),
        })
        .expect("register");
    assert_eq!(user.email, "fan@example.com");

    let req = stub.last_request().expect("request recorded");
    assert_eq!(
        req.body,
        Body::Json(serde_json::json!({
            "username": "courtside",
            "email": "fan@example.com",
            "password": "pw"
        }))
    );
}

#[test]
fn auth_only_endpoint_without_token_surfaces_backend_401() {
    let (stub, api) = stub_api();
    stub.reply(
        Method::Get,
        "/users/me",
        401,
        r#"{"detail":"Not authenticated"}"#,
    );

    let err = api.me(&Session::anonymous()).unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 401,
            detail: "Not authenticated".to_string()
        }
    );
    assert!(err.is_unauthorized());
    assert_eq!(stub.request_count(), 1);
}

#[test]
fn validation_errors_join_messages() {
    let (stub, api) = stub_api();
    stub.reply(
        Method::Post,
        "/auth/register",
        422,
        &read_fixture("validation_error.json"),
    );

    let err = api
        .register(&RegisterRequest {
            username: "x".to_string(),
            email: "nope".to_string(),
            password: "pw".to_string(),
        })
        .unwrap_err();
    assert_eq!(err.user_message(), "value is not a valid email address");
}

#[test]
fn network_failure_and_bad_payload_are_distinguished() {
    let (stub, api) = stub_api();
    let session = Session::anonymous();
    stub.fail(Method::Get, "/games", "connection refused");
    stub.reply(Method::Get, "/games/recent", 200, r#"{"not":"a list"}"#);

    assert!(matches!(
        api.games(&session, Some("2024-03-10")),
        Err(ApiError::Network(_))
    ));
    assert!(matches!(
        api.recent_games(&session),
        Err(ApiError::Decode(_))
    ));
}

#[test]
fn games_date_and_highlights_paths() {
    let (stub, api) = stub_api();
    let session = Session::anonymous();
    stub.reply(Method::Get, "/games", 200, &read_fixture("games.json"));
    stub.reply(
        Method::Get,
        "/games/101/highlights",
        200,
        r#"{"highlight_video_link":"https://video.example/101"}"#,
    );

    let games = api.games(&session, Some("2024-03-10")).expect("games");
    assert_eq!(games.len(), 3);
    assert_eq!(
        stub.last_request().and_then(|r| r.query_value("date").map(str::to_string)),
        Some("2024-03-10".to_string())
    );

    let h = api.highlights(&session, "101").expect("highlights");
    assert_eq!(h.highlight_video_link, "https://video.example/101");
}

#[test]
fn analytics_paths() {
    let (stub, api) = stub_api();
    let session = Session::anonymous();
    stub.reply(
        Method::Get,
        "/analytics/teams/head-to-head/3/4",
        200,
        &read_fixture("head_to_head.json"),
    );
    stub.reply(
        Method::Get,
        "/analytics/teams/performance/3",
        200,
        &read_fixture("performance.json"),
    );

    let h2h = api.head_to_head(&session, "3", "4").expect("h2h");
    assert_eq!(h2h.total_games, 3);
    let perf = api.team_performance(&session, "3").expect("performance");
    assert_eq!(perf.len(), 2);
}

#[test]
fn favorites_use_kind_segment_and_token() {
    let (stub, api) = stub_api();
    let session = Session::with_token("tok");
    stub.reply(Method::Post, "/users/me/favorites/teams/3", 200, "{}");
    stub.reply(Method::Delete, "/users/me/favorites/players/23", 200, "");

    api.add_favorite(&session, FavoriteKind::Teams, "3")
        .expect("add favorite");
    api.remove_favorite(&session, FavoriteKind::Players, "23")
        .expect("remove favorite");

    let reqs = stub.requests();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[0].method, Method::Post);
    assert_eq!(reqs[1].method, Method::Delete);
    assert!(reqs.iter().all(|r| r.authorization().as_deref() == Some("Bearer tok")));
}

#[test]
fn profile_update_sends_only_set_fields() {
    let (stub, api) = stub_api();
    stub.reply(Method::Put, "/users/me", 200, &read_fixture("me.json"));

    let update = ProfileUpdate {
        username: Some("courtside".to_string()),
        ..ProfileUpdate::default()
    };
    api.update_me(&Session::with_token("tok"), &update)
        .expect("update");
    let req = stub.last_request().expect("request recorded");
    assert_eq!(
        req.body,
        Body::Json(serde_json::json!({"username": "courtside"}))
    );
}

#[test]
fn unknown_route_is_a_404_status() {
    let (_stub, api) = stub_api();
    let err = api.team(&Session::anonymous(), "42").unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            detail: "Not Found".to_string()
        }
    );
}
