use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use chrono::NaiveDate;

use hoops_terminal::api::Api;
use hoops_terminal::fetch::{Outcome, Query, Ticket};
use hoops_terminal::http_client::{Method, StubTransport};
use hoops_terminal::models::UserProfile;
use hoops_terminal::session::SessionStore;
use hoops_terminal::state::{AppState, Command, Delta, Screen, apply_delta};
use hoops_terminal::toast::ToastStatus;
use hoops_terminal::token_store::MemoryTokenStore;
use hoops_terminal::worker::spawn_worker;

fn state_with(store: MemoryTokenStore) -> AppState {
    AppState::with_today(
        SessionStore::rehydrate(store),
        Duration::from_millis(3000),
        NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date"),
    )
}

fn user(name: &str) -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        username: name.to_string(),
        email: format!("{name}@example.com"),
        favorite_teams: Vec::new(),
        favorite_players: Vec::new(),
        notifications: Vec::new(),
    }
}

fn type_into(state: &mut AppState, screen: Screen, values: &[&str]) {
    let form = match screen {
        Screen::Login => &mut state.login_form,
        _ => &mut state.register_form,
    };
    for (idx, value) in values.iter().enumerate() {
        form.set_value(idx, *value);
    }
}

#[test]
fn submit_login_requires_every_field() {
    let mut state = state_with(MemoryTokenStore::default());
    state.open(Screen::Login);
    type_into(&mut state, Screen::Login, &["fan@example.com"]);

    assert!(state.submit_login().is_none());
    assert!(!state.auth_pending);
    assert_eq!(
        state.toasts.latest().map(|t| t.description.as_str()),
        Some("Password is required")
    );
}

#[test]
fn submit_login_clears_password_and_blocks_double_submit() {
    let mut state = state_with(MemoryTokenStore::default());
    state.open(Screen::Login);
    type_into(&mut state, Screen::Login, &["  fan@example.com ", "pw"]);

    let cmd = state.submit_login().expect("login command");
    match cmd {
        Command::Login(creds) => {
            assert_eq!(creds.email, "fan@example.com");
            assert_eq!(creds.password, "pw");
        }
        other => panic!("unexpected command {other:?}"),
    }
    assert!(state.auth_pending);
    assert_eq!(state.login_form.value(1), "");
    assert!(state.submit_login().is_none());
}

#[test]
fn logged_in_establishes_session_and_goes_home() {
    let mut state = state_with(MemoryTokenStore::default());
    state.open(Screen::Login);
    state.auth_pending = true;

    let follow_up = apply_delta(
        &mut state,
        Delta::LoggedIn {
            token: "tok".to_string(),
            user: Some(user("courtside")),
        },
    );

    assert!(!state.auth_pending);
    assert_eq!(state.screen, Screen::Home);
    assert_eq!(state.session.current_token(), Some("tok"));
    assert_eq!(
        state.toasts.latest().map(|t| (t.status, t.description.as_str())),
        Some((ToastStatus::Success, "Logged in successfully"))
    );
    match follow_up {
        Some(Command::Fetch { fetch, session }) => {
            assert!(matches!(fetch.query, Query::Home { .. }));
            assert_eq!(session.current_token(), Some("tok"));
        }
        other => panic!("expected home refresh, got {other:?}"),
    }
    assert!(state.logs.back().is_some_and(|l| l.contains("courtside")));
}

#[test]
fn login_failure_keeps_user_on_login_screen() {
    let mut state = state_with(MemoryTokenStore::default());
    state.open(Screen::Login);
    state.auth_pending = true;

    assert!(apply_delta(&mut state, Delta::LoginFailed).is_none());
    assert_eq!(state.screen, Screen::Login);
    assert!(!state.auth_pending);
    assert!(!state.session.session().is_authenticated());
    assert_eq!(state.toasts.count(ToastStatus::Error), 1);
}

#[test]
fn registration_success_moves_to_login_with_email_filled() {
    let mut state = state_with(MemoryTokenStore::default());
    state.open(Screen::Register);
    type_into(&mut state, Screen::Register, &["newfan", "new@example.com", "pw"]);
    let cmd = state.submit_register().expect("register command");
    assert!(matches!(cmd, Command::Register(ref r) if r.username == "newfan"));

    assert!(apply_delta(&mut state, Delta::Registered { ok: true }).is_none());
    assert_eq!(state.screen, Screen::Login);
    assert_eq!(state.login_form.value(0), "new@example.com");
    assert_eq!(state.login_form.focus, 1);
    let toast = state.toasts.latest().expect("toast");
    assert_eq!(toast.title, "Registration successful");
    assert_eq!(toast.description, "Please login with your credentials");
}

#[test]
fn registration_failure_stays_put() {
    let mut state = state_with(MemoryTokenStore::default());
    state.open(Screen::Register);
    state.auth_pending = true;

    assert!(apply_delta(&mut state, Delta::Registered { ok: false }).is_none());
    assert_eq!(state.screen, Screen::Register);
    assert_eq!(state.toasts.count(ToastStatus::Error), 1);
}

#[test]
fn logout_clears_session_and_reloads_home() {
    let mut state = state_with(MemoryTokenStore::with_token("tok"));
    state.session.set_user(user("courtside"));
    state.screen = Screen::Profile;

    let cmd = state.logout();
    assert!(!state.session.session().is_authenticated());
    assert!(state.session.session().user().is_none());
    assert!(state.profile.data().is_none());
    assert_eq!(state.screen, Screen::Home);
    match cmd {
        Some(Command::Fetch { session, .. }) => assert_eq!(session.current_token(), None),
        other => panic!("expected home refresh, got {other:?}"),
    }

    assert!(state.logout().is_none());
}

#[test]
fn opening_a_screen_always_refetches() {
    let mut state = state_with(MemoryTokenStore::default());
    let first = state.open(Screen::Teams);
    let second = state.open(Screen::Teams);
    let tickets = [first, second].map(|cmd| match cmd {
        Some(Command::Fetch { fetch, .. }) => fetch.ticket,
        other => panic!("expected fetch, got {other:?}"),
    });
    assert!(tickets[1] > tickets[0]);
    assert!(state.open(Screen::Analytics).is_none());
}

#[test]
fn console_log_is_bounded() {
    let mut state = state_with(MemoryTokenStore::default());
    for i in 0..250 {
        state.push_log(format!("[INFO] line {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] line 50"));
}

#[test]
fn rejected_saved_token_signs_out_with_a_warning() {
    let stub = Arc::new(StubTransport::new());
    stub.reply(Method::Get, "/users/me", 401, r#"{"detail":"Could not validate credentials"}"#);
    let api = Api::new(stub.clone());
    let mut session = SessionStore::rehydrate(MemoryTokenStore::with_token("expired"));

    let err = session.refresh_user(&api).expect_err("token is rejected");
    assert!(!session.session().is_authenticated());

    let mut state = AppState::with_today(
        session,
        Duration::from_millis(3000),
        NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date"),
    );
    state.note_restore_failure(&err);
    assert_eq!(
        state.toasts.latest().map(|t| (t.status, t.description.as_str())),
        Some((ToastStatus::Warning, "Session expired, please login again"))
    );
    assert!(state.logs.back().is_some_and(|l| l.contains("Could not validate credentials")));
}

#[test]
fn unreachable_backend_keeps_saved_token_quietly() {
    let stub = Arc::new(StubTransport::new());
    stub.fail(Method::Get, "/users/me", "connection refused");
    let api = Api::new(stub.clone());
    let mut session = SessionStore::rehydrate(MemoryTokenStore::with_token("saved"));

    let err = session.refresh_user(&api).expect_err("backend is down");
    assert_eq!(session.current_token(), Some("saved"));

    let mut state = AppState::with_today(
        session,
        Duration::from_millis(3000),
        NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date"),
    );
    state.note_restore_failure(&err);
    assert!(state.toasts.is_empty());
    assert!(state.logs.back().is_some_and(|l| l.contains("Could not reach the server")));
}

#[test]
fn untracked_outcome_for_idle_view_is_ignored() {
    let mut state = state_with(MemoryTokenStore::default());
    apply_delta(
        &mut state,
        Delta::Fetched {
            ticket: Ticket::UNTRACKED,
            outcome: Outcome::Standings(Ok(Vec::new())),
        },
    );
    assert!(state.teams.all().is_empty());
    assert!(state.toasts.is_empty());
}

#[test]
fn worker_answers_commands_in_order() {
    let stub = Arc::new(StubTransport::new());
    stub.reply(Method::Post, "/auth/login", 401, r#"{"detail":"Incorrect email or password"}"#);
    stub.reply(Method::Get, "/teams/standings", 200, "[]");
    let api = Api::new(stub.clone());

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let handle = spawn_worker(api, tx, cmd_rx);

    let mut state = state_with(MemoryTokenStore::default());
    type_into(&mut state, Screen::Login, &["fan@example.com", "bad"]);
    let login = state.submit_login().expect("login command");
    let teams = state.open(Screen::Teams).expect("teams command");
    cmd_tx.send(login).expect("send login");
    cmd_tx.send(teams).expect("send teams");
    drop(cmd_tx);

    let first = rx.recv_timeout(Duration::from_secs(5)).expect("login reply");
    let second = rx.recv_timeout(Duration::from_secs(5)).expect("teams reply");
    assert_eq!(first, Delta::LoginFailed);
    assert!(matches!(
        second,
        Delta::Fetched {
            outcome: Outcome::Standings(Ok(_)),
            ..
        }
    ));
    handle.join().expect("worker exits when commands stop");
}
