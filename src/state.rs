use std::collections::VecDeque;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::error::ApiError;
use crate::fetch::{Fetch, Outcome, Ticket};
use crate::forms::Form;
use crate::models::{RegisterRequest, UserProfile};
use crate::session::{Credentials, Session, SessionStore};
use crate::toast::Toasts;
use crate::views::{
    AnalyticsView, GamesView, HomeView, PlayersView, ProfileView, TeamsView, favorite_added,
};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Teams,
    Players,
    Games,
    Analytics,
    Profile,
    Login,
    Register,
}

impl Screen {
    pub const TABS: [Screen; 6] = [
        Screen::Home,
        Screen::Teams,
        Screen::Players,
        Screen::Games,
        Screen::Analytics,
        Screen::Profile,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Teams => "Teams",
            Screen::Players => "Players",
            Screen::Games => "Games",
            Screen::Analytics => "Analytics",
            Screen::Profile => "Profile",
            Screen::Login => "Login",
            Screen::Register => "Register",
        }
    }
}

/// Work for the background worker. Every fetch carries the session it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch { fetch: Fetch, session: Session },
    Login(Credentials),
    Register(RegisterRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Fetched { ticket: Ticket, outcome: Outcome },
    LoggedIn {
        token: String,
        user: Option<UserProfile>,
    },
    LoginFailed,
    Registered { ok: bool },
}

pub struct AppState {
    pub screen: Screen,
    pub session: SessionStore,
    pub toasts: Toasts,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub today: NaiveDate,
    pub home: HomeView,
    pub teams: TeamsView,
    pub players: PlayersView,
    pub games: GamesView,
    pub analytics: AnalyticsView,
    pub profile: ProfileView,
    pub login_form: Form,
    pub register_form: Form,
    pub auth_pending: bool,
}

impl AppState {
    pub fn new(session: SessionStore, toast_duration: Duration) -> Self {
        Self::with_today(session, toast_duration, Local::now().date_naive())
    }

    pub fn with_today(session: SessionStore, toast_duration: Duration, today: NaiveDate) -> Self {
        Self {
            screen: Screen::Home,
            session,
            toasts: Toasts::new(toast_duration),
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            today,
            home: HomeView::default(),
            teams: TeamsView::default(),
            players: PlayersView::default(),
            games: GamesView::new(today),
            analytics: AnalyticsView::default(),
            profile: ProfileView::default(),
            login_form: Form::login(),
            register_form: Form::register(),
            auth_pending: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Reports a failed profile lookup for a session restored at startup.
    pub fn note_restore_failure(&mut self, err: &ApiError) {
        self.push_log(format!("[WARN] Could not load profile: {}", err.user_message()));
        if err.is_unauthorized() {
            self.toasts.warning("Session expired, please login again");
        }
    }

    pub fn command(&self, fetch: Fetch) -> Command {
        Command::Fetch {
            fetch,
            session: self.session.session().clone(),
        }
    }

    /// Switches screen and reloads its data; pages always show fresh results on entry.
    pub fn open(&mut self, screen: Screen) -> Option<Command> {
        self.screen = screen;
        self.help_overlay = false;
        self.refresh_current()
    }

    pub fn refresh_current(&mut self) -> Option<Command> {
        let fetch = match self.screen {
            Screen::Home => Some(self.home.refresh(self.today)),
            Screen::Teams => Some(self.teams.refresh()),
            Screen::Players => Some(self.players.refresh()),
            Screen::Games => Some(self.games.refresh()),
            Screen::Profile => self.profile.refresh(self.session.session(), &mut self.toasts),
            Screen::Analytics | Screen::Login | Screen::Register => None,
        };
        fetch.map(|f| self.command(f))
    }

    pub fn submit_login(&mut self) -> Option<Command> {
        if self.auth_pending {
            return None;
        }
        if let Some(label) = self.login_form.missing_field() {
            self.toasts.warning(format!("{label} is required"));
            return None;
        }
        self.auth_pending = true;
        let credentials = Credentials::new(
            self.login_form.value(0).trim(),
            self.login_form.value(1),
        );
        self.login_form.clear_masked();
        Some(Command::Login(credentials))
    }

    pub fn submit_register(&mut self) -> Option<Command> {
        if self.auth_pending {
            return None;
        }
        if let Some(label) = self.register_form.missing_field() {
            self.toasts.warning(format!("{label} is required"));
            return None;
        }
        self.auth_pending = true;
        let request = RegisterRequest {
            username: self.register_form.value(0).trim().to_string(),
            email: self.register_form.value(1).trim().to_string(),
            password: self.register_form.value(2).to_string(),
        };
        self.register_form.clear_masked();
        Some(Command::Register(request))
    }

    /// Signs out and lands on Home. Storage trouble is reported but never blocks it.
    pub fn logout(&mut self) -> Option<Command> {
        if !self.session.session().is_authenticated() {
            return None;
        }
        match self.session.logout() {
            Ok(()) => self.push_log("[INFO] Signed out"),
            Err(err) => self.push_log(format!("[WARN] Signed out, token file kept: {err}")),
        }
        self.profile.clear();
        self.toasts.success("Logged out successfully");
        self.open(Screen::Home)
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) -> Option<Command> {
    match delta {
        Delta::Fetched { ticket, outcome } => {
            apply_outcome(state, ticket, outcome);
            None
        }
        Delta::LoggedIn { token, user } => {
            state.auth_pending = false;
            state.session.establish(token, user);
            state.login_form.clear();
            let who = state.session.session().display_name().unwrap_or_default();
            state.push_log(format!("[INFO] Logged in as {who}"));
            state.toasts.success("Logged in successfully");
            state.open(Screen::Home)
        }
        Delta::LoginFailed => {
            state.auth_pending = false;
            state.push_log("[WARN] Login failed");
            state.toasts.error("Invalid email or password");
            None
        }
        Delta::Registered { ok } => {
            state.auth_pending = false;
            if ok {
                let email = state.register_form.value(1).trim().to_string();
                state.register_form.clear();
                state.login_form.clear();
                state.login_form.set_value(0, email);
                state.login_form.focus = 1;
                state.push_log("[INFO] Account registered");
                state
                    .toasts
                    .info("Registration successful", "Please login with your credentials");
                state.open(Screen::Login)
            } else {
                state.push_log("[WARN] Registration failed");
                state.toasts.error("Registration failed");
                None
            }
        }
    }
}

fn apply_outcome(state: &mut AppState, ticket: Ticket, outcome: Outcome) {
    let toasts = &mut state.toasts;
    match outcome {
        Outcome::Home(result) => {
            state.home.apply(ticket, result, toasts);
        }
        Outcome::Standings(result) => {
            state.teams.apply(ticket, result, toasts);
        }
        Outcome::Players(result) => {
            state.players.apply(ticket, result, toasts);
        }
        Outcome::Games(result) => {
            state.games.apply(ticket, result, toasts);
        }
        Outcome::Highlights { game_id, result } => {
            state.games.apply_highlights(game_id, result, toasts);
        }
        Outcome::HeadToHead(result) => {
            state.analytics.apply_head_to_head(ticket, result, toasts);
        }
        Outcome::TeamPerformance(result) => {
            state.analytics.apply_performance(ticket, result, toasts);
        }
        Outcome::Profile(result) => {
            if let Ok(data) = &result {
                state.session.set_user(data.user.clone());
            }
            state.profile.apply(ticket, result, toasts);
        }
        Outcome::FavoriteAdded { kind, id, result } => {
            favorite_added(kind, &result, toasts);
            if result.is_ok() {
                state.push_log(format!("[INFO] Added {} {id} to favorites", kind.as_segment()));
            }
        }
        Outcome::FavoriteRemoved { kind, id, result } => {
            state.profile.apply_removed(kind, &id, &result, toasts);
        }
        Outcome::ProfileUpdated(result) => {
            state.profile.apply_update(&result, toasts);
            if let Ok(user) = result {
                state.session.set_user(user);
            }
        }
    }
}
