use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::http_client::{ApiRequest, HttpTransport, Transport};
use crate::models::{
    AccessToken, FavoriteKind, Game, HeadToHead, Highlights, Notification, PerformanceGame,
    Player, ProfileUpdate, RegisterRequest, Team, UserProfile,
};
use crate::session::{Credentials, Session};

/// Typed access to the backend. Every call that can carry auth takes the session explicitly.
pub struct Api {
    transport: Box<dyn Transport>,
}

impl Api {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.api_url, config.http_timeout)?;
        Ok(Self::new(transport))
    }

    /// OAuth2 password form: the email goes in `username`.
    pub fn login(&self, credentials: &Credentials) -> ApiResult<AccessToken> {
        let req = ApiRequest::post(&["auth", "login"]).form(&[
            ("username", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
        ]);
        let token: AccessToken = self.call(req)?;
        if token.access_token.trim().is_empty() {
            return Err(ApiError::Decode("empty access_token".to_string()));
        }
        Ok(token)
    }

    pub fn register(&self, request: &RegisterRequest) -> ApiResult<UserProfile> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.call(ApiRequest::post(&["auth", "register"]).json(body))
    }

    pub fn me(&self, session: &Session) -> ApiResult<UserProfile> {
        self.call(authed(ApiRequest::get(&["users", "me"]), session))
    }

    pub fn update_me(&self, session: &Session, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        let body = serde_json::to_value(update).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.call(authed(ApiRequest::put(&["users", "me"]), session).json(body))
    }

    pub fn standings(&self, session: &Session, conference: Option<&str>) -> ApiResult<Vec<Team>> {
        let req = ApiRequest::get(&["teams", "standings"]).query_opt("conference", conference);
        self.call(authed(req, session))
    }

    pub fn team(&self, session: &Session, team_id: &str) -> ApiResult<Team> {
        self.call(authed(ApiRequest::get(&["teams", team_id]), session))
    }

    pub fn players(&self, session: &Session, position: Option<&str>) -> ApiResult<Vec<Player>> {
        let req = ApiRequest::get(&["players"]).query_opt("position", position);
        self.call(authed(req, session))
    }

    pub fn games(&self, session: &Session, date: Option<&str>) -> ApiResult<Vec<Game>> {
        let req = ApiRequest::get(&["games"]).query_opt("date", date);
        self.call(authed(req, session))
    }

    pub fn recent_games(&self, session: &Session) -> ApiResult<Vec<Game>> {
        self.call(authed(ApiRequest::get(&["games", "recent"]), session))
    }

    pub fn highlights(&self, session: &Session, game_id: &str) -> ApiResult<Highlights> {
        self.call(authed(
            ApiRequest::get(&["games", game_id, "highlights"]),
            session,
        ))
    }

    pub fn head_to_head(
        &self,
        session: &Session,
        team1_id: &str,
        team2_id: &str,
    ) -> ApiResult<HeadToHead> {
        let req = ApiRequest::get(&["analytics", "teams", "head-to-head", team1_id, team2_id]);
        self.call(authed(req, session))
    }

    pub fn team_performance(
        &self,
        session: &Session,
        team_id: &str,
    ) -> ApiResult<Vec<PerformanceGame>> {
        let req = ApiRequest::get(&["analytics", "teams", "performance", team_id]);
        self.call(authed(req, session))
    }

    pub fn add_favorite(&self, session: &Session, kind: FavoriteKind, id: &str) -> ApiResult<()> {
        let req = ApiRequest::post(&["users", "me", "favorites", kind.as_segment(), id]);
        self.call_unit(authed(req, session))
    }

    pub fn remove_favorite(
        &self,
        session: &Session,
        kind: FavoriteKind,
        id: &str,
    ) -> ApiResult<()> {
        let req = ApiRequest::delete(&["users", "me", "favorites", kind.as_segment(), id]);
        self.call_unit(authed(req, session))
    }

    pub fn notifications(&self, session: &Session) -> ApiResult<Vec<Notification>> {
        self.call(authed(
            ApiRequest::get(&["users", "me", "notifications"]),
            session,
        ))
    }

    fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let body = self.exchange(&request)?;
        serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(path = %request.path(), error = %err, "malformed response body");
            ApiError::Decode(err.to_string())
        })
    }

    fn call_unit(&self, request: ApiRequest) -> ApiResult<()> {
        self.exchange(&request).map(|_| ())
    }

    fn exchange(&self, request: &ApiRequest) -> ApiResult<String> {
        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path(),
            authed = request.bearer.is_some(),
            "api request"
        );
        let resp = self.transport.send(request).inspect_err(|err| {
            tracing::warn!(path = %request.path(), error = %err, "api request failed");
        })?;
        if !resp.is_success() {
            let detail = error_detail(&resp.body);
            tracing::warn!(
                path = %request.path(),
                status = resp.status,
                %detail,
                "api error status"
            );
            return Err(ApiError::Status {
                status: resp.status,
                detail,
            });
        }
        Ok(resp.body)
    }
}

fn authed(request: ApiRequest, session: &Session) -> ApiRequest {
    request.bearer(session.current_token())
}

/// FastAPI puts a string (or a validation list) under `detail`.
fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().chars().take(200).collect();
    };
    match value.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
