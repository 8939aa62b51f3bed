use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::api::Api;
use crate::error::{ApiResult, StoreError};
use crate::models::{RegisterRequest, UserProfile};
use crate::token_store::TokenStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Who is calling. Passed by reference into every API call; never read from ambient state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn current_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The `sub` claim of a JWT token, without verifying the signature.
    pub fn subject(&self) -> Option<String> {
        let token = self.token.as_deref()?;
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: Value = serde_json::from_slice(&bytes).ok()?;
        claims.get("sub")?.as_str().map(str::to_string)
    }

    pub fn display_name(&self) -> Option<String> {
        if let Some(user) = &self.user {
            return Some(user.username.clone());
        }
        if self.token.is_some() {
            return Some(self.subject().unwrap_or_else(|| "signed in".to_string()));
        }
        None
    }
}

/// Owns the live session and keeps the durable token in step with it.
pub struct SessionStore {
    session: Session,
    store: Box<dyn TokenStore>,
}

impl SessionStore {
    /// Reads a previously saved token. A broken store starts anonymous.
    pub fn rehydrate(store: impl TokenStore + 'static) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "could not read saved session, starting signed out");
                None
            }
        };
        if token.is_some() {
            tracing::info!("restored saved session");
        }
        Self {
            session: Session { token, user: None },
            store: Box::new(store),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_token(&self) -> Option<&str> {
        self.session.current_token()
    }

    /// One login request, then a best-effort profile fetch. `false` on any failure.
    pub fn login(&mut self, api: &Api, credentials: &Credentials) -> bool {
        match authenticate(api, credentials) {
            Some((token, user)) => {
                self.establish(token, user);
                true
            }
            None => false,
        }
    }

    pub fn register(
        &self,
        api: &Api,
        username: &str,
        email: &str,
        password: &str,
    ) -> bool {
        register_account(api, username, email, password)
    }

    /// Installs a freshly issued token. A storage failure keeps the in-memory session.
    pub fn establish(&mut self, token: String, user: Option<UserProfile>) {
        if let Err(err) = self.store.save(&token) {
            tracing::warn!(error = %err, "session token not persisted");
        }
        self.session = Session {
            token: Some(token),
            user,
        };
        tracing::info!(user = ?self.session.display_name(), "signed in");
    }

    pub fn set_user(&mut self, user: UserProfile) {
        if self.session.is_authenticated() {
            self.session.user = Some(user);
        }
    }

    /// Fills in the profile behind a rehydrated token. A token the backend
    /// no longer accepts (401/403) is dropped.
    pub fn refresh_user(&mut self, api: &Api) -> ApiResult<()> {
        match api.me(&self.session) {
            Ok(user) => {
                self.set_user(user);
                Ok(())
            }
            Err(err) => {
                if err.is_unauthorized() {
                    tracing::info!("saved token rejected");
                    let _ = self.logout();
                }
                Err(err)
            }
        }
    }

    /// Always signs out in memory; the storage result is reported separately.
    pub fn logout(&mut self) -> Result<(), StoreError> {
        self.session = Session::anonymous();
        tracing::info!("signed out");
        self.store.clear().inspect_err(|err| {
            tracing::warn!(error = %err, "saved session could not be removed");
        })
    }
}

/// Login exchange shared by the blocking store and the background worker.
pub fn authenticate(api: &Api, credentials: &Credentials) -> Option<(String, Option<UserProfile>)> {
    let token = match api.login(credentials) {
        Ok(token) => token.access_token,
        Err(err) => {
            tracing::info!(error = %err, "login rejected");
            return None;
        }
    };
    let user = match api.me(&Session::with_token(token.clone())) {
        Ok(user) => Some(user),
        Err(err) => {
            tracing::warn!(error = %err, "signed in but profile unavailable");
            None
        }
    };
    Some((token, user))
}

pub fn register_account(api: &Api, username: &str, email: &str, password: &str) -> bool {
    let request = RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    match api.register(&request) {
        Ok(user) => {
            tracing::info!(username = %user.username, "account registered");
            true
        }
        Err(err) => {
            tracing::info!(error = %err, "registration rejected");
            false
        }
    }
}
