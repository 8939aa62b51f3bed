use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;

use crate::error::ApiError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide blocking client. The timeout of the first caller wins.
pub fn http_client(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// One outbound call, described independently of the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            bearer: None,
            body: Body::Empty,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::Get, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::Post, segments)
    }

    pub fn put(segments: &[&str]) -> Self {
        Self::new(Method::Put, segments)
    }

    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::Delete, segments)
    }

    /// Adds `key=value` unless the value is missing or blank. The value is sent as given.
    pub fn query_opt(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(|t| t.to_string());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = Body::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// `/a/b/c`, unescaped.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|t| format!("Bearer {t}"))
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport: Send {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError>;
}

impl<T: Transport + Sync + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        (**self).send(request)
    }
}

/// reqwest-backed transport against a base url such as `http://localhost:8000`.
pub struct HttpTransport {
    base_url: Url,
    client: &'static Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid api url {base_url:?}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("api url {base_url} cannot carry a path");
        }
        Ok(Self {
            base_url,
            client: http_client(timeout)?,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&request.segments);
        }
        url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut req = self
            .client
            .request(method, self.url_for(request))
            .header(USER_AGENT, concat!("hoops_terminal/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json");
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(token) = request.bearer.as_deref() {
            req = req.bearer_auth(token);
        }
        req = match &request.body {
            Body::Empty => req,
            Body::Json(value) => req.json(value),
            Body::Form(fields) => req.form(fields),
        };

        let resp = req.send().map_err(|err| ApiError::Network(err.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|err| ApiError::Network(format!("failed reading body: {err}")))?;
        Ok(RawResponse { status, body })
    }
}

/// In-memory transport with canned replies per `METHOD /path`. Records every request.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<Vec<StubRoute>>,
    requests: Mutex<Vec<ApiRequest>>,
}

struct StubRoute {
    method: Method,
    path: String,
    reply: Result<RawResponse, ApiError>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations for the same route replace earlier ones.
    pub fn reply(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.route(
            method,
            path,
            Ok(RawResponse {
                status,
                body: body.to_string(),
            }),
        )
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.route(method, path, Err(ApiError::Network(message.to_string())))
    }

    fn route(&self, method: Method, path: &str, reply: Result<RawResponse, ApiError>) -> &Self {
        let mut routes = self.routes.lock().expect("stub routes lock poisoned");
        routes.retain(|r| !(r.method == method && r.path == path));
        routes.push(StubRoute {
            method,
            path: path.to_string(),
            reply,
        });
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .expect("stub requests lock poisoned")
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .expect("stub requests lock poisoned")
            .len()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests
            .lock()
            .expect("stub requests lock poisoned")
            .last()
            .cloned()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        self.requests
            .lock()
            .expect("stub requests lock poisoned")
            .push(request.clone());
        let path = request.path();
        let routes = self.routes.lock().expect("stub routes lock poisoned");
        match routes
            .iter()
            .find(|r| r.method == request.method && r.path == path)
        {
            Some(route) => route.reply.clone(),
            None => Ok(RawResponse {
                status: 404,
                body: r#"{"detail":"Not Found"}"#.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_values_are_omitted() {
        let req = ApiRequest::get(&["teams", "standings"])
            .query_opt("conference", Some(""))
            .query_opt("date", None);
        assert!(req.query.is_empty());
        assert_eq!(req.path(), "/teams/standings");
    }

    #[test]
    fn url_keeps_base_path_and_escapes_segments() {
        let transport =
            HttpTransport::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        let req = ApiRequest::get(&["teams", "a b"]);
        assert_eq!(
            transport.url_for(&req).as_str(),
            "http://localhost:8000/api/teams/a%20b"
        );
    }

    #[test]
    fn unknown_route_is_404() {
        let stub = StubTransport::new();
        let resp = stub.send(&ApiRequest::get(&["nope"])).unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(stub.request_count(), 1);
    }
}
