use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::logger::{TrafficLog, TrafficLogMode};
use crate::protocol::{
    self, eolia_date, login_body, session_from_set_cookie, DATE_HEADER, DEFAULT_ACCEPT_LANGUAGE,
    DEFAULT_BASE_URL, DEFAULT_TERMINAL_TYPE, DEFAULT_USER_AGENT, LOGIN_PATH, endpoint_url,
};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether the transport holds a session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated(SessionCookie),
}

/// Opaque session cookie. Only the transport can read it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie(String);

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("..")
    }
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    fn cookie(&self) -> Option<&str> {
        match self {
            Session::Authenticated(cookie) => Some(&cookie.0),
            Session::Unauthenticated => None,
        }
    }
}

/// Settings for a [`Transport`]. Every field has a working default except
/// the credentials, which are only needed for automatic re-authentication.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub user_agent: String,
    pub accept_language: String,
    pub user_id: Option<String>,
    pub password: Option<SecretString>,
    /// Session cookie from an earlier run (`atkn=...`).
    pub session: Option<String>,
    pub timeout: Duration,
    pub traffic_log: Option<(TrafficLogMode, PathBuf)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            user_id: None,
            password: None,
            session: None,
            timeout: DEFAULT_TIMEOUT,
            traffic_log: None,
        }
    }
}

/// Status and raw body text of one reply.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: String,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decodes the body; an empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let text = if self.body.trim().is_empty() { "null" } else { self.body.as_str() };
        serde_json::from_str(text).map_err(|e| {
            Error::Protocol(format!("unexpected response body (HTTP {}): {e}", self.status))
        })
    }

    fn into_result(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status.as_u16(),
                body: self.body,
            })
        }
    }
}

/// HTTP transport that owns the session cookie.
///
/// Adds the service's required headers to every call, picks up a renewed
/// cookie from any `Set-Cookie` response header, and on 401 (or 400 with no
/// session yet) logs in with the configured credentials and retries the
/// call once.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    accept_language: String,
    user_id: Option<String>,
    password: Option<SecretString>,
    session: Session,
    logger: Option<TrafficLog>,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::InvalidArgument(format!("invalid base URL {:?}: {e}", config.base_url))
        })?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;

        let logger = match config.traffic_log {
            Some((mode, path)) => Some(TrafficLog::new(mode, path)?),
            None => None,
        };

        let session = match config.session {
            Some(token) if !token.is_empty() => Session::Authenticated(SessionCookie(token)),
            _ => Session::Unauthenticated,
        };

        Ok(Self {
            http,
            base_url,
            accept_language: config.accept_language,
            user_id: config.user_id,
            password: config.password,
            session,
            logger,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Sends one request, re-authenticating and retrying once if the
    /// service rejects the session.
    ///
    /// `path` is a list of raw segments appended to the base URL's path.
    pub async fn request(
        &mut self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
    ) -> Result<Response> {
        let resp = self.send(method.clone(), path, body).await?;
        if resp.status.is_success() {
            return Ok(resp);
        }

        if !self.should_reauthenticate(resp.status) {
            return resp.into_result();
        }

        let Some(login) = self.reauth_body() else {
            warn!(status = %resp.status, ?path, "session rejected and no credentials configured");
            return resp.into_result();
        };

        debug!(status = %resp.status, ?path, "session rejected, logging in again");
        self.send(Method::POST, LOGIN_PATH, Some(&login))
            .await?
            .into_result()?;

        self.send(method, path, body).await?.into_result()
    }

    pub async fn get(&mut self, path: &[&str]) -> Result<Response> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &[&str], body: Option<&Value>) -> Result<Response> {
        self.request(Method::POST, path, body).await
    }

    pub async fn put(&mut self, path: &[&str], body: &Value) -> Result<Response> {
        self.request(Method::PUT, path, Some(body)).await
    }

    fn should_reauthenticate(&self, status: StatusCode) -> bool {
        status == StatusCode::UNAUTHORIZED
            || (status == StatusCode::BAD_REQUEST && !self.session.is_authenticated())
    }

    fn reauth_body(&self) -> Option<Value> {
        let id = self.user_id.as_deref()?;
        let pass = self.password.as_ref()?;
        Some(login_body(id, pass.expose_secret(), DEFAULT_TERMINAL_TYPE, true))
    }

    /// One round-trip with no retry. Non-success statuses come back as
    /// `Ok` so the caller can decide what to do with them.
    async fn send(&mut self, method: Method, path: &[&str], body: Option<&Value>) -> Result<Response> {
        let url = endpoint_url(&self.base_url, path)?;

        let date = eolia_date(&Local::now());
        debug!(%method, %url, "eolia request");
        trace!(date = %date, session = ?self.session, "request headers");

        if let Some(ref mut logger) = self.logger {
            logger.log_request(method.as_str(), url.path(), body);
        }

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, protocol::CONTENT_TYPE)
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .header(DATE_HEADER, date);
        if let Some(cookie) = self.session.cookie() {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();

        if let Some(token) = resp
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(session_from_set_cookie)
        {
            debug!("session cookie renewed");
            self.session = Session::Authenticated(SessionCookie(token));
        }

        let text = resp.text().await?;
        trace!(%status, len = text.len(), "eolia response");

        if let Some(ref mut logger) = self.logger {
            let logged = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()))
            };
            logger.log_response(method.as_str(), url.path(), status.as_u16(), &logged);
        }

        Ok(Response { status, body: text })
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("user_id", &self.user_id)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
