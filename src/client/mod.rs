//! # API Facade
//!
//! [`Tidal`] is the entry point for catalog requests. It owns a
//! [`Transport`], optionally a [`Session`], and wraps every API call in a
//! small recovery loop:
//!
//! ```text
//! SENDING ──ok──────────────────────────────▶ SUCCESS
//!    │
//!    ├─ expired token + auto_refresh + session ─▶ REFRESHING ─▶ SENDING
//!    ├─ 429 + auto_retry ──────────────────────▶ WAITING ────▶ SENDING
//!    └─ anything else ─────────────────────────▶ error returned as is
//! ```
//!
//! ## Attempt Budget
//!
//! Each call may send at most [`ClientOptions::max_attempts`] requests. When
//! a recovery would be needed after the last allowed attempt the call fails
//! with [`ApiError::RetriesExhausted`], which wraps the last error. A
//! `retry-after` above [`ClientOptions::max_retry_after`] is not waited out
//! at all and fails with [`ApiError::RateLimitTooLong`].
//!
//! ## Authentication
//!
//! The bearer token comes from the session when one is set, otherwise from a
//! token set directly with [`Tidal::set_access_token`]. Setting one clears the
//! other.
//!
//! ## Endpoints
//!
//! The catalog methods in [`endpoints`] are generated from a table of
//! `(collection, relationship)` pairs and all end up in [`Tidal::get`].

pub mod endpoints;

use std::{fmt, sync::Arc, time::Duration};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{
    error::ApiError,
    session::Session,
    transport::{Method, Params, Response, Transport},
    types::Document,
};

pub use endpoints::Query;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_MAX_RETRY_AFTER: Duration = Duration::from_secs(120);
const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Behaviour switches of the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Refresh the session token and resend when the API reports it expired.
    pub auto_refresh: bool,
    /// Wait for `retry-after` and resend on HTTP 429.
    pub auto_retry: bool,
    /// Upper bound on requests sent for one call, the first one included.
    pub max_attempts: u32,
    /// Longest `retry-after` the client is willing to sleep through.
    pub max_retry_after: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            auto_retry: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_retry_after: DEFAULT_MAX_RETRY_AFTER,
        }
    }
}

/// Blocks the calling thread while waiting out a rate limit.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

enum Recovery {
    Refresh,
    Wait(Duration),
}

pub struct Tidal {
    transport: Transport,
    session: Option<Session>,
    access_token: Option<String>,
    options: ClientOptions,
    sleeper: Arc<dyn Sleeper>,
}

impl Tidal {
    pub fn new() -> Self {
        Self::with_transport(Transport::new())
    }

    pub fn with_transport(transport: Transport) -> Self {
        Self {
            transport,
            session: None,
            access_token: None,
            options: ClientOptions::default(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.set_session(session);
        self
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ClientOptions) {
        self.options = options;
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.options.auto_refresh = enabled;
    }

    pub fn set_auto_retry(&mut self, enabled: bool) {
        self.options.auto_retry = enabled;
    }

    pub fn set_max_attempts(&mut self, attempts: u32) {
        self.options.max_attempts = attempts.max(1);
    }

    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    /// Uses a bare bearer token and drops any session.
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.session = None;
        self.access_token = Some(access_token.into());
    }

    /// Uses `session` for bearer tokens and refreshes, dropping any bare token.
    pub fn set_session(&mut self, session: Session) {
        self.access_token = None;
        self.session = Some(session);
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Token attached to API requests, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        match &self.session {
            Some(session) => session.access_token(),
            None => self.access_token.as_deref(),
        }
    }

    /// Sends `method path` to the API host with automatic recovery.
    ///
    /// This is the loop described in the module documentation. The same
    /// request is replayed after a successful refresh or after waiting out a
    /// rate limit, as long as the attempt budget allows.
    pub fn send(
        &mut self,
        method: impl Into<Method>,
        path: &str,
        params: &Params,
    ) -> Result<Response, ApiError> {
        let method = method.into();
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let headers = self.auth_headers();

            let err = match self.transport.api(method.clone(), path, params, &headers) {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            let Some(recovery) = self.recovery_for(&err) else {
                return Err(err);
            };

            if let Recovery::Wait(delay) = recovery {
                if delay > self.options.max_retry_after {
                    warn!(
                        retry_after = delay.as_secs(),
                        "retry-after exceeds the configured maximum"
                    );
                    return Err(ApiError::RateLimitTooLong {
                        retry_after: delay,
                        source: Box::new(err),
                    });
                }
            }

            if attempt >= max_attempts {
                warn!(attempts = attempt, %path, "giving up on request");
                return Err(ApiError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            match recovery {
                Recovery::Refresh => {
                    info!(%path, "access token expired, refreshing");
                    let refreshed = match self.session.as_mut() {
                        Some(session) => session.refresh_access_token(None)?,
                        None => false,
                    };
                    if !refreshed {
                        return Err(ApiError::RefreshFailed);
                    }
                }
                Recovery::Wait(delay) => {
                    warn!(retry_after = delay.as_secs(), %path, "rate limited, waiting");
                    self.sleeper.sleep(delay);
                }
            }

            debug!(attempt = attempt + 1, %path, "resending request");
        }
    }

    /// Sends a request and decodes the body into `T`.
    ///
    /// An empty or non-JSON success body decodes from `null`.
    pub fn request<T: DeserializeOwned>(
        &mut self,
        method: impl Into<Method>,
        path: &str,
        query: Query,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, &Params::from(query))?;
        Ok(serde_json::from_value(response.into_body())?)
    }

    /// GET helper every catalog endpoint goes through.
    ///
    /// The returned document keeps the received body in
    /// [`Document::source`].
    pub fn get(&mut self, path: &str, query: Query) -> Result<Document, ApiError> {
        let response = self.send(Method::Get, path, &Params::from(query))?;
        Document::from_value(response.into_body())
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        match self.bearer_token() {
            Some(token) => vec![("Authorization".to_string(), format!("Bearer {token}"))],
            None => Vec::new(),
        }
    }

    fn recovery_for(&self, err: &ApiError) -> Option<Recovery> {
        if err.is_token_expired() && self.options.auto_refresh && self.session.is_some() {
            return Some(Recovery::Refresh);
        }
        if err.is_rate_limited() && self.options.auto_retry {
            return Some(Recovery::Wait(
                err.retry_after().unwrap_or(FALLBACK_RETRY_AFTER),
            ));
        }
        None
    }
}

impl Default for Tidal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tidal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tidal")
            .field("transport", &self.transport)
            .field("session", &self.session)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
