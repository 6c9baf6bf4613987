//! # Transport
//!
//! One HTTP request in, one normalized [`Response`] or classified
//! [`ApiError`] out. The transport knows the three TIDAL hosts (login UI,
//! OAuth token service, open API) and exposes a call mode for each of them;
//! every mode prefixes its base URL onto the path and hands over to
//! [`Transport::send`].
//!
//! The actual wire work is done by an [`HttpBackend`]. Backends return the
//! raw response text (status line, headers, blank line, body) and the
//! transport takes care of splitting, header normalization, JSON decoding and
//! error classification, so every backend gets identical semantics.
//!
//! Nothing is retried here. Retrying is a policy of the API facade.

mod headers;
mod raw;
mod reqwest_backend;

use std::{fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

pub use headers::Headers;
pub use raw::{classify, split_response, status_code};
pub use reqwest_backend::ReqwestBackend;

use crate::error::ApiError;

/// Authorization UI host.
pub const LOGIN_URL: &str = "https://login.tidal.com";
/// OAuth2 token service.
pub const AUTH_URL: &str = "https://auth.tidal.com/v1/oauth2";
/// Catalog API.
pub const API_URL: &str = "https://openapi.tidal.com/v2";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Base URLs of the three call modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub auth: String,
    pub api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: LOGIN_URL.to_string(),
            auth: AUTH_URL.to_string(),
            api: API_URL.to_string(),
        }
    }
}

/// HTTP method, always upper case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Other(String),
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method.trim().to_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Other(m) => m,
        }
    }

    /// POST, PUT and DELETE carry their parameters in the body, everything
    /// else in the query string.
    pub fn sends_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Delete)
    }
}

impl From<&str> for Method {
    fn from(method: &str) -> Self {
        Method::parse(method)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request parameters: nothing, a pre-encoded string or pairs to form-encode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Params {
    #[default]
    None,
    Raw(String),
    Form(Vec<(String, String)>),
}

impl Params {
    pub fn form<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Params::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn encode(&self) -> String {
        match self {
            Params::None => String::new(),
            Params::Raw(raw) => raw.clone(),
            Params::Form(pairs) => crate::utils::form_encode(pairs),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Raw(raw) => raw.is_empty(),
            Params::Form(pairs) => pairs.is_empty(),
        }
    }
}

/// A fully prepared request as handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes a single request and returns the raw response text.
///
/// Implementations must report failures that happen before a response is
/// read as [`ApiError::Transport`]. HTTP error statuses are not failures at
/// this level.
pub trait HttpBackend: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<String, ApiError>;
}

/// Normalized result of one successful request.
#[derive(Debug, Clone)]
pub struct Response<T = Value> {
    pub body: T,
    /// Body as received.
    pub text: String,
    pub headers: Headers,
    pub status: u16,
    /// URL the request was sent to, query string included.
    pub url: String,
}

impl<T> Response<T> {
    pub fn into_body(self) -> T {
        self.body
    }

    /// Decodes the raw body into another type.
    pub fn json<U: DeserializeOwned>(&self) -> Result<U, ApiError> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

/// HTTP transport bound to a set of [`Endpoints`].
#[derive(Clone)]
pub struct Transport {
    endpoints: Endpoints,
    backend: Arc<dyn HttpBackend>,
    default_headers: Vec<(String, String)>,
}

impl Transport {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(ReqwestBackend::new()))
    }

    pub fn with_backend(backend: Arc<dyn HttpBackend>) -> Self {
        Self {
            endpoints: Endpoints::default(),
            backend,
            default_headers: vec![
                ("Accept".to_string(), "application/vnd.api+json".to_string()),
                (
                    "User-Agent".to_string(),
                    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                ),
            ],
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Replaces the headers sent with every request before the caller's own.
    pub fn set_default_headers(&mut self, headers: Vec<(String, String)>) {
        self.default_headers = headers;
    }

    pub fn login(
        &self,
        method: impl Into<Method>,
        path: &str,
        params: &Params,
        headers: &[(String, String)],
    ) -> Result<Response, ApiError> {
        let url = join(&self.endpoints.login, path);
        self.send(method, &url, params, headers)
    }

    pub fn auth(
        &self,
        method: impl Into<Method>,
        path: &str,
        params: &Params,
        headers: &[(String, String)],
    ) -> Result<Response, ApiError> {
        let url = join(&self.endpoints.auth, path);
        self.send(method, &url, params, headers)
    }

    pub fn api(
        &self,
        method: impl Into<Method>,
        path: &str,
        params: &Params,
        headers: &[(String, String)],
    ) -> Result<Response, ApiError> {
        let url = join(&self.endpoints.api, path);
        self.send(method, &url, params, headers)
    }

    /// Builds the request for `method` and `url` without sending it.
    pub fn prepare(
        &self,
        method: impl Into<Method>,
        url: &str,
        params: &Params,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let method = method.into();
        let encoded = params.encode();

        let mut all_headers = self.default_headers.clone();
        all_headers.extend(headers.iter().cloned());

        let (url, body) = if method.sends_body() {
            if !all_headers
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            {
                all_headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            }
            (url.to_string(), Some(encoded))
        } else if encoded.is_empty() {
            (url.to_string(), None)
        } else {
            (format!("{url}?{encoded}"), None)
        };

        HttpRequest {
            method,
            url,
            headers: all_headers,
            body,
        }
    }

    /// Sends one request and normalizes the outcome.
    ///
    /// Returns the response for statuses below 400 and a classified error
    /// otherwise.
    pub fn send(
        &self,
        method: impl Into<Method>,
        url: &str,
        params: &Params,
        headers: &[(String, String)],
    ) -> Result<Response, ApiError> {
        let request = self.prepare(method, url, params, headers);
        debug!(method = %request.method, url = %request.url, "sending request");

        let raw = self.backend.execute(&request)?;
        let response = parse_response(&raw, &request.url)?;
        debug!(status = response.status, url = %response.url, "received response");

        if response.status >= 400 {
            return Err(classify(
                response.status,
                &response.text,
                &response.body,
                response.headers,
            ));
        }

        Ok(response)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("endpoints", &self.endpoints)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// Parses raw response text into a [`Response`] regardless of its status.
pub fn parse_response(raw: &str, url: &str) -> Result<Response, ApiError> {
    let (head, text) = split_response(raw);
    let status = status_code(head).ok_or_else(|| ApiError::Transport {
        kind: crate::error::TransportErrorKind::Body,
        message: format!("malformed status line in response from {url}"),
    })?;
    let headers = Headers::parse(head);

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                trace!(error = %e, "response body is not JSON");
                Value::Null
            }
        }
    };

    Ok(Response {
        body,
        text: text.to_string(),
        headers,
        status,
        url: url.to_string(),
    })
}

fn join(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    if base.ends_with('/') && path.starts_with('/') {
        format!("{}{}", base, &path[1..])
    } else if !base.ends_with('/') && !path.starts_with('/') {
        format!("{base}/{path}")
    } else {
        format!("{base}{path}")
    }
}
