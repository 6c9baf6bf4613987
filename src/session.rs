//! # Session
//!
//! OAuth2 client identity and token state.
//!
//! A [`Session`] knows the client id, optional client secret and redirect URI
//! of the application and holds whatever tokens the last successful grant
//! produced. It implements the three grants TIDAL supports for third-party
//! applications:
//!
//! 1. **Authorization code with PKCE** ([`Session::request_access_token`]),
//!    after the user came back from [`Session::authorize_url`]
//! 2. **Refresh token** ([`Session::refresh_access_token`])
//! 3. **Client credentials** ([`Session::request_credentials_token`])
//!
//! Grants share one contract: a response that lacks the expected token fields
//! yields `Ok(false)` and leaves the token state untouched, while transport
//! and API failures come back as `Err`.
//!
//! Tokens only live in memory. Callers that want to keep them between runs
//! serialize [`TokenState`] themselves and hand it back with
//! [`Session::set_token_state`].

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::ApiError,
    transport::{Method, Params, Transport},
    types::{AuthorizeOptions, ClientCredentials, TokenState},
    utils::{self, HashAlgorithm},
};

const TOKEN_PATH: &str = "/token";
const AUTHORIZE_PATH: &str = "/authorize";

#[derive(Debug, Clone)]
pub struct Session {
    credentials: ClientCredentials,
    token: TokenState,
    transport: Transport,
}

impl Session {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self::with_transport(credentials, Transport::new())
    }

    pub fn with_transport(credentials: ClientCredentials, transport: Transport) -> Self {
        Self {
            credentials,
            token: TokenState::default(),
            transport,
        }
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.credentials.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.credentials.redirect_uri
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.credentials.client_id = client_id.into();
    }

    pub fn set_client_secret(&mut self, client_secret: impl Into<String>) {
        self.credentials.client_secret = client_secret.into();
    }

    pub fn set_redirect_uri(&mut self, redirect_uri: impl Into<String>) {
        self.credentials.redirect_uri = redirect_uri.into();
    }

    pub fn token_state(&self) -> &TokenState {
        &self.token
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.token.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.token.expires_at
    }

    pub fn scope(&self) -> &[String] {
        &self.token.scope
    }

    /// Restores tokens that were persisted outside the library.
    pub fn set_token_state(&mut self, token: TokenState) {
        self.token = token;
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.token.access_token = Some(access_token.into());
    }

    pub fn set_refresh_token(&mut self, refresh_token: impl Into<String>) {
        self.token.refresh_token = Some(refresh_token.into());
    }

    pub fn set_expires_at(&mut self, expires_at: DateTime<Utc>) {
        self.token.expires_at = Some(expires_at);
    }

    pub fn set_scope<S: Into<String>>(&mut self, scope: impl IntoIterator<Item = S>) {
        self.token.scope = scope.into_iter().map(Into::into).collect();
    }

    /// Random hex string used to bind the authorization redirect to this
    /// client. `length` is the number of hex characters (16 by default).
    pub fn generate_state(length: usize) -> Result<String, ApiError> {
        utils::generate_state(length)
    }

    /// Random hex PKCE code verifier of `length` characters (43 to 128).
    pub fn generate_code_verifier(length: usize) -> Result<String, ApiError> {
        utils::generate_code_verifier(length)
    }

    /// Base64url encoded digest of `verifier`, without padding.
    pub fn generate_code_challenge(verifier: &str, algorithm: HashAlgorithm) -> String {
        utils::generate_code_challenge(verifier, algorithm)
    }

    /// Builds the URL the user has to visit to authorize the application.
    ///
    /// The query always carries `response_type=code`, the client id, the
    /// redirect URI, the code challenge and its method. Scope and state are
    /// added when present; scopes are joined with spaces.
    ///
    /// # Example
    ///
    /// ```
    /// let pkce = PkceMaterial::generate()?;
    /// let url = session.authorize_url(
    ///     &AuthorizeOptions::from(&pkce).with_scope(["user.read", "collection.read"]),
    /// );
    /// ```
    pub fn authorize_url(&self, options: &AuthorizeOptions) -> String {
        let mut query: Vec<(&str, &str)> = vec![
            ("response_type", "code"),
            ("client_id", self.credentials.client_id.as_str()),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ];

        let scope = options.scope.join(" ");
        if !scope.is_empty() {
            query.push(("scope", scope.as_str()));
        }
        if let Some(state) = &options.state {
            query.push(("state", state.as_str()));
        }
        query.push(("code_challenge", options.code_challenge.as_str()));
        query.push((
            "code_challenge_method",
            options.code_challenge_method.as_str(),
        ));

        format!(
            "{login}{path}?{query}",
            login = self.transport.endpoints().login.trim_end_matches('/'),
            path = AUTHORIZE_PATH,
            query = utils::form_encode(&query)
        )
    }

    /// Exchanges an authorization code for an access and refresh token.
    ///
    /// Completes the PKCE flow started with [`Session::authorize_url`]. The
    /// `code_verifier` must be the one whose challenge went into the
    /// authorization URL; pass an empty string for confidential clients that
    /// did not use PKCE.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - both tokens were present and have been stored, together
    ///   with the expiration instant and scope (the previous scope is kept
    ///   when the response has none)
    /// - `Ok(false)` - the response lacked `access_token` or `refresh_token`;
    ///   the token state is unchanged
    /// - `Err(ApiError)` - transport failure or error response
    pub fn request_access_token(
        &mut self,
        authorization_code: &str,
        code_verifier: &str,
    ) -> Result<bool, ApiError> {
        let params = Params::form([
            ("grant_type", "authorization_code"),
            ("client_id", self.credentials.client_id.as_str()),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ("code", authorization_code),
            ("code_verifier", code_verifier),
        ]);

        let response = self.transport.auth(Method::Post, TOKEN_PATH, &params, &[])?;
        let body = &response.body;

        let (Some(access_token), Some(refresh_token)) =
            (str_field(body, "access_token"), str_field(body, "refresh_token"))
        else {
            warn!("authorization code grant returned no token pair");
            return Ok(false);
        };

        self.token.access_token = Some(access_token);
        self.token.refresh_token = Some(refresh_token);
        self.store_expiry_and_scope(body);
        debug!(expires_at = ?self.token.expires_at, "authorization code grant succeeded");

        Ok(true)
    }

    /// Obtains an application token through the client credentials grant.
    ///
    /// Authenticates with HTTP Basic auth built from the client id and
    /// secret. Returns `Ok(false)` when the response has no `access_token`.
    pub fn request_credentials_token(&mut self) -> Result<bool, ApiError> {
        let params = Params::form([("grant_type", "client_credentials")]);
        let headers = vec![(
            "Authorization".to_string(),
            utils::basic_auth(&self.credentials.client_id, &self.credentials.client_secret),
        )];

        let response = self
            .transport
            .auth(Method::Post, TOKEN_PATH, &params, &headers)?;
        let body = &response.body;

        let Some(access_token) = str_field(body, "access_token") else {
            warn!("client credentials grant returned no access token");
            return Ok(false);
        };

        self.token.access_token = Some(access_token);
        self.store_expiry_and_scope(body);
        debug!(expires_at = ?self.token.expires_at, "client credentials grant succeeded");

        Ok(true)
    }

    /// Trades a refresh token for a new access token.
    ///
    /// Uses `refresh_token` when given, the stored one otherwise; without
    /// either there is nothing to send and the result is `Ok(false)`. Basic
    /// auth is only added when a client secret is configured.
    ///
    /// # Token Rotation
    ///
    /// When the server returns a new refresh token it replaces the stored
    /// one. Otherwise the stored refresh token is kept, or, if none was
    /// stored, the one passed in is adopted.
    pub fn refresh_access_token(&mut self, refresh_token: Option<&str>) -> Result<bool, ApiError> {
        let Some(refresh_token) = refresh_token
            .map(str::to_string)
            .or_else(|| self.token.refresh_token.clone())
        else {
            warn!("no refresh token available");
            return Ok(false);
        };

        let params = Params::form([
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
        ]);
        let mut headers = Vec::new();
        if self.credentials.has_secret() {
            headers.push((
                "Authorization".to_string(),
                utils::basic_auth(&self.credentials.client_id, &self.credentials.client_secret),
            ));
        }

        let response = self
            .transport
            .auth(Method::Post, TOKEN_PATH, &params, &headers)?;
        let body = &response.body;

        let Some(access_token) = str_field(body, "access_token") else {
            warn!("refresh grant returned no access token");
            return Ok(false);
        };

        self.token.access_token = Some(access_token);
        match str_field(body, "refresh_token") {
            Some(rotated) => self.token.refresh_token = Some(rotated),
            None if self.token.refresh_token.is_none() => {
                self.token.refresh_token = Some(refresh_token)
            }
            None => {}
        }
        self.store_expiry_and_scope(body);
        debug!(expires_at = ?self.token.expires_at, "access token refreshed");

        Ok(true)
    }

    fn store_expiry_and_scope(&mut self, body: &Value) {
        self.token.expires_at = expires_in(body).map(|secs| Utc::now() + Duration::seconds(secs));
        if let Some(scope) = str_field(body, "scope") {
            self.token.scope = utils::split_scope(&scope);
        }
    }
}

fn str_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn expires_in(body: &Value) -> Option<i64> {
    match body.get("expires_in")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
