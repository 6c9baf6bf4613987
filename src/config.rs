//! Configuration management for the TIDAL catalog client.
//!
//! This module handles loading and accessing configuration values from
//! environment variables and `.env` files. The library itself never reads the
//! environment; these accessors exist for the command-line front end and for
//! applications that want the same conventions.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use crate::{
    transport::{API_URL, AUTH_URL, Endpoints, LOGIN_URL},
    types::ClientCredentials,
};

/// Location of the `.env` file in the platform data directory.
///
/// - Linux: `~/.local/share/tidlcli/.env`
/// - macOS: `~/Library/Application Support/tidlcli/.env`
/// - Windows: `%LOCALAPPDATA%/tidlcli/.env`
pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tidlcli/.env");
    path
}

/// Loads environment variables from the `.env` file in the local data
/// directory.
///
/// Creates the directory structure when it is missing. A missing `.env` file
/// is not an error, since every value can also come from the process
/// environment; a file that exists but cannot be parsed is.
///
/// # Example
///
/// ```
/// use tidlcli::config;
///
/// if let Err(e) = config::load_env() {
///     eprintln!("Configuration error: {}", e);
/// }
/// ```
pub fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    }
    Ok(())
}

fn required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the client id registered in the TIDAL developer portal
/// (`TIDAL_CLIENT_ID`).
pub fn tidal_client_id() -> Result<String, String> {
    required("TIDAL_CLIENT_ID")
}

/// Returns the client secret (`TIDAL_CLIENT_SECRET`), empty for public
/// clients.
///
/// # Security Note
///
/// The client secret should be kept confidential and never exposed in logs
/// or version control.
pub fn tidal_client_secret() -> String {
    optional("TIDAL_CLIENT_SECRET").unwrap_or_default()
}

/// Returns the OAuth redirect URI (`TIDAL_REDIRECT_URI`).
///
/// It must match one of the redirect URIs registered for the application
/// and point at the local callback server for `tidlcli auth`.
///
/// # Example
///
/// ```
/// let redirect_uri = tidal_redirect_uri()?; // e.g., "http://localhost:8080/callback"
/// ```
pub fn tidal_redirect_uri() -> Result<String, String> {
    required("TIDAL_REDIRECT_URI")
}

/// Returns the requested scopes (`TIDAL_SCOPE`, space separated).
pub fn tidal_scope() -> Vec<String> {
    optional("TIDAL_SCOPE")
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Returns the ISO 3166-1 country code for catalog requests
/// (`TIDAL_COUNTRY_CODE`, defaults to `US`).
pub fn tidal_country_code() -> String {
    optional("TIDAL_COUNTRY_CODE").unwrap_or_else(|| "US".to_string())
}

/// Returns the locale used by profile and recommendation endpoints
/// (`TIDAL_LOCALE`, defaults to `en-US`).
pub fn tidal_locale() -> String {
    optional("TIDAL_LOCALE").unwrap_or_else(|| "en-US".to_string())
}

/// Access token to re-hydrate a session with (`TIDAL_ACCESS_TOKEN`).
pub fn tidal_access_token() -> Option<String> {
    optional("TIDAL_ACCESS_TOKEN")
}

/// Refresh token to re-hydrate a session with (`TIDAL_REFRESH_TOKEN`).
pub fn tidal_refresh_token() -> Option<String> {
    optional("TIDAL_REFRESH_TOKEN")
}

/// Returns the address of the local OAuth callback server
/// (`SERVER_ADDRESS`, defaults to `127.0.0.1:8080`).
pub fn server_addr() -> String {
    optional("SERVER_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string())
}

/// Request timeout in seconds (`TIDAL_HTTP_TIMEOUT`), if configured.
pub fn http_timeout() -> Option<Duration> {
    optional("TIDAL_HTTP_TIMEOUT")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Base URLs, honoring `TIDAL_LOGIN_URL`, `TIDAL_AUTH_URL` and
/// `TIDAL_API_URL` overrides.
pub fn endpoints() -> Endpoints {
    Endpoints {
        login: optional("TIDAL_LOGIN_URL").unwrap_or_else(|| LOGIN_URL.to_string()),
        auth: optional("TIDAL_AUTH_URL").unwrap_or_else(|| AUTH_URL.to_string()),
        api: optional("TIDAL_API_URL").unwrap_or_else(|| API_URL.to_string()),
    }
}

/// Client identity assembled from the environment.
///
/// The redirect URI is optional here because the client credentials grant
/// does not need one.
pub fn client_credentials() -> Result<ClientCredentials, String> {
    let mut credentials = ClientCredentials::new(tidal_client_id()?).with_secret(tidal_client_secret());
    if let Some(redirect_uri) = optional("TIDAL_REDIRECT_URI") {
        credentials = credentials.with_redirect_uri(redirect_uri);
    }
    Ok(credentials)
}
