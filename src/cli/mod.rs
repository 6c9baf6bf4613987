//! # CLI Module
//!
//! Command implementations behind the `tidlcli` binary. Each command loads
//! what it needs from [`crate::config`], talks to TIDAL through the library
//! ([`crate::Session`] and [`crate::Tidal`]) and prints the result with the
//! console macros or as a table.
//!
//! ## Commands
//!
//! - [`auth`] - Authorization code flow with PKCE and a local callback server
//! - [`token`] - Client credentials grant
//! - [`get`] - Fetches one catalog resource or one of its relationships
//! - [`search`] - Searches the catalog
//!
//! ## Tokens
//!
//! Nothing is written to disk. `auth` and `token` print the granted token
//! state; export `TIDAL_ACCESS_TOKEN` / `TIDAL_REFRESH_TOKEN` (or put them in
//! the `.env` file) to reuse them. Without a token the catalog commands fall
//! back to a client credentials grant.
//!
//! ## Usage Patterns
//!
//! ```bash
//! tidlcli auth --scope user.read           # Log in as a user
//! tidlcli get album 251380836 --include artists
//! tidlcli get artist 1566 --relationship albums
//! tidlcli search "daft punk" --relationship artists
//! ```

mod auth;
mod catalog;
mod token;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    Res, Session, Tidal, config, info,
    transport::{ReqwestBackend, Transport},
    types::{Document, ResourceTableRow, TokenState},
    warning,
};

pub use auth::auth;
pub use catalog::{GetOptions, Resource, SearchOptions, SearchScope, get, search};
pub use token::token;

pub(crate) fn build_transport() -> Res<Transport> {
    let transport = match config::http_timeout() {
        Some(timeout) => {
            let backend = ReqwestBackend::with_timeouts(timeout, timeout)?;
            Transport::with_backend(std::sync::Arc::new(backend))
        }
        None => Transport::new(),
    };
    Ok(transport.with_endpoints(config::endpoints()))
}

/// Builds a client from the environment.
///
/// Preference order: stored access token, stored refresh token, client
/// credentials grant. A bare `TIDAL_ACCESS_TOKEN` without client id is used
/// as is, without refresh.
pub(crate) fn build_client() -> Res<Tidal> {
    let transport = build_transport()?;
    let mut tidal = Tidal::with_transport(transport.clone());

    let credentials = match config::client_credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            let Some(access_token) = config::tidal_access_token() else {
                return Err(e.into());
            };
            tidal.set_access_token(access_token);
            return Ok(tidal);
        }
    };

    let mut session = Session::with_transport(credentials, transport);
    match (config::tidal_access_token(), config::tidal_refresh_token()) {
        (Some(access_token), refresh_token) => {
            session.set_access_token(access_token);
            if let Some(refresh_token) = refresh_token {
                session.set_refresh_token(refresh_token);
            }
        }
        (None, Some(refresh_token)) => {
            if !session.refresh_access_token(Some(&refresh_token))? {
                return Err("Token refresh returned no access token".into());
            }
        }
        (None, None) => {
            if !session.request_credentials_token()? {
                return Err("Client credentials grant returned no access token".into());
            }
        }
    }

    tidal.set_session(session);
    Ok(tidal)
}

pub(crate) fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

pub(crate) fn print_document(document: &Document, json: bool) -> Res<()> {
    if json {
        let output = match document.source() {
            serde_json::Value::Null => serde_json::to_string_pretty(document)?,
            source => serde_json::to_string_pretty(source)?,
        };
        println!("{output}");
        return Ok(());
    }

    let mut rows: Vec<ResourceTableRow> = document
        .resources()
        .into_iter()
        .map(ResourceTableRow::from)
        .collect();
    rows.extend(document.identifiers().into_iter().map(ResourceTableRow::from));

    if rows.is_empty() {
        warning!("Nothing found.");
        return Ok(());
    }

    println!("{}", Table::new(rows));
    if let Some(next) = document.next_page() {
        info!("More results: {}", next);
    }
    Ok(())
}

pub(crate) fn print_token(token: &TokenState) -> Res<()> {
    println!("{}", serde_json::to_string_pretty(token)?);
    Ok(())
}
