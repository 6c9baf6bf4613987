use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;
use url::Url;

use crate::{api, config, types::PendingAuthorization};

/// Path the callback handler is mounted on when the redirect URI has none.
pub const DEFAULT_CALLBACK_PATH: &str = "/callback";

/// Path part of `redirect_uri`, so the server answers where TIDAL redirects to.
pub fn callback_path(redirect_uri: &str) -> String {
    match Url::parse(redirect_uri) {
        Ok(url) if url.path() != "/" && !url.path().is_empty() => url.path().to_string(),
        _ => DEFAULT_CALLBACK_PATH.to_string(),
    }
}

pub fn router(state: Arc<Mutex<PendingAuthorization>>, callback_path: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(callback_path, get(api::callback))
        .layer(Extension(state))
}

pub async fn start_api_server(
    state: Arc<Mutex<PendingAuthorization>>,
    redirect_uri: &str,
) -> Result<(), String> {
    let addr = SocketAddr::from_str(&config::server_addr())
        .map_err(|e| format!("Failed to parse server address: {e}"))?;
    let path = callback_path(redirect_uri);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    tracing::debug!(%addr, %path, "callback server listening");

    axum::serve(listener, router(state, &path))
        .await
        .map_err(|e| e.to_string())
}
