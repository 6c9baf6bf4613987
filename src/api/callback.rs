use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::{types::PendingAuthorization, warning};

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<PendingAuthorization>>>,
) -> Html<&'static str> {
    let mut pending = shared_state.lock().await;

    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map(|d| format!("{error}: {d}"))
            .unwrap_or_else(|| error.clone());
        warning!("Authorization was denied: {}", description);
        pending.error = Some(description);
        return Html("<h4>Login failed.</h4>");
    }

    // reject redirects that do not belong to this attempt
    if params.get("state") != Some(&pending.state) {
        warning!("Callback state does not match the authorization request");
        return Html("<h4>State mismatch.</h4>");
    }

    match params.get("code") {
        Some(code) => {
            pending.code = Some(code.clone());
            Html("<h2>Authorization received.</h2><p>Close this browser window.</p>")
        }
        None => Html("<h4>Missing authorization code.</h4>"),
    }
}
