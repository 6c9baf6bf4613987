use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::types::PendingAuthorization;

/// Reports the server version and where the pending authorization stands.
pub async fn health(
    Extension(shared_state): Extension<Arc<Mutex<PendingAuthorization>>>,
) -> Json<Value> {
    let pending = shared_state.lock().await;
    let authorization = match (&pending.code, &pending.error) {
        (Some(_), _) => "received",
        (None, Some(_)) => "denied",
        (None, None) => "pending",
    };

    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "authorization": authorization
    }))
}
