//! # API Module
//!
//! HTTP handlers of the short-lived local server that `tidlcli auth` starts
//! to receive the OAuth redirect.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the authorization code from TIDAL's login page,
//!   checks the `state` parameter against the pending attempt and stores the
//!   code for the command to exchange.
//! - [`health`] - Reports the crate version and whether the redirect has
//!   arrived yet.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use tidlcli::api::{callback, health};
//!
//! let pending = Arc::new(Mutex::new(PendingAuthorization::new(state)));
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health))
//!     .layer(Extension(pending));
//! ```
//!
//! The token exchange itself is not done here: the library client is
//! blocking and runs on the command's thread once the server is done.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
