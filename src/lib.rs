//! TIDAL Catalog Client Library
//!
//! This library provides a blocking client for the TIDAL open API. It covers
//! the OAuth2 grants TIDAL offers to third-party applications, keeps the
//! resulting tokens in memory, and exposes one method per catalog endpoint
//! (albums, artists, tracks, videos, search, users, playlists and friends).
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `client` - API facade with automatic token refresh and rate-limit retry
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by all layers
//! - `server` - Local HTTP server for OAuth callbacks
//! - `session` - OAuth2 client identity, grants and token state
//! - `transport` - Single HTTP request execution and response normalization
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE material and encoding helpers
//!
//! # Example
//!
//! ```
//! use tidlcli::{Query, Session, Tidal, types::ClientCredentials};
//!
//! fn main() -> tidlcli::Res<()> {
//!     let mut session = Session::new(ClientCredentials::new("id").with_secret("secret"));
//!     session.request_credentials_token()?;
//!
//!     let mut tidal = Tidal::new().with_session(session);
//!     let album = tidal.album("251380836", "US", Query::new().include(&["artists"]))?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;
pub mod utils;

pub use client::{ClientOptions, Query, Sleeper, ThreadSleeper, Tidal};
pub use error::ApiError;
pub use session::Session;
pub use transport::{Endpoints, HttpBackend, HttpRequest, Method, Params, Response, Transport};

/// A convenient Result type alias for operations that may fail.
///
/// Used by the command-line layer, where errors from the library, the
/// configuration and the callback server meet. Library functions return
/// [`ApiError`] directly.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Opening browser for authorization...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It should only be used for fatal errors in the
/// command-line layer, never inside the library.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
