use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    Res, Session, config, error, info,
    server::start_api_server,
    success,
    types::{AuthorizeOptions, PendingAuthorization, PkceMaterial},
    warning,
};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the authorization code flow with PKCE.
///
/// 1. Generates verifier, challenge and state
/// 2. Starts the local callback server
/// 3. Opens the authorization URL in the browser
/// 4. Waits for the redirect carrying the code
/// 5. Exchanges the code and prints the token state
///
/// The callback server runs on a throwaway tokio runtime. The exchange
/// happens on the calling thread after that runtime has been shut down,
/// because the library client is blocking.
pub fn auth(scope: Vec<String>) {
    if let Err(e) = run(scope) {
        error!("Authentication failed: {}", e);
    }
}

fn run(scope: Vec<String>) -> Res<()> {
    let redirect_uri = config::tidal_redirect_uri()?;
    let credentials = config::client_credentials()?.with_redirect_uri(redirect_uri.clone());

    let mut session = Session::with_transport(credentials, super::build_transport()?);
    let pkce = PkceMaterial::generate()?;

    let scope = if scope.is_empty() {
        config::tidal_scope()
    } else {
        scope
    };
    let auth_url = session.authorize_url(&AuthorizeOptions::from(&pkce).with_scope(scope));

    let shared_state = Arc::new(Mutex::new(PendingAuthorization::new(pkce.state.clone())));
    let runtime = tokio::runtime::Runtime::new()?;

    let pending = runtime.block_on(async {
        let server_state = Arc::clone(&shared_state);
        tokio::spawn(async move {
            if let Err(e) = start_api_server(server_state, &redirect_uri).await {
                warning!("Callback server stopped: {}", e);
            }
        });

        info!("Waiting for authorization on {}", config::server_addr());
        if webbrowser::open(&auth_url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            )
        }

        wait_for_callback(shared_state).await
    });
    runtime.shutdown_background();

    let pending = pending.ok_or("Timed out waiting for the authorization callback")?;
    if let Some(err) = pending.error {
        return Err(err.into());
    }
    let code = pending.code.ok_or("Callback carried no authorization code")?;

    if !session.request_access_token(&code, &pkce.code_verifier)? {
        return Err("Token endpoint returned no token pair".into());
    }

    success!("Authentication successful!");
    super::print_token(session.token_state())
}

async fn wait_for_callback(
    shared_state: Arc<Mutex<PendingAuthorization>>,
) -> Option<PendingAuthorization> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < CALLBACK_TIMEOUT {
        let lock = shared_state.lock().await;
        if lock.is_settled() {
            return Some(lock.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}
