use crate::{Res, Session, config, error, success};

/// Requests an application token with the client credentials grant and
/// prints it.
pub fn token() {
    if let Err(e) = run() {
        error!("Client credentials grant failed: {}", e);
    }
}

fn run() -> Res<()> {
    let credentials = config::client_credentials()?;
    if !credentials.has_secret() {
        return Err("TIDAL_CLIENT_SECRET must be set for the client credentials grant".into());
    }

    let mut session = Session::with_transport(credentials, super::build_transport()?);
    let pb = super::spinner("Requesting application token...");
    let granted = session.request_credentials_token();
    pb.finish_and_clear();

    if !granted? {
        return Err("Token endpoint returned no access token".into());
    }

    success!("Token granted.");
    super::print_token(session.token_state())
}
