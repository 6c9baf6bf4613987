mod common;

use chrono::Utc;
use common::{ScriptedBackend, credentials, session};
use tidlcli::{
    ApiError, Method, Session,
    types::{AuthorizeOptions, TokenState},
    utils::{DEFAULT_VERIFIER_LENGTH, HashAlgorithm},
};
use url::Url;

fn form_pairs(body: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

fn form_value(body: &str, key: &str) -> Option<String> {
    form_pairs(body)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

#[test]
fn test_authorize_url() {
    let session = Session::new(credentials());
    let options = AuthorizeOptions::new("challenge-abc")
        .with_scope(["user.read", "collection.read"])
        .with_state("state-123");

    let url = Url::parse(&session.authorize_url(&options)).unwrap();
    assert_eq!(url.host_str(), Some("login.tidal.com"));
    assert_eq!(url.path(), "/authorize");

    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let get = |key: &str| {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get("response_type"), Some("code"));
    assert_eq!(get("client_id"), Some("client-id"));
    assert_eq!(get("redirect_uri"), Some("http://127.0.0.1:8080/callback"));
    assert_eq!(get("scope"), Some("user.read collection.read"));
    assert_eq!(get("state"), Some("state-123"));
    assert_eq!(get("code_challenge"), Some("challenge-abc"));
    assert_eq!(get("code_challenge_method"), Some("S256"));
}

#[test]
fn test_authorize_url_without_scope_or_state() {
    let session = Session::new(credentials());
    let url = session.authorize_url(&AuthorizeOptions::new("c"));

    assert!(!url.contains("scope="));
    assert!(!url.contains("state="));
    assert!(url.contains("code_challenge=c"));
}

#[test]
fn test_pkce_helpers() {
    let verifier = Session::generate_code_verifier(DEFAULT_VERIFIER_LENGTH).unwrap();
    assert_eq!(verifier.len(), DEFAULT_VERIFIER_LENGTH);
    assert_eq!(Session::generate_state(8).unwrap().len(), 8);
    assert_eq!(
        Session::generate_code_challenge(&verifier, HashAlgorithm::Sha256).len(),
        43
    );
}

#[test]
fn test_request_access_token() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    backend.push_json(
        200,
        r#"{"access_token":"at","refresh_token":"rt","expires_in":3600,"scope":"user.read playlists.write"}"#,
    );

    let before = Utc::now();
    assert!(session.request_access_token("the-code", "the-verifier").unwrap());

    assert_eq!(session.access_token(), Some("at"));
    assert_eq!(session.refresh_token(), Some("rt"));
    assert_eq!(session.scope(), ["user.read", "playlists.write"]);
    let expires_at = session.expires_at().unwrap();
    assert!(expires_at >= before + chrono::Duration::seconds(3600));
    assert!(expires_at <= Utc::now() + chrono::Duration::seconds(3600));

    let request = backend.last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "https://auth.tidal.com/v1/oauth2/token");
    let body = request.body.unwrap();
    assert_eq!(form_value(&body, "grant_type").as_deref(), Some("authorization_code"));
    assert_eq!(form_value(&body, "client_id").as_deref(), Some("client-id"));
    assert_eq!(form_value(&body, "code").as_deref(), Some("the-code"));
    assert_eq!(form_value(&body, "code_verifier").as_deref(), Some("the-verifier"));
    assert_eq!(
        form_value(&body, "redirect_uri").as_deref(),
        Some("http://127.0.0.1:8080/callback")
    );
}

#[test]
fn test_request_access_token_requires_both_tokens() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    session.set_scope(["old.scope"]);
    backend.push_json(200, r#"{"access_token":"at","expires_in":60}"#);

    assert!(!session.request_access_token("code", "verifier").unwrap());

    let expected = TokenState {
        scope: vec!["old.scope".to_string()],
        ..Default::default()
    };
    assert_eq!(session.token_state(), &expected);
}

#[test]
fn test_request_access_token_missing_access_token_keeps_prior_state() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    session.set_access_token("prior-access");
    session.set_refresh_token("prior-refresh");
    let before = session.token_state().clone();
    backend.push_json(200, r#"{"refresh_token":"rt","expires_in":60,"scope":"x"}"#);

    assert!(!session.request_access_token("code", "verifier").unwrap());
    assert_eq!(session.token_state(), &before);
}

#[test]
fn test_request_access_token_error_response() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    backend.push_json(
        400,
        r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#,
    );

    let err = session.request_access_token("bad", "verifier").unwrap_err();
    assert!(matches!(err, ApiError::AuthFlow { status: 400, .. }));
    assert!(session.access_token().is_none());
}

#[test]
fn test_request_credentials_token() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    session.set_scope(["kept"]);
    backend.push_json(200, r#"{"access_token":"app-token","expires_in":"86400"}"#);

    assert!(session.request_credentials_token().unwrap());
    assert_eq!(session.access_token(), Some("app-token"));
    assert!(session.refresh_token().is_none());
    assert!(session.expires_at().is_some());
    // no scope in the response keeps the previous one
    assert_eq!(session.scope(), ["kept"]);

    let request = backend.last_request();
    assert_eq!(
        request.header("Authorization"),
        Some("Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=")
    );
    assert_eq!(
        form_value(&request.body.unwrap(), "grant_type").as_deref(),
        Some("client_credentials")
    );
}

#[test]
fn test_refresh_keeps_stored_refresh_token() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    session.set_access_token("old");
    session.set_refresh_token("stored-refresh");
    backend.push_json(200, r#"{"access_token":"new","expires_in":3600}"#);

    assert!(session.refresh_access_token(None).unwrap());
    assert_eq!(session.access_token(), Some("new"));
    assert_eq!(session.refresh_token(), Some("stored-refresh"));

    let request = backend.last_request();
    let body = request.body.clone().unwrap();
    assert_eq!(form_value(&body, "grant_type").as_deref(), Some("refresh_token"));
    assert_eq!(form_value(&body, "refresh_token").as_deref(), Some("stored-refresh"));
    assert_eq!(form_value(&body, "client_id").as_deref(), Some("client-id"));
    assert!(request.header("authorization").unwrap().starts_with("Basic "));
}

#[test]
fn test_refresh_rotates_refresh_token() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    session.set_refresh_token("stored-refresh");
    backend.push_json(200, r#"{"access_token":"new","refresh_token":"rotated"}"#);

    assert!(session.refresh_access_token(None).unwrap());
    assert_eq!(session.refresh_token(), Some("rotated"));
    assert!(session.expires_at().is_none());
}

#[test]
fn test_refresh_adopts_supplied_token() {
    let backend = ScriptedBackend::new();
    let mut session = Session::with_transport(
        tidlcli::types::ClientCredentials::new("public-client"),
        common::transport(&backend),
    );
    backend.push_json(200, r#"{"access_token":"new"}"#);

    assert!(session.refresh_access_token(Some("supplied")).unwrap());
    assert_eq!(session.access_token(), Some("new"));
    assert_eq!(session.refresh_token(), Some("supplied"));

    // public clients do not send basic auth
    assert!(backend.last_request().header("authorization").is_none());
}

#[test]
fn test_refresh_without_any_token() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);

    assert!(!session.refresh_access_token(None).unwrap());
    assert!(backend.requests().is_empty());
}

#[test]
fn test_refresh_without_access_token_in_response() {
    let backend = ScriptedBackend::new();
    let mut session = session(&backend);
    session.set_access_token("old");
    session.set_refresh_token("r");
    backend.push_json(200, r#"{"token_type":"Bearer"}"#);

    assert!(!session.refresh_access_token(None).unwrap());
    assert_eq!(session.access_token(), Some("old"));
}

#[test]
fn test_session_uses_configured_endpoints() {
    let backend = ScriptedBackend::new();
    let transport = common::transport(&backend).with_endpoints(tidlcli::Endpoints {
        login: "https://login.test/".to_string(),
        auth: "https://auth.test".to_string(),
        api: "https://api.test".to_string(),
    });
    let mut session = Session::with_transport(credentials(), transport);

    assert!(
        session
            .authorize_url(&AuthorizeOptions::new("c"))
            .starts_with("https://login.test/authorize?")
    );

    backend.push_json(200, r#"{"access_token":"x"}"#);
    session.request_credentials_token().unwrap();
    assert_eq!(backend.last_request().url, "https://auth.test/token");
}
