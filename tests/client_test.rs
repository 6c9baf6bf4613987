mod common;

use std::{sync::Arc, time::Duration};

use common::{ScriptedBackend, client_with_session, json_response, transport};
use serde::Deserialize;
use tidlcli::{
    ApiError, ClientOptions, Method, Params, Query, Tidal,
    types::{PrimaryData, ResourceType},
};

const EXPIRED: &str = r#"{"error":{"message":"The token has expired","status":401}}"#;
const RATE_LIMITED: &str = r#"{"errors":[{"status":"429","detail":"Too many requests"}]}"#;
const ALBUM: &str = r#"{
    "data": {
        "id": "251380836",
        "type": "albums",
        "attributes": {"title": "Random Access Memories"},
        "relationships": {"artists": {"data": [{"id": "4050205", "type": "artists"}]}}
    },
    "included": [
        {"id": "4050205", "type": "artists", "attributes": {"name": "Daft Punk"}}
    ]
}"#;

fn rate_limited(retry_after: Option<&str>) -> String {
    match retry_after {
        Some(secs) => json_response(429, &[("Retry-After", secs)], RATE_LIMITED),
        None => json_response(429, &[], RATE_LIMITED),
    }
}

fn bearer(request: &tidlcli::HttpRequest) -> Option<&str> {
    request.header("authorization")
}

#[test]
fn test_default_options() {
    let options = ClientOptions::default();
    assert!(options.auto_refresh);
    assert!(options.auto_retry);
    assert_eq!(options.max_attempts, 3);
    assert_eq!(options.max_retry_after, Duration::from_secs(120));
}

#[test]
fn test_expired_token_is_refreshed_once() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);

    backend.push_json(401, EXPIRED);
    backend.push_json(200, r#"{"access_token":"new-access"}"#);
    backend.push_json(200, ALBUM);

    let document = tidal.album("251380836", "US", Query::new()).unwrap();
    assert_eq!(document.resources()[0].display_name(), "Random Access Memories");

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(bearer(&requests[0]), Some("Bearer old-access"));
    assert_eq!(requests[1].url, "https://auth.tidal.com/v1/oauth2/token");
    assert_eq!(bearer(&requests[2]), Some("Bearer new-access"));
    assert_eq!(requests[0].url, requests[2].url);

    let session = tidal.session().unwrap();
    assert_eq!(session.access_token(), Some("new-access"));
    assert_eq!(session.refresh_token(), Some("refresh-1"));
}

#[test]
fn test_rate_limit_waits_for_retry_after() {
    let backend = ScriptedBackend::new();
    let (mut tidal, sleeper) = client_with_session(&backend);

    backend.push_raw(rate_limited(Some("2")));
    backend.push_json(200, ALBUM);

    tidal.album("251380836", "US", Query::new()).unwrap();

    assert_eq!(sleeper.delays(), vec![Duration::from_secs(2)]);
    assert_eq!(backend.requests().len(), 2);
}

#[test]
fn test_rate_limit_without_retry_after_waits_one_second() {
    let backend = ScriptedBackend::new();
    let (mut tidal, sleeper) = client_with_session(&backend);

    backend.push_raw(rate_limited(None));
    backend.push_json(200, ALBUM);

    tidal.track("1", "US", Query::new()).unwrap();
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
}

#[test]
fn test_retries_are_bounded() {
    let backend = ScriptedBackend::new();
    let (mut tidal, sleeper) = client_with_session(&backend);

    for _ in 0..3 {
        backend.push_raw(rate_limited(Some("1")));
    }

    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    match &err {
        ApiError::RetriesExhausted { attempts, source } => {
            assert_eq!(*attempts, 3);
            assert!(source.is_rate_limited());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.status(), Some(429));
    assert_eq!(backend.requests().len(), 3);
    assert_eq!(sleeper.delays().len(), 2);
}

#[test]
fn test_max_attempts_of_one_never_retries() {
    let backend = ScriptedBackend::new();
    let (mut tidal, sleeper) = client_with_session(&backend);
    tidal.set_max_attempts(1);

    backend.push_raw(rate_limited(Some("1")));

    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    assert!(matches!(err, ApiError::RetriesExhausted { attempts: 1, .. }));
    assert!(sleeper.delays().is_empty());
}

#[test]
fn test_retry_after_above_cap_is_not_waited() {
    let backend = ScriptedBackend::new();
    let (mut tidal, sleeper) = client_with_session(&backend);

    backend.push_raw(rate_limited(Some("3600")));

    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    match err {
        ApiError::RateLimitTooLong { retry_after, .. } => {
            assert_eq!(retry_after, Duration::from_secs(3600))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(sleeper.delays().is_empty());
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn test_failed_refresh() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);

    backend.push_json(401, EXPIRED);
    backend.push_json(200, r#"{"token_type":"Bearer"}"#);

    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    assert!(matches!(err, ApiError::RefreshFailed));
    assert_eq!(backend.requests().len(), 2);
}

#[test]
fn test_refresh_error_is_returned() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);

    backend.push_json(401, EXPIRED);
    backend.push_json(
        400,
        r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#,
    );

    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    assert_eq!(err.to_string(), "Refresh token revoked");
}

#[test]
fn test_disabled_recovery_propagates() {
    let backend = ScriptedBackend::new();
    let (mut tidal, sleeper) = client_with_session(&backend);
    tidal.set_auto_refresh(false);
    tidal.set_auto_retry(false);

    backend.push_json(401, EXPIRED);
    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    assert!(err.is_token_expired());

    backend.push_raw(rate_limited(Some("1")));
    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    assert!(err.is_rate_limited());

    assert!(sleeper.delays().is_empty());
    assert_eq!(backend.requests().len(), 2);
}

#[test]
fn test_expired_token_without_session_propagates() {
    let backend = ScriptedBackend::new();
    let mut tidal = Tidal::with_transport(transport(&backend));
    tidal.set_access_token("static");

    backend.push_json(401, EXPIRED);
    let err = tidal.album("1", "US", Query::new()).unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 401, .. }));
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn test_other_errors_are_not_retried() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);

    backend.push_json(404, r#"{"errors":[{"status":"404","detail":"Not found"}]}"#);
    let err = tidal.album("missing", "US", Query::new()).unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn test_bearer_token_source() {
    let backend = ScriptedBackend::new();
    let mut tidal = Tidal::with_transport(transport(&backend));
    assert!(tidal.bearer_token().is_none());

    backend.push_json(200, "{}");
    tidal.send(Method::Get, "/users/me", &Params::None).unwrap();
    assert!(bearer(&backend.last_request()).is_none());

    tidal.set_access_token("direct");
    backend.push_json(200, "{}");
    tidal.send(Method::Get, "/users/me", &Params::None).unwrap();
    assert_eq!(bearer(&backend.last_request()), Some("Bearer direct"));

    // setting a session replaces the direct token
    let mut session = common::session(&backend);
    session.set_access_token("from-session");
    tidal.set_session(session);
    assert_eq!(tidal.bearer_token(), Some("from-session"));

    // and the other way round
    tidal.set_access_token("direct-again");
    assert!(tidal.session().is_none());
    assert_eq!(tidal.bearer_token(), Some("direct-again"));
}

#[test]
fn test_country_code_wins_over_options() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);
    backend.push_json(200, ALBUM);

    let options = Query::new()
        .with("countryCode", "DE")
        .include(&["artists", "items"]);
    let document = tidal.album("251380836", "NO", options).unwrap();

    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/albums/251380836?countryCode=NO&include=artists%2Citems"
    );
    let artist = document
        .find_included(&ResourceType::Artists, "4050205")
        .unwrap();
    assert_eq!(artist.display_name(), "Daft Punk");
}

#[test]
fn test_collection_filter_and_relationship_paths() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);

    backend.push_json(200, r#"{"data":[]}"#);
    tidal.tracks(&["1", "2"], "US", Query::new()).unwrap();
    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/tracks?countryCode=US&filter%5Bid%5D=1%2C2"
    );

    backend.push_json(
        200,
        r#"{"data":[{"id":"7","type":"albums"}],"links":{"self":"/artists/1/relationships/albums","next":"/artists/1/relationships/albums?page[cursor]=abc"}}"#,
    );
    let document = tidal.artist_albums("1", "US", Query::new()).unwrap();
    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/artists/1/relationships/albums?countryCode=US"
    );
    assert_eq!(document.identifiers().len(), 1);
    assert_eq!(
        document.next_page(),
        Some("/artists/1/relationships/albums?page[cursor]=abc")
    );

    backend.push_json(200, r#"{"data":null}"#);
    tidal.provider("p1", Query::new()).unwrap();
    assert_eq!(backend.last_request().url, "https://openapi.tidal.com/v2/providers/p1");
}

#[test]
fn test_relationship_methods_next_to_collections() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);

    backend.push_json(200, r#"{"data":[]}"#);
    tidal.artist_roles_relationship("1", "US", Query::new()).unwrap();
    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/artists/1/relationships/roles?countryCode=US"
    );

    backend.push_json(200, r#"{"data":[]}"#);
    tidal.artist_roles(&["1"], Query::new()).unwrap();
    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/artistRoles?filter%5Bid%5D=1"
    );

    backend.push_json(200, r#"{"data":[]}"#);
    tidal.user_entitlements_relationship("u1", Query::new()).unwrap();
    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/users/u1/relationships/entitlements"
    );

    backend.push_json(200, r#"{"data":null}"#);
    tidal.user_recommendations_relationship("u1", Query::new()).unwrap();
    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/users/u1/relationships/recommendations"
    );
}

#[test]
fn test_search_term_is_path_encoded() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);
    backend.push_json(200, r#"{"data":{"id":"daft punk","type":"searchResults","attributes":{"trackingId":"t1"}}}"#);

    let document = tidal.search_artists("daft punk", "US", Query::new()).unwrap();

    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/searchresults/daft%20punk/relationships/artists?countryCode=US"
    );
    match &document.data {
        PrimaryData::One(result) => assert_eq!(result.kind, ResourceType::SearchResults),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_locale_endpoints() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);

    backend.push_json(200, "{}");
    tidal.my_mixes("me", "US", "en-US", Query::new()).unwrap();
    assert_eq!(
        backend.last_request().url,
        "https://openapi.tidal.com/v2/userRecommendations/me/relationships/myMixes?countryCode=US&locale=en-US"
    );

    backend.push_json(200, "{}");
    tidal.me(Query::new()).unwrap();
    assert_eq!(backend.last_request().url, "https://openapi.tidal.com/v2/users/me");
}

#[test]
fn test_typed_request() {
    #[derive(Deserialize)]
    struct Meta {
        total: u32,
    }
    #[derive(Deserialize)]
    struct Body {
        meta: Meta,
    }

    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);
    backend.push_json(200, r#"{"meta":{"total":12}}"#);

    let body: Body = tidal
        .request(Method::Get, "/playlists/me", Query::new().with("countryCode", "US"))
        .unwrap();
    assert_eq!(body.meta.total, 12);
}

#[test]
fn test_custom_options() {
    let backend = ScriptedBackend::new();
    let sleeper = Arc::new(common::RecordingSleeper::default());
    let mut tidal = Tidal::with_transport(transport(&backend)).with_options(ClientOptions {
        max_attempts: 5,
        max_retry_after: Duration::from_secs(10),
        ..Default::default()
    });
    tidal.set_sleeper(sleeper.clone());

    for secs in ["1", "2", "3", "4"] {
        backend.push_raw(rate_limited(Some(secs)));
    }
    backend.push_json(200, "{}");

    tidal.send("GET", "/albums", &Params::None).unwrap();
    assert_eq!(
        sleeper.delays(),
        (1..=4).map(Duration::from_secs).collect::<Vec<_>>()
    );
}

#[test]
fn test_included_resources_without_attributes() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);
    let body = r#"{"data":{"id":"1","type":"albums","attributes":{"title":"Homework"}},"included":[{"id":"9","type":"artworks","relationships":{}}]}"#;
    backend.push_json(200, body);

    let document = tidal.album("1", "US", Query::new()).unwrap();

    assert_eq!(document.resources()[0].display_name(), "Homework");
    assert!(document.find_included(&ResourceType::Artworks, "9").is_some());
    assert_eq!(
        document.source(),
        &serde_json::from_str::<serde_json::Value>(body).unwrap()
    );
}

#[test]
fn test_empty_success_body() {
    let backend = ScriptedBackend::new();
    let (mut tidal, _) = client_with_session(&backend);
    backend.push_raw("HTTP/1.1 204 No Content\r\n\r\n");

    let document = tidal.my_entitlements(Query::new()).unwrap();
    assert!(matches!(document.data, PrimaryData::None));
    assert!(document.source().is_null());
}
