#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use tidlcli::{ApiError, HttpBackend, HttpRequest, Session, Sleeper, Tidal, Transport, types::ClientCredentials};

/// Backend that replays canned raw responses and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, ApiError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_raw(&self, raw: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(raw.into()));
    }

    pub fn push_json(&self, status: u16, body: &str) {
        self.push_raw(json_response(status, &[], body));
    }

    pub fn push_error(&self, err: ApiError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl HttpBackend for ScriptedBackend {
    fn execute(&self, request: &HttpRequest) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }
}

/// Sleeper that only records the requested delays.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn json_response(status: u16, headers: &[(&str, &str)], body: &str) -> String {
    let mut raw = format!("HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\n");
    for (key, value) in headers {
        raw.push_str(&format!("{key}: {value}\r\n"));
    }
    raw.push_str("\r\n");
    raw.push_str(body);
    raw
}

pub fn transport(backend: &Arc<ScriptedBackend>) -> Transport {
    Transport::with_backend(backend.clone())
}

pub fn credentials() -> ClientCredentials {
    ClientCredentials::new("client-id")
        .with_secret("client-secret")
        .with_redirect_uri("http://127.0.0.1:8080/callback")
}

pub fn session(backend: &Arc<ScriptedBackend>) -> Session {
    Session::with_transport(credentials(), transport(backend))
}

/// Client with a session holding `access`/`refresh` and a recording sleeper.
pub fn client_with_session(backend: &Arc<ScriptedBackend>) -> (Tidal, Arc<RecordingSleeper>) {
    let mut session = session(backend);
    session.set_access_token("old-access");
    session.set_refresh_token("refresh-1");

    let sleeper = Arc::new(RecordingSleeper::default());
    let mut tidal = Tidal::with_transport(transport(backend)).with_session(session);
    tidal.set_sleeper(sleeper.clone());
    (tidal, sleeper)
}
