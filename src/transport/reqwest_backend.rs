use std::{fmt::Write, time::Duration};

use reqwest::blocking::Client;

use crate::{
    error::{ApiError, TransportErrorKind},
    transport::{HttpBackend, HttpRequest},
};

/// Blocking [`HttpBackend`] on top of `reqwest`.
///
/// The response is rendered back into raw HTTP text so the transport can
/// parse it the same way as for any other backend.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: Client,
}

impl ReqwestBackend {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Backend with explicit connect and overall request timeouts.
    pub fn with_timeouts(connect: Duration, request: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .build()
            .map_err(transport_error)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpBackend for ReqwestBackend {
    fn execute(&self, request: &HttpRequest) -> Result<String, ApiError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
            ApiError::Transport {
                kind: TransportErrorKind::Request,
                message: e.to_string(),
            }
        })?;

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(transport_error)?;

        let mut raw = String::new();
        let _ = write!(raw, "{:?} {}\r\n", response.version(), response.status());
        for (name, value) in response.headers() {
            let _ = write!(
                raw,
                "{}: {}\r\n",
                name,
                String::from_utf8_lossy(value.as_bytes())
            );
        }
        raw.push_str("\r\n");
        raw.push_str(&response.text().map_err(transport_error)?);

        Ok(raw)
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else if err.is_redirect() {
        TransportErrorKind::Redirect
    } else if err.is_body() || err.is_decode() {
        TransportErrorKind::Body
    } else if err.is_request() || err.is_builder() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    };

    ApiError::Transport {
        kind,
        message: err.to_string(),
    }
}
