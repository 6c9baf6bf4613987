use serde_json::Value;

use crate::{error::ApiError, transport::Headers};

/// Splits a raw HTTP response into its header block and body.
///
/// Interim blocks such as `HTTP/1.1 100 Continue` or a proxy's
/// `HTTP/1.1 200 Connection established` are dropped when another status line
/// follows them, so the returned header block always belongs to the final
/// response.
pub fn split_response(raw: &str) -> (&str, &str) {
    let mut rest = raw;
    loop {
        let Some((head, body)) = split_block(rest) else {
            return (rest, "");
        };
        if is_interim(head) && body.starts_with("HTTP/") {
            rest = body;
            continue;
        }
        return (head, body);
    }
}

/// Numeric status from the status line at the top of a header block.
pub fn status_code(head: &str) -> Option<u16> {
    let line = head.lines().next()?;
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

fn split_block(raw: &str) -> Option<(&str, &str)> {
    let crlf = raw.find("\r\n\r\n").map(|i| (i, 4));
    let lf = raw.find("\n\n").map(|i| (i, 2));
    let (index, len) = match (crlf, lf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((&raw[..index], &raw[index + len..]))
}

fn is_interim(head: &str) -> bool {
    let Some(line) = head.lines().next() else {
        return false;
    };
    let mut parts = line.splitn(3, ' ');
    let (Some(version), Some(code)) = (parts.next(), parts.next()) else {
        return false;
    };
    if !version.starts_with("HTTP/") || code.len() != 3 {
        return false;
    }
    if code.starts_with('1') {
        return true;
    }
    let phrase = parts.next().unwrap_or_default().trim().to_lowercase();
    code == "200" && phrase == "connection established"
}

/// Turns an error response (status >= 400) into a classified [`ApiError`].
///
/// Checked in order: `{"error": {"message", "status"}}`, JSON:API
/// `{"errors": [...]}`, OAuth `{"error_description"}`, any other non-empty
/// body, empty body.
pub fn classify(status: u16, text: &str, body: &Value, headers: Headers) -> ApiError {
    if let Some(error) = body.get("error").filter(|e| e.is_object()) {
        if let (Some(message), Some(error_status)) = (error.get("message"), error.get("status")) {
            return ApiError::Api {
                message: value_text(message),
                status: value_status(error_status).unwrap_or(status),
                reason: error.get("reason").map(value_text),
                headers,
            };
        }
    }

    if let Some(first) = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        if let Some(message) = first.get("detail").or_else(|| first.get("title")) {
            return ApiError::Api {
                message: value_text(message),
                status: first.get("status").and_then(value_status).unwrap_or(status),
                reason: first.get("code").map(value_text),
                headers,
            };
        }
    }

    if let Some(description) = body.get("error_description") {
        return ApiError::AuthFlow {
            message: value_text(description),
            status,
            headers,
        };
    }

    if !text.trim().is_empty() {
        return ApiError::Generic {
            message: text.to_string(),
            status,
            headers,
        };
    }

    ApiError::Unknown { status, headers }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_status(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
