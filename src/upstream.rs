//! Upstream API client
//!
//! Sends rewritten `/v1/messages` bodies to the upstream API and relays
//! arbitrary requests for the pass-through forwarder. Requests are never
//! retried; the only timeout is the connect timeout.

use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, header};
use futures::TryStreamExt;
use serde_json::Value;
use std::time::Duration;

/// Client headers copied onto `/v1/messages` requests
pub const FORWARDED_HEADERS: [&str; 4] = [
    "x-api-key",
    "authorization",
    "anthropic-version",
    "anthropic-beta",
];

/// Connection-scoped headers that must not cross a proxy hop
static HOP_BY_HOP_HEADERS: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Successful upstream reply
pub enum UpstreamOutcome {
    /// Complete JSON body, object keys in upstream order
    Buffered { status: StatusCode, body: Value },
    /// Byte stream relayed in arrival order
    Streaming { status: StatusCode, body: Body },
}

impl std::fmt::Debug for UpstreamOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered { status, body } => f
                .debug_struct("Buffered")
                .field("status", status)
                .field("body", body)
                .finish(),
            Self::Streaming { status, .. } => f
                .debug_struct("Streaming")
                .field("status", status)
                .finish_non_exhaustive(),
        }
    }
}

/// HTTP client for the upstream API
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Build a client from the `[upstream]` configuration section
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::Internal(format!("Failed to build upstream HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `{base_url}/v1/messages`
    ///
    /// Only the headers in [`FORWARDED_HEADERS`] are copied from the client.
    /// A 2xx reply is relayed as a byte stream when `body.stream` is `true`,
    /// otherwise decoded as JSON.
    ///
    /// # Errors
    ///
    /// - Transport or decode failure: [`AppError::Upstream`] with the status
    ///   reqwest reports, or 500
    /// - Non-2xx reply: [`AppError::Upstream`] with the upstream status and
    ///   its `error.message` (or the raw body text)
    pub async fn send_messages(&self, body: &Value, headers: &HeaderMap) -> AppResult<UpstreamOutcome> {
        let url = format!("{}/v1/messages", self.base_url);
        let streaming = body.get("stream").and_then(Value::as_bool) == Some(true);

        let mut request = self.client.post(&url).json(body);
        for name in FORWARDED_HEADERS {
            if let Some(value) = headers.get(name) {
                request = request.header(name, value.clone());
            }
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Upstream request failed");
            AppError::from_transport(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = upstream_error_message(status, &text);
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                message = %message,
                "Upstream returned error status"
            );
            return Err(AppError::Upstream { status, message });
        }

        if streaming {
            let stream_url = url.clone();
            let stream = response.bytes_stream().inspect_err(move |e| {
                tracing::warn!(url = %stream_url, error = %e, "Upstream stream interrupted");
            });
            return Ok(UpstreamOutcome::Streaming {
                status,
                body: Body::from_stream(stream),
            });
        }

        let body = response.json::<Value>().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Upstream returned undecodable body");
            AppError::from_transport(&e)
        })?;

        Ok(UpstreamOutcome::Buffered { status, body })
    }

    /// Relay an arbitrary request to the same path on the upstream API
    ///
    /// `path_and_query` must start with `/`. Hop-by-hop headers and `host`
    /// are dropped; everything else is forwarded unchanged.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path_and_query);

        let mut outgoing = strip_hop_by_hop(headers);
        outgoing.remove(header::HOST);
        outgoing.remove(header::CONTENT_LENGTH);

        self.client
            .request(method, &url)
            .headers(outgoing)
            .body(body)
            .send()
            .await
    }
}

/// Copy `headers` without connection-scoped entries
///
/// Names listed in a `Connection` header are dropped as well.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut out = headers.clone();
    for name in &HOP_BY_HOP_HEADERS {
        out.remove(name);
    }
    for name in listed {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            out.remove(name);
        }
    }
    out
}

/// Human-readable message for a non-2xx upstream reply
///
/// Prefers the upstream's `error.message`, then the raw body text, then the
/// status reason.
pub fn upstream_error_message(status: StatusCode, text: &str) -> String {
    let from_json = serde_json::from_str::<Value>(text).ok().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if !text.trim().is_empty() => text.to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("upstream error")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_error_message_prefers_json_message() {
        let text = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(
            upstream_error_message(StatusCode::SERVICE_UNAVAILABLE, text),
            "Overloaded"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_text() {
        assert_eq!(
            upstream_error_message(StatusCode::BAD_GATEWAY, "bad gateway from lb"),
            "bad gateway from lb"
        );
        // JSON without error.message is still surfaced verbatim
        assert_eq!(
            upstream_error_message(StatusCode::BAD_REQUEST, r#"{"detail":"x"}"#),
            r#"{"detail":"x"}"#
        );
    }

    #[test]
    fn test_error_message_empty_body_uses_reason() {
        assert_eq!(
            upstream_error_message(StatusCode::TOO_MANY_REQUESTS, ""),
            "Too Many Requests"
        );
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close, x-trace"));
        headers.insert("x-trace", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("x-api-key", HeaderValue::from_static("sk-test"));

        let out = strip_hop_by_hop(&headers);
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("x-trace").is_none());
        assert!(out.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(out.get("x-api-key").unwrap(), "sk-test");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = UpstreamConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }
}
