//! Pass-through forwarder
//!
//! Relays any request the proxy does not handle itself to the same path on
//! the upstream API, unchanged apart from hop-by-hop headers.

use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::upstream::strip_hop_by_hop;
use axum::{
    Extension, Json,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};

/// Fallback handler for unmatched routes and methods
///
/// Returns 502 with `{"error": ...}` when the upstream cannot be reached.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path_and_query,
        "Forwarding unrouted request upstream"
    );

    let upstream = match state
        .upstream()
        .forward(method, path_and_query, &headers, body)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                path = %path_and_query,
                error = %e,
                "Pass-through request failed"
            );
            state
                .metrics()
                .record_upstream_failure(StatusCode::BAD_GATEWAY.as_u16());
            return (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": format!("Upstream unreachable: {}", e) })),
            )
                .into_response();
        }
    };

    let status = upstream.status();
    let mut response_headers = strip_hop_by_hop(upstream.headers());
    response_headers.remove(header::CONTENT_LENGTH);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    response
}
