//! Messages endpoint handler
//!
//! Handles POST /v1/messages: classifies the last user message, rewrites the
//! `model` field and forwards the request upstream.

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::handlers::prompt::extract_prompt;
use crate::middleware::RequestId;
use crate::router::{Classification, Tier};
use crate::upstream::UpstreamOutcome;
use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::time::Instant;

/// POST /v1/messages handler
///
/// # Latency
///
/// - Heuristic classification: sub-millisecond
/// - External scorer: up to `ollama.timeout_ms`, then heuristic fallback
/// - Upstream call: unbounded apart from the connect timeout
///
/// # Errors
///
/// - 400 if the body is not a JSON object
/// - upstream status (or 500) if the upstream call fails
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let mut body: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("request body is not valid JSON: {}", e)))?;
    if !body.is_object() {
        return Err(AppError::Validation(
            "request body must be a JSON object".to_string(),
        ));
    }

    let prompt = extract_prompt(&body);
    let original_model = body
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_string);

    let started = Instant::now();
    let classification = state
        .router()
        .route(&prompt, original_model.as_deref())
        .await;
    let classification_ms = started.elapsed().as_secs_f64() * 1000.0;

    let models = &state.config().models;
    let saved = original_model
        .as_deref()
        .is_some_and(|original| models.is_top_tier(original))
        && !models.is_top_tier(&classification.model);

    state.stats().record(&classification, saved);
    record_classification_metrics(&state, &classification, classification_ms, saved, request_id);

    tracing::info!(
        request_id = %request_id,
        tier = %classification.tier,
        source = %classification.source,
        score = classification.score,
        original_model = original_model.as_deref().unwrap_or(""),
        model = %classification.model,
        saved,
        classification_ms,
        "Routed request"
    );
    if state.config().observability.verbose {
        tracing::info!(request_id = %request_id, prompt = %prompt, "Classified prompt");
    }

    // passthrough leaves the body exactly as the client sent it
    if classification.tier != Tier::Passthrough
        && let Some(fields) = body.as_object_mut()
    {
        fields.insert(
            "model".to_string(),
            Value::String(classification.model.clone()),
        );
    }

    let outcome = match state.upstream().send_messages(&body, &headers).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let AppError::Upstream { status, .. } = &e {
                state.metrics().record_upstream_failure(status.as_u16());
            }
            tracing::warn!(request_id = %request_id, error = %e, "Upstream call failed");
            return Err(e);
        }
    };

    Ok(match outcome {
        UpstreamOutcome::Buffered { status, body } => (status, Json(body)).into_response(),
        UpstreamOutcome::Streaming { status, body } => {
            let mut response = Response::new(body);
            *response.status_mut() = status;
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/event-stream"),
            );
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
            response
        }
    })
}

/// Record classification metrics without failing the request
fn record_classification_metrics(
    state: &AppState,
    classification: &Classification,
    duration_ms: f64,
    saved: bool,
    request_id: RequestId,
) {
    let metrics = state.metrics();

    if let Err(e) = metrics.record_request(classification.tier, classification.source) {
        metrics.metrics_recording_failure("record_request");
        tracing::error!(
            request_id = %request_id,
            error = %e,
            tier = %classification.tier,
            source = %classification.source,
            "Failed to record request metric"
        );
    }

    if let Err(e) = metrics.record_classification_duration(classification.source, duration_ms) {
        metrics.metrics_recording_failure("record_classification_duration");
        tracing::error!(
            request_id = %request_id,
            error = %e,
            duration_ms,
            "Failed to record classification duration metric"
        );
    }

    if saved {
        metrics.record_downgrade();
    }
}
