//! Routing statistics endpoint

use crate::handlers::AppState;
use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: u64,
    pub routed: RoutedCounts,
    pub saved: u64,
    pub config: StatsConfig,
}

#[derive(Debug, Serialize)]
pub struct RoutedCounts {
    pub simple: u64,
    pub medium: u64,
    pub complex: u64,
}

/// Routing configuration echoed next to the counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsConfig {
    pub simple_model: String,
    pub medium_model: String,
    pub complex_model: String,
    pub thresholds: Thresholds,
}

#[derive(Debug, Serialize)]
pub struct Thresholds {
    pub simple: f64,
    pub complex: f64,
}

/// GET /_stats handler
pub async fn handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.stats().snapshot();
    let config = state.config();

    Json(StatsResponse {
        total: snapshot.total,
        routed: RoutedCounts {
            simple: snapshot.routed_simple,
            medium: snapshot.routed_medium,
            complex: snapshot.routed_complex,
        },
        saved: snapshot.saved,
        config: StatsConfig {
            simple_model: config.models.simple.clone(),
            medium_model: config.models.medium.clone(),
            complex_model: config.models.complex.clone(),
            thresholds: Thresholds {
                simple: config.routing.simple_threshold,
                complex: config.routing.complex_threshold,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_stats_shape() {
        let state = AppState::new(Config::default()).unwrap();
        let Json(response) = handler(State(state)).await;
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["total"], 0);
        assert_eq!(value["routed"]["simple"], 0);
        assert_eq!(value["saved"], 0);
        assert_eq!(value["config"]["simpleModel"], Config::default().models.simple);
        assert_eq!(value["config"]["thresholds"]["simple"], 0.35);
        assert_eq!(value["config"]["thresholds"]["complex"], 0.65);
    }
}
