//! Integration tests for the Ollama external scorer
//!
//! Uses wiremock as the Ollama server to verify the availability probe,
//! the rating request shape, and that every failure mode degrades to
//! `ExternalScore::Unavailable` (and from there to heuristics).

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tierroute::config::{Config, OllamaConfig};
use tierroute::router::{
    ClassificationRouter, ExternalScore, ExternalScorer, OllamaScorer, ScoreSource, Tier,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

fn ollama_config(base_url: &str, timeout_ms: u64) -> OllamaConfig {
    OllamaConfig {
        enabled: true,
        base_url: base_url.to_string(),
        model: "qwen2.5:1.5b".to_string(),
        timeout_ms,
    }
}

fn routing_config() -> Config {
    let mut config = Config::default();
    config.models.simple = "small".to_string();
    config.models.medium = "mid".to_string();
    config.models.complex = "big".to_string();
    config
}

async fn mount_rating(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen2.5:1.5b",
            "response": reply,
            "done": true
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_probe_finds_loaded_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama3.2:latest"}, {"name": "qwen2.5:1.5b"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let scorer = OllamaScorer::new(&ollama_config(&server.uri(), 1000)).unwrap();
    assert!(scorer.probe_availability().await);
}

#[tokio::test]
async fn test_probe_rejects_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama3.2:latest"}]
        })))
        .mount(&server)
        .await;

    let scorer = OllamaScorer::new(&ollama_config(&server.uri(), 1000)).unwrap();
    assert!(!scorer.probe_availability().await);
}

#[tokio::test]
async fn test_probe_rejects_error_status_and_garbage() {
    let failing = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&failing)
        .await;
    let scorer = OllamaScorer::new(&ollama_config(&failing.uri(), 1000)).unwrap();
    assert!(!scorer.probe_availability().await);

    let garbage = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&garbage)
        .await;
    let scorer = OllamaScorer::new(&ollama_config(&garbage.uri(), 1000)).unwrap();
    assert!(!scorer.probe_availability().await);
}

#[tokio::test]
async fn test_rating_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "qwen2.5:1.5b",
            "stream": false,
            "options": {"temperature": 0.1}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "8"})))
        .expect(1)
        .mount(&server)
        .await;

    let scorer = OllamaScorer::new(&ollama_config(&server.uri(), 1000)).unwrap();
    let outcome = scorer.classify("Design a cache", &routing_config()).await;

    match outcome {
        ExternalScore::Scored(c) => {
            assert_eq!(c.score, 0.8);
            assert_eq!(c.tier, Tier::Complex);
            assert_eq!(c.model, "big");
            assert_eq!(c.source, ScoreSource::Ollama);
        }
        other => panic!("expected Scored, got {:?}", other),
    }
}

#[tokio::test]
async fn test_prompt_truncated_to_first_1000_chars() {
    let server = MockServer::start().await;
    mount_rating(&server, "5").await;

    let scorer = OllamaScorer::new(&ollama_config(&server.uri(), 1000)).unwrap();
    let long = "Z".repeat(5000);
    scorer.classify(&long, &routing_config()).await;

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["prompt"].as_str().unwrap();
    assert_eq!(prompt.matches('Z').count(), 1000);
}

#[tokio::test]
async fn test_wordy_reply_uses_first_integer() {
    let server = MockServer::start().await;
    mount_rating(&server, "I would rate this a 2 out of 10.").await;

    let scorer = OllamaScorer::new(&ollama_config(&server.uri(), 1000)).unwrap();
    let ExternalScore::Scored(c) = scorer.classify("hi", &routing_config()).await else {
        panic!("expected Scored");
    };
    assert_eq!(c.score, 0.2);
    assert_eq!(c.tier, Tier::Simple);
}

#[tokio::test]
async fn test_reply_without_number_defaults_to_medium() {
    let server = MockServer::start().await;
    mount_rating(&server, "It depends.").await;

    let scorer = OllamaScorer::new(&ollama_config(&server.uri(), 1000)).unwrap();
    let ExternalScore::Scored(c) = scorer.classify("hi", &routing_config()).await else {
        panic!("expected Scored");
    };
    assert_eq!(c.score, 0.5);
    assert_eq!(c.tier, Tier::Medium);
}

#[tokio::test]
async fn test_timeout_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "9"}))
                .set_delay(Duration::from_millis(1000)),
        )
        .mount(&server)
        .await;

    let scorer = OllamaScorer::new(&ollama_config(&server.uri(), 100)).unwrap();
    let outcome = scorer.classify("anything", &routing_config()).await;
    assert!(matches!(outcome, ExternalScore::Unavailable(_)));
}

#[tokio::test]
async fn test_malformed_and_error_responses_are_unavailable() {
    let malformed = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": 1})))
        .mount(&malformed)
        .await;
    let scorer = OllamaScorer::new(&ollama_config(&malformed.uri(), 1000)).unwrap();
    assert!(matches!(
        scorer.classify("x", &routing_config()).await,
        ExternalScore::Unavailable(_)
    ));

    let failing = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&failing)
        .await;
    let scorer = OllamaScorer::new(&ollama_config(&failing.uri(), 1000)).unwrap();
    assert!(matches!(
        scorer.classify("x", &routing_config()).await,
        ExternalScore::Unavailable(_)
    ));
}

#[tokio::test]
async fn test_router_prefers_ollama_and_falls_back() {
    let healthy = MockServer::start().await;
    mount_rating(&healthy, "9").await;
    let config = Arc::new(routing_config());
    let scorer = OllamaScorer::new(&ollama_config(&healthy.uri(), 1000)).unwrap();
    let router = ClassificationRouter::with_external(config.clone(), Arc::new(scorer));

    // Heuristics alone would call this simple
    let result = router.route("What is TypeScript?", None).await;
    assert_eq!(result.source, ScoreSource::Ollama);
    assert_eq!(result.tier, Tier::Complex);

    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;
    let scorer = OllamaScorer::new(&ollama_config(&broken.uri(), 1000)).unwrap();
    let router = ClassificationRouter::with_external(config, Arc::new(scorer));

    let result = router.route("What is TypeScript?", None).await;
    assert_eq!(result.source, ScoreSource::Heuristics);
    assert_eq!(result.tier, Tier::Simple);
}
