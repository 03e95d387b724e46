//! External complexity scorer backed by a local Ollama server
//!
//! Asks a small locally hosted model for a 1-10 complexity rating and maps
//! the normalized rating through the same tier thresholds as the heuristic
//! scorer. Any failure (timeout, transport error, non-2xx, malformed body)
//! becomes [`ExternalScore::Unavailable`] so the caller can fall back.

use super::tier::map_to_tier;
use super::{Classification, ScoreSource};
use crate::config::{Config, OllamaConfig};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// Number of prompt characters embedded in the rating request
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Rating used when the model answers without any number
const DEFAULT_RATING: u32 = 5;

static FIRST_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("integer regex is valid"));

/// Outcome of an external scoring attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalScore {
    /// The scorer produced a classification
    Scored(Classification),
    /// The scorer could not produce a classification; the reason is for logs
    Unavailable(String),
}

/// Trait for external (model-backed) complexity scorers
///
/// Allows dependency injection of different scorer implementations,
/// enabling router tests with doubles that make no network calls.
#[async_trait]
pub trait ExternalScorer: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Classify `text`; must never panic or block past its own timeout
    async fn classify(&self, text: &str, config: &Config) -> ExternalScore;
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama-backed scorer
pub struct OllamaScorer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaScorer {
    /// Create a scorer from the `[ollama]` configuration section
    ///
    /// Returns an error only if the HTTP client cannot be built.
    pub fn new(config: &OllamaConfig) -> AppResult<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build Ollama HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout,
        })
    }

    /// Check once whether the server is reachable and the model is loaded
    ///
    /// Any network or parse failure yields `false`. The caller caches the
    /// result for the process lifetime; there is no retry.
    pub async fn probe_availability(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::info!(
                    url = %url,
                    status = %r.status(),
                    "Ollama probe returned non-success status, external scorer disabled"
                );
                return false;
            }
            Err(e) => {
                tracing::info!(
                    url = %url,
                    error = %e,
                    "Ollama not reachable, external scorer disabled"
                );
                return false;
            }
        };

        let tags: TagsResponse = match response.json().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    error = %e,
                    "Ollama probe returned malformed model list, external scorer disabled"
                );
                return false;
            }
        };

        let available = tags
            .models
            .iter()
            .any(|entry| model_matches(&entry.name, &self.model));

        if available {
            tracing::info!(model = %self.model, "Ollama scorer available");
        } else {
            tracing::info!(
                model = %self.model,
                loaded_models = tags.models.len(),
                "Ollama reachable but model not loaded, external scorer disabled"
            );
        }
        available
    }

    async fn request_rating(&self, text: &str) -> Result<u32, String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": build_rating_prompt(text),
            "stream": false,
            "options": {
                "temperature": 0.1,
                "num_predict": 10,
            },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("timed out after {}ms", self.timeout.as_millis())
                } else {
                    format!("transport error: {}", e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("non-success status {}", status));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed response: {}", e))?;

        Ok(parse_rating(&parsed.response))
    }
}

#[async_trait]
impl ExternalScorer for OllamaScorer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn classify(&self, text: &str, config: &Config) -> ExternalScore {
        match self.request_rating(text).await {
            Ok(rating) => {
                let score = f64::from(rating) / 10.0;
                let selection = map_to_tier(score, config);
                tracing::debug!(
                    rating,
                    score,
                    tier = %selection.tier,
                    "Ollama rated prompt complexity"
                );
                ExternalScore::Scored(Classification {
                    score,
                    tier: selection.tier,
                    model: selection.model,
                    source: ScoreSource::Ollama,
                })
            }
            Err(reason) => ExternalScore::Unavailable(reason),
        }
    }
}

/// Whether a loaded model name satisfies the configured one
///
/// `qwen2.5` matches `qwen2.5:latest`; `qwen2.5:1.5b` matches only itself.
fn model_matches(loaded: &str, wanted: &str) -> bool {
    if loaded == wanted {
        return true;
    }
    !wanted.contains(':') && loaded.split(':').next() == Some(wanted)
}

/// Build the rating instruction around the first [`MAX_PROMPT_CHARS`] characters
pub fn build_rating_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    format!(
        "Rate the complexity of the following request on a scale from 1 to 10.\n\
         1-3: simple (greetings, factual lookups, definitions, short questions)\n\
         4-6: moderate (small functions, explanations, comparisons, debugging a snippet)\n\
         7-10: complex (system design, architecture, multi-step reasoning, large refactors)\n\
         \n\
         Request:\n\
         {}\n\
         \n\
         Respond with a single number only.",
        excerpt
    )
}

/// Extract the first integer of a model reply, clamped to 10
pub fn parse_rating(reply: &str) -> u32 {
    FIRST_INTEGER_RE
        .find(reply)
        .map_or(DEFAULT_RATING, |m| {
            // digit runs too long for u32 are far off the scale
            m.as_str().parse::<u32>().unwrap_or(u32::MAX).min(10)
        })
}
