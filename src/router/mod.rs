//! Classification and routing logic for tierroute
//!
//! Decides which model tier a prompt should be sent to. The
//! [`ClassificationRouter`] tries the external scorer first when one is
//! available and always falls back to the heuristic scorer, so routing never
//! fails.

pub mod heuristic;
pub mod ollama;
pub mod patterns;
pub mod tier;

pub use ollama::{ExternalScore, ExternalScorer, OllamaScorer};
pub use tier::{TierSelection, map_to_tier};

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Routing bucket a request falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Simple,
    Medium,
    Complex,
    /// Scoring skipped, model set by `routing.force_model`
    Forced,
    /// Routing disabled, client's model kept
    Passthrough,
}

impl Tier {
    /// Convert to string representation for logging and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
            Self::Forced => "forced",
            Self::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which component produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Heuristics,
    Ollama,
    Forced,
    None,
}

impl ScoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristics => "heuristics",
            Self::Ollama => "ollama",
            Self::Forced => "forced",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one request
///
/// Built fresh per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Complexity score in [0,1]
    pub score: f64,
    pub tier: Tier,
    /// Model the request will be sent to
    pub model: String,
    pub source: ScoreSource,
}

/// Routes prompts to model tiers
///
/// Holds the external scorer only when its startup probe succeeded; the probe
/// is never repeated, so a scorer that comes up later is ignored until
/// restart.
pub struct ClassificationRouter {
    config: Arc<Config>,
    external: Option<Arc<dyn ExternalScorer>>,
}

impl ClassificationRouter {
    /// Create a router that only uses the heuristic scorer
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            external: None,
        }
    }

    /// Create a router that tries `scorer` before the heuristic scorer
    pub fn with_external(config: Arc<Config>, scorer: Arc<dyn ExternalScorer>) -> Self {
        Self {
            config,
            external: Some(scorer),
        }
    }

    /// Whether an external scorer is in use
    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Classify `prompt` and choose a model
    ///
    /// # Routing Logic
    /// 1. `routing.force_model` set → forced tier, no scoring
    /// 2. `routing.disabled` → passthrough with `original_model`
    /// 3. External scorer available → use its classification if it scores
    /// 4. Otherwise heuristic score through the tier thresholds
    ///
    /// Always returns a classification.
    pub async fn route(&self, prompt: &str, original_model: Option<&str>) -> Classification {
        if let Some(forced) = &self.config.routing.force_model {
            return Classification {
                score: 0.0,
                tier: Tier::Forced,
                model: forced.clone(),
                source: ScoreSource::Forced,
            };
        }

        if self.config.routing.disabled {
            return Classification {
                score: 0.0,
                tier: Tier::Passthrough,
                model: original_model.unwrap_or_default().to_string(),
                source: ScoreSource::None,
            };
        }

        if let Some(scorer) = &self.external {
            match scorer.classify(prompt, &self.config).await {
                ExternalScore::Scored(classification) => return classification,
                ExternalScore::Unavailable(reason) => {
                    tracing::warn!(
                        scorer = scorer.name(),
                        reason = %reason,
                        "External scorer failed, falling back to heuristics"
                    );
                }
            }
        }

        self.heuristic(prompt)
    }

    fn heuristic(&self, prompt: &str) -> Classification {
        let score = heuristic::score(prompt);
        let selection = map_to_tier(score, &self.config);
        Classification {
            score,
            tier: selection.tier,
            model: selection.model,
            source: ScoreSource::Heuristics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedScorer {
        outcome: ExternalScore,
        calls: AtomicUsize,
    }

    impl FixedScorer {
        fn new(outcome: ExternalScore) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ExternalScorer for FixedScorer {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _text: &str, _config: &Config) -> ExternalScore {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.models.simple = "small".to_string();
        config.models.medium = "mid".to_string();
        config.models.complex = "big".to_string();
        config
    }

    #[tokio::test]
    async fn test_heuristic_only_router() {
        let router = ClassificationRouter::new(Arc::new(config()));
        let result = router.route("What is TypeScript?", Some("big")).await;
        assert_eq!(result.tier, Tier::Simple);
        assert_eq!(result.model, "small");
        assert_eq!(result.source, ScoreSource::Heuristics);
    }

    #[tokio::test]
    async fn test_force_model_skips_scoring() {
        let mut config = config();
        config.routing.force_model = Some("pinned".to_string());
        let scorer = FixedScorer::new(ExternalScore::Unavailable("unused".to_string()));
        let router = ClassificationRouter::with_external(Arc::new(config), scorer.clone());

        let result = router.route("Architect a distributed system", None).await;
        assert_eq!(result.tier, Tier::Forced);
        assert_eq!(result.source, ScoreSource::Forced);
        assert_eq!(result.model, "pinned");
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_force_wins_over_disabled() {
        let mut config = config();
        config.routing.force_model = Some("pinned".to_string());
        config.routing.disabled = true;
        let router = ClassificationRouter::new(Arc::new(config));

        let result = router.route("hi", Some("orig")).await;
        assert_eq!(result.tier, Tier::Forced);
    }

    #[tokio::test]
    async fn test_disabled_keeps_original_model() {
        let mut config = config();
        config.routing.disabled = true;
        let router = ClassificationRouter::new(Arc::new(config));

        let result = router.route("anything", Some("client-model")).await;
        assert_eq!(result.tier, Tier::Passthrough);
        assert_eq!(result.source, ScoreSource::None);
        assert_eq!(result.model, "client-model");
    }

    #[tokio::test]
    async fn test_disabled_without_original_model_is_empty() {
        let mut config = config();
        config.routing.disabled = true;
        let router = ClassificationRouter::new(Arc::new(config));

        let result = router.route("anything", None).await;
        assert_eq!(result.model, "");
    }

    #[tokio::test]
    async fn test_external_result_used_when_scored() {
        let scored = Classification {
            score: 0.9,
            tier: Tier::Complex,
            model: "big".to_string(),
            source: ScoreSource::Ollama,
        };
        let scorer = FixedScorer::new(ExternalScore::Scored(scored.clone()));
        let router = ClassificationRouter::with_external(Arc::new(config()), scorer.clone());

        let result = router.route("What is TypeScript?", None).await;
        assert_eq!(result, scored);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_external_unavailable_falls_back_to_heuristics() {
        let scorer = FixedScorer::new(ExternalScore::Unavailable("timeout".to_string()));
        let router = ClassificationRouter::with_external(Arc::new(config()), scorer.clone());

        let result = router.route("What is TypeScript?", None).await;
        assert_eq!(result.source, ScoreSource::Heuristics);
        assert_eq!(result.tier, Tier::Simple);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_classified() {
        let router = ClassificationRouter::new(Arc::new(config()));
        let result = router.route("", None).await;
        assert!((0.0..=1.0).contains(&result.score));
        assert!(matches!(
            result.tier,
            Tier::Simple | Tier::Medium | Tier::Complex
        ));
    }

    #[test]
    fn test_tier_serde() {
        assert_eq!(serde_json::to_string(&Tier::Passthrough).unwrap(), r#""passthrough""#);
        assert_eq!(
            serde_json::from_str::<Tier>(r#""medium""#).unwrap(),
            Tier::Medium
        );
    }

    #[test]
    fn test_source_as_str() {
        assert_eq!(ScoreSource::Heuristics.as_str(), "heuristics");
        assert_eq!(ScoreSource::Ollama.as_str(), "ollama");
        assert_eq!(ScoreSource::Forced.as_str(), "forced");
        assert_eq!(ScoreSource::None.as_str(), "none");
    }
}
