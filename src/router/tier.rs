//! Score → tier/model mapping shared by every scorer

use super::Tier;
use crate::config::Config;

/// Model and tier chosen for a score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSelection {
    pub model: String,
    pub tier: Tier,
}

/// Map a complexity score onto a routing tier
///
/// Half-open intervals: `[0, simple)` → simple, `[simple, complex)` → medium,
/// `[complex, 1]` → complex. A score exactly on a threshold belongs to the
/// upper tier.
pub fn map_to_tier(score: f64, config: &Config) -> TierSelection {
    let routing = &config.routing;
    let models = &config.models;

    if score < routing.simple_threshold {
        TierSelection {
            model: models.simple.clone(),
            tier: Tier::Simple,
        }
    } else if score < routing.complex_threshold {
        TierSelection {
            model: models.medium.clone(),
            tier: Tier::Medium,
        }
    } else {
        TierSelection {
            model: models.complex.clone(),
            tier: Tier::Complex,
        }
    }
}
