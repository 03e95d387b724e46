//! Process-lifetime routing statistics
//!
//! Counters are atomics so concurrent handlers can record without locking.
//! There is no reset; counters live until the process exits.

use crate::router::{Classification, Tier};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Routing counters shared by all handlers
#[derive(Debug, Default)]
pub struct Stats {
    total: AtomicU64,
    routed_simple: AtomicU64,
    routed_medium: AtomicU64,
    routed_complex: AtomicU64,
    saved: AtomicU64,
}

/// Point-in-time copy of [`Stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub routed_simple: u64,
    pub routed_medium: u64,
    pub routed_complex: u64,
    pub saved: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed classification
    ///
    /// Forced and passthrough classifications count toward `total` only.
    /// `saved` marks a downgrade away from the top-tier model.
    pub fn record(&self, classification: &Classification, saved: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);

        let bucket = match classification.tier {
            Tier::Simple => Some(&self.routed_simple),
            Tier::Medium => Some(&self.routed_medium),
            Tier::Complex => Some(&self.routed_complex),
            Tier::Forced | Tier::Passthrough => None,
        };
        if let Some(counter) = bucket {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        if saved {
            self.saved.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            routed_simple: self.routed_simple.load(Ordering::Relaxed),
            routed_medium: self.routed_medium.load(Ordering::Relaxed),
            routed_complex: self.routed_complex.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
        }
    }
}
