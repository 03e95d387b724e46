//! tierroute - complexity-aware model tier router
//!
//! This library classifies Messages API requests by prompt complexity and
//! rewrites the requested model to a cheaper tier when the prompt allows it,
//! using a local model scorer when available and deterministic heuristics
//! otherwise.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod stats;
pub mod telemetry;
pub mod upstream;
