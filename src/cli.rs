//! Command-line interface for tierroute
//!
//! Provides argument parsing and subcommand handling for the tierroute binary.

use clap::{Parser, Subcommand};

/// Complexity-aware model tier router for the Messages API
#[derive(Parser)]
#[command(name = "tierroute")]
#[command(version)]
#[command(about = "Complexity-aware model tier router for the Messages API")]
#[command(
    long_about = "tierroute sits in front of the upstream Messages API, scores each \
    request's complexity and rewrites the model field to a cheaper tier when the \
    prompt is simple enough."
)]
pub struct Cli {
    /// Path to a TOML configuration file (defaults plus environment when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
///
/// Every value equals the built-in default, so the template loads as a valid
/// configuration unchanged.
pub fn generate_config_template() -> &'static str {
    r#"# tierroute configuration
#
# Values below are the built-in defaults. Environment variables override
# file values: HOST, PORT, UPSTREAM_URL, SIMPLE_MODEL, MEDIUM_MODEL,
# COMPLEX_MODEL, SIMPLE_THRESHOLD, COMPLEX_THRESHOLD, FORCE_MODEL, DISABLED,
# VERBOSE, OLLAMA_ENABLED, OLLAMA_URL, OLLAMA_MODEL, OLLAMA_TIMEOUT_MS,
# LOG_LEVEL.

[server]
host = "0.0.0.0"
port = 8080

[upstream]
# Requests go to {base_url}/v1/messages
base_url = "https://api.anthropic.com"
connect_timeout_seconds = 10

[models]
simple = "claude-3-5-haiku-20241022"
medium = "claude-sonnet-4-20250514"
# Requests naming this model (or any "opus" model) count as top tier
complex = "claude-opus-4-20250514"

[routing]
# score < simple_threshold              -> simple
# simple_threshold <= score < complex   -> medium
# score >= complex_threshold            -> complex
simple_threshold = 0.35
complex_threshold = 0.65
# Send everything to one model, skipping classification
# force_model = "claude-sonnet-4-20250514"
# Keep the client's model untouched
disabled = false

[ollama]
# Local model scorer; probed once at startup, heuristics used otherwise
enabled = true
base_url = "http://localhost:11434"
model = "qwen2.5:1.5b"
timeout_ms = 5000

[observability]
log_level = "info"
# Log full prompt text for every routed request
verbose = false
"#
}
