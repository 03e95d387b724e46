//! tierroute HTTP server
//!
//! Starts an Axum server that classifies Messages API requests and forwards
//! them to the upstream API with a tier-appropriate model.

use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tierroute::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    router::{ClassificationRouter, OllamaScorer},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Arc::new(Config::load(cli.config.as_deref().map(Path::new))?);
    telemetry::init(&config.observability.log_level);

    let router = if config.ollama.enabled {
        let scorer = OllamaScorer::new(&config.ollama)?;
        if scorer.probe_availability().await {
            ClassificationRouter::with_external(config.clone(), Arc::new(scorer))
        } else {
            ClassificationRouter::new(config.clone())
        }
    } else {
        tracing::info!("Ollama scorer disabled by configuration, using heuristics only");
        ClassificationRouter::new(config.clone())
    };

    tracing::info!(
        simple_model = %config.models.simple,
        medium_model = %config.models.medium,
        complex_model = %config.models.complex,
        simple_threshold = config.routing.simple_threshold,
        complex_threshold = config.routing.complex_threshold,
        force_model = config.routing.force_model.as_deref().unwrap_or(""),
        disabled = config.routing.disabled,
        external_scorer = router.has_external(),
        upstream = %config.upstream.base_url,
        "Routing configured"
    );

    let state = AppState::with_router(config.clone(), router)?;
    let app = handlers::app(state);

    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| format!("Invalid server.host '{}': {}", config.server.host, e))?;
    let addr = SocketAddr::from((ip, config.server.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("Stats available at http://{}/_stats", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
