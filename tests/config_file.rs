//! Integration tests for configuration loading
//!
//! Covers file parsing, validation errors with file context, the generated
//! template, and environment-style overrides.

use std::fs;
use tempfile::TempDir;
use tierroute::cli::generate_config_template;
use tierroute::config::Config;
use tierroute::error::AppError;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("Failed to write config");
    path
}

#[test]
fn test_generated_template_loads_as_valid_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, generate_config_template());

    let config = Config::from_file(&path).expect("template should load");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.routing.simple_threshold, 0.35);
    assert_eq!(config.routing.complex_threshold, 0.65);
    assert!(config.ollama.enabled);
    assert!(!config.observability.verbose);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[models]
simple = "tiny"

[routing]
force_model = "pinned"
"#,
    );

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.models.simple, "tiny");
    assert_eq!(config.models.medium, Config::default().models.medium);
    assert_eq!(config.routing.force_model.as_deref(), Some("pinned"));
    assert_eq!(config.upstream.base_url, "https://api.anthropic.com");
}

#[test]
fn test_missing_file_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, AppError::ConfigFileRead { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[routing\nsimple_threshold = ");

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_inverted_thresholds_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[routing]
simple_threshold = 0.8
complex_threshold = 0.2
"#,
    );

    let err = Config::from_file(&path).unwrap_err();
    match err {
        AppError::ConfigValidationFailed { path: p, .. } => assert!(p.ends_with("config.toml")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_env_overrides_apply_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[models]
complex = "from-file"
"#,
    );

    let mut config = Config::from_file(&path).unwrap();
    config
        .apply_env_overrides(|key| match key {
            "COMPLEX_MODEL" => Some("from-env".to_string()),
            "DISABLED" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.models.complex, "from-env");
    assert!(config.routing.disabled);
}
