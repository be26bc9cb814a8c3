//! # Configuration Tests
//!
//! Loads `config.yml` files from a temporary directory and checks defaults,
//! `${VAR}` substitution, and `SIGMA_` environment overrides. Tests touching the
//! environment run serially since it is process-global state.

use serial_test::serial;
use sigmascholar_server::auth::FIREBASE_JWKS_URL;
use sigmascholar_server::config::{get_config, AuthMode, ConfigError, QueueBackend};
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const MINIMAL_CONFIG: &str = r#"
auth:
  jwt_secret: "${SIGMA_TEST_JWT_SECRET}"
storage:
  bucket: "sigma.appspot.com"
cleaner:
  provider: "anthropic_default"
providers:
  anthropic_default:
    provider: "anthropic"
    api_key: "k"
    model_name: "claude-test"
firestore:
  project_id: "sigma-test"
queue:
  backend: "pubsub"
  project_id: "sigma-test"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp config file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp config file");
    file
}

fn clear_env_vars() {
    env::remove_var("SIGMA_TEST_JWT_SECRET");
    env::remove_var("SIGMA_QUEUE__BACKEND");
    env::remove_var("SIGMA_CLEANER__MAX_TOKENS");
    env::remove_var("PORT");
}

#[test]
#[serial]
fn test_defaults_are_applied() {
    clear_env_vars();
    let file = write_config(MINIMAL_CONFIG);

    let config = get_config(Some(file.path().to_str().unwrap()))
        .expect("Configuration should load successfully");

    assert_eq!(config.port, 8080);
    assert_eq!(config.storage.api_url, "https://storage.googleapis.com");
    assert_eq!(
        config.partition.api_url,
        "https://api.unstructuredapp.io/general/v0/general"
    );
    assert!((config.cleaner.temperature - 0.1).abs() < f32::EPSILON);
    assert_eq!(config.cleaner.max_tokens, 4000);
    assert_eq!(config.queue.backend, QueueBackend::Pubsub);
    assert_eq!(config.queue.topic, "process-document");
    assert_eq!(config.queue.max_concurrency, 4);
    assert_eq!(config.auth.mode, AuthMode::Firebase);
    assert_eq!(config.auth.jwks_url, FIREBASE_JWKS_URL);
    assert!(config.gcp.metadata_server);
    assert_eq!(config.providers["anthropic_default"].model_name, "claude-test");
}

#[test]
#[serial]
fn test_placeholders_are_substituted_from_env() {
    clear_env_vars();
    env::set_var("SIGMA_TEST_JWT_SECRET", "from-env");
    let file = write_config(MINIMAL_CONFIG);

    let config = get_config(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.auth.jwt_secret, "from-env");

    clear_env_vars();
    let config = get_config(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.auth.jwt_secret, "");
}

#[test]
#[serial]
fn test_prefixed_env_vars_override_nested_keys() {
    clear_env_vars();
    env::set_var("SIGMA_QUEUE__BACKEND", "in_process");
    env::set_var("SIGMA_CLEANER__MAX_TOKENS", "1024");
    env::set_var("PORT", "9191");
    let file = write_config(MINIMAL_CONFIG);

    let config = get_config(Some(file.path().to_str().unwrap())).unwrap();

    assert_eq!(config.queue.backend, QueueBackend::InProcess);
    assert_eq!(config.cleaner.max_tokens, 1024);
    assert_eq!(config.port, 9191);
    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_file_is_not_found() {
    let result = get_config(Some("/definitely/not/here/config.yml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn test_missing_section_is_a_general_error() {
    clear_env_vars();
    let file = write_config("port: 1234\n");

    let result = get_config(Some(file.path().to_str().unwrap()));
    assert!(matches!(result, Err(ConfigError::General(_))));
}

#[test]
#[serial]
fn test_bundled_config_parses() {
    clear_env_vars();
    let config = get_config(None).expect("The bundled config.yml should parse");
    assert_eq!(config.cleaner.provider, "anthropic_default");
    assert!(config.providers.contains_key("local_default"));
}
