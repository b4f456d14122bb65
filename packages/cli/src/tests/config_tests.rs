use crate::config::{Config, ConfigError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashMap;
use std::time::Duration;

fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_config_defaults() {
    let config = config_from(&[]).unwrap();

    assert_eq!(config.port, 4001);
    assert_eq!(config.host.to_string(), "127.0.0.1");
    assert_eq!(config.cors_origin, "http://localhost:5173");
    assert_eq!(config.database.max_connections, 10);
    assert!(config.database.url.ends_with("collector.db"));
    assert!(config.webhook.is_none());
}

#[test]
fn test_config_with_all_custom() {
    let config = config_from(&[
        ("PORT", "3000"),
        ("HOST", "0.0.0.0"),
        ("CORS_ORIGIN", "https://app.example.com"),
        ("DATABASE_URL", "sqlite:/tmp/collector-test.db"),
        ("DATABASE_MAX_CONNECTIONS", "4"),
        ("N8N_WEBHOOK_URL", "https://n8n.example.com/webhook/collector"),
        ("N8N_WEBHOOK_USER", "n8n"),
        ("N8N_WEBHOOK_PASSWORD", "secret"),
        ("WEBHOOK_TIMEOUT_SECS", "5"),
    ])
    .unwrap();

    assert_eq!(config.port, 3000);
    assert_eq!(config.host.to_string(), "0.0.0.0");
    assert_eq!(config.cors_origin, "https://app.example.com");
    assert_eq!(config.database.url, "sqlite:/tmp/collector-test.db");
    assert_eq!(config.database.max_connections, 4);

    let webhook = config.webhook.unwrap();
    assert_eq!(webhook.url, "https://n8n.example.com/webhook/collector");
    assert_eq!(webhook.username.as_deref(), Some("n8n"));
    assert_eq!(webhook.password.as_deref(), Some("secret"));
    assert_eq!(webhook.timeout, Duration::from_secs(5));
}

#[test]
fn test_webhook_defaults() {
    let config = config_from(&[("N8N_WEBHOOK_URL", "http://localhost:5678/webhook/x")]).unwrap();

    let webhook = config.webhook.unwrap();
    assert!(webhook.username.is_none());
    assert_eq!(webhook.timeout, Duration::from_secs(30));
}

#[test]
fn test_empty_webhook_url_disables_trigger() {
    let config = config_from(&[("N8N_WEBHOOK_URL", "")]).unwrap();
    assert!(config.webhook.is_none());
}

#[test]
fn test_config_invalid_port() {
    let result = config_from(&[("PORT", "not-a-number")]);
    assert!(matches!(result.unwrap_err(), ConfigError::InvalidPort(_)));
}

#[test]
fn test_config_port_zero() {
    let result = config_from(&[("PORT", "0")]);
    assert!(matches!(result.unwrap_err(), ConfigError::PortOutOfRange(0)));
}

#[test]
fn test_config_invalid_host() {
    let result = config_from(&[("HOST", "localhost:80")]);
    assert!(matches!(result.unwrap_err(), ConfigError::InvalidHost(_)));
}

#[rstest]
#[case("DATABASE_MAX_CONNECTIONS", "0")]
#[case("DATABASE_MAX_CONNECTIONS", "many")]
#[case("WEBHOOK_TIMEOUT_SECS", "-1")]
#[case("WEBHOOK_TIMEOUT_SECS", "0")]
fn test_invalid_numeric_values(#[case] key: &str, #[case] value: &str) {
    let result = config_from(&[
        ("N8N_WEBHOOK_URL", "http://localhost:5678/webhook/x"),
        (key, value),
    ]);

    match result.unwrap_err() {
        ConfigError::InvalidValue { key: k, value: v } => {
            assert_eq!(k, key);
            assert_eq!(v, value);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
