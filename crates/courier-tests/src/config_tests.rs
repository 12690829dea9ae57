use courier_core::{ConsoleConfig, ParseErrorPolicy, TraceConfig};
use courier_sdk::{CourierClient, ReaderOptions};
use tempfile::TempDir;

/// Write `contents` to `courier.toml` inside a scratch dir removed on drop.
fn temp_config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("courier.toml");
    std::fs::write(&path, contents).expect("write temp config");
    (dir, path)
}

#[test]
fn test_console_config_defaults() {
    let config = ConsoleConfig::default();
    assert_eq!(config.api_url, "http://localhost:8000");
    assert!(config.credentials_path.is_none());
    assert_eq!(config.trace.path, "/admin/trace");
}

#[test]
fn test_trace_config_defaults() {
    let config = TraceConfig::default();
    assert_eq!(config.channel_capacity, 64);
    assert_eq!(config.connect_timeout_secs, 10);
    assert_eq!(config.on_parse_error, ParseErrorPolicy::Terminate);
    assert_eq!(config.max_reconnect_attempts, 5);
}

#[test]
fn test_config_load_missing_file() {
    // A missing file falls back to defaults + env.
    let result = ConsoleConfig::load(Some("/nonexistent/path/courier.toml"));
    assert!(result.is_ok(), "Should not fail with missing config file");
    let config = result.unwrap();
    assert_eq!(config.trace.channel_capacity, 64);
}

#[test]
fn test_config_load_from_file() {
    let (_dir, path) = temp_config(
        r#"
api_url = "https://chat.example.com/"

[trace]
channel_capacity = 8
on_parse_error = "skip"
"#,
    );

    let config = ConsoleConfig::load(path.to_str()).unwrap();

    assert_eq!(config.api_url, "https://chat.example.com/");
    assert_eq!(config.trace.channel_capacity, 8);
    assert_eq!(config.trace.on_parse_error, ParseErrorPolicy::Skip);
    // Unset keys keep their defaults.
    assert_eq!(config.trace.path, "/admin/trace");
    assert_eq!(config.trace.connect_timeout_secs, 10);
}

#[test]
fn test_config_rejects_unknown_policy() {
    let (_dir, path) = temp_config("[trace]\non_parse_error = \"ignore\"\n");
    let result = ConsoleConfig::load(path.to_str());
    assert!(result.is_err());
}

#[test]
fn test_trace_url_joins_with_single_slash() {
    let mut config = ConsoleConfig::default();
    assert_eq!(config.trace_url(), "http://localhost:8000/admin/trace");

    config.api_url = "http://localhost:8000/".to_string();
    assert_eq!(config.trace_url(), "http://localhost:8000/admin/trace");

    config.trace.path = "admin/trace".to_string();
    assert_eq!(config.trace_url(), "http://localhost:8000/admin/trace");

    config.api_url = "https://chat.example.com/api".to_string();
    assert_eq!(config.trace_url(), "https://chat.example.com/api/admin/trace");
}

#[test]
fn test_reader_options_from_trace_config() {
    let config = TraceConfig {
        channel_capacity: 3,
        connect_timeout_secs: 2,
        on_parse_error: ParseErrorPolicy::Skip,
        ..TraceConfig::default()
    };
    let options = ReaderOptions::from(&config);
    assert_eq!(options.channel_capacity, 3);
    assert_eq!(options.connect_timeout, std::time::Duration::from_secs(2));
    assert_eq!(options.on_parse_error, ParseErrorPolicy::Skip);
}

#[test]
fn test_client_from_config_uses_trace_url() {
    let mut config = ConsoleConfig::default();
    config.api_url = "http://127.0.0.1:9000".to_string();
    let client = CourierClient::from_config(&config, None);
    assert_eq!(client.trace_url(), "http://127.0.0.1:9000/admin/trace");
    assert!(!client.has_token());
}
