use filelist::config::*;
use filelist::errors::CatalogError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = ServerConfig::default();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.tcp_port, 10000);
    assert_eq!(config.max_request_bytes, 4096);
    assert_eq!(config.http_addr(), "localhost:8080");
    assert_eq!(config.tcp_addr(), "localhost:10000");
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config(&dir.path().join("config.json")).unwrap();
    assert_eq!(loaded, ServerConfig::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"host": "0.0.0.0", "tcp_port": 10001}"#).unwrap();

    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded.host, "0.0.0.0");
    assert_eq!(loaded.tcp_port, 10001);
    assert_eq!(loaded.http_port, 8080);
}

#[test]
fn test_invalid_json_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, CatalogError::Config { .. }));
}

#[test]
fn test_zero_read_size_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"max_request_bytes": 0}"#).unwrap();

    assert!(load_config(&path).is_err());
}

#[test]
fn test_explicit_missing_path_is_error() {
    let dir = TempDir::new().unwrap();
    let err = resolve_config(Some(&dir.path().join("nope.json"))).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_config_serde_roundtrip() {
    let config = ServerConfig::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let deserialized: ServerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, deserialized);
}

#[test]
fn test_default_config_path_name() {
    if let Some(path) = default_config_path() {
        assert!(path.ends_with("filelist/config.json"));
    }
}
