//! Integration tests for cadence-config

use cadence_config::*;
use std::env;
use std::fs;

#[test]
fn test_toml_file_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cadence.toml");
    fs::write(
        &path,
        r#"
            tick_interval_ms = 25
            batch_size = 200
            report_failures = true
        "#,
    )
    .unwrap();

    let config = ConfigBuilder::new().add_file(&path).build().unwrap();

    assert_eq!(config.tick_interval_ms, 25);
    assert_eq!(config.batch_size, 200);
    assert!(config.report_failures);
    assert_eq!(config.max_queue_size, 1000);
}

#[test]
fn test_later_files_override_earlier() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.json");
    let local = dir.path().join("local.json");
    fs::write(&base, r#"{"batch_size": 10, "max_queue_size": 50}"#).unwrap();
    fs::write(&local, r#"{"batch_size": 20}"#).unwrap();

    let config = ConfigBuilder::new()
        .add_file(&base)
        .add_file(&local)
        .build()
        .unwrap();

    assert_eq!(config.batch_size, 20);
    assert_eq!(config.max_queue_size, 50);
}

#[test]
fn test_section_in_application_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.toml");
    fs::write(
        &path,
        r#"
            [server]
            port = 8080

            [events]
            default_retries = 5
        "#,
    )
    .unwrap();

    let config = ConfigBuilder::new()
        .section("events")
        .add_file(&path)
        .build()
        .unwrap();

    assert_eq!(config.default_retries, 5);
}

#[test]
fn test_env_layer_with_custom_prefix() {
    unsafe {
        env::set_var("CADENCE_IT_BATCH_SIZE", "75");
        env::set_var("CADENCE_IT_REPORT_FAILURES", "true");
    }

    let config = ConfigBuilder::new()
        .with_prefix("CADENCE_IT")
        .load_env()
        .build()
        .unwrap();

    assert_eq!(config.batch_size, 75);
    assert!(config.report_failures);

    // Cleanup
    unsafe {
        env::remove_var("CADENCE_IT_BATCH_SIZE");
        env::remove_var("CADENCE_IT_REPORT_FAILURES");
    }
}

#[test]
fn test_dotenv_file_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, "CADENCE_DOTENV_MAX_QUEUE_SIZE=321\n").unwrap();

    let config = ConfigBuilder::new()
        .with_prefix("CADENCE_DOTENV")
        .load_dotenv(Some(path))
        .build()
        .unwrap();

    assert_eq!(config.max_queue_size, 321);

    unsafe {
        env::remove_var("CADENCE_DOTENV_MAX_QUEUE_SIZE");
    }
}

#[test]
fn test_invalid_file_value_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"tick_interval_ms": 0}"#).unwrap();

    let result = ConfigBuilder::new().add_file(&path).build();
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::ParseError("batch_size".to_string());
    let display = format!("{}", err);
    assert!(display.contains("batch_size"));
}
