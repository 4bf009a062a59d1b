use std::time::Duration;

use structured_cli::{ConfigError, RunnerConfig};

/// Test that RunnerConfig::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = RunnerConfig::default();

    assert_eq!(config.handler_timeout_seconds, 1800);
    assert_eq!(config.handler_timeout(), Duration::from_secs(30 * 60));
    assert!(config.bug_report_url.starts_with("https://"));
    assert_eq!(config.help_width, None);
}

/// Test that RunnerConfig::config_path() is scoped to the application name.
#[test]
fn test_config_path_ends_with_expected() {
    let path = RunnerConfig::config_path("tool");
    assert!(path.ends_with("tool/cli.toml"));
}

/// Test validation passes for the default config.
#[test]
fn test_validation_passes_for_default() {
    assert!(RunnerConfig::default().validate().is_ok());
}

/// Test validation fails when the timeout is zero.
#[test]
fn test_validation_fails_zero_timeout() {
    let config = RunnerConfig {
        handler_timeout_seconds: 0,
        ..RunnerConfig::default()
    };

    match config.validate().unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("handler_timeout_seconds"));
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

/// Test a full config file round-trips through TOML.
#[test]
fn test_load_full_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cli.toml");
    std::fs::write(
        &path,
        r#"
handler_timeout_seconds = 90
bug_report_url = "https://example.test/issues"
help_width = 72
"#,
    )
    .unwrap();

    let config = RunnerConfig::load(&path).unwrap();

    assert_eq!(
        config,
        RunnerConfig {
            handler_timeout_seconds: 90,
            bug_report_url: "https://example.test/issues".to_string(),
            help_width: Some(72),
        }
    );
}

/// Test that an unreadable path (a directory) is reported as a read error.
#[test]
fn test_directory_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = RunnerConfig::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));
    assert!(err.to_string().contains("Failed to read config file"));
}

/// Test that unknown keys do not break loading.
#[test]
fn test_unknown_keys_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cli.toml");
    std::fs::write(&path, "theme = \"dark\"\n").unwrap();

    assert_eq!(RunnerConfig::load(&path).unwrap(), RunnerConfig::default());
}
