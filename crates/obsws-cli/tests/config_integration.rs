//! Integration tests for loading the config file from disk.

use std::time::Duration;

use obsws_cli::{load_config, ConfigError, FileConfig, Overrides};
use obsws_core::EventSubscription;

fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("obsws-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_full_file_becomes_client_config() {
    // Arrange
    let path = write_temp(
        "full.toml",
        r#"
log_level = "debug"

[connection]
host = "10.0.0.5"
port = 4460
password = "hunter2"
subscriptions = ["Scenes", "InputVolumeMeters"]

[timeouts]
request_secs = 5
batch_secs = 8
reconnect_secs = 2
"#,
    );

    // Act
    let file = load_config(&path).unwrap();
    let config = file.to_client_config().unwrap();

    // Assert
    assert_eq!(file.log_level, "debug");
    assert_eq!(config.url, "ws://10.0.0.5:4460");
    assert_eq!(config.password, "hunter2");
    assert_eq!(
        config.event_subscriptions,
        EventSubscription::SCENES | EventSubscription::INPUT_VOLUME_METERS
    );
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.batch_timeout, Duration::from_secs(8));
    assert_eq!(config.reconnect_interval, Duration::from_secs(2));
}

#[test]
fn test_cli_overrides_apply_after_loading() {
    // Arrange
    let path = write_temp("partial.toml", "[connection]\nhost = \"studio\"\n");
    let mut file = load_config(&path).unwrap();

    // Act
    file.apply(Overrides {
        port: Some(4999),
        subscriptions: Some(vec!["Outputs".into()]),
        ..Overrides::default()
    });
    let config = file.to_client_config().unwrap();

    // Assert
    assert_eq!(config.url, "ws://studio:4999");
    assert_eq!(config.event_subscriptions, EventSubscription::OUTPUTS);
}

#[test]
fn test_saved_defaults_load_back_unchanged() {
    let text = toml::to_string_pretty(&FileConfig::default()).unwrap();
    let path = write_temp("defaults.toml", &text);

    assert_eq!(load_config(&path).unwrap(), FileConfig::default());
}

#[test]
fn test_malformed_file_is_reported() {
    let path = write_temp("broken.toml", "[connection\nport = 1");

    assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
}
