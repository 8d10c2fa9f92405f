//! Integration tests for logging system

use bridge_traits::time::{ConsoleLogger, LogLevel};
use core_runtime::logging::{init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig};
use std::sync::Arc;

#[test]
fn test_init_logging_once_per_process() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(Arc::new(ConsoleLogger::default()));

    assert!(init_logging(config.clone()).is_ok());
    tracing::info!(target: "core_playback", playlist_id = 1, "logging initialised");

    // A global subscriber is already installed.
    assert!(init_logging(config).is_err());
}

#[test]
fn test_catalog_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("auth", "secret-token"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("api_key", "k"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("track_name", "Intro"), "Intro");
}

#[test]
fn test_media_uris_reduced_to_file_names() {
    assert_eq!(
        strip_path("https://cdn.example.com/playlists/7/02%20Song.mp3"),
        "02%20Song.mp3"
    );
    assert_eq!(strip_path("https://cdn.example.com/a.ogg#t=30"), "a.ogg");
    assert_eq!(strip_path("D:\\music\\b.flac"), "b.flac");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_spans(true)
        .with_target(false);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(config.enable_spans);
    assert!(!config.display_target);
    assert!(config.logger_sink.is_none());
}
