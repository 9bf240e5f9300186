//! Integration tests for terravale-core infrastructure

use terravale_core::{
    config_error, storage_error, validation_error, LogFormat, LoggingConfig, TerravaleConfig,
    TerravaleError,
};

#[test]
fn test_error_handling() {
    let error = storage_error!(
        "Store unreachable",
        "user_store",
        std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")
    );

    match &error {
        TerravaleError::Storage {
            message, source, ..
        } => {
            assert_eq!(message, "Store unreachable");
            assert!(source.is_some());
        }
        _ => panic!("Expected Storage error"),
    }
    assert_eq!(error.context().component, "user_store");
    assert!(!error.context().error_id.is_empty());
    assert!(!error.context().recovery_suggestions.is_empty());

    // Should not panic without a subscriber
    error.log();

    let config_error = config_error!("Invalid config", "test");
    assert!(matches!(config_error, TerravaleError::Config { source: None, .. }));
    assert_eq!(config_error.to_string(), "Configuration error: Invalid config");

    let validation = validation_error!("Too short", "password", "register");
    match validation {
        TerravaleError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("password")),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = TerravaleConfig::default();
    config.server.port = 0;
    assert!(matches!(config.validate(), Err(TerravaleError::Config { .. })));

    let mut config = TerravaleConfig::default();
    config.session.cookie_name = "tok en".to_string();
    assert!(matches!(config.validate(), Err(TerravaleError::Config { .. })));
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terravale.toml");

    let mut config = TerravaleConfig::default();
    config.server.port = 4000;
    config.database.url = Some("sqlite://users.db".to_string());
    config.logging.format = LogFormat::Json;
    config.save_to_file(&path).unwrap();

    let loaded = TerravaleConfig::from_file(&path).unwrap();
    assert_eq!(loaded.server.port, 4000);
    assert_eq!(loaded.database.url.as_deref(), Some("sqlite://users.db"));
    assert_eq!(loaded.logging.format, LogFormat::Json);
}

#[test]
fn test_partial_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[server]\nport = 7000\n").unwrap();

    let loaded = TerravaleConfig::from_file(&path).unwrap();
    assert_eq!(loaded.server.port, 7000);
    assert_eq!(loaded.server.host, "127.0.0.1");
    assert_eq!(loaded.session.cookie_name, "token");
}

#[test]
fn test_missing_config_file() {
    let result = TerravaleConfig::from_file("/definitely/not/here.toml");
    assert!(matches!(result, Err(TerravaleError::Config { .. })));
}

#[test]
fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        filter_directives: vec!["terravale_core=debug".to_string()],
        ..LoggingConfig::default()
    };

    // The global subscriber can only be installed once per process; the first
    // call must succeed and any later one reports an error instead of panicking.
    assert!(terravale_core::init_logging(&config).is_ok());
    assert!(terravale_core::init_logging(&config).is_err());
}
