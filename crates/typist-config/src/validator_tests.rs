use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_bad_endpoint_scheme() {
    let mut config = Config::default();
    config.browser.endpoint = "ws://localhost:9222".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "browser.endpoint"));
}

#[test]
fn test_validate_zero_timeout() {
    let mut config = Config::default();
    config.browser.command_timeout_secs = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "browser.command_timeout_secs"));
}

#[test]
fn test_validate_high_timeout_warning() {
    let mut config = Config::default();
    config.browser.command_timeout_secs = 3600;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_validate_unknown_log_level_warning() {
    let mut config = Config::default();
    config.logging.level = "loud".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "logging.level"));
}

#[test]
fn test_validate_directive_log_level_accepted() {
    let mut config = Config::default();
    config.logging.level = "info,typist_engine=debug".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_unknown_log_format() {
    let mut config = Config::default();
    config.logging.format = "xml".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "logging.format"));
}

#[test]
fn test_validation_error_display() {
    let err = ValidationError::new("browser.endpoint", "bad");
    assert_eq!(err.to_string(), "browser.endpoint: bad");
}
