/*!
 * Tests for application configuration functionality
 */

use gstl::app_config::{Config, LogLevel};
use gstl::providers::ProviderKind;

use crate::common::{create_temp_dir, create_test_file};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "English");
    assert_eq!(config.target_language, "Vietnamese");
    assert_eq!(config.translation.provider, ProviderKind::Gemini);
    assert_eq!(config.translation.model, "gemini-2.5-flash");
    assert_eq!(config.translation.requests_per_minute_per_key, 10);
    assert_eq!(config.translation.max_api_retries, 3);
    assert_eq!(config.translation.api_retry_delay_secs, 5);
    assert_eq!(config.batching.initial_batch_size, 50);
    assert_eq!(config.batching.min_batch_size, 5);
    assert_eq!(config.batching.max_batch_size, 200);
    assert_eq!(config.classification.safe_translation_threshold, 5);
    assert_eq!(config.classification.base_translation_threshold, 0);
    assert_eq!(config.log_level, LogLevel::Info);

    // The sample key is a placeholder and never used
    assert!(config.translation.usable_api_keys().is_empty());
}

/// Test loading a user file with only some options set
#[test]
fn test_loadOrCreate_withPartialFile_shouldMergeDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "target_language": "ru",
            "log_level": "debug",
            "translation": { "provider": "openai", "api_keys": ["k1", "k2"], "model": "gpt-4o-mini" },
            "batching": { "initial_batch_size": 500 }
        }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.target_language, "ru");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.translation.provider, ProviderKind::OpenAI);
    assert_eq!(config.translation.usable_api_keys().len(), 2);
    assert_eq!(config.batching.effective_batch_size(), 200);
    assert_eq!(config.target_language_name().unwrap(), "Russian");
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "not-a-language".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();
    assert!(config.validate().is_ok());

    config.classification.base_translation_threshold = 10;
    assert!(config.validate().is_err());
    config.classification.base_translation_threshold = 5;
    assert!(config.validate().is_ok());

    config.batching.checkpoint_every = 0;
    assert!(config.validate().is_err());
}

/// Test that a malformed file is reported rather than replaced
#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}
