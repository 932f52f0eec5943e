use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{ProviderKind, ProviderSettings};
use crate::translation::WorkerSettings;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source dataset (JSON array of records)
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Translated dataset written at the end of a run
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Checkpoint file used to resume interrupted runs
    #[serde(default = "default_checkpoint_file")]
    pub checkpoint_file: PathBuf,

    /// Glossary file (JSON object of source -> target terms)
    #[serde(default = "default_glossary_file")]
    pub glossary_file: PathBuf,

    /// Source language, ISO code or English name
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language, ISO code or English name
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation service settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch sizing and checkpoint cadence
    #[serde(default)]
    pub batching: BatchingConfig,

    /// Classification thresholds
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Merge step files
    #[serde(default)]
    pub merge: MergeConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Provider type
    #[serde(default)]
    pub provider: ProviderKind,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: One credential per worker
    #[serde(default)]
    pub api_keys: Vec<String>,

    // @field: Service URL, empty for the public API
    #[serde(default)]
    pub endpoint: String,

    // @field: Rate limit per credential (requests per minute)
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute_per_key: u32,

    // @field: Attempts per batch, first call included
    #[serde(default = "default_max_api_retries")]
    pub max_api_retries: u32,

    // @field: Pause between attempts
    #[serde(default = "default_api_retry_delay_secs")]
    pub api_retry_delay_secs: u64,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: Description of the game for the prompt
    #[serde(default)]
    pub game_context: Option<String>,
}

/// Marker found in credentials copied from the sample configuration
pub const PLACEHOLDER_KEY_MARKER: &str = "YOUR_";

impl TranslationConfig {
    /// Credentials that are actually usable
    pub fn usable_api_keys(&self) -> Vec<String> {
        self.api_keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty() && !k.contains(PLACEHOLDER_KEY_MARKER))
            .map(str::to_string)
            .collect()
    }

    /// Settings passed to every provider client
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
        }
    }

    /// Pacing and retry settings for workers
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            requests_per_minute: self.requests_per_minute_per_key,
            max_attempts: self.max_api_retries,
            retry_delay: std::time::Duration::from_secs(self.api_retry_delay_secs),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            api_keys: vec!["YOUR_API_KEY_1".to_string()],
            endpoint: String::new(),
            requests_per_minute_per_key: default_requests_per_minute(),
            max_api_retries: default_max_api_retries(),
            api_retry_delay_secs: default_api_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            game_context: None,
        }
    }
}

/// Batch sizing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchingConfig {
    /// Requested batch size
    #[serde(default = "default_initial_batch_size")]
    pub initial_batch_size: usize,

    /// Lower bound for the batch size
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,

    /// Upper bound for the batch size
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Completed batches between checkpoints
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
}

impl BatchingConfig {
    /// Initial batch size clamped into the configured bounds
    pub fn effective_batch_size(&self) -> usize {
        self.initial_batch_size.clamp(self.min_batch_size, self.max_batch_size)
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            initial_batch_size: default_initial_batch_size(),
            min_batch_size: default_min_batch_size(),
            max_batch_size: default_max_batch_size(),
            checkpoint_every: default_checkpoint_every(),
        }
    }
}

/// Classification thresholds and output location
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassificationConfig {
    /// Score needed for the safe tier
    #[serde(default = "default_safe_threshold")]
    pub safe_translation_threshold: i32,

    /// Score needed for the review tier
    #[serde(default = "default_base_threshold")]
    pub base_translation_threshold: i32,

    /// Directory receiving the three tier files
    #[serde(default = "default_classified_dir")]
    pub output_dir: PathBuf,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            safe_translation_threshold: default_safe_threshold(),
            base_translation_threshold: default_base_threshold(),
            output_dir: default_classified_dir(),
        }
    }
}

/// Merge step configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergeConfig {
    /// Complete original dataset
    #[serde(default = "default_input_file")]
    pub original_file: PathBuf,

    /// Translated subset to merge in
    #[serde(default = "default_output_file")]
    pub translated_file: PathBuf,

    /// Merged dataset
    #[serde(default = "default_final_output_file")]
    pub final_output_file: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            original_file: default_input_file(),
            translated_file: default_output_file(),
            final_output_file: default_final_output_file(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_input_file() -> PathBuf {
    PathBuf::from("data/strings.json")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("data/strings_translated.json")
}

fn default_checkpoint_file() -> PathBuf {
    PathBuf::from("data/strings_checkpoint.json")
}

fn default_glossary_file() -> PathBuf {
    PathBuf::from("glossary.json")
}

fn default_final_output_file() -> PathBuf {
    PathBuf::from("data/strings_final.json")
}

fn default_classified_dir() -> PathBuf {
    PathBuf::from("classified_output")
}

fn default_source_language() -> String {
    "English".to_string()
}

fn default_target_language() -> String {
    "Vietnamese".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_requests_per_minute() -> u32 {
    10
}

fn default_max_api_retries() -> u32 {
    3
}

fn default_api_retry_delay_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_initial_batch_size() -> usize {
    50
}

fn default_min_batch_size() -> usize {
    5
}

fn default_max_batch_size() -> usize {
    200
}

fn default_checkpoint_every() -> usize {
    5
}

fn default_safe_threshold() -> i32 {
    5
}

fn default_base_threshold() -> i32 {
    0
}

impl Config {
    /// Load the configuration, writing a default file when none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            FileManager::read_json(path).with_context(|| format!("Failed to load config file: {:?}", path))
        } else {
            warn!("Config file not found at {:?}, creating default config.", path);
            let config = Config::default();
            FileManager::write_json_atomic(path, &config)
                .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        language_utils::resolve_language(&self.source_language)
            .with_context(|| format!("Invalid source language '{}'", self.source_language))?;
        language_utils::resolve_language(&self.target_language)
            .with_context(|| format!("Invalid target language '{}'", self.target_language))?;

        let classification = &self.classification;
        if classification.safe_translation_threshold < classification.base_translation_threshold {
            return Err(anyhow!(
                "safe_translation_threshold ({}) must not be below base_translation_threshold ({})",
                classification.safe_translation_threshold,
                classification.base_translation_threshold
            ));
        }

        let batching = &self.batching;
        if batching.min_batch_size == 0 || batching.min_batch_size > batching.max_batch_size {
            return Err(anyhow!(
                "Batch size bounds must satisfy 1 <= min ({}) <= max ({})",
                batching.min_batch_size,
                batching.max_batch_size
            ));
        }
        if batching.checkpoint_every == 0 {
            return Err(anyhow!("checkpoint_every must be at least 1"));
        }

        let translation = &self.translation;
        if translation.requests_per_minute_per_key == 0 {
            return Err(anyhow!("requests_per_minute_per_key must be greater than 0"));
        }
        if translation.max_api_retries == 0 {
            return Err(anyhow!("max_api_retries must be at least 1"));
        }

        Ok(())
    }

    /// English name of the source language
    pub fn source_language_name(&self) -> Result<String> {
        language_utils::get_language_name(&self.source_language)
    }

    /// English name of the target language
    pub fn target_language_name(&self) -> Result<String> {
        language_utils::get_language_name(&self.target_language)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            input_file: default_input_file(),
            output_file: default_output_file(),
            checkpoint_file: default_checkpoint_file(),
            glossary_file: default_glossary_file(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            batching: BatchingConfig::default(),
            classification: ClassificationConfig::default(),
            merge: MergeConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
