/*!
 * Common test utilities for the gstl test suite
 */

use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use gstl::app_config::Config;
use gstl::records::Record;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Records with plain English sentences, indices 0..count
pub fn sentence_records(count: u64) -> Vec<Record> {
    (0..count).map(|i| Record::new(i, format!("The guard number {} is waiting.", i))).collect()
}

/// A small string table mixing dialogue, markup and technical strings
pub fn create_test_string_table(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = json!([
        {"index": 0, "value": "You have reached the summit."},
        {"index": 1, "value": "Press <b>{0}</b> to open the map."},
        {"index": 2, "value": "UnityEngine.GameObject"},
        {"index": 3, "value": "player_health_max"},
        {"index": 4, "value": "Hello, __there__!"},
        {"index": 5, "value": ""},
        {"index": 6, "value": 42},
        {"index": 7, "value": "Bạn đã đến đỉnh núi."}
    ]);
    create_test_file(dir, filename, &serde_json::to_string_pretty(&content)?)
}

/// Configuration rooted in `dir` with fast, deterministic pacing
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.input_file = dir.join("strings.json");
    config.output_file = dir.join("strings_translated.json");
    config.checkpoint_file = dir.join("strings_checkpoint.json");
    config.glossary_file = dir.join("glossary.json");
    config.classification.output_dir = dir.join("classified");
    config.merge.original_file = dir.join("strings.json");
    config.merge.translated_file = dir.join("strings_translated.json");
    config.merge.final_output_file = dir.join("strings_final.json");
    config.translation.requests_per_minute_per_key = 60_000;
    config.translation.max_api_retries = 2;
    config.translation.api_retry_delay_secs = 0;
    config
}

/// Read a record file written by the crate
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
