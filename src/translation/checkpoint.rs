/*!
 * Checkpoint and output persistence for translation runs.
 *
 * A checkpoint is the whole output buffer serialized in the same shape as
 * the source dataset, so resuming is just reading it back as input.
 */

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::TranslationError;
use crate::file_utils::FileManager;
use crate::records::{Record, parse_records};

/// Where a run keeps its checkpoint and final output
#[derive(Debug, Clone)]
pub struct ProgressStore {
    checkpoint_path: PathBuf,
    output_path: PathBuf,
}

impl ProgressStore {
    /// Create a store for the given files
    pub fn new(checkpoint_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_path: checkpoint_path.into(),
            output_path: output_path.into(),
        }
    }

    /// Checkpoint file path
    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    /// Final output file path
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Whether a checkpoint from an earlier run exists
    pub fn has_checkpoint(&self) -> bool {
        FileManager::file_exists(&self.checkpoint_path)
    }

    /// Persist the full buffer as a checkpoint
    pub fn save_checkpoint(&self, records: &[Record]) -> Result<(), TranslationError> {
        FileManager::write_json_atomic(&self.checkpoint_path, records)
            .map_err(|e| TranslationError::Checkpoint(format!("{:#}", e)))?;
        info!("Checkpoint saved to {:?} ({} records)", self.checkpoint_path, records.len());
        Ok(())
    }

    /// Read the checkpoint back, if there is one
    pub fn load_checkpoint(&self) -> Result<Option<Vec<Record>>, TranslationError> {
        if !self.has_checkpoint() {
            return Ok(None);
        }
        let content = FileManager::read_to_string(&self.checkpoint_path)
            .map_err(|e| TranslationError::Checkpoint(format!("{:#}", e)))?;
        let records = parse_records(&content)
            .map_err(|e| TranslationError::Checkpoint(format!("{:?}: {}", self.checkpoint_path, e)))?;
        debug!("Loaded checkpoint {:?} ({} records)", self.checkpoint_path, records.len());
        Ok(Some(records))
    }

    /// Write the final dataset
    pub fn write_output(&self, records: &[Record]) -> Result<(), TranslationError> {
        FileManager::write_json_atomic(&self.output_path, records)
            .map_err(|e| TranslationError::Checkpoint(format!("{:#}", e)))?;
        info!("Output written to {:?} ({} records)", self.output_path, records.len());
        Ok(())
    }

    /// Delete the checkpoint after a completed run
    pub fn clear_checkpoint(&self) -> Result<(), TranslationError> {
        let removed = FileManager::remove_if_exists(&self.checkpoint_path)
            .map_err(|e| TranslationError::Checkpoint(format!("{:#}", e)))?;
        if removed {
            debug!("Removed checkpoint {:?}", self.checkpoint_path);
        }
        Ok(())
    }
}
