use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @creates: Parent directory of a file path
    pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        match path.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::ensure_dir(parent),
            _ => Ok(()),
        }
    }

    // @reads: Whole file as UTF-8
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    // @reads: JSON document into a typed value
    pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
        let path = path.as_ref();
        let content = Self::read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
    }

    // @writes: Pretty JSON, replacing the target atomically
    // @invariant: Readers see either the old file or the complete new one
    pub fn write_json_atomic<T: Serialize + ?Sized, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
        let path = path.as_ref();
        Self::ensure_parent_dir(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, value)
                .with_context(|| format!("Failed to serialize {:?}", path))?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path)
            .with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    // @removes: File if present; returns whether something was removed
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        if Self::file_exists(path) {
            fs::remove_file(path).with_context(|| format!("Failed to remove {:?}", path))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
