/*!
 * Record data model shared by every stage of the pipeline.
 *
 * A `Record` is one entry of the string table. Its `index` is the only
 * correlation key between classification, workers, merge and checkpoints;
 * it is assigned once at load time and never recomputed.
 */

use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Source object as it appears on disk, before an index is assigned
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    /// Stable index, if the source already carries one
    #[serde(default)]
    pub index: Option<u64>,

    /// Record payload; normally a string
    #[serde(default)]
    pub value: Value,

    /// Any other fields of the source object, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the string table with its stable index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable, unique index
    pub index: u64,

    /// Record payload
    #[serde(default)]
    pub value: Value,

    /// Any other fields of the source object, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Create a text record without extra fields
    pub fn new(index: u64, text: impl Into<String>) -> Self {
        Self {
            index,
            value: Value::String(text.into()),
            extra: Map::new(),
        }
    }

    /// The record's text, if its value is a string
    pub fn text(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// Assign indices by original position where missing and check uniqueness
pub fn assign_indices(raw: Vec<RawRecord>) -> Result<Vec<Record>, AppError> {
    let mut seen = HashMap::with_capacity(raw.len());
    let mut records = Vec::with_capacity(raw.len());

    for (position, item) in raw.into_iter().enumerate() {
        let index = item.index.unwrap_or(position as u64);
        if let Some(previous) = seen.insert(index, position) {
            return Err(AppError::Input(format!(
                "Duplicate index {} at positions {} and {}",
                index, previous, position
            )));
        }
        records.push(Record {
            index,
            value: item.value,
            extra: item.extra,
        });
    }

    Ok(records)
}

/// Parse a JSON array of source objects into indexed records
pub fn parse_records(json: &str) -> Result<Vec<Record>, AppError> {
    let raw: Vec<RawRecord> = serde_json::from_str(json)
        .map_err(|e| AppError::Input(format!("Source is not a JSON array of records: {}", e)))?;
    assign_indices(raw)
}

/// A fixed, ordered group of records dispatched together
#[derive(Debug, Clone)]
pub struct Batch {
    /// Sequential id, used for progress accounting only
    pub batch_id: usize,

    /// Records in original order
    pub records: Vec<Record>,
}

impl Batch {
    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Split records into contiguous batches without reordering
pub fn partition_batches(records: Vec<Record>, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size);

    for record in records {
        current.push(record);
        if current.len() == batch_size {
            batches.push(Batch {
                batch_id: batches.len(),
                records: std::mem::replace(&mut current, Vec::with_capacity(batch_size)),
            });
        }
    }
    if !current.is_empty() {
        batches.push(Batch {
            batch_id: batches.len(),
            records: current,
        });
    }

    batches
}

/// A translated value for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedEntry {
    /// Index of the record it belongs to
    pub index: u64,
    /// Restored translation
    pub value: String,
}

/// What a worker hands back for one batch
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Batch this result closes
    pub batch_id: usize,
    /// Translations that survived, possibly none
    pub results: Vec<TranslatedEntry>,
}

/// Position-indexed copy of the dataset that receives translations
///
/// Length and index set never change; only `value` fields are overwritten.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    records: Vec<Record>,
    positions: HashMap<u64, usize>,
}

impl OutputBuffer {
    /// Build the buffer and its index lookup once, before dispatch
    pub fn new(records: Vec<Record>) -> Self {
        let positions = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.index, position))
            .collect();
        Self { records, positions }
    }

    /// Overwrite values for every entry whose index is known
    ///
    /// Returns how many records were updated.
    pub fn apply(&mut self, result: &BatchResult) -> usize {
        let mut applied = 0;
        for entry in &result.results {
            match self.positions.get(&entry.index) {
                Some(&position) => {
                    self.records[position].value = Value::String(entry.value.clone());
                    applied += 1;
                }
                None => warn!("Ignoring translation for unknown index {}", entry.index),
            }
        }
        debug!("Batch #{} applied {} value(s)", result.batch_id, applied);
        applied
    }

    /// Current records in original order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Source term to target term mapping supplied verbatim to every prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: Vec<(String, String)>,
}

impl Glossary {
    /// Build a glossary from term pairs, keeping their order
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            terms: pairs.into_iter().map(|(s, t)| (s.into(), t.into())).collect(),
        }
    }

    /// Parse a JSON object of `"source": "target"` pairs
    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        let map: Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| AppError::Input(format!("Glossary is not a JSON object: {}", e)))?;
        let terms = map
            .into_iter()
            .filter_map(|(source, target)| match target {
                Value::String(target) => Some((source, target)),
                other => {
                    warn!("Skipping glossary term '{}' with non-text target {}", source, other);
                    None
                }
            })
            .collect();
        Ok(Self { terms })
    }

    /// Load a glossary file; a missing file yields an empty glossary
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No glossary at {:?}, continuing without one", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Term pairs in file order
    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the glossary has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
