/*!
 * Strict decoding of batch translation responses.
 *
 * A response is accepted only when it holds a JSON array of
 * `{"index", "translation"}` objects with no other fields, one per record
 * of the batch, each index belonging to the batch exactly once. Any other
 * shape is an error and makes the attempt retryable.
 */

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::TranslationError;

/// One translated entry as returned by the model
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseItem {
    /// Record index
    pub index: u64,
    /// Translated, still protected text
    pub translation: String,
}

/// Locate the JSON array in a possibly wrapped response
pub fn extract_json_array(response: &str) -> Result<&str, TranslationError> {
    let trimmed = response.trim();

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return Ok(trimmed);
    }

    // Markdown code fence, with or without language
    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let body_start = start + fence.len();
            if let Some(end) = trimmed[body_start..].find("```") {
                let body = trimmed[body_start..body_start + end].trim();
                if body.starts_with('[') {
                    return Ok(body);
                }
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if end > start {
            return Ok(&trimmed[start..=end]);
        }
    }

    Err(TranslationError::MalformedResponse(
        "No JSON array found in response".to_string(),
    ))
}

fn parse_array(response: &str) -> Result<Vec<Value>, TranslationError> {
    let json = extract_json_array(response)?;
    serde_json::from_str(json)
        .map_err(|e| TranslationError::MalformedResponse(format!("Invalid JSON array: {}", e)))
}

/// Decode a response for a batch holding `expected` indices
pub fn decode_response(response: &str, expected: &[u64]) -> Result<Vec<ResponseItem>, TranslationError> {
    let values = parse_array(response)?;

    if values.len() != expected.len() {
        return Err(TranslationError::CardinalityMismatch {
            expected: expected.len(),
            received: values.len(),
        });
    }

    let allowed: HashSet<u64> = expected.iter().copied().collect();
    let mut seen = HashSet::with_capacity(values.len());
    let mut items = Vec::with_capacity(values.len());

    for value in values {
        let item: ResponseItem = serde_json::from_value(value)
            .map_err(|e| TranslationError::MalformedResponse(format!("Invalid entry: {}", e)))?;
        if !allowed.contains(&item.index) {
            return Err(TranslationError::UnknownIndex(item.index));
        }
        if !seen.insert(item.index) {
            return Err(TranslationError::DuplicateIndex(item.index));
        }
        items.push(item);
    }

    Ok(items)
}

/// Keep whatever entries of a rejected response are individually usable
///
/// An entry survives when it decodes on its own and its index belongs to
/// the batch; only the first entry for an index is kept.
pub fn salvage_response(response: &str, expected: &[u64]) -> Vec<ResponseItem> {
    let Ok(values) = parse_array(response) else {
        return Vec::new();
    };

    let allowed: HashSet<u64> = expected.iter().copied().collect();
    let mut seen = HashSet::new();

    values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<ResponseItem>(value).ok())
        .filter(|item| allowed.contains(&item.index) && seen.insert(item.index))
        .collect()
}
