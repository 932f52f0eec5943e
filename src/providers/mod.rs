/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the generative services
 * the workers talk to:
 * - Gemini: Google `generateContent` API (default)
 * - OpenAI: any OpenAI-compatible chat completions endpoint
 * - Mock: deterministic in-process provider for tests
 *
 * A provider is bound to exactly one credential. Retry and rate limiting are
 * layered on top by the workers, never done here.
 */

use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;

pub mod gemini;
pub mod mock;
pub mod openai;

/// Common trait for all translation providers
///
/// A provider takes a prompt and returns the raw response text.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send a prompt and return the model's text
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Short label used in logs
    fn name(&self) -> String;
}

/// Available provider kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini
    #[default]
    Gemini,
    /// OpenAI-compatible chat completions
    #[value(name = "openai")]
    OpenAI,
}

impl ProviderKind {
    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every client of a run
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Model identifier
    pub model: String,
    /// Base URL; empty for the public endpoint
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
}

/// Create one client per credential
pub fn create_providers(
    kind: ProviderKind,
    api_keys: &[String],
    settings: &ProviderSettings,
) -> Vec<Arc<dyn Provider>> {
    api_keys
        .iter()
        .map(|key| -> Arc<dyn Provider> {
            match kind {
                ProviderKind::Gemini => Arc::new(gemini::Gemini::new(key.clone(), settings)),
                ProviderKind::OpenAI => Arc::new(openai::OpenAI::new(key.clone(), settings)),
            }
        })
        .collect()
}

/// Mask a credential for logging
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("...{}", visible)
}
