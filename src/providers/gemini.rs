use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{Provider, ProviderSettings, mask_key};

/// Public Gemini API base URL
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini client for the `generateContent` API
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL
    endpoint: String,
    /// Model to use
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Gemini generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation turns
    contents: Vec<GeminiContent>,
    /// Generation parameters
    generation_config: GenerationConfig,
}

/// One conversation turn
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role of the sender
    #[serde(default)]
    pub role: String,
    /// Content parts
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A text part of a turn
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text content
    #[serde(default)]
    pub text: String,
}

/// Generation parameters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Generated candidates
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    /// Feedback on the prompt, set when it was blocked
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated candidate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Candidate content
    pub content: Option<GeminiContent>,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Prompt feedback
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(api_key: impl Into<String>, settings: &ProviderSettings) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    fn api_url(&self) -> Result<Url, ProviderError> {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        Url::parse(&format!("{}/v1beta/models/{}:generateContent", base, self.model))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid Gemini endpoint: {}", e)))
    }

    /// Extract text from a Gemini response
    pub fn extract_text_from_response(response: &GeminiResponse) -> Result<String, ProviderError> {
        if let Some(reason) = response.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            return Err(ProviderError::ApiError {
                status_code: 400,
                message: format!("Prompt blocked: {}", reason),
            });
        }

        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| ProviderError::ParseError("Response has no candidates".to_string()))?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(ProviderError::ParseError(format!(
                "Empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gemini")
            .field("model", &self.model)
            .field("api_key", &mask_key(&self.api_key))
            .finish()
    }
}

#[async_trait]
impl Provider for Gemini {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(self.api_url()?)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let gemini_response = response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e)))?;
        debug!("Gemini returned {} candidate(s)", gemini_response.candidates.len());

        Self::extract_text_from_response(&gemini_response)
    }

    fn name(&self) -> String {
        format!("gemini({})", mask_key(&self.api_key))
    }
}
