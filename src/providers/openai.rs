use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{Provider, ProviderSettings, mask_key};

/// Public OpenAI API base URL
const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Client for OpenAI-compatible chat completions
pub struct OpenAI {
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

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,
    /// Conversation messages
    messages: Vec<OpenAIMessage>,
    /// Temperature for generation
    temperature: f32,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender
    pub role: String,
    /// Content of the message
    #[serde(default)]
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// Generated message
    pub message: OpenAIMessage,
}

impl OpenAI {
    /// Create a new OpenAI-compatible client
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

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            format!("{}/v1/chat/completions", DEFAULT_ENDPOINT)
        } else {
            format!("{}/v1/chat/completions", self.endpoint.trim_end_matches('/'))
        }
    }

    /// Extract text from a chat completion response
    pub fn extract_text_from_response(response: &OpenAIResponse) -> Result<String, ProviderError> {
        response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::ParseError("Response has no content".to_string()))
    }
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &mask_key(&self.api_key))
            .finish()
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let openai_response = response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))?;

        Self::extract_text_from_response(&openai_response)
    }

    fn name(&self) -> String {
        format!("openai({})", mask_key(&self.api_key))
    }
}
