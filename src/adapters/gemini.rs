use crate::core::recommend::build_prompt;
use crate::domain::ports::TextGenerator;
use crate::domain::score::RecommendationRequest;
use crate::utils::error::{LocalityError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|text| !text.is_empty())
    }
}

/// Client for the Gemini `generateContent` REST API.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint, api_key)
    }

    pub fn with_client(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &RecommendationRequest) -> Result<String> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": build_prompt(request) }] }],
            "generationConfig": {
                "temperature": 0.4,
                "maxOutputTokens": 200,
                "topP": 0.8
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(LocalityError::GenerationError {
                message: "quota exceeded (429)".to_string(),
            });
        }

        let body: GenerateResponse = response.error_for_status()?.json().await?;
        match body.first_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(LocalityError::GenerationError {
                message: "response contained no text".to_string(),
            }),
        }
    }
}
