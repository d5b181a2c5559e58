//! Gemini Backend Implementation
//!
//! Talks to the Gemini `generateContent` REST API with JSON response mode
//! enabled, so the model is constrained to answer with the report schema.
//!
//! # Features
//!
//! - Async HTTP communication with the Gemini API
//! - Configurable endpoint, model, and timeout
//! - Retry with exponential backoff on rate limits and transient failures
//! - Hard failure (no retry) on unusable responses
//!
//! # Examples
//!
//! ```no_run
//! use feedwatch_agent::{GeminiAgent, Ruleset};
//!
//! let agent = GeminiAgent::new("api-key", Ruleset::baseline());
//! // GeminiAgent implements SourceAnalyzer; hand it to the dispatcher.
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use feedwatch_domain::SourceReport;

use crate::config::AgentConfig;
use crate::parser::parse_verdict;
use crate::prompt::{PromptBuilder, Ruleset};
use crate::{AgentError, SourceAnalyzer, SourceCase};

/// Default Gemini API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Default timeout for one classification request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts before a source is given up on
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default first backoff delay; doubles on every further attempt
pub const DEFAULT_RETRY_BASE_DELAY_SECS: u64 = 10;

/// Gemini-backed source analyzer
pub struct GeminiAgent {
    api_key: String,
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    retry_base_delay_secs: u64,
    ruleset: Ruleset,
}

/// Request body for the generateContent API
#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Response from the generateContent API (the parts we consume)
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

impl GeminiAgent {
    /// Create an agent with default settings
    ///
    /// # Parameters
    ///
    /// - `api_key`: Gemini API key
    /// - `ruleset`: severity rules to classify under
    pub fn new(api_key: impl Into<String>, ruleset: Ruleset) -> Self {
        Self::with_config(api_key, ruleset, &AgentConfig::default())
    }

    /// Create an agent from a configuration
    pub fn with_config(api_key: impl Into<String>, ruleset: Ruleset, config: &AgentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap();

        Self {
            api_key: api_key.into(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            client,
            max_retries: config.max_retries,
            retry_base_delay_secs: config.retry_base_delay_secs,
            ruleset,
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API endpoint (for proxies and tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the maximum number of attempts per source
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The ruleset this agent classifies under
    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Send one prompt and return the model's text
    ///
    /// Retries rate limits (429), server errors, and transport errors with
    /// exponential backoff. Other client errors and unusable response
    /// bodies fail immediately: repeating those requests cannot help.
    pub async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        );

        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Self::extract_text(response).await;
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(AgentError::ModelNotAvailable(self.model.clone()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(AgentError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(AgentError::Communication(format!("HTTP {}", status)));
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        return Err(AgentError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(AgentError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay =
                    Duration::from_secs(self.retry_base_delay_secs * 2u64.pow(attempts - 1));
                warn!(
                    attempt = attempts,
                    delay_secs = delay.as_secs(),
                    "classification request failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| AgentError::Communication("Max retries exceeded".to_string())))
    }

    async fn extract_text(response: reqwest::Response) -> Result<String, AgentError> {
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| AgentError::InvalidResponse("Response has no candidates".to_string()))
    }
}

#[async_trait]
impl SourceAnalyzer for GeminiAgent {
    async fn analyze(&self, case: &SourceCase) -> Result<SourceReport, AgentError> {
        let prompt = PromptBuilder::new(case, &self.ruleset).build();
        debug!(
            source = %case.source_id,
            prompt_chars = prompt.len(),
            "requesting classification"
        );

        let response = self.generate(&prompt).await?;
        parse_verdict(&case.source_id, &response)
    }
}
