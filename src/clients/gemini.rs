use crate::config::{optional_var, parse_var, KeyFromEnv};
use crate::core::TextGenerationService;
use crate::error::{ConfigError, QuizError, UpstreamError};
use crate::schema::ResponseSchema;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a ResponseSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, or why there are none.
    fn into_text(self) -> Result<String, String> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(match block_reason {
                Some(reason) => format!("prompt blocked: {}", reason),
                None => "no candidates in response".to_string(),
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(match candidate.finish_reason {
                Some(reason) => format!("candidate has no text (finish reason: {})", reason),
                None => "candidate has no text".to_string(),
            });
        }
        Ok(text)
    }
}

/// Configuration for the Gemini client
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read the configuration from the environment (and `.env`).
    ///
    /// `API_KEY` is required. `QUIZ_MODEL`, `QUIZ_BASE_URL`,
    /// `QUIZ_TEMPERATURE` and `QUIZ_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(GeminiClient::require_key()?);
        if let Some(model) = optional_var("QUIZ_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = optional_var("QUIZ_BASE_URL") {
            config.base_url = base_url;
        }
        config.temperature = parse_var::<f32>("QUIZ_TEMPERATURE")?;
        if let Some(secs) = parse_var::<u64>("QUIZ_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl KeyFromEnv for GeminiClient {
    const KEY_NAME: &'static str = "API_KEY";
}

impl GeminiClient {
    /// Create a new Gemini client with full configuration
    pub fn new(config: GeminiConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Http(e.to_string()))?;

        info!(target: "guided_quiz::gemini", model = %config.model, "Creating new Gemini client");
        Ok(Self { config, client })
    }

    /// Build a client straight from the environment.
    ///
    /// A missing `API_KEY` surfaces as `QuizError::Configuration` before any
    /// HTTP client exists.
    pub fn from_env() -> Result<Self, QuizError> {
        let config = GeminiConfig::from_env()?;
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl TextGenerationService for GeminiClient {
    #[instrument(target = "guided_quiz::gemini", skip(self, instruction, schema), fields(prompt_len = instruction.len(), model = %self.config.model))]
    async fn submit(&self, instruction: String, schema: &ResponseSchema) -> Result<String, UpstreamError> {
        debug!(target: "guided_quiz::gemini", model = %self.config.model, prompt_len = instruction.len(), "Preparing Gemini API request");

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(instruction) }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                temperature: self.config.temperature,
            },
        };

        debug!(target: "guided_quiz::gemini", "Sending request to Gemini API");
        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(target: "guided_quiz::gemini", error = %e, "HTTP request failed");
                UpstreamError::Http(e.to_string())
            })?;

        let status = response.status();
        debug!(target: "guided_quiz::gemini", status = %status, "Received response from Gemini API");

        if status.as_u16() == 429 {
            warn!(target: "guided_quiz::gemini", "Gemini API rate limit exceeded");
            return Err(UpstreamError::RateLimit);
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            error!(target: "guided_quiz::gemini", "Gemini API authentication failed");
            return Err(UpstreamError::Authentication);
        }

        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(target: "guided_quiz::gemini", status = %status, error = %error_text, "Gemini API error");
            return Err(UpstreamError::Api { status: status.as_u16(), message: error_text });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                error!(target: "guided_quiz::gemini", error = %e, "Failed to decode Gemini response envelope");
                UpstreamError::Http(e.to_string())
            })?;

        debug!(target: "guided_quiz::gemini", candidates = body.candidates.len(), "Parsed Gemini response");

        match body.into_text() {
            Ok(text) => {
                info!(target: "guided_quiz::gemini", response_len = text.len(), "Successfully received Gemini response");
                Ok(text)
            }
            Err(reason) => {
                error!(target: "guided_quiz::gemini", %reason, "Gemini response carried no text");
                Err(UpstreamError::EmptyReply(reason))
            }
        }
    }

    fn clone_box(&self) -> Box<dyn TextGenerationService> {
        Box::new(self.clone())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
