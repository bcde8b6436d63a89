use thiserror::Error;

/// Everything that can go wrong while generating or grading a quiz.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("reply is not valid JSON: {source}. Raw reply: {raw}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
    #[error("reply violates the response contract: {reason}")]
    SchemaViolation { reason: String, payload: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl QuizError {
    /// Only transport and service failures are worth retrying; a malformed or
    /// non-conforming reply points at contract drift.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuizError::Upstream(_))
    }

    pub(crate) fn violation(reason: impl Into<String>, payload: &str) -> Self {
        QuizError::SchemaViolation {
            reason: reason.into(),
            payload: payload.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} environment variable not set")]
    MissingKey { name: &'static str },
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
    #[error("service returned no text: {0}")]
    EmptyReply(String),
}

#[derive(Error, Debug)]
pub enum InterceptorError {
    #[error("failed to write transcript {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
