pub mod clients;
pub mod config;
pub mod contract;
pub mod core;
pub mod error;
pub mod interceptors;
pub mod json_utils;
pub mod model;
pub mod prompts;
pub mod schema;
pub mod widgets;

// Convenient re-exports
pub use crate::core::{TextGenerationService, Tutor};
pub use contract::ValidationPolicy;
pub use error::{ConfigError, InterceptorError, QuizError, UpstreamError};
pub use model::{AnswerEvaluation, GuidedQuestion, QuestionType, QuizTypeMode};
pub use schema::ResponseSchema;
