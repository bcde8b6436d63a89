//! Core API: a text-generation capability and the `Tutor` that turns it into
//! validated quizzes and answer evaluations.
//!
//! - `Tutor::generate_guided_questions` builds the tutoring instruction,
//!   declares the question schema and validates the reply.
//! - `Tutor::evaluate_user_answer` asks for a semantic correctness verdict.
//!
//! Each call is exactly one exchange with the service. Nothing is retried or
//! cached; errors reach the caller unchanged.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn, instrument};

use crate::contract::{parse_answer_evaluation, parse_guided_questions, ValidationPolicy};
use crate::error::{QuizError, UpstreamError};
use crate::interceptors::Interceptor;
use crate::model::{AnswerEvaluation, GuidedQuestion, QuizTypeMode};
use crate::prompts::{evaluation_instruction, guided_questions_instruction};
use crate::schema::ResponseSchema;

/// Capability to run one instruction against a hosted model.
///
/// Implementors send the instruction together with the declared response
/// schema and return the raw reply text; parsing happens in `Tutor`.
#[async_trait]
pub trait TextGenerationService: Send + Sync + Debug {
    async fn submit(&self, instruction: String, schema: &ResponseSchema) -> Result<String, UpstreamError>;

    /// Clone this service into a boxed trait object
    fn clone_box(&self) -> Box<dyn TextGenerationService>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

impl Clone for Box<dyn TextGenerationService> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl TextGenerationService for Box<dyn TextGenerationService> {
    async fn submit(&self, instruction: String, schema: &ResponseSchema) -> Result<String, UpstreamError> {
        self.as_ref().submit(instruction, schema).await
    }

    fn clone_box(&self) -> Box<dyn TextGenerationService> {
        self.as_ref().clone_box()
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }
}

/// Generates guided questions and grades answers through a `TextGenerationService`.
#[derive(Debug, Clone)]
pub struct Tutor<S: TextGenerationService> {
    service: S,
    policy: ValidationPolicy,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl<S: TextGenerationService> Tutor<S> {
    pub fn new(service: S) -> Self {
        info!(target: "guided_quiz::tutor", service = service.name(), "Creating new Tutor");
        Self {
            service,
            policy: ValidationPolicy::default(),
            interceptor: None,
        }
    }

    /// Replace the validation policy
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Record every exchange with `interceptor`
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Generate 5-7 guided questions about `text` for `user_name`.
    #[instrument(target = "guided_quiz::tutor", skip(self, text, user_name), fields(text_len = text.len()))]
    pub async fn generate_guided_questions(
        &self,
        text: &str,
        quiz_type: QuizTypeMode,
        user_name: &str,
    ) -> Result<Vec<GuidedQuestion>, QuizError> {
        if text.trim().is_empty() {
            return Err(QuizError::InvalidInput("passage is empty".to_string()));
        }

        let instruction = guided_questions_instruction(text, quiz_type, user_name);
        let schema = ResponseSchema::guided_questions();
        let reply = self.exchange(instruction, &schema).await?;

        let questions = parse_guided_questions(&reply, text, quiz_type, &self.policy)?;
        info!(target: "guided_quiz::tutor", question_count = questions.len(), "Generated guided questions");
        Ok(questions)
    }

    /// Ask the service whether `user_answer` captures the idea of `correct_answer`.
    #[instrument(target = "guided_quiz::tutor", skip_all, fields(answer_len = user_answer.len()))]
    pub async fn evaluate_user_answer(
        &self,
        user_answer: &str,
        correct_answer: &str,
    ) -> Result<AnswerEvaluation, QuizError> {
        let instruction = evaluation_instruction(user_answer, correct_answer);
        let schema = ResponseSchema::answer_evaluation();
        let reply = self.exchange(instruction, &schema).await?;

        let evaluation = parse_answer_evaluation(&reply)?;
        info!(target: "guided_quiz::tutor", is_correct = evaluation.is_correct, "Evaluated answer");
        Ok(evaluation)
    }

    async fn exchange(&self, instruction: String, schema: &ResponseSchema) -> Result<String, QuizError> {
        let recorded = self.interceptor.as_ref().map(|_| instruction.clone());
        let reply = self.service.submit(instruction, schema).await?;

        if let (Some(interceptor), Some(instruction)) = (&self.interceptor, recorded) {
            if let Err(e) = interceptor.save(&instruction, &reply).await {
                warn!(target: "guided_quiz::tutor", error = %e, "Failed to record exchange");
            }
        }
        Ok(reply)
    }
}
