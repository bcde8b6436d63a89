//! Records exchanged with the caller: guided questions, answer evaluations and
//! the quiz-type selector.
//!
//! Field doc comments double as descriptions in the response schema sent to
//! the model, so they are written for that reader.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single guided question derived from the passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuidedQuestion {
    /// The analysis category, e.g. 'Sentence Types'.
    pub category: String,
    /// The question, addressed to the student directly.
    pub question: String,
    /// A helpful hint to guide the student.
    pub hint: String,
    /// A concise, correct answer to the question.
    pub answer: String,
    /// A detailed explanation of the correct answer and its literary effect.
    pub explanation: String,
    /// The exact quote from the original text this question is about.
    pub relevant_text: String,
    /// The type of question ('mcq' or 'descriptive').
    pub question_type: QuestionType,
    /// For 'mcq' questions only: exactly 4 options, one equal to the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl GuidedQuestion {
    pub fn is_mcq(&self) -> bool {
        self.question_type == QuestionType::Mcq
    }

    /// Grade a multiple-choice pick by exact match against the answer.
    ///
    /// Returns `None` for descriptive questions, which need the evaluator.
    pub fn check_choice(&self, choice: &str) -> Option<bool> {
        self.is_mcq().then(|| choice == self.answer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Descriptive,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "mcq"),
            QuestionType::Descriptive => write!(f, "descriptive"),
        }
    }
}

/// The grader's verdict on a free-text answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    /// True if the student's answer is substantially correct.
    pub is_correct: bool,
    /// A short, encouraging message explaining why the answer was right or wrong.
    pub feedback: String,
}

/// Which kinds of question a quiz should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizTypeMode {
    Mcq,
    Descriptive,
    #[default]
    Blend,
}

impl QuizTypeMode {
    /// Whether a question of `kind` may appear in a quiz of this mode.
    pub fn allows(&self, kind: QuestionType) -> bool {
        match self {
            QuizTypeMode::Mcq => kind == QuestionType::Mcq,
            QuizTypeMode::Descriptive => kind == QuestionType::Descriptive,
            QuizTypeMode::Blend => true,
        }
    }
}

impl FromStr for QuizTypeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" => Ok(Self::Mcq),
            "descriptive" => Ok(Self::Descriptive),
            "blend" => Ok(Self::Blend),
            _ => Err(format!("Unknown quiz type: '{}'. Supported: mcq, descriptive, blend", s)),
        }
    }
}

impl fmt::Display for QuizTypeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizTypeMode::Mcq => write!(f, "mcq"),
            QuizTypeMode::Descriptive => write!(f, "descriptive"),
            QuizTypeMode::Blend => write!(f, "blend"),
        }
    }
}
