//! Validation of model replies against the response contract.
//!
//! A reply goes through three gates: it must be JSON at all (`Parse`), it must
//! decode into the record types (`SchemaViolation`), and every item must honour
//! the invariants the instruction asked for (`SchemaViolation`).

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::QuizError;
use crate::json_utils::isolate_payload;
use crate::model::{AnswerEvaluation, GuidedQuestion, QuestionType, QuizTypeMode};

pub const MCQ_OPTION_COUNT: usize = 4;

/// Which contract checks are enforced locally instead of trusted to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Accepted number of questions per quiz.
    pub question_count: RangeInclusive<usize>,
    /// Reject questions whose `relevantText` is not a literal substring of the passage.
    pub require_verbatim_relevant_text: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            question_count: 5..=7,
            require_verbatim_relevant_text: true,
        }
    }
}

impl ValidationPolicy {
    /// Only the structural checks: any non-empty count, quotes unchecked.
    pub fn lenient() -> Self {
        Self {
            question_count: 1..=usize::MAX,
            require_verbatim_relevant_text: false,
        }
    }
}

/// Parse and validate a question-generation reply.
pub fn parse_guided_questions(
    raw: &str,
    passage: &str,
    mode: QuizTypeMode,
    policy: &ValidationPolicy,
) -> Result<Vec<GuidedQuestion>, QuizError> {
    let mut questions: Vec<GuidedQuestion> = decode(raw)?;

    if !policy.question_count.contains(&questions.len()) {
        return Err(violation(
            format!(
                "expected {}..={} questions, got {}",
                policy.question_count.start(),
                policy.question_count.end(),
                questions.len()
            ),
            raw,
        ));
    }

    for (index, question) in questions.iter_mut().enumerate() {
        check_question(question, passage, mode, policy)
            .map_err(|reason| violation(format!("question {}: {}", index + 1, reason), raw))?;
    }

    debug!(target: "guided_quiz::contract", count = questions.len(), %mode, "questions passed validation");
    Ok(questions)
}

/// Parse and validate an answer-evaluation reply.
pub fn parse_answer_evaluation(raw: &str) -> Result<AnswerEvaluation, QuizError> {
    let evaluation: AnswerEvaluation = decode(raw)?;
    if evaluation.feedback.trim().is_empty() {
        return Err(violation("feedback is empty", raw));
    }
    Ok(evaluation)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, QuizError> {
    let payload = isolate_payload(raw);
    let value: Value = serde_json::from_str(payload).map_err(|source| {
        warn!(target: "guided_quiz::contract", error = %source, raw_len = raw.len(), "reply is not JSON");
        QuizError::Parse { source, raw: raw.to_string() }
    })?;
    serde_json::from_value(value).map_err(|e| violation(e.to_string(), raw))
}

/// Checks one question, normalising an empty `options` array on descriptive items.
fn check_question(
    question: &mut GuidedQuestion,
    passage: &str,
    mode: QuizTypeMode,
    policy: &ValidationPolicy,
) -> Result<(), String> {
    let required = [
        ("category", &question.category),
        ("question", &question.question),
        ("hint", &question.hint),
        ("answer", &question.answer),
        ("explanation", &question.explanation),
        ("relevantText", &question.relevant_text),
    ];
    if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(format!("'{}' is empty", name));
    }

    if !mode.allows(question.question_type) {
        return Err(format!("'{}' question not allowed in a {} quiz", question.question_type, mode));
    }

    match question.question_type {
        QuestionType::Mcq => {
            let options = question
                .options
                .as_ref()
                .ok_or_else(|| "mcq question has no options".to_string())?;
            if options.len() != MCQ_OPTION_COUNT {
                return Err(format!("expected {} options, got {}", MCQ_OPTION_COUNT, options.len()));
            }
            let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
            if distinct.len() != options.len() {
                return Err("options are not distinct".to_string());
            }
            if !distinct.contains(question.answer.as_str()) {
                return Err("answer does not match any option".to_string());
            }
        }
        QuestionType::Descriptive => {
            if question.options.as_ref().is_some_and(|options| !options.is_empty()) {
                return Err("descriptive question carries options".to_string());
            }
            question.options = None;
        }
    }

    if policy.require_verbatim_relevant_text && !passage.contains(question.relevant_text.as_str()) {
        return Err("relevantText is not a verbatim substring of the passage".to_string());
    }

    Ok(())
}

fn violation(reason: impl Into<String>, raw: &str) -> QuizError {
    let reason = reason.into();
    warn!(target: "guided_quiz::contract", %reason, payload = %raw, "reply violates response contract");
    QuizError::violation(reason, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PASSAGE: &str = "It was a dark and stormy night; the rain fell in torrents.";

    fn mcq_item(answer: &str, options: &[&str]) -> Value {
        json!({
            "category": "Lexical Choice",
            "question": "Which word intensifies the rainfall?",
            "hint": "Look at the final phrase.",
            "answer": answer,
            "explanation": "'Torrents' exaggerates the volume of rain.",
            "relevantText": "the rain fell in torrents",
            "questionType": "mcq",
            "options": options,
        })
    }

    fn descriptive_item() -> Value {
        json!({
            "category": "Sentence Types",
            "question": "How does the semicolon shape the sentence?",
            "hint": "Compare the two clauses.",
            "answer": "It joins two related independent clauses.",
            "explanation": "The pause builds suspense.",
            "relevantText": "It was a dark and stormy night;",
            "questionType": "descriptive",
        })
    }

    fn reply(items: Vec<Value>) -> String {
        Value::Array(items).to_string()
    }

    fn valid_mcq() -> Value {
        mcq_item("torrents", &["torrents", "rain", "night", "dark"])
    }

    fn blend_reply(count: usize) -> String {
        let items = (0..count)
            .map(|i| if i % 2 == 0 { valid_mcq() } else { descriptive_item() })
            .collect();
        reply(items)
    }

    #[test]
    fn accepts_a_conforming_blend() {
        let questions = parse_guided_questions(
            &blend_reply(5),
            PASSAGE,
            QuizTypeMode::Blend,
            &ValidationPolicy::default(),
        )
        .unwrap();
        assert_eq!(questions.len(), 5);
        for q in &questions {
            match q.question_type {
                QuestionType::Mcq => {
                    let options = q.options.as_ref().unwrap();
                    assert_eq!(options.len(), 4);
                    assert!(options.contains(&q.answer));
                }
                QuestionType::Descriptive => assert!(q.options.is_none()),
            }
        }
    }

    #[test]
    fn non_json_reply_is_a_parse_error() {
        let err = parse_guided_questions(
            "Sorry, I can't do that.",
            PASSAGE,
            QuizTypeMode::Blend,
            &ValidationPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::Parse { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_required_field_is_a_schema_violation() {
        let mut item = descriptive_item();
        item.as_object_mut().unwrap().remove("hint");
        let raw = reply(vec![item; 5]);
        let err = parse_guided_questions(&raw, PASSAGE, QuizTypeMode::Descriptive, &ValidationPolicy::default())
            .unwrap_err();
        match err {
            QuizError::SchemaViolation { reason, payload } => {
                assert!(reason.contains("hint"), "{reason}");
                assert_eq!(payload, raw);
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn object_instead_of_array_is_a_schema_violation() {
        let raw = descriptive_item().to_string();
        let err = parse_guided_questions(&raw, PASSAGE, QuizTypeMode::Descriptive, &ValidationPolicy::lenient())
            .unwrap_err();
        assert!(matches!(err, QuizError::SchemaViolation { .. }));
    }

    #[test]
    fn mcq_without_options_is_rejected() {
        let mut item = valid_mcq();
        item.as_object_mut().unwrap().remove("options");
        let err = parse_guided_questions(&reply(vec![item; 5]), PASSAGE, QuizTypeMode::Mcq, &ValidationPolicy::default())
            .unwrap_err();
        assert!(err.to_string().contains("no options"));
    }

    #[test]
    fn mcq_needs_four_distinct_options_containing_the_answer() {
        let cases = [
            (mcq_item("torrents", &["torrents", "rain", "night"]), "expected 4 options"),
            (mcq_item("torrents", &["torrents", "rain", "rain", "dark"]), "not distinct"),
            (mcq_item("downpour", &["torrents", "rain", "night", "dark"]), "answer does not match"),
        ];
        for (item, expected) in cases {
            let err = parse_guided_questions(&reply(vec![item; 5]), PASSAGE, QuizTypeMode::Mcq, &ValidationPolicy::default())
                .unwrap_err();
            assert!(err.to_string().contains(expected), "{err}");
        }
    }

    #[test]
    fn descriptive_with_options_is_rejected_but_empty_options_are_dropped() {
        let mut with_options = descriptive_item();
        with_options["options"] = json!(["a", "b", "c", "d"]);
        let err = parse_guided_questions(
            &reply(vec![with_options; 5]),
            PASSAGE,
            QuizTypeMode::Descriptive,
            &ValidationPolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("carries options"));

        let mut empty = descriptive_item();
        empty["options"] = json!([]);
        let questions = parse_guided_questions(
            &reply(vec![empty; 5]),
            PASSAGE,
            QuizTypeMode::Descriptive,
            &ValidationPolicy::default(),
        )
        .unwrap();
        assert!(questions.iter().all(|q| q.options.is_none()));
    }

    #[test]
    fn question_type_must_match_the_mode() {
        let err = parse_guided_questions(&blend_reply(5), PASSAGE, QuizTypeMode::Mcq, &ValidationPolicy::default())
            .unwrap_err();
        assert!(err.to_string().contains("not allowed in a mcq quiz"));
    }

    #[test]
    fn question_count_is_enforced() {
        for count in [4, 8] {
            let err = parse_guided_questions(
                &blend_reply(count),
                PASSAGE,
                QuizTypeMode::Blend,
                &ValidationPolicy::default(),
            )
            .unwrap_err();
            assert!(err.to_string().contains("expected 5..=7 questions"));
        }
        assert!(parse_guided_questions(&blend_reply(7), PASSAGE, QuizTypeMode::Blend, &ValidationPolicy::default()).is_ok());
    }

    #[test]
    fn paraphrased_quote_is_rejected_unless_lenient() {
        let mut item = descriptive_item();
        item["relevantText"] = json!("a dark, stormy night");
        let raw = reply(vec![item; 5]);
        let err = parse_guided_questions(&raw, PASSAGE, QuizTypeMode::Descriptive, &ValidationPolicy::default())
            .unwrap_err();
        assert!(err.to_string().contains("verbatim substring"));
        assert!(parse_guided_questions(&raw, PASSAGE, QuizTypeMode::Descriptive, &ValidationPolicy::lenient()).is_ok());
    }

    #[test]
    fn fenced_reply_is_accepted() {
        let raw = format!("```json\n{}\n```", blend_reply(5));
        assert!(parse_guided_questions(&raw, PASSAGE, QuizTypeMode::Blend, &ValidationPolicy::default()).is_ok());
    }

    #[test]
    fn evaluation_reply_is_parsed() {
        let eval = parse_answer_evaluation(r#" {"isCorrect": false, "feedback": "Close, but look again."} "#).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.feedback, "Close, but look again.");
    }

    #[test]
    fn evaluation_errors_follow_the_taxonomy() {
        assert!(matches!(parse_answer_evaluation("not json"), Err(QuizError::Parse { .. })));
        assert!(matches!(
            parse_answer_evaluation(r#"{"isCorrect": "yes", "feedback": "ok"}"#),
            Err(QuizError::SchemaViolation { .. })
        ));
        assert!(matches!(
            parse_answer_evaluation(r#"{"isCorrect": true, "feedback": "  "}"#),
            Err(QuizError::SchemaViolation { .. })
        ));
    }
}
