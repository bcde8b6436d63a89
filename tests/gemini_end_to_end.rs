
use guided_quiz::clients::{GeminiClient, GeminiConfig};
use guided_quiz::{QuizError, QuizTypeMode, Tutor, UpstreamError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::{blend_reply, PASSAGE};

const ENDPOINT: &str = "/v1beta/models/gemini-2.5-pro:generateContent";

fn candidate(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

fn tutor_for(server: &MockServer) -> Tutor<GeminiClient> {
    let config = GeminiConfig::new("test-key").with_base_url(server.uri());
    Tutor::new(GeminiClient::new(config).unwrap())
}

#[tokio::test]
async fn generates_questions_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(&blend_reply(5))))
        .expect(1)
        .mount(&server)
        .await;

    let questions = tutor_for(&server)
        .generate_guided_questions(PASSAGE, QuizTypeMode::Blend, "Ada")
        .await
        .unwrap();
    assert_eq!(questions.len(), 5);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let instruction = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(instruction.contains("Ada"));
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
}

#[tokio::test]
async fn non_json_candidate_text_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("I am unable to comply.")))
        .mount(&server)
        .await;

    let err = tutor_for(&server)
        .evaluate_user_answer("warm", "temperate")
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::Parse { .. }), "{err:?}");
}

#[tokio::test]
async fn service_error_is_an_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = tutor_for(&server)
        .generate_guided_questions(PASSAGE, QuizTypeMode::Mcq, "Ada")
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::Upstream(UpstreamError::Api { status: 503, .. })));
    assert!(err.is_retryable());
}
