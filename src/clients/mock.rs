use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::TextGenerationService;
use crate::error::UpstreamError;
use crate::schema::ResponseSchema;

/// A scripted reply for `MockService`.
#[derive(Debug)]
pub enum MockReply {
    Text(String),
    Error(UpstreamError),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }
}

/// One recorded call to `MockService::submit`.
#[derive(Debug, Clone)]
pub struct Submission {
    pub instruction: String,
    pub schema: ResponseSchema,
}

/// Shared control surface for a `MockService` and its clones.
#[derive(Debug, Default)]
pub struct MockHandle {
    replies: Mutex<VecDeque<MockReply>>,
    submissions: Mutex<Vec<Submission>>,
}

impl MockHandle {
    pub fn push_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push_reply(MockReply::text(text));
    }

    pub fn push_error(&self, error: UpstreamError) {
        self.push_reply(MockReply::Error(error));
    }

    /// Every submission seen so far, oldest first.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// In-process stand-in for a hosted model; replies come from a queue.
#[derive(Debug, Clone)]
pub struct MockService {
    handle: Arc<MockHandle>,
}

impl MockService {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_replies(replies: Vec<MockReply>) -> (Self, Arc<MockHandle>) {
        let (service, handle) = Self::new();
        for reply in replies {
            handle.push_reply(reply);
        }
        (service, handle)
    }
}

#[async_trait]
impl TextGenerationService for MockService {
    async fn submit(&self, instruction: String, schema: &ResponseSchema) -> Result<String, UpstreamError> {
        self.handle
            .submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Submission { instruction, schema: schema.clone() });

        let next = self.handle.replies.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(error)) => Err(error),
            None => Err(UpstreamError::EmptyReply("mock reply queue is empty".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn TextGenerationService> {
        Box::new(self.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
