//! Scripted chat completer for testing.
//!
//! Provides a configurable implementation of the `ChatCompleter` trait for
//! use in tests without network access. Replies are played back in order;
//! the last reply repeats once the script is exhausted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{ChatCompleter, Completion};
use crate::error::{LlmError, LlmResult};
use crate::messages::ChatMessage;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this content as the completion
    Content(String),
    /// Fail with a rate-limit error (transient)
    RateLimited,
    /// Fail with an API error of the given status
    ApiError(u16),
}

/// Scripted completer that captures prompts and plays back canned replies.
#[derive(Clone, Default)]
pub struct ScriptedCompleter {
    replies: Arc<Mutex<Vec<ScriptedReply>>>,
    next: Arc<AtomicUsize>,
    captured: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a content reply.
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(ScriptedReply::Content(content.into()));
        self
    }

    /// Queue a transient failure.
    pub fn reply_rate_limited(self) -> Self {
        self.replies.lock().unwrap().push(ScriptedReply::RateLimited);
        self
    }

    /// Queue a non-transient API failure.
    pub fn reply_api_error(self, status: u16) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(ScriptedReply::ApiError(status));
        self
    }

    /// All prompt message sets this completer has received.
    pub fn captured(&self) -> Vec<Vec<ChatMessage>> {
        self.captured.lock().unwrap().clone()
    }

    /// Number of completion calls made.
    pub fn call_count(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompleter for ScriptedCompleter {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<Completion> {
        self.captured.lock().unwrap().push(messages.to_vec());

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(LlmError::InvalidResponse(
                "no scripted replies queued".to_string(),
            ));
        }
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let reply = replies.get(index).unwrap_or_else(|| replies.last().unwrap());

        match reply {
            ScriptedReply::Content(content) => Ok(Completion {
                content: content.clone(),
                input_tokens: 0,
                output_tokens: 0,
                model: "scripted".to_string(),
            }),
            ScriptedReply::RateLimited => Err(LlmError::RateLimited {
                provider: "scripted".to_string(),
            }),
            ScriptedReply::ApiError(status) => Err(LlmError::Api {
                provider: "scripted".to_string(),
                status: *status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_play_back_in_order() {
        let completer = ScriptedCompleter::new().reply("first").reply("second");

        let first = completer.complete(&[ChatMessage::user("hi")]).await.unwrap();
        let second = completer.complete(&[ChatMessage::user("hi")]).await.unwrap();
        let third = completer.complete(&[ChatMessage::user("hi")]).await.unwrap();

        assert_eq!(first.content, "first");
        assert_eq!(second.content, "second");
        // Last reply repeats once exhausted
        assert_eq!(third.content, "second");
        assert_eq!(completer.call_count(), 3);
    }

    #[tokio::test]
    async fn test_captures_prompts() {
        let completer = ScriptedCompleter::new().reply("ok");
        completer
            .complete(&[ChatMessage::system("sys"), ChatMessage::user("do it")])
            .await
            .unwrap();

        let captured = completer.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0][1].content, "do it");
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let completer = ScriptedCompleter::new().reply_rate_limited();
        let err = completer.complete(&[]).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { .. }));
    }
}
