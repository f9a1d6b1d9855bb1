//! Shared helpers for the agent modules.

use serde::de::DeserializeOwned;
use terragen_core::Transcript;
use terragen_llm::{extract_json_block, ChatMessage};

use crate::error::{AgentError, AgentResult};

/// Parse a model response as JSON, tolerating markdown fences.
pub(crate) fn parse_json<T: DeserializeOwned>(agent: &str, response: &str) -> AgentResult<T> {
    let payload = extract_json_block(response);
    serde_json::from_str(payload).map_err(|e| AgentError::parse(agent, e.to_string()))
}

/// Replay the transcript as chat messages so an agent sees the earlier
/// attempts and reviews of this run.
pub(crate) fn transcript_messages(transcript: &Transcript) -> Vec<ChatMessage> {
    transcript
        .exchanges()
        .iter()
        .map(|exchange| ChatMessage {
            role: exchange.role,
            content: exchange.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use terragen_core::Role;

    #[test]
    fn test_parse_json_with_fence() {
        #[derive(serde::Deserialize)]
        struct Payload {
            a: u32,
        }
        let payload: Payload = parse_json("tester", "```json\n{\"a\": 2}\n```").unwrap();
        assert_eq!(payload.a, 2);
    }

    #[test]
    fn test_parse_json_error_names_agent() {
        let err = parse_json::<serde_json::Value>("generator", "not json at all").unwrap_err();
        assert!(err.to_string().contains("generator"));
    }

    #[test]
    fn test_transcript_replay_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.append("generate", Role::User, "first");
        transcript.append("generate", Role::Assistant, "second");

        let messages = transcript_messages(&transcript);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
    }
}
