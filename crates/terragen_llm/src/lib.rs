//! # terragen_llm
//!
//! LLM adapter for terragen.
//!
//! Supports OpenAI and Anthropic chat APIs, selected via environment
//! variables or a workspace settings file. Calls are single-shot: retry
//! policy lives with the caller (the iteration controller), and `LlmError`
//! carries the transient/fatal classification the caller needs.

pub mod client;
pub mod error;
pub mod extract;
pub mod messages;
pub mod mock;

pub use client::{ChatCompleter, Completion, LlmClient, LlmProvider};
pub use error::{LlmError, LlmResult};
pub use extract::extract_json_block;
pub use messages::ChatMessage;
pub use mock::ScriptedCompleter;
