//! Append-only exchange log shared by the generator and validator.
//!
//! One transcript is created per run, appended to by the sub-calls the
//! iteration controller makes, and discarded when the run ends. Later
//! iterations read it to reference earlier attempts and their failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced an exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single recorded exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// Unique exchange ID
    pub id: Uuid,
    /// Pipeline stage that recorded the exchange
    pub stage: String,
    /// Role of the speaker
    pub role: Role,
    /// Exchange content
    pub content: String,
    /// When the exchange was recorded
    pub at: DateTime<Utc>,
}

/// The shared context for one end-to-end run.
///
/// Grows monotonically: exchanges are appended, never rewritten or removed.
/// The controller is the only writer; sub-calls receive it by mutable
/// reference one at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Run this transcript belongs to
    pub run_id: Uuid,
    exchanges: Vec<Exchange>,
}

impl Transcript {
    /// Create an empty transcript for a new run.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            exchanges: Vec::new(),
        }
    }

    /// Append an exchange.
    pub fn append(&mut self, stage: impl Into<String>, role: Role, content: impl Into<String>) {
        self.exchanges.push(Exchange {
            id: Uuid::new_v4(),
            stage: stage.into(),
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    /// All exchanges recorded so far, in order.
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Number of recorded exchanges.
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Check if the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
