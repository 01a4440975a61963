//! ============================================================================
//! Conversation Session - Caller-Owned Message History
//! ============================================================================
//! The session owns the ordered history of user/assistant turns and hands a
//! snapshot of it to the dispatcher as context. History is append-only:
//! nothing in the core reorders or deletes turns.
//! ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::dispatcher::QueryDispatcher;

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Ordered, append-only sequence of chat turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    turns: Vec<ChatTurn>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// Builder-style append
    pub fn with(mut self, turn: ChatTurn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    /// Copy of the newest `max_turns` turns, order preserved
    pub fn tail(&self, max_turns: usize) -> Self {
        let start = self.turns.len().saturating_sub(max_turns);
        Self {
            turns: self.turns[start..].to_vec(),
        }
    }
}

impl FromIterator<ChatTurn> for ConversationContext {
    fn from_iter<I: IntoIterator<Item = ChatTurn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}

/// Chat history for one user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    history: ConversationContext,
    /// Turns handed to handlers per request (newest kept)
    context_turns: usize,
}

impl ConversationSession {
    /// Default number of prior turns forwarded as context
    pub const DEFAULT_CONTEXT_TURNS: usize = 10;

    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            history: ConversationContext::new(),
            context_turns: Self::DEFAULT_CONTEXT_TURNS,
        }
    }

    pub fn with_context_turns(mut self, turns: usize) -> Self {
        self.context_turns = turns;
        self
    }

    pub fn history(&self) -> &ConversationContext {
        &self.history
    }

    pub fn context_turns(&self) -> usize {
        self.context_turns
    }

    /// Context for the next request, bounded by this session's window
    pub fn context(&self) -> ConversationContext {
        self.context_window(self.context_turns)
    }

    /// Newest `max_turns` turns of history, for handing to handlers
    pub fn context_window(&self, max_turns: usize) -> ConversationContext {
        self.history.tail(max_turns)
    }

    /// Append a completed user/assistant exchange
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.history.push(ChatTurn::user(user));
        self.history.push(ChatTurn::assistant(assistant));
        debug!("Session {} now holds {} turns", self.id, self.history.len());
    }

    /// Dispatch a typed question with this session's context and record the reply.
    /// Blank input is ignored and yields `None`.
    pub async fn ask(&mut self, dispatcher: &QueryDispatcher, text: &str) -> Option<String> {
        let question = text.trim();
        if question.is_empty() {
            return None;
        }

        let context = self.context();
        let reply = dispatcher.dispatch(question, &context).await;
        self.record_exchange(question, &reply);
        Some(reply)
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}
