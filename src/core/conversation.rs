//! Conversation transcript and its lifecycle.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ConversationTurn, Role};

pub const DEFAULT_LANGUAGE: &str = "English";

/// Opening line spoken when a conversation starts
pub const GREETING_TEXT: &str = "Hello! I'm Verbi. UAE Property assistant. How can I help?";

/// System prompt that seeds every conversation
pub fn system_prompt(language: &str) -> String {
    format!(
        "You are a UAE Property Assistant called Verbi. \
         You are professional and very concise, specializing in UAE real estate information. \
         You can help users with property queries, greetings, pricing, and accounting questions. \
         Provide very short answers under 25 words. Key facts only. Please respond in {}.",
        language
    )
}

/// Lifecycle state of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Only the system turn is present
    Fresh,
    /// At least one user turn has been processed
    Active,
}

/// A single conversation: the ordered transcript plus bookkeeping
///
/// The transcript is append-only between resets. Only the orchestrator
/// appends; everyone else reads through [`Conversation::turns`].
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    language: String,
    turns: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(language: Option<&str>) -> Self {
        let language = language.unwrap_or(DEFAULT_LANGUAGE).to_string();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            turns: vec![ConversationTurn::system(system_prompt(&language))],
            language,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Read-only view of the transcript
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn state(&self) -> ConversationState {
        if self.turns.iter().any(|turn| turn.role != Role::System) {
            ConversationState::Active
        } else {
            ConversationState::Fresh
        }
    }

    /// Replace the whole transcript with one fresh system turn
    pub fn reset(&mut self, language: Option<&str>) {
        if let Some(language) = language {
            self.language = language.to_string();
        }
        self.turns = vec![ConversationTurn::system(system_prompt(&self.language))];
        self.last_active_at = Utc::now();
    }

    pub(crate) fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.last_active_at = Utc::now();
    }

    /// Drop turns appended after `len`, used to abandon a failed turn
    pub(crate) fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(None)
    }
}
