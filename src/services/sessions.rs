use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::conversation::Conversation;

/// A conversation guarded for exclusive, turn-at-a-time access
pub type SharedConversation = Arc<Mutex<Conversation>>;

/// In-memory conversation registry
///
/// Entries expire after `idle_timeout` without access. Each conversation has
/// its own async mutex; holding it across a turn serializes concurrent turns
/// against the same conversation.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, SharedConversation>,
    default_language: String,
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle_timeout: Duration, default_language: impl Into<String>) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_timeout)
            .build();

        Self {
            sessions,
            default_language: default_language.into(),
        }
    }

    /// Create and register a fresh conversation
    pub async fn create(&self, language: Option<&str>) -> (Uuid, SharedConversation) {
        let conversation = Conversation::new(Some(language.unwrap_or(&self.default_language)));
        let id = conversation.id;
        let shared = Arc::new(Mutex::new(conversation));
        self.sessions.insert(id, Arc::clone(&shared)).await;
        tracing::debug!("Created conversation {}", id);
        (id, shared)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedConversation> {
        self.sessions.get(id).await
    }

    /// Existing conversation for `id`, or a new one when `id` is absent
    ///
    /// Returns `None` for an unknown or expired id.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> Option<(Uuid, SharedConversation)> {
        match id {
            Some(id) => self.get(&id).await.map(|conversation| (id, conversation)),
            None => Some(self.create(None).await),
        }
    }

    /// Reset a conversation to a single fresh system turn
    ///
    /// Returns the conversation, or `None` for an unknown or expired id.
    pub async fn reset(&self, id: &Uuid, language: Option<&str>) -> Option<SharedConversation> {
        let shared = self.get(id).await?;
        shared.lock().await.reset(language);
        tracing::debug!("Reset conversation {}", id);
        Some(shared)
    }

    /// Approximate number of live conversations
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
