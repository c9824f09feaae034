use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::conversation::Conversation;
use crate::models::domain::{ConversationTurn, QueryClass, ResponseMode};

/// Response for the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    pub response: String,
    pub classification: QueryClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResponseMode>,
    #[serde(rename = "matchedListings")]
    pub matched_listings: usize,
}

/// Response for starting a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartConversationResponse {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    pub status: String,
    #[serde(rename = "greetingText")]
    pub greeting_text: String,
}

/// Conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    #[serde(rename = "chatHistory")]
    pub chat_history: Vec<ConversationTurn>,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "lastActiveAt")]
    pub last_active_at: chrono::DateTime<chrono::Utc>,
}

impl HistoryResponse {
    pub fn from_conversation(conversation: &Conversation) -> Self {
        Self {
            session_id: conversation.id,
            chat_history: conversation.turns().to_vec(),
            created_at: conversation.created_at,
            last_active_at: conversation.last_active_at,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub listings: usize,
    pub sessions: u64,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
