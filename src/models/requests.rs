use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to process one user utterance
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(alias = "session_id", rename = "sessionId", default)]
    pub session_id: Option<Uuid>,
}

/// Request to start a new conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StartConversationRequest {
    #[validate(length(min = 1, max = 64))]
    #[serde(default)]
    pub language: Option<String>,
}

/// Query string identifying a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionQuery {
    #[serde(alias = "session_id", rename = "sessionId")]
    pub session_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_accepts_both_id_spellings() {
        let id = Uuid::new_v4();
        let camel: ChatRequest =
            serde_json::from_str(&format!(r#"{{"message":"hi","sessionId":"{}"}}"#, id)).unwrap();
        let snake: ChatRequest =
            serde_json::from_str(&format!(r#"{{"message":"hi","session_id":"{}"}}"#, id)).unwrap();
        assert_eq!(camel.session_id, Some(id));
        assert_eq!(snake.session_id, Some(id));
    }

    #[test]
    fn test_chat_request_rejects_empty_message() {
        let req = ChatRequest { message: String::new(), session_id: None };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_start_conversation_language_optional() {
        let req: StartConversationRequest = serde_json::from_str("{}").unwrap();
        assert!(req.language.is_none());
        assert!(req.validate().is_ok());
    }
}
