//! Per-turn conversation pipeline: classify, match, compose, generate.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::Settings;
use crate::core::classifier::{classify, response_mode};
use crate::core::composer::{default_response, format_listings};
use crate::core::conversation::Conversation;
use crate::core::matcher::ALL_LISTINGS_QUERY;
use crate::models::{ConversationTurn, MatchStage, QueryClass, ResponseMode};
use crate::services::generation::{GenerationError, LanguageModel};
use crate::services::knowledge_base::CatalogHandle;

/// Instruction for small talk
pub const GREETING_INSTRUCTION: &str = "The user is greeting you or making small talk. \
    Reply warmly in one short sentence under 15 words and offer help with UAE properties.";

/// Instruction that grounds a concise reply in the composed listing data
pub fn property_instruction(property_data: &str) -> String {
    format!(
        "Property data: {}\nAnswer the user's last message using only this property data. \
         Keep it under 25 words.",
        property_data
    )
}

/// Errors from processing a turn
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// What happened during a turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub classification: QueryClass,
    /// Set for property and follow-up turns
    pub mode: Option<ResponseMode>,
    /// The query actually handed to the matcher
    pub match_query: Option<String>,
    pub matched: usize,
    pub stage: Option<MatchStage>,
}

/// Coordinates classifier, matcher, composer and the generation service
pub struct Orchestrator {
    catalog: CatalogHandle,
    generator: Arc<dyn LanguageModel>,
    max_tokens: u32,
    timeout: Duration,
    max_message_chars: usize,
}

impl Orchestrator {
    pub fn new(catalog: CatalogHandle, generator: Arc<dyn LanguageModel>, settings: &Settings) -> Self {
        Self {
            catalog,
            generator,
            max_tokens: settings.generation.max_tokens,
            timeout: settings.generation.timeout(),
            max_message_chars: settings.assistant.max_message_chars,
        }
    }

    /// Override the generation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// Process one user utterance against `conversation`
    ///
    /// On success the user turn and the reply are appended. If generation
    /// fails the pending user turn is removed and the error is returned
    /// unchanged; nothing is retried.
    pub async fn handle_turn(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_chars {
            return Err(TurnError::MessageTooLong(self.max_message_chars));
        }

        let checkpoint = conversation.turns().len();
        conversation.push(ConversationTurn::user(text));

        let result = self.respond(conversation.turns(), text).await;
        match result {
            Ok(outcome) => {
                conversation.push(ConversationTurn::assistant(outcome.reply.clone()));
                tracing::info!(
                    "Conversation {}: {:?} turn, {} listings matched",
                    conversation.id,
                    outcome.classification,
                    outcome.matched
                );
                Ok(outcome)
            }
            Err(e) => {
                conversation.truncate(checkpoint);
                tracing::error!("Conversation {}: turn failed: {}", conversation.id, e);
                Err(e)
            }
        }
    }

    async fn respond(&self, history: &[ConversationTurn], text: &str) -> Result<TurnOutcome, TurnError> {
        let catalog = self.catalog.current();
        let classification = classify(text, history, catalog.index());

        match classification {
            QueryClass::FollowUp | QueryClass::Property => {
                let mode = response_mode(text);
                // Follow-ups recover the whole catalogue rather than parsing the elliptical text
                let match_query = if classification == QueryClass::FollowUp {
                    ALL_LISTINGS_QUERY
                } else {
                    text
                };
                let result = catalog.search(match_query);
                let composed = format_listings(&result.listings, catalog.index(), mode);

                let reply = match mode {
                    ResponseMode::Detailed => composed,
                    ResponseMode::Concise => {
                        self.generate(history, property_instruction(&composed)).await?
                    }
                };

                Ok(TurnOutcome {
                    reply,
                    classification,
                    mode: Some(mode),
                    match_query: Some(match_query.to_string()),
                    matched: result.len(),
                    stage: result.stage,
                })
            }
            QueryClass::Greeting => Ok(TurnOutcome {
                reply: self.generate(history, GREETING_INSTRUCTION.to_string()).await?,
                classification,
                mode: None,
                match_query: None,
                matched: 0,
                stage: None,
            }),
            QueryClass::Unrelated => Ok(TurnOutcome {
                reply: default_response(catalog.index()),
                classification,
                mode: None,
                match_query: None,
                matched: 0,
                stage: None,
            }),
        }
    }

    /// Call the generation service with a transient instruction turn
    async fn generate(&self, history: &[ConversationTurn], instruction: String) -> Result<String, GenerationError> {
        let mut request = history.to_vec();
        request.push(ConversationTurn::system(instruction));

        tokio::time::timeout(self.timeout, self.generator.complete(&request, self.max_tokens))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::ConversationState;
    use crate::models::{ListingRecord, Role};
    use crate::services::knowledge_base::Catalog;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingModel {
        requests: Mutex<Vec<(Vec<ConversationTurn>, u32)>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, turns: &[ConversationTurn], max_tokens: u32) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push((turns.to_vec(), max_tokens));
            Ok("generated".to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn complete(&self, _: &[ConversationTurn], _: u32) -> Result<String, GenerationError> {
            Err(GenerationError::QuotaExceeded("daily limit".to_string()))
        }
    }

    struct SlowModel;

    #[async_trait]
    impl LanguageModel for SlowModel {
        async fn complete(&self, _: &[ConversationTurn], _: u32) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok("late".to_string())
        }
    }

    fn catalog() -> CatalogHandle {
        CatalogHandle::new(Catalog::new(vec![
            ListingRecord::new("Downtown Dubai", "3.8M AED", "2BR, Burj Khalifa view", "available"),
            ListingRecord::new("Palm Jumeirah", "12M AED", "5BR villa, private beach", "available"),
        ]))
    }

    fn orchestrator(model: Arc<dyn LanguageModel>) -> Orchestrator {
        Orchestrator::new(catalog(), model, &Settings::default())
    }

    #[tokio::test]
    async fn test_concise_property_turn_uses_generation() {
        let model = Arc::new(RecordingModel::default());
        let orch = orchestrator(model.clone());
        let mut conversation = Conversation::default();

        let outcome = orch.handle_turn(&mut conversation, "Palm Jumeirah prices").await.unwrap();

        assert_eq!(outcome.classification, QueryClass::Property);
        assert_eq!(outcome.mode, Some(ResponseMode::Concise));
        assert_eq!(outcome.reply, "generated");
        assert_eq!(outcome.matched, 1);

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (turns, max_tokens) = &requests[0];
        assert_eq!(*max_tokens, 150);
        let instruction = turns.last().unwrap();
        assert_eq!(instruction.role, Role::System);
        assert!(instruction.content.contains("Palm Jumeirah 5 bhk 12M AED"));

        // The instruction turn is transient
        assert_eq!(conversation.turns().len(), 3);
        assert_eq!(conversation.turns()[2], ConversationTurn::assistant("generated"));
    }

    #[tokio::test]
    async fn test_detailed_property_turn_skips_generation() {
        let model = Arc::new(RecordingModel::default());
        let orch = orchestrator(model.clone());
        let mut conversation = Conversation::default();

        let outcome = orch
            .handle_turn(&mut conversation, "Tell me more about Downtown Dubai")
            .await
            .unwrap();

        assert_eq!(outcome.mode, Some(ResponseMode::Detailed));
        assert_eq!(
            outcome.reply,
            "Downtown Dubai 2 bhk 3.8M AED. Features: 2BR, Burj Khalifa view. Status: available."
        );
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_queries_all_listings() {
        let model = Arc::new(RecordingModel::default());
        let orch = orchestrator(model.clone());
        let mut conversation = Conversation::default();
        conversation.push(ConversationTurn::user("Please give me the pricing of the all of the property."));
        conversation.push(ConversationTurn::assistant(
            "Downtown Dubai: 3.8M AED for a 2BR apartment with Burj Khalifa view and luxury amenities.",
        ));

        let outcome = orch
            .handle_turn(&mut conversation, "Are you the only one of them?")
            .await
            .unwrap();

        assert_eq!(outcome.classification, QueryClass::FollowUp);
        assert_eq!(outcome.match_query.as_deref(), Some(ALL_LISTINGS_QUERY));
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.stage, Some(MatchStage::All));
    }

    #[tokio::test]
    async fn test_greeting_turn() {
        let model = Arc::new(RecordingModel::default());
        let orch = orchestrator(model.clone());
        let mut conversation = Conversation::default();

        let outcome = orch.handle_turn(&mut conversation, "Good evening!").await.unwrap();

        assert_eq!(outcome.classification, QueryClass::Greeting);
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].0.last().unwrap().content, GREETING_INSTRUCTION);
    }

    #[tokio::test]
    async fn test_unrelated_turn_uses_default_response() {
        let model = Arc::new(RecordingModel::default());
        let orch = orchestrator(model.clone());
        let mut conversation = Conversation::default();

        let outcome = orch.handle_turn(&mut conversation, "qwerty").await.unwrap();

        assert_eq!(outcome.classification, QueryClass::Unrelated);
        assert_eq!(
            outcome.reply,
            "I'm a UAE property assistant. Ask about Downtown Dubai, Palm Jumeirah."
        );
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_rolls_back_user_turn() {
        let orch = orchestrator(Arc::new(FailingModel));
        let mut conversation = Conversation::default();

        let err = orch.handle_turn(&mut conversation, "hello").await.unwrap_err();

        assert!(matches!(err, TurnError::Generation(GenerationError::QuotaExceeded(_))));
        assert_eq!(conversation.state(), ConversationState::Fresh);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let orch = orchestrator(Arc::new(SlowModel)).with_timeout(Duration::from_millis(20));
        let mut conversation = Conversation::default();

        let err = orch.handle_turn(&mut conversation, "hello").await.unwrap_err();

        assert!(matches!(err, TurnError::Generation(GenerationError::Timeout(_))));
        assert_eq!(conversation.turns().len(), 1);
    }

    #[tokio::test]
    async fn test_message_validation() {
        let orch = orchestrator(Arc::new(RecordingModel::default()));
        let mut conversation = Conversation::default();

        assert!(matches!(
            orch.handle_turn(&mut conversation, "   ").await,
            Err(TurnError::EmptyMessage)
        ));
        let long = "a".repeat(2001);
        assert!(matches!(
            orch.handle_turn(&mut conversation, &long).await,
            Err(TurnError::MessageTooLong(2000))
        ));
    }

    #[tokio::test]
    async fn test_empty_catalog_degrades() {
        let orch = Orchestrator::new(
            CatalogHandle::default(),
            Arc::new(RecordingModel::default()),
            &Settings::default(),
        );
        let mut conversation = Conversation::default();

        let outcome = orch.handle_turn(&mut conversation, "qwerty").await.unwrap();
        assert_eq!(outcome.reply, "I'm a UAE property assistant. Ask about .");
    }
}
