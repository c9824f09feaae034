// Core algorithm exports
pub mod classifier;
pub mod composer;
pub mod conversation;
pub mod index;
pub mod matcher;
pub mod orchestrator;
pub mod price;

pub use classifier::{classify, is_follow_up, is_greeting_or_general, is_property_related, response_mode};
pub use composer::{default_response, format_detailed_property_response, format_listings, format_property_response};
pub use conversation::{Conversation, ConversationState, GREETING_TEXT};
pub use index::KnowledgeIndex;
pub use matcher::{search, MatchResult, ALL_LISTINGS_QUERY};
pub use orchestrator::{Orchestrator, TurnError, TurnOutcome};
