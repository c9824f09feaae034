//! Property Concierge - conversational query engine for UAE property listings
//!
//! Given a user utterance and the conversation so far, the engine decides
//! whether the utterance is a follow-up, a property question, small talk or
//! unrelated, retrieves matching listings from an in-memory knowledge base
//! with a cascade of keyword and price strategies, and composes a short
//! textual answer, optionally phrased by a language-generation service.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{classify, search, Conversation, KnowledgeIndex, Orchestrator, TurnError, TurnOutcome};
pub use models::{ConversationTurn, ListingRecord, MatchStage, QueryClass, ResponseMode};
pub use services::{Catalog, CatalogHandle, GenerationError, LanguageModel, SessionStore};
