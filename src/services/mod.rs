// Service exports
pub mod generation;
pub mod knowledge_base;
pub mod sessions;

pub use generation::{ChatCompletionsClient, GenerationError, LanguageModel};
pub use knowledge_base::{load_listings, load_or_empty, spawn_reload_task, Catalog, CatalogHandle, KnowledgeBaseError};
pub use sessions::{SessionStore, SharedConversation};
