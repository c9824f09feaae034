// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ListingRecord, Role, ConversationTurn, MatchStage, QueryClass, ResponseMode};
pub use requests::{ChatRequest, StartConversationRequest, SessionQuery};
pub use responses::{ChatResponse, StartConversationResponse, HistoryResponse, HealthResponse, ErrorResponse};
