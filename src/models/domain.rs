use serde::{Deserialize, Serialize};

/// A single real-estate listing from the knowledge base
///
/// Every field is free text. Fields missing from the source document
/// deserialize to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListingRecord {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub status: String,
}

impl ListingRecord {
    pub fn new(location: &str, price: &str, features: &str, status: &str) -> Self {
        Self {
            location: location.to_string(),
            price: price.to_string(),
            features: features.to_string(),
            status: status.to_string(),
        }
    }

    /// Composite identity used for deduplication
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.location, &self.price, &self.features)
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
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

/// Which cascade stage produced a match result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    All,
    Location,
    Feature,
    PriceLiteral,
    BudgetCeiling,
}

/// Classification outcome for an incoming utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    FollowUp,
    Property,
    Greeting,
    Unrelated,
}

/// Verbosity of a property reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Concise,
    Detailed,
}
