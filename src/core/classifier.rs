use crate::core::index::KnowledgeIndex;
use crate::models::{ConversationTurn, QueryClass, ResponseMode, Role};

/// Phrases that refer back to listings mentioned earlier
pub const FOLLOW_UP_PHRASES: &[&str] = &[
    "are you the only one", "only one", "just that", "only that",
    "is that all", "that's it", "nothing else", "any others",
    "more options", "other properties", "different ones",
    "what else", "anything else", "other locations", "other areas",
];

/// Bare pronouns that may point at earlier listings
pub const FOLLOW_UP_PRONOUNS: &[&str] = &["them", "those", "that", "this", "it"];

/// Evidence that an assistant turn talked about listings (phrase follow-ups)
pub const PHRASE_CONTEXT_MARKERS: &[&str] = &[
    "property", "properties", "dubai", "aed", "bedroom", "bhk", "location",
];

/// Evidence that an assistant turn talked about listings (pronoun follow-ups)
pub const PRONOUN_CONTEXT_MARKERS: &[&str] = &[
    "property", "properties", "dubai", "aed", "bedroom",
];

/// How many trailing turns a pronoun may reach back into
pub const PRONOUN_WINDOW: usize = 4;

/// Requests for more detail about listings
pub const DETAIL_REQUEST_KEYWORDS: &[&str] = &[
    "yes", "want", "details", "more", "information", "tell me", "show me", "provide",
];

/// Greetings, small talk and acknowledgements
pub const GENERAL_KEYWORDS: &[&str] = &[
    "hello", "hi", "hey", "good morning", "good afternoon", "good evening",
    "how are you", "what is your name", "who are you", "tell me about yourself",
    "what can you do", "help", "pricing", "accounting", "services",
    "thank you", "thanks", "bye", "goodbye", "see you",
    "nice", "good", "great", "excellent", "perfect", "awesome", "amazing",
    "wow", "cool", "fantastic", "wonderful", "lovely", "beautiful",
    "that's nice", "that's good", "that's great", "sounds good",
    "okay", "ok", "alright", "fine", "sure", "yes", "yeah", "yep",
    "interesting", "impressive", "not bad", "pretty good",
];

#[inline]
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// True when the query refers back to listings the assistant already described
pub fn is_follow_up(query: &str, history: &[ConversationTurn]) -> bool {
    let query_lower = query.to_lowercase();

    if contains_any(&query_lower, FOLLOW_UP_PHRASES) {
        let last_assistant = history
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant);

        if let Some(turn) = last_assistant {
            if contains_any(&turn.content.to_lowercase(), PHRASE_CONTEXT_MARKERS) {
                return true;
            }
        }
    }

    if contains_any(&query_lower, FOLLOW_UP_PRONOUNS) {
        let window_start = history.len().saturating_sub(PRONOUN_WINDOW);
        return history[window_start..].iter().any(|turn| {
            turn.role == Role::Assistant
                && contains_any(&turn.content.to_lowercase(), PRONOUN_CONTEXT_MARKERS)
        });
    }

    false
}

/// True when the query mentions listing vocabulary, asks for details,
/// or looks like a follow-up
pub fn is_property_related(query: &str, index: &KnowledgeIndex) -> bool {
    let query_lower = query.to_lowercase();

    index.mentions_vocabulary(&query_lower)
        || contains_any(&query_lower, DETAIL_REQUEST_KEYWORDS)
        || contains_any(&query_lower, FOLLOW_UP_PHRASES)
        || contains_any(&query_lower, FOLLOW_UP_PRONOUNS)
}

/// True for greetings, small talk and acknowledgements
pub fn is_greeting_or_general(query: &str) -> bool {
    contains_any(&query.to_lowercase(), GENERAL_KEYWORDS)
}

/// Concise unless the user explicitly asks for details
pub fn response_mode(query: &str) -> ResponseMode {
    if contains_any(&query.to_lowercase(), DETAIL_REQUEST_KEYWORDS) {
        ResponseMode::Detailed
    } else {
        ResponseMode::Concise
    }
}

/// Inputs shared by every classification predicate
struct Utterance<'a> {
    query: &'a str,
    history: &'a [ConversationTurn],
    index: &'a KnowledgeIndex,
}

type Predicate = fn(&Utterance<'_>) -> bool;

fn follow_up_check(u: &Utterance<'_>) -> bool {
    is_follow_up(u.query, u.history)
}

fn property_check(u: &Utterance<'_>) -> bool {
    is_property_related(u.query, u.index)
}

fn greeting_check(u: &Utterance<'_>) -> bool {
    is_greeting_or_general(u.query)
}

/// Evaluated in order; the first accepting predicate wins
const PREDICATES: &[(QueryClass, Predicate)] = &[
    (QueryClass::FollowUp, follow_up_check),
    (QueryClass::Property, property_check),
    (QueryClass::Greeting, greeting_check),
];

/// Label an utterance by the first predicate that accepts it
pub fn classify(query: &str, history: &[ConversationTurn], index: &KnowledgeIndex) -> QueryClass {
    let utterance = Utterance { query, history, index };

    PREDICATES
        .iter()
        .find(|(_, accepts)| accepts(&utterance))
        .map(|(class, _)| *class)
        .unwrap_or(QueryClass::Unrelated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingRecord;

    fn index() -> KnowledgeIndex {
        KnowledgeIndex::build(&[
            ListingRecord::new("Downtown Dubai", "3.8M AED", "2BR, Burj Khalifa view", "available"),
            ListingRecord::new("Arabian Ranches", "4.5M AED", "4BR villa, garden", "available"),
        ])
    }

    fn property_history() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::system("You are Verbi."),
            ConversationTurn::user("Please give me the pricing of the all of the property."),
            ConversationTurn::assistant(
                "Downtown Dubai: 3.8M AED for a 2BR apartment with Burj Khalifa view and luxury amenities.",
            ),
            ConversationTurn::user("Are you the only one of them?"),
        ]
    }

    #[test]
    fn test_follow_up_phrase_with_property_context() {
        assert!(is_follow_up("Are you the only one of them?", &property_history()));
    }

    #[test]
    fn test_follow_up_phrase_without_property_context() {
        let history = vec![
            ConversationTurn::system("sys"),
            ConversationTurn::assistant("Hello there, how can I help?"),
        ];
        assert!(!is_follow_up("what else", &history));
    }

    #[test]
    fn test_follow_up_phrase_searches_unbounded() {
        let mut history = vec![
            ConversationTurn::system("sys"),
            ConversationTurn::assistant("Marina flat, 2M AED"),
        ];
        for i in 0..10 {
            history.push(ConversationTurn::user(format!("filler {}", i)));
        }
        assert!(is_follow_up("any others?", &history));
    }

    #[test]
    fn test_phrase_uses_nearest_assistant_turn_only() {
        let history = vec![
            ConversationTurn::assistant("Marina flat, 2M AED"),
            ConversationTurn::user("thanks"),
            ConversationTurn::assistant("You're welcome!"),
        ];
        // "nothing else" contains no pronoun, so only the phrase rule applies
        assert!(!is_follow_up("nothing else", &history));
    }

    #[test]
    fn test_pronoun_within_window() {
        let history = vec![
            ConversationTurn::system("sys"),
            ConversationTurn::assistant("Palm villa, 12M AED"),
            ConversationTurn::user("hmm"),
        ];
        assert!(is_follow_up("send them", &history));
    }

    #[test]
    fn test_pronoun_outside_window() {
        let history = vec![
            ConversationTurn::assistant("Palm villa, 12M AED"),
            ConversationTurn::user("one"),
            ConversationTurn::assistant("ok"),
            ConversationTurn::user("two"),
            ConversationTurn::assistant("ok"),
        ];
        assert!(!is_follow_up("send them", &history));
    }

    #[test]
    fn test_pronoun_markers_exclude_bhk() {
        let history = vec![ConversationTurn::assistant("a 2 bhk unit")];
        assert!(!is_follow_up("send them", &history));
    }

    #[test]
    fn test_follow_up_false_without_assistant_turns() {
        let history = vec![ConversationTurn::system("Property assistant for Dubai")];
        assert!(!is_follow_up("is that all", &history));
        assert!(!is_follow_up("tell me about it", &history));
    }

    #[test]
    fn test_property_related_by_vocabulary() {
        assert!(is_property_related("Anything in Arabian Ranches?", &index()));
        assert!(is_property_related("I want to rent", &index()));
    }

    #[test]
    fn test_property_related_by_detail_keyword() {
        assert!(is_property_related("give me information", &KnowledgeIndex::build(&[])));
    }

    #[test]
    fn test_property_related_superset_of_follow_up() {
        let empty = KnowledgeIndex::build(&[]);
        assert!(is_property_related("is that all", &empty));
    }

    #[test]
    fn test_not_property_related() {
        let empty = KnowledgeIndex::build(&[]);
        assert!(!is_property_related("good evening", &empty));
    }

    #[test]
    fn test_greeting() {
        assert!(is_greeting_or_general("Hello!"));
        assert!(is_greeting_or_general("Thanks a lot"));
        assert!(is_greeting_or_general("sounds good"));
        assert!(!is_greeting_or_general("xyz"));
    }

    #[test]
    fn test_response_mode() {
        assert_eq!(response_mode("Tell me more about Marina"), ResponseMode::Detailed);
        assert_eq!(response_mode("Marina prices"), ResponseMode::Concise);
    }

    #[test]
    fn test_classify_priority_order() {
        let idx = index();
        let history = property_history();
        assert_eq!(classify("Are you the only one of them?", &history, &idx), QueryClass::FollowUp);
        assert_eq!(classify("villa in arabian ranches", &[], &idx), QueryClass::Property);
        assert_eq!(classify("good evening", &[], &KnowledgeIndex::build(&[])), QueryClass::Greeting);
        assert_eq!(classify("qwerty", &[], &KnowledgeIndex::build(&[])), QueryClass::Unrelated);
    }
}
