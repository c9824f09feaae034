use std::collections::HashSet;

use crate::core::index::KnowledgeIndex;
use crate::core::price::{budget_ceiling, listing_price_millions, price_mentions};
use crate::models::{ListingRecord, MatchStage};

/// Queries that ask for the whole catalogue
pub const ALL_LISTINGS_QUERIES: &[&str] = &["all properties", "all property", "all", "everything", "show all"];

/// The canonical whole-catalogue query used to recover context on follow-ups
pub const ALL_LISTINGS_QUERY: &str = "all properties";

/// Result of the matching process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    /// Matches in discovery order, unique by (location, price, features)
    pub listings: Vec<ListingRecord>,
    /// Stage that produced the matches, `None` when nothing matched
    pub stage: Option<MatchStage>,
}

impl MatchResult {
    fn from_stage(stage: MatchStage, listings: Vec<ListingRecord>) -> Self {
        let stage = if listings.is_empty() { None } else { Some(stage) };
        Self { listings, stage }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Find listings relevant to a free-text query
///
/// # Pipeline Stages
/// 1. Whole-catalogue request (short-circuits everything)
/// 2. Location keywords
/// 3. Feature tokens
/// 4. Literal price mentions
/// 5. Budget ceiling
///
/// Each of stages 2-5 runs only when the previous one found nothing.
pub fn search(query: &str, index: &KnowledgeIndex, listings: &[ListingRecord]) -> MatchResult {
    let query_lower = query.to_lowercase();

    // Stage 1: everything, verbatim
    if ALL_LISTINGS_QUERIES.contains(&query_lower.trim()) {
        tracing::debug!("Whole-catalogue query, returning {} listings", listings.len());
        return MatchResult::from_stage(MatchStage::All, listings.to_vec());
    }

    type Stage = fn(&str, &KnowledgeIndex, &[ListingRecord]) -> Vec<ListingRecord>;
    let cascade: [(MatchStage, Stage); 4] = [
        (MatchStage::Location, match_by_location),
        (MatchStage::Feature, match_by_features),
        (MatchStage::PriceLiteral, match_by_price_literal),
        (MatchStage::BudgetCeiling, match_by_budget),
    ];

    for (stage, run) in cascade {
        let matches = dedup(run(&query_lower, index, listings));
        if !matches.is_empty() {
            tracing::debug!("Matched {} listings at {:?} stage", matches.len(), stage);
            return MatchResult::from_stage(stage, matches);
        }
    }

    tracing::debug!("No listings matched query");
    MatchResult::default()
}

/// Keep the first listing for each (location, price, features)
pub fn dedup(listings: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| {
            let (location, price, features) = listing.dedup_key();
            seen.insert((location.to_owned(), price.to_owned(), features.to_owned()))
        })
        .collect()
}

/// Stage 2: any keyword of the listing's location appears in the query
fn match_by_location(
    query_lower: &str,
    index: &KnowledgeIndex,
    listings: &[ListingRecord],
) -> Vec<ListingRecord> {
    listings
        .iter()
        .filter(|listing| {
            let location = listing.location.trim().to_lowercase();
            let Some(keywords) = index.keywords_for(&location) else {
                return false;
            };
            keywords.iter().any(|keyword| query_lower.contains(keyword.as_str()))
                || query_lower.contains(location.as_str())
        })
        .cloned()
        .collect()
}

/// Stage 3: any query word appears in the listing's features
fn match_by_features(
    query_lower: &str,
    _index: &KnowledgeIndex,
    listings: &[ListingRecord],
) -> Vec<ListingRecord> {
    let words: Vec<&str> = query_lower.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    listings
        .iter()
        .filter(|listing| {
            let features = listing.features.to_lowercase();
            words.iter().any(|word| features.contains(word))
        })
        .cloned()
        .collect()
}

/// Stage 4: a currency amount from the query appears in the listing's price
fn match_by_price_literal(
    query_lower: &str,
    _index: &KnowledgeIndex,
    listings: &[ListingRecord],
) -> Vec<ListingRecord> {
    let mentions = price_mentions(query_lower);
    if mentions.is_empty() {
        return Vec::new();
    }

    listings
        .iter()
        .filter(|listing| {
            let price = listing.price.to_lowercase();
            mentions.iter().any(|mention| price.contains(mention.literal.as_str()))
        })
        .cloned()
        .collect()
}

/// Stage 5: the listing's price in millions is within the stated budget
fn match_by_budget(
    query_lower: &str,
    _index: &KnowledgeIndex,
    listings: &[ListingRecord],
) -> Vec<ListingRecord> {
    let Some(budget) = budget_ceiling(query_lower) else {
        return Vec::new();
    };
    let limit = budget.in_millions();

    listings
        .iter()
        .filter(|listing| {
            listing_price_millions(&listing.price)
                .map(|value| value <= limit)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<ListingRecord> {
        vec![
            ListingRecord::new("Downtown Dubai", "3.8M AED", "2BR, Burj Khalifa view", "available"),
            ListingRecord::new("Dubai Marina", "2.2M AED", "1BR, marina view", "available"),
            ListingRecord::new("Palm Jumeirah", "12M AED", "5BR villa, private beach", "available"),
            ListingRecord::new("Arabian Ranches", "1.5M AED", "3BR townhouse, garden", "off-plan"),
        ]
    }

    fn run(query: &str) -> MatchResult {
        let data = catalogue();
        let index = KnowledgeIndex::build(&data);
        search(query, &index, &data)
    }

    fn locations(result: &MatchResult) -> Vec<&str> {
        result.listings.iter().map(|l| l.location.as_str()).collect()
    }

    #[test]
    fn test_all_queries_return_everything() {
        for query in ALL_LISTINGS_QUERIES {
            let result = run(query);
            assert_eq!(result.listings, catalogue());
            assert_eq!(result.stage, Some(MatchStage::All));
        }
        assert_eq!(run("  Show All ").len(), 4);
    }

    #[test]
    fn test_all_query_ignores_index() {
        let data = catalogue();
        let result = search("all", &KnowledgeIndex::default(), &data);
        assert_eq!(result.listings, data);
    }

    #[test]
    fn test_location_keyword_match() {
        let result = run("anything in the marina?");
        assert_eq!(result.stage, Some(MatchStage::Location));
        assert_eq!(locations(&result), vec!["Dubai Marina"]);
    }

    #[test]
    fn test_location_shared_word_matches_several() {
        let result = run("dubai");
        assert_eq!(locations(&result), vec!["Downtown Dubai", "Dubai Marina"]);
    }

    #[test]
    fn test_feature_stage() {
        let result = run("townhouse please");
        assert_eq!(result.stage, Some(MatchStage::Feature));
        assert_eq!(locations(&result), vec!["Arabian Ranches"]);
    }

    #[test]
    fn test_price_literal_stage() {
        let result = run("what costs 12m aed");
        assert_eq!(result.stage, Some(MatchStage::PriceLiteral));
        assert_eq!(locations(&result), vec!["Palm Jumeirah"]);
    }

    #[test]
    fn test_budget_stage() {
        // Feature strings without digits so the feature stage stays empty
        let data = vec![
            ListingRecord::new("Arabian Ranches", "1.5M AED", "townhouse, garden", "available"),
            ListingRecord::new("Emirates Hills", "3M AED", "villa, golf view", "available"),
        ];
        let index = KnowledgeIndex::build(&data);
        let result = search("budget 2 million", &index, &data);
        assert_eq!(result.stage, Some(MatchStage::BudgetCeiling));
        assert_eq!(locations(&result), vec!["Arabian Ranches"]);
    }

    #[test]
    fn test_feature_stage_preempts_budget() {
        // "2" is a substring of "2br", so the feature stage answers first
        let result = run("budget 2 million");
        assert_eq!(result.stage, Some(MatchStage::Feature));
        assert_eq!(locations(&result), vec!["Downtown Dubai"]);
    }

    #[test]
    fn test_dedup_preserves_first_seen() {
        let mut data = catalogue();
        data.push(ListingRecord::new("Dubai Marina", "2.2M AED", "1BR, marina view", "sold"));
        let index = KnowledgeIndex::build(&data);
        let result = search("marina", &index, &data);
        assert_eq!(result.len(), 1);
        assert_eq!(result.listings[0].status, "available");
    }

    #[test]
    fn test_empty_catalogue() {
        let result = search("downtown", &KnowledgeIndex::build(&[]), &[]);
        assert!(result.is_empty());
        assert!(result.stage.is_none());
    }

    #[test]
    fn test_no_match() {
        let result = run("zzz");
        assert!(result.is_empty());
    }
}
