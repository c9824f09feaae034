use std::collections::{BTreeMap, BTreeSet};

use crate::models::ListingRecord;

/// Domain synonyms added to a location's keywords when they occur in its name
pub const LOCATION_SYNONYMS: &[&str] = &[
    "dubai", "palm", "jumeirah", "hills", "ranches", "estate", "jebel", "ali",
    "beach", "marina", "downtown", "emirates", "arabian",
];

/// Generic real-estate terms that always count as property vocabulary
pub const BASE_PROPERTY_TERMS: &[&str] = &[
    "property", "properties", "apartment", "apartments", "villa", "villas",
    "house", "houses", "home", "homes", "real estate", "buy", "purchase",
    "rent", "rental", "price", "cost", "location", "area", "bedroom",
    "bedrooms", "furnished", "unfurnished", "sea view", "beach", "pool",
    "gym", "garden", "amenities",
];

/// Lookup structures derived from the listing set
///
/// The index is a pure function of its input: building it twice from the
/// same listings yields equal structures. Sorted collections keep the
/// derived sets deterministic for display and comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeIndex {
    /// Distinct lowercase, trimmed locations
    pub locations: BTreeSet<String>,
    /// Distinct lowercase feature descriptors (comma separated in the source)
    pub features: BTreeSet<String>,
    /// Lowercase location -> keywords that select it
    pub location_keywords: BTreeMap<String, BTreeSet<String>>,
    /// Every token that marks an utterance as property related
    pub vocabulary: BTreeSet<String>,
}

impl KnowledgeIndex {
    /// Build the index. Total: an empty listing set yields empty structures.
    pub fn build(listings: &[ListingRecord]) -> Self {
        let locations = extract_locations(listings);
        let features = extract_features(listings);
        let location_keywords = build_location_keywords(&locations);
        let vocabulary = build_vocabulary(&locations, &features);

        tracing::debug!(
            "Built knowledge index: {} locations, {} features, {} vocabulary terms",
            locations.len(),
            features.len(),
            vocabulary.len()
        );

        Self {
            locations,
            features,
            location_keywords,
            vocabulary,
        }
    }

    /// Keywords for a location, if it is indexed
    pub fn keywords_for(&self, location: &str) -> Option<&BTreeSet<String>> {
        self.location_keywords.get(location)
    }

    /// Whether the lowercase query mentions any property vocabulary term
    pub fn mentions_vocabulary(&self, query_lower: &str) -> bool {
        self.vocabulary
            .iter()
            .any(|term| query_lower.contains(term.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty() && self.features.is_empty()
    }
}

/// Lowercase and trim a free-text field, skipping blanks
fn normalize(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn extract_locations(listings: &[ListingRecord]) -> BTreeSet<String> {
    listings
        .iter()
        .filter_map(|listing| normalize(&listing.location))
        .collect()
}

fn extract_features(listings: &[ListingRecord]) -> BTreeSet<String> {
    listings
        .iter()
        .flat_map(|listing| listing.features.split(','))
        .filter_map(normalize)
        .collect()
}

fn location_keywords(location: &str) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();
    keywords.insert(location.to_string());
    keywords.extend(location.split_whitespace().map(str::to_string));
    keywords.extend(
        LOCATION_SYNONYMS
            .iter()
            .filter(|synonym| location.contains(*synonym))
            .map(|synonym| synonym.to_string()),
    );
    keywords
}

fn build_location_keywords(locations: &BTreeSet<String>) -> BTreeMap<String, BTreeSet<String>> {
    locations
        .iter()
        .map(|location| (location.clone(), location_keywords(location)))
        .collect()
}

fn build_vocabulary(locations: &BTreeSet<String>, features: &BTreeSet<String>) -> BTreeSet<String> {
    let mut vocabulary: BTreeSet<String> =
        BASE_PROPERTY_TERMS.iter().map(|term| term.to_string()).collect();

    vocabulary.extend(locations.iter().cloned());

    for feature in features {
        vocabulary.insert(feature.clone());
        vocabulary.extend(feature.split_whitespace().map(str::to_string));
    }

    vocabulary
}
