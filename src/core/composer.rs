use std::sync::LazyLock;

use regex::Regex;

use crate::core::index::KnowledgeIndex;
use crate::models::{ListingRecord, ResponseMode};

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)BR").expect("Invalid bedroom regex"));

static BEDROOM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*bedroom").expect("Invalid bedroom regex"));

/// Bedroom count as "<n> bhk", or "apartment" when the features carry none
pub fn extract_bhk(features: &str) -> String {
    BR_RE
        .captures(features)
        .or_else(|| BEDROOM_RE.captures(features))
        .and_then(|caps| caps.get(1))
        .map(|n| format!("{} bhk", n.as_str()))
        .unwrap_or_else(|| "apartment".to_string())
}

/// Python-style title casing: a letter is uppercased when it follows a non-letter
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Known locations, title-cased, alphabetical, comma-joined
fn location_list(index: &KnowledgeIndex) -> String {
    // BTreeSet iterates in sorted order already
    index
        .locations
        .iter()
        .map(|location| title_case(location))
        .collect::<Vec<_>>()
        .join(", ")
}

fn no_results(index: &KnowledgeIndex) -> String {
    format!("No properties found. Try: {}.", location_list(index))
}

fn summary(listing: &ListingRecord) -> String {
    format!(
        "{} {} {}",
        listing.location,
        extract_bhk(&listing.features),
        listing.price
    )
}

/// Line templates for each verbosity
struct Layout {
    header: &'static str,
    single: fn(&ListingRecord) -> String,
    entry: fn(&ListingRecord) -> String,
}

const CONCISE: Layout = Layout {
    header: "Available properties: ",
    single: summary,
    entry: summary,
};

fn detailed_single(listing: &ListingRecord) -> String {
    format!(
        "{}. Features: {}. Status: {}.",
        summary(listing),
        listing.features,
        listing.status
    )
}

fn detailed_entry(listing: &ListingRecord) -> String {
    format!("{} - {}", summary(listing), listing.features)
}

const DETAILED: Layout = Layout {
    header: "Property details: ",
    single: detailed_single,
    entry: detailed_entry,
};

/// Render matched listings at the requested verbosity
pub fn format_listings(listings: &[ListingRecord], index: &KnowledgeIndex, mode: ResponseMode) -> String {
    let layout = match mode {
        ResponseMode::Concise => &CONCISE,
        ResponseMode::Detailed => &DETAILED,
    };

    match listings {
        [] => no_results(index),
        [only] => (layout.single)(only),
        many => {
            let mut response = layout.header.to_string();
            for (i, listing) in many.iter().enumerate() {
                response.push_str(&format!("{}. {}. ", i + 1, (layout.entry)(listing)));
            }
            response.trim_end().to_string()
        }
    }
}

/// Short listing summary
pub fn format_property_response(listings: &[ListingRecord], index: &KnowledgeIndex) -> String {
    format_listings(listings, index, ResponseMode::Concise)
}

/// Listing summary with features and status
pub fn format_detailed_property_response(listings: &[ListingRecord], index: &KnowledgeIndex) -> String {
    format_listings(listings, index, ResponseMode::Detailed)
}

/// Fallback for utterances that are neither about listings nor small talk
pub fn default_response(index: &KnowledgeIndex) -> String {
    format!("I'm a UAE property assistant. Ask about {}.", location_list(index))
}
