//! Numeric price and budget extraction.
//!
//! A query that carries no recognisable amount simply yields nothing here;
//! the matcher then moves on to its next stage.

use std::sync::LazyLock;

use regex::Regex;

/// Amount followed by a currency, e.g. "3.8m aed", "500 dirhams"
static PRICE_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(million|m|k|thousand)?\s*(?:aed|dollars?|dirhams?)")
        .expect("Invalid price regex")
});

/// Amount next to a budget cue, in either order:
/// "2 million budget", "budget 2 million", "upto 1.5m"
static BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(\d+(?:\.\d+)?)\s*(million|m|k|thousand)?\s*(?:budget|around|upto|max))|(?:(?:budget|around|upto|max)(?:\s+(?:of|is))?\s*(\d+(?:\.\d+)?)\s*(million|m|k|thousand)?)",
    )
    .expect("Invalid budget regex")
});

/// "<number>M" inside a listing price, e.g. "3.8M AED"
static LISTING_MILLIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)M").expect("Invalid listing price regex"));

/// Magnitude word attached to an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magnitude {
    Unspecified,
    Thousand,
    Million,
}

impl Magnitude {
    fn parse(word: Option<&str>) -> Self {
        match word {
            Some("k") | Some("thousand") => Magnitude::Thousand,
            Some("m") | Some("million") => Magnitude::Million,
            _ => Magnitude::Unspecified,
        }
    }
}

/// An amount found in a query
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMention {
    /// The numeral exactly as written
    pub literal: String,
    pub value: f64,
    pub magnitude: Magnitude,
}

impl PriceMention {
    /// Value expressed in millions. Bare numbers are read as millions,
    /// which is how listing prices are quoted.
    pub fn in_millions(&self) -> f64 {
        match self.magnitude {
            Magnitude::Thousand => self.value / 1_000.0,
            Magnitude::Million | Magnitude::Unspecified => self.value,
        }
    }
}

fn mention(literal: &str, magnitude: Option<&str>) -> Option<PriceMention> {
    let value = literal.parse::<f64>().ok()?;
    Some(PriceMention {
        literal: literal.to_string(),
        value,
        magnitude: Magnitude::parse(magnitude),
    })
}

/// All currency-qualified amounts in a lowercase query, in order
pub fn price_mentions(query_lower: &str) -> Vec<PriceMention> {
    PRICE_MENTION_RE
        .captures_iter(query_lower)
        .filter_map(|caps| {
            let literal = caps.get(1)?.as_str();
            mention(literal, caps.get(2).map(|m| m.as_str()))
        })
        .collect()
}

/// The first budget amount in a lowercase query
pub fn budget_ceiling(query_lower: &str) -> Option<PriceMention> {
    let caps = BUDGET_RE.captures(query_lower)?;
    let (literal, magnitude) = match (caps.get(1), caps.get(3)) {
        (Some(amount), _) => (amount, caps.get(2)),
        (None, Some(amount)) => (amount, caps.get(4)),
        (None, None) => return None,
    };
    mention(literal.as_str(), magnitude.map(|m| m.as_str()))
}

/// Parse the "<number>M" value of a listing price field
pub fn listing_price_millions(price: &str) -> Option<f64> {
    LISTING_MILLIONS_RE
        .captures(price)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
