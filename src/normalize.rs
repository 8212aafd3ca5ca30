//! Record normalization: turn scraped text fields into canonical values.
//!
//! Every function here is total. Malformed input never errors; it resolves to
//! a well-defined absence (`None` for price) or zero (rating, reviews).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::product::{RawProduct, Source, MAX_RATING};

// Pre-compiled regex for whitespace normalization (compile once, use many times)
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Invalid whitespace regex pattern")
});

static PRICE_JUNK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\d.]").expect("Invalid price regex pattern")
});

/// First number-like token, optionally followed by a percent sign
static RATING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(%)?").expect("Invalid rating regex pattern")
});

static REVIEWS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d[\d,]*").expect("Invalid reviews regex pattern")
});

/// Percent-width star bars are scaled to 5 stars by this divisor
const PERCENT_PER_STAR: f64 = 20.0;

/// Collapse runs of whitespace into a single space and trim
pub fn normalize_whitespace(content: &str) -> String {
    WHITESPACE_RE.replace_all(content, " ").trim().to_string()
}

/// Parse a price such as "₹1,299.00" or "Rs. 499"
///
/// Returns `None` when nothing parsable remains. Absence must stay distinct
/// from zero so the batch mean can be imputed later.
pub fn clean_price(text: &str) -> Option<f64> {
    let stripped = PRICE_JUNK_RE.replace_all(text, "");
    // "Rs." style prefixes leave a leading dot behind
    let digits = stripped.trim_start_matches('.');

    if digits.is_empty() || digits.matches('.').count() > 1 {
        return None;
    }

    digits
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
}

/// Parse a rating such as "4.5 out of 5 stars" or a "width: 90%" star bar
///
/// Percentages are converted to the 5-point scale. Absent or unparsable
/// input yields 0.
pub fn extract_rating(text: &str) -> f64 {
    let Some(caps) = RATING_RE.captures(text) else {
        return 0.0;
    };

    let value = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    let rating = if caps.get(2).is_some() {
        value / PERCENT_PER_STAR
    } else {
        value
    };

    rating.clamp(0.0, MAX_RATING)
}

/// Parse a review count such as "(1,234 ratings)"
pub fn extract_review_count(text: &str) -> u64 {
    REVIEWS_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok())
        .unwrap_or(0)
}

/// Raw text fields scraped from one listing card, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingText {
    pub title: String,
    pub link: String,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl ListingText {
    /// Normalize into a `RawProduct`
    ///
    /// Returns `None` when the listing has no title or no link; adapters must
    /// never emit such records.
    pub fn into_product(self, source: Source) -> Option<RawProduct> {
        let title = normalize_whitespace(&self.title);
        let link = self.link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            return None;
        }

        let description = self
            .description
            .map(|d| normalize_whitespace(&d))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| title.clone());

        Some(RawProduct {
            price: self.price.as_deref().and_then(clean_price),
            rating: self.rating.as_deref().map(extract_rating).unwrap_or(0.0),
            reviews: self.reviews.as_deref().map(extract_review_count).unwrap_or(0),
            image: self
                .image
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty()),
            title,
            link,
            source,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        let input = "  Hello   World\n\n\nTest ";
        assert_eq!(normalize_whitespace(input), "Hello World Test");
    }

    #[test]
    fn test_clean_price() {
        assert_eq!(clean_price("₹1,299"), Some(1299.0));
        assert_eq!(clean_price("$79.99"), Some(79.99));
        assert_eq!(clean_price("Rs. 1,499.50"), Some(1499.5));
        assert_eq!(clean_price("  499 "), Some(499.0));
    }

    #[test]
    fn test_clean_price_absent() {
        assert_eq!(clean_price(""), None);
        assert_eq!(clean_price("Contact for price"), None);
        assert_eq!(clean_price("1.2.3"), None);
        assert_eq!(clean_price("."), None);
    }

    #[test]
    fn test_clean_price_zero_is_not_absent() {
        assert_eq!(clean_price("₹0"), Some(0.0));
    }

    #[test]
    fn test_extract_rating() {
        assert_eq!(extract_rating("4.5 out of 5 stars"), 4.5);
        assert_eq!(extract_rating("4"), 4.0);
        assert_eq!(extract_rating("★ 3.9"), 3.9);
    }

    #[test]
    fn test_extract_rating_percentage() {
        assert_eq!(extract_rating("width: 90%"), 4.5);
        assert_eq!(extract_rating("100 %"), 5.0);
    }

    #[test]
    fn test_extract_rating_absent_or_out_of_range() {
        assert_eq!(extract_rating(""), 0.0);
        assert_eq!(extract_rating("no ratings yet"), 0.0);
        assert_eq!(extract_rating("45"), 5.0);
    }

    #[test]
    fn test_extract_review_count() {
        assert_eq!(extract_review_count("1,234 reviews"), 1234);
        assert_eq!(extract_review_count("(12,34,567 Ratings)"), 1234567);
        assert_eq!(extract_review_count("(87)"), 87);
        assert_eq!(extract_review_count("no reviews"), 0);
        assert_eq!(extract_review_count(""), 0);
    }

    #[test]
    fn test_extract_review_count_overflow() {
        assert_eq!(extract_review_count("99999999999999999999999"), 0);
    }

    #[test]
    fn test_listing_into_product() {
        let listing = ListingText {
            title: "  Black   Cocktail Dress ".to_string(),
            link: "https://example.test/p/1".to_string(),
            price: Some("₹2,499".to_string()),
            rating: Some("4.2 out of 5 stars".to_string()),
            reviews: Some("1,024".to_string()),
            image: Some(" ".to_string()),
            description: None,
        };

        let product = listing.into_product(Source::Amazon).unwrap();
        assert_eq!(product.title, "Black Cocktail Dress");
        assert_eq!(product.price, Some(2499.0));
        assert_eq!(product.rating, 4.2);
        assert_eq!(product.reviews, 1024);
        assert_eq!(product.image, None);
        assert_eq!(product.description, "Black Cocktail Dress");
        assert_eq!(product.source, Source::Amazon);
    }

    #[test]
    fn test_listing_without_title_or_link_is_dropped() {
        let no_title = ListingText {
            title: "   ".to_string(),
            link: "https://example.test".to_string(),
            ..Default::default()
        };
        assert!(no_title.into_product(Source::Flipkart).is_none());

        let no_link = ListingText {
            title: "Shoes".to_string(),
            ..Default::default()
        };
        assert!(no_link.into_product(Source::Flipkart).is_none());
    }
}
