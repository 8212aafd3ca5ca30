use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};

/// Number of products surfaced in `ComparisonResult::top_results`
pub const TOP_RESULTS: usize = 5;

/// Upper bound of the rating scale
pub const MAX_RATING: f64 = 5.0;

/// E-commerce platform a listing was scraped from
///
/// The variant order is the default declared adapter order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Amazon,
    Flipkart,
    Myntra,
    Snapdeal,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Amazon,
        Source::Flipkart,
        Source::Myntra,
        Source::Snapdeal,
    ];

    /// Stable lowercase identifier (config files, JSON, CLI)
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Amazon => "amazon",
            Source::Flipkart => "flipkart",
            Source::Myntra => "myntra",
            Source::Snapdeal => "snapdeal",
        }
    }

    /// Brand name as shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Amazon => "Amazon",
            Source::Flipkart => "Flipkart",
            Source::Myntra => "Myntra",
            Source::Snapdeal => "Snapdeal",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Source {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| ShopError::UnknownSource(s.to_string()))
    }
}

/// A product listing as produced by a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub title: String,
    /// Non-negative price; `None` when the listing had no parsable price
    #[serde(default)]
    pub price: Option<f64>,
    /// Rating on a 0-5 scale, 0 when absent
    #[serde(default)]
    pub rating: f64,
    /// Review count, 0 when absent
    #[serde(default)]
    pub reviews: u64,
    pub link: String,
    #[serde(default)]
    pub image: Option<String>,
    pub source: Source,
    /// Text scored for relevance; empty means "use the title"
    #[serde(default)]
    pub description: String,
}

impl RawProduct {
    pub fn new(source: Source, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: None,
            rating: 0.0,
            reviews: 0,
            link: link.into(),
            image: None,
            source,
            description: String::new(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_reviews(mut self, reviews: u64) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The text the relevance scorer sees for this product
    pub fn relevance_text(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.title
        } else {
            &self.description
        }
    }

    /// Why the record breaks the adapter output contract, if it does
    ///
    /// A usable record has a title, a link, a finite non-negative price (or
    /// none) and a finite rating on the 0-5 scale. Out-of-range values are
    /// rejected rather than clamped.
    pub fn defect(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            return Some("missing title");
        }
        if self.link.trim().is_empty() {
            return Some("missing link");
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Some("price is negative or not a number");
            }
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Some("rating outside 0-5");
        }
        None
    }

    pub fn is_usable(&self) -> bool {
        self.defect().is_none()
    }
}

/// Drop records that break the adapter output contract, returning how many
/// were dropped
pub fn retain_usable(records: &mut Vec<RawProduct>) -> usize {
    let before = records.len();
    records.retain(|record| match record.defect() {
        None => true,
        Some(reason) => {
            tracing::debug!(source = %record.source, link = %record.link, reason, "dropping record");
            false
        }
    });
    before - records.len()
}

/// Per-feature scores after batch normalization, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureScores {
    pub price: f64,
    pub rating: f64,
    pub reviews: f64,
    pub relevance: f64,
}

/// A product after ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProduct {
    /// 1-based position in the final ordering
    pub rank: usize,
    pub title: String,
    /// Effective price, imputed from the batch mean when the listing had none
    pub price: f64,
    pub price_imputed: bool,
    pub rating: f64,
    pub reviews: u64,
    /// Weighted score on a 0-100 scale, two decimals
    pub score: f64,
    pub source: Source,
    pub link: String,
    pub image: Option<String>,
    pub description: String,
    #[serde(skip)]
    pub features: FeatureScores,
}

/// Relative importance of each ranking feature
///
/// Weights should sum to 1.0. The sum is not enforced; scores simply scale
/// with it. Negative or non-finite weights are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub price: f64,
    pub rating: f64,
    pub reviews: f64,
    pub relevance: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            price: 0.4,
            rating: 0.3,
            reviews: 0.2,
            relevance: 0.1,
        }
    }
}

impl WeightVector {
    pub fn new(price: f64, rating: f64, reviews: f64, relevance: f64) -> Result<Self> {
        let weights = Self {
            price,
            rating,
            reviews,
            relevance,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Reject negative or non-finite weights
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("price", self.price),
            ("rating", self.rating),
            ("reviews", self.reviews),
            ("relevance", self.relevance),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ShopError::InvalidWeights(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.price + self.rating + self.reviews + self.relevance
    }

    /// Whether the weights add up to 1.0, so scores span 0-100
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= 1e-9
    }

    /// Weighted sum of the feature scores, before scaling to 0-100
    pub fn apply(&self, features: &FeatureScores) -> f64 {
        features.price * self.price
            + features.rating * self.rating
            + features.reviews * self.reviews
            + features.relevance * self.relevance
    }
}

impl fmt::Display for WeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "price {:.2}, rating {:.2}, reviews {:.2}, relevance {:.2}",
            self.price, self.rating, self.reviews, self.relevance
        )
    }
}

/// Parses "price,rating,reviews,relevance", e.g. "0.4,0.3,0.2,0.1"
impl FromStr for WeightVector {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ShopError::InvalidWeights(format!(
                "expected 4 comma-separated weights (price,rating,reviews,relevance), got '{}'",
                s
            )));
        }

        let mut values = [0.0; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse::<f64>().map_err(|_| {
                ShopError::InvalidWeights(format!("'{}' is not a number", part))
            })?;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }
}

/// Outcome of ranking one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub message: String,
    pub top_results: Vec<RankedProduct>,
    pub best_by_source: Vec<RankedProduct>,
    pub all_products: Vec<RankedProduct>,
}

impl ComparisonResult {
    pub fn empty(query: &str) -> Self {
        Self {
            message: format!("No products found matching '{}'", query),
            top_results: Vec::new(),
            best_by_source: Vec::new(),
            all_products: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_products.is_empty()
    }

    /// Highest-ranked product overall
    pub fn best(&self) -> Option<&RankedProduct> {
        self.all_products.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_case_insensitive() {
        assert_eq!("Amazon".parse::<Source>().unwrap(), Source::Amazon);
        assert_eq!(" SNAPDEAL ".parse::<Source>().unwrap(), Source::Snapdeal);
        assert!("ebay".parse::<Source>().is_err());
    }

    #[test]
    fn test_source_serde_lowercase() {
        let json = serde_json::to_string(&Source::Flipkart).unwrap();
        assert_eq!(json, "\"flipkart\"");
        let back: Source = serde_json::from_str("\"myntra\"").unwrap();
        assert_eq!(back, Source::Myntra);
    }

    #[test]
    fn test_default_weights() {
        let w = WeightVector::default();
        assert_eq!(w.price, 0.4);
        assert_eq!(w.rating, 0.3);
        assert_eq!(w.reviews, 0.2);
        assert_eq!(w.relevance, 0.1);
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_reject_negative() {
        assert!(WeightVector::new(-0.1, 0.5, 0.3, 0.3).is_err());
        assert!(WeightVector::new(f64::NAN, 0.5, 0.3, 0.3).is_err());
        assert!(WeightVector::new(0.0, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_weights_from_str() {
        let w: WeightVector = "0.5, 0.25,0.25,0".parse().unwrap();
        assert_eq!(w.price, 0.5);
        assert_eq!(w.relevance, 0.0);
        assert!("0.5,0.5".parse::<WeightVector>().is_err());
        assert!("a,b,c,d".parse::<WeightVector>().is_err());
        assert!("1,1,1,-1".parse::<WeightVector>().is_err());
    }

    #[test]
    fn test_raw_product_deserialize_defaults() {
        let json = r#"{"title": "Phone", "link": "https://x.test/p", "source": "amazon"}"#;
        let p: RawProduct = serde_json::from_str(json).unwrap();
        assert_eq!(p.price, None);
        assert_eq!(p.rating, 0.0);
        assert_eq!(p.reviews, 0);
        assert_eq!(p.relevance_text(), "Phone");
    }

    #[test]
    fn test_is_usable() {
        assert!(RawProduct::new(Source::Amazon, "Phone", "https://x.test").is_usable());
        assert!(!RawProduct::new(Source::Amazon, "  ", "https://x.test").is_usable());
        assert!(!RawProduct::new(Source::Amazon, "Phone", "").is_usable());
    }

    #[test]
    fn test_out_of_range_fields_unusable() {
        let base = || RawProduct::new(Source::Amazon, "Phone", "https://x.test");

        assert!(base().with_price(0.0).with_rating(5.0).is_usable());
        assert!(!base().with_price(-100.0).is_usable());
        assert!(!base().with_price(f64::NAN).is_usable());
        assert!(!base().with_price(f64::INFINITY).is_usable());
        assert!(!base().with_rating(50.0).is_usable());
        assert!(!base().with_rating(-0.5).is_usable());
        assert!(!base().with_rating(f64::NAN).is_usable());
        assert_eq!(base().with_rating(50.0).defect(), Some("rating outside 0-5"));
    }

    #[test]
    fn test_retain_usable() {
        let mut records = vec![
            RawProduct::new(Source::Amazon, "bogus", "https://x.test/1")
                .with_price(-100.0)
                .with_rating(50.0),
            RawProduct::new(Source::Amazon, "honest", "https://x.test/2")
                .with_price(500.0)
                .with_rating(4.8),
            RawProduct::new(Source::Amazon, "", "https://x.test/3"),
        ];
        assert_eq!(retain_usable(&mut records), 2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "honest");
    }

    #[test]
    fn test_weights_normalized() {
        assert!(WeightVector::default().is_normalized());
        assert!(!WeightVector::new(1.0, 1.0, 1.0, 1.0).unwrap().is_normalized());
        assert!(WeightVector::new(1.0, 0.0, 0.0, 0.0).unwrap().is_normalized());
    }
}
