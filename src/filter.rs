use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};
use crate::product::{ComparisonResult, RankedProduct, Source, MAX_RATING};
use crate::rank::{best_by_source, top_results};

/// Post-ranking filter over a comparison
///
/// Filtering never re-ranks: kept products retain their rank and score, and
/// the summaries are re-derived from what remains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultFilter {
    /// Minimum effective price (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    /// Maximum effective price (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Minimum rating (inclusive)
    #[serde(default)]
    pub min_rating: f64,
    /// Only keep these sources; empty keeps all
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl ResultFilter {
    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_rating <= 0.0
            && self.sources.is_empty()
    }

    /// Reject bounds that could never match or are out of range
    pub fn validate(&self) -> Result<()> {
        for (name, bound) in [("min price", self.min_price), ("max price", self.max_price)] {
            if let Some(value) = bound {
                if !value.is_finite() || value < 0.0 {
                    return Err(ShopError::ConfigError(format!(
                        "{} must be a non-negative number, got {}",
                        name, value
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ShopError::ConfigError(format!(
                    "min price {} is greater than max price {}",
                    min, max
                )));
            }
        }

        if !self.min_rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.min_rating) {
            return Err(ShopError::ConfigError(format!(
                "min rating must be between 0 and 5, got {}",
                self.min_rating
            )));
        }

        Ok(())
    }

    /// Evaluate the filter against a single product (AND logic)
    pub fn matches(&self, product: &RankedProduct) -> bool {
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }

        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }

        if product.rating < self.min_rating {
            return false;
        }

        if !self.sources.is_empty() && !self.sources.contains(&product.source) {
            return false;
        }

        true
    }

    /// Apply to a ranked comparison, recomputing the summaries
    pub fn apply(&self, result: ComparisonResult, query: &str) -> ComparisonResult {
        if self.is_empty() || result.is_empty() {
            return result;
        }

        let total = result.all_products.len();
        let kept: Vec<RankedProduct> = result
            .all_products
            .into_iter()
            .filter(|p| self.matches(p))
            .collect();

        tracing::debug!(total, kept = kept.len(), "applied result filter");

        let message = if kept.is_empty() {
            format!(
                "No products matching '{}' passed the filters ({} found)",
                query, total
            )
        } else {
            format!(
                "Found {} products matching '{}' ({} after filters)",
                total,
                query,
                kept.len()
            )
        };

        ComparisonResult {
            message,
            top_results: top_results(&kept),
            best_by_source: best_by_source(&kept),
            all_products: kept,
        }
    }
}
