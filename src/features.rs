//! Batch-local feature normalization.
//!
//! All rescaling is relative to the batch being ranked. A feature with no
//! spread across the batch (max == min, including a batch of one) scores
//! 1.0 for everyone instead of dividing by zero.

use crate::product::{FeatureScores, RawProduct};

/// Value given to every product on an axis with no spread
pub const DEGENERATE_SCORE: f64 = 1.0;

/// Replace absent prices with the mean of the present ones
///
/// When no product in the batch has a price, every price becomes 0.0.
pub fn impute_prices(prices: &[Option<f64>]) -> Vec<f64> {
    let present: Vec<f64> = prices.iter().flatten().copied().collect();
    let mean = if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f64>() / present.len() as f64
    };

    prices.iter().map(|p| p.unwrap_or(mean)).collect()
}

fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;
    Some((min, max))
}

/// Linear min-max rescaling, higher is better: min → 0.0, max → 1.0
pub fn min_max(values: &[f64]) -> Vec<f64> {
    match bounds(values) {
        Some((min, max)) if max > min => {
            values.iter().map(|v| (v - min) / (max - min)).collect()
        }
        _ => vec![DEGENERATE_SCORE; values.len()],
    }
}

/// Linear inverse min-max rescaling, lower is better: min → 1.0, max → 0.0
pub fn inverse_min_max(values: &[f64]) -> Vec<f64> {
    match bounds(values) {
        Some((min, max)) if max > min => {
            values.iter().map(|v| 1.0 - (v - min) / (max - min)).collect()
        }
        _ => vec![DEGENERATE_SCORE; values.len()],
    }
}

/// Normalized features for a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFeatures {
    /// Effective price per product after imputation
    pub prices: Vec<f64>,
    pub scores: Vec<FeatureScores>,
}

/// Impute missing prices and rescale all four features across the batch
///
/// `relevance` must hold one value per product, in the same order.
pub fn normalize_features(products: &[RawProduct], relevance: &[f64]) -> BatchFeatures {
    debug_assert_eq!(products.len(), relevance.len());

    let raw_prices: Vec<Option<f64>> = products.iter().map(|p| p.price).collect();
    let prices = impute_prices(&raw_prices);
    let ratings: Vec<f64> = products.iter().map(|p| p.rating).collect();
    let reviews: Vec<f64> = products.iter().map(|p| p.reviews as f64).collect();

    let price_norm = inverse_min_max(&prices);
    let rating_norm = min_max(&ratings);
    let reviews_norm = min_max(&reviews);
    let relevance_norm = min_max(relevance);

    let scores = (0..products.len())
        .map(|i| FeatureScores {
            price: price_norm[i],
            rating: rating_norm[i],
            reviews: reviews_norm[i],
            relevance: relevance_norm[i],
        })
        .collect();

    BatchFeatures { prices, scores }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Source;

    #[test]
    fn test_impute_prices_mean() {
        let prices = impute_prices(&[Some(200.0), None, Some(400.0)]);
        assert_eq!(prices, vec![200.0, 300.0, 400.0]);
    }

    #[test]
    fn test_impute_prices_none_present() {
        assert_eq!(impute_prices(&[None, None]), vec![0.0, 0.0]);
        assert!(impute_prices(&[]).is_empty());
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[1.0, 3.0, 5.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_inverse_min_max() {
        assert_eq!(inverse_min_max(&[500.0, 750.0, 1000.0]), vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(min_max(&[4.0, 4.0]), vec![1.0, 1.0]);
        assert_eq!(inverse_min_max(&[999.0, 999.0, 999.0]), vec![1.0, 1.0, 1.0]);
        assert_eq!(min_max(&[7.0]), vec![1.0]);
        assert!(min_max(&[]).is_empty());
    }

    #[test]
    fn test_normalize_features() {
        let products = vec![
            RawProduct::new(Source::Amazon, "a", "https://a.test")
                .with_price(100.0)
                .with_rating(5.0)
                .with_reviews(10),
            RawProduct::new(Source::Flipkart, "b", "https://b.test")
                .with_rating(3.0)
                .with_reviews(0),
            RawProduct::new(Source::Myntra, "c", "https://c.test")
                .with_price(300.0)
                .with_rating(1.0)
                .with_reviews(20),
        ];

        let features = normalize_features(&products, &[0.2, 0.2, 0.2]);
        assert_eq!(features.prices, vec![100.0, 200.0, 300.0]);

        let s = &features.scores;
        assert_eq!(s[0].price, 1.0);
        assert_eq!(s[1].price, 0.5);
        assert_eq!(s[2].price, 0.0);
        assert_eq!(s[0].rating, 1.0);
        assert_eq!(s[2].rating, 0.0);
        assert_eq!(s[1].reviews, 0.0);
        assert_eq!(s[0].reviews, 0.5);
        assert!(s.iter().all(|f| f.relevance == 1.0));
    }
}
