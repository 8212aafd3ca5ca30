//! Weighted multi-criteria ranking of one batch of products.

use std::collections::HashSet;

use crate::error::Result;
use crate::features::normalize_features;
use crate::product::{
    ComparisonResult, RankedProduct, RawProduct, Source, WeightVector, TOP_RESULTS,
};
use crate::relevance::relevance_scores;

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rank a batch of products for `query`
///
/// The only error is a weight vector violating its contract (negative or
/// non-finite). Any batch, including an empty one, ranks successfully.
/// Ties keep input order, so identical inputs always give identical output.
pub fn compare(
    query: &str,
    records: &[RawProduct],
    weights: &WeightVector,
) -> Result<ComparisonResult> {
    weights.validate()?;

    if records.is_empty() {
        return Ok(ComparisonResult::empty(query));
    }

    let descriptions: Vec<&str> = records.iter().map(RawProduct::relevance_text).collect();
    let relevance = relevance_scores(query, &descriptions);
    let features = normalize_features(records, &relevance);

    let mut scored: Vec<(usize, f64)> = features
        .scores
        .iter()
        .map(|f| weights.apply(f) * 100.0)
        .enumerate()
        .collect();

    // sort_by is stable: equal scores keep input order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let all_products: Vec<RankedProduct> = scored
        .into_iter()
        .enumerate()
        .map(|(position, (index, raw_score))| {
            let record = &records[index];
            RankedProduct {
                rank: position + 1,
                title: record.title.clone(),
                price: features.prices[index],
                price_imputed: record.price.is_none(),
                rating: record.rating,
                reviews: record.reviews,
                score: round2(raw_score),
                source: record.source,
                link: record.link.clone(),
                image: record.image.clone(),
                description: record.relevance_text().to_string(),
                features: features.scores[index],
            }
        })
        .collect();

    tracing::debug!(
        query,
        products = all_products.len(),
        top_score = all_products.first().map(|p| p.score),
        "ranked batch"
    );

    Ok(ComparisonResult {
        message: format!(
            "Found {} products matching '{}'",
            all_products.len(),
            query
        ),
        top_results: top_results(&all_products),
        best_by_source: best_by_source(&all_products),
        all_products,
    })
}

/// First `TOP_RESULTS` products of a rank-ordered list
pub fn top_results(ranked: &[RankedProduct]) -> Vec<RankedProduct> {
    ranked.iter().take(TOP_RESULTS).cloned().collect()
}

/// First occurrence of each source in a rank-ordered list
pub fn best_by_source(ranked: &[RankedProduct]) -> Vec<RankedProduct> {
    let mut seen: HashSet<Source> = HashSet::new();
    ranked
        .iter()
        .filter(|p| seen.insert(p.source))
        .cloned()
        .collect()
}
