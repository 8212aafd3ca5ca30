//! Store adapters: search URL, fetch policy and selector profile per store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use url::Url;

use crate::aggregate::SourceAdapter;
use crate::config::Config;
use crate::error::{Result, ShopError};
use crate::extract::{extract_listings, FieldSelector, SelectorProfile};
use crate::fetch::{fetch_with_retry, http_agent, RetryPolicy};
use crate::product::{RawProduct, Source};

const AMAZON: SelectorProfile = SelectorProfile {
    base_url: "https://www.amazon.in",
    card: "div.s-result-item[data-component-type='s-search-result']",
    title: &[FieldSelector::text("h2 a span, h2 span")],
    link: &[FieldSelector::attr("h2 a, a.a-link-normal.s-no-outline", "href")],
    price: &[
        FieldSelector::text(".a-price .a-offscreen"),
        FieldSelector::text(".a-price-whole"),
    ],
    rating: &[
        FieldSelector::attr("i.a-icon-star-small", "aria-label"),
        FieldSelector::text("span.a-icon-alt"),
    ],
    reviews: &[FieldSelector::text("span.a-size-base.s-underline-text")],
    image: &[FieldSelector::attr("img.s-image", "src")],
};

const FLIPKART: SelectorProfile = SelectorProfile {
    base_url: "https://www.flipkart.com",
    card: "div._1AtVbE",
    title: &[FieldSelector::text("div._4rR01T, a.s1Q9rs")],
    link: &[FieldSelector::attr("a._1fQZEK, a.s1Q9rs", "href")],
    price: &[FieldSelector::text("div._30jeq3")],
    rating: &[FieldSelector::text("div._3LWZlK")],
    reviews: &[FieldSelector::text("span._2_R_DZ, span._13vcmD")],
    image: &[FieldSelector::attr("img._396cs4", "src")],
};

const MYNTRA: SelectorProfile = SelectorProfile {
    base_url: "https://www.myntra.com",
    card: "li.product-base",
    title: &[
        FieldSelector::text("h3.product-brand"),
        FieldSelector::text("h4.product-product"),
    ],
    link: &[FieldSelector::attr("a", "href")],
    price: &[
        FieldSelector::text("span.product-discountedPrice"),
        FieldSelector::text("div.product-price span"),
    ],
    // Ratings only appear on some layouts
    rating: &[FieldSelector::text("div.product-ratingsContainer span")],
    reviews: &[FieldSelector::text("div.product-ratingsCount")],
    image: &[FieldSelector::attr("img.product-image", "src")],
};

const SNAPDEAL: SelectorProfile = SelectorProfile {
    base_url: "https://www.snapdeal.com",
    card: "div.product-tuple-listing",
    title: &[FieldSelector::text("p.product-title")],
    link: &[FieldSelector::attr("a.dp-widget-link", "href")],
    price: &[FieldSelector::text("span.product-price")],
    // Star bar width as a percentage
    rating: &[FieldSelector::attr("div.filled-stars", "style")],
    reviews: &[FieldSelector::text("p.product-rating-count")],
    image: &[
        FieldSelector::attr("img.product-image", "src"),
        FieldSelector::attr("img.product-image", "data-src"),
    ],
};

/// Selector profile for a store's search page
pub fn profile(source: Source) -> &'static SelectorProfile {
    match source {
        Source::Amazon => &AMAZON,
        Source::Flipkart => &FLIPKART,
        Source::Myntra => &MYNTRA,
        Source::Snapdeal => &SNAPDEAL,
    }
}

/// Search page URL for `query` on `source`
pub fn search_url(source: Source, query: &str) -> Result<String> {
    let query = query.trim();
    let url = match source {
        Source::Amazon => Url::parse_with_params("https://www.amazon.in/s", &[("k", query)])?,
        Source::Flipkart => {
            Url::parse_with_params("https://www.flipkart.com/search", &[("q", query)])?
        }
        Source::Snapdeal => {
            Url::parse_with_params("https://www.snapdeal.com/search", &[("keyword", query)])?
        }
        Source::Myntra => {
            // Myntra searches by path slug: "black dress" -> /black-dress
            let slug = query
                .split_whitespace()
                .map(|word| urlencoding::encode(&word.to_lowercase()).into_owned())
                .collect::<Vec<_>>()
                .join("-");
            Url::parse(profile(source).base_url)?.join(&slug)?
        }
    };
    Ok(url.to_string())
}

/// Retry policy per store; only Flipkart retries
pub fn retry_policy(source: Source, config: &Config) -> RetryPolicy {
    match source {
        Source::Flipkart => RetryPolicy {
            retries: config.fetch.retries,
            backoff: config.fetch.backoff(),
        },
        _ => RetryPolicy::NONE,
    }
}

/// HTTP adapter for one store
///
/// The adapter's timeout bounds each HTTP request and is also its deadline
/// in the aggregator, so retries never outlive the result.
pub struct StoreAdapter {
    source: Source,
    retry: RetryPolicy,
    max_results: usize,
    timeout: Duration,
    agent: ureq::Agent,
}

impl StoreAdapter {
    pub fn new(source: Source, config: &Config) -> Self {
        let timeout = config.fetch.timeout();
        Self {
            source,
            retry: retry_policy(source, config),
            max_results: config.fetch.max_results,
            timeout,
            agent: http_agent(timeout),
        }
    }

    /// Override the configured timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.agent = http_agent(timeout);
        self
    }

    /// Normalize a fetched search page into usable products
    pub fn parse(&self, html: &str) -> Result<Vec<RawProduct>> {
        let listings = extract_listings(html, profile(self.source), self.max_results)?;
        let found = listings.len();
        let products: Vec<RawProduct> = listings
            .into_iter()
            .filter_map(|listing| listing.into_product(self.source))
            .collect();

        if found > products.len() {
            tracing::debug!(
                source = %self.source,
                skipped = found - products.len(),
                "skipped listings without title"
            );
        }
        Ok(products)
    }
}

impl SourceAdapter for StoreAdapter {
    fn source(&self) -> Source {
        self.source
    }

    fn fetch(&self, query: &str) -> Result<Vec<RawProduct>> {
        let url = search_url(self.source, query)?;
        tracing::debug!(source = %self.source, %url, "fetching search page");

        let deadline = Instant::now() + self.timeout;
        let html = fetch_with_retry(&self.agent, &url, self.retry, deadline).map_err(|e| {
            ShopError::SourceFailed {
                store: self.source,
                message: e.to_string(),
            }
        })?;
        self.parse(&html)
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}

/// Adapters for `config.sources`, in configured order, each with `timeout`
pub fn default_adapters(config: &Config, timeout: Duration) -> Vec<Arc<dyn SourceAdapter>> {
    config
        .sources
        .iter()
        .map(|&source| {
            Arc::new(StoreAdapter::new(source, config).with_timeout(timeout))
                as Arc<dyn SourceAdapter>
        })
        .collect()
}
