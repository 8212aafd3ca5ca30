pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod features;
pub mod fetch;
pub mod filter;
pub mod history;
pub mod normalize;
pub mod product;
pub mod rank;
pub mod relevance;
pub mod sources;

pub use aggregate::{search_and_compare, Aggregator, SourceAdapter};
pub use error::{Result, ShopError};
pub use product::{ComparisonResult, RankedProduct, RawProduct, Source, WeightVector};
pub use rank::compare;
