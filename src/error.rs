use thiserror::Error;

use crate::product::Source;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] refinery::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Extraction failed: {0}")]
    ExtractionError(String),

    #[error("{store} search failed: {message}")]
    SourceFailed { store: Source, message: String },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ShopError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ShopError::HttpError(_) => Some(
                "Check your internet connection, or raise the timeout:\n  shopcmp search \"<query>\" --timeout 30s"
            ),
            ShopError::InvalidWeights(_) => Some(
                "Weights must be non-negative numbers, e.g.:\n  shopcmp config set-weights 0.4 0.3 0.2 0.1"
            ),
            ShopError::UnknownSource(_) => Some(
                "Known sources: amazon, flipkart, myntra, snapdeal"
            ),
            ShopError::DatabaseError(_) | ShopError::MigrationError(_) => Some(
                "The search history database may be damaged. Try:\n  shopcmp history --clear"
            ),
            ShopError::TomlError(_) | ShopError::ConfigError(_) => Some(
                "Inspect the config file with `shopcmp config path`, or start over with `shopcmp config reset`"
            ),
            ShopError::JsonError(_) => Some(
                "Input must be a JSON array of product records"
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
