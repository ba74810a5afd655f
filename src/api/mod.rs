pub mod worldbank;

use thiserror::Error;

use crate::model::{Country, SeriesPoint};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("indicator not found: {code}")]
    IndicatorNotFound { code: String },

    #[error("provider error {code}: {message}")]
    Api { code: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl SourceError {
    /// Transient failures may succeed if the same request is sent again.
    /// An unknown indicator or a malformed response never will.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Transport(_) => true,
            SourceError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A remote statistics provider.
pub trait IndicatorSource {
    /// All countries known to the provider, aggregates excluded.
    fn list_countries(&self) -> Result<Vec<Country>, SourceError>;

    /// The most recent non-empty value of the series for each of the
    /// `country_codes`, fetched in one batch.
    fn fetch_series(
        &self,
        indicator_code: &str,
        country_codes: &[String],
    ) -> Result<Vec<SeriesPoint>, SourceError>;

    /// The descriptive name of the series.
    fn fetch_series_name(&self, indicator_code: &str) -> Result<String, SourceError>;
}
