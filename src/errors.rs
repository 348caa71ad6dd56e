//! Typed error hierarchy for pricemap.
//!
//! Three enums cover the failure surface:
//! - `FetchError` — remote data retrieval (SPARQL endpoint, polygon host, geocoder)
//! - `StatsError` — derived-statistics failures on already-fetched data
//! - `ReportError` — either of the above, surfaced from a report handler
//!
//! A polygon feature with no matching aggregate is *not* an error anywhere in
//! this hierarchy: it is annotated with a JSON null ("no data") and rendered
//! as such.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from the three remote data sources and the local fetch cache.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to the {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("No transactions found for {town} between {start} and {end}")]
    EmptyResult {
        town: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("No polygon data is published for outcode area {0}")]
    UnknownOutcode(String),

    #[error("Geocoder found no match for {0}")]
    GeocodeNotFound(String),

    #[error("Malformed response from the {service}: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("Fetch cache error: {0}")]
    Cache(#[from] std::io::Error),
}

/// Errors from statistics derived over a fetched transaction set.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The year-over-year comparison has no prior-year data point.
    #[error("Insufficient history: no data for {month} to compare against")]
    InsufficientHistory { month: String },

    #[error("Cannot compute statistics over an empty transaction set")]
    NoTransactions,
}

/// Combined error for the report handlers in [`crate::report`].
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Stats(#[from] StatsError),
}
