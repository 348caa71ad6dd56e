//! Land Registry price-paid client.
//!
//! Submits the SPARQL query built by [`crate::query`] to the public endpoint
//! and parses the SPARQL 1.1 JSON result set into [`Transaction`] records.
//! Non-empty result payloads are cached by query text; an explicit
//! `--refresh` invalidates before fetching.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::FetchCache;
use crate::config::Config;
use crate::errors::FetchError;
use crate::net;
use crate::postcode;
use crate::query;

const SERVICE: &str = "Land Registry SPARQL endpoint";
const CACHE_OP: &str = "query";

/// Geographic point, WGS84.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One price-paid transaction, as fetched. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub postcode: String,
    /// District join key ("WV1"), derived from `postcode` at parse time.
    pub outcode: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub property_type: Option<String>,
    /// Present only for sources that carry per-transaction coordinates;
    /// the SPARQL endpoint does not.
    pub point: Option<Coordinates>,
}

// SPARQL 1.1 JSON results layout: results.bindings is a list of rows,
// each row a map from selected variable to a term carrying `value`.
#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Client for the price-paid query endpoint.
pub struct PricePaidClient {
    http: reqwest::Client,
    endpoint: String,
    retries: u32,
    cache: Option<FetchCache>,
}

impl PricePaidClient {
    pub fn new(cfg: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            http: net::client(cfg.timeout)?,
            endpoint: cfg.query_url.clone(),
            retries: cfg.retries,
            cache: cfg.fetch_cache(),
        })
    }

    /// Fetch all transactions for a town in an inclusive date range.
    ///
    /// Zero rows is `FetchError::EmptyResult`, distinct from transport
    /// failure; the town/date parameters are echoed in the error so the
    /// message identifies the query that came back empty.
    pub async fn fetch(
        &self,
        town: &str,
        start: NaiveDate,
        end: NaiveDate,
        refresh: bool,
    ) -> Result<Vec<Transaction>, FetchError> {
        let sparql = query::price_paid_query(town, start, end);

        if refresh {
            if let Some(cache) = &self.cache {
                cache.invalidate(CACHE_OP, &sparql)?;
            }
        }

        let (payload, from_cache) = match self.cached(&sparql)? {
            Some(payload) => (payload, true),
            None => (self.execute(&sparql).await?, false),
        };

        let transactions = parse_transactions(&payload)?;
        if transactions.is_empty() {
            return Err(FetchError::EmptyResult {
                town: town.to_string(),
                start,
                end,
            });
        }
        // Cache entries have no TTL, so an empty answer is never stored:
        // data for the range may appear upstream later.
        if !from_cache {
            if let Some(cache) = &self.cache {
                cache.put(CACHE_OP, &sparql, &payload)?;
            }
        }
        info!(town, rows = transactions.len(), "transactions fetched");
        Ok(transactions)
    }

    fn cached(&self, sparql: &str) -> Result<Option<Value>, FetchError> {
        match &self.cache {
            Some(cache) => Ok(cache.get(CACHE_OP, sparql)?),
            None => Ok(None),
        }
    }

    async fn execute(&self, sparql: &str) -> Result<Value, FetchError> {
        debug!(endpoint = %self.endpoint, "submitting SPARQL query");
        let request = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/sparql-results+json")
            .form(&[("query", sparql)]);
        let resp = net::send_with_retry(request, SERVICE, self.retries).await?;
        let resp = resp.error_for_status().map_err(|source| FetchError::Transport {
            service: SERVICE,
            source,
        })?;
        resp.json::<Value>()
            .await
            .map_err(|source| FetchError::Transport {
                service: SERVICE,
                source,
            })
    }
}

/// Parse a SPARQL JSON result payload into transactions.
///
/// `postcode`, `amount`, and `date` are required per row; the property-type
/// label is optional (the query marks it `OPTIONAL`). The district outcode
/// is derived from each row's own postcode, never sampled from one row.
pub fn parse_transactions(payload: &Value) -> Result<Vec<Transaction>, FetchError> {
    let results: SparqlResults =
        serde_json::from_value(payload.clone()).map_err(|err| FetchError::Malformed {
            service: SERVICE,
            message: err.to_string(),
        })?;

    let mut transactions = Vec::with_capacity(results.results.bindings.len());
    for row in &results.results.bindings {
        let postcode = required(row, "postcode")?;
        let amount = required(row, "amount")?
            .parse::<f64>()
            .map_err(|_| malformed(format!("amount is not numeric: {:?}", row.get("amount"))))?;
        let date = NaiveDate::parse_from_str(required(row, "date")?, "%Y-%m-%d")
            .map_err(|_| malformed(format!("date is not ISO-8601: {:?}", row.get("date"))))?;
        let property_type = row.get("propertyTypeLabel").map(|t| t.value.clone());

        transactions.push(Transaction {
            outcode: postcode::district(postcode).to_string(),
            postcode: postcode.to_string(),
            amount,
            date,
            property_type,
            point: None,
        });
    }
    Ok(transactions)
}

fn required<'a>(
    row: &'a HashMap<String, SparqlTerm>,
    var: &str,
) -> Result<&'a str, FetchError> {
    row.get(var)
        .map(|t| t.value.as_str())
        .ok_or_else(|| malformed(format!("binding is missing required variable {var}")))
}

fn malformed(message: String) -> FetchError {
    FetchError::Malformed {
        service: SERVICE,
        message,
    }
}
