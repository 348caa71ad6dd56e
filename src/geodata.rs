//! Polygon fetch and enrichment.
//!
//! The polygon host publishes one GeoJSON FeatureCollection per postcode
//! area at a fixed URL template; each feature's `properties.name` is a
//! district ("WV1", "WV2", ...). The collection is reference data — fetched
//! once, cached indefinitely — and enrichment writes the matching mean price
//! into each feature, or JSON null when the district saw no transactions.
//! Null means "no data" and is deliberately distinct from a zero price.
//!
//! The GeoJSON is held as [`serde_json::Value`] throughout: nothing here
//! interprets geometry, it only decorates properties.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::FetchCache;
use crate::config::Config;
use crate::errors::FetchError;
use crate::net;

const SERVICE: &str = "polygon host";
const CACHE_OP: &str = "geojson";

/// The property key written onto each feature, matching what map renderers
/// downstream expect to color by.
pub const PRICE_PROPERTY: &str = "average price";

/// How an annotation pass went: features that matched an aggregate versus
/// features left with the null marker.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub matched: usize,
    pub unmatched: usize,
}

pub struct PolygonClient {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
    cache: Option<FetchCache>,
}

impl PolygonClient {
    pub fn new(cfg: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            http: net::client(cfg.timeout)?,
            base_url: cfg.polygon_url.trim_end_matches('/').to_string(),
            retries: cfg.retries,
            cache: cfg.fetch_cache(),
        })
    }

    /// Fetch the FeatureCollection for a postcode area ("WV", "B", ...).
    ///
    /// A 404 means the area simply is not in the published set and maps to
    /// `FetchError::UnknownOutcode`, distinct from transport failure, so the
    /// caller can tell the user which outcode was wrong.
    pub async fn fetch(&self, area: &str, refresh: bool) -> Result<Value, FetchError> {
        if refresh {
            if let Some(cache) = &self.cache {
                cache.invalidate(CACHE_OP, area)?;
            }
        }
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(CACHE_OP, area)? {
                return Ok(cached);
            }
        }

        let url = format!("{}/{}.geojson", self.base_url, area);
        debug!(%url, "fetching polygon collection");
        let resp = net::send_with_retry(self.http.get(&url), SERVICE, self.retries).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::UnknownOutcode(area.to_string()));
        }
        let resp = resp
            .error_for_status()
            .map_err(|source| FetchError::Transport {
                service: SERVICE,
                source,
            })?;
        let geojson: Value = resp.json().await.map_err(|source| FetchError::Transport {
            service: SERVICE,
            source,
        })?;

        if let Some(cache) = &self.cache {
            cache.put(CACHE_OP, area, &geojson)?;
        }
        info!(area, "polygon collection fetched");
        Ok(geojson)
    }
}

/// Annotate every feature in place with its district's mean price.
///
/// Features whose `properties.name` has no entry in `prices` get an explicit
/// JSON null — they stay in the collection so the renderer can show them as
/// "no data" rather than dropping them from the map.
pub fn annotate(geojson: &mut Value, prices: &HashMap<String, f64>) -> AnnotationSummary {
    let mut summary = AnnotationSummary::default();
    let Some(features) = geojson.get_mut("features").and_then(Value::as_array_mut) else {
        return summary;
    };
    for feature in features {
        let name = feature
            .get("properties")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        let Some(props) = feature.get_mut("properties").and_then(Value::as_object_mut) else {
            continue;
        };
        match name.as_deref().and_then(|n| prices.get(n)) {
            Some(price) => {
                props.insert(PRICE_PROPERTY.to_string(), Value::from(*price));
                summary.matched += 1;
            }
            None => {
                props.insert(PRICE_PROPERTY.to_string(), Value::Null);
                summary.unmatched += 1;
            }
        }
    }
    summary
}
