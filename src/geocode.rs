//! Geocoding client (Nominatim-style search API).
//!
//! Used only as the fallback for the map viewport center when the
//! transaction set carries no coordinates of its own.

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::errors::FetchError;
use crate::landregistry::Coordinates;
use crate::net;

const SERVICE: &str = "geocoding service";

/// One search hit. Nominatim serializes coordinates as strings.
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

pub struct GeocodeClient {
    http: reqwest::Client,
    endpoint: String,
    retries: u32,
}

impl GeocodeClient {
    pub fn new(cfg: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            http: net::client(cfg.timeout)?,
            endpoint: cfg.geocode_url.clone(),
            retries: cfg.retries,
        })
    }

    /// Resolve a UK town name to coordinates.
    ///
    /// The country suffix is appended so bare town names resolve inside
    /// the UK; an empty hit list is `FetchError::GeocodeNotFound`.
    pub async fn lookup(&self, town: &str) -> Result<Coordinates, FetchError> {
        let place = format!("{}, UK", town.trim());
        debug!(%place, "geocoding");
        let request = self
            .http
            .get(&self.endpoint)
            .query(&[("q", place.as_str()), ("format", "json"), ("limit", "1")]);
        let resp = net::send_with_retry(request, SERVICE, self.retries).await?;
        let resp = resp
            .error_for_status()
            .map_err(|source| FetchError::Transport {
                service: SERVICE,
                source,
            })?;
        let hits: Vec<GeocodeHit> =
            resp.json().await.map_err(|source| FetchError::Transport {
                service: SERVICE,
                source,
            })?;

        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::GeocodeNotFound(place.clone()))?;
        parse_hit(&hit)
    }
}

fn parse_hit(hit: &GeocodeHit) -> Result<Coordinates, FetchError> {
    let parse = |field: &str, raw: &str| {
        raw.parse::<f64>().map_err(|_| FetchError::Malformed {
            service: SERVICE,
            message: format!("{field} is not numeric: {raw:?}"),
        })
    };
    Ok(Coordinates {
        lat: parse("lat", &hit.lat)?,
        lon: parse("lon", &hit.lon)?,
    })
}
