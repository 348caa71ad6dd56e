//! Layered configuration: file → environment → CLI flags.
//!
//! An optional `pricemap.toml` overrides the built-in endpoint and HTTP
//! defaults, environment variables override the file, and CLI flags
//! (`--no-cache`, `--refresh`) sit on top at the call sites.
//!
//! # Configuration file format
//!
//! ```toml
//! [endpoints]
//! query_url = "https://landregistry.data.gov.uk/landregistry/query"
//! polygon_url = "https://raw.githubusercontent.com/missinglink/uk-postcode-polygons/master/geojson"
//! geocode_url = "https://nominatim.openstreetmap.org/search"
//!
//! [http]
//! timeout_secs = 30
//! retries = 2
//!
//! [cache]
//! dir = "/tmp/pricemap-cache"
//! ```
//!
//! Environment variables: `PRICEMAP_QUERY_URL`, `PRICEMAP_POLYGON_URL`,
//! `PRICEMAP_GEOCODE_URL`, `PRICEMAP_TIMEOUT_SECS`, `PRICEMAP_RETRIES`,
//! `PRICEMAP_CACHE_DIR`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::cache::FetchCache;

pub const DEFAULT_QUERY_URL: &str = "https://landregistry.data.gov.uk/landregistry/query";
pub const DEFAULT_POLYGON_URL: &str =
    "https://raw.githubusercontent.com/missinglink/uk-postcode-polygons/master/geojson";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRIES: u32 = 2;

const CONFIG_FILE: &str = "pricemap.toml";

/// On-disk configuration, all fields optional.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PricemapToml {
    #[serde(default)]
    pub endpoints: EndpointsSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub cache: CacheSection,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EndpointsSection {
    pub query_url: Option<String>,
    pub polygon_url: Option<String>,
    pub geocode_url: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    pub dir: Option<PathBuf>,
}

impl PricemapToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Effective runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub query_url: String,
    pub polygon_url: String,
    pub geocode_url: String,
    pub timeout: Duration,
    pub retries: u32,
    pub cache_dir: PathBuf,
    /// `false` under `--no-cache`: fetches bypass the disk cache entirely.
    pub use_cache: bool,
    /// Path of the config file actually loaded, for `pricemap config`.
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Resolve configuration: defaults, then `pricemap.toml` (the given
    /// path, or `./pricemap.toml` when present), then environment.
    pub fn load(config_path: Option<&Path>, use_cache: bool) -> Result<Self> {
        let (toml, config_file) = match config_path {
            Some(path) => (PricemapToml::load(path)?, Some(path.to_path_buf())),
            None => {
                let default_path = PathBuf::from(CONFIG_FILE);
                if default_path.exists() {
                    (PricemapToml::load(&default_path)?, Some(default_path))
                } else {
                    (PricemapToml::default(), None)
                }
            }
        };

        let mut config = Self::from_toml(&toml, use_cache, config_file);
        config.overlay_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn from_toml(toml: &PricemapToml, use_cache: bool, config_file: Option<PathBuf>) -> Self {
        Self {
            query_url: toml
                .endpoints
                .query_url
                .clone()
                .unwrap_or_else(|| DEFAULT_QUERY_URL.to_string()),
            polygon_url: toml
                .endpoints
                .polygon_url
                .clone()
                .unwrap_or_else(|| DEFAULT_POLYGON_URL.to_string()),
            geocode_url: toml
                .endpoints
                .geocode_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEOCODE_URL.to_string()),
            timeout: Duration::from_secs(toml.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            retries: toml.http.retries.unwrap_or(DEFAULT_RETRIES),
            cache_dir: toml.cache.dir.clone().unwrap_or_else(default_cache_dir),
            use_cache,
            config_file,
        }
    }

    /// Apply environment overrides via a lookup function (injectable so
    /// tests do not fight over process-global variables).
    fn overlay_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = var("PRICEMAP_QUERY_URL") {
            self.query_url = url;
        }
        if let Some(url) = var("PRICEMAP_POLYGON_URL") {
            self.polygon_url = url;
        }
        if let Some(url) = var("PRICEMAP_GEOCODE_URL") {
            self.geocode_url = url;
        }
        if let Some(secs) = var("PRICEMAP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| anyhow!("PRICEMAP_TIMEOUT_SECS is not a number: {secs:?}"))?;
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = var("PRICEMAP_RETRIES") {
            self.retries = retries
                .parse()
                .map_err(|_| anyhow!("PRICEMAP_RETRIES is not a number: {retries:?}"))?;
        }
        if let Some(dir) = var("PRICEMAP_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// The fetch cache, or `None` under `--no-cache`.
    pub fn fetch_cache(&self) -> Option<FetchCache> {
        self.use_cache.then(|| FetchCache::new(&self.cache_dir))
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("pricemap"))
        .unwrap_or_else(|| PathBuf::from(".pricemap-cache"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = Config::from_toml(&PricemapToml::default(), true, None);
        assert_eq!(config.query_url, DEFAULT_QUERY_URL);
        assert_eq!(config.polygon_url, DEFAULT_POLYGON_URL);
        assert_eq!(config.geocode_url, DEFAULT_GEOCODE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.retries, DEFAULT_RETRIES);
        assert!(config.use_cache);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml: PricemapToml = toml::from_str(
            r#"
            [endpoints]
            query_url = "http://localhost:1234/query"
            polygon_url = "http://localhost:1234/geojson"
            geocode_url = "http://localhost:1234/search"

            [http]
            timeout_secs = 5
            retries = 0

            [cache]
            dir = "/tmp/pm"
            "#,
        )
        .unwrap();
        let config = Config::from_toml(&toml, true, None);
        assert_eq!(config.query_url, "http://localhost:1234/query");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retries, 0);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/pm"));
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let toml: PricemapToml = toml::from_str(
            r#"
            [http]
            retries = 1
            "#,
        )
        .unwrap();
        let config = Config::from_toml(&toml, true, None);
        assert_eq!(config.retries, 1);
        assert_eq!(config.query_url, DEFAULT_QUERY_URL);
    }

    #[test]
    fn test_empty_toml_parses() {
        let toml: PricemapToml = toml::from_str("").unwrap();
        let config = Config::from_toml(&toml, true, None);
        assert_eq!(config.geocode_url, DEFAULT_GEOCODE_URL);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml(&PricemapToml::default(), true, None);
        config
            .overlay_env(|name| match name {
                "PRICEMAP_QUERY_URL" => Some("http://127.0.0.1:9/query".to_string()),
                "PRICEMAP_RETRIES" => Some("0".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.query_url, "http://127.0.0.1:9/query");
        assert_eq!(config.retries, 0);
        // Untouched values keep their defaults.
        assert_eq!(config.polygon_url, DEFAULT_POLYGON_URL);
    }

    #[test]
    fn test_non_numeric_env_value_is_an_error() {
        let mut config = Config::from_toml(&PricemapToml::default(), true, None);
        let result = config.overlay_env(|name| {
            (name == "PRICEMAP_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_no_cache_disables_fetch_cache() {
        let config = Config::from_toml(&PricemapToml::default(), false, None);
        assert!(config.fetch_cache().is_none());
    }
}
