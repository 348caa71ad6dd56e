//! Disk-backed cache for fetched payloads.
//!
//! Remote responses (SPARQL result sets, polygon collections) are stored as
//! JSON files keyed by `(operation, parameters)`, where the parameter string
//! is hashed so arbitrary query text makes a stable filename. Invalidation is
//! explicit only — `invalidate` drops one entry, `invalidate_all` empties the
//! cache — there is no TTL. Polygon files in particular never change upstream
//! and can live here indefinitely.
//!
//! `get` parses a fresh [`Value`] from disk on every call, so a caller that
//! mutates its copy (the geo enricher annotates features in place) can never
//! contaminate a later retrieval.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

/// On-disk cache of fetched JSON payloads.
#[derive(Debug, Clone)]
pub struct FetchCache {
    dir: PathBuf,
}

/// Entry count and total size, for `pricemap cache status`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CacheStatus {
    pub entries: usize,
    pub bytes: u64,
}

impl FetchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, operation: &str, params: &str) -> PathBuf {
        let digest = Sha256::digest(params.as_bytes());
        let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        self.dir.join(format!("{}-{}.json", operation, hash))
    }

    /// Look up a cached payload. A missing or unparseable file is a miss;
    /// corrupt entries are removed so the next `put` starts clean.
    pub fn get(&self, operation: &str, params: &str) -> io::Result<Option<Value>> {
        let path = self.entry_path(operation, params);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(operation, path = %path.display(), "cache hit");
                Ok(Some(value))
            }
            Err(_) => {
                debug!(operation, path = %path.display(), "corrupt cache entry, dropping");
                fs::remove_file(&path)?;
                Ok(None)
            }
        }
    }

    pub fn put(&self, operation: &str, params: &str, value: &Value) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(operation, params);
        fs::write(&path, serde_json::to_vec(value)?)?;
        debug!(operation, path = %path.display(), "cache store");
        Ok(())
    }

    /// Remove a single entry. Removing an absent entry is not an error.
    pub fn invalidate(&self, operation: &str, params: &str) -> io::Result<()> {
        let path = self.entry_path(operation, params);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Remove every cached entry.
    pub fn invalidate_all(&self) -> io::Result<()> {
        for entry in self.entries()? {
            fs::remove_file(entry)?;
        }
        Ok(())
    }

    pub fn status(&self) -> io::Result<CacheStatus> {
        let mut status = CacheStatus::default();
        for entry in self.entries()? {
            status.entries += 1;
            status.bytes += fs::metadata(&entry)?.len();
        }
        Ok(status)
    }

    fn entries(&self) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(paths),
            Err(err) => return Err(err),
        };
        for entry in read_dir {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cache() -> (TempDir, FetchCache) {
        let dir = TempDir::new().unwrap();
        let cache = FetchCache::new(dir.path());
        (dir, cache)
    }

    #[test]
    fn test_miss_on_empty_cache() {
        let (_dir, cache) = cache();
        assert_eq!(cache.get("query", "SELECT 1").unwrap(), None);
    }

    #[test]
    fn test_put_get_round_trip() {
        let (_dir, cache) = cache();
        let value = json!({"rows": [1, 2, 3]});
        cache.put("query", "SELECT 1", &value).unwrap();
        assert_eq!(cache.get("query", "SELECT 1").unwrap(), Some(value));
    }

    #[test]
    fn test_different_params_are_distinct_entries() {
        let (_dir, cache) = cache();
        cache.put("query", "a", &json!(1)).unwrap();
        cache.put("query", "b", &json!(2)).unwrap();
        assert_eq!(cache.get("query", "a").unwrap(), Some(json!(1)));
        assert_eq!(cache.get("query", "b").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_invalidate_single_entry() {
        let (_dir, cache) = cache();
        cache.put("geojson", "WV", &json!({"features": []})).unwrap();
        cache.put("query", "a", &json!(1)).unwrap();
        cache.invalidate("geojson", "WV").unwrap();
        assert_eq!(cache.get("geojson", "WV").unwrap(), None);
        assert_eq!(cache.get("query", "a").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_invalidate_absent_entry_is_ok() {
        let (_dir, cache) = cache();
        cache.invalidate("query", "never stored").unwrap();
    }

    #[test]
    fn test_invalidate_all_empties_cache() {
        let (_dir, cache) = cache();
        cache.put("query", "a", &json!(1)).unwrap();
        cache.put("geojson", "WV", &json!(2)).unwrap();
        cache.invalidate_all().unwrap();
        assert_eq!(cache.status().unwrap(), CacheStatus::default());
    }

    #[test]
    fn test_status_counts_entries() {
        let (_dir, cache) = cache();
        cache.put("query", "a", &json!({"k": "v"})).unwrap();
        cache.put("query", "b", &json!({"k": "v"})).unwrap();
        let status = cache.status().unwrap();
        assert_eq!(status.entries, 2);
        assert!(status.bytes > 0);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss_and_removed() {
        let (dir, cache) = cache();
        cache.put("query", "a", &json!(1)).unwrap();
        // Overwrite the stored file with junk.
        let path = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        std::fs::write(&path, b"not json").unwrap();
        assert_eq!(cache.get("query", "a").unwrap(), None);
        assert_eq!(cache.status().unwrap().entries, 0);
    }

    #[test]
    fn test_mutating_a_retrieval_does_not_affect_the_next() {
        let (_dir, cache) = cache();
        cache
            .put("geojson", "WV", &json!({"features": [{"properties": {"name": "WV1"}}]}))
            .unwrap();
        let mut first = cache.get("geojson", "WV").unwrap().unwrap();
        first["features"][0]["properties"]["average price"] = json!(250000.0);
        let second = cache.get("geojson", "WV").unwrap().unwrap();
        assert!(second["features"][0]["properties"].get("average price").is_none());
    }
}
