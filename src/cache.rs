//! Incremental compile cache.
//!
//! Entries are JSON files named after the SHA-256 of the options fingerprint
//! and the source text. Compilation is deterministic, so a hit can stand in
//! for a fresh compile.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

use crate::config::CompileOptions;
use crate::error::BuildError;
use crate::ir::GeneratedModule;

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub module: GeneratedModule,
}

pub struct IncrementalCache {
    cache_dir: PathBuf,
}

impl IncrementalCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, BuildError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|e| BuildError::io(&cache_dir, e))?;
        Ok(Self { cache_dir })
    }

    pub fn compute_hash(options: &CompileOptions, source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(options.fingerprint().as_bytes());
        hasher.update([0u8]);
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, hash: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", hash))
    }

    pub fn get(&self, options: &CompileOptions, source: &str) -> Option<GeneratedModule> {
        let hash = Self::compute_hash(options, source);
        let cache_path = self.entry_path(&hash);
        let data = fs::read_to_string(&cache_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                eprintln!(
                    "[Dribble] Cache entry {} is corrupt, removing: {}",
                    cache_path.display(),
                    e
                );
                fs::remove_file(&cache_path).ok();
                return None;
            }
        };

        (entry.hash == hash).then_some(entry.module)
    }

    /// Store a compiled module. Write failures are logged, not fatal.
    pub fn set(&self, options: &CompileOptions, source: &str, module: &GeneratedModule) {
        let hash = Self::compute_hash(options, source);
        let cache_path = self.entry_path(&hash);
        let entry = CacheEntry {
            hash,
            module: module.clone(),
        };

        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(e) = fs::write(&cache_path, data) {
                    eprintln!(
                        "[Dribble] Failed to write cache entry {}: {}",
                        cache_path.display(),
                        e
                    );
                }
            }
            Err(e) => eprintln!("[Dribble] Failed to serialize cache entry: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(code: &str) -> GeneratedModule {
        GeneratedModule {
            code: code.to_string(),
            source_map: None,
        }
    }

    #[test]
    fn test_round_trip_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IncrementalCache::new(dir.path().join("cache")).unwrap();
        let options = CompileOptions::default();

        assert!(cache.get(&options, "src").is_none());
        cache.set(&options, "src", &module("out"));
        assert_eq!(cache.get(&options, "src"), Some(module("out")));
    }

    #[test]
    fn test_options_change_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IncrementalCache::new(dir.path()).unwrap();
        let options = CompileOptions::default();
        cache.set(&options, "src", &module("out"));

        let other = CompileOptions {
            render_helper: "paint".to_string(),
            ..CompileOptions::default()
        };
        assert!(cache.get(&other, "src").is_none());
        assert!(cache.get(&options, "src2").is_none());
    }

    #[test]
    fn test_corrupt_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IncrementalCache::new(dir.path()).unwrap();
        let options = CompileOptions::default();
        let path = cache.entry_path(&IncrementalCache::compute_hash(&options, "src"));
        fs::write(&path, "{ broken").unwrap();

        assert!(cache.get(&options, "src").is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_hash_is_stable() {
        let options = CompileOptions::default();
        let a = IncrementalCache::compute_hash(&options, "x");
        assert_eq!(a, IncrementalCache::compute_hash(&options, "x"));
        assert_eq!(a.len(), 64);
    }
}
