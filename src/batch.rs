//! Batch build over a project tree.
//!
//! Discovers every component under the routes directory, compiles them on a
//! rayon pool and writes each module next to its source. One failing file
//! never stops the others; every failure lands in the report.

#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::IncrementalCache;
use crate::compile::compile_with_options;
use crate::config::BuildConfig;
use crate::discovery::{display_path, find_dribble_files, output_path_for};
use crate::error::BuildError;

// ═══════════════════════════════════════════════════════════════════════════════
// REPORT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildFailure {
    /// Source path relative to the project root.
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Files whose module was written, cache hits included.
    pub compiled: usize,
    /// Subset of `compiled` served from the cache.
    pub cached: usize,
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Written { output: PathBuf, cached: bool },
    Failed(BuildError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILD
// ═══════════════════════════════════════════════════════════════════════════════

/// Compile every component under `config.routes_path()`.
///
/// Errors only when the build cannot start (for example the cache directory
/// cannot be created). Per-file failures are collected in the report.
pub fn build_project(config: &BuildConfig) -> Result<BuildReport, BuildError> {
    let routes = config.routes_path();
    if !routes.is_dir() {
        eprintln!(
            "[Dribble] No routes directory at {}, nothing to compile",
            routes.display()
        );
        return Ok(BuildReport::default());
    }

    let cache = config
        .cache_dir
        .as_ref()
        .map(IncrementalCache::new)
        .transpose()?;
    let files = find_dribble_files(&routes, &config.source_extension);

    let compile_all = || -> Vec<Outcome> {
        files
            .par_iter()
            .map(|file| compile_file(file, config, cache.as_ref()))
            .collect()
    };

    let outcomes = if config.threads > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
        {
            Ok(pool) => pool.install(compile_all),
            Err(e) => {
                eprintln!("[Dribble] Falling back to the global thread pool: {}", e);
                compile_all()
            }
        }
    } else {
        compile_all()
    };

    // `collect` keeps input order, so the log follows the sorted file list.
    let mut report = BuildReport::default();
    for (file, outcome) in files.iter().zip(outcomes) {
        let rel_in = display_path(file, &config.root);
        match outcome {
            Outcome::Written { output, cached } => {
                let rel_out = display_path(&output, &config.root);
                if cached {
                    println!("Compiled {} -> {} (cached)", rel_in, rel_out);
                    report.cached += 1;
                } else {
                    println!("Compiled {} -> {}", rel_in, rel_out);
                }
                report.compiled += 1;
            }
            Outcome::Failed(e) => {
                eprintln!("[Dribble] Failed to compile {}: {}", rel_in, e);
                report.failures.push(BuildFailure {
                    path: rel_in,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

fn compile_file(file: &Path, config: &BuildConfig, cache: Option<&IncrementalCache>) -> Outcome {
    match try_compile_file(file, config, cache) {
        Ok((output, cached)) => Outcome::Written { output, cached },
        Err(e) => Outcome::Failed(e),
    }
}

fn try_compile_file(
    file: &Path,
    config: &BuildConfig,
    cache: Option<&IncrementalCache>,
) -> Result<(PathBuf, bool), BuildError> {
    let source = fs::read_to_string(file).map_err(|e| BuildError::io(file, e))?;
    let options = &config.compile;

    let hit = cache.and_then(|c| c.get(options, &source));
    let cached = hit.is_some();
    let module = match hit {
        Some(module) => module,
        None => {
            let module = compile_with_options(&file.to_string_lossy(), &source, options)?;
            if let Some(cache) = cache {
                cache.set(options, &source, &module);
            }
            module
        }
    };

    let output = output_path_for(file, &config.target_extension);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(&output, module.code).map_err(|e| BuildError::io(&output, e))?;
    Ok((output, cached))
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Run a batch build from a JSON `BuildConfig`; returns the report as JSON.
#[cfg(feature = "napi")]
#[napi]
pub fn build_project_native(config: serde_json::Value) -> napi::Result<serde_json::Value> {
    let config: BuildConfig =
        serde_json::from_value(config).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let report = build_project(&config).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(report).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = "export ephemeral Home() {\n  render(<h1>Home</h1>);\n}\n";
    const ITEMS: &str = "export persistent Items(params?: { id?: number }) {\n  const itemId = params?.id ?? 0;\n  render(<div>@itemId</div>);\n}\n";

    fn project() -> (tempfile::TempDir, BuildConfig) {
        let dir = tempfile::tempdir().unwrap();
        let routes = dir.path().join("src/routes");
        fs::create_dir_all(routes.join("items")).unwrap();
        fs::write(routes.join("home.dribble"), HOME).unwrap();
        fs::write(routes.join("items/index.dribble"), ITEMS).unwrap();
        let config = BuildConfig::with_root(dir.path());
        (dir, config)
    }

    #[test]
    fn test_build_writes_sibling_modules() {
        let (dir, config) = project();
        let report = build_project(&config).unwrap();

        assert!(report.is_success());
        assert_eq!(report.compiled, 2);
        assert_eq!(report.cached, 0);

        let home = fs::read_to_string(dir.path().join("src/routes/home.ts")).unwrap();
        assert!(home.contains("export class Home extends Component<any>"));
        let items = fs::read_to_string(dir.path().join("src/routes/items/index.ts")).unwrap();
        assert!(items.contains("export class Items extends PersistentComponent<any>"));
        assert!(items.contains("renderHtml(root, `<div>${itemId}</div>`);"));
    }

    #[test]
    fn test_failure_does_not_stop_other_files() {
        let (dir, config) = project();
        fs::write(dir.path().join("src/routes/broken.dribble"), "const x = 1;").unwrap();

        let report = build_project(&config).unwrap();
        assert_eq!(report.compiled, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "src/routes/broken.dribble");
        assert!(report.failures[0].message.starts_with("Invalid component syntax in "));
        assert!(!dir.path().join("src/routes/broken.ts").exists());
    }

    #[test]
    fn test_cache_hits_on_second_build() {
        let (dir, mut config) = project();
        config.cache_dir = Some(dir.path().join(".dribble/cache"));
        config.threads = 2;

        let first = build_project(&config).unwrap();
        assert_eq!(first.cached, 0);

        let second = build_project(&config).unwrap();
        assert_eq!(second.compiled, 2);
        assert_eq!(second.cached, 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/routes/home.ts")).unwrap(),
            crate::compile::compile(
                &dir.path().join("src/routes/home.dribble").to_string_lossy(),
                HOME
            )
            .unwrap()
            .code
        );
    }

    #[test]
    fn test_missing_routes_dir_is_empty_build() {
        let dir = tempfile::tempdir().unwrap();
        let report = build_project(&BuildConfig::with_root(dir.path())).unwrap();
        assert_eq!(report, BuildReport::default());
    }
}
