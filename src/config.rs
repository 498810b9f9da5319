//! Compiler and build configuration.
//!
//! Both structs deserialize from camelCase JSON with every field optional, so a
//! `dribble.config.json` only needs to name what it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

pub const DEFAULT_RUNTIME_MODULE: &str = "@dribble/runtime-client";
pub const DEFAULT_RENDER_HELPER: &str = "renderHtml";
pub const SOURCE_EXTENSION: &str = "dribble";
pub const TARGET_EXTENSION: &str = "ts";

/// Options for a single compile call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Module specifier the runtime base classes are imported from.
    pub runtime_module: String,
    /// Name of the markup-rendering helper exported by the runtime.
    pub render_helper: String,
    /// Passed through unchanged to `GeneratedModule::source_map`.
    pub source_map: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            render_helper: DEFAULT_RENDER_HELPER.to_string(),
            source_map: None,
        }
    }
}

impl CompileOptions {
    /// Stable string identifying every option that affects generated code.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}\u{0}{}\u{0}{}",
            self.runtime_module,
            self.render_helper,
            self.source_map.as_deref().unwrap_or("")
        )
    }
}

/// Options for a batch build over a project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Project root; logged paths are relative to it.
    pub root: PathBuf,
    /// Directory under `root` that is searched recursively for components.
    pub routes_dir: PathBuf,
    pub source_extension: String,
    pub target_extension: String,
    /// Directory for the incremental cache; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// Worker threads for parallel compilation; `0` lets rayon decide.
    pub threads: usize,
    pub compile: CompileOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            routes_dir: PathBuf::from("src/routes"),
            source_extension: SOURCE_EXTENSION.to_string(),
            target_extension: TARGET_EXTENSION.to_string(),
            cache_dir: None,
            threads: 0,
            compile: CompileOptions::default(),
        }
    }
}

impl BuildConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load a config file. Relative `root` and `cacheDir` resolve against the
    /// file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self, BuildError> {
        let data = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let mut config: BuildConfig =
            serde_json::from_str(&data).map_err(|e| BuildError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if config.root.is_relative() {
            config.root = base.join(&config.root);
        }
        if let Some(cache_dir) = config.cache_dir.as_mut() {
            if cache_dir.is_relative() {
                *cache_dir = base.join(&*cache_dir);
            }
        }
        Ok(config)
    }

    pub fn routes_path(&self) -> PathBuf {
        self.root.join(&self.routes_dir)
    }
}
