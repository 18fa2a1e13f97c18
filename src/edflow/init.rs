//! # Data Directory
//!
//! Everything edflow persists lives in one directory:
//! `config.json`, `terms.json` and `values.json` (see [`crate::store`]).
//!
//! ## Resolution Order
//!
//! [`resolve_data_dir`] picks the first of:
//! 1. An explicit override (`--dir` on the command line).
//! 2. The `EDFLOW_HOME` environment variable. Tests use it to isolate state.
//! 3. The OS-appropriate data directory, via the `directories` crate.
//!
//! [`initialize`] then loads the config from that directory and wires the
//! file-backed stores into a [`WorkflowApi`].

use crate::api::WorkflowApi;
use crate::config::EdflowConfig;
use crate::error::{EdflowError, Result};
use crate::registry::OrderedRegistry;
use crate::store::fs::{FileTermStore, FileValueStore};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATA_DIR_ENV: &str = "EDFLOW_HOME";

pub type FileApi = WorkflowApi<FileTermStore, FileValueStore>;

pub struct EdflowContext {
    pub api: FileApi,
    pub data_dir: PathBuf,
    pub config: EdflowConfig,
}

pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "edflow", "edflow")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| EdflowError::Store("Could not determine a data directory".to_string()))
}

pub fn initialize(data_override: Option<PathBuf>) -> Result<EdflowContext> {
    let data_dir = resolve_data_dir(data_override)?;
    debug!(target: "edflow::init", data_dir = %data_dir.display(), "Using data directory");
    open(&data_dir)
}

/// Builds the context for a known data directory.
pub fn open(data_dir: &Path) -> Result<EdflowContext> {
    let config = EdflowConfig::load(data_dir)?;
    let registry = OrderedRegistry::new(
        FileTermStore::new(data_dir),
        FileValueStore::new(data_dir),
        config.clone(),
    );
    Ok(EdflowContext {
        api: WorkflowApi::new(registry),
        data_dir: data_dir.to_path_buf(),
        config,
    })
}

/// Writes `config.json` if the directory has none yet. Returns whether a
/// file was written.
pub fn ensure_config(ctx: &EdflowContext) -> Result<bool> {
    if ctx.data_dir.join("config.json").exists() {
        return Ok(false);
    }
    ctx.config.save(&ctx.data_dir)?;
    Ok(true)
}
