use crate::error::{EdflowError, Result};
use crate::model::Kind;
use crate::validation::KindPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_STATUS_MAX_NAME_LEN: usize = 20;
const DEFAULT_STORAGE_KEY_PREFIX: &str = "edflow_editorial_meta";

/// Configuration for edflow, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdflowConfig {
    /// Longest allowed status name, in characters
    #[serde(default = "default_status_max_name_len")]
    pub status_max_name_len: usize,

    /// Longest allowed metadata field name; no limit when unset
    #[serde(default)]
    pub field_max_name_len: Option<usize>,

    /// Names (and slugs) a custom status may not take, compared case-insensitively
    #[serde(default = "default_restricted_statuses")]
    pub restricted_statuses: Vec<String>,

    /// Names (and slugs) a metadata field may not take
    #[serde(default)]
    pub restricted_fields: Vec<String>,

    /// Prefix of the key metadata values are stored under
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,
}

fn default_status_max_name_len() -> usize {
    DEFAULT_STATUS_MAX_NAME_LEN
}

fn default_restricted_statuses() -> Vec<String> {
    [
        "publish",
        "private",
        "future",
        "new",
        "inherit",
        "auto-draft",
        "trash",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_storage_key_prefix() -> String {
    DEFAULT_STORAGE_KEY_PREFIX.to_string()
}

impl Default for EdflowConfig {
    fn default() -> Self {
        Self {
            status_max_name_len: DEFAULT_STATUS_MAX_NAME_LEN,
            field_max_name_len: None,
            restricted_statuses: default_restricted_statuses(),
            restricted_fields: Vec::new(),
            storage_key_prefix: default_storage_key_prefix(),
        }
    }
}

impl EdflowConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(EdflowError::Io)?;
        let config: EdflowConfig =
            serde_json::from_str(&content).map_err(EdflowError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(EdflowError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(EdflowError::Serialization)?;
        fs::write(config_path, content).map_err(EdflowError::Io)?;
        Ok(())
    }

    pub fn policy(&self, kind: Kind) -> KindPolicy {
        match kind {
            Kind::Status => KindPolicy {
                restricted_names: self.restricted_statuses.clone(),
                max_name_len: Some(self.status_max_name_len),
            },
            Kind::MetadataField => KindPolicy {
                restricted_names: self.restricted_fields.clone(),
                max_name_len: self.field_max_name_len,
            },
        }
    }
}
