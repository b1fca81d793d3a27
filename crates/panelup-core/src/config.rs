use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::options::FailurePolicy;

pub const CONFIG_FILE_NAME: &str = "panelup.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeConfig {
    pub root: Option<PathBuf>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub url: Option<String>,
    pub php: Option<String>,
    pub composer: Option<String>,
    pub on_failure: Option<FailurePolicy>,
}

impl UpgradeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("failed to parse panelup config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Loads `panelup.toml` from the installation root when it exists.
    pub fn load_default(root: &Path) -> Result<Option<Self>> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }
}
