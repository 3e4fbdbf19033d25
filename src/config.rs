//! Configuration file loading.

use crate::error::Result;
use crate::source::DirectoryProvider;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_ANCHOR_FORMAT: &str = "#L%d";
const DEFAULT_CONCURRENCY: usize = 8;

/// Settings for the directory provider and the crawler.
///
/// ```toml
/// root = "/home/me/go/src"
/// anchor_format = "#L%d"
/// browse_base = "https://src.example.com"
/// concurrency = 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source tree served by the directory provider.
    pub root: PathBuf,
    /// Line anchor appended to browse URLs; `%d` is replaced by the line number.
    pub anchor_format: String,
    /// Prefix of file browse links. Defaults to `file://<root>`.
    pub browse_base: Option<String>,
    /// Packages refreshed in parallel during a crawl.
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            anchor_format: DEFAULT_ANCHOR_FORMAT.to_string(),
            browse_base: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/gopkgdoc/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gopkgdoc").join("config.toml"))
    }

    /// Load `path`, or the default config file when `path` is `None`.
    ///
    /// An explicit path must exist; a missing default file yields the defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::read(path).await;
        }
        match Self::default_path() {
            Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => {
                Self::read(&path).await
            }
            _ => Ok(Self::default()),
        }
    }

    async fn read(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        Ok(config)
    }

    /// Crawl parallelism, never below one.
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// A directory provider over [`Config::root`].
    pub fn provider(&self) -> DirectoryProvider {
        let provider = DirectoryProvider::new(&self.root);
        match &self.browse_base {
            Some(base) => provider.with_browse_base(base.clone()),
            None => provider,
        }
    }
}
