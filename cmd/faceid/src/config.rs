//! YAML configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Directory under the home directory holding config and data.
const APP_DIR: &str = ".faceid";

/// Extractor command line. The image path is appended to `args`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["recognizer.py".to_string()],
        }
    }
}

/// Configuration file format. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub listen: String,
    /// Durable store file. Empty keeps identities in memory only.
    pub store_path: String,
    pub dimension: usize,
    pub threshold: f64,
    pub extraction_timeout_secs: u64,
    pub extractor: ExtractorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ":3000".to_string(),
            store_path: format!("~/{APP_DIR}/identities.redb"),
            dimension: 128,
            threshold: faceid_identity::DEFAULT_THRESHOLD,
            extraction_timeout_secs: 10,
            extractor: ExtractorConfig::default(),
            cors_origin: None,
        }
    }
}

impl Config {
    /// Loads the config at `path`, or the default location.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            bail!("dimension must be positive");
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            bail!("threshold must be a positive number, got {}", self.threshold);
        }
        if self.extraction_timeout_secs == 0 {
            bail!("extraction_timeout_secs must be positive");
        }
        if self.extractor.program.trim().is_empty() {
            bail!("extractor.program is empty");
        }
        Ok(())
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Resolved store file, or `None` for an in-memory store.
    pub fn store_file(&self) -> Option<PathBuf> {
        let path = self.store_path.trim();
        if path.is_empty() {
            return None;
        }
        Some(expand_home(path))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR).join("config.yaml"))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
