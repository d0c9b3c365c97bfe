use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use super::AnalyticsConfiguration;

/// JSON-file backed configuration shared by the hosts of one dashboard.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<AnalyticsConfiguration>,
}

impl ConfigStore {
    /// Missing files yield defaults. Files that fail to parse also fall back
    /// to defaults, with a warning, so a bad edit never blocks analysis.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read analytics config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring malformed analytics config at {}: {err}",
                    path.display()
                );
                AnalyticsConfiguration::default()
            })
        } else {
            AnalyticsConfiguration::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn current(&self) -> Result<AnalyticsConfiguration> {
        let guard = self
            .data
            .read()
            .map_err(|_| anyhow!("analytics config lock poisoned"))?;
        Ok(guard.clone())
    }

    pub fn update(&self, config: AnalyticsConfiguration) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("analytics config lock poisoned"))?;
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read analytics config from {}", self.path.display()))?;
        let data: AnalyticsConfiguration =
            serde_json::from_str(&contents).context("Failed to parse analytics config")?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("analytics config lock poisoned"))?;
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &AnalyticsConfiguration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write analytics config to {}", self.path.display()))
    }
}
