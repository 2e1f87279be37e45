//! Configuration service.
//!
//! Loads the engine configuration from the platform config directory
//! (e.g. `~/.config/vellum/config.toml`) and caches the parsed result.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};

use vellum_core::config::EngineConfig;

const CONFIG_DIR: &str = "vellum";
const CONFIG_FILE: &str = "config.toml";

/// Loads and caches the engine configuration.
///
/// A missing config file means defaults; a malformed one is reported once
/// and also falls back to defaults, so the application always starts.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration. RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<EngineConfig>>>,
}

impl ConfigService {
    /// Creates a service reading from the platform config location.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be
    /// determined.
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir().context("Cannot find the platform config directory")?;
        Ok(Self::with_path(base.join(CONFIG_DIR).join(CONFIG_FILE)))
    }

    /// Creates a service reading from an explicit file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the engine configuration, loading from file if not cached.
    pub fn get_config(&self) -> EngineConfig {
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_else(|err| {
            tracing::warn!(
                "[ConfigService] falling back to defaults: {} ({})",
                err,
                self.path.display()
            );
            EngineConfig::default()
        });

        let mut write_lock = self.config.write().unwrap();
        *write_lock = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    fn load_config(&self) -> Result<EngineConfig> {
        if !self.path.exists() {
            return Ok(EngineConfig::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let config: EngineConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(config.sanitized())
    }
}
