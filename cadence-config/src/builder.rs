// ConfigBuilder - layered settings assembly

use crate::env::{DEFAULT_PREFIX, EnvLoader, coerce};
use crate::loader::{ConfigLoader, FileFormat};
use crate::settings::EventSystemConfig;
use crate::validation::Validate;
use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

/// Builds an [`EventSystemConfig`] from layered sources.
///
/// Later layers win: defaults, then files in the order added, then the
/// `.env` file, then process environment variables, then explicit overrides.
pub struct ConfigBuilder {
    prefix: String,
    load_env: bool,
    load_dotenv: bool,
    dotenv_path: Option<PathBuf>,
    config_files: Vec<(PathBuf, Option<FileFormat>)>,
    section: Option<String>,
    overrides: Map<String, Value>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            load_env: false,
            load_dotenv: false,
            dotenv_path: None,
            config_files: Vec::new(),
            section: None,
            overrides: Map::new(),
        }
    }

    /// Set environment variable prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable loading from environment variables
    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Enable loading from a .env file (the working directory's when `None`)
    pub fn load_dotenv(mut self, path: Option<PathBuf>) -> Self {
        self.load_dotenv = true;
        self.dotenv_path = path;
        self
    }

    /// Add a configuration file, detecting its format from the extension
    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_files.push((path.into(), None));
        self
    }

    /// Add a configuration file with an explicit format
    pub fn add_file_with_format(mut self, path: impl Into<PathBuf>, format: FileFormat) -> Self {
        self.config_files.push((path.into(), Some(format)));
        self
    }

    /// Read file settings from a named table (e.g. `[events]`)
    pub fn section(mut self, name: impl Into<String>) -> Self {
        self.section = Some(name.into());
        self
    }

    /// Override a single setting
    pub fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        self.overrides.insert(key.to_string(), value);
        Ok(self)
    }

    /// Assemble and validate the settings
    pub fn build(self) -> Result<EventSystemConfig> {
        let mut merged = match serde_json::to_value(EventSystemConfig::default()) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(ConfigError::SerializationError(e.to_string())),
        };

        for (path, format) in &self.config_files {
            let format = match format {
                Some(format) => *format,
                None => FileFormat::detect(path)?,
            };
            let mut loader = ConfigLoader::new(format);
            if let Some(section) = &self.section {
                loader = loader.section(section.clone());
            }
            let layer = loader.load_file(path)?;
            debug!(path = %path.display(), keys = layer.len(), "Loaded config file");
            merged.extend(layer);
        }

        if self.load_dotenv {
            match &self.dotenv_path {
                Some(path) => {
                    dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
                }
                None => {
                    dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
                }
            }
        }

        if self.load_env || self.load_dotenv {
            let vars = EnvLoader::new(Some(self.prefix.clone())).load()?;
            debug!(prefix = %self.prefix, keys = vars.len(), "Loaded environment settings");
            merged.extend(vars.into_iter().map(|(k, v)| (k, coerce(&v))));
        }

        merged.extend(self.overrides);

        let config: EventSystemConfig = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
