// Environment variable loading

use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::env;

/// Default prefix for event system variables (`CADENCE_BATCH_SIZE`, ...).
pub const DEFAULT_PREFIX: &str = "CADENCE";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables.
    ///
    /// Keys are lowercased with the prefix stripped, so `CADENCE_BATCH_SIZE`
    /// becomes `batch_size`.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self.collect(env::vars()))
    }

    /// Same as [`load`](Self::load), over an explicit set of variables.
    pub fn collect<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            if let Some(ref prefix) = self.prefix {
                if let Some(rest) = key.strip_prefix(prefix.as_str()) {
                    if let Some(trimmed_key) = rest.strip_prefix('_') {
                        config.insert(trimmed_key.to_lowercase(), value);
                    }
                }
            } else {
                config.insert(key.to_lowercase(), value);
            }
        }

        config
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }
}

/// Convert a raw string setting into the JSON value it most likely denotes.
pub fn coerce(raw: &str) -> Value {
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Value::from(n);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }

    Value::String(trimmed.to_string())
}
