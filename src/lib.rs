// Cadence - An in-process event system for Rust
//
// This library bundles the prioritized event queue and dispatcher, its
// configuration layer and the logging setup into one dependency.

// Re-export core functionality
pub use cadence_events::*;

// Re-export member crates
pub use cadence_config;
pub use cadence_events;

#[cfg(feature = "log")]
pub use cadence_log;

pub use cadence_config::{ConfigBuilder, ConfigError, EventSystemConfig};

/// Load settings from `CADENCE_*` environment variables and build a stopped
/// event system from them.
pub fn from_env() -> Result<EventSystem> {
    let config = cadence_config::from_env()?;
    EventSystem::from_config(config)
}

// Prelude for common imports
pub mod prelude {
    pub use cadence_events::prelude::*;

    pub use crate::{
        BackoffStrategy, BatchReport, ConfigBuilder, EventStats, EventSystemBuilder,
        EventSystemConfig,
    };

    // Re-export commonly used external crates
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}
