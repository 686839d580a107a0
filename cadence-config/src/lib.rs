//! Configuration for the Cadence event system.
//!
//! Settings come from defaults, JSON/TOML/`.env` files and `CADENCE_*`
//! environment variables, layered by [`ConfigBuilder`] and validated before use.
//!
//! ```rust,no_run
//! use cadence_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_file("cadence.toml")
//!     .load_env()
//!     .build()?;
//! assert!(config.batch_size >= 1);
//! # Ok::<(), cadence_config::ConfigError>(())
//! ```

pub mod builder;
pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use builder::ConfigBuilder;
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::EventSystemConfig;
pub use validation::{ConfigValidator, Validate};

/// Load settings from the process environment (`CADENCE_*`) over the defaults.
pub fn from_env() -> Result<EventSystemConfig> {
    ConfigBuilder::new().load_env().build()
}
