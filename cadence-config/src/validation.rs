// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is at least `min`
    pub fn at_least<T: PartialOrd + std::fmt::Display>(value: T, min: T, field: &str) -> Result<()> {
        if value < min {
            return Err(ConfigError::ValidationError(format!(
                "{} must be at least {}, got {}",
                field, min, value
            )));
        }
        Ok(())
    }

    /// Validate that a number is within range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {}, got {}",
                field, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that `lower` does not exceed `upper`
    pub fn not_above<T: PartialOrd + std::fmt::Display>(
        lower: T,
        upper: T,
        lower_field: &str,
        upper_field: &str,
    ) -> Result<()> {
        if lower > upper {
            return Err(ConfigError::ValidationError(format!(
                "{} ({}) must not exceed {} ({})",
                lower_field, lower, upper_field, upper
            )));
        }
        Ok(())
    }
}
