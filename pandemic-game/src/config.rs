//! Session configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_INFECTION_RATE, DEFAULT_SHOCK_MARKERS};

/// Errors raised when session configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a game needs at least one shock marker")]
    NoShockMarkers,
    #[error("{markers} shock markers cannot be spread over {locations} location cards")]
    TooManyShockMarkers { markers: u8, locations: usize },
    #[error("infection rate must be at least 1 (got {0})")]
    ZeroInfectionRate(u8),
}

/// Settings fixed when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_shock_markers")]
    pub shock_markers: u8,
    #[serde(default = "SessionConfig::default_infection_rate")]
    pub infection_rate: u8,
}

impl SessionConfig {
    const fn default_shock_markers() -> u8 {
        DEFAULT_SHOCK_MARKERS
    }

    const fn default_infection_rate() -> u8 {
        DEFAULT_INFECTION_RATE
    }

    #[must_use]
    pub const fn with_shock_markers(mut self, shock_markers: u8) -> Self {
        self.shock_markers = shock_markers;
        self
    }

    #[must_use]
    pub const fn with_infection_rate(mut self, infection_rate: u8) -> Self {
        self.infection_rate = infection_rate;
        self
    }

    /// # Errors
    ///
    /// Returns the first violated constraint for a catalog of
    /// `location_count` locations.
    pub fn validate(&self, location_count: usize) -> Result<(), ConfigError> {
        if self.shock_markers == 0 {
            return Err(ConfigError::NoShockMarkers);
        }
        if usize::from(self.shock_markers) > location_count {
            return Err(ConfigError::TooManyShockMarkers {
                markers: self.shock_markers,
                locations: location_count,
            });
        }
        if self.infection_rate == 0 {
            return Err(ConfigError::ZeroInfectionRate(self.infection_rate));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shock_markers: Self::default_shock_markers(),
            infection_rate: Self::default_infection_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: SessionConfig = serde_json::from_str(r#"{"infection_rate": 3}"#).unwrap();
        assert_eq!(cfg.shock_markers, DEFAULT_SHOCK_MARKERS);
        assert_eq!(cfg.infection_rate, 3);
        assert_eq!(SessionConfig::default().validate(48), Ok(()));
    }

    #[test]
    fn validate_rejects_degenerate_settings() {
        let cfg = SessionConfig::default();
        assert_eq!(
            cfg.with_shock_markers(0).validate(48),
            Err(ConfigError::NoShockMarkers)
        );
        assert_eq!(
            cfg.with_shock_markers(9).validate(4),
            Err(ConfigError::TooManyShockMarkers {
                markers: 9,
                locations: 4
            })
        );
        assert_eq!(
            cfg.with_infection_rate(0).validate(48),
            Err(ConfigError::ZeroInfectionRate(0))
        );
    }
}
