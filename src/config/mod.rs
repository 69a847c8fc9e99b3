//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

/// Tunable physics constants, injected into every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConstants {
    /// Turn rate in degrees per second
    pub ship_rotation: f64,
    /// Thrust acceleration in world units per second squared
    pub ship_acceleration: f64,
    /// Drag coefficient; negative so the drag term opposes velocity
    pub ship_drag: f64,
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            ship_rotation: 90.0,
            ship_acceleration: 50.0,
            ship_drag: -0.5,
        }
    }
}

/// Server settings loaded from environment variables
#[derive(Clone, Debug)]
pub struct Settings {
    pub constants: PhysicsConstants,
    /// Gates verbose per-collision logging
    pub debug: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Optional fixed seed for reproducible spawn placement
    pub world_seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            constants: PhysicsConstants::default(),
            debug: false,
            log_level: "info".to_string(),
            world_seed: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = PhysicsConstants::default();

        Ok(Self {
            constants: PhysicsConstants {
                ship_rotation: parse_or("SHIP_ROTATION", defaults.ship_rotation)?,
                ship_acceleration: parse_or("SHIP_ACCELERATION", defaults.ship_acceleration)?,
                ship_drag: parse_or("SHIP_DRAG", defaults.ship_drag)?,
            },
            debug: parse_or("DEBUG", false)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            world_seed: match env::var("WORLD_SEED") {
                Ok(raw) => Some(parse_value("WORLD_SEED", &raw)?),
                Err(_) => None,
            },
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(name, raw.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_accepts_well_formed_input() {
        assert_eq!(parse_value::<f64>("SHIP_DRAG", "-0.25").unwrap(), -0.25);
        assert_eq!(parse_value::<f64>("SHIP_ROTATION", " 120.0 ").unwrap(), 120.0);
        assert!(parse_value::<bool>("DEBUG", "true").unwrap());
        assert_eq!(parse_value::<u64>("WORLD_SEED", "42").unwrap(), 42);
    }

    #[test]
    fn parse_value_rejects_garbage() {
        let err = parse_value::<f64>("SHIP_DRAG", "fast").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("SHIP_DRAG", _)));
    }

    #[test]
    fn defaults_are_sensible() {
        let s = Settings::default();
        assert!(s.constants.ship_rotation > 0.0);
        assert!(s.constants.ship_acceleration > 0.0);
        // drag must oppose velocity
        assert!(s.constants.ship_drag < 0.0);
        assert!(!s.debug);
        assert!(s.world_seed.is_none());
    }
}
