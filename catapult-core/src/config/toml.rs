//! Text configuration
//!
//! Parses a hand-written `catapult.toml`. Every key is optional; missing
//! keys keep their defaults.
//!
//! ```toml
//! model = "black"
//! retract_duration_s = 50
//!
//! [ports]
//! arm = "A"
//! lock = "D"
//!
//! [timings]
//! lock_ms = 640
//! ```

use super::types::{CatapultConfig, ConfigError};

/// Parse TOML text into a validated configuration
pub fn parse_config(input: &str) -> Result<CatapultConfig, ConfigError> {
    let config: CatapultConfig = ::toml::from_str(input).map_err(|_e| {
        warn!("Invalid catapult configuration text");
        ConfigError::Parse
    })?;

    config.validate()?;
    debug!(
        "Loaded configuration: model {}, retract {} s",
        config.model,
        config.retract_duration_s()
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatapultModel, LockTimings, OutputPort};

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config(""), Ok(CatapultConfig::default()));
    }

    #[test]
    fn test_full_config() {
        let input = r#"
            model = "black"
            retract_duration_s = 50
            retract_speed = 90
            stall_timeout_ms = 8000

            [ports]
            arm = "B"
            lock = "C"

            [timings]
            lock_ms = 640
            unlock_stall_repeats = 4
        "#;

        let config = parse_config(input).unwrap();
        assert_eq!(config.model, CatapultModel::Black);
        assert_eq!(config.retract_duration_s(), 50);
        assert_eq!(config.retract_speed, 90);
        assert_eq!(config.stall_timeout_ms, 8000);
        assert_eq!(config.ports.arm, OutputPort::B);
        assert_eq!(config.ports.lock, OutputPort::C);
        assert_eq!(config.timings.lock_ms, 640);
        assert_eq!(config.timings.unlock_stall_repeats, 4);
        // Untouched keys keep their defaults
        assert_eq!(config.timings.unlock_ms, LockTimings::default().unlock_ms);
    }

    #[test]
    fn test_syntax_error() {
        assert_eq!(parse_config("model = "), Err(ConfigError::Parse));
        assert_eq!(parse_config("model = \"green\""), Err(ConfigError::Parse));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let input = r#"
            [ports]
            arm = "A"
            lock = "A"
        "#;
        assert_eq!(parse_config(input), Err(ConfigError::SharedPort));
    }
}
