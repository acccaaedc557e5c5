//! Configuration type definitions
//!
//! These types describe one catapult build: its retraction calibration,
//! the lock actuator timings, speeds, and the safety bounds applied to
//! blocking motions.

use core::fmt;

use super::hardware::ActuatorPorts;
use crate::motion::MAX_SEQUENCE_STEPS;
use crate::traits::MAX_SPEED;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Known catapult builds
///
/// The builds differ in gearing, which changes how long the arm motor
/// needs to draw the arm across its full span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CatapultModel {
    /// White build: 47 s full retraction
    #[default]
    White,
    /// Black build: 52 s full retraction
    Black,
}

impl CatapultModel {
    /// Full-span retraction time with fully charged batteries
    pub const fn retract_duration_s(self) -> u16 {
        match self {
            CatapultModel::White => 47,
            CatapultModel::Black => 52,
        }
    }
}

/// Lock actuator timings
///
/// Tuned to the actuator and drive gear; all durations are at full speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LockTimings {
    /// Extension that clears the splint through the drive gear (ms)
    pub clear_ms: u32,
    /// Extension from the hard stop to the gear's engagement point (ms)
    pub park_ms: u32,
    /// Extension that engages the lock (ms)
    pub lock_ms: u32,
    /// Retraction that disengages the lock (ms)
    ///
    /// Shorter than `lock_ms`: retracting is about 20% faster.
    pub unlock_ms: u32,
    /// Stall-seeks performed by a forced release
    pub unlock_stall_repeats: u8,
}

impl Default for LockTimings {
    fn default() -> Self {
        Self {
            clear_ms: 1500,
            park_ms: 900,
            lock_ms: 650,
            unlock_ms: 570,
            unlock_stall_repeats: 3,
        }
    }
}

/// Complete catapult configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CatapultConfig {
    /// Which build this is
    pub model: CatapultModel,
    /// Output ports of the two actuators
    pub ports: ActuatorPorts,
    /// Full-span retraction time override (s); the model default otherwise
    pub retract_duration_s: Option<u16>,
    /// Arm motor speed while retracting (percent)
    pub retract_speed: u8,
    /// Lock actuator speed for all sequences (percent)
    pub full_speed: u8,
    /// Lock actuator timings
    pub timings: LockTimings,
    /// Longest a stall-seek may run before giving up (ms)
    pub stall_timeout_ms: u32,
    /// Extra time past the nominal run before a retraction is abandoned (ms)
    pub retract_grace_ms: u32,
}

impl Default for CatapultConfig {
    fn default() -> Self {
        Self {
            model: CatapultModel::White,
            ports: ActuatorPorts::default(),
            retract_duration_s: None,
            retract_speed: MAX_SPEED as u8,
            full_speed: MAX_SPEED as u8,
            timings: LockTimings::default(),
            stall_timeout_ms: 5000,
            retract_grace_ms: 2000,
        }
    }
}

impl CatapultConfig {
    /// Default configuration for a given build
    pub fn for_model(model: CatapultModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Override the full-span retraction time
    pub fn with_retract_duration(mut self, seconds: u16) -> Self {
        self.retract_duration_s = Some(seconds);
        self
    }

    /// Set the actuator ports
    pub fn with_ports(mut self, ports: ActuatorPorts) -> Self {
        self.ports = ports;
        self
    }

    /// Effective full-span retraction time (s)
    pub fn retract_duration_s(&self) -> u16 {
        self.retract_duration_s
            .unwrap_or(self.model.retract_duration_s())
    }

    /// Check the configuration for values the controller cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ports.is_valid() {
            return Err(ConfigError::SharedPort);
        }

        if self.retract_duration_s() == 0 {
            return Err(ConfigError::ZeroRetractDuration);
        }

        let speed_range = 1..=MAX_SPEED as u8;
        if !speed_range.contains(&self.retract_speed) || !speed_range.contains(&self.full_speed) {
            return Err(ConfigError::InvalidSpeed);
        }

        let repeats = self.timings.unlock_stall_repeats as usize;
        if repeats == 0 || repeats > MAX_SEQUENCE_STEPS {
            return Err(ConfigError::InvalidRepeatCount);
        }

        if self.stall_timeout_ms == 0 {
            return Err(ConfigError::ZeroStallTimeout);
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Arm and lock actuators assigned to the same port
    SharedPort,
    /// Full-span retraction time is zero
    ZeroRetractDuration,
    /// A speed is zero or above 100%
    InvalidSpeed,
    /// Release repeat count is zero or exceeds the sequence capacity
    InvalidRepeatCount,
    /// Stall timeout is zero
    ZeroStallTimeout,
    /// Stored data has the wrong magic number or version
    InvalidHeader,
    /// Stored data failed its checksum
    ChecksumMismatch,
    /// Encoding failed (buffer too small)
    Serialize,
    /// Decoding failed
    Deserialize,
    /// Text configuration could not be parsed
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::SharedPort => "arm and lock actuators share a port",
            ConfigError::ZeroRetractDuration => "retraction duration must be non-zero",
            ConfigError::InvalidSpeed => "speeds must be between 1 and 100 percent",
            ConfigError::InvalidRepeatCount => "invalid release repeat count",
            ConfigError::ZeroStallTimeout => "stall timeout must be non-zero",
            ConfigError::InvalidHeader => "stored configuration has an invalid header",
            ConfigError::ChecksumMismatch => "stored configuration checksum mismatch",
            ConfigError::Serialize => "failed to encode configuration",
            ConfigError::Deserialize => "failed to decode configuration",
            ConfigError::Parse => "failed to parse configuration text",
        };
        f.write_str(msg)
    }
}
