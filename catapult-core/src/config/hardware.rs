//! Hardware configuration types
//!
//! Which motor output each actuator is wired to. The controller itself
//! receives already-constructed actuators; board code uses these to build
//! them.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motor output port on the brick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputPort {
    #[default]
    A,
    B,
    C,
    D,
}

impl OutputPort {
    /// Zero-based port index
    pub const fn index(self) -> u8 {
        match self {
            OutputPort::A => 0,
            OutputPort::B => 1,
            OutputPort::C => 2,
            OutputPort::D => 3,
        }
    }

    /// Port from its letter (case-insensitive)
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(OutputPort::A),
            'B' => Some(OutputPort::B),
            'C' => Some(OutputPort::C),
            'D' => Some(OutputPort::D),
            _ => None,
        }
    }
}

impl fmt::Display for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            OutputPort::A => "A",
            OutputPort::B => "B",
            OutputPort::C => "C",
            OutputPort::D => "D",
        };
        f.write_str(letter)
    }
}

/// Port assignment for both actuators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActuatorPorts {
    /// Motor drawing the arm back
    pub arm: OutputPort,
    /// Linear actuator locking the drive gear
    pub lock: OutputPort,
}

impl Default for ActuatorPorts {
    fn default() -> Self {
        Self::new(OutputPort::A, OutputPort::D)
    }
}

impl ActuatorPorts {
    pub const fn new(arm: OutputPort, lock: OutputPort) -> Self {
        Self { arm, lock }
    }

    /// Each actuator needs its own output
    pub fn is_valid(&self) -> bool {
        self.arm != self.lock
    }
}
