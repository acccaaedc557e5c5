//! Safety state machine
//!
//! The state answers a single question: is the mechanism in a known,
//! calibrated, locked position?

use super::events::Event;
use crate::traits::ActuatorError;

/// Controller safety states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyState {
    /// Never calibrated since power-on
    #[default]
    Uncalibrated,
    /// Calibrated and locked; timed lock/unlock sequences are allowed
    Safe,
    /// Calibrated, but the lock or arm has moved since
    Released,
    /// A motion failed; position unknown until the next calibration
    Fault(FaultKind),
}

/// Why a motion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Stall-seek ran out of time (jammed or disconnected actuator)
    StallTimeout,
    /// Motion aborted through the cancel token
    Cancelled,
    /// Driver reported a hardware failure
    DriverFault,
    /// Arm kept moving past the retraction deadline
    RetractTimeout,
}

impl From<ActuatorError> for FaultKind {
    fn from(error: ActuatorError) -> Self {
        match error {
            ActuatorError::Timeout => FaultKind::StallTimeout,
            ActuatorError::Cancelled => FaultKind::Cancelled,
            ActuatorError::Hardware | ActuatorError::Disconnected => FaultKind::DriverFault,
        }
    }
}

impl SafetyState {
    /// Check if timed lock/unlock sequences are allowed
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyState::Safe)
    }

    /// Check if a calibration has completed and no fault occurred since
    pub fn is_calibrated(&self) -> bool {
        matches!(self, SafetyState::Safe | SafetyState::Released)
    }

    /// Check if this is a fault state
    pub fn is_fault(&self) -> bool {
        matches!(self, SafetyState::Fault(_))
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use SafetyState::*;

        match (self, event) {
            // Calibration always re-establishes a known position
            (_, CalibrationComplete) => Safe,

            // Faults from any state
            (_, FaultDetected(kind)) => Fault(kind),

            // Moving the lock or arm invalidates the locked position
            (Safe | Released, LockReleased) => Released,
            (Safe | Released, RetractStarted) => Released,

            // Uncalibrated and Fault only leave through calibration
            _ => self,
        }
    }
}
