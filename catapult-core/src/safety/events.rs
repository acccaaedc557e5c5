//! Events that trigger safety state transitions

use super::machine::FaultKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Calibration sequence finished on the lock actuator
    CalibrationComplete,
    /// Lock was force-released by stall-seeking
    LockReleased,
    /// Arm retraction started
    RetractStarted,
    /// A motion failed, timed out or was cancelled
    FaultDetected(FaultKind),
}
