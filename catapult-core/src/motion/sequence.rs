//! Lock actuator motion sequences
//!
//! The lock actuator's splint engages the drive gear. Without a position
//! sensor, every sequence is a fixed list of steps that use the retracted
//! hard stop as the only reference point:
//!
//! | Operation | Steps |
//! |-----------|-------|
//! | calibrate | stall-seek (-), timed (+, clear), stall-seek (-), timed (+, park) |
//! | lock      | timed (+, lock) |
//! | unlock    | timed (-, unlock) |
//! | release   | stall-seek (-) repeated |
//!
//! Timed steps always block until the run is over.

use heapless::Vec;

use crate::config::LockTimings;
use crate::motion::CancelToken;
use crate::traits::{Actuator, ActuatorError, Speed};

/// Maximum steps in a single sequence
pub const MAX_SEQUENCE_STEPS: usize = 8;

/// Number of steps in the calibration sequence
pub const RESET_STEPS: usize = 4;

/// A bounded list of motion steps
pub type Sequence = Vec<MotionStep, MAX_SEQUENCE_STEPS>;

/// A single actuator motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionStep {
    /// Run until the actuator stalls against a hard stop
    StallSeek { speed: Speed },
    /// Run for a fixed time, blocking until done
    Timed { speed: Speed, duration_ms: u32 },
}

/// Calibration sequence
///
/// Seats the actuator on its retracted hard stop, extends far enough to
/// clear the drive gear, seats it again, then extends to the point where
/// the splint starts to follow the gear.
pub fn reset_sequence(full_speed: u8, timings: &LockTimings) -> [MotionStep; RESET_STEPS] {
    [
        MotionStep::StallSeek {
            speed: Speed::reverse(full_speed),
        },
        MotionStep::Timed {
            speed: Speed::forward(full_speed),
            duration_ms: timings.clear_ms,
        },
        MotionStep::StallSeek {
            speed: Speed::reverse(full_speed),
        },
        MotionStep::Timed {
            speed: Speed::forward(full_speed),
            duration_ms: timings.park_ms,
        },
    ]
}

/// Engage the lock from the calibrated park position
pub fn lock_step(full_speed: u8, timings: &LockTimings) -> MotionStep {
    MotionStep::Timed {
        speed: Speed::forward(full_speed),
        duration_ms: timings.lock_ms,
    }
}

/// Disengage the lock by the inverse of [`lock_step`]
///
/// The actuator retracts faster than it extends, so the run is shorter.
pub fn unlock_step(full_speed: u8, timings: &LockTimings) -> MotionStep {
    MotionStep::Timed {
        speed: Speed::reverse(full_speed),
        duration_ms: timings.unlock_ms,
    }
}

/// Forced release from an unknown position
///
/// Stall-seeks the retracted hard stop several times. Early stalls can be
/// spurious (the splint catching on a gear tooth); only the last one marks
/// the fully seated position.
pub fn release_sequence(full_speed: u8, timings: &LockTimings) -> Sequence {
    let step = MotionStep::StallSeek {
        speed: Speed::reverse(full_speed),
    };
    let repeats = (timings.unlock_stall_repeats as usize).min(MAX_SEQUENCE_STEPS);
    core::iter::repeat(step).take(repeats).collect()
}

/// Run a single step on an actuator
pub fn execute_step<A: Actuator + ?Sized>(
    actuator: &mut A,
    step: MotionStep,
    stall_timeout_ms: u32,
    cancel: &CancelToken,
) -> Result<(), ActuatorError> {
    trace!("Executing {:?}", step);

    match step {
        MotionStep::StallSeek { speed } => {
            actuator.run_until_stalled(speed, stall_timeout_ms, cancel)
        }
        MotionStep::Timed { speed, duration_ms } => actuator.run_time(speed, duration_ms, true),
    }
}
