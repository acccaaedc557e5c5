//! Motion primitives
//!
//! Building blocks shared by the controller operations:
//!
//! - Validated retraction percentages and open-loop run timing
//! - The fixed lock actuator sequences (calibration, lock, unlock, release)
//! - Cancellation of blocking motions

pub mod cancel;
pub mod retract;
pub mod sequence;

pub use cancel::CancelToken;
pub use retract::{retract_duration_ms, Percent};
pub use sequence::{
    execute_step, lock_step, release_sequence, reset_sequence, unlock_step, MotionStep, Sequence,
    MAX_SEQUENCE_STEPS, RESET_STEPS,
};
