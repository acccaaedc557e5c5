//! Safety state tracking
//!
//! The controller only permits the timed lock/unlock sequences while it
//! knows the lock actuator's physical position. That knowledge comes from
//! a completed calibration and is lost as soon as the lock or the arm is
//! moved by anything else.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{FaultKind, SafetyState};
