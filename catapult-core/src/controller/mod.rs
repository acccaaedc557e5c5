//! Catapult controller
//!
//! Coordinates the arm motor and the lock actuator through the four
//! operations: calibrate (`reset`), lock, unlock and retract.

pub mod catapult;

pub use catapult::{Catapult, ControllerError, Outcome};
