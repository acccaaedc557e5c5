//! Hardware abstraction traits
//!
//! These traits define the interface between the controller logic
//! and board-specific actuator drivers.

pub mod actuator;
pub mod clock;

pub use actuator::{Actuator, ActuatorError, ActuatorId, Direction, Speed, MAX_SPEED};
pub use clock::Clock;
