//! Actuator drivers
//!
//! - [`pwm`]: PWM H-bridge with direction pin and stall DIAG input
//! - [`sim`]: time-simulated linear actuator with hard stops

pub mod pwm;
pub mod sim;

pub use pwm::{PwmActuator, PwmActuatorConfig};
pub use sim::{SimClock, SimDelay, SimulatedActuator};
