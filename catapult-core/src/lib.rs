//! Board-agnostic controller logic for a two-actuator catapult
//!
//! This crate contains everything that does not depend on a specific
//! board or motor driver:
//!
//! - Actuator and clock traits (the driver boundary)
//! - Configuration types, binary persistence and text parsing
//! - Safety state machine
//! - Motion primitives (lock sequences, retraction timing, cancellation)
//! - The [`Catapult`](controller::Catapult) controller itself

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod controller;
pub mod motion;
pub mod safety;
pub mod traits;

pub use controller::{Catapult, ControllerError, Outcome};
