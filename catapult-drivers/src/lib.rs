//! Actuator driver implementations
//!
//! This crate provides concrete implementations of the
//! [`Actuator`](catapult_core::traits::Actuator) trait:
//!
//! - H-bridge actuators on `embedded-hal` PWM and GPIO, with stall
//!   detection from a driver DIAG pin
//! - A simulated linear actuator with hard stops, for host-side runs

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod actuator;
