// src/lib.rs

//! # Roll Gimbal Stabilization
//!
//! This crate provides a `no_std`, no-alloc control core for a single-axis
//! (roll) camera gimbal. An inertial sensor sample is fused into an angle
//! estimate with a complementary filter, a PID controller with two
//! anti-windup guards and a smoothed derivative computes a correction, and
//! the correction is shaped into a servo position with a safety band,
//! deadband and update hysteresis.
//!
//! Sensor, servo and transports are supplied by the embedding firmware
//! through the [`ImuSensor`] and [`Actuator`] traits and text command lines.
//! Logging goes through the `log` facade.

#![no_std]
#![deny(missing_docs)]

pub mod actuator;
pub mod attitude;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod pid;
pub mod schedule;
pub mod stabilizer;
pub mod telemetry;

#[doc(inline)]
pub use actuator::*;
#[doc(inline)]
pub use attitude::*;
#[doc(inline)]
pub use command::*;
#[doc(inline)]
pub use config::*;
#[doc(inline)]
pub use controller::*;
#[doc(inline)]
pub use error::*;
#[doc(inline)]
pub use schedule::*;
#[doc(inline)]
pub use stabilizer::*;
#[doc(inline)]
pub use telemetry::*;

#[cfg(test)]
mod test_utils;
