// src/pid/roll.rs

//! # Roll Angle PID Control Module
//!
//! This module provides a compute function and control data structure
//! to perform angle-based PID (Proportional-Integral-Derivative) control
//! of a single gimbal axis. The error sign is `measurement - set_point`,
//! so a positive error asks the actuator to move towards a larger position.

use crate::Number;
use piddiy::PidController;

/// Where the actuator currently sits relative to its travel limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Saturation {
    /// The actuator has room to move in both directions.
    #[default]
    Free,
    /// The actuator is at or near the top of its travel.
    Upper,
    /// The actuator is at or near the bottom of its travel.
    Lower,
}

impl Saturation {
    /// Returns `true` if an error of this sign would drive the actuator
    /// further into the limit it is already resting against.
    pub fn pushes_further<T: Number>(self, error: T) -> bool {
        match self {
            Saturation::Free => false,
            Saturation::Upper => T::zero() < error,
            Saturation::Lower => error < T::zero(),
        }
    }
}

/// Control data for the roll angle PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollControlData<T> {
    /// The current fused roll angle.
    pub measurement: T,
    /// The time delta since the last computation.
    pub dt: T,
    /// The maximum magnitude allowed for the integral term.
    pub integral_limit: T,
    /// Factor applied to the integral while the actuator is saturated and the
    /// error keeps pushing into the limit.
    pub integral_decay: T,
    /// Actuator saturation state at the start of the tick.
    pub saturation: Saturation,
    /// Low-pass filtered error derivative for this tick.
    pub derivative: T,
}

/// Roll angle PID compute callback.
///
/// Accumulates and clamps the integral, then decays it if the actuator is
/// pinned against a limit the error is pushing towards. The derivative is
/// filtered by the caller and passed through unchanged.
pub fn compute_roll<T: Number>(
    pid: &mut PidController<T, RollControlData<T>>,
    data: RollControlData<T>,
) -> (T, T, T) {
    let error = data.measurement - pid.set_point;
    let mut integral =
        (pid.integral + error * data.dt).clamp(-data.integral_limit, data.integral_limit);
    if data.saturation.pushes_further(error) {
        integral = integral * data.integral_decay;
    }

    (error, integral, data.derivative)
}
