// src/stabilizer/roll.rs

//! # Roll PID Gimbal Stabilization Controller
//!
//! Holds a single gimbal axis on its set point. The proportional and integral
//! terms are computed by [`compute_roll`] through a `piddiy` controller; the
//! derivative of the error is low-pass filtered here before being handed to
//! the callback, because a raw difference quotient at a 50 Hz loop rate is
//! dominated by accelerometer noise.
//!
//! Two anti-windup guards apply: the integral is clamped to `±i_limit`, and
//! while the actuator is pinned at a travel limit with the error pushing
//! further into it, the integral is multiplied by `integral_decay` each tick.

use crate::pid::{compute_roll, RollControlData, Saturation};
use crate::{AxisStabilizer, Gains, Number, StabilizerConfig};
use piddiy::PidController;

/// Struct representing the roll axis PID stabilization controller.
pub struct RollStabilizer<T: Number> {
    pid: PidController<T, RollControlData<T>>,
    gains: Gains<T>,
    derivative: T,
    i_limit: T,
    integral_decay: T,
    derivative_smoothing: T,
}

impl<T: Number> RollStabilizer<T> {
    /// Creates a new controller using the provided configuration
    pub fn with_config(config: StabilizerConfig<T>) -> Self {
        let mut pid = PidController::new();
        pid.compute_fn(compute_roll)
            .set_point(config.set_point)
            .kp(config.gains.kp)
            .ki(config.gains.ki)
            .kd(config.gains.kd);

        RollStabilizer {
            pid,
            gains: config.gains,
            derivative: T::zero(),
            i_limit: config.i_limit,
            integral_decay: config.integral_decay,
            derivative_smoothing: config.derivative_smoothing,
        }
    }

    /// Creates a new controller with neutral settings
    pub fn new() -> Self {
        Self::with_config(StabilizerConfig::new())
    }

    /// Replaces all three gains at once and zeroes the integral and the
    /// derivative filter, so the output never mixes new gains with state
    /// built under old ones.
    pub fn set_gains(&mut self, gains: Gains<T>) {
        self.pid.kp(gains.kp).ki(gains.ki).kd(gains.kd);
        self.pid.integral = T::zero();
        self.pid.derivative = T::zero();
        self.derivative = T::zero();
        self.gains = gains;
    }

    /// Current gains.
    pub fn gains(&self) -> Gains<T> {
        self.gains
    }

    /// Moves the set point. The integral is kept.
    pub fn set_target(&mut self, target: T) {
        self.pid.set_point(target);
    }

    /// Current set point in degrees.
    pub fn target(&self) -> T {
        self.pid.set_point
    }

    /// Accumulated error in degree-seconds.
    pub fn integral(&self) -> T {
        self.pid.integral
    }

    /// Error seen on the last completed tick.
    pub fn last_error(&self) -> T {
        self.pid.error
    }

    /// Low-pass filtered derivative from the last completed tick.
    pub fn derivative(&self) -> T {
        self.derivative
    }

    /// Clears the integral, last error and derivative filter.
    pub fn reset(&mut self) {
        self.pid.integral = T::zero();
        self.pid.error = T::zero();
        self.pid.derivative = T::zero();
        self.derivative = T::zero();
    }
}

impl<T: Number> Default for RollStabilizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Number> AxisStabilizer<T> for RollStabilizer<T> {
    fn control(&mut self, angle: T, dt: T, saturation: Saturation) -> Option<T> {
        if !(T::zero() < dt) {
            return None;
        }

        let error = angle - self.pid.set_point;
        let raw_derivative = (error - self.pid.error) / dt;
        if !raw_derivative.is_finite() {
            return None;
        }
        let derivative = self.derivative_smoothing * self.derivative
            + (T::one() - self.derivative_smoothing) * raw_derivative;

        let data = RollControlData {
            measurement: angle,
            dt,
            integral_limit: self.i_limit,
            integral_decay: self.integral_decay,
            saturation,
            derivative,
        };
        let previous = (self.pid.error, self.pid.integral, self.pid.derivative);
        let output = self.pid.compute(data);
        if !output.is_finite() {
            (self.pid.error, self.pid.integral, self.pid.derivative) = previous;
            return None;
        }
        self.derivative = derivative;

        Some(output)
    }
}
