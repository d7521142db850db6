// src/stabilizer/gimbal_stabilizer.rs

//! A module specifying the shared interface for PID-based gimbal axis stabilizers.
//! It includes the numeric trait the PID math is written against, the gain
//! triple updated by the parameter channel, a configuration structure for the
//! anti-windup and derivative filter settings, and a trait defining the
//! stabilization functionality.

use crate::pid::Saturation;
use piddiy::Number as PiddiyNumber;

/// Custom trait to encapsulate base number requirements.
pub trait Number: PiddiyNumber {
    /// Clamps generic PartialOrd values within a given range.
    fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }

    /// Returns `false` for NaN and the infinities. Types without such
    /// values, like fixed point numbers, are always finite.
    fn is_finite(self) -> bool {
        self - self == Self::zero()
    }
}

impl<T: PiddiyNumber> Number for T {}

/// Proportional, integral and derivative gains for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains<T> {
    /// Proportional gain, output per degree of error.
    pub kp: T,
    /// Integral gain, output per degree-second of accumulated error.
    pub ki: T,
    /// Derivative gain, output per degree-per-second of error change.
    pub kd: T,
}

impl<T> Gains<T> {
    /// Creates a gain triple.
    pub fn new(kp: T, ki: T, kd: T) -> Self {
        Self { kp, ki, kd }
    }
}

impl Default for Gains<f32> {
    fn default() -> Self {
        Self::new(7.0, 0.5, 0.0)
    }
}

/// Configuration for PID gains and other settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig<T> {
    /// Initial gains.
    pub gains: Gains<T>,
    /// Initial set point in degrees.
    pub set_point: T,
    /// Upper limit for integral term to prevent integral windup.
    pub i_limit: T,
    /// Factor applied to the integral while the actuator is saturated and
    /// the error pushes further into the limit. Must be below one.
    pub integral_decay: T,
    /// Weight of the previous filtered derivative in the low-pass filter.
    /// The raw derivative gets `1 - derivative_smoothing`.
    pub derivative_smoothing: T,
}

impl<T: Number> StabilizerConfig<T> {
    /// Creates a new configuration with neutral values for all parameters.
    /// A unit proportional gain, no integral or derivative action, no
    /// smoothing and no decay. These should be replaced with values tuned
    /// for the hardware.
    ///
    /// Example Usage
    /// ```
    /// use gimbal_roll_stabilization::{Gains, RollStabilizer, StabilizerConfig};
    ///
    /// let mut config = StabilizerConfig::<f32>::new();
    ///
    /// // Set the PID gains.
    /// config.gains = Gains::new(7.0, 0.5, 0.0);
    ///
    /// // Set the upper limit for the integral term to prevent windup.
    /// config.i_limit = 20.0;
    ///
    /// // Halve the integral whenever the servo is pinned at a limit.
    /// config.integral_decay = 0.5;
    ///
    /// // Heavy low-pass on the derivative.
    /// config.derivative_smoothing = 0.9;
    ///
    /// let stabilizer = RollStabilizer::with_config(config);
    /// assert_eq!(0.0, stabilizer.integral());
    /// ```
    pub fn new() -> Self {
        Self {
            gains: Gains::new(T::one(), T::zero(), T::zero()),
            set_point: T::zero(),
            i_limit: T::one(),
            integral_decay: T::zero(),
            derivative_smoothing: T::zero(),
        }
    }
}

impl Default for StabilizerConfig<f32> {
    fn default() -> Self {
        Self {
            gains: Gains::default(),
            set_point: 0.0,
            i_limit: 20.0,
            integral_decay: 0.5,
            derivative_smoothing: 0.9,
        }
    }
}

/// A trait for PID-based stabilizers that hold one gimbal axis on a set point.
pub trait AxisStabilizer<T: Number> {
    /// Takes the current fused angle, the time step and the actuator
    /// saturation state, then computes the corrective output.
    ///
    /// - `angle`: Current angle estimate in degrees.
    /// - `dt`: Time delta since the last update, in seconds.
    /// - `saturation`: Whether the actuator is resting against a travel limit.
    ///
    /// Returns `None` without touching any state if `dt` is not positive or
    /// the derivative or the output would not be finite.
    fn control(&mut self, angle: T, dt: T, saturation: Saturation) -> Option<T>;
}
