// src/config.rs

//! # Gimbal Configuration
//!
//! Collects the per-component configurations. Every limit the control loop
//! relies on is a field here rather than a literal, with defaults taken from
//! the most conservative tuning: integral limit 20 degree-seconds and a
//! correction band of ±80 degrees.

use crate::{Error, EstimatorConfig, ScheduleConfig, ShaperConfig, StabilizerConfig};

/// Complete configuration of the roll stabilization loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GimbalConfig {
    /// Attitude estimator settings.
    pub estimator: EstimatorConfig,
    /// PID gains, set point and anti-windup settings.
    pub stabilizer: StabilizerConfig<f32>,
    /// Actuator command shaping settings.
    pub shaper: ShaperConfig,
    /// Side task rates.
    pub schedule: ScheduleConfig,
}

impl GimbalConfig {
    /// Creates the default configuration.
    ///
    /// Example Usage
    /// ```
    /// use gimbal_roll_stabilization::{GimbalConfig, Gains};
    ///
    /// let mut config = GimbalConfig::new();
    ///
    /// // Softer gains for a lighter payload.
    /// config.stabilizer.gains = Gains::new(4.0, 0.2, 0.05);
    ///
    /// // Keep the servo further from its end stops.
    /// config.shaper.min_position = 20;
    /// config.shaper.max_position = 160;
    ///
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new() -> Self {
        Self {
            estimator: EstimatorConfig::new(),
            stabilizer: StabilizerConfig::default(),
            shaper: ShaperConfig::new(),
            schedule: ScheduleConfig::new(),
        }
    }

    /// Checks that the settings are in range and consistent with each other.
    pub fn validate(&self) -> Result<(), Error> {
        let estimator = &self.estimator;
        check(unit_interval(estimator.alpha), "estimator.alpha")?;
        check(positive(estimator.max_dt), "estimator.max_dt")?;
        check(
            positive(estimator.nominal_dt) && estimator.nominal_dt <= estimator.max_dt,
            "estimator.nominal_dt",
        )?;

        let stabilizer = &self.stabilizer;
        let gains = &stabilizer.gains;
        check(
            gains.kp.is_finite() && gains.ki.is_finite() && gains.kd.is_finite(),
            "stabilizer.gains",
        )?;
        check(
            (-180.0..=180.0).contains(&stabilizer.set_point),
            "stabilizer.set_point",
        )?;
        check(positive(stabilizer.i_limit), "stabilizer.i_limit")?;
        check(
            unit_interval(stabilizer.integral_decay) && stabilizer.integral_decay < 1.0,
            "stabilizer.integral_decay",
        )?;
        check(
            unit_interval(stabilizer.derivative_smoothing) && stabilizer.derivative_smoothing < 1.0,
            "stabilizer.derivative_smoothing",
        )?;

        let shaper = &self.shaper;
        check(positive(shaper.output_limit), "shaper.output_limit")?;
        check(
            shaper.deadband.is_finite() && 0.0 <= shaper.deadband,
            "shaper.deadband",
        )?;
        check(unit_interval(shaper.deadband_gain), "shaper.deadband_gain")?;
        check(
            shaper.min_position < shaper.center && shaper.center < shaper.max_position,
            "shaper.center",
        )?;
        check(shaper.max_position <= 180, "shaper.max_position")?;
        check(
            shaper.error_override.is_finite() && 0.0 <= shaper.error_override,
            "shaper.error_override",
        )?;

        let schedule = &self.schedule;
        check(schedule.telemetry_interval_ms > 0, "schedule.telemetry_interval_ms")?;
        check(schedule.status_interval_ms > 0, "schedule.status_interval_ms")?;

        Ok(())
    }
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn check(ok: bool, field: &'static str) -> Result<(), Error> {
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidConfig(field))
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && 0.0 < value
}

fn unit_interval(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}
