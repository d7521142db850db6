// src/attitude.rs

//! # Attitude Estimation Module
//!
//! Fuses the accelerometer tilt and the integrated gyro rate of one axis with
//! a complementary filter. The gyro term dominates the short-term response
//! while the accelerometer term pulls the estimate back and cancels drift.
//!
//! Axis mapping for the roll axis: tilt is `atan2(accel.x, accel.z)` and the
//! rotation rate is `gyro.y`.

use crate::Error;
use num_traits::Float;

/// One reading of the inertial sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSample {
    /// Linear acceleration `(x, y, z)` in m/s².
    pub accel: (f32, f32, f32),
    /// Angular rate `(x, y, z)` in rad/s.
    pub gyro: (f32, f32, f32),
}

impl SensorSample {
    /// Returns `true` if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        let (ax, ay, az) = self.accel;
        let (gx, gy, gz) = self.gyro;
        [ax, ay, az, gx, gy, gz].iter().all(|v| v.is_finite())
    }

    /// Roll tilt implied by the gravity vector, in degrees.
    pub fn accel_roll(&self) -> f32 {
        self.accel.0.atan2(self.accel.2).to_degrees()
    }

    /// Roll rate reported by the gyro, in degrees per second.
    pub fn gyro_roll_rate(&self) -> f32 {
        self.gyro.1.to_degrees()
    }
}

/// Inertial sensor adapter.
pub trait ImuSensor {
    /// Brings the sensor up. Called once before the first tick; a failure
    /// here is fatal for the control loop.
    fn init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Reads one sample. A failure skips the current tick.
    fn read(&mut self) -> Result<SensorSample, Error>;
}

/// Configuration for the attitude estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Blend factor of the gyro path. Close to one.
    pub alpha: f32,
    /// Time step substituted when the measured one is unusable, in seconds.
    pub nominal_dt: f32,
    /// Largest time step accepted as measured, in seconds.
    pub max_dt: f32,
}

impl EstimatorConfig {
    /// Creates the default estimator configuration.
    pub fn new() -> Self {
        Self {
            alpha: 0.96,
            nominal_dt: 0.02,
            max_dt: 1.0,
        }
    }

    /// Returns `dt` if it is positive, finite and at most `max_dt`,
    /// otherwise `nominal_dt`.
    pub fn sanitize_dt(&self, dt: f32) -> f32 {
        if dt.is_finite() && 0.0 < dt && dt <= self.max_dt {
            dt
        } else {
            self.nominal_dt
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Complementary filter for the roll angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplementaryFilter {
    config: EstimatorConfig,
    angle: f32,
}

impl ComplementaryFilter {
    /// Creates a filter starting level.
    pub fn with_config(config: EstimatorConfig) -> Self {
        Self { config, angle: 0.0 }
    }

    /// Current estimate in degrees.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Folds one sample into the estimate and returns the new angle.
    ///
    /// `dt` is sanitised first, so a stalled loop or a clock jump never
    /// feeds a huge or negative step into the gyro integration.
    pub fn update(&mut self, sample: &SensorSample, dt: f32) -> f32 {
        self.angle = estimate(sample, self.config.sanitize_dt(dt), self.angle, self.config.alpha);
        self.angle
    }

    /// Returns the estimate to level.
    pub fn reset(&mut self) {
        self.angle = 0.0;
    }
}

/// One complementary filter step.
///
/// `angle = alpha * (previous + gyro_rate * dt) + (1 - alpha) * accel_angle`,
/// wrapped into `[-180, 180]` degrees. The accelerometer pull is taken along
/// the shorter way round, so an estimate near 180 crosses over to -180
/// instead of sweeping back through level.
pub fn estimate(sample: &SensorSample, dt: f32, previous_angle: f32, alpha: f32) -> f32 {
    let gyro_angle = previous_angle + sample.gyro_roll_rate() * dt;
    let pull = wrap_degrees(sample.accel_roll() - gyro_angle);
    wrap_degrees(gyro_angle + (1.0 - alpha) * pull)
}

/// Wraps an angle into `[-180, 180]` degrees.
pub fn wrap_degrees(angle: f32) -> f32 {
    if (-180.0..=180.0).contains(&angle) {
        angle
    } else {
        let turns = ((angle + 180.0) / 360.0).floor();
        (angle - 360.0 * turns).clamp(-180.0, 180.0)
    }
}
