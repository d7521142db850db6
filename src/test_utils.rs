// src/test_utils.rs

//! This module contains utilities for testing.

use crate::{Actuator, Error, ImuSensor, SensorSample};
use num_traits::Float;

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-4;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Builds a sample whose accelerometer reads `degrees` of roll and whose
/// gyro reads `rate` degrees per second about the roll axis.
pub fn tilted_sample(degrees: f32, rate: f32) -> SensorSample {
    let radians = degrees.to_radians();
    SensorSample {
        accel: (9.81 * radians.sin(), 0.0, 9.81 * radians.cos()),
        gyro: (0.0, rate.to_radians(), 0.0),
    }
}

/// Sensor that always returns the same sample, or fails when `fail` is set.
pub struct FixedSensor {
    /// Sample handed out on every read.
    pub sample: SensorSample,
    /// When set, reads fail with `Error::SensorRead`.
    pub fail: bool,
}

impl ImuSensor for FixedSensor {
    fn read(&mut self) -> Result<SensorSample, Error> {
        if self.fail {
            Err(Error::SensorRead)
        } else {
            Ok(self.sample)
        }
    }
}

/// Actuator that records the last position and counts writes.
#[derive(Default)]
pub struct RecordingActuator {
    /// Last written position.
    pub position: Option<u8>,
    /// Number of writes seen.
    pub writes: usize,
}

impl Actuator for RecordingActuator {
    fn write(&mut self, position: u8) {
        self.position = Some(position);
        self.writes += 1;
    }
}
