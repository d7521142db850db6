// src/actuator.rs

//! # Actuator Command Shaping Module
//!
//! Turns the stabilizer's corrective output into a servo position in
//! actuator-native degrees. The correction is clamped to a safety band,
//! attenuated inside the deadband, offset from the mechanical center and
//! clamped to the safe travel range. A new position is only emitted when it
//! moves by more than the hysteresis or the error is large.

use crate::pid::Saturation;
use num_traits::Float;

/// Configuration for the actuator command shaper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaperConfig {
    /// Largest correction magnitude passed on, in degrees.
    pub output_limit: f32,
    /// Errors smaller than this, in degrees, are inside the deadband.
    pub deadband: f32,
    /// Factor applied to the correction inside the deadband.
    pub deadband_gain: f32,
    /// Mechanical neutral position.
    pub center: u8,
    /// Lowest position ever commanded.
    pub min_position: u8,
    /// Highest position ever commanded.
    pub max_position: u8,
    /// A position change must exceed this many degrees to be emitted.
    pub position_hysteresis: u8,
    /// Errors larger than this, in degrees, always force an update.
    pub error_override: f32,
    /// Distance from a travel limit, in degrees, at which the actuator
    /// counts as saturated for anti-windup.
    pub saturation_margin: u8,
}

impl ShaperConfig {
    /// Creates the default shaper configuration for a 0 to 180 degree servo.
    pub fn new() -> Self {
        Self {
            output_limit: 80.0,
            deadband: 0.5,
            deadband_gain: 0.3,
            center: 90,
            min_position: 10,
            max_position: 170,
            position_hysteresis: 1,
            error_override: 2.0,
            saturation_margin: 2,
        }
    }
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of shaping one correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shaped {
    /// Position the correction maps to, already clamped.
    pub position: u8,
    /// Whether the position should be written to the actuator.
    pub emit: bool,
}

/// Converts corrections into bounded servo positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandShaper {
    config: ShaperConfig,
}

impl CommandShaper {
    /// Creates a shaper from its configuration.
    pub fn with_config(config: ShaperConfig) -> Self {
        Self { config }
    }

    /// Mechanical neutral position.
    pub fn center(&self) -> u8 {
        self.config.center
    }

    /// Shapes a correction given the current position and the error it came from.
    ///
    /// An infinite correction saturates at the safety band. A NaN correction
    /// holds the current position.
    pub fn shape(&self, correction: f32, current_position: u8, error: f32) -> Shaped {
        let config = &self.config;
        if correction.is_nan() {
            return Shaped {
                position: current_position,
                emit: false,
            };
        }
        let mut limited = correction.clamp(-config.output_limit, config.output_limit);
        if Float::abs(error) < config.deadband {
            limited *= config.deadband_gain;
        }

        // Truncates towards zero like an integer servo write.
        let raw = (f32::from(config.center) + limited) as i32;
        let position = raw.clamp(
            i32::from(config.min_position),
            i32::from(config.max_position),
        ) as u8;

        let delta = (i32::from(position) - i32::from(current_position)).abs();
        let emit = delta > i32::from(config.position_hysteresis)
            || Float::abs(error) > config.error_override;

        Shaped { position, emit }
    }

    /// Saturation state of an actuator resting at `position`.
    pub fn saturation(&self, position: u8) -> Saturation {
        let config = &self.config;
        if position >= config.max_position.saturating_sub(config.saturation_margin) {
            Saturation::Upper
        } else if position <= config.min_position.saturating_add(config.saturation_margin) {
            Saturation::Lower
        } else {
            Saturation::Free
        }
    }
}

impl Default for CommandShaper {
    fn default() -> Self {
        Self::with_config(ShaperConfig::new())
    }
}

/// Actuator adapter driving the physical servo.
pub trait Actuator {
    /// Commands the servo to `position` in actuator-native degrees.
    fn write(&mut self, position: u8);
}
