// src/telemetry.rs

//! # Telemetry Module
//!
//! The record published to dashboards and loggers, and the status snapshot
//! handed to a display.
//!
//! Wire form, one record per line, fields always in this order:
//!
//! ```text
//! {"r":<angle .2>,"g":<gyro rate .2>,"s":<position>,"e":<error .2>,"i":<integral .1>}
//! ```
//!
//! Older dashboards also accept `DATA:<angle>,<gyro rate>,<position>`, which
//! [`Telemetry::parse_legacy`] decodes.

use crate::error::TelemetryError;
use crate::Gains;
use core::fmt::{self, Write};
use heapless::String;

/// Capacity of an encoded telemetry line.
///
/// Fits any record of finite values: three `f32::MIN` fields at two
/// decimals (43 bytes each), the integral at one decimal (42), a three
/// digit position and 26 bytes of keys and braces. In normal operation the
/// angle and target stay within a half turn and lines are under 60 bytes.
pub const TELEMETRY_CAPACITY: usize = 200;

const FIELDS: [&str; 5] = ["\"r\":", "\"g\":", "\"s\":", "\"e\":", "\"i\":"];
const LEGACY_PREFIX: &str = "DATA:";

/// One telemetry record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Fused roll angle in degrees.
    pub angle: f32,
    /// Gyro roll rate in degrees per second.
    pub gyro_rate: f32,
    /// Actuator position in actuator-native degrees.
    pub position: u8,
    /// Control error in degrees.
    pub error: f32,
    /// Integral term in degree-seconds.
    pub integral: f32,
}

impl Telemetry {
    /// Encodes the record into a fixed-capacity line without the newline.
    pub fn encode(&self) -> Result<String<TELEMETRY_CAPACITY>, fmt::Error> {
        let mut line = String::new();
        write!(line, "{}", self)?;
        Ok(line)
    }

    /// Decodes a record in the wire form.
    pub fn parse(line: &str) -> Result<Self, TelemetryError> {
        let body = line
            .trim()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or(TelemetryError::Framing)?;

        let mut values = [0.0f32; 5];
        let mut fields = body.split(',');
        for (value, key) in values.iter_mut().zip(FIELDS) {
            let field = fields.next().ok_or(TelemetryError::MissingField)?.trim();
            let raw = field.strip_prefix(key).ok_or(TelemetryError::MissingField)?;
            *value = parse_number(raw)?;
        }
        if fields.next().is_some() {
            return Err(TelemetryError::Framing);
        }

        let [angle, gyro_rate, position, error, integral] = values;
        Ok(Self {
            angle,
            gyro_rate,
            position: parse_position(position)?,
            error,
            integral,
        })
    }

    /// Decodes a record in the legacy `DATA:` form. The error and integral
    /// are not carried by that form and read as zero.
    pub fn parse_legacy(line: &str) -> Result<Self, TelemetryError> {
        let body = line
            .trim()
            .strip_prefix(LEGACY_PREFIX)
            .ok_or(TelemetryError::Framing)?;

        let mut fields = body.split(',');
        let mut next = || -> Result<f32, TelemetryError> {
            parse_number(fields.next().ok_or(TelemetryError::MissingField)?)
        };
        let angle = next()?;
        let gyro_rate = next()?;
        let position = parse_position(next()?)?;
        if fields.next().is_some() {
            return Err(TelemetryError::Framing);
        }

        Ok(Self {
            angle,
            gyro_rate,
            position,
            error: 0.0,
            integral: 0.0,
        })
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"r\":{:.2},\"g\":{:.2},\"s\":{},\"e\":{:.2},\"i\":{:.1}}}",
            self.angle, self.gyro_rate, self.position, self.error, self.integral
        )
    }
}

fn parse_number(raw: &str) -> Result<f32, TelemetryError> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| TelemetryError::InvalidValue)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TelemetryError::InvalidValue)
    }
}

fn parse_position(value: f32) -> Result<u8, TelemetryError> {
    if (0.0..=180.0).contains(&value) {
        Ok(value as u8)
    } else {
        Err(TelemetryError::InvalidValue)
    }
}

/// Snapshot handed to a status display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    /// Fused roll angle in degrees.
    pub angle: f32,
    /// Control error in degrees.
    pub error: f32,
    /// Actuator position in actuator-native degrees.
    pub position: u8,
    /// Gains in effect.
    pub gains: Gains<f32>,
}
