// src/error.rs

//! # Error Types
//!
//! Every fallible operation in the crate returns [`Error`]. Parameter
//! commands and telemetry records carry their own reason enums so that a
//! transport can report why a line was rejected.

use thiserror::Error;

/// Errors raised by the stabilization core and its adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The inertial sensor could not deliver a sample for this tick.
    #[error("sensor read failed")]
    SensorRead,
    /// The inertial sensor could not be brought up at startup.
    #[error("sensor initialization failed")]
    SensorInit,
    /// The stabilizer refused the tick because its time step or its
    /// correction was not a finite number. No state was changed.
    #[error("control step skipped")]
    ControlSkipped,
    /// A parameter command was rejected.
    #[error("malformed parameter command: {0}")]
    Command(#[from] CommandError),
    /// A telemetry record could not be decoded.
    #[error("malformed telemetry record: {0}")]
    Telemetry(#[from] TelemetryError),
    /// A configuration field is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Reasons a parameter command line is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The line does not start with a known command prefix.
    #[error("unknown command")]
    UnknownCommand,
    /// Fewer values than the command requires.
    #[error("missing value")]
    MissingValue,
    /// More values than the command accepts.
    #[error("unexpected trailing value")]
    TrailingValue,
    /// A value is not a number.
    #[error("invalid number")]
    InvalidNumber,
    /// A value parsed to NaN or infinity.
    #[error("value is not finite")]
    NotFinite,
    /// A target angle outside `[-180, 180]` degrees.
    #[error("target out of range")]
    TargetOutOfRange,
}

/// Reasons a telemetry record is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// The record is not in a recognised framing.
    #[error("unrecognised framing")]
    Framing,
    /// A required field is absent or out of order.
    #[error("missing field")]
    MissingField,
    /// A field value does not parse.
    #[error("invalid field value")]
    InvalidValue,
}
