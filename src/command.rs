// src/command.rs

//! # Parameter Channel Module
//!
//! Parses line-oriented parameter commands delivered over any text transport
//! (serial console, message bus) into typed [`Command`] values.
//!
//! Grammar:
//!
//! - `PID:<kp>,<ki>,<kd>` replaces all three gains.
//! - `TARGET:<angle>` moves the set point, in degrees, within
//!   `[-180, 180]`.
//!
//! A command either parses completely or is rejected; there is no partial
//! gain update.

use crate::error::CommandError;
use crate::Gains;
use heapless::Vec;

const GAINS_PREFIX: &str = "PID:";
const TARGET_PREFIX: &str = "TARGET:";
const TARGET_LIMIT: f32 = 180.0;

/// A parsed parameter command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// New proportional, integral and derivative gains.
    Gains(Gains<f32>),
    /// New set point in degrees.
    Target(f32),
}

impl Command {
    /// Parses one command line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if let Some(values) = line.strip_prefix(GAINS_PREFIX) {
            let mut fields = values.split(',');
            let kp = parse_value(fields.next())?;
            let ki = parse_value(fields.next())?;
            let kd = parse_value(fields.next())?;
            if fields.next().is_some() {
                return Err(CommandError::TrailingValue);
            }
            Ok(Command::Gains(Gains::new(kp, ki, kd)))
        } else if let Some(value) = line.strip_prefix(TARGET_PREFIX) {
            if value.contains(',') {
                return Err(CommandError::TrailingValue);
            }
            let command = Command::Target(parse_value(Some(value))?);
            command.validate()?;
            Ok(command)
        } else {
            Err(CommandError::UnknownCommand)
        }
    }

    /// Checks the values of a command built without [`Command::parse`].
    pub fn validate(&self) -> Result<(), CommandError> {
        match *self {
            Command::Gains(gains) => {
                if [gains.kp, gains.ki, gains.kd].iter().all(|v| v.is_finite()) {
                    Ok(())
                } else {
                    Err(CommandError::NotFinite)
                }
            }
            Command::Target(target) if !target.is_finite() => Err(CommandError::NotFinite),
            Command::Target(target) if !(-TARGET_LIMIT..=TARGET_LIMIT).contains(&target) => {
                Err(CommandError::TargetOutOfRange)
            }
            Command::Target(_) => Ok(()),
        }
    }
}

fn parse_value(field: Option<&str>) -> Result<f32, CommandError> {
    let field = field.map(str::trim).unwrap_or_default();
    if field.is_empty() {
        return Err(CommandError::MissingValue);
    }
    let value: f32 = field.parse().map_err(|_| CommandError::InvalidNumber)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CommandError::NotFinite)
    }
}

/// Assembles bytes from a serial-like transport into command lines.
///
/// Lines end at `\n`; `\r` is dropped. A line longer than `N` bytes is
/// discarded whole, so an overflow can never be read as a shorter command.
#[derive(Debug, Default)]
pub struct CommandReader<const N: usize> {
    buffer: Vec<u8, N>,
    complete: bool,
    overflowed: bool,
}

impl<const N: usize> CommandReader<N> {
    /// Creates an empty reader.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            complete: false,
            overflowed: false,
        }
    }

    /// Feeds one byte. Returns the completed, trimmed line when `byte` ends
    /// a non-empty line that fit in the buffer.
    pub fn push(&mut self, byte: u8) -> Option<&str> {
        if core::mem::take(&mut self.complete) {
            self.buffer.clear();
        }
        match byte {
            b'\r' => None,
            b'\n' => {
                self.complete = true;
                if core::mem::take(&mut self.overflowed) {
                    log::warn!("dropping over-long command line");
                    return None;
                }
                let line = core::str::from_utf8(&self.buffer).ok()?.trim();
                if line.is_empty() {
                    None
                } else {
                    Some(line)
                }
            }
            _ => {
                if self.buffer.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }
}
