// src/schedule.rs

//! # Schedule Module
//!
//! Slow side tasks (telemetry publishing, status display) run at their own
//! rates, decided from the single clock reading taken at the start of each
//! control tick. They never delay the tick itself.

/// Fires at most once per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl RateLimiter {
    /// Creates a limiter that fires on its first poll.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    /// Interval between firings in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Returns `true` and restarts the interval if it has elapsed at `now_ms`.
    /// A clock reading older than the last firing never fires.
    pub fn ready(&mut self, now_ms: u64) -> bool {
        let due = match self.last_ms {
            None => true,
            Some(last) => now_ms.checked_sub(last).is_some_and(|elapsed| elapsed >= self.interval_ms),
        };
        if due {
            self.last_ms = Some(now_ms);
        }
        due
    }
}

/// Configuration for the side task rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Telemetry publishing interval in milliseconds.
    pub telemetry_interval_ms: u64,
    /// Status display refresh interval in milliseconds.
    pub status_interval_ms: u64,
}

impl ScheduleConfig {
    /// Creates the default schedule: telemetry at 50 Hz, status at 10 Hz.
    pub fn new() -> Self {
        Self {
            telemetry_interval_ms: 20,
            status_interval_ms: 100,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side tasks are due on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Due {
    /// A telemetry record should be published.
    pub telemetry: bool,
    /// The status display should be refreshed.
    pub status: bool,
}

/// The side task rate limiters driven by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    telemetry: RateLimiter,
    status: RateLimiter,
}

impl Schedule {
    /// Creates the schedule from its configuration.
    pub fn with_config(config: ScheduleConfig) -> Self {
        Self {
            telemetry: RateLimiter::new(config.telemetry_interval_ms),
            status: RateLimiter::new(config.status_interval_ms),
        }
    }

    /// Polls every limiter with the same clock reading.
    pub fn poll(&mut self, now_ms: u64) -> Due {
        Due {
            telemetry: self.telemetry.ready(now_ms),
            status: self.status.ready(now_ms),
        }
    }
}
