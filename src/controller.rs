// src/controller.rs

//! # Roll Gimbal Control Loop
//!
//! [`GimbalController`] owns every piece of mutable control state and runs
//! one control tick at a time: read the sensor, estimate the angle, compute
//! the PID correction, shape it into a servo position and write the servo if
//! the position changed enough. Telemetry and status snapshots ride along on
//! the tick report when their rate limiters are due.
//!
//! ## Usage
//!
//! The loop is single threaded. Call [`GimbalController::initialize`] once,
//! then [`GimbalController::tick`] at the control rate with a monotonic
//! millisecond clock reading. Parameter commands are applied between ticks
//! with [`GimbalController::apply_command`]; since every method takes
//! `&mut self`, a gain change and its integral reset can never interleave
//! with a tick.
//!
//! ## Sign Convention
//!
//! `error = angle - target`. A positive error produces a positive correction,
//! which moves the servo above its center position.

use crate::{
    Actuator, AxisStabilizer, Command, CommandShaper, ComplementaryFilter, Error, Gains,
    GimbalConfig, ImuSensor, RollStabilizer, Schedule, Status, Telemetry,
};
use log::{debug, info, trace, warn};

/// Mutable state of the control loop that is not held by the stabilizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    /// Fused roll angle in degrees.
    pub angle: f32,
    /// Gyro roll rate of the last sample in degrees per second.
    pub gyro_rate: f32,
    /// Control error of the last tick in degrees.
    pub error: f32,
    /// Last position written to the actuator.
    pub actuator_position: u8,
    /// Clock reading of the latest tick. Never moves backwards.
    pub last_tick_ms: Option<u64>,
}

/// Outcome of one completed control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Time step used for this tick, in seconds.
    pub dt: f32,
    /// Actuator position after the tick.
    pub position: u8,
    /// Whether the actuator was written this tick.
    pub written: bool,
    /// Telemetry record, when publishing is due.
    pub telemetry: Option<Telemetry>,
    /// Status snapshot, when a display refresh is due.
    pub status: Option<Status>,
}

/// Roll axis gimbal stabilization loop.
pub struct GimbalController {
    config: GimbalConfig,
    estimator: ComplementaryFilter,
    stabilizer: RollStabilizer<f32>,
    shaper: CommandShaper,
    schedule: Schedule,
    state: ControlState,
}

impl GimbalController {
    /// Creates a controller after validating the configuration.
    pub fn with_config(config: GimbalConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Creates a controller with the default configuration.
    pub fn new() -> Self {
        Self::build(GimbalConfig::new())
    }

    fn build(config: GimbalConfig) -> Self {
        Self {
            config,
            estimator: ComplementaryFilter::with_config(config.estimator),
            stabilizer: RollStabilizer::with_config(config.stabilizer),
            shaper: CommandShaper::with_config(config.shaper),
            schedule: Schedule::with_config(config.schedule),
            state: ControlState {
                angle: 0.0,
                gyro_rate: 0.0,
                error: 0.0,
                actuator_position: config.shaper.center,
                last_tick_ms: None,
            },
        }
    }

    /// Brings the sensor up and centers the actuator.
    ///
    /// A sensor that fails to initialize is fatal: the caller must not enter
    /// the tick loop and should escalate to a device reset.
    pub fn initialize<S: ImuSensor, A: Actuator>(
        &mut self,
        sensor: &mut S,
        actuator: &mut A,
    ) -> Result<(), Error> {
        sensor.init().map_err(|error| {
            warn!("sensor initialization failed: {}", error);
            Error::SensorInit
        })?;

        let center = self.shaper.center();
        actuator.write(center);
        self.state.actuator_position = center;

        let gains = self.stabilizer.gains();
        info!(
            "gimbal ready, servo {} deg, Kp {:.2} Ki {:.2} Kd {:.2}",
            center, gains.kp, gains.ki, gains.kd
        );
        Ok(())
    }

    /// Runs one control tick at clock reading `now_ms`.
    ///
    /// On a sensor failure the error is returned and nothing changes: the
    /// actuator keeps its previous command and the next tick tries again.
    /// A correction that is not a finite number is handled the same way and
    /// reported as [`Error::ControlSkipped`].
    pub fn tick<S: ImuSensor, A: Actuator>(
        &mut self,
        now_ms: u64,
        sensor: &mut S,
        actuator: &mut A,
    ) -> Result<TickReport, Error> {
        let sample = match sensor.read() {
            Ok(sample) if sample.is_finite() => sample,
            Ok(_) => {
                warn!("discarding non-finite sensor sample");
                return Err(Error::SensorRead);
            }
            Err(error) => {
                warn!("sensor read failed: {}", error);
                return Err(error);
            }
        };

        let dt = self.time_step(now_ms);
        let estimator = self.estimator;
        let angle = self.estimator.update(&sample, dt);
        let saturation = self.shaper.saturation(self.state.actuator_position);
        let Some(correction) = self.stabilizer.control(angle, dt, saturation) else {
            warn!("skipping tick, non-finite correction at angle {:.2}", angle);
            self.estimator = estimator;
            return Err(Error::ControlSkipped);
        };
        let error = self.stabilizer.last_error();

        let shaped = self.shaper.shape(correction, self.state.actuator_position, error);
        if shaped.emit {
            actuator.write(shaped.position);
            debug!(
                "servo {} -> {} deg (error {:.2})",
                self.state.actuator_position, shaped.position, error
            );
            self.state.actuator_position = shaped.position;
        }

        self.state.angle = angle;
        self.state.gyro_rate = sample.gyro_roll_rate();
        self.state.error = error;
        self.state.last_tick_ms = Some(self.state.last_tick_ms.map_or(now_ms, |last| last.max(now_ms)));
        trace!(
            "tick dt {:.3} angle {:.2} correction {:.2} {:?}",
            dt,
            angle,
            correction,
            saturation
        );

        let due = self.schedule.poll(now_ms);
        Ok(TickReport {
            dt,
            position: self.state.actuator_position,
            written: shaped.emit,
            telemetry: due.telemetry.then(|| self.telemetry()),
            status: due.status.then(|| self.status()),
        })
    }

    /// Parses and applies one parameter command line.
    ///
    /// A malformed line changes nothing and is reported as
    /// [`Error::Command`].
    pub fn apply_command(&mut self, line: &str) -> Result<Command, Error> {
        let command = Command::parse(line).map_err(|error| {
            warn!("ignoring parameter command {:?}: {}", line, error);
            Error::Command(error)
        })?;
        self.apply(command)?;
        Ok(command)
    }

    /// Applies a parameter command. An out of range command changes nothing.
    pub fn apply(&mut self, command: Command) -> Result<(), Error> {
        command.validate()?;
        match command {
            Command::Gains(gains) => {
                self.stabilizer.set_gains(gains);
                info!(
                    "PID updated - Kp: {:.2}, Ki: {:.2}, Kd: {:.2}",
                    gains.kp, gains.ki, gains.kd
                );
            }
            Command::Target(target) => {
                self.stabilizer.set_target(target);
                info!("target updated - {:.2} deg", target);
            }
        }
        Ok(())
    }

    /// Current telemetry record.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            angle: self.state.angle,
            gyro_rate: self.state.gyro_rate,
            position: self.state.actuator_position,
            error: self.state.error,
            integral: self.stabilizer.integral(),
        }
    }

    /// Current status snapshot.
    pub fn status(&self) -> Status {
        Status {
            angle: self.state.angle,
            error: self.state.error,
            position: self.state.actuator_position,
            gains: self.stabilizer.gains(),
        }
    }

    /// Loop state outside the stabilizer.
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Configuration the controller was built with.
    pub fn config(&self) -> &GimbalConfig {
        &self.config
    }

    /// Gains in effect.
    pub fn gains(&self) -> Gains<f32> {
        self.stabilizer.gains()
    }

    /// Set point in degrees.
    pub fn target(&self) -> f32 {
        self.stabilizer.target()
    }

    /// Integral term in degree-seconds.
    pub fn integral(&self) -> f32 {
        self.stabilizer.integral()
    }

    /// Low-pass filtered error derivative in degrees per second.
    pub fn derivative(&self) -> f32 {
        self.stabilizer.derivative()
    }

    fn time_step(&self, now_ms: u64) -> f32 {
        let estimator = &self.config.estimator;
        let Some(last) = self.state.last_tick_ms else {
            return estimator.nominal_dt;
        };
        let measured = now_ms
            .checked_sub(last)
            .map_or(0.0, |elapsed| elapsed as f32 / 1000.0);
        let dt = estimator.sanitize_dt(measured);
        if dt != measured {
            warn!(
                "time step {:.3} s out of range, using {:.3} s",
                measured, dt
            );
        }
        dt
    }
}

impl Default for GimbalController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::CommandError;

    fn level() -> FixedSensor {
        FixedSensor {
            sample: tilted_sample(0.0, 0.0),
            fail: false,
        }
    }

    /// Test that initialization centers the actuator.
    #[test]
    fn test_initialize_centers_actuator() {
        let mut controller = GimbalController::new();
        let mut actuator = RecordingActuator::default();

        assert_eq!(Ok(()), controller.initialize(&mut level(), &mut actuator));

        assert_eq!(Some(90), actuator.position);
        assert_eq!(1, actuator.writes);
    }

    /// Test that a failed sensor bring-up is reported as fatal.
    #[test]
    fn test_initialize_sensor_failure() {
        struct DeadSensor;
        impl ImuSensor for DeadSensor {
            fn init(&mut self) -> Result<(), Error> {
                Err(Error::SensorRead)
            }
            fn read(&mut self) -> Result<crate::SensorSample, Error> {
                Err(Error::SensorRead)
            }
        }

        let mut controller = GimbalController::new();
        let mut actuator = RecordingActuator::default();

        assert_eq!(
            Err(Error::SensorInit),
            controller.initialize(&mut DeadSensor, &mut actuator)
        );
        assert_eq!(0, actuator.writes);
    }

    /// Test that an invalid configuration is refused.
    #[test]
    fn test_with_config_validates() {
        let mut config = GimbalConfig::new();
        config.stabilizer.i_limit = -1.0;

        assert!(matches!(
            GimbalController::with_config(config),
            Err(Error::InvalidConfig("stabilizer.i_limit"))
        ));
    }

    /// Test the first tick against a steady tilt.
    #[test]
    fn test_tick_tilted() {
        let mut controller = GimbalController::new();
        let mut sensor = FixedSensor {
            sample: tilted_sample(10.0, 0.0),
            fail: false,
        };
        let mut actuator = RecordingActuator::default();

        let report = controller.tick(0, &mut sensor, &mut actuator);

        // First tick: nominal dt, angle 0.04 * 10 = 0.4, inside the deadband.
        let report = report.unwrap_or_else(|error| panic!("tick failed: {}", error));
        assert_eq!(0.02, report.dt);
        assert!(value_close(0.4, controller.state().angle));
        assert!(value_close(0.4, controller.state().error));
        assert!(report.telemetry.is_some());
        assert!(report.status.is_some());
    }

    /// Test that a sensor failure leaves every piece of state untouched.
    #[test]
    fn test_tick_sensor_failure_holds_state() {
        let mut controller = GimbalController::new();
        let mut sensor = FixedSensor {
            sample: tilted_sample(20.0, 5.0),
            fail: false,
        };
        let mut actuator = RecordingActuator::default();
        for i in 0..10 {
            let _ = controller.tick(i * 20, &mut sensor, &mut actuator);
        }
        let state = *controller.state();
        let integral = controller.integral();
        let derivative = controller.derivative();
        let writes = actuator.writes;

        sensor.fail = true;
        assert_eq!(
            Err(Error::SensorRead),
            controller.tick(200, &mut sensor, &mut actuator)
        );

        assert_eq!(state, *controller.state());
        assert_eq!(integral, controller.integral());
        assert_eq!(derivative, controller.derivative());
        assert_eq!(writes, actuator.writes);
    }

    /// Test that a non-finite sample is treated as a failed read.
    #[test]
    fn test_tick_rejects_non_finite_sample() {
        let mut controller = GimbalController::new();
        let mut sensor = FixedSensor {
            sample: crate::SensorSample {
                accel: (0.0, 0.0, f32::INFINITY),
                gyro: (0.0, 0.0, 0.0),
            },
            fail: false,
        };
        let mut actuator = RecordingActuator::default();

        assert_eq!(
            Err(Error::SensorRead),
            controller.tick(0, &mut sensor, &mut actuator)
        );
        assert_eq!(None, controller.state().last_tick_ms);
    }

    /// Test the time step measurement and substitution.
    #[test]
    fn test_tick_time_step() {
        let mut controller = GimbalController::new();
        let mut sensor = level();
        let mut actuator = RecordingActuator::default();
        let mut dt_at = |now| {
            controller
                .tick(now, &mut sensor, &mut actuator)
                .map(|report| report.dt)
        };

        assert_eq!(Ok(0.02), dt_at(1000));
        assert_eq!(Ok(0.01), dt_at(1010));
        // Same millisecond, clock going backwards, stalled loop.
        assert_eq!(Ok(0.02), dt_at(1010));
        assert_eq!(Ok(0.02), dt_at(900));
        assert_eq!(Ok(0.02), dt_at(5000));
        assert_eq!(Ok(0.015), dt_at(5015));
    }

    /// Test that the last tick time never moves backwards.
    #[test]
    fn test_tick_timestamp_monotonic() {
        let mut controller = GimbalController::new();
        let mut sensor = level();
        let mut actuator = RecordingActuator::default();

        let _ = controller.tick(1000, &mut sensor, &mut actuator);
        let _ = controller.tick(400, &mut sensor, &mut actuator);

        assert_eq!(Some(1000), controller.state().last_tick_ms);
    }

    /// Test that a gain command applies all gains and zeroes the integral.
    #[test]
    fn test_apply_gain_command() {
        let mut controller = GimbalController::new();
        let mut sensor = FixedSensor {
            sample: tilted_sample(30.0, 0.0),
            fail: false,
        };
        let mut actuator = RecordingActuator::default();
        for i in 0..20 {
            let _ = controller.tick(i * 20, &mut sensor, &mut actuator);
        }
        assert!(controller.integral() > 0.0);

        let applied = controller.apply_command("PID:2.5,0.1,0.3");

        assert_eq!(Ok(Command::Gains(Gains::new(2.5, 0.1, 0.3))), applied);
        assert_eq!(Gains::new(2.5, 0.1, 0.3), controller.gains());
        assert_eq!(0.0, controller.integral());
    }

    /// Test that a malformed gain command changes nothing.
    #[test]
    fn test_apply_malformed_gain_command() {
        let mut controller = GimbalController::new();
        let mut sensor = FixedSensor {
            sample: tilted_sample(30.0, 0.0),
            fail: false,
        };
        let mut actuator = RecordingActuator::default();
        for i in 0..5 {
            let _ = controller.tick(i * 20, &mut sensor, &mut actuator);
        }
        let integral = controller.integral();

        assert_eq!(
            Err(Error::Command(CommandError::InvalidNumber)),
            controller.apply_command("PID:1.0,abc")
        );
        assert_eq!(Gains::new(7.0, 0.5, 0.0), controller.gains());
        assert_eq!(integral, controller.integral());
    }

    /// Test the set point command.
    #[test]
    fn test_apply_target_command() {
        let mut controller = GimbalController::new();

        assert_eq!(Ok(Command::Target(15.0)), controller.apply_command("TARGET:15"));
        assert_eq!(15.0, controller.target());
        assert!(controller.apply_command("TARGET:up").is_err());
        assert_eq!(15.0, controller.target());
    }

    /// Test that telemetry reflects the state after the tick.
    #[test]
    fn test_telemetry_snapshot() {
        let mut controller = GimbalController::new();
        let mut sensor = FixedSensor {
            sample: tilted_sample(45.0, 10.0),
            fail: false,
        };
        let mut actuator = RecordingActuator::default();

        let _ = controller.tick(0, &mut sensor, &mut actuator);
        let report = controller.tick(20, &mut sensor, &mut actuator);

        let telemetry = controller.telemetry();
        assert_eq!(Ok(Some(telemetry)), report.map(|report| report.telemetry));
        assert_eq!(controller.state().actuator_position, telemetry.position);
        assert_eq!(controller.integral(), telemetry.integral);
        assert!(value_close(10.0, telemetry.gyro_rate));
    }

    /// Test that an out of range target is refused and the loop keeps correcting.
    #[test]
    fn test_out_of_range_target_keeps_loop_alive() {
        let mut controller = GimbalController::new();
        let mut sensor = FixedSensor {
            sample: tilted_sample(30.0, 0.0),
            fail: false,
        };
        let mut actuator = RecordingActuator::default();
        assert_eq!(Ok(()), controller.initialize(&mut sensor, &mut actuator));

        assert_eq!(
            Err(Error::Command(CommandError::TargetOutOfRange)),
            controller.apply_command("TARGET:1e37")
        );
        assert_eq!(
            Err(Error::Command(CommandError::TargetOutOfRange)),
            controller.apply(Command::Target(-1e37))
        );
        assert_eq!(0.0, controller.target());

        for i in 0..500 {
            let _ = controller.tick(i * 20, &mut sensor, &mut actuator);
        }

        assert!(controller.derivative().is_finite());
        assert_eq!(Some(170), actuator.position);
        assert_eq!(170, controller.telemetry().position);
    }

    /// Test that an overflowing correction skips the tick and a retune recovers.
    #[test]
    fn test_tick_non_finite_correction_skips() {
        let mut config = GimbalConfig::new();
        config.stabilizer.gains = Gains::new(f32::MAX, 0.5, 0.0);
        let mut controller = GimbalController::with_config(config)
            .unwrap_or_else(|error| panic!("config refused: {}", error));
        let mut sensor = FixedSensor {
            sample: tilted_sample(30.0, 0.0),
            fail: false,
        };
        let mut actuator = RecordingActuator::default();
        assert_eq!(Ok(()), controller.initialize(&mut sensor, &mut actuator));
        let state = *controller.state();

        assert_eq!(
            Err(Error::ControlSkipped),
            controller.tick(0, &mut sensor, &mut actuator)
        );
        assert_eq!(state, *controller.state());
        assert_eq!(0.0, controller.integral());
        assert_eq!(1, actuator.writes);

        assert!(controller.apply_command("PID:7,0.5,0").is_ok());
        let report = controller.tick(20, &mut sensor, &mut actuator);

        // Estimate 0.04 * 30 = 1.2 from level, 7 * 1.2 plus a small integral.
        assert!(matches!(report, Ok(report) if report.written && report.position == 98));
    }
}
