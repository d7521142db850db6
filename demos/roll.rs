// demos/roll.rs

use gimbal_roll_stabilization::{
    Actuator, Error, GimbalController, ImuSensor, SensorSample,
};
use std::cell::Cell;

/// Simulated camera on a roll servo. The camera roll is the base tilt minus
/// the servo deflection from its 90 degree center.
struct Plant {
    base_tilt: Cell<f32>,
    servo: Cell<u8>,
    previous: Cell<f32>,
}

struct Imu<'a>(&'a Plant);
struct Servo<'a>(&'a Plant);

impl Plant {
    fn camera_angle(&self) -> f32 {
        self.base_tilt.get() - (f32::from(self.servo.get()) - 90.0)
    }
}

impl ImuSensor for Imu<'_> {
    fn read(&mut self) -> Result<SensorSample, Error> {
        let angle = self.0.camera_angle();
        let rate = (angle - self.0.previous.replace(angle)) / DT;
        let radians = angle.to_radians();
        Ok(SensorSample {
            accel: (9.81 * radians.sin(), 0.0, 9.81 * radians.cos()),
            gyro: (0.0, rate.to_radians(), 0.0),
        })
    }
}

impl Actuator for Servo<'_> {
    fn write(&mut self, position: u8) {
        self.0.servo.set(position);
    }
}

const DT: f32 = 0.02;
const TICK_MS: u64 = 20;

fn main() -> Result<(), Error> {
    let plant = Plant {
        base_tilt: Cell::new(0.0),
        servo: Cell::new(90),
        previous: Cell::new(0.0),
    };
    let mut imu = Imu(&plant);
    let mut servo = Servo(&plant);

    let mut controller = GimbalController::new();
    controller.initialize(&mut imu, &mut servo)?;

    // A servo without lag needs softer gains than the stock tuning.
    controller.apply_command("PID:0.5,2.0,0.0")?;

    println!("     t,    base,  camera,   servo,   error, integral");
    for i in 0..=200u64 {
        let now_ms = i * TICK_MS;

        // The base tips over by 15 degrees after half a second.
        if now_ms == 500 {
            plant.base_tilt.set(15.0);
        }

        let report = match controller.tick(now_ms, &mut imu, &mut servo) {
            Ok(report) => report,
            Err(error) => {
                println!("tick at {} ms skipped: {}", now_ms, error);
                continue;
            }
        };

        // Print at the status display rate.
        if let Some(status) = report.status {
            println!(
                "{:6.2}, {:7.2}, {:7.2}, {:7}, {:7.2}, {:8.2}",
                now_ms as f32 / 1000.0,
                plant.base_tilt.get(),
                plant.camera_angle(),
                status.position,
                status.error,
                controller.integral()
            );
        }
    }

    if let Some(record) = controller.tick(201 * TICK_MS, &mut imu, &mut servo)?.telemetry {
        println!("last telemetry: {}", record);
    }

    Ok(())
}
