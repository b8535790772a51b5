//! Bindings from the device contracts to vexide hardware.

use alloc::boxed::Box;
use core::{future::Future, pin::Pin, time::Duration};

use nalgebra::Vector3;
use vexide::{
    competition::CompetitionMode,
    devices::smart::imu::InertialOrientation,
    prelude::{InertialSensor, Motor, Position, RotationSensor, SmartDevice},
};

use super::{
    encoder::RawEncoder,
    imu::{Imu, ImuOrientation},
    motor_group::{DriveMotor, MAX_POWER},
    platform::{Clock, Delay, Platform},
    SensorStatus,
};
use crate::utils::units::{Angle, AngularVelocity, LinearAcceleration, GRAVITY};

/// The V5 brain's scheduler, clock and competition state.
pub struct VexPlatform;

impl Clock for VexPlatform {
    fn now(&self) -> Duration {
        Duration::from_micros(unsafe { vex_sdk::vexSystemHighResTimeGet() })
    }
}

#[async_trait::async_trait(?Send)]
impl Delay for VexPlatform {
    async fn sleep(&self, duration: Duration) {
        vexide::time::sleep(duration).await;
    }
}

impl Platform for VexPlatform {
    type Mode = CompetitionMode;

    fn mode(&self) -> Self::Mode {
        vexide::competition::mode()
    }

    fn spawn(&self, future: Pin<Box<dyn Future<Output = ()>>>) {
        vexide::task::spawn(future).detach();
    }
}

impl RawEncoder for RotationSensor {
    fn raw_position(&self) -> Option<Angle> {
        self.position().ok().map(|position| position.as_radians())
    }

    fn set_raw_position(&mut self, position: Angle) {
        let _ = RotationSensor::set_position(self, Position::from_radians(position));
    }

    fn reset(&mut self) {
        let _ = self.reset_position();
    }

    fn status(&self) -> SensorStatus {
        if self.position().is_ok() {
            SensorStatus::CALIBRATED
        } else {
            SensorStatus::UNKNOWN_ERROR
        }
    }
}

impl DriveMotor for Motor {
    fn set_power(&mut self, power: i32) {
        let fraction = f64::from(power.clamp(-MAX_POWER, MAX_POWER)) / f64::from(MAX_POWER);
        let _ = self.set_voltage(fraction * self.max_voltage());
    }

    fn set_velocity(&mut self, rpm: i32) {
        let _ = Motor::set_velocity(self, rpm);
    }

    fn velocity(&self) -> f64 {
        Motor::velocity(self).unwrap_or_default()
    }
}

/// A V5 inertial sensor with readings converted to counter-clockwise radians.
///
/// The SDK reports clockwise degrees and accelerations in g.
pub struct V5Inertial {
    sensor: InertialSensor,
}

impl V5Inertial {
    pub fn new(sensor: InertialSensor) -> Self {
        Self { sensor }
    }

    fn read(reading: Result<f64, impl core::fmt::Debug>) -> Angle {
        reading.map(|degrees| -degrees.to_radians()).unwrap_or_default()
    }
}

impl Imu for V5Inertial {
    fn calibrate(&mut self) {
        // Kick off calibration without awaiting the SDK's calibration future;
        // progress is polled through `status`.
        unsafe {
            vex_sdk::vexDeviceImuReset(vex_sdk::vexDeviceGetByIndex(
                u32::from(self.sensor.port_number()) - 1,
            ));
        }
    }

    fn status(&self) -> SensorStatus {
        match self.sensor.is_calibrating() {
            Ok(true) => SensorStatus::CALIBRATING,
            Ok(false) => SensorStatus::CALIBRATED,
            Err(_) => SensorStatus::UNKNOWN_ERROR,
        }
    }

    fn rotation(&self) -> Angle {
        Self::read(self.sensor.rotation())
    }

    fn yaw(&self) -> Angle {
        Self::read(self.sensor.yaw())
    }

    fn set_yaw(&mut self, yaw: Angle) {
        let _ = self.sensor.set_yaw(-yaw.to_degrees());
    }

    fn pitch(&self) -> Angle {
        Self::read(self.sensor.pitch())
    }

    fn set_pitch(&mut self, pitch: Angle) {
        let _ = self.sensor.set_pitch(-pitch.to_degrees());
    }

    fn roll(&self) -> Angle {
        Self::read(self.sensor.roll())
    }

    fn set_roll(&mut self, roll: Angle) {
        let _ = self.sensor.set_roll(-roll.to_degrees());
    }

    fn gyro_rate(&self) -> Vector3<AngularVelocity> {
        self.sensor
            .gyro_rate()
            .map(|rate| {
                Vector3::new(
                    -rate.x.to_radians(),
                    -rate.y.to_radians(),
                    -rate.z.to_radians(),
                )
            })
            .unwrap_or_else(|_| Vector3::zeros())
    }

    fn x_acceleration(&self) -> LinearAcceleration {
        self.sensor
            .acceleration()
            .map(|acceleration| acceleration.x * GRAVITY)
            .unwrap_or_default()
    }

    fn y_acceleration(&self) -> LinearAcceleration {
        self.sensor
            .acceleration()
            .map(|acceleration| acceleration.y * GRAVITY)
            .unwrap_or_default()
    }

    fn z_acceleration(&self) -> LinearAcceleration {
        self.sensor
            .acceleration()
            .map(|acceleration| acceleration.z * GRAVITY)
            .unwrap_or_default()
    }

    fn orientation(&self) -> ImuOrientation {
        match self.sensor.physical_orientation() {
            Ok(InertialOrientation::XUp) => ImuOrientation::XUp,
            Ok(InertialOrientation::XDown) => ImuOrientation::XDown,
            Ok(InertialOrientation::YUp) => ImuOrientation::YUp,
            Ok(InertialOrientation::YDown) => ImuOrientation::YDown,
            Ok(InertialOrientation::ZUp) => ImuOrientation::ZUp,
            _ => ImuOrientation::ZDown,
        }
    }
}
