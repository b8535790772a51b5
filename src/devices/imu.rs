use nalgebra::Vector3;

use super::SensorStatus;
use crate::utils::units::{Angle, AngularVelocity, LinearAcceleration};

/// Which face of the sensor points up as mounted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImuOrientation {
    XUp,
    XDown,
    YUp,
    YDown,
    ZUp,
    ZDown,
}

/// An inertial measurement unit.
///
/// Angles are counter-clockwise positive radians.
pub trait Imu {
    /// Starts calibration. Must not block; poll [`Imu::status`] for completion.
    fn calibrate(&mut self);
    fn status(&self) -> SensorStatus;

    /// Unbounded yaw; keeps counting past full turns.
    fn rotation(&self) -> Angle;

    /// Yaw bounded to half a turn either way.
    fn yaw(&self) -> Angle;
    fn set_yaw(&mut self, yaw: Angle);
    fn pitch(&self) -> Angle;
    fn set_pitch(&mut self, pitch: Angle);
    fn roll(&self) -> Angle;
    fn set_roll(&mut self, roll: Angle);

    /// Roll, pitch and yaw rates.
    fn gyro_rate(&self) -> Vector3<AngularVelocity>;

    fn x_acceleration(&self) -> LinearAcceleration;
    fn y_acceleration(&self) -> LinearAcceleration;
    fn z_acceleration(&self) -> LinearAcceleration;

    fn orientation(&self) -> ImuOrientation;
}
