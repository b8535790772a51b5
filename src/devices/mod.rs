pub mod encoder;
pub mod imu;
pub mod motor_group;
pub mod platform;

#[cfg(feature = "vexide")]
pub mod vex;

/// Calibration and health state reported by a sensor.
///
/// Devices may report values above [`SensorStatus::UNKNOWN_ERROR`] for
/// their own failure states, so error checks go through
/// [`SensorStatus::is_error`] rather than comparing for equality.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct SensorStatus(pub u32);

impl SensorStatus {
    pub const CALIBRATED: Self = Self(0);
    pub const CALIBRATING: Self = Self(1);
    pub const NOT_CALIBRATED: Self = Self(2);
    pub const UNKNOWN_ERROR: Self = Self(3);

    pub fn is_calibrated(self) -> bool {
        self == Self::CALIBRATED
    }

    pub fn is_error(self) -> bool {
        self >= Self::UNKNOWN_ERROR
    }
}
