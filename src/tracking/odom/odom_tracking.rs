use alloc::boxed::Box;
use core::{fmt, time::Duration};

use nalgebra::{Rotation2, Vector2};
#[allow(unused_imports)]
use num_traits::Float;

use super::odom_wheels::TrackingWheel;
use crate::{
    devices::{imu::Imu, platform::Delay},
    differential::pose::Pose,
    tracking::Odometry,
    utils::{
        timer::Timer,
        units::{Angle, Length},
    },
};

/// Straight-line displacement of the tracking center over a circular arc.
///
/// `delta_length` is what a wheel `offset` inches off center measured while
/// the robot turned by `delta_angle`. With no rotation the arc is already a
/// straight line and `delta_length` is returned as is.
pub fn calculate_chord(delta_length: Length, offset: Length, delta_angle: Angle) -> Length {
    if delta_angle == 0.0 {
        return delta_length;
    }
    let radius = offset + delta_length / delta_angle;
    2.0 * radius * (delta_angle / 2.0).sin()
}

/// How hard calibration tries before giving up.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CalibrationSettings {
    pub attempts: usize,
    pub poll_interval: Duration,

    /// How long a single attempt may report "calibrating" before it is retried.
    pub attempt_timeout: Duration,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            attempts: 5,
            poll_interval: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CalibrationError {
    /// The IMU never reported a calibrated status.
    Exhausted { attempts: usize },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { attempts } => {
                write!(f, "IMU failed to calibrate after {attempts} attempts")
            }
        }
    }
}

impl core::error::Error for CalibrationError {}

#[derive(Clone, Copy, Debug)]
struct Readings {
    vertical: Length,
    horizontal: Length,
    heading: Angle,
}

/// Arc-chord odometry from a forward-facing wheel, an optional sideways
/// wheel, and an IMU for heading.
pub struct PerpendicularWheelOdometry {
    vertical: TrackingWheel,
    horizontal: Option<TrackingWheel>,
    imu: Box<dyn Imu>,
    calibration: CalibrationSettings,

    pose: Pose,

    /// Added to the IMU rotation so the reported heading follows `set_pose`.
    heading_offset: Angle,

    /// `None` until the first update after calibration.
    previous: Option<Readings>,
}

impl PerpendicularWheelOdometry {
    pub fn new(
        vertical: TrackingWheel,
        horizontal: Option<TrackingWheel>,
        imu: Box<dyn Imu>,
    ) -> Self {
        Self {
            vertical,
            horizontal,
            imu,
            calibration: CalibrationSettings::default(),
            pose: Pose::default(),
            heading_offset: 0.0,
            previous: None,
        }
    }

    pub fn with_calibration(mut self, calibration: CalibrationSettings) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn calibration(&self) -> CalibrationSettings {
        self.calibration
    }

    fn heading(&self) -> Angle {
        self.imu.rotation() + self.heading_offset
    }

    fn read(&self) -> Readings {
        Readings {
            vertical: self.vertical.distance(),
            horizontal: self
                .horizontal
                .as_ref()
                .map_or(0.0, TrackingWheel::distance),
            heading: self.heading(),
        }
    }

    async fn calibrate_imu(&mut self, delay: &dyn Delay) -> Result<(), CalibrationError> {
        let attempts = self.calibration.attempts;
        for attempt in 1..=attempts {
            self.imu.calibrate();
            let timer = Timer::new(self.calibration.attempt_timeout, delay);
            loop {
                delay.sleep(self.calibration.poll_interval).await;
                let status = self.imu.status();
                if status.is_calibrated() {
                    log::info!("IMU calibrated on attempt {attempt}");
                    return Ok(());
                }
                if status.is_error() {
                    log::warn!(
                        "IMU calibration attempt {attempt}/{attempts} failed with status {}",
                        status.0
                    );
                    break;
                }
                if timer.is_done() {
                    log::warn!("IMU calibration attempt {attempt}/{attempts} timed out");
                    break;
                }
            }
        }
        Err(CalibrationError::Exhausted { attempts })
    }
}

#[async_trait::async_trait(?Send)]
impl Odometry for PerpendicularWheelOdometry {
    async fn calibrate(&mut self, delay: &dyn Delay) -> Result<(), CalibrationError> {
        self.vertical.reset();
        if let Some(horizontal) = &mut self.horizontal {
            horizontal.reset();
        }

        let result = self.calibrate_imu(delay).await;
        if let Err(err) = &result {
            log::error!("{err}; continuing with uncalibrated heading");
        }

        self.pose = Pose::default();
        self.heading_offset = -self.imu.rotation();
        self.previous = None;
        result
    }

    fn update(&mut self) -> Pose {
        let current = self.read();
        let previous = self.previous.unwrap_or(current);

        let delta_vertical = current.vertical - previous.vertical;
        let delta_horizontal = current.horizontal - previous.horizontal;
        let delta_heading = current.heading - previous.heading;
        let average_heading = previous.heading + delta_heading / 2.0;

        let horizontal_offset = self.horizontal.as_ref().map_or(0.0, TrackingWheel::offset);
        let local = Vector2::new(
            calculate_chord(delta_horizontal, horizontal_offset, delta_heading),
            calculate_chord(delta_vertical, self.vertical.offset(), delta_heading),
        );

        self.pose.position += Rotation2::new(average_heading) * local;
        self.pose.orientation = current.heading;
        self.previous = Some(current);
        self.pose
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.heading_offset = pose.orientation - self.imu.rotation();
        self.pose = pose;
        if let Some(previous) = &mut self.previous {
            previous.heading = pose.orientation;
        }
    }
}
