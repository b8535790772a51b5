pub mod odom;

use alloc::boxed::Box;

pub use odom::odom_tracking::CalibrationError;

use crate::{devices::platform::Delay, differential::pose::Pose};

/// A pose estimator driven by the chassis loop.
#[async_trait::async_trait(?Send)]
pub trait Odometry {
    /// Zeroes sensors and calibrates them, then resets the pose to the origin.
    ///
    /// The engine stays usable after an error, with degraded accuracy.
    async fn calibrate(&mut self, delay: &dyn Delay) -> Result<(), CalibrationError>;

    /// Integrates the sensor readings since the last call. Call once per tick.
    fn update(&mut self) -> Pose;

    fn pose(&self) -> Pose;
    fn set_pose(&mut self, pose: Pose);
}
