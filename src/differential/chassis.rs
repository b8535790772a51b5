use alloc::{boxed::Box, rc::Rc};
use core::{
    cell::{Cell, RefCell},
    time::Duration,
};

use bon::Builder;
#[allow(unused_imports)]
use num_traits::Float;

use super::{
    motions::{ChassisSpeeds, Motion, MotionQueue},
    pose::Pose,
};
use crate::{
    controllers::{vapid::VelocityControllerInput, Controller},
    devices::{
        motor_group::{MotorGroup, MAX_POWER},
        platform::Platform,
    },
    tracking::Odometry,
    utils::{
        timer::Timer,
        units::{rpm_to_linear, Length, LinearVelocity},
    },
};

pub type VelocityController = Box<dyn Controller<VelocityControllerInput, f64>>;
pub type PositionController = Box<dyn Controller<f64, f64>>;

pub struct Drivetrain {
    left_motors: MotorGroup,
    right_motors: MotorGroup,

    /// Diameter in inches.
    wheel_diameter: Length,

    /// Wheel rpm over motor rpm.
    gear_ratio: f64,
}

impl Drivetrain {
    pub fn new(
        left_motors: MotorGroup,
        right_motors: MotorGroup,
        wheel_diameter: Length,
        gear_ratio: f64,
    ) -> Self {
        Self {
            left_motors,
            right_motors,
            wheel_diameter,
            gear_ratio,
        }
    }

    pub fn left_velocity(&self) -> LinearVelocity {
        rpm_to_linear(self.left_motors.velocity() * self.gear_ratio, self.wheel_diameter)
    }

    pub fn right_velocity(&self) -> LinearVelocity {
        rpm_to_linear(self.right_motors.velocity() * self.gear_ratio, self.wheel_diameter)
    }

    /// Sends power in `[-1, 1]` to each side. Anything outside is clamped.
    pub fn set_power(&mut self, left: f64, right: f64) {
        self.left_motors.set_power(scale_power(left));
        self.right_motors.set_power(scale_power(right));
    }

    pub fn stop(&mut self) {
        self.set_power(0.0, 0.0);
    }
}

fn scale_power(power: f64) -> i32 {
    (power.clamp(-1.0, 1.0) * MAX_POWER as f64).round() as i32
}

struct ChassisControllers {
    left_velocity: VelocityController,
    right_velocity: VelocityController,
    linear: Option<PositionController>,
    angular: Option<PositionController>,
}

impl ChassisControllers {
    fn reset_velocity(&mut self) {
        self.left_velocity.reset();
        self.right_velocity.reset();
    }

    fn reset_all(&mut self) {
        self.reset_velocity();
        if let Some(linear) = &mut self.linear {
            linear.reset();
        }
        if let Some(angular) = &mut self.angular {
            angular.reset();
        }
    }
}

/// Everything a [`Chassis`] is wired from.
///
/// # Examples
/// ```ignore
/// let config = ChassisConfig::builder()
///     .drivetrain(drivetrain)
///     .odometry(Box::new(odometry))
///     .left_velocity_controller(Box::new(Vapid::new(gains, platform.clone())))
///     .right_velocity_controller(Box::new(Vapid::new(gains, platform.clone())))
///     .build();
/// ```
#[derive(Builder)]
pub struct ChassisConfig {
    drivetrain: Drivetrain,
    odometry: Box<dyn Odometry>,
    left_velocity_controller: VelocityController,
    right_velocity_controller: VelocityController,

    /// Reserved for position-holding motions. Reset whenever a motion starts.
    linear_controller: Option<PositionController>,
    angular_controller: Option<PositionController>,

    #[builder(default = Duration::from_millis(10))]
    tick_period: Duration,
}

struct ActiveMotion<M> {
    motion: Box<dyn Motion>,

    /// Operating mode when the motion started.
    mode: M,
}

/// Releases the claim on initialization unless the loop was spawned.
struct StartClaim<'a> {
    started: &'a Cell<bool>,
    spawned: bool,
}

impl Drop for StartClaim<'_> {
    fn drop(&mut self) {
        if !self.spawned {
            self.started.set(false);
        }
    }
}

/// Odometry taken out of its slot; goes back in when dropped.
struct OdometryLease<'a> {
    slot: &'a RefCell<Option<Box<dyn Odometry>>>,
    odometry: Option<Box<dyn Odometry>>,
}

impl Drop for OdometryLease<'_> {
    fn drop(&mut self) {
        if let Some(odometry) = self.odometry.take() {
            *self.slot.borrow_mut() = Some(odometry);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct VelocityTargets {
    left: LinearVelocity,
    right: LinearVelocity,
    time: Duration,
}

/// Runs odometry and the active motion on a fixed-period control loop.
///
/// A chassis is shared as `Rc<Chassis<P>>` between the loop task and whoever
/// issues motions. Nothing inside is borrowed across an await.
pub struct Chassis<P: Platform + 'static> {
    platform: Rc<P>,
    drivetrain: RefCell<Drivetrain>,

    /// Taken out while calibrating.
    odometry: RefCell<Option<Box<dyn Odometry>>>,
    controllers: RefCell<ChassisControllers>,
    motion: RefCell<Option<ActiveMotion<P::Mode>>>,
    motion_queue: MotionQueue,

    /// Bumped by `cancel_all_motions` so waiting callers give up.
    generation: Cell<u64>,
    last_targets: Cell<Option<VelocityTargets>>,
    pose: Cell<Pose>,

    /// Requested while the odometry was calibrating.
    pending_pose: Cell<Option<Pose>>,
    tick_period: Duration,
    started: Cell<bool>,
}

impl<P: Platform + 'static> Chassis<P> {
    pub fn new(config: ChassisConfig, platform: Rc<P>) -> Self {
        Self {
            platform,
            drivetrain: RefCell::new(config.drivetrain),
            odometry: RefCell::new(Some(config.odometry)),
            controllers: RefCell::new(ChassisControllers {
                left_velocity: config.left_velocity_controller,
                right_velocity: config.right_velocity_controller,
                linear: config.linear_controller,
                angular: config.angular_controller,
            }),
            motion: RefCell::new(None),
            motion_queue: MotionQueue::new(),
            generation: Cell::new(0),
            last_targets: Cell::new(None),
            pose: Cell::new(Pose::default()),
            pending_pose: Cell::new(None),
            tick_period: config.tick_period,
            started: Cell::new(false),
        }
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Calibrates odometry and starts the control loop.
    ///
    /// Only the first call that runs to completion does anything. Dropping
    /// the future early leaves the chassis as it was.
    pub async fn initialize(self: &Rc<Self>) {
        if self.started.replace(true) {
            log::debug!("Chassis already initialized");
            return;
        }
        let mut claim = StartClaim {
            started: &self.started,
            spawned: false,
        };

        self.calibrate().await;
        self.controllers.borrow_mut().reset_velocity();

        let chassis = Rc::clone(self);
        self.platform.spawn(Box::pin(async move { chassis.run().await }));
        claim.spawned = true;
        log::info!("Chassis control loop started");
    }

    async fn calibrate(&self) {
        let Some(odometry) = self.odometry.borrow_mut().take() else {
            return;
        };
        let mut lease = OdometryLease {
            slot: &self.odometry,
            odometry: Some(odometry),
        };
        let Some(odometry) = lease.odometry.as_mut() else {
            return;
        };

        if odometry.calibrate(&*self.platform).await.is_err() {
            log::warn!("Starting with uncalibrated odometry");
        }
        if let Some(pose) = self.pending_pose.take() {
            odometry.set_pose(pose);
        }
        self.pose.set(odometry.pose());
    }

    async fn run(&self) {
        loop {
            let timer = Timer::new(self.tick_period, &*self.platform);
            self.update();
            self.platform.sleep(timer.remaining_time()).await;
        }
    }

    /// Runs one control tick: odometry, then the motion, then the motors.
    pub fn update(&self) {
        let pose = match self.odometry.borrow_mut().as_mut() {
            Some(odometry) => {
                if let Some(pose) = self.pending_pose.take() {
                    odometry.set_pose(pose);
                }
                odometry.update()
            }
            None => self.pose.get(),
        };
        self.pose.set(pose);

        let mode = self.platform.mode();
        let speeds = {
            let mut slot = self.motion.borrow_mut();
            let Some(active) = slot.as_mut() else {
                return;
            };
            if active.mode != mode {
                log::warn!(
                    "Operating mode changed from {:?} to {:?}, stopping motion",
                    active.mode,
                    mode
                );
                None
            } else if !active.motion.is_running() {
                log::debug!("Motion finished");
                None
            } else {
                Some(active.motion.update(pose))
            }
        };

        match speeds {
            Some(speeds) => self.dispatch(speeds),
            None => self.stop_motion(),
        }
    }

    fn dispatch(&self, speeds: ChassisSpeeds) {
        match speeds {
            ChassisSpeeds::Velocity { left, right } => {
                let now = self.platform.now();
                let (left_acceleration, right_acceleration) = match self.last_targets.get() {
                    Some(last) if now > last.time => {
                        let dt = (now - last.time).as_secs_f64();
                        ((left - last.left) / dt, (right - last.right) / dt)
                    }
                    _ => (0.0, 0.0),
                };
                self.last_targets
                    .set(Some(VelocityTargets { left, right, time: now }));

                let mut drivetrain = self.drivetrain.borrow_mut();
                let mut controllers = self.controllers.borrow_mut();
                let left_power = controllers.left_velocity.update(VelocityControllerInput {
                    target_acceleration: left_acceleration,
                    target_velocity: left,
                    current_velocity: drivetrain.left_velocity(),
                });
                let right_power = controllers.right_velocity.update(VelocityControllerInput {
                    target_acceleration: right_acceleration,
                    target_velocity: right,
                    current_velocity: drivetrain.right_velocity(),
                });
                drivetrain.set_power(left_power, right_power);
            }
            ChassisSpeeds::Power { left, right } => {
                self.controllers.borrow_mut().reset_velocity();
                self.last_targets.set(None);
                self.drivetrain.borrow_mut().set_power(left, right);
            }
        }
    }

    /// Drops the active motion, if any, and zeroes drive power right away.
    pub fn stop_motion(&self) {
        let stopped = self.motion.borrow_mut().take();
        if stopped.is_some() {
            log::info!("Motion stopped");
        }
        self.drivetrain.borrow_mut().stop();
        self.controllers.borrow_mut().reset_velocity();
        self.last_targets.set(None);
    }

    /// Stops the active motion and makes every caller still waiting in
    /// [`Chassis::move_motion`] give up.
    pub fn cancel_all_motions(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        self.stop_motion();
    }

    /// Installs `motion` once the active motion, and every motion requested
    /// before this one, has finished.
    ///
    /// Returns `false` if [`Chassis::cancel_all_motions`] was called while waiting.
    pub async fn move_motion<M: Motion + 'static>(&self, motion: M) -> bool {
        let generation = self.generation.get();
        let _ticket = self
            .motion_queue
            .take(&*self.platform, self.tick_period)
            .await;

        while self.motion.borrow().is_some() {
            if self.generation.get() != generation {
                break;
            }
            self.platform.sleep(self.tick_period).await;
        }
        if self.generation.get() != generation {
            log::debug!("Motion cancelled before it started");
            return false;
        }

        self.controllers.borrow_mut().reset_all();
        self.last_targets.set(None);
        let mode = self.platform.mode();
        *self.motion.borrow_mut() = Some(ActiveMotion {
            motion: Box::new(motion),
            mode,
        });
        true
    }

    pub fn is_in_motion(&self) -> bool {
        self.motion.borrow().is_some()
    }

    /// Waits until no motion is active or queued.
    pub async fn wait_until_complete(&self) {
        while self.is_in_motion() || !self.motion_queue.is_empty() {
            self.platform.sleep(self.tick_period).await;
        }
    }

    /// Pose as of the last tick, or the last pose set.
    pub fn pose(&self) -> Pose {
        self.pose.get()
    }

    pub fn set_pose(&self, pose: Pose) {
        match self.odometry.borrow_mut().as_mut() {
            Some(odometry) => odometry.set_pose(pose),
            None => self.pending_pose.set(Some(pose)),
        }
        self.pose.set(pose);
    }
}
