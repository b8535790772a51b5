//! Fake devices and a minimal executor for host-side unit tests.

use alloc::{boxed::Box, collections::VecDeque, rc::Rc, vec::Vec};
use core::{
    cell::{Cell, RefCell},
    future::Future,
    pin::{pin, Pin},
    task::{Context, Poll, Waker},
    time::Duration,
};

use nalgebra::Vector3;

use crate::{
    controllers::{vapid::VelocityControllerInput, Controller},
    devices::{
        encoder::RawEncoder,
        imu::{Imu, ImuOrientation},
        motor_group::DriveMotor,
        platform::{Clock, Delay, Platform},
        SensorStatus,
    },
    differential::{
        motions::{ChassisSpeeds, Motion},
        pose::Pose,
    },
    utils::units::{Angle, AngularVelocity, LinearAcceleration},
};

pub fn poll_once<F: Future + ?Sized>(future: Pin<&mut F>) -> Poll<F::Output> {
    let mut cx = Context::from_waker(Waker::noop());
    future.poll(&mut cx)
}

/// Drives a future to completion. Every fake suspension resolves on the next poll.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    for _ in 0..1_000_000 {
        if let Poll::Ready(output) = poll_once(future.as_mut()) {
            return output;
        }
    }
    panic!("future never completed");
}

/// Pending exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            Poll::Pending
        }
    }
}

/// A manual clock whose sleeps advance time instantly.
#[derive(Default)]
pub struct FakePlatform {
    now: Cell<Duration>,
    mode: Cell<u8>,
    tasks: RefCell<Vec<Pin<Box<dyn Future<Output = ()>>>>>,
}

impl FakePlatform {
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    pub fn set_mode(&self, mode: u8) {
        self.mode.set(mode);
    }

    pub fn spawned(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Polls every spawned task once.
    pub fn run_tasks(&self) {
        let mut tasks = self.tasks.take();
        for task in tasks.iter_mut() {
            let _ = poll_once(task.as_mut());
        }
        self.tasks.borrow_mut().append(&mut tasks);
    }
}

impl Clock for FakePlatform {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[async_trait::async_trait(?Send)]
impl Delay for FakePlatform {
    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        YieldOnce(false).await;
    }
}

impl Platform for FakePlatform {
    type Mode = u8;

    fn mode(&self) -> u8 {
        self.mode.get()
    }

    fn spawn(&self, future: Pin<Box<dyn Future<Output = ()>>>) {
        self.tasks.borrow_mut().push(future);
    }
}

#[derive(Clone)]
pub struct FakeRawEncoder {
    position: Rc<Cell<Angle>>,
    connected: Rc<Cell<bool>>,
}

impl Default for FakeRawEncoder {
    fn default() -> Self {
        Self {
            position: Rc::new(Cell::new(0.0)),
            connected: Rc::new(Cell::new(true)),
        }
    }
}

impl FakeRawEncoder {
    pub fn set(&self, position: Angle) {
        self.position.set(position);
    }

    pub fn get(&self) -> Angle {
        self.position.get()
    }

    pub fn disconnect(&self) {
        self.connected.set(false);
    }
}

impl RawEncoder for FakeRawEncoder {
    fn raw_position(&self) -> Option<Angle> {
        self.connected.get().then(|| self.position.get())
    }

    fn set_raw_position(&mut self, position: Angle) {
        self.position.set(position);
    }

    fn reset(&mut self) {
        self.position.set(0.0);
    }

    fn status(&self) -> SensorStatus {
        if self.connected.get() {
            SensorStatus::CALIBRATED
        } else {
            SensorStatus::UNKNOWN_ERROR
        }
    }
}

/// An IMU whose statuses are played back from a script, then hold at a settled value.
#[derive(Clone, Default)]
pub struct FakeImu {
    rotation: Rc<Cell<Angle>>,
    pitch: Rc<Cell<Angle>>,
    roll: Rc<Cell<Angle>>,
    script: Rc<RefCell<VecDeque<SensorStatus>>>,
    settled: Rc<Cell<SensorStatus>>,
    calibrations: Rc<Cell<usize>>,
}

impl FakeImu {
    pub fn set_rotation(&self, rotation: Angle) {
        self.rotation.set(rotation);
    }

    pub fn script(&self, statuses: impl IntoIterator<Item = SensorStatus>) {
        self.script.borrow_mut().extend(statuses);
    }

    pub fn settle(&self, status: SensorStatus) {
        self.settled.set(status);
    }

    pub fn calibrations(&self) -> usize {
        self.calibrations.get()
    }
}

impl Imu for FakeImu {
    fn calibrate(&mut self) {
        self.calibrations.set(self.calibrations.get() + 1);
    }

    fn status(&self) -> SensorStatus {
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.settled.get())
    }

    fn rotation(&self) -> Angle {
        self.rotation.get()
    }

    fn yaw(&self) -> Angle {
        self.rotation.get()
    }

    fn set_yaw(&mut self, yaw: Angle) {
        self.rotation.set(yaw);
    }

    fn pitch(&self) -> Angle {
        self.pitch.get()
    }

    fn set_pitch(&mut self, pitch: Angle) {
        self.pitch.set(pitch);
    }

    fn roll(&self) -> Angle {
        self.roll.get()
    }

    fn set_roll(&mut self, roll: Angle) {
        self.roll.set(roll);
    }

    fn gyro_rate(&self) -> Vector3<AngularVelocity> {
        Vector3::zeros()
    }

    fn x_acceleration(&self) -> LinearAcceleration {
        0.0
    }

    fn y_acceleration(&self) -> LinearAcceleration {
        0.0
    }

    fn z_acceleration(&self) -> LinearAcceleration {
        0.0
    }

    fn orientation(&self) -> ImuOrientation {
        ImuOrientation::ZUp
    }
}

#[derive(Clone, Default)]
pub struct FakeMotor {
    pub power: Rc<Cell<i32>>,
    pub rpm_target: Rc<Cell<i32>>,
    pub velocity: Rc<Cell<f64>>,
}

impl DriveMotor for FakeMotor {
    fn set_power(&mut self, power: i32) {
        self.power.set(power);
    }

    fn set_velocity(&mut self, rpm: i32) {
        self.rpm_target.set(rpm);
    }

    fn velocity(&self) -> f64 {
        self.velocity.get()
    }
}

/// A controller that records its calls and answers with a fixed output.
#[derive(Clone, Default)]
pub struct SpyController {
    pub updates: Rc<Cell<usize>>,
    pub resets: Rc<Cell<usize>>,
    pub output: Rc<Cell<f64>>,
    pub last_input: Rc<Cell<Option<VelocityControllerInput>>>,
}

impl Controller<VelocityControllerInput, f64> for SpyController {
    fn update(&mut self, input: VelocityControllerInput) -> f64 {
        self.updates.set(self.updates.get() + 1);
        self.last_input.set(Some(input));
        self.output.get()
    }

    fn reset(&mut self) {
        self.resets.set(self.resets.get() + 1);
    }
}

impl Controller<f64, f64> for SpyController {
    fn update(&mut self, _input: f64) -> f64 {
        self.updates.set(self.updates.get() + 1);
        self.output.get()
    }

    fn reset(&mut self) {
        self.resets.set(self.resets.get() + 1);
    }
}

/// A motion that repeats whatever speeds it is told to, until finished.
#[derive(Clone)]
pub struct ScriptedMotion {
    pub speeds: Rc<Cell<ChassisSpeeds>>,
    pub running: Rc<Cell<bool>>,
    pub updates: Rc<Cell<usize>>,
    pub last_pose: Rc<Cell<Option<Pose>>>,
}

impl ScriptedMotion {
    pub fn new(speeds: ChassisSpeeds) -> Self {
        Self {
            speeds: Rc::new(Cell::new(speeds)),
            running: Rc::new(Cell::new(true)),
            updates: Rc::default(),
            last_pose: Rc::default(),
        }
    }

    pub fn finish(&self) {
        self.running.set(false);
    }
}

impl Motion for ScriptedMotion {
    fn update(&mut self, pose: Pose) -> ChassisSpeeds {
        self.updates.set(self.updates.get() + 1);
        self.last_pose.set(Some(pose));
        self.speeds.get()
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }
}
