//! The contract motion algorithms implement, and the machinery shared by all of them.

use alloc::collections::VecDeque;
use core::{
    cell::{Cell, RefCell},
    time::Duration,
};

use super::pose::Pose;
use crate::{
    devices::platform::Delay,
    utils::{math::desaturate, units::LinearVelocity},
};

/// A drive command for one control tick.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ChassisSpeeds {
    /// Wheel velocities, closed-loop through the chassis' velocity controllers.
    Velocity {
        left: LinearVelocity,
        right: LinearVelocity,
    },
    /// Open-loop power in `[-1, 1]` per side.
    Power { left: f64, right: f64 },
}

impl ChassisSpeeds {
    pub fn is_velocity(&self) -> bool {
        matches!(self, Self::Velocity { .. })
    }
}

/// A motion algorithm for a differential drive.
///
/// Once handed to the chassis, `update` is called every tick with the latest
/// pose until `is_running` reports false.
pub trait Motion {
    fn update(&mut self, pose: Pose) -> ChassisSpeeds;
    fn is_running(&self) -> bool;
}

/// State every motion carries: the running flag and the desaturation settings.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MotionState {
    running: bool,
    max_drive_velocity: LinearVelocity,

    /// 0 fully prioritizes linear motion, 1 fully prioritizes turning.
    desaturate_bias: f64,
}

impl MotionState {
    /// A `max_drive_velocity` of 0 leaves velocity commands unscaled.
    pub fn new(max_drive_velocity: LinearVelocity, desaturate_bias: f64) -> Self {
        Self {
            running: true,
            max_drive_velocity,
            desaturate_bias: desaturate_bias.clamp(0.0, 1.0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Marks the motion as complete. There is no way back.
    pub fn finish(&mut self) {
        self.running = false;
    }

    pub fn max_drive_velocity(&self) -> LinearVelocity {
        self.max_drive_velocity
    }

    pub fn desaturate_bias(&self) -> f64 {
        self.desaturate_bias
    }

    /// Scales a command so it stays within what the drivetrain can do.
    pub fn desaturate(&self, speeds: ChassisSpeeds) -> ChassisSpeeds {
        match speeds {
            ChassisSpeeds::Velocity { left, right } => {
                let (left, right) =
                    desaturate(left, right, self.max_drive_velocity, self.desaturate_bias);
                ChassisSpeeds::Velocity { left, right }
            }
            ChassisSpeeds::Power { left, right } => {
                let (left, right) = desaturate(left, right, 1.0, self.desaturate_bias);
                ChassisSpeeds::Power { left, right }
            }
        }
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new(0.0, 0.5)
    }
}

/// First-come, first-served ordering for callers waiting to start a motion.
pub(crate) struct MotionQueue {
    /// The caller holding the front ticket may proceed.
    queue: RefCell<VecDeque<usize>>,
    counter: Cell<usize>,
}

impl MotionQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            counter: Cell::new(0),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Waits until every earlier ticket has been dropped, polling every `poll`.
    pub(crate) async fn take(&self, delay: &dyn Delay, poll: Duration) -> QueueTicket<'_> {
        let id = self.counter.get();
        self.counter.set(id.wrapping_add(1));
        self.queue.borrow_mut().push_back(id);

        // Created before waiting so a dropped caller still leaves the queue.
        let ticket = QueueTicket { queue: self, id };
        while self.queue.borrow().front().copied() != Some(id) {
            delay.sleep(poll).await;
        }
        ticket
    }
}

/// A place in the [`MotionQueue`]; leaving scope lets the next caller through.
pub(crate) struct QueueTicket<'a> {
    queue: &'a MotionQueue,
    id: usize,
}

impl Drop for QueueTicket<'_> {
    fn drop(&mut self) {
        self.queue.queue.borrow_mut().retain(|&id| id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use approx::assert_relative_eq;
    use core::{pin::pin, task::Poll, time::Duration};

    use super::*;
    use crate::test_support::{poll_once, FakePlatform};

    #[test]
    fn finishing_is_one_way() {
        let mut state = MotionState::default();
        assert!(state.is_running());
        state.finish();
        assert!(!state.is_running());
        state.finish();
        assert!(!state.is_running());
    }

    #[test]
    fn bias_is_clamped() {
        assert_eq!(MotionState::new(60.0, 4.0).desaturate_bias(), 1.0);
        assert_eq!(MotionState::new(60.0, -1.0).desaturate_bias(), 0.0);
    }

    #[test]
    fn desaturates_each_mode_against_its_own_bound() {
        let state = MotionState::new(50.0, 0.5);
        match state.desaturate(ChassisSpeeds::Velocity { left: 60.0, right: 60.0 }) {
            ChassisSpeeds::Velocity { left, right } => {
                assert_relative_eq!(left, 50.0);
                assert_relative_eq!(right, 50.0);
            }
            ChassisSpeeds::Power { .. } => panic!("mode changed"),
        }
        match state.desaturate(ChassisSpeeds::Power { left: 60.0, right: 60.0 }) {
            ChassisSpeeds::Power { left, right } => {
                assert_relative_eq!(left, 1.0);
                assert_relative_eq!(right, 1.0);
            }
            ChassisSpeeds::Velocity { .. } => panic!("mode changed"),
        }
        assert!(ChassisSpeeds::Velocity { left: 0.0, right: 0.0 }.is_velocity());
    }

    #[test]
    fn queue_serves_callers_in_order() {
        let platform = FakePlatform::default();
        let queue = MotionQueue::new();

        let mut first = pin!(queue.take(&platform, Duration::from_millis(10)));
        let Poll::Ready(first_ticket) = poll_once(first.as_mut()) else {
            panic!("empty queue should admit immediately");
        };

        let mut second = Box::pin(queue.take(&platform, Duration::from_millis(10)));
        assert!(poll_once(second.as_mut()).is_pending());
        assert!(poll_once(second.as_mut()).is_pending());

        drop(first_ticket);
        let mut admitted = false;
        for _ in 0..4 {
            if let Poll::Ready(ticket) = poll_once(second.as_mut()) {
                drop(ticket);
                admitted = true;
                break;
            }
        }
        assert!(admitted);
        assert!(queue.is_empty());
    }

    #[test]
    fn abandoned_waiters_leave_the_queue() {
        let platform = FakePlatform::default();
        let queue = MotionQueue::new();
        let mut first = pin!(queue.take(&platform, Duration::from_millis(10)));
        let Poll::Ready(ticket) = poll_once(first.as_mut()) else {
            panic!("empty queue should admit immediately");
        };
        let mut waiter = Box::pin(queue.take(&platform, Duration::from_millis(10)));
        assert!(poll_once(waiter.as_mut()).is_pending());
        drop(waiter);
        drop(ticket);
        assert!(queue.is_empty());
    }
}
