//! Velocity controller with velocity and acceleration feedforward.

use alloc::rc::Rc;
use core::time::Duration;

use super::Controller;
use crate::devices::platform::Clock;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct VelocityControllerInput {
    pub target_acceleration: f64,
    pub target_velocity: f64,
    pub current_velocity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct VapidGains {
    /// Velocity feedforward.
    pub kv: f64,
    /// Acceleration feedforward.
    pub ka: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// PID on velocity error plus `kV * v + kA * a` feedforward.
///
/// The integral is accumulated with the trapezoidal rule and time is
/// measured in milliseconds. Gains can be swapped at any point without
/// disturbing the accumulated state.
pub struct Vapid {
    gains: VapidGains,
    clock: Rc<dyn Clock>,
    integral: f64,
    last_error: Option<f64>,
    last_time: Option<Duration>,
}

impl Vapid {
    pub fn new(gains: VapidGains, clock: Rc<dyn Clock>) -> Self {
        Self {
            gains,
            clock,
            integral: 0.0,
            last_error: None,
            last_time: None,
        }
    }

    pub fn gains(&self) -> VapidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: VapidGains) {
        self.gains = gains;
    }
}

impl Controller<VelocityControllerInput, f64> for Vapid {
    fn update(&mut self, input: VelocityControllerInput) -> f64 {
        let error = input.target_velocity - input.current_velocity;
        let now = self.clock.now();
        // The first update after construction or reset has no history to
        // difference against.
        let last_error = *self.last_error.get_or_insert(error);
        let last_time = *self.last_time.get_or_insert(now);

        let dt = now.saturating_sub(last_time).as_secs_f64() * 1000.0;
        let derivative = if dt == 0.0 {
            0.0
        } else {
            (error - last_error) / dt
        };
        self.integral += dt * (last_error + (error - last_error) / 2.0);

        self.last_error = Some(error);
        self.last_time = Some(now);

        self.gains.kv * input.target_velocity
            + self.gains.ka * input.target_acceleration
            + self.gains.kp * error
            + self.gains.ki * self.integral
            + self.gains.kd * derivative
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
        self.last_time = None;
    }
}
