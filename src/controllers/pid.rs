use alloc::rc::Rc;
use core::time::Duration;

#[allow(unused_imports)]
use num_traits::Float;

use super::Controller;
use crate::devices::platform::Clock;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PidGains {
    pub kp: f64, // Proportional gain
    pub ki: f64, // Integral gain
    pub kd: f64, // Derivative gain
}

/// A position controller: maps an error to an output.
///
/// Time is measured in milliseconds from the injected clock.
pub struct Pid {
    gains: PidGains,
    clock: Rc<dyn Clock>,
    prev_error: Option<f64>,
    prev_time: Option<Duration>,
    integral: f64,
    windup_range: f64,        // Error magnitude above which the integral is cleared; 0 disables
    reset_on_sign_flip: bool, // Whether or not to reset integral when sign flips
}

impl Pid {
    pub fn new(
        gains: PidGains,
        windup_range: f64,
        reset_on_sign_flip: bool,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            gains,
            clock,
            prev_error: None,
            prev_time: None,
            integral: 0.0,
            windup_range,
            reset_on_sign_flip,
        }
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }
}

impl Controller<f64, f64> for Pid {
    fn update(&mut self, error: f64) -> f64 {
        let now = self.clock.now();
        let delta_time = self
            .prev_time
            .map_or(0.0, |prev| now.saturating_sub(prev).as_secs_f64() * 1000.0);
        let prev_error = self.prev_error.unwrap_or(error);
        self.prev_time = Some(now);
        self.prev_error = Some(error);

        self.integral += error * delta_time;
        if self.reset_on_sign_flip && error.signum() != prev_error.signum()
            || self.windup_range != 0.0 && error.abs() > self.windup_range
        {
            self.integral = 0.0;
        }
        let derivative = if delta_time == 0.0 {
            0.0
        } else {
            (error - prev_error) / delta_time
        };

        self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.prev_time = None;
    }
}
