use alloc::{boxed::Box, vec::Vec};

/// Largest power command a motor accepts, in either direction.
pub const MAX_POWER: i32 = 127;

/// A single drive motor.
pub trait DriveMotor {
    /// Open-loop power in `-MAX_POWER..=MAX_POWER`.
    fn set_power(&mut self, power: i32);

    /// Closed-loop velocity target handled by the motor's own firmware, in rpm.
    fn set_velocity(&mut self, rpm: i32);

    /// Measured velocity in rpm.
    fn velocity(&self) -> f64;
}

pub struct MotorGroup {
    motors: Vec<Box<dyn DriveMotor>>,
}

impl MotorGroup {
    pub fn new(motors: Vec<Box<dyn DriveMotor>>) -> Self {
        Self { motors }
    }

    pub fn size(&self) -> usize {
        self.motors.len()
    }

    pub fn set_power(&mut self, power: i32) {
        let power = power.clamp(-MAX_POWER, MAX_POWER);
        for motor in self.motors.iter_mut() {
            motor.set_power(power);
        }
    }

    pub fn set_velocity(&mut self, rpm: i32) {
        for motor in self.motors.iter_mut() {
            motor.set_velocity(rpm);
        }
    }

    /// Mean velocity of the group in rpm; 0 for an empty group.
    pub fn velocity(&self) -> f64 {
        if self.motors.is_empty() {
            return 0.0;
        }
        self.motors.iter().map(|motor| motor.velocity()).sum::<f64>() / self.motors.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, vec, vec::Vec};

    use super::*;
    use crate::test_support::FakeMotor;

    #[test]
    fn averages_velocity() {
        let motors = [FakeMotor::default(), FakeMotor::default()];
        motors[0].velocity.set(100.0);
        motors[1].velocity.set(200.0);
        let group = MotorGroup::new(
            motors
                .iter()
                .map(|motor| Box::new(motor.clone()) as Box<dyn DriveMotor>)
                .collect(),
        );
        assert_eq!(group.size(), 2);
        assert_eq!(group.velocity(), 150.0);
    }

    #[test]
    fn empty_group_reads_zero() {
        let group = MotorGroup::new(Vec::new());
        assert_eq!(group.velocity(), 0.0);
    }

    #[test]
    fn power_is_clamped_and_broadcast() {
        let motor = FakeMotor::default();
        let mut group = MotorGroup::new(vec![
            Box::new(motor.clone()) as Box<dyn DriveMotor>,
            Box::new(motor.clone()),
        ]);
        group.set_power(400);
        assert_eq!(motor.power.get(), MAX_POWER);
        group.set_power(-90);
        assert_eq!(motor.power.get(), -90);
        group.set_velocity(300);
        assert_eq!(motor.rpm_target.get(), 300);
    }
}
