use core::cell::Cell;

use super::SensorStatus;
use crate::utils::{math::sanitize_angle, units::Angle};

/// An angle-measuring device.
pub trait Encoder {
    /// Starts calibration. Must not block; poll [`Encoder::status`] for completion.
    fn calibrate(&mut self);
    fn status(&self) -> SensorStatus;

    /// Zeroes the measured position without touching calibration.
    fn tare(&mut self);

    /// Unbounded angle; may exceed one turn in either direction.
    fn position(&self) -> Angle;
    fn set_position(&mut self, position: Angle);

    /// Position wrapped into `[0, 2π)`.
    fn angle(&self) -> Angle;

    fn reversed(&self) -> bool;

    /// Flipping the direction also flips every previously measured angle.
    fn set_reversed(&mut self, reversed: bool);

    /// Teeth of the driven gear over teeth of the driving gear.
    fn gear_ratio(&self) -> f64;

    /// Changing the ratio also rescales every previously measured angle.
    fn set_gear_ratio(&mut self, gear_ratio: f64);
}

/// Unscaled readings straight from an angle sensor.
pub trait RawEncoder {
    /// The sensor's own cumulative angle, or `None` if it could not be read.
    fn raw_position(&self) -> Option<Angle>;
    fn set_raw_position(&mut self, position: Angle);
    fn reset(&mut self);
    fn status(&self) -> SensorStatus;
}

/// An [`Encoder`] that applies a gear ratio and direction to a [`RawEncoder`].
///
/// The raw count is the only stored measurement. Every reading is rebuilt
/// from it, so a change of ratio or direction applies to the whole history.
pub struct GearedEncoder<R: RawEncoder> {
    raw: R,
    gear_ratio: f64,
    reversed: bool,

    /// Last raw angle that read successfully, reused when a read fails.
    last_raw: Cell<Angle>,
}

impl<R: RawEncoder> GearedEncoder<R> {
    pub fn new(raw: R, gear_ratio: f64, reversed: bool) -> Self {
        Self {
            raw,
            gear_ratio,
            reversed,
            last_raw: Cell::new(0.0),
        }
    }

    fn direction(&self) -> f64 {
        if self.reversed {
            -1.0
        } else {
            1.0
        }
    }

    fn raw_position(&self) -> Angle {
        match self.raw.raw_position() {
            Some(position) => {
                self.last_raw.set(position);
                position
            }
            None => self.last_raw.get(),
        }
    }
}

impl<R: RawEncoder> Encoder for GearedEncoder<R> {
    fn calibrate(&mut self) {
        self.tare();
    }

    fn status(&self) -> SensorStatus {
        self.raw.status()
    }

    fn tare(&mut self) {
        self.raw.reset();
        self.last_raw.set(0.0);
    }

    fn position(&self) -> Angle {
        self.direction() * self.gear_ratio * self.raw_position()
    }

    fn set_position(&mut self, position: Angle) {
        if self.gear_ratio == 0.0 {
            log::warn!("Ignoring encoder position request with a zero gear ratio");
            return;
        }
        let raw = self.direction() * position / self.gear_ratio;
        self.raw.set_raw_position(raw);
        self.last_raw.set(raw);
    }

    fn angle(&self) -> Angle {
        sanitize_angle(self.position())
    }

    fn reversed(&self) -> bool {
        self.reversed
    }

    fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    fn set_gear_ratio(&mut self, gear_ratio: f64) {
        self.gear_ratio = gear_ratio;
    }
}
