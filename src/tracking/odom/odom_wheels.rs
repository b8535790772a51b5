use alloc::boxed::Box;

use crate::{devices::encoder::Encoder, utils::units::Length};

/// An unpowered wheel on an encoder, used to measure distance travelled.
pub struct TrackingWheel {
    encoder: Box<dyn Encoder>,

    /// Radius in inches.
    radius: Length,

    /// Distance from the tracking center, perpendicular to the wheel's direction of travel.
    ///
    /// Vertical wheels measure positive to the left; horizontal wheels measure positive forward.
    offset: Length,
}

impl TrackingWheel {
    pub fn new(encoder: Box<dyn Encoder>, diameter: Length, offset: Length) -> Self {
        Self {
            encoder,
            radius: diameter / 2.0,
            offset,
        }
    }

    /// Total distance travelled since the last reset, in inches.
    pub fn distance(&self) -> Length {
        self.encoder.position() * self.radius
    }

    pub fn offset(&self) -> Length {
        self.offset
    }

    pub fn radius(&self) -> Length {
        self.radius
    }

    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    pub fn reset(&mut self) {
        self.encoder.tare();
    }
}
