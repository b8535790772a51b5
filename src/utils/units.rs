//! Unit aliases shared across the crate.
//!
//! Lengths are in inches, angles in radians, and time is a [`core::time::Duration`].

use core::f64::consts::PI;

pub type Length = f64;
pub type Angle = f64;

/// Inches per second.
pub type LinearVelocity = f64;

/// Inches per second squared.
pub type LinearAcceleration = f64;

/// Radians per second.
pub type AngularVelocity = f64;

/// Standard gravity in inches per second squared.
pub const GRAVITY: LinearAcceleration = 386.088_582_677;

pub fn degrees(from_degrees: f64) -> Angle {
    from_degrees.to_radians()
}

pub fn cm(from_centimeters: f64) -> Length {
    from_centimeters * 0.393_701
}

pub fn m(from_meters: f64) -> Length {
    from_meters * 39.3701
}

/// Linear surface speed of a wheel spinning at `rpm`.
pub fn rpm_to_linear(rpm: f64, wheel_diameter: Length) -> LinearVelocity {
    rpm / 60.0 * PI * wheel_diameter
}
