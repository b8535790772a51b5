use num_traits::Float;

#[macro_export]
macro_rules! signed_mod {
    ($dividend:expr, $divisor:expr) => {
        (($dividend % $divisor) + $divisor) % $divisor
    };
}

pub use signed_mod;

use super::units::Angle;

/// Wraps an angle into `[0, 2π)`.
pub fn sanitize_angle(angle: Angle) -> Angle {
    signed_mod!(angle, core::f64::consts::TAU)
}

/// Scales a left/right pair so that `|throttle| + |turn|` fits within `bound`.
///
/// The pair is split into a common `throttle = (left + right) / 2` and a
/// differential `turn = right - throttle`. When the two together exceed
/// `bound`, each is first capped at `bound`, and the remaining excess is
/// shed from both: `bias` of the excess comes out of the throttle and the
/// rest out of the turn. A bias of 0 keeps the throttle intact, a bias of 1
/// keeps the turn intact, and 0.5 splits the reduction evenly.
/// Even at a bias of 0 the turn only shrinks by the excess; it is never zeroed outright.
///
/// A non-positive `bound` means there is no known limit and the pair is
/// returned untouched. The same routine serves velocity pairs (bounded by
/// the drivetrain's top speed) and power pairs (bounded by 1).
pub fn desaturate<T: Float>(left: T, right: T, bound: T, bias: T) -> (T, T) {
    if bound <= T::zero() {
        return (left, right);
    }
    let two = T::one() + T::one();
    let mut throttle = (left + right) / two;
    let mut turn = right - throttle;

    if throttle.abs() + turn.abs() > bound {
        throttle = throttle.max(-bound).min(bound);
        turn = turn.max(-bound).min(bound);

        let excess = throttle.abs() + turn.abs() - bound;
        if excess > T::zero() {
            let bias = bias.max(T::zero()).min(T::one());
            throttle = throttle.signum() * (throttle.abs() - bias * excess);
            turn = turn.signum() * (turn.abs() - (T::one() - bias) * excess);
        }
    }

    (throttle - turn, throttle + turn)
}
