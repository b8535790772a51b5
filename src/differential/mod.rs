pub mod chassis;
pub mod motions;

pub mod pose {
    use core::ops::{Add, Sub};

    use nalgebra::{Rotation2, Scalar, Vector2, Vector3};
    use num_traits::{AsPrimitive, Num};

    use crate::utils::units::{Angle, Length};

    /// A planar pose. Heading 0 faces +y and grows counter-clockwise, in radians.
    #[derive(Clone, Copy, PartialEq, Debug, Default)]
    pub struct Pose {
        pub position: Vector2<Length>,
        pub orientation: Angle,
    }

    impl Sub for Pose {
        type Output = Self;

        fn sub(self, rhs: Self) -> Self {
            Self {
                position: self.position - rhs.position,
                orientation: self.orientation - rhs.orientation,
            }
        }
    }

    impl Add for Pose {
        type Output = Self;

        fn add(self, rhs: Self) -> Self {
            Self {
                position: self.position + rhs.position,
                orientation: self.orientation + rhs.orientation,
            }
        }
    }

    impl Pose {
        pub fn new<T: Num + AsPrimitive<f64>, U: Num + AsPrimitive<f64>, V: Num + AsPrimitive<f64>>(
            x: T,
            y: U,
            orientation: V,
        ) -> Self {
            Self {
                position: Vector2::<f64>::new(x.as_(), y.as_()),
                orientation: orientation.as_(),
            }
        }

        pub fn x(&self) -> Length {
            self.position.x
        }

        pub fn y(&self) -> Length {
            self.position.y
        }

        /// Rotates the position counter-clockwise about the origin; the heading is unchanged.
        pub fn rotated_by(&self, angle: Angle) -> Self {
            Self {
                position: Rotation2::new(angle) * self.position,
                orientation: self.orientation,
            }
        }

        pub fn distance_to(&self, pose: &Self) -> Length {
            self.position.metric_distance(&pose.position)
        }
    }

    impl<T: Scalar + AsPrimitive<f64>> From<Vector3<T>> for Pose {
        fn from(vector: Vector3<T>) -> Self {
            Pose::new(T::as_(vector[0]), T::as_(vector[1]), T::as_(vector[2]))
        }
    }

    impl From<Pose> for Vector3<f64> {
        fn from(pose: Pose) -> Self {
            Vector3::new(pose.position.x, pose.position.y, pose.orientation)
        }
    }

}
