//! A minimal three-component vector, generic over the scalar type.
//!
//! This plays the role `lin_alg2::Vec3` plays for the teacher, but without
//! pulling in a quaternion/rotation library the ACS core never needs.

use core::ops::{Add, Div, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vector3<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

macro_rules! impl_vector3_for_float {
    ($t:ty) => {
        impl Vector3<$t> {
            pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

            pub fn dot(self, rhs: Self) -> $t {
                self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
            }

            pub fn cross(self, rhs: Self) -> Self {
                Self::new(
                    self.y * rhs.z - self.z * rhs.y,
                    self.z * rhs.x - self.x * rhs.z,
                    self.x * rhs.y - self.y * rhs.x,
                )
            }

            pub fn norm_squared(self) -> $t {
                self.dot(self)
            }

            pub fn norm(self) -> $t {
                self.norm_squared().sqrt()
            }

            /// Returns the zero vector when the squared norm is zero, per the data-model contract.
            pub fn normalize(self) -> Self {
                let len_sq = self.norm_squared();
                if len_sq == 0.0 {
                    Self::ZERO
                } else {
                    self / len_sq.sqrt()
                }
            }

            pub fn is_finite(self) -> bool {
                self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
            }
        }

        impl Add for Vector3<$t> {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
            }
        }

        impl Sub for Vector3<$t> {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
            }
        }

        impl Mul<$t> for Vector3<$t> {
            type Output = Self;
            fn mul(self, rhs: $t) -> Self {
                Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
            }
        }

        impl Div<$t> for Vector3<$t> {
            type Output = Self;
            fn div(self, rhs: $t) -> Self {
                Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
            }
        }
    };
}

impl_vector3_for_float!(f32);
impl_vector3_for_float!(f64);

impl Vector3<f64> {
    pub fn to_f32(self) -> Vector3<f32> {
        Vector3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl Vector3<f32> {
    pub fn to_f64(self) -> Vector3<f64> {
        Vector3::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_of_unit_axes() {
        let x = Vector3::new(1.0_f32, 0., 0.);
        let y = Vector3::new(0.0_f32, 1., 0.);
        assert_eq!(x.cross(y), Vector3::new(0., 0., 1.));
    }

    #[test]
    fn dot_product() {
        let a = Vector3::new(1.0_f64, 2., 3.);
        let b = Vector3::new(4.0_f64, 5., 6.);
        assert_eq!(a.dot(b), 32.);
    }

    #[test]
    fn norm_of_3_4_0_is_5() {
        let v = Vector3::new(3.0_f32, 4., 0.);
        assert_eq!(v.norm(), 5.);
    }

    #[test]
    fn normalize_zero_vector_stays_zero() {
        let v: Vector3<f32> = Vector3::<f32>::ZERO;
        assert_eq!(v.normalize(), Vector3::<f32>::ZERO);
    }

    #[test]
    fn normalize_scales_to_unit_length() {
        let v = Vector3::new(2.0_f32, 0., 0.);
        assert_eq!(v.normalize(), Vector3::new(1., 0., 0.));
    }
}
