// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of three-dimensional vectors and tensors used for positions, separations, and forces.

use std::ops::{Add, AddAssign, Deref, DerefMut, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::base::{Matrix3, Vector3};

use crate::structures::simbox::SimBox;

/// Describes length and orientation of a vector in space or a position of a point in space.
/// Implemented using `nalgebra`'s Vector3.
///
/// Two-dimensional systems use the same type with the z-component kept at zero.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Vector3D(pub(crate) Vector3<f64>);

/// Rank-2 tensor used for second derivatives of potentials.
pub type Tensor3D = Matrix3<f64>;

impl From<[f64; 3]> for Vector3D {
    #[inline]
    fn from(arr: [f64; 3]) -> Self {
        Vector3D(Vector3::new(arr[0], arr[1], arr[2]))
    }
}

impl From<[f64; 2]> for Vector3D {
    /// Convert a two-dimensional point into `Vector3D` with zero z-component.
    #[inline]
    fn from(arr: [f64; 2]) -> Self {
        Vector3D(Vector3::new(arr[0], arr[1], 0.0))
    }
}

/// Allows accessing fields of `Vector3D` as `.x`, `.y`, and `.z`.
pub struct Vector3Raw {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Deref for Vector3D {
    type Target = Vector3Raw;

    #[inline]
    fn deref(&self) -> &Self::Target {
        unsafe { &*(self.0.as_ptr() as *const Vector3Raw) }
    }
}

impl DerefMut for Vector3D {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *(self.0.as_mut_ptr() as *mut Vector3Raw) }
    }
}

impl Add for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn add(self, rhs: Vector3D) -> Self::Output {
        Vector3D(self.0 + rhs.0)
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn sub(self, rhs: Vector3D) -> Self::Output {
        Vector3D(self.0 - rhs.0)
    }
}

impl AddAssign for Vector3D {
    #[inline]
    fn add_assign(&mut self, rhs: Vector3D) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Vector3D {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector3D) {
        self.0 -= rhs.0;
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Vector3D(self.0 * rhs)
    }
}

impl MulAssign<f64> for Vector3D {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.0 *= rhs;
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn neg(self) -> Self::Output {
        Vector3D(-self.0)
    }
}

impl Vector3D {
    /// Create a new `Vector3D` structure.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D(Vector3::new(x, y, z))
    }

    /// Calculate length of the vector.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let vector = Vector3D::new(1.0, 2.0, 3.0);
    /// assert_approx_eq!(f64, vector.len(), 3.7416573867739413);
    /// ```
    #[inline]
    pub fn len(&self) -> f64 {
        self.0.magnitude()
    }

    /// Calculate squared length of the vector.
    /// Prefer this over [`Vector3D::len`] in distance comparisons.
    #[inline]
    pub fn len2(&self) -> f64 {
        self.0.magnitude_squared()
    }

    /// Convert vector to unit vector.
    ///
    /// ## Notes
    /// - Returns a vector of NaNs when applied to a null vector.
    #[inline]
    pub fn to_unit(self) -> Vector3D {
        Vector3D(self.0.normalize())
    }

    /// Invert the vector. (Reverse direction of the vector.)
    #[inline]
    pub fn invert(self) -> Vector3D {
        Vector3D(self.0 * -1.0)
    }

    /// Calculate the dot product of two vectors.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let vector1 = Vector3D::new(4.0, 2.0, -1.0);
    /// let vector2 = Vector3D::new(1.0, -3.0, 2.0);
    ///
    /// assert_approx_eq!(f64, vector1.dot(&vector2), -4.0);
    /// ```
    #[inline]
    pub fn dot(&self, vector: &Vector3D) -> f64 {
        self.0.dot(&vector.0)
    }

    /// Calculate the cross product of two vectors.
    #[inline]
    pub fn cross(&self, vector: &Vector3D) -> Vector3D {
        Vector3D(self.0.cross(&vector.0))
    }

    /// Calculate the outer (dyadic) product `self ⊗ vector`.
    #[inline]
    pub fn outer(&self, vector: &Vector3D) -> Tensor3D {
        self.0 * vector.0.transpose()
    }

    /// Add `vector` multiplied by `factor` to `self` in place.
    #[inline]
    pub fn add_scaled(&mut self, vector: &Vector3D, factor: f64) {
        self.0.axpy(factor, &vector.0, 1.0);
    }

    /// Set all components of the vector to zero.
    #[inline]
    pub fn zero(&mut self) {
        self.0.fill(0.0);
    }

    /// Transform the vector by a tensor in place (`self = tensor · self`).
    #[inline]
    pub fn transform(&mut self, tensor: &Tensor3D) {
        self.0 = tensor * self.0;
    }

    /// Calculate shortest vector connecting `self` with `point` taking periodic boundary
    /// conditions of the simulation box into consideration.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let point1 = Vector3D::new(1.0, 2.0, 3.0);
    /// let point2 = Vector3D::new(3.0, 2.0, 1.0);
    /// let simbox = SimBox::from([3.5, 5.0, 5.0]);
    ///
    /// let vec = point1.vector_to(&point2, &simbox);
    ///
    /// assert_approx_eq!(f64, vec.x, -1.5);
    /// assert_approx_eq!(f64, vec.y, 0.0);
    /// assert_approx_eq!(f64, vec.z, -2.0);
    /// ```
    #[inline]
    pub fn vector_to(&self, point: &Vector3D, simbox: &SimBox) -> Vector3D {
        let mut dr = *point - *self;
        simbox.nearest_image(&mut dr);
        dr
    }

    /// Calculate distance between two points taking periodic boundary conditions into consideration.
    #[inline]
    pub fn distance(&self, point: &Vector3D, simbox: &SimBox) -> f64 {
        self.vector_to(point, simbox).len()
    }

    /// Returns `true` if all the fields of the vector are exactly zero.
    /// Otherwise, returns `false`.
    pub fn is_zero(&self) -> bool {
        self.0.x == 0.0 && self.0.y == 0.0 && self.0.z == 0.0
    }

    /// Returns `true` if all the fields of the vector are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.0.x.is_finite() && self.0.y.is_finite() && self.0.z.is_finite()
    }
}

impl Default for Vector3D {
    /// Create a zero vector.
    fn default() -> Self {
        Vector3D(Vector3::new(0.0, 0.0, 0.0))
    }
}

/******************************/
/*       FEATURE: SERDE       */
/******************************/

#[cfg(feature = "serde")]
mod serde {
    use std::fmt;

    use super::*;
    use ::serde::{
        de::{self, SeqAccess, Visitor},
        Deserialize, Deserializer,
    };
    use ::serde::{ser::SerializeSeq, Serialize, Serializer};

    impl Serialize for Vector3D {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(3))?;
            seq.serialize_element(&self.0.x)?;
            seq.serialize_element(&self.0.y)?;
            seq.serialize_element(&self.0.z)?;
            seq.end()
        }
    }

    impl<'de> Deserialize<'de> for Vector3D {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            struct Vector3DVisitor;

            impl<'de> Visitor<'de> for Vector3DVisitor {
                type Value = Vector3D;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a sequence of two or three floats")
                }

                fn visit_seq<S>(self, mut seq: S) -> Result<Vector3D, S::Error>
                where
                    S: SeqAccess<'de>,
                {
                    let x = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                    let y = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                    // two-dimensional vectors may omit the z-component
                    let z = seq.next_element()?.unwrap_or(0.0);
                    Ok(Vector3D(Vector3::new(x, y, z)))
                }
            }

            deserializer.deserialize_seq(Vector3DVisitor)
        }
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn len() {
        let vec = Vector3D::new(4.3, 5.6, 1.2);
        assert_approx_eq!(f64, vec.len(), 7.1617037079175505, epsilon = 1e-12);
        assert_approx_eq!(f64, vec.len2(), 51.29, epsilon = 1e-12);
    }

    #[test]
    fn len_null() {
        let vec = Vector3D::default();
        assert_approx_eq!(f64, vec.len(), 0.0);
        assert!(vec.is_zero());
    }

    #[test]
    fn to_unit_null() {
        let vec = Vector3D::new(0.0, 0.0, 0.0).to_unit();

        assert!(vec.x.is_nan());
        assert!(vec.y.is_nan());
        assert!(vec.z.is_nan());
        assert!(!vec.is_finite());
    }

    #[test]
    fn dot_and_cross() {
        let vector1 = Vector3D::new(-2.0, 0.0, 5.0);
        let vector2 = Vector3D::new(3.0, 1.0, -4.0);

        assert_approx_eq!(f64, vector1.dot(&vector2), -26.0);

        let cross = vector1.cross(&vector2);
        assert_approx_eq!(f64, cross.x, -5.0);
        assert_approx_eq!(f64, cross.y, 7.0);
        assert_approx_eq!(f64, cross.z, -2.0);
    }

    #[test]
    fn arithmetic() {
        let mut vector = Vector3D::new(1.0, 2.0, 3.0);
        vector += Vector3D::new(0.5, -1.0, 1.0);
        vector -= Vector3D::new(1.0, 1.0, 1.0);
        vector *= 2.0;

        assert_approx_eq!(f64, vector.x, 1.0);
        assert_approx_eq!(f64, vector.y, 0.0);
        assert_approx_eq!(f64, vector.z, 6.0);

        let negated = -vector;
        assert_approx_eq!(f64, negated.z, -6.0);

        let sum = negated + vector * 0.5;
        assert_approx_eq!(f64, sum.x, -0.5);
        assert_approx_eq!(f64, sum.z, -3.0);
    }

    #[test]
    fn add_scaled() {
        let mut vector = Vector3D::new(1.0, 1.0, 1.0);
        vector.add_scaled(&Vector3D::new(2.0, -1.0, 0.5), 2.0);

        assert_approx_eq!(f64, vector.x, 5.0);
        assert_approx_eq!(f64, vector.y, -1.0);
        assert_approx_eq!(f64, vector.z, 2.0);

        vector.zero();
        assert!(vector.is_zero());
    }

    #[test]
    fn outer_and_transform() {
        let a = Vector3D::new(1.0, 2.0, 3.0);
        let b = Vector3D::new(4.0, 5.0, 6.0);
        let tensor = a.outer(&b);

        assert_approx_eq!(f64, tensor[(0, 0)], 4.0);
        assert_approx_eq!(f64, tensor[(0, 2)], 6.0);
        assert_approx_eq!(f64, tensor[(2, 1)], 15.0);

        // (a ⊗ b) · c = a (b · c)
        let mut c = Vector3D::new(1.0, 0.0, -1.0);
        c.transform(&tensor);
        assert_approx_eq!(f64, c.x, -2.0);
        assert_approx_eq!(f64, c.y, -4.0);
        assert_approx_eq!(f64, c.z, -6.0);
    }

    #[test]
    fn from_2d() {
        let vec: Vector3D = [1.5, -2.5].into();
        assert_approx_eq!(f64, vec.x, 1.5);
        assert_approx_eq!(f64, vec.y, -2.5);
        assert_approx_eq!(f64, vec.z, 0.0);
    }

    #[test]
    fn vector_to_pbc() {
        let simbox = SimBox::from([10.0, 10.0, 10.0]);
        let point1 = Vector3D::new(0.01, 5.0, 5.0);
        let point2 = Vector3D::new(9.99, 5.0, 5.0);

        let vec = point1.vector_to(&point2, &simbox);
        assert_approx_eq!(f64, vec.x, -0.02, epsilon = 1e-12);
        assert_approx_eq!(f64, point1.distance(&point2, &simbox), 0.02, epsilon = 1e-12);
    }
}
