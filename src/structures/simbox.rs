// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of the SimBox structure and its methods.

use crate::{errors::SimBoxError, structures::vector3d::Vector3D};

/// Orthogonal simulation box defining the boundary of the simulated region.
///
/// Each axis may be periodic or not. Two-dimensional boxes are represented
/// by setting the z-dimension to zero; the z-axis is then never periodic.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct SimBox {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Periodicity along the x, y, and z axis.
    #[cfg_attr(feature = "serde", serde(default = "all_periodic"))]
    periodic: [bool; 3],
}

#[cfg(feature = "serde")]
fn all_periodic() -> [bool; 3] {
    [true, true, true]
}

/// Function replicating the behavior of Python '%'.
#[inline]
fn floor_mod(x: f64, y: f64) -> f64 {
    (x % y + y) % y
}

impl From<[f64; 3]> for SimBox {
    /// Convert 3-member array to a fully periodic SimBox.
    fn from(arr: [f64; 3]) -> Self {
        SimBox {
            x: arr[0],
            y: arr[1],
            z: arr[2],
            periodic: [true, true, true],
        }
    }
}

impl From<[f64; 2]> for SimBox {
    /// Convert 2-member array to a fully periodic two-dimensional SimBox.
    fn from(arr: [f64; 2]) -> Self {
        SimBox::new_2d(arr[0], arr[1])
    }
}

impl SimBox {
    /// Create a fully periodic cubic simulation box.
    pub fn cubic(edge: f64) -> Self {
        SimBox::from([edge, edge, edge])
    }

    /// Create a fully periodic two-dimensional simulation box.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// #
    /// let simbox = SimBox::new_2d(10.0, 10.0);
    /// assert!(simbox.is_2d());
    /// assert_eq!(simbox.periodicity(), [true, true, false]);
    /// ```
    pub fn new_2d(x: f64, y: f64) -> Self {
        SimBox {
            x,
            y,
            z: 0.0,
            periodic: [true, true, false],
        }
    }

    /// Set periodicity of the individual axes.
    /// Periodicity along z is ignored for two-dimensional boxes.
    pub fn with_periodicity(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        if self.is_2d() {
            self.periodic[2] = false;
        }
        self
    }

    /// Get the periodicity of the x, y, and z axis.
    pub fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }

    /// Returns `true` if the box is two-dimensional.
    pub fn is_2d(&self) -> bool {
        self.z == 0.0
    }

    /// Number of spatial dimensions of the box (2 or 3).
    pub fn n_dimensions(&self) -> usize {
        if self.is_2d() {
            2
        } else {
            3
        }
    }

    /// Get the edge lengths of the simulation box.
    pub fn dimensions(&self) -> Vector3D {
        Vector3D::new(self.x, self.y, self.z)
    }

    /// Change the edge lengths of the simulation box (e.g., during a volume move).
    ///
    /// ## Notes
    /// - Changing the z-dimension from or to zero switches the box between 2D and 3D
    ///   while keeping the periodicity of x and y.
    pub fn set_dimensions(&mut self, dimensions: Vector3D) {
        let was_2d = self.is_2d();
        self.x = dimensions.x;
        self.y = dimensions.y;
        self.z = dimensions.z;

        if self.is_2d() {
            self.periodic[2] = false;
        } else if was_2d {
            self.periodic[2] = true;
        }
    }

    /// Volume of the box. Area for two-dimensional boxes.
    pub fn volume(&self) -> f64 {
        if self.is_2d() {
            self.x * self.y
        } else {
            self.x * self.y * self.z
        }
    }

    /// Check whether all dimensions of the simulation box are zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Check that the simulation box can be used for neighbor searching.
    ///
    /// ## Returns
    /// `Ok` if all active dimensions are positive finite numbers. Otherwise `SimBoxError`.
    pub fn check(&self) -> Result<(), SimBoxError> {
        if self.is_zero() {
            return Err(SimBoxError::AllDimensionsZero);
        }

        let dimensions = [('x', self.x), ('y', self.y), ('z', self.z)];
        for &(name, len) in dimensions.iter().take(self.n_dimensions()) {
            if !len.is_finite() || len <= 0.0 {
                return Err(SimBoxError::InvalidDimension(name, len));
            }
        }

        Ok(())
    }

    /// Convert a raw separation vector into its minimum-image equivalent.
    /// Only periodic axes are modified.
    ///
    /// ## Notes
    /// - Always uses the current edge lengths of the box.
    /// - If a particle and its periodic image are exactly equidistant, either of the two
    ///   shortest vectors may be returned.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let simbox = SimBox::new_2d(10.0, 10.0);
    /// let mut dr = Vector3D::new(9.98, -6.0, 0.0);
    /// simbox.nearest_image(&mut dr);
    ///
    /// assert_approx_eq!(f64, dr.x, -0.02, epsilon = 1e-12);
    /// assert_approx_eq!(f64, dr.y, 4.0, epsilon = 1e-12);
    /// ```
    #[inline]
    pub fn nearest_image(&self, dr: &mut Vector3D) {
        if self.periodic[0] {
            dr.x = SimBox::min_image(dr.x, self.x);
        }

        if self.periodic[1] {
            dr.y = SimBox::min_image(dr.y, self.y);
        }

        if self.periodic[2] && !self.is_2d() {
            dr.z = SimBox::min_image(dr.z, self.z);
        }
    }

    /// Wrap a position so that it fits into the simulation box along all periodic axes.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let mut point = Vector3D::new(-0.5, 2.0, 4.2);
    /// let simbox = SimBox::from([4.0, 4.0, 4.0]);
    ///
    /// simbox.wrap(&mut point);
    /// assert_approx_eq!(f64, point.x, 3.5, epsilon = 0.00001);
    /// assert_approx_eq!(f64, point.y, 2.0, epsilon = 0.00001);
    /// assert_approx_eq!(f64, point.z, 0.2, epsilon = 0.00001);
    /// ```
    #[inline]
    pub fn wrap(&self, position: &mut Vector3D) {
        if self.periodic[0] {
            position.x = SimBox::wrap_coordinate(position.x, self.x);
        }

        if self.periodic[1] {
            position.y = SimBox::wrap_coordinate(position.y, self.y);
        }

        if self.periodic[2] && !self.is_2d() {
            position.z = SimBox::wrap_coordinate(position.z, self.z);
        }
    }

    /// Wrap a single coordinate into a simulation box.
    ///
    /// ## Panics
    /// Panics if `box_len` is exactly equal to 0.
    #[inline]
    fn wrap_coordinate(coor: f64, box_len: f64) -> f64 {
        if box_len == 0.0 {
            panic!("FATAL NEIGHBORS ERROR | SimBox::wrap_coordinate | Box len should not be zero.")
        }

        coor - box_len * (coor / box_len).floor()
    }

    /// Takes a one-dimensional separation and returns it modified according to the minimum image convention.
    ///
    /// ## Panics
    /// Panics if `box_len` is exactly equal to zero.
    #[inline]
    fn min_image(dx: f64, box_len: f64) -> f64 {
        if box_len == 0.0 {
            panic!("FATAL NEIGHBORS ERROR | SimBox::min_image | Box len should not be zero.")
        }

        let half_box = box_len / 2.0;
        floor_mod(dx + half_box, box_len) - half_box
    }
}

/// Checks whether the simulation box exists and is valid for neighbor searching.
pub(crate) fn simbox_check(simbox: Option<&SimBox>) -> Result<&SimBox, SimBoxError> {
    match simbox {
        Some(x) => x.check().map(|_| x),
        None => Err(SimBoxError::DoesNotExist),
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/


#[cfg(test)]
#[cfg(feature = "serde")]
mod serde_tests {
    use super::*;

    #[test]
    fn simbox_yaml_default_periodicity() {
        let simbox: SimBox = serde_yaml::from_str("x: 10.0\ny: 8.0\nz: 0.0\n").unwrap();
        assert!(simbox.is_2d());
        assert_eq!(simbox.periodicity(), [true, true, true]);

        let string = serde_yaml::to_string(&SimBox::new_2d(10.0, 8.0)).unwrap();
        let back: SimBox = serde_yaml::from_str(&string).unwrap();
        assert_eq!(back, SimBox::new_2d(10.0, 8.0));
    }
}
