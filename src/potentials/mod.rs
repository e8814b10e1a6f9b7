// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Capability traits of potentials and their evaluation over neighbor lists.
//!
//! Functional forms of the potentials are not provided by the library.
//! Implement one of [`SinglePotential`], [`PairPotential`], [`TripletPotential`],
//! or [`ManyBodyPotential`] and register it in a [`PotentialMaster`](master::PotentialMaster)
//! wrapped in the corresponding variant of [`Potential`].

pub mod calculation;
pub mod master;

use std::fmt;

use crate::structures::{
    particle::Particle,
    vector3d::{Tensor3D, Vector3D},
};

/// Number of particles a potential acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Single,
    Pair,
    Triplet,
    ManyBody,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arity::Single => "single-particle",
            Arity::Pair => "pair",
            Arity::Triplet => "triplet",
            Arity::ManyBody => "many-body",
        };

        write!(f, "{}", name)
    }
}

/// Potential acting on individual particles, e.g., an external field.
pub trait SinglePotential {
    /// Energy of the particle.
    fn energy(&self, particle: &Particle) -> f64;

    /// Gradient of the energy with respect to the position of the particle.
    fn gradient(&self, particle: &Particle) -> Vector3D;

    /// Second derivatives of the energy with respect to the position of the particle.
    fn hessian(&self, particle: &Particle) -> Tensor3D;
}

/// Spherically symmetric potential acting between two particles.
///
/// All functions take the squared distance between the particles.
/// Pairs further apart than `cutoff` are never evaluated.
///
/// ## Example
/// ```
/// # use neighbors_rs::prelude::*;
/// #
/// /// Harmonic repulsion between overlapping disks.
/// struct SoftDisk {
///     diameter: f64,
/// }
///
/// impl PairPotential for SoftDisk {
///     fn cutoff(&self) -> f64 {
///         self.diameter
///     }
///
///     fn u(&self, r2: f64) -> f64 {
///         0.5 * (self.diameter - r2.sqrt()).powi(2)
///     }
///
///     fn du(&self, r2: f64) -> f64 {
///         let r = r2.sqrt();
///         -r * (self.diameter - r)
///     }
///
///     fn d2u(&self, r2: f64) -> f64 {
///         r2
///     }
/// }
///
/// let potential = SoftDisk { diameter: 1.0 };
/// assert_eq!(potential.u(0.25), 0.125);
/// ```
pub trait PairPotential {
    /// Distance beyond which the potential is zero.
    fn cutoff(&self) -> f64;

    /// Energy at squared distance `r2`.
    fn u(&self, r2: f64) -> f64;

    /// Derivative of the energy multiplied by the distance, `r dU/dr`, at squared distance `r2`.
    fn du(&self, r2: f64) -> f64;

    /// Second derivative of the energy multiplied by the squared distance, `r^2 d^2U/dr^2`, at squared distance `r2`.
    fn d2u(&self, r2: f64) -> f64;
}

/// Potential acting on a central particle `i` and two of its neighbors `j` and `k`.
///
/// Separation vectors are nearest-image vectors pointing from the central particle to the neighbors.
pub trait TripletPotential {
    /// Distance from the central particle beyond which neighbors do not contribute.
    fn cutoff(&self) -> f64;

    /// Energy of the triplet.
    fn energy(&self, dr_ij: &Vector3D, dr_ik: &Vector3D) -> f64;

    /// Gradient of the energy with respect to the positions of `i`, `j`, and `k` (in this order).
    fn gradient(&self, dr_ij: &Vector3D, dr_ik: &Vector3D) -> [Vector3D; 3];
}

/// Potential acting on a central particle and all of its neighbors within the cutoff.
///
/// Separation vectors are nearest-image vectors pointing from the central particle to the neighbors.
pub trait ManyBodyPotential {
    /// Distance from the central particle beyond which neighbors do not contribute.
    fn cutoff(&self) -> f64;

    /// Energy of the central particle in its environment.
    fn energy(&self, drs: &[Vector3D]) -> f64;

    /// Gradient of the energy with respect to the position of each neighbor.
    /// `gradients` has the same length as `drs` and is zeroed before the call.
    /// The gradient with respect to the central particle is minus the sum of `gradients`.
    fn gradient(&self, drs: &[Vector3D], gradients: &mut [Vector3D]);
}

/// Potential of any arity.
pub enum Potential {
    Single(Box<dyn SinglePotential>),
    Pair(Box<dyn PairPotential>),
    Triplet(Box<dyn TripletPotential>),
    ManyBody(Box<dyn ManyBodyPotential>),
}

impl Potential {
    /// Get the arity of the potential.
    pub fn arity(&self) -> Arity {
        match self {
            Potential::Single(_) => Arity::Single,
            Potential::Pair(_) => Arity::Pair,
            Potential::Triplet(_) => Arity::Triplet,
            Potential::ManyBody(_) => Arity::ManyBody,
        }
    }

    /// Get the cutoff of the potential. `None` for single-particle potentials.
    pub fn cutoff(&self) -> Option<f64> {
        match self {
            Potential::Single(_) => None,
            Potential::Pair(x) => Some(x.cutoff()),
            Potential::Triplet(x) => Some(x.cutoff()),
            Potential::ManyBody(x) => Some(x.cutoff()),
        }
    }
}

impl fmt::Debug for Potential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Potential")
            .field("arity", &self.arity())
            .field("cutoff", &self.cutoff())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::potentials::{HarmonicField, LennardJones};

    #[test]
    fn arity_and_cutoff() {
        let pair = Potential::Pair(Box::new(LennardJones::new(1.0, 0.3, 0.9)));
        assert_eq!(pair.arity(), Arity::Pair);
        assert_eq!(pair.cutoff(), Some(0.9));

        let single = Potential::Single(Box::new(HarmonicField::new(2.0, Vector3D::default())));
        assert_eq!(single.arity(), Arity::Single);
        assert_eq!(single.cutoff(), None);
    }

    #[test]
    fn arity_display() {
        assert_eq!(Arity::ManyBody.to_string(), "many-body");
        assert_eq!(Arity::Single.to_string(), "single-particle");
    }
}
