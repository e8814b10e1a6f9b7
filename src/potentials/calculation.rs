// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of calculations accumulating properties over the interacting particles.

use itertools::iproduct;
use nalgebra::DMatrix;

use crate::{
    errors::CalculationError,
    potentials::{Arity, ManyBodyPotential, PairPotential, SinglePotential, TripletPotential},
    structures::{
        particle::Particle,
        vector3d::{Tensor3D, Vector3D},
    },
};

/// Accumulates a property over interacting particles.
///
/// The [`PotentialMaster`](crate::potentials::master::PotentialMaster) calls the method
/// corresponding to the arity of each evaluated potential. Methods for arities not reported
/// by [`PotentialCalculation::supports`] are never called by the library.
///
/// Results accumulate over calls. Use [`PotentialCalculation::zero_sum`] to reset them.
pub trait PotentialCalculation {
    /// Name of the calculation used in error messages.
    fn name(&self) -> &str;

    /// Reset the accumulated results.
    fn zero_sum(&mut self);

    /// Can the calculation handle potentials of this arity?
    fn supports(&self, arity: Arity) -> bool;

    /// Check that the calculation can store results for a system of `n_particles` particles.
    ///
    /// Calculations holding per-particle results return `CalculationError::SizeMismatch`
    /// if they were created for a different number of particles.
    fn check_size(&self, _n_particles: usize) -> Result<(), CalculationError> {
        Ok(())
    }

    /// Process particle `i`.
    fn do_single(&mut self, _i: usize, _particle: &Particle, _potential: &dyn SinglePotential) {
        panic!(
            "FATAL NEIGHBORS ERROR | PotentialCalculation::do_single | Calculation `{}` does not support single-particle potentials.",
            self.name()
        )
    }

    /// Process pair of particles `i` and `j`.
    /// `dr` is the nearest-image vector pointing from `i` to `j` and `r2` is its squared length.
    fn do_pair(
        &mut self,
        _i: usize,
        _j: usize,
        _dr: &Vector3D,
        _r2: f64,
        _potential: &dyn PairPotential,
    ) {
        panic!(
            "FATAL NEIGHBORS ERROR | PotentialCalculation::do_pair | Calculation `{}` does not support pair potentials.",
            self.name()
        )
    }

    /// Process triplet of particles with the central particle `i` and the neighbors `j` and `k`.
    fn do_triplet(
        &mut self,
        _i: usize,
        _j: usize,
        _k: usize,
        _dr_ij: &Vector3D,
        _dr_ik: &Vector3D,
        _potential: &dyn TripletPotential,
    ) {
        panic!(
            "FATAL NEIGHBORS ERROR | PotentialCalculation::do_triplet | Calculation `{}` does not support triplet potentials.",
            self.name()
        )
    }

    /// Process the central particle `center` with its `neighbors`.
    /// `drs` are nearest-image vectors pointing from the central particle to each neighbor.
    fn do_many_body(
        &mut self,
        _center: usize,
        _neighbors: &[usize],
        _drs: &[Vector3D],
        _potential: &dyn ManyBodyPotential,
    ) {
        panic!(
            "FATAL NEIGHBORS ERROR | PotentialCalculation::do_many_body | Calculation `{}` does not support many-body potentials.",
            self.name()
        )
    }
}

/// Sums up the potential energy.
///
/// ## Example
/// ```
/// # use neighbors_rs::prelude::*;
/// #
/// let energy = EnergySum::new();
/// assert!(energy.supports(Arity::ManyBody));
/// assert_eq!(energy.sum(), 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnergySum {
    sum: f64,
}

impl EnergySum {
    pub fn new() -> Self {
        EnergySum::default()
    }

    /// Get the accumulated energy.
    pub fn sum(&self) -> f64 {
        self.sum
    }
}

impl PotentialCalculation for EnergySum {
    fn name(&self) -> &str {
        "EnergySum"
    }

    fn zero_sum(&mut self) {
        self.sum = 0.0;
    }

    fn supports(&self, _arity: Arity) -> bool {
        true
    }

    fn do_single(&mut self, _i: usize, particle: &Particle, potential: &dyn SinglePotential) {
        self.sum += potential.energy(particle);
    }

    fn do_pair(&mut self, _i: usize, _j: usize, _dr: &Vector3D, r2: f64, potential: &dyn PairPotential) {
        self.sum += potential.u(r2);
    }

    fn do_triplet(
        &mut self,
        _i: usize,
        _j: usize,
        _k: usize,
        dr_ij: &Vector3D,
        dr_ik: &Vector3D,
        potential: &dyn TripletPotential,
    ) {
        self.sum += potential.energy(dr_ij, dr_ik);
    }

    fn do_many_body(
        &mut self,
        _center: usize,
        _neighbors: &[usize],
        drs: &[Vector3D],
        potential: &dyn ManyBodyPotential,
    ) {
        self.sum += potential.energy(drs);
    }
}

/// Sums up the forces acting on each particle.
#[derive(Debug, Clone)]
pub struct ForceSum {
    forces: Vec<Vector3D>,
    /// Scratch buffer for the gradients of many-body potentials.
    gradients: Vec<Vector3D>,
}

impl ForceSum {
    /// Create a new force accumulator for `n_particles` particles.
    pub fn new(n_particles: usize) -> Self {
        ForceSum {
            forces: vec![Vector3D::default(); n_particles],
            gradients: Vec::new(),
        }
    }

    /// Get the accumulated forces. Forces are indexed by particle indices.
    pub fn forces(&self) -> &[Vector3D] {
        &self.forces
    }

    /// Get the force acting on the target particle.
    pub fn force(&self, index: usize) -> Option<&Vector3D> {
        self.forces.get(index)
    }

    /// Change the number of particles. All forces are zeroed.
    pub fn resize(&mut self, n_particles: usize) {
        self.forces.clear();
        self.forces.resize(n_particles, Vector3D::default());
    }
}

/// Error if the number of per-particle slots differs from the number of particles.
fn check_slots(name: &str, size: usize, n_particles: usize) -> Result<(), CalculationError> {
    if size != n_particles {
        Err(CalculationError::SizeMismatch {
            calculation: name.to_owned(),
            size,
            expected: n_particles,
        })
    } else {
        Ok(())
    }
}

impl PotentialCalculation for ForceSum {
    fn name(&self) -> &str {
        "ForceSum"
    }

    fn zero_sum(&mut self) {
        self.forces.iter_mut().for_each(|f| f.zero());
    }

    fn supports(&self, _arity: Arity) -> bool {
        true
    }

    fn check_size(&self, n_particles: usize) -> Result<(), CalculationError> {
        check_slots(self.name(), self.forces.len(), n_particles)
    }

    fn do_single(&mut self, i: usize, particle: &Particle, potential: &dyn SinglePotential) {
        self.forces[i] -= potential.gradient(particle);
    }

    #[inline]
    fn do_pair(&mut self, i: usize, j: usize, dr: &Vector3D, r2: f64, potential: &dyn PairPotential) {
        // coincident particles have no direction to push along
        if r2 == 0.0 {
            return;
        }

        // gradient with respect to the position of j
        let gradient = *dr * (potential.du(r2) / r2);
        self.forces[i] += gradient;
        self.forces[j] -= gradient;
    }

    fn do_triplet(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        dr_ij: &Vector3D,
        dr_ik: &Vector3D,
        potential: &dyn TripletPotential,
    ) {
        let [gi, gj, gk] = potential.gradient(dr_ij, dr_ik);
        self.forces[i] -= gi;
        self.forces[j] -= gj;
        self.forces[k] -= gk;
    }

    fn do_many_body(
        &mut self,
        center: usize,
        neighbors: &[usize],
        drs: &[Vector3D],
        potential: &dyn ManyBodyPotential,
    ) {
        self.gradients.clear();
        self.gradients.resize(drs.len(), Vector3D::default());
        potential.gradient(drs, &mut self.gradients);

        for (&n, gradient) in neighbors.iter().zip(self.gradients.iter()) {
            self.forces[n] -= *gradient;
            self.forces[center] += *gradient;
        }
    }
}

/// Sums up the virial, i.e. the sum of `dr · ∇U` over all interactions,
/// where `dr` are the separation vectors between the interacting particles.
///
/// For pair potentials, the contribution of each pair is `r dU/dr`.
/// Single-particle potentials are not supported.
#[derive(Debug, Clone, Default)]
pub struct VirialSum {
    sum: f64,
    gradients: Vec<Vector3D>,
}

impl VirialSum {
    pub fn new() -> Self {
        VirialSum::default()
    }

    /// Get the accumulated virial.
    pub fn sum(&self) -> f64 {
        self.sum
    }
}

impl PotentialCalculation for VirialSum {
    fn name(&self) -> &str {
        "VirialSum"
    }

    fn zero_sum(&mut self) {
        self.sum = 0.0;
    }

    fn supports(&self, arity: Arity) -> bool {
        arity != Arity::Single
    }

    fn do_pair(&mut self, _i: usize, _j: usize, _dr: &Vector3D, r2: f64, potential: &dyn PairPotential) {
        self.sum += potential.du(r2);
    }

    fn do_triplet(
        &mut self,
        _i: usize,
        _j: usize,
        _k: usize,
        dr_ij: &Vector3D,
        dr_ik: &Vector3D,
        potential: &dyn TripletPotential,
    ) {
        let [_, gj, gk] = potential.gradient(dr_ij, dr_ik);
        self.sum += dr_ij.dot(&gj) + dr_ik.dot(&gk);
    }

    fn do_many_body(
        &mut self,
        _center: usize,
        _neighbors: &[usize],
        drs: &[Vector3D],
        potential: &dyn ManyBodyPotential,
    ) {
        self.gradients.clear();
        self.gradients.resize(drs.len(), Vector3D::default());
        potential.gradient(drs, &mut self.gradients);

        self.sum += drs
            .iter()
            .zip(self.gradients.iter())
            .map(|(dr, g)| dr.dot(g))
            .sum::<f64>();
    }
}

/// Sums up the second derivatives of the energy with respect to the particle positions.
///
/// The result is a dense `3N × 3N` matrix where the block `(i, j)` contains
/// the derivatives with respect to the coordinates of particles `i` and `j`.
/// Only single-particle and pair potentials are supported.
#[derive(Debug, Clone)]
pub struct SecondDerivativeSum {
    hessian: DMatrix<f64>,
}

impl SecondDerivativeSum {
    /// Create a new accumulator for `n_particles` particles.
    pub fn new(n_particles: usize) -> Self {
        SecondDerivativeSum {
            hessian: DMatrix::zeros(3 * n_particles, 3 * n_particles),
        }
    }

    /// Number of particles the matrix was created for.
    pub fn n_particles(&self) -> usize {
        self.hessian.nrows() / 3
    }

    /// Get the accumulated matrix of second derivatives.
    pub fn hessian(&self) -> &DMatrix<f64> {
        &self.hessian
    }

    /// Get the `3 × 3` block of second derivatives with respect to the coordinates of particles `i` and `j`.
    pub fn block(&self, i: usize, j: usize) -> Tensor3D {
        Tensor3D::from_fn(|r, c| self.hessian[(3 * i + r, 3 * j + c)])
    }

    #[inline(always)]
    fn add_block(&mut self, i: usize, j: usize, block: &Tensor3D, sign: f64) {
        for (r, c) in iproduct!(0..3, 0..3) {
            self.hessian[(3 * i + r, 3 * j + c)] += sign * block[(r, c)];
        }
    }
}

impl PotentialCalculation for SecondDerivativeSum {
    fn name(&self) -> &str {
        "SecondDerivativeSum"
    }

    fn zero_sum(&mut self) {
        self.hessian.fill(0.0);
    }

    fn supports(&self, arity: Arity) -> bool {
        matches!(arity, Arity::Single | Arity::Pair)
    }

    fn check_size(&self, n_particles: usize) -> Result<(), CalculationError> {
        check_slots(self.name(), self.n_particles(), n_particles)
    }

    fn do_single(&mut self, i: usize, particle: &Particle, potential: &dyn SinglePotential) {
        let block = potential.hessian(particle);
        self.add_block(i, i, &block, 1.0);
    }

    fn do_pair(&mut self, i: usize, j: usize, dr: &Vector3D, r2: f64, potential: &dyn PairPotential) {
        if r2 == 0.0 {
            return;
        }

        let du = potential.du(r2);
        let d2u = potential.d2u(r2);

        let block = dr.outer(dr) * ((d2u - du) / (r2 * r2)) + Tensor3D::identity() * (du / r2);

        self.add_block(i, i, &block, 1.0);
        self.add_block(j, j, &block, 1.0);
        self.add_block(i, j, &block, -1.0);
        self.add_block(j, i, &block, -1.0);
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
