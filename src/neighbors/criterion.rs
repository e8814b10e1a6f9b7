// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of the criterion deciding which particles are neighbors
//! and when the neighbor lists become outdated.

use crate::{
    errors::NeighborError,
    neighbors::NeighborSettings,
    structures::{particle::Particle, simbox::SimBox, vector3d::Vector3D},
};

/// Decides which pairs of particles are neighbors and tracks particle displacements
/// since the last rebuild of the neighbor lists.
pub trait NeighborCriterion {
    /// Apply new neighbor settings. On error, the criterion must stay unchanged.
    fn configure(&mut self, settings: &NeighborSettings) -> Result<(), NeighborError>;

    /// Resize the storage of reference positions for `n` particles.
    fn set_n_particles(&mut self, n: usize);

    /// Should particles `i` and `j` be stored as neighbors?
    fn accept(&self, i: usize, j: usize, particles: &[Particle], simbox: &SimBox) -> bool;

    /// Did particle `i` move far enough from its reference position that its neighbors are outdated?
    fn need_update(&mut self, i: usize, position: &Vector3D, simbox: &SimBox) -> bool;

    /// Store `position` as the reference position of particle `i`.
    fn reset(&mut self, i: usize, position: &Vector3D);

    /// Store current positions of all particles as reference positions
    /// and forget the displacements observed so far.
    fn reset_all(&mut self, particles: &[Particle]);

    /// Did any particle move far enough since the last `reset_all` that
    /// interacting pairs may have been missed?
    fn is_unsafe(&self) -> bool;

    /// Largest squared displacement observed since the last `reset_all`.
    fn max_displacement2(&self) -> f64;

    /// Distance within which particles are stored as neighbors.
    fn neighbor_range(&self) -> f64;

    /// Largest distance at which particles interact.
    fn interaction_range(&self) -> f64;
}

/// Distance-based neighbor criterion with a safety margin.
///
/// Two particles are neighbors if their nearest-image distance is smaller than the neighbor range.
/// Particle's neighbors are outdated once it travels further than
/// `(neighbor_range - interaction_range) * safety_factor` from its reference position.
/// All comparisons are performed on squared distances.
///
/// ## Example
/// ```
/// # use neighbors_rs::prelude::*;
/// # use float_cmp::assert_approx_eq;
/// #
/// let settings = NeighborSettings::default()
///     .with_interaction_range(1.0)
///     .with_neighbor_range(1.3)
///     .with_safety_factor(0.4);
///
/// let criterion = CriterionSimple::new(&settings).unwrap();
/// // ((1.3 - 1.0) * 0.4)^2
/// assert_approx_eq!(f64, criterion.displacement_limit2(), 0.0144, epsilon = 1e-12);
/// assert_approx_eq!(f64, criterion.neighbor_range(), 1.3, epsilon = 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CriterionSimple {
    interaction_range: f64,
    /// Square of the neighbor range.
    neighbor_range2: f64,
    safety_factor: f64,
    /// Squared displacement after which a particle's neighbors are outdated.
    displacement_limit2: f64,
    /// Squared displacement after which interacting pairs may have been missed.
    r2_max_safe: f64,
    /// Position of each particle at the last reset.
    references: Vec<Vector3D>,
    /// Largest squared displacement observed since the last `reset_all`.
    max_r2: f64,
}

impl CriterionSimple {
    /// Create a new criterion from the provided settings.
    ///
    /// ## Returns
    /// `NeighborError` if the settings are invalid.
    pub fn new(settings: &NeighborSettings) -> Result<Self, NeighborError> {
        let mut criterion = CriterionSimple {
            interaction_range: 0.0,
            neighbor_range2: 0.0,
            safety_factor: 0.0,
            displacement_limit2: 0.0,
            r2_max_safe: 0.0,
            references: Vec::new(),
            max_r2: 0.0,
        };

        criterion.configure(settings)?;
        Ok(criterion)
    }

    /// Set the interaction range. The neighbor range is kept.
    pub fn set_interaction_range(&mut self, range: f64) -> Result<(), NeighborError> {
        let settings = self.settings().with_interaction_range(range);
        self.configure(&settings)
    }

    /// Set the neighbor range. The interaction range is kept.
    pub fn set_neighbor_range(&mut self, range: f64) -> Result<(), NeighborError> {
        let settings = self.settings().with_neighbor_range(range);
        self.configure(&settings)
    }

    /// Set the safety factor.
    pub fn set_safety_factor(&mut self, factor: f64) -> Result<(), NeighborError> {
        let settings = self.settings().with_safety_factor(factor);
        self.configure(&settings)
    }

    /// Get the current settings of the criterion.
    pub fn settings(&self) -> NeighborSettings {
        NeighborSettings::default()
            .with_interaction_range(self.interaction_range)
            .with_neighbor_range(self.neighbor_range())
            .with_safety_factor(self.safety_factor)
    }

    /// Get the safety factor.
    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// Squared displacement after which a particle's neighbors are outdated.
    pub fn displacement_limit2(&self) -> f64 {
        self.displacement_limit2
    }

    /// Squared displacement after which interacting pairs may have been missed.
    pub fn r2_max_safe(&self) -> f64 {
        self.r2_max_safe
    }

    /// Re-derive displacement bounds from the ranges.
    fn derive_bounds(&mut self) {
        let skin = self.neighbor_range2.sqrt() - self.interaction_range;
        self.displacement_limit2 = (skin * self.safety_factor).powi(2);
        self.r2_max_safe = self.displacement_limit2 / (4.0 * self.safety_factor * self.safety_factor);
    }
}

impl NeighborCriterion for CriterionSimple {
    fn configure(&mut self, settings: &NeighborSettings) -> Result<(), NeighborError> {
        settings.validate()?;

        self.interaction_range = settings.interaction_range();
        self.neighbor_range2 = settings.neighbor_range() * settings.neighbor_range();
        self.safety_factor = settings.safety_factor();
        self.derive_bounds();

        Ok(())
    }

    fn set_n_particles(&mut self, n: usize) {
        self.references.resize(n, Vector3D::default());
    }

    #[inline]
    fn accept(&self, i: usize, j: usize, particles: &[Particle], simbox: &SimBox) -> bool {
        let r2 = particles[i]
            .get_position()
            .vector_to(particles[j].get_position(), simbox)
            .len2();

        r2 < self.neighbor_range2
    }

    #[inline]
    fn need_update(&mut self, i: usize, position: &Vector3D, simbox: &SimBox) -> bool {
        let r2 = self.references[i].vector_to(position, simbox).len2();
        if r2 > self.max_r2 {
            self.max_r2 = r2;
        }

        r2 > self.displacement_limit2
    }

    #[inline]
    fn reset(&mut self, i: usize, position: &Vector3D) {
        self.references[i] = *position;
    }

    fn reset_all(&mut self, particles: &[Particle]) {
        self.set_n_particles(particles.len());
        for (reference, particle) in self.references.iter_mut().zip(particles.iter()) {
            *reference = *particle.get_position();
        }

        self.max_r2 = 0.0;
    }

    #[inline]
    fn is_unsafe(&self) -> bool {
        self.max_r2 > self.r2_max_safe
    }

    fn max_displacement2(&self) -> f64 {
        self.max_r2
    }

    fn neighbor_range(&self) -> f64 {
        self.neighbor_range2.sqrt()
    }

    fn interaction_range(&self) -> f64 {
        self.interaction_range
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
