// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of the NeighborManager maintaining neighbor lists of a system.

use crate::{
    errors::{CalculationError, NeighborError},
    neighbors::{
        criterion::{CriterionSimple, NeighborCriterion},
        NeighborSettings, UpdateStatus,
    },
    potentials::{calculation::PotentialCalculation, PairPotential},
    structures::{
        cellgrid::{CellGrid, SpatialIndex},
        simbox::{simbox_check, SimBox},
    },
    system::System,
};

/// Maintains neighbor lists of all particles of a [`System`].
///
/// The lists are built using a [`CellGrid`] with cells at least as large as the neighbor range.
/// On every step, [`NeighborManager::update`] checks the displacements of all particles
/// and rebuilds the lists once any particle moved too far.
///
/// Particles are referred to by their indices in the `System`. The manager has to be
/// attached to a `System` using [`NeighborManager::attach`] before use and all
/// subsequent calls must provide the same `System` (or a `System` with the same number of particles).
///
/// ## Example
/// ```
/// # use neighbors_rs::prelude::*;
/// #
/// let mut system = System::new(
///     "Example",
///     vec![
///         Particle::new([1.0, 1.0].into()),
///         Particle::new([1.5, 1.0].into()),
///         Particle::new([5.0, 5.0].into()),
///     ],
///     Some(SimBox::new_2d(10.0, 10.0)),
/// );
///
/// let mut manager = NeighborManager::new(NeighborSettings::default()).unwrap();
/// manager.attach(&system).unwrap();
/// assert_eq!(manager.neighbors_of(0), &[1]);
/// assert!(manager.neighbors_of(2).is_empty());
///
/// // small move: lists stay valid
/// system.particle_translate(2, &Vector3D::new(0.05, 0.0, 0.0));
/// let status = manager.update(&system).unwrap();
/// assert!(!status.rebuilt());
/// ```
#[derive(Debug, Clone)]
pub struct NeighborManager<C: NeighborCriterion = CriterionSimple> {
    settings: NeighborSettings,
    criterion: C,
    /// Cell grid of the attached system. `None` if not attached.
    grid: Option<CellGrid>,
    /// Neighbors of each particle. Lists are symmetric.
    neighbors: Vec<Vec<usize>>,
    /// Lists have to be rebuilt before they can be used.
    invalidated: bool,
    /// Grid has to be constructed anew before the next build.
    regrid: bool,
    n_rebuilds: usize,
    n_pairs: usize,
}

impl NeighborManager<CriterionSimple> {
    /// Create a new neighbor manager using the distance-based [`CriterionSimple`].
    ///
    /// ## Returns
    /// `NeighborError` if the settings are invalid.
    pub fn new(settings: NeighborSettings) -> Result<Self, NeighborError> {
        let criterion = CriterionSimple::new(&settings)?;
        Ok(Self::construct(settings, criterion))
    }
}

impl<C: NeighborCriterion> NeighborManager<C> {
    /// Create a new neighbor manager using a custom neighbor criterion.
    /// The criterion is configured using the provided settings.
    pub fn with_criterion(settings: NeighborSettings, mut criterion: C) -> Result<Self, NeighborError> {
        criterion.configure(&settings)?;
        Ok(Self::construct(settings, criterion))
    }

    fn construct(settings: NeighborSettings, criterion: C) -> Self {
        NeighborManager {
            settings,
            criterion,
            grid: None,
            neighbors: Vec::new(),
            invalidated: true,
            regrid: true,
            n_rebuilds: 0,
            n_pairs: 0,
        }
    }

    /// Attach the manager to a system and build the neighbor lists.
    /// Any previous state of the manager is discarded.
    ///
    /// ## Returns
    /// - `NeighborError::SimBoxError` if the system has no valid simulation box.
    /// - `NeighborError::CellGridError` if the system contains particles with invalid positions.
    pub fn attach(&mut self, system: &System) -> Result<(), NeighborError> {
        let simbox = simbox_check(system.get_box())?;
        let n_particles = system.get_n_particles();

        let grid = CellGrid::new(simbox, self.settings.neighbor_range(), n_particles)?;
        self.grid = Some(grid);
        self.regrid = false;
        self.criterion.set_n_particles(n_particles);
        self.neighbors = vec![Vec::new(); n_particles];
        self.n_rebuilds = 0;

        self.build(system)
    }

    /// Is the manager attached to a system?
    pub fn is_attached(&self) -> bool {
        self.grid.is_some()
    }

    /// Number of particles of the attached system. Zero if not attached.
    pub fn n_particles(&self) -> usize {
        self.neighbors.len()
    }

    /// Rebuild the neighbor lists from scratch.
    ///
    /// Every unordered pair of particles located in the same or adjacent cells is tested exactly once.
    /// Reference positions of all particles are reset.
    ///
    /// ## Returns
    /// - `NeighborError::NotAttached` if the manager is not attached.
    /// - `NeighborError::SystemMismatch` if the system has a different number of particles.
    /// - `NeighborError::SimBoxError` if the simulation box of the system is invalid.
    pub fn build(&mut self, system: &System) -> Result<(), NeighborError> {
        let simbox = self.check_attached(system)?;
        let particles = system.get_particles();

        let grid_box_changed = self
            .grid
            .as_ref()
            .is_some_and(|grid| grid.simbox() != simbox);

        if self.regrid || grid_box_changed {
            self.grid = Some(CellGrid::new(
                simbox,
                self.settings.neighbor_range(),
                particles.len(),
            )?);
            self.regrid = false;
        }

        let grid = self.grid.as_mut().ok_or(NeighborError::NotAttached)?;
        grid.rebuild_all(particles)?;

        self.neighbors.iter_mut().for_each(|list| list.clear());
        let mut n_pairs = 0;

        for i in 0..particles.len() {
            for cell in grid.cells_near(i) {
                for &j in cell {
                    if j > i && self.criterion.accept(i, j, particles, simbox) {
                        self.neighbors[i].push(j);
                        self.neighbors[j].push(i);
                        n_pairs += 1;
                    }
                }
            }
        }

        self.criterion.reset_all(particles);
        self.n_pairs = n_pairs;
        self.n_rebuilds += 1;
        self.invalidated = false;

        log::debug!(
            "Rebuilt neighbor lists of system '{}': {} particles, {} pairs.",
            system.get_name(),
            particles.len(),
            n_pairs
        );

        Ok(())
    }

    /// Check the validity of the neighbor lists and rebuild them if needed.
    /// Should be called on every step of the simulation before potentials are evaluated.
    ///
    /// Lists are rebuilt if any particle moved further than the displacement limit,
    /// if the simulation box changed, or if the settings of the manager changed.
    ///
    /// ## Returns
    /// `UpdateStatus` describing whether the lists were rebuilt and whether some particle moved
    /// so far since the previous rebuild that interacting pairs may have been missed.
    /// `NeighborError` if the manager is not attached or the system does not match.
    ///
    /// ## Notes
    /// - Rebuilds forced by a box or settings change never report an unsafe displacement.
    pub fn update(&mut self, system: &System) -> Result<UpdateStatus, NeighborError> {
        let simbox = self.check_attached(system)?;

        let box_changed = self
            .grid
            .as_ref()
            .is_some_and(|grid| grid.simbox() != simbox);

        if self.invalidated || self.regrid || box_changed {
            self.build(system)?;
            return Ok(UpdateStatus::new(true, false, 0.0));
        }

        // every particle has to be checked so that the largest displacement is recorded
        let mut stale = false;
        for (i, particle) in system.get_particles().iter().enumerate() {
            stale |= self.criterion.need_update(i, particle.get_position(), simbox);
        }

        if !stale {
            return Ok(UpdateStatus::new(
                false,
                false,
                self.criterion.max_displacement2(),
            ));
        }

        let is_unsafe = self.criterion.is_unsafe();
        let max_displacement2 = self.criterion.max_displacement2();
        if is_unsafe {
            log::warn!(
                "Largest displacement since the last rebuild of neighbor lists ({:.4}) exceeds the safe limit. Some interacting pairs may have been missed.",
                max_displacement2.sqrt()
            );
        }

        self.build(system)?;
        Ok(UpdateStatus::new(true, is_unsafe, max_displacement2))
    }

    /// Get the neighbors of particle with the target index.
    ///
    /// Returns an empty slice if the particle does not exist or the manager is not attached.
    pub fn neighbors_of(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map_or(&[], |list| list.as_slice())
    }

    /// Visit every unordered pair of neighbors closer than the cutoff of the `potential`.
    ///
    /// Nearest-image separation vector `dr = r_j - r_i` and its squared length
    /// are passed to the `calculation` for each pair (i < j).
    ///
    /// ## Returns
    /// - `CalculationError::CutoffExceedsRange` if the cutoff of the potential is larger than the interaction range.
    /// - `CalculationError::SizeMismatch` if the calculation was created for a different number of particles.
    /// - `CalculationError::NeighborError` if the lists cannot be used with the system.
    pub fn for_each_pair(
        &self,
        system: &System,
        potential: &dyn PairPotential,
        calculation: &mut dyn PotentialCalculation,
    ) -> Result<(), CalculationError> {
        let simbox = self.check_ready(system)?;
        calculation.check_size(system.get_n_particles())?;
        let cutoff = potential.cutoff();
        self.check_cutoff(cutoff)?;
        let cutoff2 = cutoff * cutoff;

        let particles = system.get_particles();
        for (i, list) in self.neighbors.iter().enumerate() {
            let pos_i = particles[i].get_position();
            for &j in list.iter().filter(|&&j| j > i) {
                let dr = pos_i.vector_to(particles[j].get_position(), simbox);
                let r2 = dr.len2();
                if r2 < cutoff2 {
                    calculation.do_pair(i, j, &dr, r2, potential);
                }
            }
        }

        Ok(())
    }

    /// Set the interaction range. The lists are rebuilt on the next `update`.
    pub fn set_interaction_range(&mut self, range: f64) -> Result<(), NeighborError> {
        let settings = self.settings.clone().with_interaction_range(range);
        self.reconfigure(settings)
    }

    /// Set the neighbor range. The cell grid and the lists are rebuilt on the next `update`.
    pub fn set_neighbor_range(&mut self, range: f64) -> Result<(), NeighborError> {
        let settings = self.settings.clone().with_neighbor_range(range);
        self.reconfigure(settings)
    }

    /// Set the safety factor. The lists are rebuilt on the next `update`.
    pub fn set_safety_factor(&mut self, factor: f64) -> Result<(), NeighborError> {
        let settings = self.settings.clone().with_safety_factor(factor);
        self.reconfigure(settings)
    }

    fn reconfigure(&mut self, settings: NeighborSettings) -> Result<(), NeighborError> {
        self.criterion.configure(&settings)?;

        if settings.neighbor_range() != self.settings.neighbor_range() {
            self.regrid = true;
        }

        self.settings = settings;
        self.invalidated = true;

        log::info!(
            "Neighbor settings changed (interaction range: {}, neighbor range: {}, safety factor: {}). Lists will be rebuilt.",
            self.settings.interaction_range(),
            self.settings.neighbor_range(),
            self.settings.safety_factor()
        );

        Ok(())
    }

    /// Get the current settings.
    pub fn settings(&self) -> &NeighborSettings {
        &self.settings
    }

    /// Largest distance at which particles interact.
    pub fn interaction_range(&self) -> f64 {
        self.settings.interaction_range()
    }

    /// Distance within which particles are stored as neighbors.
    pub fn neighbor_range(&self) -> f64 {
        self.settings.neighbor_range()
    }

    /// Get the neighbor criterion.
    pub fn criterion(&self) -> &C {
        &self.criterion
    }

    /// Get the cell grid. `None` if not attached.
    pub fn grid(&self) -> Option<&CellGrid> {
        self.grid.as_ref()
    }

    /// Number of times the lists have been built since the last `attach`.
    pub fn n_rebuilds(&self) -> usize {
        self.n_rebuilds
    }

    /// Number of unordered neighbor pairs.
    pub fn n_pairs(&self) -> usize {
        self.n_pairs
    }

    /// Check that the manager is attached and the system matches.
    fn check_attached<'a>(&self, system: &'a System) -> Result<&'a SimBox, NeighborError> {
        if self.grid.is_none() {
            return Err(NeighborError::NotAttached);
        }

        if system.get_n_particles() != self.neighbors.len() {
            return Err(NeighborError::SystemMismatch {
                expected: self.neighbors.len(),
                found: system.get_n_particles(),
            });
        }

        Ok(simbox_check(system.get_box())?)
    }

    /// Check that the lists can be traversed for the system.
    pub(crate) fn check_ready<'a>(&self, system: &'a System) -> Result<&'a SimBox, NeighborError> {
        let simbox = self.check_attached(system)?;
        if self.invalidated || self.regrid {
            return Err(NeighborError::Invalidated);
        }

        Ok(simbox)
    }

    /// Check that the cutoff of a potential is covered by the lists.
    pub(crate) fn check_cutoff(&self, cutoff: f64) -> Result<(), CalculationError> {
        if cutoff > self.settings.interaction_range() {
            Err(CalculationError::CutoffExceedsRange {
                cutoff,
                range: self.settings.interaction_range(),
            })
        } else {
            Ok(())
        }
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
