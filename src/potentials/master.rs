// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of the PotentialMaster evaluating potentials over neighbor lists.

use crate::{
    errors::CalculationError,
    neighbors::{criterion::NeighborCriterion, manager::NeighborManager},
    potentials::{
        calculation::PotentialCalculation, ManyBodyPotential, PairPotential, Potential,
        SinglePotential, TripletPotential,
    },
    structures::{simbox::SimBox, vector3d::Vector3D},
    system::System,
};

/// Specifies which interactions are evaluated by [`PotentialMaster::calculate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IteratorDirective {
    target: Option<usize>,
}

impl IteratorDirective {
    /// Evaluate all interactions in the system.
    pub fn all() -> Self {
        IteratorDirective { target: None }
    }

    /// Evaluate only the interactions involving the target particle.
    /// Useful for calculating energy changes of single-particle Monte Carlo moves.
    pub fn particle(index: usize) -> Self {
        IteratorDirective {
            target: Some(index),
        }
    }

    /// Get the target particle. `None` if all interactions are evaluated.
    pub fn target(&self) -> Option<usize> {
        self.target
    }
}

/// Collection of potentials acting in a system.
///
/// ## Example
/// Calculating the total energy of a system.
/// ```
/// # use neighbors_rs::prelude::*;
/// # use float_cmp::assert_approx_eq;
/// #
/// struct Linear;
///
/// impl PairPotential for Linear {
///     fn cutoff(&self) -> f64 { 1.0 }
///     fn u(&self, r2: f64) -> f64 { 1.0 - r2.sqrt() }
///     fn du(&self, r2: f64) -> f64 { -r2.sqrt() }
///     fn d2u(&self, _r2: f64) -> f64 { 0.0 }
/// }
///
/// let system = System::new(
///     "Example",
///     vec![
///         Particle::new([1.0, 1.0].into()),
///         Particle::new([1.5, 1.0].into()),
///         Particle::new([9.75, 1.0].into()),
///     ],
///     Some(SimBox::new_2d(10.0, 10.0)),
/// );
///
/// let mut manager = NeighborManager::new(NeighborSettings::default()).unwrap();
/// manager.attach(&system).unwrap();
///
/// let mut master = PotentialMaster::new();
/// master.add_potential(Potential::Pair(Box::new(Linear)));
///
/// let mut energy = EnergySum::new();
/// master
///     .calculate(&system, &manager, &IteratorDirective::all(), &mut energy)
///     .unwrap();
///
/// // pairs 0-1 (0.5), 0-2 (1.25 through the periodic boundary, beyond cutoff), 1-2 (1.75)
/// assert_approx_eq!(f64, energy.sum(), 0.5, epsilon = 1e-12);
/// ```
#[derive(Debug, Default)]
pub struct PotentialMaster {
    potentials: Vec<Potential>,
    scratch: Scratch,
}

/// Buffers reused between passes.
#[derive(Debug, Default)]
struct Scratch {
    indices: Vec<usize>,
    drs: Vec<Vector3D>,
    centers: Vec<usize>,
}

impl PotentialMaster {
    /// Create a new `PotentialMaster` with no potentials.
    pub fn new() -> Self {
        PotentialMaster::default()
    }

    /// Add a potential to the collection.
    pub fn add_potential(&mut self, potential: Potential) {
        self.potentials.push(potential);
    }

    /// Get the potentials of the collection.
    pub fn potentials(&self) -> &[Potential] {
        &self.potentials
    }

    /// Largest cutoff of all the potentials. Zero if there are no potentials with a cutoff.
    ///
    /// The interaction range of the neighbor lists should be at least this large.
    pub fn interaction_range(&self) -> f64 {
        self.potentials
            .iter()
            .filter_map(|p| p.cutoff())
            .fold(0.0, f64::max)
    }

    /// Evaluate all potentials of the collection, passing every interaction to the `calculation`.
    ///
    /// ## Returns
    /// - `CalculationError::UnsupportedArity` if the calculation cannot handle some of the potentials.
    /// - `CalculationError::CutoffExceedsRange` if the cutoff of some potential exceeds the interaction range of the lists.
    /// - `CalculationError::NonexistentParticle` if the target particle does not exist.
    /// - `CalculationError::SizeMismatch` if the calculation was created for a different number of particles.
    /// - `CalculationError::NeighborError` if the neighbor lists cannot be used with the system.
    ///
    /// Nothing is accumulated into the `calculation` if an error is returned.
    ///
    /// ## Notes
    /// - Interactions are accumulated into the calculation, which is not reset beforehand.
    /// - With a targeted `directive`, each single, pair, and triplet interaction involving the target particle
    ///   is visited exactly once. For many-body potentials, the target and all its neighbors are used as centers.
    ///   Differences of targeted energies before and after moving the target thus equal differences of total energies.
    pub fn calculate<C: NeighborCriterion>(
        &mut self,
        system: &System,
        manager: &NeighborManager<C>,
        directive: &IteratorDirective,
        calculation: &mut dyn PotentialCalculation,
    ) -> Result<(), CalculationError> {
        let simbox = manager.check_ready(system)?;
        calculation.check_size(system.get_n_particles())?;

        if let Some(target) = directive.target() {
            if target >= system.get_n_particles() {
                return Err(CalculationError::NonexistentParticle(target));
            }
        }

        for potential in self.potentials.iter() {
            if !calculation.supports(potential.arity()) {
                return Err(CalculationError::UnsupportedArity(
                    calculation.name().to_owned(),
                    potential.arity().to_string(),
                ));
            }

            if let Some(cutoff) = potential.cutoff() {
                manager.check_cutoff(cutoff)?;
            }
        }

        let context = Context {
            system,
            simbox,
            manager,
        };
        let scratch = &mut self.scratch;

        for potential in self.potentials.iter() {
            match (potential, directive.target()) {
                (Potential::Single(p), None) => context.singles_all(p.as_ref(), calculation),
                (Potential::Single(p), Some(t)) => {
                    calculation.do_single(t, &system.get_particles()[t], p.as_ref())
                }
                (Potential::Pair(p), None) => {
                    manager.for_each_pair(system, p.as_ref(), calculation)?
                }
                (Potential::Pair(p), Some(t)) => context.pairs_of(t, p.as_ref(), calculation),
                (Potential::Triplet(p), None) => {
                    context.triplets_all(p.as_ref(), scratch, calculation)
                }
                (Potential::Triplet(p), Some(t)) => {
                    context.triplets_of(t, p.as_ref(), scratch, calculation)
                }
                (Potential::ManyBody(p), None) => {
                    context.many_body_all(p.as_ref(), scratch, calculation)
                }
                (Potential::ManyBody(p), Some(t)) => {
                    context.many_body_of(t, p.as_ref(), scratch, calculation)
                }
            }
        }

        Ok(())
    }
}

/// Data needed to iterate over interactions in a single pass.
struct Context<'a, C: NeighborCriterion> {
    system: &'a System,
    simbox: &'a SimBox,
    manager: &'a NeighborManager<C>,
}

impl<'a, C: NeighborCriterion> Context<'a, C> {
    /// Nearest-image vector from particle `i` to particle `j`.
    #[inline(always)]
    fn dr(&self, i: usize, j: usize) -> Vector3D {
        self.system
            .position_of(i)
            .vector_to(self.system.position_of(j), self.simbox)
    }

    /// Collect neighbors of particle `center` closer than the cutoff.
    fn neighbors_within(
        &self,
        center: usize,
        cutoff2: f64,
        indices: &mut Vec<usize>,
        drs: &mut Vec<Vector3D>,
    ) {
        indices.clear();
        drs.clear();

        for &j in self.manager.neighbors_of(center) {
            let dr = self.dr(center, j);
            if dr.len2() < cutoff2 {
                indices.push(j);
                drs.push(dr);
            }
        }
    }

    fn singles_all(&self, potential: &dyn SinglePotential, calculation: &mut dyn PotentialCalculation) {
        for (i, particle) in self.system.get_particles().iter().enumerate() {
            calculation.do_single(i, particle, potential);
        }
    }

    fn pairs_of(
        &self,
        target: usize,
        potential: &dyn PairPotential,
        calculation: &mut dyn PotentialCalculation,
    ) {
        let cutoff2 = potential.cutoff().powi(2);
        for &j in self.manager.neighbors_of(target) {
            let dr = self.dr(target, j);
            let r2 = dr.len2();
            if r2 < cutoff2 {
                calculation.do_pair(target, j, &dr, r2, potential);
            }
        }
    }

    /// Visit all triplets centered at `center`.
    /// If `leg` is provided, only triplets containing this leg are visited.
    fn triplets_centered(
        &self,
        center: usize,
        leg: Option<usize>,
        indices: &[usize],
        drs: &[Vector3D],
        potential: &dyn TripletPotential,
        calculation: &mut dyn PotentialCalculation,
    ) {
        for a in 0..indices.len() {
            for b in (a + 1)..indices.len() {
                if leg.is_some_and(|l| indices[a] != l && indices[b] != l) {
                    continue;
                }

                calculation.do_triplet(
                    center, indices[a], indices[b], &drs[a], &drs[b], potential,
                );
            }
        }
    }

    fn triplets_all(
        &self,
        potential: &dyn TripletPotential,
        scratch: &mut Scratch,
        calculation: &mut dyn PotentialCalculation,
    ) {
        let cutoff2 = potential.cutoff().powi(2);
        let Scratch { indices, drs, .. } = scratch;

        for center in 0..self.system.get_n_particles() {
            self.neighbors_within(center, cutoff2, indices, drs);
            self.triplets_centered(center, None, indices, drs, potential, calculation);
        }
    }

    fn triplets_of(
        &self,
        target: usize,
        potential: &dyn TripletPotential,
        scratch: &mut Scratch,
        calculation: &mut dyn PotentialCalculation,
    ) {
        let cutoff2 = potential.cutoff().powi(2);
        let Scratch {
            indices,
            drs,
            centers,
        } = scratch;

        // target as the central particle
        self.neighbors_within(target, cutoff2, indices, drs);
        centers.clear();
        centers.extend_from_slice(indices);
        self.triplets_centered(target, None, indices, drs, potential, calculation);

        // target as a leg of a triplet centered at its neighbor
        for &center in centers.iter() {
            self.neighbors_within(center, cutoff2, indices, drs);
            self.triplets_centered(center, Some(target), indices, drs, potential, calculation);
        }
    }

    fn many_body_all(
        &self,
        potential: &dyn ManyBodyPotential,
        scratch: &mut Scratch,
        calculation: &mut dyn PotentialCalculation,
    ) {
        let cutoff2 = potential.cutoff().powi(2);
        let Scratch { indices, drs, .. } = scratch;

        for center in 0..self.system.get_n_particles() {
            self.neighbors_within(center, cutoff2, indices, drs);
            calculation.do_many_body(center, indices, drs, potential);
        }
    }

    fn many_body_of(
        &self,
        target: usize,
        potential: &dyn ManyBodyPotential,
        scratch: &mut Scratch,
        calculation: &mut dyn PotentialCalculation,
    ) {
        let cutoff2 = potential.cutoff().powi(2);
        let Scratch { indices, drs, .. } = scratch;

        self.neighbors_within(target, cutoff2, indices, drs);
        calculation.do_many_body(target, indices, drs, potential);

        // all listed neighbors are used as centers so that the visited set
        // does not change when the target crosses the cutoff of some center
        for &center in self.manager.neighbors_of(target) {
            self.neighbors_within(center, cutoff2, indices, drs);
            calculation.do_many_body(center, indices, drs, potential);
        }
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NeighborError;
    use crate::neighbors::NeighborSettings;
    use crate::potentials::calculation::{EnergySum, ForceSum, SecondDerivativeSum, VirialSum};
    use crate::potentials::Arity;
    use crate::test_utilities::potentials::{Coordination, HarmonicAngle, HarmonicField, LennardJones};
    use crate::test_utilities::utilities::{jittered_lattice_2d, jittered_lattice_3d, random_system_2d};
    use float_cmp::assert_approx_eq;

    fn settings() -> NeighborSettings {
        NeighborSettings::default()
            .with_interaction_range(1.5)
            .with_neighbor_range(1.8)
    }

    fn prepare(system: &System) -> NeighborManager {
        let mut manager = NeighborManager::new(settings()).unwrap();
        manager.attach(system).unwrap();
        manager
    }

    fn full_master() -> PotentialMaster {
        let mut master = PotentialMaster::new();
        master.add_potential(Potential::Pair(Box::new(LennardJones::new(1.0, 0.8, 1.5))));
        master.add_potential(Potential::Triplet(Box::new(HarmonicAngle::new(0.7, 1.2, 1.3))));
        master.add_potential(Potential::ManyBody(Box::new(Coordination::new(0.3, 1.4))));
        master.add_potential(Potential::Single(Box::new(HarmonicField::new(
            0.05,
            Vector3D::new(3.0, 3.0, 3.0),
        ))));
        master
    }

    fn energy(master: &mut PotentialMaster, system: &System, manager: &NeighborManager, directive: &IteratorDirective) -> f64 {
        let mut energy = EnergySum::new();
        master.calculate(system, manager, directive, &mut energy).unwrap();
        energy.sum()
    }

    /// Brute-force energy evaluated over all tuples of particles.
    fn brute_force_energy(master: &PotentialMaster, system: &System) -> f64 {
        let simbox = system.get_box().unwrap();
        let n = system.get_n_particles();
        let dr = |i: usize, j: usize| system.position_of(i).vector_to(system.position_of(j), simbox);
        let mut total = 0.0;

        for potential in master.potentials() {
            match potential {
                Potential::Single(p) => {
                    total += system.get_particles().iter().map(|x| p.energy(x)).sum::<f64>()
                }
                Potential::Pair(p) => {
                    for i in 0..n {
                        for j in (i + 1)..n {
                            let r2 = dr(i, j).len2();
                            if r2 < p.cutoff().powi(2) {
                                total += p.u(r2);
                            }
                        }
                    }
                }
                Potential::Triplet(p) => {
                    for i in 0..n {
                        let legs = (0..n)
                            .filter(|&j| j != i && dr(i, j).len2() < p.cutoff().powi(2))
                            .collect::<Vec<usize>>();
                        for a in 0..legs.len() {
                            for b in (a + 1)..legs.len() {
                                total += p.energy(&dr(i, legs[a]), &dr(i, legs[b]));
                            }
                        }
                    }
                }
                Potential::ManyBody(p) => {
                    for i in 0..n {
                        let drs = (0..n)
                            .filter(|&j| j != i)
                            .map(|j| dr(i, j))
                            .filter(|v| v.len2() < p.cutoff().powi(2))
                            .collect::<Vec<Vector3D>>();
                        total += p.energy(&drs);
                    }
                }
            }
        }

        total
    }

    #[test]
    fn interaction_range() {
        let master = full_master();
        assert_approx_eq!(f64, master.interaction_range(), 1.5);
        assert_approx_eq!(f64, PotentialMaster::new().interaction_range(), 0.0);
    }

    #[test]
    fn energy_matches_brute_force() {
        let system = jittered_lattice_3d(5, 1.1, 0.15, 42);
        let manager = prepare(&system);
        let mut master = full_master();

        assert_approx_eq!(
            f64,
            energy(&mut master, &system, &manager, &IteratorDirective::all()),
            brute_force_energy(&master, &system),
            epsilon = 1e-8
        );
    }

    #[test]
    fn energy_matches_brute_force_2d() {
        let system = jittered_lattice_2d(8, 1.05, 0.2, 7);
        let manager = prepare(&system);
        let mut master = full_master();

        assert_approx_eq!(
            f64,
            energy(&mut master, &system, &manager, &IteratorDirective::all()),
            brute_force_energy(&master, &system),
            epsilon = 1e-8
        );
    }

    #[test]
    fn targeted_energy_difference() {
        // energy change of a single-particle move equals the change of the targeted energy
        let mut system = jittered_lattice_3d(5, 1.1, 0.15, 13);
        let mut manager = prepare(&system);
        let mut master = full_master();

        for (target, shift) in [
            (0, Vector3D::new(0.05, -0.02, 0.03)),
            (31, Vector3D::new(-0.04, 0.01, 0.0)),
            (124, Vector3D::new(0.0, 0.06, -0.05)),
        ] {
            let directive = IteratorDirective::particle(target);
            let total_before = energy(&mut master, &system, &manager, &IteratorDirective::all());
            let target_before = energy(&mut master, &system, &manager, &directive);

            system.particle_translate(target, &shift).unwrap();
            manager.update(&system).unwrap();

            let total_after = energy(&mut master, &system, &manager, &IteratorDirective::all());
            let target_after = energy(&mut master, &system, &manager, &directive);

            assert_approx_eq!(
                f64,
                total_after - total_before,
                target_after - target_before,
                epsilon = 1e-8
            );
        }
    }

    #[test]
    fn targeted_pair_energy() {
        let system = jittered_lattice_2d(6, 1.0, 0.1, 3);
        let manager = prepare(&system);
        let mut master = PotentialMaster::new();
        let potential = LennardJones::new(1.0, 0.8, 1.5);
        master.add_potential(Potential::Pair(Box::new(potential.clone())));

        let simbox = system.get_box().unwrap();
        let target = 14;
        let expected = (0..system.get_n_particles())
            .filter(|&j| j != target)
            .map(|j| system.position_of(target).vector_to(system.position_of(j), simbox).len2())
            .filter(|&r2| r2 < 1.5 * 1.5)
            .map(|r2| potential.u(r2))
            .sum::<f64>();

        assert_approx_eq!(
            f64,
            energy(&mut master, &system, &manager, &IteratorDirective::particle(target)),
            expected,
            epsilon = 1e-10
        );
    }

    #[test]
    fn forces_match_finite_differences() {
        let mut system = jittered_lattice_3d(4, 1.1, 0.15, 21);
        let manager = prepare(&system);
        let mut master = full_master();

        let mut forces = ForceSum::new(system.get_n_particles());
        master
            .calculate(&system, &manager, &IteratorDirective::all(), &mut forces)
            .unwrap();

        let h = 1e-6;
        for index in [0, 9, 27, 63] {
            for axis in 0..3 {
                let mut shift = Vector3D::default();
                match axis {
                    0 => shift.x = h,
                    1 => shift.y = h,
                    _ => shift.z = h,
                }

                let original = *system.position_of(index);
                system.particle_set_position(index, original + shift).unwrap();
                let plus = brute_force_energy(&master, &system);
                system.particle_set_position(index, original - shift).unwrap();
                let minus = brute_force_energy(&master, &system);
                system.particle_set_position(index, original).unwrap();

                let numerical = -(plus - minus) / (2.0 * h);
                let force = forces.force(index).unwrap();
                let analytical = match axis {
                    0 => force.x,
                    1 => force.y,
                    _ => force.z,
                };

                assert_approx_eq!(f64, analytical, numerical, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn forces_sum_to_external() {
        // internal forces cancel; only the external field contributes to the total force
        let system = jittered_lattice_3d(4, 1.1, 0.15, 5);
        let manager = prepare(&system);
        let mut master = full_master();
        let field = HarmonicField::new(0.05, Vector3D::new(3.0, 3.0, 3.0));

        let mut forces = ForceSum::new(system.get_n_particles());
        master
            .calculate(&system, &manager, &IteratorDirective::all(), &mut forces)
            .unwrap();

        let total = forces.forces().iter().fold(Vector3D::default(), |acc, f| acc + *f);
        let external = system
            .get_particles()
            .iter()
            .fold(Vector3D::default(), |acc, p| acc - field.gradient(p));

        assert_approx_eq!(f64, total.x, external.x, epsilon = 1e-8);
        assert_approx_eq!(f64, total.y, external.y, epsilon = 1e-8);
        assert_approx_eq!(f64, total.z, external.z, epsilon = 1e-8);

        // same check without the external field
        master = PotentialMaster::new();
        master.add_potential(Potential::Pair(Box::new(LennardJones::new(1.0, 0.8, 1.5))));
        forces.zero_sum();
        master
            .calculate(&system, &manager, &IteratorDirective::all(), &mut forces)
            .unwrap();
        let total = forces.forces().iter().fold(Vector3D::default(), |acc, f| acc + *f);
        assert_approx_eq!(f64, total.len(), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn virial_pair_matches_forces() {
        let system = jittered_lattice_3d(4, 1.1, 0.15, 8);
        let manager = prepare(&system);
        let mut master = PotentialMaster::new();
        let potential = LennardJones::new(1.0, 0.8, 1.5);
        master.add_potential(Potential::Pair(Box::new(potential.clone())));

        let mut virial = VirialSum::new();
        master
            .calculate(&system, &manager, &IteratorDirective::all(), &mut virial)
            .unwrap();

        let simbox = system.get_box().unwrap();
        let n = system.get_n_particles();
        let mut expected = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let r2 = system.position_of(i).vector_to(system.position_of(j), simbox).len2();
                if r2 < 1.5 * 1.5 {
                    expected += potential.du(r2);
                }
            }
        }

        assert_approx_eq!(f64, virial.sum(), expected, epsilon = 1e-8);
    }

    #[test]
    fn hessian_of_pairs() {
        let system = jittered_lattice_2d(4, 1.0, 0.1, 2);
        let manager = prepare(&system);
        let mut master = PotentialMaster::new();
        master.add_potential(Potential::Pair(Box::new(LennardJones::new(1.0, 0.8, 1.5))));

        let mut hessian = SecondDerivativeSum::new(system.get_n_particles());
        master
            .calculate(&system, &manager, &IteratorDirective::all(), &mut hessian)
            .unwrap();

        let matrix = hessian.hessian();
        assert_eq!(matrix.nrows(), 48);
        for r in 0..48 {
            for c in 0..48 {
                assert_approx_eq!(f64, matrix[(r, c)], matrix[(c, r)], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn unsupported_arity() {
        let system = jittered_lattice_2d(4, 1.0, 0.1, 2);
        let manager = prepare(&system);
        let mut master = full_master();

        let mut virial = VirialSum::new();
        assert_eq!(
            master.calculate(&system, &manager, &IteratorDirective::all(), &mut virial),
            Err(CalculationError::UnsupportedArity(
                "VirialSum".to_owned(),
                Arity::Single.to_string()
            ))
        );
        // nothing was accumulated
        assert_eq!(virial.sum(), 0.0);

        let mut hessian = SecondDerivativeSum::new(system.get_n_particles());
        assert!(matches!(
            master.calculate(&system, &manager, &IteratorDirective::all(), &mut hessian),
            Err(CalculationError::UnsupportedArity(_, _))
        ));
    }

    #[test]
    fn cutoff_exceeds_range() {
        let system = jittered_lattice_2d(4, 1.0, 0.1, 2);
        let manager = prepare(&system);
        let mut master = PotentialMaster::new();
        master.add_potential(Potential::ManyBody(Box::new(Coordination::new(0.3, 1.6))));

        let mut energy = EnergySum::new();
        assert_eq!(
            master.calculate(&system, &manager, &IteratorDirective::all(), &mut energy),
            Err(CalculationError::CutoffExceedsRange {
                cutoff: 1.6,
                range: 1.5
            })
        );
    }

    #[test]
    fn calculation_size_mismatch() {
        let system = random_system_2d(100, 10.0, 17);
        let manager = prepare(&system);
        let mut master = PotentialMaster::new();
        master.add_potential(Potential::Pair(Box::new(LennardJones::new(1.0, 0.8, 1.5))));

        let mut forces = ForceSum::new(10);
        assert_eq!(
            master.calculate(&system, &manager, &IteratorDirective::all(), &mut forces),
            Err(CalculationError::SizeMismatch {
                calculation: "ForceSum".to_owned(),
                size: 10,
                expected: 100,
            })
        );
        assert!(forces.forces().iter().all(|f| f.is_zero()));

        assert!(matches!(
            manager.for_each_pair(&system, &LennardJones::new(1.0, 0.8, 1.5), &mut forces),
            Err(CalculationError::SizeMismatch { .. })
        ));

        let mut hessian = SecondDerivativeSum::new(99);
        assert!(matches!(
            master.calculate(&system, &manager, &IteratorDirective::particle(3), &mut hessian),
            Err(CalculationError::SizeMismatch { size: 99, expected: 100, .. })
        ));

        forces.resize(100);
        assert!(master
            .calculate(&system, &manager, &IteratorDirective::all(), &mut forces)
            .is_ok());
    }

    #[test]
    fn repeated_targeted_passes() {
        let system = jittered_lattice_3d(5, 1.1, 0.15, 29);
        let manager = prepare(&system);
        let mut master = full_master();

        let first = (0..system.get_n_particles())
            .map(|i| energy(&mut master, &system, &manager, &IteratorDirective::particle(i)))
            .collect::<Vec<f64>>();

        for (i, &expected) in first.iter().enumerate().rev() {
            assert_approx_eq!(
                f64,
                energy(&mut master, &system, &manager, &IteratorDirective::particle(i)),
                expected,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn nonexistent_target() {
        let system = jittered_lattice_2d(4, 1.0, 0.1, 2);
        let manager = prepare(&system);
        let mut master = full_master();

        let mut energy = EnergySum::new();
        assert_eq!(
            master.calculate(&system, &manager, &IteratorDirective::particle(16), &mut energy),
            Err(CalculationError::NonexistentParticle(16))
        );
    }

    #[test]
    fn not_ready() {
        let system = jittered_lattice_2d(4, 1.0, 0.1, 2);
        let mut master = full_master();
        let mut energy = EnergySum::new();

        let mut manager = NeighborManager::new(settings()).unwrap();
        assert_eq!(
            master.calculate(&system, &manager, &IteratorDirective::all(), &mut energy),
            Err(CalculationError::NeighborError(NeighborError::NotAttached))
        );

        manager.attach(&system).unwrap();
        manager.set_safety_factor(0.3).unwrap();
        assert_eq!(
            master.calculate(&system, &manager, &IteratorDirective::all(), &mut energy),
            Err(CalculationError::NeighborError(NeighborError::Invalidated))
        );
    }
}
