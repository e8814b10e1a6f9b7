// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of the System structure and its methods.

use crate::errors::SimBoxError;
use crate::structures::{particle::Particle, simbox::SimBox, vector3d::Vector3D};

/// Collection of particles confined in a simulation box.
///
/// The `System` owns all particles. Neighbor lists and potential calculations
/// only refer to the particles by their index in the `System`.
#[derive(Debug, Clone)]
pub struct System {
    /// Name of the simulated system.
    name: String,
    /// Vector of particles in the system.
    particles: Vec<Particle>,
    /// Simulation box. (Optional.)
    simulation_box: Option<SimBox>,
}

impl System {
    /// Create new System structure with a given name from the provided vector of particles and simulation box.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// #
    /// let particles = vec![
    ///     Particle::new([1.0, 1.0].into()),
    ///     Particle::new([2.0, 1.5].into()),
    /// ];
    ///
    /// let system = System::new("Two disks", particles, Some(SimBox::new_2d(5.0, 5.0)));
    /// assert_eq!(system.get_n_particles(), 2);
    /// ```
    pub fn new(name: &str, particles: Vec<Particle>, simulation_box: Option<SimBox>) -> Self {
        System {
            name: name.to_owned(),
            particles,
            simulation_box,
        }
    }

    /// Get the name of the system.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Get immutable reference to the particles of the system.
    pub fn get_particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Get mutable reference to the particles of the system.
    pub fn get_particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Get the number of particles in the system.
    pub fn get_n_particles(&self) -> usize {
        self.particles.len()
    }

    /// Get particle with the target index. Returns `None` if the particle does not exist.
    pub fn get_particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Get mutable reference to particle with the target index.
    pub fn get_particle_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    /// Position of the particle with the target index.
    ///
    /// ## Panics
    /// Panics if the particle does not exist.
    #[inline]
    pub(crate) fn position_of(&self, index: usize) -> &Vector3D {
        self.particles[index].get_position()
    }

    /// Get reference to the simulation box. Returns `None` if the box is not defined.
    pub fn get_box(&self) -> Option<&SimBox> {
        self.simulation_box.as_ref()
    }

    /// Get mutable reference to the simulation box.
    pub fn get_box_mut(&mut self) -> Option<&mut SimBox> {
        self.simulation_box.as_mut()
    }

    /// Replace the simulation box of the system.
    pub fn set_box(&mut self, simbox: SimBox) {
        self.simulation_box = Some(simbox);
    }

    /// Remove the simulation box from the system.
    pub fn reset_box(&mut self) {
        self.simulation_box = None;
    }

    /// Translate a single particle by `shift`, wrapping it into the simulation box if it exists.
    ///
    /// ## Returns
    /// The original position of the particle, which can be used to undo the move.
    /// `None` if the particle does not exist.
    pub fn particle_translate(&mut self, index: usize, shift: &Vector3D) -> Option<Vector3D> {
        let simbox = self.simulation_box.as_ref();
        let particle = self.particles.get_mut(index)?;
        let original = *particle.get_position();

        match simbox {
            Some(simbox) => particle.translate(shift, simbox),
            None => particle.translate_nopbc(shift),
        }

        Some(original)
    }

    /// Set the position of a single particle.
    ///
    /// ## Returns
    /// The original position of the particle. `None` if the particle does not exist.
    pub fn particle_set_position(&mut self, index: usize, position: Vector3D) -> Option<Vector3D> {
        let particle = self.particles.get_mut(index)?;
        let original = *particle.get_position();
        particle.set_position(position);
        Some(original)
    }

    /// Scale the simulation box and all particle positions by `factor` (volume move).
    ///
    /// ## Returns
    /// `SimBoxError` if the system has no simulation box or if the scaled box is invalid.
    pub fn scale(&mut self, factor: f64) -> Result<(), SimBoxError> {
        let simbox = self
            .simulation_box
            .as_mut()
            .ok_or(SimBoxError::DoesNotExist)?;

        let mut scaled = simbox.clone();
        scaled.set_dimensions(simbox.dimensions() * factor);
        scaled.check()?;
        *simbox = scaled;

        for particle in self.particles.iter_mut() {
            let position = *particle.get_position() * factor;
            particle.set_position(position);
        }

        Ok(())
    }

    /// Total kinetic energy of the system.
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn two_particles() -> System {
        System::new(
            "Test",
            vec![
                Particle::new([1.0, 1.0, 1.0].into()),
                Particle::new([2.0, 3.0, 4.0].into()),
            ],
            Some(SimBox::cubic(5.0)),
        )
    }

    #[test]
    fn particle_translate_and_undo() {
        let mut system = two_particles();
        let original = system
            .particle_translate(1, &Vector3D::new(3.5, 0.0, 0.0))
            .unwrap();

        assert_approx_eq!(f64, system.position_of(1).x, 0.5, epsilon = 1e-12);

        system.particle_set_position(1, original).unwrap();
        assert_approx_eq!(f64, system.position_of(1).x, 2.0);
    }

    #[test]
    fn particle_translate_nonexistent() {
        let mut system = two_particles();
        assert!(system
            .particle_translate(2, &Vector3D::new(1.0, 0.0, 0.0))
            .is_none());
    }

    #[test]
    fn scale() {
        let mut system = two_particles();
        system.scale(2.0).unwrap();

        assert_approx_eq!(f64, system.get_box().unwrap().x, 10.0);
        assert_approx_eq!(f64, system.position_of(1).z, 8.0);
    }

    #[test]
    fn scale_fail() {
        let mut system = two_particles();
        assert_eq!(
            system.scale(-1.0),
            Err(SimBoxError::InvalidDimension('x', -5.0))
        );
        // nothing changed
        assert_approx_eq!(f64, system.get_box().unwrap().x, 5.0);
        assert_approx_eq!(f64, system.position_of(1).z, 4.0);

        system.reset_box();
        assert_eq!(system.scale(2.0), Err(SimBoxError::DoesNotExist));
    }
}
