// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of the Particle structure and its methods.

use crate::structures::{simbox::SimBox, vector3d::Vector3D};

/// A single simulated particle.
///
/// Particles are owned by the [`System`](crate::system::System) and identified by their index in it.
/// Components of the library never hold references to particles, only their indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Index of the particle type. Carries the interaction parameters in the potentials.
    kind: usize,
    /// Mass of the particle.
    mass: f64,
    /// Current position of the particle.
    position: Vector3D,
    /// Current velocity of the particle.
    velocity: Vector3D,
}

impl Particle {
    /// Create a new particle of type 0 with unit mass, located at `position` and having zero velocity.
    ///
    /// ## Example
    /// ```
    /// # use neighbors_rs::prelude::*;
    /// #
    /// let particle = Particle::new([1.0, 2.0, 3.0].into())
    ///     .with_kind(2)
    ///     .with_mass(12.011);
    ///
    /// assert_eq!(particle.get_kind(), 2);
    /// assert!(particle.get_velocity().is_zero());
    /// ```
    pub fn new(position: Vector3D) -> Self {
        Particle {
            kind: 0,
            mass: 1.0,
            position,
            velocity: Vector3D::default(),
        }
    }

    /// Set the type of the particle.
    pub fn with_kind(mut self, kind: usize) -> Self {
        self.kind = kind;
        self
    }

    /// Set the mass of the particle.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Set the velocity of the particle.
    pub fn with_velocity(mut self, velocity: Vector3D) -> Self {
        self.velocity = velocity;
        self
    }

    /// Get the type of the particle.
    pub fn get_kind(&self) -> usize {
        self.kind
    }

    /// Get the mass of the particle.
    pub fn get_mass(&self) -> f64 {
        self.mass
    }

    /// Get the position of the particle.
    pub fn get_position(&self) -> &Vector3D {
        &self.position
    }

    /// Set the position of the particle.
    pub fn set_position(&mut self, position: Vector3D) {
        self.position = position;
    }

    /// Get the velocity of the particle.
    pub fn get_velocity(&self) -> &Vector3D {
        &self.velocity
    }

    /// Set the velocity of the particle.
    pub fn set_velocity(&mut self, velocity: Vector3D) {
        self.velocity = velocity;
    }

    /// Translate the particle by `shift` and wrap it into the simulation box.
    pub fn translate(&mut self, shift: &Vector3D, simbox: &SimBox) {
        self.position += *shift;
        simbox.wrap(&mut self.position);
    }

    /// Translate the particle by `shift` ignoring the simulation box.
    pub fn translate_nopbc(&mut self, shift: &Vector3D) {
        self.position += *shift;
    }

    /// Kinetic energy of the particle.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.len2()
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
