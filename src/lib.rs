// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! # neighbors_rs: Neighbor Lists and Potential Evaluation for Particle Simulations
//!
//! Rust library for tracking neighbors of particles in periodic simulation boxes
//! and for evaluating interaction potentials over the neighbor lists.
//! Intended as the core of molecular dynamics and Monte Carlo codes.
//!
//! ## Usage
//!
//! Run
//!
//! ```bash
//! $ cargo add neighbors_rs
//! ```
//!
//! Import the crate in your Rust code:
//! ```
//! use neighbors_rs::prelude::*;
//! ```
//!
//! ## Overview
//!
//! - [`System`](crate::system::System) owns the particles and the simulation box.
//! - [`CellGrid`](crate::structures::cellgrid::CellGrid) divides the simulation box into cells
//!   so that neighbors can be searched in linear time.
//! - [`NeighborManager`](crate::neighbors::manager::NeighborManager) stores, for every particle,
//!   all particles closer than the neighbor range and rebuilds the lists once some particle
//!   moved too far.
//! - [`PotentialMaster`](crate::potentials::master::PotentialMaster) evaluates potentials
//!   over the neighbor lists and passes every interaction to a
//!   [`PotentialCalculation`](crate::potentials::calculation::PotentialCalculation),
//!   e.g., [`EnergySum`](crate::potentials::calculation::EnergySum) or
//!   [`ForceSum`](crate::potentials::calculation::ForceSum).
//!
//! ## Examples
//!
//! #### Molecular dynamics step
//!
//! Check the neighbor lists, calculate forces and move the particles.
//!
//! ```
//! use neighbors_rs::prelude::*;
//! use std::error::Error;
//!
//! /// Harmonic repulsion between overlapping disks.
//! struct SoftDisk;
//!
//! impl PairPotential for SoftDisk {
//!     fn cutoff(&self) -> f64 { 1.0 }
//!     fn u(&self, r2: f64) -> f64 { 0.5 * (1.0 - r2.sqrt()).powi(2) }
//!     fn du(&self, r2: f64) -> f64 { -r2.sqrt() * (1.0 - r2.sqrt()) }
//!     fn d2u(&self, r2: f64) -> f64 { r2 }
//! }
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let particles = (0..25)
//!         .map(|i| Particle::new([(i % 5) as f64 * 0.9, (i / 5) as f64 * 0.9].into()))
//!         .collect::<Vec<Particle>>();
//!     let mut system = System::new("Disks", particles, Some(SimBox::new_2d(4.5, 4.5)));
//!
//!     let settings = NeighborSettings::default()
//!         .with_interaction_range(1.0)
//!         .with_neighbor_range(1.3)
//!         .with_safety_factor(0.4);
//!     let mut manager = NeighborManager::new(settings)?;
//!     manager.attach(&system)?;
//!
//!     let mut master = PotentialMaster::new();
//!     master.add_potential(Potential::Pair(Box::new(SoftDisk)));
//!
//!     let mut forces = ForceSum::new(system.get_n_particles());
//!     let dt = 0.01;
//!
//!     for _ in 0..10 {
//!         // rebuild the lists if needed; abort on unsafe displacement
//!         manager.update(&system)?.check()?;
//!
//!         forces.zero_sum();
//!         master.calculate(&system, &manager, &IteratorDirective::all(), &mut forces)?;
//!
//!         for i in 0..system.get_n_particles() {
//!             let shift = *forces.force(i).unwrap() * dt;
//!             system.particle_translate(i, &shift);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! #### Monte Carlo move
//!
//! Calculate the energy change of a single-particle move and reject it.
//!
//! ```
//! use neighbors_rs::prelude::*;
//!
//! # struct SoftDisk;
//! # impl PairPotential for SoftDisk {
//! #     fn cutoff(&self) -> f64 { 1.0 }
//! #     fn u(&self, r2: f64) -> f64 { 0.5 * (1.0 - r2.sqrt()).powi(2) }
//! #     fn du(&self, r2: f64) -> f64 { -r2.sqrt() * (1.0 - r2.sqrt()) }
//! #     fn d2u(&self, r2: f64) -> f64 { r2 }
//! # }
//! #
//! let mut system = System::new(
//!     "Disks",
//!     vec![
//!         Particle::new([1.0, 1.0].into()),
//!         Particle::new([1.8, 1.0].into()),
//!     ],
//!     Some(SimBox::new_2d(5.0, 5.0)),
//! );
//!
//! let mut manager = NeighborManager::new(NeighborSettings::default()).unwrap();
//! manager.attach(&system).unwrap();
//!
//! let mut master = PotentialMaster::new();
//! master.add_potential(Potential::Pair(Box::new(SoftDisk)));
//!
//! let directive = IteratorDirective::particle(1);
//! let mut energy = EnergySum::new();
//! master.calculate(&system, &manager, &directive, &mut energy).unwrap();
//! let old_energy = energy.sum();
//!
//! let original = system.particle_translate(1, &Vector3D::new(-0.1, 0.0, 0.0)).unwrap();
//! let status = manager.update(&system).unwrap();
//! if !status.is_unsafe() {
//!     energy.zero_sum();
//!     master.calculate(&system, &manager, &directive, &mut energy).unwrap();
//!     assert!(energy.sum() > old_energy);
//! }
//!
//! // reject the move
//! system.particle_set_position(1, original);
//! ```
//!
//! ## Error handling
//!
//! Functions of the library return errors defined in [`errors`].
//! Violations of internal invariants lead to panics with messages starting with `FATAL NEIGHBORS ERROR`.
//! Such panics indicate a bug in the library.
//!
//! ## Logging
//!
//! The library logs through the [`log`](https://docs.rs/log) facade.
//! Rebuilds of the neighbor lists are logged at the `debug` level and construction of cell grids
//! at the `trace` level. Changes of the neighbor settings are logged at the `info` level,
//! unsafe displacements at the `warn` level. No logger is installed by the library.
//!
//! ## Features
//!
//! - `serde`: Serialization and deserialization of [`Vector3D`](crate::structures::vector3d::Vector3D),
//!   [`SimBox`](crate::structures::simbox::SimBox), and
//!   [`NeighborSettings`](crate::neighbors::NeighborSettings).
//!
//! ## License
//! This library is released under the MIT License.

/// Version of the `neighbors_rs` library.
pub const NEIGHBORS_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod errors;
pub mod neighbors;
pub mod potentials;
pub mod structures;
pub mod system;
mod test_utilities;

/// Reexported basic `neighbors_rs` structures, traits, and functions.
pub mod prelude {
    pub use crate::neighbors::criterion::{CriterionSimple, NeighborCriterion};
    pub use crate::neighbors::manager::NeighborManager;
    pub use crate::neighbors::{NeighborSettings, UpdateStatus};
    pub use crate::potentials::calculation::{
        EnergySum, ForceSum, PotentialCalculation, SecondDerivativeSum, VirialSum,
    };
    pub use crate::potentials::master::{IteratorDirective, PotentialMaster};
    pub use crate::potentials::{
        Arity, ManyBodyPotential, PairPotential, Potential, SinglePotential, TripletPotential,
    };
    pub use crate::structures::cellgrid::{CellGrid, CellNeighbors, NeighborsRange, SpatialIndex};
    pub use crate::structures::particle::Particle;
    pub use crate::structures::simbox::SimBox;
    pub use crate::structures::vector3d::{Tensor3D, Vector3D};
    pub use crate::system::System;
}
