// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

use criterion::{criterion_group, criterion_main, Criterion};
use neighbors_rs::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Truncated Lennard-Jones potential.
struct LennardJones;

impl PairPotential for LennardJones {
    fn cutoff(&self) -> f64 {
        2.5
    }

    fn u(&self, r2: f64) -> f64 {
        let s6 = (1.0 / r2).powi(3);
        4.0 * (s6 * s6 - s6)
    }

    fn du(&self, r2: f64) -> f64 {
        let s6 = (1.0 / r2).powi(3);
        24.0 * (s6 - 2.0 * s6 * s6)
    }

    fn d2u(&self, r2: f64) -> f64 {
        let s6 = (1.0 / r2).powi(3);
        4.0 * (156.0 * s6 * s6 - 42.0 * s6)
    }
}

/// Lennard-Jones fluid at reduced density 0.8 on a slightly perturbed cubic lattice.
fn fluid(n_side: usize, seed: u64) -> System {
    let spacing = (1.0f64 / 0.8).powf(1.0 / 3.0);
    let simbox = SimBox::cubic(n_side as f64 * spacing);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut particles = Vec::with_capacity(n_side.pow(3));
    for x in 0..n_side {
        for y in 0..n_side {
            for z in 0..n_side {
                let mut position = Vector3D::new(
                    x as f64 * spacing + rng.gen_range(-0.05..0.05),
                    y as f64 * spacing + rng.gen_range(-0.05..0.05),
                    z as f64 * spacing + rng.gen_range(-0.05..0.05),
                );
                simbox.wrap(&mut position);
                particles.push(Particle::new(position));
            }
        }
    }

    System::new("LJ fluid", particles, Some(simbox))
}

fn settings() -> NeighborSettings {
    NeighborSettings::default()
        .with_interaction_range(2.5)
        .with_neighbor_range(2.8)
        .with_safety_factor(0.4)
}

fn benchmark(c: &mut Criterion) {
    let mut system = fluid(16, 42);
    let mut manager = NeighborManager::new(settings()).unwrap();
    manager.attach(&system).unwrap();

    let mut master = PotentialMaster::new();
    master.add_potential(Potential::Pair(Box::new(LennardJones)));

    c.bench_function("NeighborManager::build (4096 particles)", |b| {
        b.iter(|| {
            manager.build(&system).unwrap();
            std::hint::black_box(manager.n_pairs());
        })
    });

    c.bench_function("NeighborManager::update (no rebuild)", |b| {
        b.iter(|| {
            std::hint::black_box(manager.update(&system).unwrap());
        })
    });

    c.bench_function("PotentialMaster::calculate (energy)", |b| {
        let mut energy = EnergySum::new();
        b.iter(|| {
            energy.zero_sum();
            master
                .calculate(&system, &manager, &IteratorDirective::all(), &mut energy)
                .unwrap();
            std::hint::black_box(energy.sum());
        })
    });

    c.bench_function("PotentialMaster::calculate (forces)", |b| {
        let mut forces = ForceSum::new(system.get_n_particles());
        b.iter(|| {
            forces.zero_sum();
            master
                .calculate(&system, &manager, &IteratorDirective::all(), &mut forces)
                .unwrap();
            std::hint::black_box(forces.forces());
        })
    });

    c.bench_function("PotentialMaster::calculate (single particle)", |b| {
        let mut energy = EnergySum::new();
        b.iter(|| {
            energy.zero_sum();
            master
                .calculate(&system, &manager, &IteratorDirective::particle(2048), &mut energy)
                .unwrap();
            std::hint::black_box(energy.sum());
        })
    });

    c.bench_function("NeighborManager::update (with rebuild)", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| {
            let index = rng.gen_range(0..system.get_n_particles());
            system.particle_translate(index, &Vector3D::new(0.2, 0.0, 0.0));
            std::hint::black_box(manager.update(&system).unwrap());
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
