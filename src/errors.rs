// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of errors that can be returned by the `neighbors_rs` library.

use thiserror::Error;

/// Errors that can occur when working with the simulation box.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimBoxError {
    #[error("Simulation box does not exist.")]
    DoesNotExist,
    #[error("All dimensions of the simulation box are zero.")]
    AllDimensionsZero,
    #[error("Dimension `{0}` of the simulation box is `{1}` which is not a positive finite number.")]
    InvalidDimension(char, f64),
}

/// Errors that can occur when constructing or updating a `CellGrid`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellGridError {
    #[error("Cell size `{0}` is invalid. It must be a positive finite number.")]
    InvalidCellSize(String),
    #[error("{0}")]
    SimBoxError(SimBoxError),
    #[error("Particle with index `{0}` does not exist in the cell grid.")]
    NonexistentParticle(usize),
    #[error("Particle with index `{0}` has a position that is not finite.")]
    InvalidPosition(usize),
}

/// Errors that can occur when configuring or using a neighbor list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeighborError {
    #[error("Interaction range `{interaction}` is invalid for neighbor range `{neighbor}`. Interaction range must be positive and smaller than the neighbor range.")]
    InvalidRange { interaction: f64, neighbor: f64 },
    #[error("Safety factor `{0}` is invalid. It must lie in the open interval (0, 0.5).")]
    InvalidSafetyFactor(f64),
    #[error("Neighbor list is not attached to any system.")]
    NotAttached,
    #[error("Neighbor lists have been invalidated by a change of configuration. Call `update` to rebuild them.")]
    Invalidated,
    #[error("Neighbor list was attached to a system with `{expected}` particles but the provided system contains `{found}` particles.")]
    SystemMismatch { expected: usize, found: usize },
    #[error("Particle with index `{0}` does not exist.")]
    NonexistentParticle(usize),
    #[error("Squared displacement `{0}` of some particle since the last rebuild exceeds the safe limit. Some neighbors may have been missed.")]
    UnsafeDisplacement(f64),
    #[error("{0}")]
    SimBoxError(SimBoxError),
    #[error("{0}")]
    CellGridError(CellGridError),
}

/// Errors that can occur when evaluating potentials over the neighbor lists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    #[error("{0}")]
    NeighborError(NeighborError),
    #[error("Calculation `{0}` does not support {1} potentials.")]
    UnsupportedArity(String, String),
    #[error("Potential cutoff `{cutoff}` exceeds the interaction range `{range}` of the neighbor list.")]
    CutoffExceedsRange { cutoff: f64, range: f64 },
    #[error("Particle with index `{0}` does not exist.")]
    NonexistentParticle(usize),
    #[error("Calculation `{calculation}` is sized for `{size}` particles but the system contains `{expected}` particles.")]
    SizeMismatch {
        calculation: String,
        size: usize,
        expected: usize,
    },
}

impl From<SimBoxError> for CellGridError {
    fn from(err: SimBoxError) -> Self {
        CellGridError::SimBoxError(err)
    }
}

impl From<SimBoxError> for NeighborError {
    fn from(err: SimBoxError) -> Self {
        NeighborError::SimBoxError(err)
    }
}

impl From<CellGridError> for NeighborError {
    fn from(err: CellGridError) -> Self {
        NeighborError::CellGridError(err)
    }
}

impl From<NeighborError> for CalculationError {
    fn from(err: NeighborError) -> Self {
        CalculationError::NeighborError(err)
    }
}
