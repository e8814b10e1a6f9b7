// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Implementation of CellGrid for speeding up neighbor searches.

use std::ops::{Range, RangeFull, RangeInclusive};

use itertools::iproduct;
use ndarray::Array3;

use crate::{
    errors::CellGridError,
    structures::{particle::Particle, simbox::SimBox, vector3d::Vector3D},
};

/// Spatial index assigning particles to regions of the simulation box.
///
/// Implementors must guarantee that every pair of particles closer than the
/// cell size is reachable by scanning [`SpatialIndex::cells_near`] of either particle.
pub trait SpatialIndex {
    /// Assign particle with the given index to the region containing `position`,
    /// removing it from the region it was previously assigned to.
    fn assign(&mut self, index: usize, position: &Vector3D) -> Result<(), CellGridError>;

    /// Iterate over the particle indices of the region of particle `index`
    /// and of all regions adjacent to it. Each region is visited at most once.
    fn cells_near(&self, index: usize) -> impl Iterator<Item = &[usize]> + '_;

    /// Reassign all particles. The index of each particle is its position in `particles`.
    fn rebuild_all(&mut self, particles: &[Particle]) -> Result<(), CellGridError>;
}

/// A structure for efficient searches within a cutoff.
///
/// Also commonly known as **cell lists**. See [Wikipedia](https://en.wikipedia.org/wiki/Cell_lists) for more information.
///
/// The simulation box is divided into a regular grid of cells, each at least as large as
/// the requested minimal cell size in every dimension. Particles closer to each other than
/// the minimal cell size are then always located in the same cell or in adjacent cells,
/// reducing the time complexity of neighbor searching from O(n^2) to O(n).
///
/// Two-dimensional boxes use a single layer of cells along the z-axis.
///
/// ## Example
/// ```
/// # use neighbors_rs::prelude::*;
/// #
/// let simbox = SimBox::new_2d(10.0, 10.0);
/// let particles = vec![
///     Particle::new([0.2, 0.2].into()),
///     Particle::new([9.8, 9.9].into()),
///     Particle::new([5.0, 5.0].into()),
/// ];
///
/// let mut grid = CellGrid::new(&simbox, 1.3, particles.len()).unwrap();
/// grid.rebuild_all(&particles).unwrap();
///
/// // particle 1 is a periodic neighbor of particle 0, particle 2 is far away
/// let candidates = grid.cells_near(0).flatten().copied().collect::<Vec<usize>>();
/// assert!(candidates.contains(&1));
/// assert!(!candidates.contains(&2));
/// ```
#[derive(Debug, Clone)]
pub struct CellGrid {
    /// Grid of cells storing particle indices.
    grid: Array3<Vec<usize>>,
    /// Dimensions of each cell of the grid.
    cell_size: Vector3D,
    /// Simulation box the grid has been constructed for.
    simbox: SimBox,
    /// Cell of each particle. `None` if the particle has not been assigned yet.
    assignment: Vec<Option<[usize; 3]>>,
    /// Cells which are considered adjacent.
    neighbors: CellNeighbors,
}

/// Specifies the range of cells, relative to the reference cell, which should
/// be visited in each dimension when searching for neighbours in a CellGrid.
/// It is guaranteed that no cell is visited multiple times.
///
/// See [`CellNeighbors::new`] for more information.
#[derive(Debug, Clone)]
pub struct CellNeighbors {
    /// Range of neighboring cells along the x-axis.
    x: NeighborsRange,
    /// Range of neighboring cells along the y-axis.
    y: NeighborsRange,
    /// Range of neighboring cells along the z-axis.
    z: NeighborsRange,
}

/// Helper enum for specifying the range for neighbors selection.
#[derive(Debug, Clone)]
pub enum NeighborsRange {
    Exclusive(Range<isize>),
    Inclusive(RangeInclusive<isize>),
    Full(RangeFull),
}

impl Default for NeighborsRange {
    fn default() -> Self {
        Self::Exclusive(-1..2)
    }
}

impl From<Range<isize>> for NeighborsRange {
    fn from(value: Range<isize>) -> Self {
        Self::Exclusive(value)
    }
}

impl From<RangeInclusive<isize>> for NeighborsRange {
    fn from(value: RangeInclusive<isize>) -> Self {
        Self::Inclusive(value)
    }
}

impl From<RangeFull> for NeighborsRange {
    fn from(value: RangeFull) -> Self {
        Self::Full(value)
    }
}

impl NeighborsRange {
    /// Convert the `NeighborsRange` to an exclusive range for iteration.
    ///
    /// Along periodic axes, the range is trimmed so that no cell is visited multiple times
    /// due to PBC wrapping. Along non-periodic axes, cells outside the grid are skipped
    /// during iteration so no trimming is needed.
    fn convert(&self, n: usize, periodic: bool) -> Range<isize> {
        let n = n as isize;
        let range = match self {
            Self::Exclusive(x) => x.clone(),
            Self::Inclusive(x) => (*x.start())..(*x.end() + 1),
            Self::Full(_) => return if periodic { 0..n } else { (1 - n)..n },
        };

        if periodic && range.end - range.start > n {
            0..n
        } else {
            range
        }
    }
}

impl Default for CellNeighbors {
    /// Construct a default `CellNeighbors` structure selecting the reference cell
    /// and all directly adjacent cells.
    fn default() -> Self {
        CellNeighbors {
            x: NeighborsRange::default(),
            y: NeighborsRange::default(),
            z: NeighborsRange::default(),
        }
    }
}

impl CellNeighbors {
    /// Set the range of cells, relative to the reference cell,
    /// which should be visited in each dimension when searching for
    /// neighbours in a CellGrid.
    ///
    /// ## Examples
    /// The examples assume that the size of each cell in your grid is 1×1×1.
    /// - If your cutoff is 0.8, use a range of `-1..=1` for each dimension.
    ///   (In this scenario, you can also simply call `CellNeighbors::default`.)
    /// - If your cutoff is 2.9, use a range of `-3..=3` for each dimension.
    /// - If you are only interested in what is "in front of" the reference point,
    ///   use a range of `0..=1` for each dimension.
    pub fn new(
        x: impl Into<NeighborsRange>,
        y: impl Into<NeighborsRange>,
        z: impl Into<NeighborsRange>,
    ) -> Self {
        CellNeighbors {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }

    /// Convert `NeighborsRanges` into iterable exclusive ranges.
    #[inline(always)]
    fn convert(
        &self,
        ncells: (usize, usize, usize),
        periodic: [bool; 3],
    ) -> (Range<isize>, Range<isize>, Range<isize>) {
        (
            self.x.convert(ncells.0, periodic[0]),
            self.y.convert(ncells.1, periodic[1]),
            self.z.convert(ncells.2, periodic[2]),
        )
    }
}

impl CellGrid {
    /// Create a new empty [`CellGrid`] for the provided simulation box.
    ///
    /// ## Parameters
    /// - `simbox`: simulation box to divide into cells
    /// - `min_cell_size`: minimal edge length of each cell; should be equal to or larger
    ///   than the largest distance at which neighbors are searched for
    /// - `n_particles`: number of particles that can be assigned into the grid
    ///
    /// ## Notes
    /// - If `min_cell_size` is larger than a dimension of the simulation box, only
    ///   one cell is used along this dimension.
    pub fn new(
        simbox: &SimBox,
        min_cell_size: f64,
        n_particles: usize,
    ) -> Result<CellGrid, CellGridError> {
        if !min_cell_size.is_finite() || min_cell_size <= 0.0 {
            return Err(CellGridError::InvalidCellSize(min_cell_size.to_string()));
        }

        simbox.check()?;

        let xcells = Self::cells_along(simbox.x, min_cell_size);
        let ycells = Self::cells_along(simbox.y, min_cell_size);
        let (zcells, zsize) = if simbox.is_2d() {
            (1, 1.0)
        } else {
            let n = Self::cells_along(simbox.z, min_cell_size);
            (n, simbox.z / n as f64)
        };

        let cell_size = Vector3D::new(
            simbox.x / xcells as f64,
            simbox.y / ycells as f64,
            zsize,
        );

        log::trace!(
            "Constructed cell grid with {}x{}x{} cells (cell size: {:.4} x {:.4} x {:.4}).",
            xcells,
            ycells,
            zcells,
            cell_size.x,
            cell_size.y,
            cell_size.z
        );

        Ok(CellGrid {
            grid: Array3::from_elem((xcells, ycells, zcells), Vec::new()),
            cell_size,
            simbox: simbox.clone(),
            assignment: vec![None; n_particles],
            neighbors: CellNeighbors::default(),
        })
    }

    /// Get the number of cells along each dimension.
    pub fn n_cells(&self) -> [usize; 3] {
        let (x, y, z) = self.grid.dim();
        [x, y, z]
    }

    /// Get the size of each cell.
    pub fn cell_size(&self) -> &Vector3D {
        &self.cell_size
    }

    /// Get the simulation box the grid has been constructed for.
    pub fn simbox(&self) -> &SimBox {
        &self.simbox
    }

    /// Get the number of particles the grid can hold.
    pub fn n_particles(&self) -> usize {
        self.assignment.len()
    }

    /// Get the index of the cell the particle is assigned to.
    pub fn cell_of(&self, index: usize) -> Option<[usize; 3]> {
        self.assignment.get(index).copied().flatten()
    }

    /// Get the particle indices assigned to the specified cell.
    pub fn particles_in(&self, cell: [usize; 3]) -> Option<&[usize]> {
        self.grid.get(cell).map(|x| x.as_slice())
    }

    /// Returns an iterator over all particles that have been assigned into the `CellGrid`
    /// and that are located in cells neighboring the `reference` point.
    ///
    /// ## Params
    /// - `reference` - coordinates of the reference point
    /// - `ranges` - specifies what cells should be considered neighbors,
    ///    see [`CellNeighbors`] for more information
    ///
    /// ## Notes
    /// - The order in which the particles are visited is **undefined**,
    ///   but each particle will be visited at most once.
    /// - The `reference` point does not need to be wrapped into the simulation box.
    pub fn neighbors_of_point<'a>(
        &'a self,
        reference: &Vector3D,
        ranges: &CellNeighbors,
    ) -> impl Iterator<Item = usize> + 'a {
        let cell = self.pos2index(reference);
        self.cells_around(cell, ranges).flatten().copied()
    }

    /// Iterate over cells around `cell` as specified by `ranges`.
    fn cells_around<'a>(
        &'a self,
        cell: [usize; 3],
        ranges: &CellNeighbors,
    ) -> impl Iterator<Item = &'a [usize]> + 'a {
        let ncells = self.grid.dim();
        let periodic = self.effective_periodicity();
        let (xrange, yrange, zrange) = ranges.convert(ncells, periodic);

        iproduct!(xrange, yrange, zrange).filter_map(move |(dx, dy, dz)| {
            let nx = Self::shift_index(cell[0], dx, ncells.0, periodic[0])?;
            let ny = Self::shift_index(cell[1], dy, ncells.1, periodic[1])?;
            let nz = Self::shift_index(cell[2], dz, ncells.2, periodic[2])?;

            Some(
                self.grid
                    .get([nx, ny, nz])
                    .expect("FATAL NEIGHBORS ERROR | CellGrid::cells_around | Nonexistent cell visited.")
                    .as_slice(),
            )
        })
    }

    /// Periodicity of the grid axes. The single z-layer of a two-dimensional grid
    /// is treated as periodic so that it is always visited exactly once.
    #[inline]
    fn effective_periodicity(&self) -> [bool; 3] {
        let mut periodic = self.simbox.periodicity();
        if self.simbox.is_2d() {
            periodic[2] = true;
        }
        periodic
    }

    /// Shift cell index along one dimension. Returns `None` if the shifted cell lies
    /// outside of the grid along a non-periodic dimension.
    #[inline(always)]
    fn shift_index(index: usize, shift: isize, n: usize, periodic: bool) -> Option<usize> {
        let shifted = index as isize + shift;
        if periodic {
            Some(shifted.rem_euclid(n as isize) as usize)
        } else if shifted < 0 || shifted >= n as isize {
            None
        } else {
            Some(shifted as usize)
        }
    }

    /// Calculate the number of cells along a dimension of the simulation box.
    ///
    /// ## Panics
    /// - Panics if `box_len` or `cell_size` are not positive.
    #[inline]
    fn cells_along(box_len: f64, cell_size: f64) -> usize {
        assert!(
            box_len > 0.0,
            "FATAL NEIGHBORS ERROR | CellGrid::cells_along | `box_len` is not positive."
        );
        assert!(
            cell_size > 0.0,
            "FATAL NEIGHBORS ERROR | CellGrid::cells_along | `cell_size` is not positive."
        );

        (box_len / cell_size).floor().max(1.0) as usize
    }

    /// Convert a position to index of the cell of the grid.
    /// Positions are wrapped along periodic axes and clamped to the edge cells along non-periodic axes.
    #[inline(always)]
    fn pos2index(&self, pos: &Vector3D) -> [usize; 3] {
        let mut wrapped = *pos;
        self.simbox.wrap(&mut wrapped);
        let (xcells, ycells, zcells) = self.grid.dim();

        [
            Self::coordinate2index(wrapped.x, self.cell_size.x, xcells),
            Self::coordinate2index(wrapped.y, self.cell_size.y, ycells),
            Self::coordinate2index(wrapped.z, self.cell_size.z, zcells),
        ]
    }

    #[inline(always)]
    fn coordinate2index(coordinate: f64, cell_size: f64, n: usize) -> usize {
        // wrapping can produce exactly the box length due to rounding
        ((coordinate / cell_size).floor() as isize).clamp(0, n as isize - 1) as usize
    }
}

impl SpatialIndex for CellGrid {
    fn assign(&mut self, index: usize, position: &Vector3D) -> Result<(), CellGridError> {
        if index >= self.assignment.len() {
            return Err(CellGridError::NonexistentParticle(index));
        }

        if !position.is_finite() {
            return Err(CellGridError::InvalidPosition(index));
        }

        let new_cell = self.pos2index(position);

        if let Some(old_cell) = self.assignment[index] {
            if old_cell == new_cell {
                return Ok(());
            }

            let members = self
                .grid
                .get_mut(old_cell)
                .expect("FATAL NEIGHBORS ERROR | CellGrid::assign | Previous cell does not exist.");

            match members.iter().position(|&x| x == index) {
                Some(i) => {
                    members.swap_remove(i);
                }
                None => panic!(
                    "FATAL NEIGHBORS ERROR | CellGrid::assign | Particle `{}` is not in its cell `{:?}`.",
                    index, old_cell
                ),
            }
        }

        match self.grid.get_mut(new_cell) {
            Some(x) => x.push(index),
            None => panic!(
                "FATAL NEIGHBORS ERROR | CellGrid::assign | Cell index `{:?}` is out of range.",
                new_cell
            ),
        }

        self.assignment[index] = Some(new_cell);
        Ok(())
    }

    fn cells_near(&self, index: usize) -> impl Iterator<Item = &[usize]> + '_ {
        // unassigned particles have no neighboring cells
        let cell = self.cell_of(index);
        cell.into_iter()
            .flat_map(move |c| self.cells_around(c, &self.neighbors))
    }

    fn rebuild_all(&mut self, particles: &[Particle]) -> Result<(), CellGridError> {
        if particles.len() != self.assignment.len() {
            self.assignment.resize(particles.len(), None);
        }

        self.grid.iter_mut().for_each(|cell| cell.clear());
        self.assignment.iter_mut().for_each(|cell| *cell = None);

        for (index, particle) in particles.iter().enumerate() {
            self.assign(index, particle.get_position())?;
        }

        Ok(())
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
