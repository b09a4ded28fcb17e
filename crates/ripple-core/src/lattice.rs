//! D2Q9 lattice constants and the per-cell distribution storage.
//!
//! Directions are laid out as a row-major 3×3 stencil with the rest
//! direction in the middle:
//! ```text
//!   0   1   2        (-1, 1) (0, 1) (1, 1)
//!   3   4   5   =    (-1, 0) (0, 0) (1, 0)
//!   6   7   8        (-1,-1) (0,-1) (1,-1)
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Number of discrete velocities.
pub const Q: usize = 9;

/// Index of the rest direction.
pub const REST: usize = 4;

/// Discrete velocities as `[ex, ey]`.
pub const DIRECTIONS: [[i32; 2]; Q] = [
    [-1, 1],
    [0, 1],
    [1, 1],
    [-1, 0],
    [0, 0],
    [1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
];

pub const WEIGHTS: [f64; Q] = [
    1.0 / 36.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 9.0,
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 9.0,
    1.0 / 36.0,
];

/// Lattice speed of sound squared (cs = 1/√3).
pub const CS2: f64 = 1.0 / 3.0;

/// How a whole-grid pass distributes its rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    Serial,
    #[default]
    Parallel,
}

/// Run `kernel(y, row)` over every row of a row-major buffer.
///
/// The parallel variant splits the buffer into disjoint rows and returns only
/// after every row is written.
pub(crate) fn for_each_row<T, F>(cells: &mut [T], width: usize, execution: Execution, kernel: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    match execution {
        Execution::Serial => cells
            .chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| kernel(y, row)),
        Execution::Parallel => cells
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| kernel(y, row)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellIndexError {
    pub y: usize,
    pub x: usize,
    pub height: usize,
    pub width: usize,
}

impl fmt::Display for CellIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell ({}, {}) outside lattice of {}x{} (height x width)",
            self.y, self.x, self.height, self.width
        )
    }
}

impl Error for CellIndexError {}

/// Per-cell 9-component particle distribution, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct LatticeField {
    height: usize,
    width: usize,
    cells: Vec<[f64; Q]>,
}

impl LatticeField {
    /// Field at rest: every cell holds the lattice weights (rho = 1, u = 0).
    ///
    /// Any extent is accepted here; a grid thinner than 3 cells has no
    /// interior, so [`interior_mass`](Self::interior_mass) is zero for it.
    /// `SimConfig::validate` rejects such grids before a simulator is built.
    pub fn at_rest(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![WEIGHTS; height * width],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cells(&self) -> &[[f64; Q]] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [[f64; Q]] {
        &mut self.cells
    }

    fn index(&self, y: usize, x: usize) -> Result<usize, CellIndexError> {
        if y >= self.height || x >= self.width {
            return Err(CellIndexError {
                y,
                x,
                height: self.height,
                width: self.width,
            });
        }
        Ok(y * self.width + x)
    }

    pub fn get(&self, y: usize, x: usize) -> Result<[f64; Q], CellIndexError> {
        self.index(y, x).map(|i| self.cells[i])
    }

    pub fn set(&mut self, y: usize, x: usize, f: [f64; Q]) -> Result<(), CellIndexError> {
        let i = self.index(y, x)?;
        self.cells[i] = f;
        Ok(())
    }

    /// True for cells on the outermost ring of the grid.
    pub fn is_boundary(&self, y: usize, x: usize) -> bool {
        is_boundary(y, x, self.height, self.width)
    }

    pub fn cell_density(&self, y: usize, x: usize) -> Result<f64, CellIndexError> {
        self.get(y, x).map(|f| f.iter().sum())
    }

    pub fn total_mass(&self) -> f64 {
        self.cells.iter().map(|f| f.iter().sum::<f64>()).sum()
    }

    /// Mass summed over the cells not on the boundary ring.
    pub fn interior_mass(&self) -> f64 {
        if self.height < 3 || self.width < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for y in 1..self.height - 1 {
            let row = &self.cells[y * self.width..(y + 1) * self.width];
            sum += row[1..self.width - 1]
                .iter()
                .map(|f| f.iter().sum::<f64>())
                .sum::<f64>();
        }
        sum
    }
}

#[inline]
pub(crate) fn is_boundary(y: usize, x: usize, height: usize, width: usize) -> bool {
    y == 0 || x == 0 || y + 1 == height || x + 1 == width
}
