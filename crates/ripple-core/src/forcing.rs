//! Oscillating velocity source along a vertical band of cells.

use std::f64::consts::PI;
use std::ops::Range;

/// Imposes `u = sin(step * omega) * velocity` on rows `[margin, height - margin)`
/// of the grid's middle column.
#[derive(Clone, Debug, PartialEq)]
pub struct Forcing {
    omega: f64,
    velocity: [f64; 2],
    rows: Range<usize>,
    column: usize,
}

impl Forcing {
    pub fn new(height: usize, width: usize, frequency: f64, velocity: [f64; 2], margin: usize) -> Self {
        Self {
            omega: 2.0 * PI * frequency,
            velocity,
            rows: margin..height.saturating_sub(margin),
            column: width / 2,
        }
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn is_forced(&self, y: usize, x: usize) -> bool {
        x == self.column && self.rows.contains(&y)
    }

    /// Velocity imposed at `step`.
    pub fn velocity_at(&self, step: usize) -> [f64; 2] {
        let phase = (step as f64 * self.omega).sin();
        [phase * self.velocity[0], phase * self.velocity[1]]
    }

    /// Overwrite the velocity of every forced cell; density is left alone.
    pub fn apply(&self, step: usize, velocity: &mut [[f64; 2]], width: usize) -> [f64; 2] {
        let u = self.velocity_at(step);
        for y in self.rows.clone() {
            velocity[y * width + self.column] = u;
        }
        u
    }
}
