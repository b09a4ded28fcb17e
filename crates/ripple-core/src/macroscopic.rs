//! Density and velocity as the zeroth and first moments of the distribution.

use crate::lattice::{Execution, LatticeField, DIRECTIONS, Q};
use rayon::prelude::*;

/// A cell whose moments cannot be turned into a velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergentCell {
    pub y: usize,
    pub x: usize,
    pub density: f64,
}

/// `(rho, rho * u)` of one cell.
#[inline]
pub fn moments(f: &[f64; Q]) -> (f64, [f64; 2]) {
    let mut rho = 0.0;
    let mut momentum = [0.0; 2];
    for (e, &v) in DIRECTIONS.iter().zip(f.iter()) {
        rho += v;
        momentum[0] += e[0] as f64 * v;
        momentum[1] += e[1] as f64 * v;
    }
    (rho, momentum)
}

/// Recompute `density` and `velocity` for every cell of `f`.
///
/// Each cell's moments are taken once and both outputs are written in the
/// same row pass. Fails on the first cell found with zero or non-finite
/// density, or with a non-finite velocity. Cells are never clamped.
pub fn update(
    f: &LatticeField,
    density: &mut [f64],
    velocity: &mut [[f64; 2]],
    execution: Execution,
) -> Result<(), DivergentCell> {
    let width = f.width();
    debug_assert_eq!(density.len(), f.height() * width);
    debug_assert_eq!(velocity.len(), f.height() * width);

    let cells = f.cells();
    let kernel = |y: usize, rho_row: &mut [f64], u_row: &mut [[f64; 2]]| {
        let row = &cells[y * width..(y + 1) * width];
        for (x, ((cell, rho_out), u_out)) in row
            .iter()
            .zip(rho_row.iter_mut())
            .zip(u_row.iter_mut())
            .enumerate()
        {
            let (rho, momentum) = moments(cell);
            *rho_out = rho;
            if rho == 0.0 || !rho.is_finite() {
                return Err(DivergentCell { y, x, density: rho });
            }
            let u = [momentum[0] / rho, momentum[1] / rho];
            if !(u[0].is_finite() && u[1].is_finite()) {
                return Err(DivergentCell { y, x, density: rho });
            }
            *u_out = u;
        }
        Ok(())
    };

    match execution {
        Execution::Serial => density
            .chunks_mut(width)
            .zip(velocity.chunks_mut(width))
            .enumerate()
            .try_for_each(|(y, (rho_row, u_row))| kernel(y, rho_row, u_row)),
        Execution::Parallel => density
            .par_chunks_mut(width)
            .zip(velocity.par_chunks_mut(width))
            .enumerate()
            .try_for_each(|(y, (rho_row, u_row))| kernel(y, rho_row, u_row)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::equilibrium;

    #[test]
    fn moments_of_equilibrium_recover_state() {
        let f = equilibrium(1.1, [0.05, -0.02]);
        let (rho, momentum) = moments(&f);
        assert!((rho - 1.1).abs() < 1e-12);
        assert!((momentum[0] - 1.1 * 0.05).abs() < 1e-12);
        assert!((momentum[1] + 1.1 * 0.02).abs() < 1e-12);
    }

    #[test]
    fn update_fills_every_cell() {
        let mut field = LatticeField::at_rest(3, 4);
        field.set(1, 2, equilibrium(0.7, [0.1, 0.0])).unwrap();
        for execution in [Execution::Serial, Execution::Parallel] {
            let mut density = vec![0.0; 12];
            let mut velocity = vec![[9.0, 9.0]; 12];
            update(&field, &mut density, &mut velocity, execution).unwrap();
            assert!((density[6] - 0.7).abs() < 1e-12);
            assert!((velocity[6][0] - 0.1).abs() < 1e-12);
            assert!(velocity[6][1].abs() < 1e-12);
            assert!((density[0] - 1.0).abs() < 1e-14);
            assert!(velocity[0][0].abs() < 1e-15 && velocity[0][1].abs() < 1e-15);
        }
    }

    #[test]
    fn zero_density_is_reported_with_its_cell() {
        let mut field = LatticeField::at_rest(3, 3);
        field.set(2, 1, [0.0; Q]).unwrap();
        let mut density = vec![0.0; 9];
        let mut velocity = vec![[0.0; 2]; 9];
        let err = update(&field, &mut density, &mut velocity, Execution::Serial).unwrap_err();
        assert_eq!(
            err,
            DivergentCell {
                y: 2,
                x: 1,
                density: 0.0
            }
        );
    }

    #[test]
    fn non_finite_density_is_reported() {
        let mut field = LatticeField::at_rest(3, 3);
        let mut bad = [0.1; Q];
        bad[0] = f64::NAN;
        field.set(1, 1, bad).unwrap();
        let mut density = vec![0.0; 9];
        let mut velocity = vec![[0.0; 2]; 9];
        let err = update(&field, &mut density, &mut velocity, Execution::Parallel).unwrap_err();
        assert_eq!((err.y, err.x), (1, 1));
        assert!(err.density.is_nan());
    }

    #[test]
    fn one_pass_matches_cell_moments_in_both_modes() {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha12Rng;

        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let mut field = LatticeField::at_rest(5, 7);
        for y in 0..5 {
            for x in 0..7 {
                let mut cell = [0.0; Q];
                for v in cell.iter_mut() {
                    *v = rng.random_range(0.01..0.3);
                }
                field.set(y, x, cell).unwrap();
            }
        }

        let mut outputs = Vec::new();
        for execution in [Execution::Serial, Execution::Parallel] {
            let mut density = vec![0.0; 35];
            let mut velocity = vec![[0.0; 2]; 35];
            update(&field, &mut density, &mut velocity, execution).unwrap();
            for (idx, cell) in field.cells().iter().enumerate() {
                let (rho, momentum) = moments(cell);
                assert_eq!(density[idx], rho);
                assert_eq!(velocity[idx], [momentum[0] / rho, momentum[1] / rho]);
            }
            outputs.push((density, velocity));
        }
        assert_eq!(outputs[0], outputs[1]);
    }
}
