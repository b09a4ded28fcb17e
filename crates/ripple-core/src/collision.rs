//! BGK single-relaxation-time collision.

use crate::lattice::{for_each_row, is_boundary, Execution, LatticeField, CS2, DIRECTIONS, Q, WEIGHTS};

/// Second-order truncated Maxwell–Boltzmann equilibrium for one cell.
///
/// `eq_i = rho * w_i * (1 + e·u/cs² + (e·u)²/(2cs⁴) − |u|²/(2cs²))`
#[inline]
pub fn equilibrium(rho: f64, u: [f64; 2]) -> [f64; Q] {
    let u_sq = u[0] * u[0] + u[1] * u[1];
    let mut eq = [0.0; Q];
    for (i, e) in DIRECTIONS.iter().enumerate() {
        let dotted = u[0] * e[0] as f64 + u[1] * e[1] as f64;
        let taylor =
            1.0 + dotted / CS2 + (dotted * dotted) / (2.0 * CS2 * CS2) - u_sq / (2.0 * CS2);
        eq[i] = rho * taylor * WEIGHTS[i];
    }
    eq
}

/// Post-collision distribution of a single cell.
///
/// Boundary cells are replaced by their local equilibrium; interior cells
/// relax towards it over `tau`.
#[inline]
pub fn collide_cell(f: &[f64; Q], rho: f64, u: [f64; 2], tau: f64, boundary: bool) -> [f64; Q] {
    let eq = equilibrium(rho, u);
    if boundary {
        return eq;
    }
    let mut post = [0.0; Q];
    for i in 0..Q {
        post[i] = f[i] + (eq[i] - f[i]) / tau;
    }
    post
}

/// Collision over the whole grid, reading `src` and writing `dst`.
///
/// `density` and `velocity` are row-major and match the lattice shape.
pub fn collide(
    src: &LatticeField,
    density: &[f64],
    velocity: &[[f64; 2]],
    tau: f64,
    dst: &mut LatticeField,
    execution: Execution,
) {
    let (height, width) = (src.height(), src.width());
    debug_assert_eq!((dst.height(), dst.width()), (height, width));
    debug_assert_eq!(density.len(), height * width);
    debug_assert_eq!(velocity.len(), height * width);

    let f = src.cells();
    for_each_row(dst.cells_mut(), width, execution, |y, row| {
        let base = y * width;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = base + x;
            *out = collide_cell(
                &f[idx],
                density[idx],
                velocity[idx],
                tau,
                is_boundary(y, x, height, width),
            );
        }
    });
}
