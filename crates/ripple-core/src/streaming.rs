//! Streaming: advect each direction one cell along its discrete velocity.

use crate::lattice::{for_each_row, is_boundary, Execution, LatticeField, DIRECTIONS, Q};
use serde::{Deserialize, Serialize};

/// Treatment of the outermost ring during streaming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStreaming {
    /// Ring cells keep their post-collision equilibrium; only interior cells
    /// pull from upstream.
    #[default]
    Pinned,
    /// Every cell, ring included, pulls from its upstream neighbour with
    /// wraparound at the array edges.
    Periodic,
}

/// Upstream coordinate along `-e` with periodic wraparound.
#[inline]
fn upstream(coord: usize, step: i32, len: usize) -> usize {
    match step {
        1 => {
            if coord == 0 {
                len - 1
            } else {
                coord - 1
            }
        }
        -1 => {
            if coord + 1 == len {
                0
            } else {
                coord + 1
            }
        }
        _ => coord,
    }
}

/// `dst(y, x, i) = src(y − e_i.y, x − e_i.x, i)`, wrapped modulo the grid.
pub fn stream(src: &LatticeField, dst: &mut LatticeField, edges: EdgeStreaming, execution: Execution) {
    let (height, width) = (src.height(), src.width());
    debug_assert_eq!((dst.height(), dst.width()), (height, width));

    let post = src.cells();
    for_each_row(dst.cells_mut(), width, execution, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            if edges == EdgeStreaming::Pinned && is_boundary(y, x, height, width) {
                *out = post[y * width + x];
                continue;
            }
            let mut pulled = [0.0; Q];
            for (i, e) in DIRECTIONS.iter().enumerate() {
                let sy = upstream(y, e[1], height);
                let sx = upstream(x, e[0], width);
                pulled[i] = post[sy * width + sx][i];
            }
            *out = pulled;
        }
    });
}
