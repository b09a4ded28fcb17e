//! Per-step output of the simulator.
//!
//! Rendering and any output format belong to the observer; the simulator only
//! hands over read-only views of the macroscopic fields.

/// Macroscopic state after a completed step.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub step: usize,
    pub height: usize,
    pub width: usize,
    /// Row-major density field.
    pub density: &'a [f64],
    /// Row-major velocity field.
    pub velocity: &'a [[f64; 2]],
}

impl<'a> Snapshot<'a> {
    fn index(&self, y: usize, x: usize) -> Option<usize> {
        (y < self.height && x < self.width).then(|| y * self.width + x)
    }

    pub fn density_at(&self, y: usize, x: usize) -> Option<f64> {
        self.index(y, x).map(|i| self.density[i])
    }

    pub fn velocity_at(&self, y: usize, x: usize) -> Option<[f64; 2]> {
        self.index(y, x).map(|i| self.velocity[i])
    }

    /// `rho * u` at a cell.
    pub fn momentum_at(&self, y: usize, x: usize) -> Option<[f64; 2]> {
        self.index(y, x).map(|i| {
            let rho = self.density[i];
            let u = self.velocity[i];
            [rho * u[0], rho * u[1]]
        })
    }
}

pub trait Observer {
    fn observe(&mut self, snapshot: &Snapshot<'_>);
}

impl<F> Observer for F
where
    F: FnMut(&Snapshot<'_>),
{
    fn observe(&mut self, snapshot: &Snapshot<'_>) {
        self(snapshot)
    }
}

/// Discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn observe(&mut self, _snapshot: &Snapshot<'_>) {}
}
