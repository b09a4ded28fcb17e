//! Two-dimensional D2Q9 lattice Boltzmann solver with BGK collision, driven by
//! an oscillating velocity band that seeds ripples.
//!
//! Each step runs force → collide → stream → macroscopic update and then
//! hands a [`observer::Snapshot`] to an [`observer::Observer`].

pub mod collision;
pub mod config;
pub mod forcing;
pub mod lattice;
pub mod macroscopic;
pub mod observer;
pub mod sim;
pub mod streaming;

pub use config::{DensityPulse, SimConfig, SimConfigError};
pub use lattice::{CellIndexError, Execution, LatticeField};
pub use observer::{NullObserver, Observer, Snapshot};
pub use sim::{MetricsRecorder, RunSummary, SimError, Simulator, StepMetrics, StepTimings};
pub use streaming::EdgeStreaming;
