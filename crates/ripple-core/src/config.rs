use crate::lattice::Execution;
use crate::streaming::EdgeStreaming;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// A cell initialized to rest equilibrium at a non-unit density.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityPulse {
    pub y: usize,
    pub x: usize,
    pub density: f64,
}

/// Construction-time simulation parameters. There is no runtime
/// reconfiguration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub height: usize,
    pub width: usize,
    /// BGK relaxation time; values at or below 0.5 are unstable.
    pub tau: f64,
    /// Forcing frequency in cycles per step.
    pub forcing_frequency: f64,
    /// Peak velocity imposed on the forcing band.
    pub forcing_velocity: [f64; 2],
    /// Rows excluded from the forcing band at the top and bottom.
    pub forcing_margin: usize,
    pub enable_forcing: bool,
    pub steps: usize,
    pub edge_streaming: EdgeStreaming,
    pub execution: Execution,
    pub initial_pulses: Vec<DensityPulse>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            height: 35,
            width: 70,
            tau: 0.55,
            forcing_frequency: 1.0 / 8.0,
            forcing_velocity: [0.2, 0.1],
            forcing_margin: 10,
            enable_forcing: true,
            steps: 1200,
            edge_streaming: EdgeStreaming::Pinned,
            execution: Execution::Parallel,
            initial_pulses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    GridTooSmall {
        height: usize,
        width: usize,
    },
    TooManyCells {
        max: usize,
        actual: usize,
    },
    NonPositiveTau(f64),
    NonFinite {
        field: &'static str,
    },
    EmptyForcingBand {
        margin: usize,
        height: usize,
        width: usize,
    },
    TooManySteps {
        max: usize,
        actual: usize,
    },
    PulseOutOfGrid {
        y: usize,
        x: usize,
    },
    NonPositivePulseDensity {
        y: usize,
        x: usize,
        density: f64,
    },
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::GridTooSmall { height, width } => write!(
                f,
                "grid must be at least 3x3, got {height}x{width} (height x width)"
            ),
            SimConfigError::TooManyCells { max, actual } => {
                write!(f, "grid cell count ({actual}) exceeds supported maximum ({max})")
            }
            SimConfigError::NonPositiveTau(tau) => {
                write!(f, "tau must be positive, got {tau}")
            }
            SimConfigError::NonFinite { field } => write!(f, "{field} must be finite"),
            SimConfigError::EmptyForcingBand {
                margin,
                height,
                width,
            } => write!(
                f,
                "forcing_margin ({margin}) leaves no forcing band on a {height}x{width} grid"
            ),
            SimConfigError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            SimConfigError::PulseOutOfGrid { y, x } => {
                write!(f, "initial pulse at ({y}, {x}) lies outside the grid")
            }
            SimConfigError::NonPositivePulseDensity { y, x, density } => write!(
                f,
                "initial pulse at ({y}, {x}) must have a finite positive density, got {density}"
            ),
        }
    }
}

impl Error for SimConfigError {}

impl SimConfig {
    pub const MIN_EXTENT: usize = 3;
    pub const MAX_CELLS: usize = 16_777_216;
    pub const MAX_STEPS: usize = 10_000_000;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.height < Self::MIN_EXTENT || self.width < Self::MIN_EXTENT {
            return Err(SimConfigError::GridTooSmall {
                height: self.height,
                width: self.width,
            });
        }
        let cells = self
            .height
            .checked_mul(self.width)
            .unwrap_or(usize::MAX);
        if cells > Self::MAX_CELLS {
            return Err(SimConfigError::TooManyCells {
                max: Self::MAX_CELLS,
                actual: cells,
            });
        }
        if !self.tau.is_finite() {
            return Err(SimConfigError::NonFinite { field: "tau" });
        }
        if self.tau <= 0.0 {
            return Err(SimConfigError::NonPositiveTau(self.tau));
        }
        if !self.forcing_frequency.is_finite() {
            return Err(SimConfigError::NonFinite {
                field: "forcing_frequency",
            });
        }
        if !self.forcing_velocity.iter().all(|v| v.is_finite()) {
            return Err(SimConfigError::NonFinite {
                field: "forcing_velocity",
            });
        }
        if self.enable_forcing
            && self.forcing_margin.saturating_mul(2) >= self.height.min(self.width)
        {
            return Err(SimConfigError::EmptyForcingBand {
                margin: self.forcing_margin,
                height: self.height,
                width: self.width,
            });
        }
        if self.steps > Self::MAX_STEPS {
            return Err(SimConfigError::TooManySteps {
                max: Self::MAX_STEPS,
                actual: self.steps,
            });
        }
        for pulse in &self.initial_pulses {
            if pulse.y >= self.height || pulse.x >= self.width {
                return Err(SimConfigError::PulseOutOfGrid {
                    y: pulse.y,
                    x: pulse.x,
                });
            }
            if !(pulse.density.is_finite() && pulse.density > 0.0) {
                return Err(SimConfigError::NonPositivePulseDensity {
                    y: pulse.y,
                    x: pulse.x,
                    density: pulse.density,
                });
            }
        }
        if self.tau <= 0.5 {
            log::warn!(
                "tau = {} is at or below 0.5; the BGK relaxation is numerically unstable",
                self.tau
            );
        }
        Ok(())
    }
}
