pub mod metrics;

pub use metrics::*;

use crate::collision;
use crate::config::{SimConfig, SimConfigError};
use crate::forcing::Forcing;
use crate::lattice::{CellIndexError, LatticeField, CS2};
use crate::macroscopic::{self, DivergentCell};
use crate::observer::{NullObserver, Observer, Snapshot};
use crate::streaming;
use std::time::Instant;
use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    Config(SimConfigError),
    Index(CellIndexError),
    /// Zero or non-finite density (or a non-finite velocity) after streaming.
    NumericDivergence {
        step: usize,
        y: usize,
        x: usize,
        density: f64,
    },
    RunComplete {
        steps: usize,
    },
    InvalidSampleEvery,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(e) => write!(f, "{}", e),
            SimError::Index(e) => write!(f, "{}", e),
            SimError::NumericDivergence {
                step,
                y,
                x,
                density,
            } => write!(
                f,
                "numeric divergence at step {step}, cell ({y}, {x}): density {density}"
            ),
            SimError::RunComplete { steps } => {
                write!(f, "simulation already ran all {steps} steps")
            }
            SimError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
        }
    }
}

impl From<SimConfigError> for SimError {
    fn from(err: SimConfigError) -> Self {
        SimError::Config(err)
    }
}

impl From<CellIndexError> for SimError {
    fn from(err: CellIndexError) -> Self {
        SimError::Index(err)
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimError::Config(e) => Some(e),
            SimError::Index(e) => Some(e),
            _ => None,
        }
    }
}

/// D2Q9 BGK simulator owning the distribution buffers and macroscopic fields.
///
/// `f` holds the distribution between steps; `scratch` receives the
/// post-collision state and is streamed back into `f`, so neither buffer is
/// read and written within the same pass.
pub struct Simulator {
    config: SimConfig,
    forcing: Option<Forcing>,
    f: LatticeField,
    scratch: LatticeField,
    density: Vec<f64>,
    velocity: Vec<[f64; 2]>,
    /// Index of the next step to run.
    step_index: usize,
    /// Set once a step diverges; the buffers are then left untouched.
    failure: Option<SimError>,
}

impl Simulator {
    pub const MAX_SAMPLES: usize = 100_000;

    pub fn new(config: SimConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let (height, width) = (config.height, config.width);

        let mut f = LatticeField::at_rest(height, width);
        for pulse in &config.initial_pulses {
            f.set(
                pulse.y,
                pulse.x,
                collision::equilibrium(pulse.density, [0.0, 0.0]),
            )?;
        }

        let forcing = config.enable_forcing.then(|| {
            Forcing::new(
                height,
                width,
                config.forcing_frequency,
                config.forcing_velocity,
                config.forcing_margin,
            )
        });

        let mut density = vec![0.0; height * width];
        let mut velocity = vec![[0.0; 2]; height * width];
        macroscopic::update(&f, &mut density, &mut velocity, config.execution).map_err(
            |cell| SimError::NumericDivergence {
                step: 0,
                y: cell.y,
                x: cell.x,
                density: cell.density,
            },
        )?;

        Ok(Self {
            scratch: f.clone(),
            f,
            forcing,
            density,
            velocity,
            step_index: 0,
            failure: None,
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn forcing(&self) -> Option<&Forcing> {
        self.forcing.as_ref()
    }

    /// Number of steps completed so far.
    pub fn steps_done(&self) -> usize {
        self.step_index
    }

    pub fn remaining_steps(&self) -> usize {
        self.config.steps.saturating_sub(self.step_index)
    }

    pub fn is_done(&self) -> bool {
        self.remaining_steps() == 0
    }

    /// The divergence that aborted the run, if any. Once set, every further
    /// step returns it again.
    pub fn failure(&self) -> Option<&SimError> {
        self.failure.as_ref()
    }

    pub fn distribution(&self) -> &LatticeField {
        &self.f
    }

    pub fn density_field(&self) -> &[f64] {
        &self.density
    }

    pub fn velocity_field(&self) -> &[[f64; 2]] {
        &self.velocity
    }

    fn index(&self, y: usize, x: usize) -> Result<usize, CellIndexError> {
        if y >= self.height() || x >= self.width() {
            return Err(CellIndexError {
                y,
                x,
                height: self.height(),
                width: self.width(),
            });
        }
        Ok(y * self.width() + x)
    }

    pub fn density(&self, y: usize, x: usize) -> Result<f64, CellIndexError> {
        self.index(y, x).map(|i| self.density[i])
    }

    pub fn velocity(&self, y: usize, x: usize) -> Result<[f64; 2], CellIndexError> {
        self.index(y, x).map(|i| self.velocity[i])
    }

    pub fn momentum(&self, y: usize, x: usize) -> Result<[f64; 2], CellIndexError> {
        self.index(y, x).map(|i| {
            let rho = self.density[i];
            [rho * self.velocity[i][0], rho * self.velocity[i][1]]
        })
    }

    /// Lattice pressure `rho * cs²`.
    pub fn pressure(&self, y: usize, x: usize) -> Result<f64, CellIndexError> {
        self.density(y, x).map(|rho| rho * CS2)
    }

    /// Impose a velocity on a cell for the next collision. The next
    /// macroscopic update overwrites it.
    pub fn set_velocity(&mut self, y: usize, x: usize, u: [f64; 2]) -> Result<(), CellIndexError> {
        let i = self.index(y, x)?;
        self.velocity[i] = u;
        Ok(())
    }

    /// View of the macroscopic fields after the last completed step.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            step: self.step_index.saturating_sub(1),
            height: self.height(),
            width: self.width(),
            density: &self.density,
            velocity: &self.velocity,
        }
    }

    /// Advance one step without emitting a snapshot.
    pub fn step(&mut self) -> Result<StepTimings, SimError> {
        self.step_observed(&mut NullObserver)
    }

    /// Force, collide, stream, recompute moments, then hand the result to
    /// `observer`.
    pub fn step_observed<O: Observer + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<StepTimings, SimError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.is_done() {
            return Err(SimError::RunComplete {
                steps: self.config.steps,
            });
        }
        let step = self.step_index;
        let total_start = Instant::now();
        let execution = self.config.execution;
        let width = self.width();

        let t0 = Instant::now();
        if let Some(forcing) = &self.forcing {
            forcing.apply(step, &mut self.velocity, width);
        }
        let force_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        collision::collide(
            &self.f,
            &self.density,
            &self.velocity,
            self.config.tau,
            &mut self.scratch,
            execution,
        );
        let collide_us = t1.elapsed().as_micros() as u64;

        let t2 = Instant::now();
        streaming::stream(
            &self.scratch,
            &mut self.f,
            self.config.edge_streaming,
            execution,
        );
        let stream_us = t2.elapsed().as_micros() as u64;

        let t3 = Instant::now();
        if let Err(DivergentCell { y, x, density }) =
            macroscopic::update(&self.f, &mut self.density, &mut self.velocity, execution)
        {
            log::error!("step {step}: density {density} at cell ({y}, {x}), run aborted");
            let err = SimError::NumericDivergence {
                step,
                y,
                x,
                density,
            };
            self.failure = Some(err.clone());
            return Err(err);
        }
        let macroscopic_us = t3.elapsed().as_micros() as u64;

        self.step_index += 1;
        observer.observe(&self.snapshot());

        Ok(StepTimings {
            force_us,
            collide_us,
            stream_us,
            macroscopic_us,
            total_us: total_start.elapsed().as_micros() as u64,
        })
    }

    /// Run every remaining step, feeding each snapshot to `observer`.
    /// Returns the number of steps run.
    pub fn run<O: Observer + ?Sized>(&mut self, observer: &mut O) -> Result<usize, SimError> {
        let remaining = self.remaining_steps();
        log::info!(
            "running {} steps on a {}x{} lattice (tau {}, {:?} edges, {:?})",
            remaining,
            self.height(),
            self.width(),
            self.config.tau,
            self.config.edge_streaming,
            self.config.execution
        );
        for _ in 0..remaining {
            self.step_observed(observer)?;
        }
        Ok(remaining)
    }

    pub fn run_experiment(&mut self, sample_every: usize) -> RunSummary {
        self.try_run_experiment(sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Run every remaining step, sampling metrics every `sample_every` steps
    /// and on the final step.
    pub fn try_run_experiment(&mut self, sample_every: usize) -> Result<RunSummary, SimError> {
        if sample_every == 0 {
            return Err(SimError::InvalidSampleEvery);
        }
        let remaining = self.remaining_steps();
        let estimated_samples = if remaining == 0 {
            0
        } else {
            ((remaining - 1) / sample_every) + 1
        };
        let start = Instant::now();
        let mut recorder = MetricsRecorder::new(
            sample_every,
            self.config.steps.saturating_sub(1),
            estimated_samples.min(Self::MAX_SAMPLES),
        );
        let steps = self.run(&mut recorder)?;
        log::info!(
            "finished {} steps in {:.2?}, peak |u| {:.5}",
            steps,
            start.elapsed(),
            recorder.peak_speed()
        );
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            config: self.config.clone(),
            peak_speed: recorder.peak_speed(),
            samples: recorder.into_samples(),
        })
    }
}
