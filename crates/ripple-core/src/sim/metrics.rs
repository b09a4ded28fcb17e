use super::Simulator;
use crate::config::SimConfig;
use crate::lattice::is_boundary;
use crate::observer::{Observer, Snapshot};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default)]
pub struct StepTimings {
    pub force_us: u64,
    pub collide_us: u64,
    pub stream_us: u64,
    pub macroscopic_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    pub total_mass: f64,
    pub interior_mass: f64,
    pub min_density: f64,
    pub max_density: f64,
    pub max_speed: f64,
    pub mean_speed: f64,
    /// Σ ½ rho |u|² over the grid.
    pub kinetic_energy: f64,
}

impl StepMetrics {
    pub fn from_snapshot(snapshot: &Snapshot<'_>) -> Self {
        let (height, width) = (snapshot.height, snapshot.width);
        let mut total_mass = 0.0;
        let mut interior_mass = 0.0;
        let mut min_density = f64::INFINITY;
        let mut max_density = f64::NEG_INFINITY;
        let mut max_speed = 0.0f64;
        let mut speed_sum = 0.0;
        let mut kinetic_energy = 0.0;

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let rho = snapshot.density[idx];
                let u = snapshot.velocity[idx];
                let u_sq = u[0] * u[0] + u[1] * u[1];
                total_mass += rho;
                if !is_boundary(y, x, height, width) {
                    interior_mass += rho;
                }
                min_density = min_density.min(rho);
                max_density = max_density.max(rho);
                max_speed = max_speed.max(u_sq.sqrt());
                speed_sum += u_sq.sqrt();
                kinetic_energy += 0.5 * rho * u_sq;
            }
        }

        let cells = (height * width).max(1) as f64;
        StepMetrics {
            step: snapshot.step,
            total_mass,
            interior_mass,
            min_density,
            max_density,
            max_speed,
            mean_speed: speed_sum / cells,
            kinetic_energy,
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub config: SimConfig,
    pub samples: Vec<StepMetrics>,
    #[serde(default)]
    pub peak_speed: f64,
}

impl RunSummary {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Observer collecting [`StepMetrics`] every `sample_every` steps and on the
/// final step, while tracking the peak speed over every step.
#[derive(Clone, Debug)]
pub struct MetricsRecorder {
    sample_every: usize,
    last_step: usize,
    samples: Vec<StepMetrics>,
    peak_speed: f64,
}

impl MetricsRecorder {
    /// `last_step` is the index of the final step of the run; it is always
    /// sampled.
    pub fn new(sample_every: usize, last_step: usize, capacity: usize) -> Self {
        Self {
            sample_every: sample_every.max(1),
            last_step,
            samples: Vec::with_capacity(capacity),
            peak_speed: 0.0,
        }
    }

    pub fn samples(&self) -> &[StepMetrics] {
        &self.samples
    }

    pub fn peak_speed(&self) -> f64 {
        self.peak_speed
    }

    pub fn into_samples(self) -> Vec<StepMetrics> {
        self.samples
    }
}

impl Observer for MetricsRecorder {
    fn observe(&mut self, snapshot: &Snapshot<'_>) {
        let peak = snapshot
            .velocity
            .iter()
            .map(|u| (u[0] * u[0] + u[1] * u[1]).sqrt())
            .fold(0.0f64, f64::max);
        self.peak_speed = self.peak_speed.max(peak);

        let ordinal = snapshot.step + 1;
        if ordinal % self.sample_every == 0 || snapshot.step == self.last_step {
            let metrics = StepMetrics::from_snapshot(snapshot);
            log::debug!(
                "step {}: mass {:.6} max |u| {:.5} kinetic {:.6e}",
                metrics.step,
                metrics.total_mass,
                metrics.max_speed,
                metrics.kinetic_energy
            );
            self.samples.push(metrics);
        }
    }
}

impl Simulator {
    /// Metrics of the current state, labelled with the last completed step.
    pub fn collect_step_metrics(&self) -> StepMetrics {
        StepMetrics::from_snapshot(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_of_uniform_flow() {
        let density = vec![2.0; 9];
        let velocity = vec![[0.3, 0.4]; 9];
        let snapshot = Snapshot {
            step: 4,
            height: 3,
            width: 3,
            density: &density,
            velocity: &velocity,
        };
        let m = StepMetrics::from_snapshot(&snapshot);
        assert_eq!(m.step, 4);
        assert!((m.total_mass - 18.0).abs() < 1e-12);
        assert!((m.interior_mass - 2.0).abs() < 1e-12);
        assert_eq!((m.min_density, m.max_density), (2.0, 2.0));
        assert!((m.max_speed - 0.5).abs() < 1e-12);
        assert!((m.mean_speed - 0.5).abs() < 1e-12);
        assert!((m.kinetic_energy - 9.0 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn recorder_samples_on_interval_and_final_step() {
        let density = vec![1.0; 9];
        let velocity = vec![[0.0; 2]; 9];
        let mut recorder = MetricsRecorder::new(3, 6, 4);
        for step in 0..7 {
            recorder.observe(&Snapshot {
                step,
                height: 3,
                width: 3,
                density: &density,
                velocity: &velocity,
            });
        }
        let steps: Vec<usize> = recorder.samples().iter().map(|m| m.step).collect();
        assert_eq!(steps, vec![2, 5, 6]);
        assert_eq!(recorder.peak_speed(), 0.0);
    }

    #[test]
    fn summary_json_preserves_every_float_bit() {
        let sample = StepMetrics {
            step: 9,
            total_mass: 2450.0 + 3.0e-12,
            interior_mass: 1585.0 - 1.4e-12,
            min_density: 1.0 - 1.0 / 113.0,
            max_density: 1.0 + 1.0 / 113.0,
            max_speed: 0.18546569911345318,
            mean_speed: 1.0e-17 / 3.0,
            kinetic_energy: 0.1 + 0.2,
        };
        let summary = RunSummary {
            schema_version: 1,
            steps: 10,
            sample_every: 4,
            config: SimConfig::default(),
            samples: vec![sample.clone()],
            peak_speed: 0.18546569911345318,
        };
        let parsed = RunSummary::from_json(&summary.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed.samples, vec![sample]);
        assert_eq!(
            parsed.peak_speed.to_bits(),
            0.18546569911345318f64.to_bits()
        );
    }
}
