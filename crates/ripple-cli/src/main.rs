use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ripple_core::{EdgeStreaming, Execution, SimConfig, Simulator};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Edges {
    Pinned,
    Periodic,
}

impl From<Edges> for EdgeStreaming {
    fn from(edges: Edges) -> Self {
        match edges {
            Edges::Pinned => EdgeStreaming::Pinned,
            Edges::Periodic => EdgeStreaming::Periodic,
        }
    }
}

/// Run the D2Q9 ripple simulation and write a JSON run summary.
#[derive(Parser, Debug)]
#[command(name = "ripple", version)]
struct Args {
    /// JSON file with a (partial) SimConfig; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    height: Option<usize>,
    #[arg(long)]
    width: Option<usize>,
    /// BGK relaxation time.
    #[arg(long)]
    tau: Option<f64>,
    /// Forcing frequency in cycles per step.
    #[arg(long)]
    frequency: Option<f64>,
    /// Peak forcing velocity as two values: x y.
    #[arg(long, num_args = 2, value_names = ["UX", "UY"], allow_negative_numbers = true)]
    velocity: Option<Vec<f64>>,
    #[arg(long)]
    margin: Option<usize>,
    #[arg(long)]
    steps: Option<usize>,
    #[arg(long, value_enum)]
    edges: Option<Edges>,
    #[arg(long)]
    no_forcing: bool,
    /// Run every pass on the calling thread.
    #[arg(long)]
    serial: bool,
    /// Record metrics every N steps (the final step is always recorded).
    #[arg(long, default_value_t = 100)]
    sample_every: usize,
    /// Write the summary here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config: SimConfig = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };

    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(tau) = args.tau {
        config.tau = tau;
    }
    if let Some(frequency) = args.frequency {
        config.forcing_frequency = frequency;
    }
    if let Some(v) = &args.velocity {
        config.forcing_velocity = [v[0], v[1]];
    }
    if let Some(margin) = args.margin {
        config.forcing_margin = margin;
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(edges) = args.edges {
        config.edge_streaming = edges.into();
    }
    if args.no_forcing {
        config.enable_forcing = false;
    }
    if args.serial {
        config.execution = Execution::Serial;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let mut sim = Simulator::try_new(config).context("invalid simulation config")?;
    let summary = sim
        .try_run_experiment(args.sample_every)
        .context("simulation aborted")?;
    let json = summary.to_json_pretty()?;

    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote summary to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
