use ripple_core::{Execution, SimConfig, Simulator, StepTimings};
use std::time::{Duration, Instant};

fn run(config: SimConfig, steps: usize) -> (Duration, StepTimings) {
    let mut sim = Simulator::new(config);
    let mut totals = StepTimings::default();
    let start = Instant::now();
    for _ in 0..steps {
        let t = sim.step().unwrap_or_else(|e| panic!("{e}"));
        totals.force_us += t.force_us;
        totals.collide_us += t.collide_us;
        totals.stream_us += t.stream_us;
        totals.macroscopic_us += t.macroscopic_us;
        totals.total_us += t.total_us;
    }
    (start.elapsed(), totals)
}

fn report(label: &str, steps: usize, elapsed: Duration, t: &StepTimings) {
    let n = steps as u64;
    println!("{label}: {elapsed:?} for {steps} steps ({:?}/step)", elapsed / steps as u32);
    println!(
        "  per step: force {}us, collide {}us, stream {}us, macroscopic {}us",
        t.force_us / n,
        t.collide_us / n,
        t.stream_us / n,
        t.macroscopic_us / n
    );
}

fn main() {
    env_logger::init();
    let steps = 200;
    let base = SimConfig {
        height: 512,
        width: 1024,
        forcing_margin: 64,
        steps,
        ..SimConfig::default()
    };
    println!(
        "Benchmarking {}x{} lattice ({} cells), {} steps",
        base.height,
        base.width,
        base.height * base.width,
        steps
    );

    let (serial, serial_t) = run(
        SimConfig {
            execution: Execution::Serial,
            ..base.clone()
        },
        steps,
    );
    report("serial", steps, serial, &serial_t);

    let (parallel, parallel_t) = run(
        SimConfig {
            execution: Execution::Parallel,
            ..base
        },
        steps,
    );
    report("parallel", steps, parallel, &parallel_t);

    println!(
        "Speedup: {:.2}x",
        serial.as_secs_f64() / parallel.as_secs_f64().max(f64::EPSILON)
    );
}
