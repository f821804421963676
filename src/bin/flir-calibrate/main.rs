mod args;

use std::{
    io::{stdout, Write},
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use args::Args;
use log::debug;

use thermal_uq::{
    cli::{init_logging, progress_bar},
    config::RunConfig,
    monte_carlo::{MonteCarloRun, NativeRun},
    output::{
        benchmark_line, nominal_values, selected_outputs, timing_line,
        write_distributions_csv_path, write_monte_carlo_dump_path, JsonOutput, Report,
        OUTPUT_VARIABLE_NAMES, UNITS_OF_MEASUREMENT,
    },
    sampler::InputSampler,
    temperature::calibrate_checked,
    Driver, Mode,
};

const MONTE_CARLO_DUMP: &str = "data.out";

enum Outcome {
    Native(NativeRun),
    MonteCarlo(MonteCarloRun),
}

impl Outcome {
    fn value(&self) -> f64 {
        match self {
            Outcome::Native(run) => run.mean,
            Outcome::MonteCarlo(run) => run.representative(),
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let config = Args::from_cmd_line()?;
    config.validate().context("invalid command line arguments")?;
    debug!("mode: {:?}, overrides: {:?}", config.mode(), config.overrides);

    if config.nominal {
        let inputs = InputSampler::new(&config.profile, &config.overrides).nominal();
        let value = calibrate_checked(&inputs)?;
        println!(
            "{}: {:.6} {}.",
            OUTPUT_VARIABLE_NAMES[0], value, UNITS_OF_MEASUREMENT[0]
        );
        return Ok(());
    }

    let driver = Driver::new(&config.profile, &config.overrides, config.seed);

    let start = Instant::now();
    let outcome = match config.mode() {
        Mode::Native { particles } => Outcome::Native(driver.run_native(particles)?),
        Mode::MonteCarlo { iterations } => {
            let bar = progress_bar(iterations, config.progress && !config.benchmarking);
            let run = if config.parallel {
                driver.run_monte_carlo_par(iterations, &bar)?
            } else {
                driver.run_monte_carlo(iterations, &bar)?
            };
            Outcome::MonteCarlo(run)
        }
    };
    let elapsed = start.elapsed();

    if config.benchmarking {
        println!("{}", benchmark_line(outcome.value(), elapsed));
    } else {
        report(&config, &outcome, elapsed)?;
    }

    if let Outcome::MonteCarlo(run) = &outcome {
        write_monte_carlo_dump_path(Path::new(MONTE_CARLO_DUMP), &run.samples, elapsed)
            .with_context(|| format!("could not write {}", MONTE_CARLO_DUMP))?;
    }

    Ok(())
}

fn report(config: &RunConfig, outcome: &Outcome, elapsed: Duration) -> Result<()> {
    let stdout = stdout();
    let mut out = stdout.lock();

    if config.json {
        let nominal;
        let values = match outcome {
            Outcome::Native(run) => {
                nominal = nominal_values(&run.result);
                &nominal[..]
            }
            Outcome::MonteCarlo(run) => &run.samples[..],
        };
        JsonOutput::calibrated_output(values).write(&mut out)?;
        writeln!(out)?;
    } else {
        let report = match outcome {
            Outcome::Native(run) => Report::native(run),
            Outcome::MonteCarlo(run) => Report::monte_carlo(run),
        };
        write!(out, "{}", report)?;
    }

    if config.timing {
        writeln!(out, "{}", timing_line(elapsed))?;
    }

    if let (Some(path), Outcome::Native(run)) = (&config.output_path, outcome) {
        let outputs = selected_outputs(config.output_select);
        let names = &OUTPUT_VARIABLE_NAMES[outputs.clone()];
        let distributions: Vec<_> = outputs.map(|_| &run.result).collect();
        write_distributions_csv_path(path, names, &distributions)
            .with_context(|| format!("could not write {}", path.display()))?;
    }

    Ok(())
}
