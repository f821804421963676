//! Report formats: human-readable text, JSON, CSV, the
//! benchmarking line and the Monte Carlo dump.
use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
    ops::Range,
    path::Path,
    time::Duration,
};

use itertools::Itertools;
use serde_derive::*;

use crate::{
    distribution::{Distributional, Ensemble},
    error::{Error, Result},
    monte_carlo::{MonteCarloRun, NativeRun},
    stats::{MeanAndVariance, TailProbabilities, TailProbability},
};

/// Number of output variables computed by a run.
pub const OUTPUT_COUNT: usize = 1;

pub const OUTPUT_VARIABLE_NAMES: [&str; OUTPUT_COUNT] = ["Calibrated FLIR Ax5 Temperature Output"];
pub const OUTPUT_VARIABLE_SYMBOLS: [&str; OUTPUT_COUNT] = ["calibratedSensorOutput"];
pub const UNITS_OF_MEASUREMENT: [&str; OUTPUT_COUNT] = ["Kelvin"];

pub const JSON_DESCRIPTION: &str = "Lepton FLIR Sensor Calibration";

/// Outputs picked by a 0-indexed selector; [`OUTPUT_COUNT`]
/// selects all of them.
pub fn selected_outputs(select: usize) -> Range<usize> {
    if select >= OUTPUT_COUNT {
        0..OUTPUT_COUNT
    } else {
        select..select + 1
    }
}

/// Human-readable report: the calibrated value and its six
/// tail probabilities.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub description: &'a str,
    pub units: &'a str,
    pub value: f64,
    pub tails: TailProbabilities,
    pub monte_carlo: Option<(MeanAndVariance, usize)>,
}

impl Report<'static> {
    pub fn native(run: &NativeRun) -> Self {
        Report {
            description: OUTPUT_VARIABLE_NAMES[0],
            units: UNITS_OF_MEASUREMENT[0],
            value: run.mean,
            tails: run.tails,
            monte_carlo: None,
        }
    }

    pub fn monte_carlo(run: &MonteCarloRun) -> Self {
        Report {
            description: OUTPUT_VARIABLE_NAMES[0],
            units: UNITS_OF_MEASUREMENT[0],
            value: run.representative(),
            tails: run.tails,
            monte_carlo: Some((run.summary, run.samples.len())),
        }
    }
}

impl Report<'_> {
    fn tail_line(
        &self,
        f: &mut fmt::Formatter<'_>,
        tail: &TailProbability,
        direction: &str,
    ) -> fmt::Result {
        writeln!(
            f,
            "\tProbability that calibrated sensor output is {:>3}% or more {} than {:.2} {}, is {:.6}",
            (tail.percentage * 100.).round(),
            direction,
            self.value,
            self.units,
            tail.probability
        )
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {:.2} {}.", self.description, self.value, self.units)?;
        if let Some((summary, count)) = self.monte_carlo {
            writeln!(
                f,
                "\tMonte Carlo variance over {} samples: {:.6} {}^2",
                count, summary.variance, self.units
            )?;
        }
        writeln!(f)?;
        for tail in self.tails.smaller.iter() {
            self.tail_line(f, tail, "smaller")?;
        }
        writeln!(f)?;
        for tail in self.tails.greater.iter() {
            self.tail_line(f, tail, "greater")?;
        }
        Ok(())
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JsonVariable<'a> {
    pub variable_symbol: &'a str,
    pub variable_description: &'a str,
    pub values: &'a [f64],
}

#[derive(Serialize, Debug)]
pub struct JsonOutput<'a> {
    pub description: &'a str,
    pub results: Vec<JsonVariable<'a>>,
}

impl<'a> JsonOutput<'a> {
    /// `values` holds every Monte Carlo sample, or the single
    /// nominal value of a native run.
    pub fn calibrated_output(values: &'a [f64]) -> Self {
        JsonOutput {
            description: JSON_DESCRIPTION,
            results: vec![JsonVariable {
                variable_symbol: OUTPUT_VARIABLE_SYMBOLS[0],
                variable_description: OUTPUT_VARIABLE_NAMES[0],
                values,
            }],
        }
    }

    pub fn write<W: Write>(&self, wtr: W) -> Result<()> {
        serde_json::to_writer(wtr, self)?;
        Ok(())
    }
}

/// Write output distributions as CSV: a header of variable
/// names, then one particle of every distribution per row.
/// Single-particle (exact) outputs repeat on every row; all
/// other distributions must have the same number of particles.
pub fn write_distributions_csv<W: Write>(
    mut wtr: W,
    names: &[&str],
    distributions: &[&Ensemble],
) -> Result<()> {
    let rows = distributions.iter().map(|d| d.len()).max().unwrap_or(0);
    if let Some(d) = distributions.iter().find(|d| d.len() != 1 && d.len() != rows) {
        return Err(Error::ParticleCountMismatch {
            expected: rows,
            found: d.len(),
        });
    }

    writeln!(wtr, "{}", names.iter().join(","))?;
    for row in 0..rows {
        let line = distributions
            .iter()
            .map(|d| {
                let particles = d.particles();
                if particles.len() == 1 {
                    particles[0]
                } else {
                    particles[row]
                }
            })
            .join(",");
        writeln!(wtr, "{}", line)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_distributions_csv_path(
    path: &Path,
    names: &[&str],
    distributions: &[&Ensemble],
) -> Result<()> {
    let wtr = BufWriter::new(File::create(path)?);
    write_distributions_csv(wtr, names, distributions)
}

/// `<calibratedValue> <elapsedMicroseconds>`
pub fn benchmark_line(value: f64, elapsed: Duration) -> String {
    format!("{:.6} {}", value, elapsed.as_micros())
}

pub fn timing_line(elapsed: Duration) -> String {
    format!("\nCPU time used: {:.6} seconds", elapsed.as_secs_f64())
}

/// Monte Carlo dump: elapsed microseconds on the first line,
/// then one sample per line in iteration order.
pub fn write_monte_carlo_dump<W: Write>(mut wtr: W, samples: &[f64], elapsed: Duration) -> Result<()> {
    writeln!(wtr, "{}", elapsed.as_micros())?;
    for sample in samples {
        writeln!(wtr, "{}", sample)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_monte_carlo_dump_path(path: &Path, samples: &[f64], elapsed: Duration) -> Result<()> {
    let wtr = BufWriter::new(File::create(path)?);
    write_monte_carlo_dump(wtr, samples, elapsed)
}

/// The nominal value of a distributional output, as reported
/// in JSON for native runs.
pub fn nominal_values<V: Distributional>(value: &V) -> Vec<f64> {
    vec![value.mean()]
}
