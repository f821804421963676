//! Run configuration assembled from the command line.
use std::path::PathBuf;

use log::warn;

use crate::{
    error::{Error, Result},
    monte_carlo::Mode,
    output::OUTPUT_COUNT,
    profile::{CalibrationProfile, Overrides},
};

pub const DEFAULT_PARTICLES: usize = 4096;

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// CSV file for the output distributions.
    pub output_path: Option<PathBuf>,

    /// 0-indexed output; [`OUTPUT_COUNT`] selects all outputs.
    pub output_select: usize,

    pub iterations: usize,
    pub particles: usize,
    pub seed: Option<u64>,

    pub timing: bool,
    pub benchmarking: bool,
    pub json: bool,
    pub parallel: bool,
    pub progress: bool,
    pub nominal: bool,

    pub profile: CalibrationProfile,
    pub overrides: Overrides,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            output_path: None,
            output_select: 0,
            iterations: 1,
            particles: DEFAULT_PARTICLES,
            seed: None,
            timing: false,
            benchmarking: false,
            json: false,
            parallel: false,
            progress: false,
            nominal: false,
            profile: CalibrationProfile::flir_ax5(),
            overrides: Overrides::new(),
        }
    }
}

impl RunConfig {
    pub fn mode(&self) -> Mode {
        if self.is_monte_carlo() {
            Mode::MonteCarlo {
                iterations: self.iterations,
            }
        } else {
            Mode::Native {
                particles: self.particles,
            }
        }
    }

    pub fn is_monte_carlo(&self) -> bool {
        self.iterations > 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::ZeroIterations);
        }
        if self.particles == 0 {
            return Err(Error::config("particle count must be at least 1"));
        }
        if self.output_path.is_some() && self.is_monte_carlo() {
            return Err(Error::config(
                "writing to output file is not supported in Monte Carlo mode",
            ));
        }
        if self.output_select > OUTPUT_COUNT {
            return Err(Error::config(format!(
                "output select value is greater than the possible number of outputs: provided {}, max {}",
                self.output_select, OUTPUT_COUNT
            )));
        }
        if self.output_select == OUTPUT_COUNT && (self.benchmarking || self.is_monte_carlo()) {
            return Err(Error::config(
                "please select a single output when in benchmarking mode or Monte Carlo mode",
            ));
        }
        if self.parallel && !self.is_monte_carlo() {
            warn!("--parallel has no effect outside Monte Carlo mode");
        }
        self.profile.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Parameter;

    fn rejected(config: RunConfig) -> bool {
        matches!(config.validate(), Err(Error::Config(_)))
    }

    #[test]
    fn default_is_native() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(
            config.mode(),
            Mode::Native {
                particles: DEFAULT_PARTICLES
            }
        );
    }

    #[test]
    fn multiple_executions_is_monte_carlo() {
        let config = RunConfig {
            iterations: 1000,
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.mode(), Mode::MonteCarlo { iterations: 1000 });
    }

    #[test]
    fn file_output_in_monte_carlo() {
        assert!(rejected(RunConfig {
            iterations: 10,
            output_path: Some("out.csv".into()),
            ..Default::default()
        }));
        RunConfig {
            output_path: Some("out.csv".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn all_outputs_needs_single_mode() {
        let all = RunConfig {
            output_select: OUTPUT_COUNT,
            ..Default::default()
        };
        all.validate().unwrap();
        assert!(rejected(RunConfig {
            benchmarking: true,
            ..all.clone()
        }));
        assert!(rejected(RunConfig {
            iterations: 2,
            ..all
        }));
    }

    #[test]
    fn output_select_out_of_range() {
        assert!(rejected(RunConfig {
            output_select: OUTPUT_COUNT + 1,
            ..Default::default()
        }));
    }

    #[test]
    fn zero_counts() {
        assert!(matches!(
            RunConfig {
                iterations: 0,
                ..Default::default()
            }
            .validate(),
            Err(Error::ZeroIterations)
        ));
        assert!(rejected(RunConfig {
            particles: 0,
            ..Default::default()
        }));
    }

    #[test]
    fn invalid_profile() {
        let mut config = RunConfig::default();
        config.profile.planck_b = Parameter::Uniform {
            low: f64::NAN,
            high: 1.,
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidBounds { .. })
        ));
    }
}
