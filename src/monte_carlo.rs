//! Drive evaluations of the calibration formula.
//!
//! Two strategies, selected by [`Mode`]:
//!
//! 1. Native: a single evaluation over [`Ensemble`] inputs
//! propagates the full distribution, and tail probabilities are
//! queried directly on the result.
//!
//! 2. Monte Carlo: `iterations` scalar evaluations, each on a
//! freshly sampled input vector, collected into a sample buffer
//! and reduced to mean and variance.
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator};
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use serde_derive::*;

use crate::{
    distribution::{Distributional, Ensemble, EnsembleSource, ScalarSource},
    error::{Error, Result},
    profile::{CalibrationProfile, Overrides},
    sampler::InputSampler,
    stats::{MeanAndVariance, Stats, TailProbabilities},
    temperature::calibrate_checked,
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Native { particles: usize },
    MonteCarlo { iterations: usize },
}

/// Result of a native, single-evaluation run.
#[derive(Debug, Clone)]
pub struct NativeRun {
    pub result: Ensemble,
    pub mean: f64,
    pub tails: TailProbabilities,
}

/// Result of a Monte Carlo run.
#[derive(Debug, Clone)]
pub struct MonteCarloRun {
    /// Calibrated values in iteration order.
    pub samples: Vec<f64>,
    pub summary: MeanAndVariance,
    /// Empirical tail probabilities of the sample buffer around
    /// its mean.
    pub tails: TailProbabilities,
}

impl MonteCarloRun {
    /// Value reported downstream: the sample mean.
    pub fn representative(&self) -> f64 {
        self.summary.mean
    }

    fn from_samples(samples: Vec<f64>, stats: &Stats) -> Result<Self> {
        let summary = stats.summary()?;
        let tails = TailProbabilities::from_distribution(
            &Ensemble::from_particles(samples.clone()),
            summary.mean,
        );
        Ok(MonteCarloRun {
            samples,
            summary,
            tails,
        })
    }
}

/// Runs the calibration for one profile and set of overrides.
pub struct Driver<'a> {
    sampler: InputSampler<'a>,
    seed: Option<u64>,
}

impl<'a> Driver<'a> {
    /// `seed` fixes the random stream; `None` seeds from
    /// entropy.
    pub fn new(profile: &'a CalibrationProfile, overrides: &'a Overrides, seed: Option<u64>) -> Self {
        Driver {
            sampler: InputSampler::new(profile, overrides),
            seed,
        }
    }

    pub fn sampler(&self) -> &InputSampler<'a> {
        &self.sampler
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Independent stream for iteration `i` of a parallel run.
    fn iteration_rng(base: u64, i: usize) -> StdRng {
        // splitmix64 increment spreads consecutive indices over
        // the seed space.
        StdRng::seed_from_u64(base ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn run_native(&self, particles: usize) -> Result<NativeRun> {
        if particles == 0 {
            return Err(Error::config("particle count must be at least 1"));
        }
        debug!("native run with {} particles", particles);

        let mut source = EnsembleSource::new(self.rng(), particles);
        let inputs = self.sampler.sample(&mut source);
        let result = calibrate_checked(&inputs)?;
        let mean = result.mean();
        let tails = TailProbabilities::from_distribution(&result, mean);

        info!(
            "native result: mean {:.4}, variance {:.6}",
            mean,
            result.variance()
        );
        Ok(NativeRun {
            result,
            mean,
            tails,
        })
    }

    /// Sequential Monte Carlo loop.
    ///
    /// Each iteration samples a fresh input vector immediately
    /// before evaluating it. The first non-finite evaluation
    /// aborts the run.
    pub fn run_monte_carlo(&self, iterations: usize, bar: &ProgressBar) -> Result<MonteCarloRun> {
        if iterations == 0 {
            return Err(Error::ZeroIterations);
        }
        debug!("monte carlo run with {} iterations", iterations);

        let mut source = ScalarSource::new(self.rng());
        let mut samples = Vec::with_capacity(iterations);
        let mut stats = Stats::default();
        for i in (0..iterations).progress_with(bar.clone()) {
            let inputs = self.sampler.sample(&mut source);
            let value = calibrate_checked(&inputs).map_err(|e| at_iteration(e, i))?;
            samples.push(value);
            stats += value;
        }
        bar.finish_and_clear();

        let run = MonteCarloRun::from_samples(samples, &stats)?;
        info!(
            "monte carlo result: mean {:.4}, variance {:.6}",
            run.summary.mean, run.summary.variance
        );
        Ok(run)
    }

    /// Monte Carlo over the rayon pool.
    ///
    /// Iteration `i` draws from its own stream derived from the
    /// seed, so the samples do not depend on the number of
    /// threads. The buffer is kept in iteration order.
    pub fn run_monte_carlo_par(
        &self,
        iterations: usize,
        bar: &ProgressBar,
    ) -> Result<MonteCarloRun> {
        if iterations == 0 {
            return Err(Error::ZeroIterations);
        }
        let base = self.seed.unwrap_or_else(rand::random);
        debug!(
            "parallel monte carlo run with {} iterations on {} threads",
            iterations,
            rayon::current_num_threads()
        );

        let sampler = self.sampler;
        let samples = (0..iterations)
            .into_par_iter()
            .progress_with(bar.clone())
            .map(|i| -> Result<f64> {
                let mut source = ScalarSource::new(Self::iteration_rng(base, i));
                let inputs = sampler.sample(&mut source);
                calibrate_checked(&inputs).map_err(|e| at_iteration(e, i))
            })
            .collect::<Result<Vec<f64>>>()?;
        bar.finish_and_clear();

        let stats = samples
            .par_iter()
            .fold(Stats::default, |mut acc, &val| {
                acc += val;
                acc
            })
            .reduce(Stats::default, |mut acc, val| {
                acc += &val;
                acc
            });

        let run = MonteCarloRun::from_samples(samples, &stats)?;
        info!(
            "monte carlo result: mean {:.4}, variance {:.6}",
            run.summary.mean, run.summary.variance
        );
        Ok(run)
    }
}

fn at_iteration(err: Error, i: usize) -> Error {
    match err {
        Error::NonFiniteResult {
            non_finite, total, ..
        } => Error::NonFiniteResult {
            iteration: Some(i),
            non_finite,
            total,
        },
        other => other,
    }
}
