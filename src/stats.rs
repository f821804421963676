//! Reduce calibration results to summary statistics.

use std::ops::AddAssign;

use serde_derive::*;

use crate::{
    distribution::Distributional,
    error::{Error, Result},
};

/// Streaming mean / variance accumulator (Welford).
///
/// Partial accumulators merge with `+=` (Chan et al.), so the
/// result does not depend on how samples are split or ordered
/// beyond floating point rounding.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            mean: 0.,
            m2: 0.,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Stats {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (divides by `N`).
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> Result<MeanAndVariance> {
        if self.count == 0 {
            return Err(Error::EmptySampleBuffer);
        }
        Ok(MeanAndVariance {
            mean: self.mean(),
            variance: self.variance(),
        })
    }
}

impl AddAssign<f64> for Stats {
    fn add_assign(&mut self, val: f64) {
        self.count += 1;
        let delta = val - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (val - self.mean);
        self.min = self.min.min(val);
        self.max = self.max.max(val);
    }
}

impl AddAssign<&Stats> for Stats {
    fn add_assign(&mut self, other: &Stats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let (n_a, n_b, n) = (self.count as f64, other.count as f64, count as f64);

        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count = count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct MeanAndVariance {
    pub mean: f64,
    pub variance: f64,
}

/// Mean and population variance of a sample buffer.
pub fn mean_and_variance(samples: &[f64]) -> Result<MeanAndVariance> {
    let mut stats = Stats::default();
    for &x in samples {
        stats += x;
    }
    stats.summary()
}

/// Offsets (as fractions of the nominal value) at which tail
/// probabilities are reported.
pub const TAIL_PERCENTAGES: [f64; 3] = [0.01, 0.02, 0.05];

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TailProbability {
    pub percentage: f64,
    pub threshold: f64,
    pub probability: f64,
}

/// Probabilities that a distributional result lies some
/// percentage below or above its nominal value.
///
/// The two sides are computed independently; they are not
/// mirror images unless the distribution is symmetric.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TailProbabilities {
    pub nominal: f64,

    /// `1 - P(X > nominal * (1 - p))`
    pub smaller: [TailProbability; 3],

    /// `P(X > nominal * (1 + p))`
    pub greater: [TailProbability; 3],
}

impl TailProbabilities {
    pub fn from_distribution<V: Distributional>(value: &V, nominal: f64) -> Self {
        let side = |sign: f64, less: bool| {
            let mut out = [TailProbability {
                percentage: 0.,
                threshold: 0.,
                probability: 0.,
            }; 3];
            for (slot, &percentage) in out.iter_mut().zip(TAIL_PERCENTAGES.iter()) {
                let threshold = nominal * (1. + sign * percentage);
                let greater = value.probability_greater_than(threshold);
                *slot = TailProbability {
                    percentage,
                    threshold,
                    probability: if less { 1. - greater } else { greater },
                };
            }
            out
        };

        TailProbabilities {
            nominal,
            smaller: side(-1., true),
            greater: side(1., false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Ensemble;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    fn samples(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| 1e6 + rng.gen::<f64>()).collect()
    }

    #[test]
    fn single_sample() {
        let mv = mean_and_variance(&[275.5]).unwrap();
        assert_eq!(mv.mean, 275.5);
        assert_eq!(mv.variance, 0.);
    }

    #[test]
    fn empty_buffer() {
        assert!(matches!(
            mean_and_variance(&[]),
            Err(Error::EmptySampleBuffer)
        ));
    }

    #[test]
    fn population_variance() {
        let mv = mean_and_variance(&[2., 4., 4., 4., 5., 5., 7., 9.]).unwrap();
        assert_relative_eq!(mv.mean, 5.);
        assert_relative_eq!(mv.variance, 4.);
    }

    #[test]
    fn stable_with_large_offset() {
        // Uniform(0, 1) shifted by 1e6: variance close to 1/12
        // survives the offset.
        let mv = mean_and_variance(&samples(100_000, 1)).unwrap();
        assert_relative_eq!(mv.variance, 1. / 12., epsilon = 5e-3);
    }

    #[test]
    fn order_independent() {
        let mut xs = samples(10_000, 2);
        let forward = mean_and_variance(&xs).unwrap();
        xs.reverse();
        let reversed = mean_and_variance(&xs).unwrap();
        xs.shuffle(&mut StdRng::seed_from_u64(3));
        let shuffled = mean_and_variance(&xs).unwrap();

        for other in [reversed, shuffled].iter() {
            assert_relative_eq!(forward.mean, other.mean, max_relative = 1e-12);
            assert_relative_eq!(forward.variance, other.variance, max_relative = 1e-6);
        }
    }

    #[test]
    fn merge_matches_sequential() {
        let xs = samples(1000, 4);
        let sequential = mean_and_variance(&xs).unwrap();

        let mut merged = Stats::default();
        for chunk in xs.chunks(77) {
            let mut part = Stats::default();
            for &x in chunk {
                part += x;
            }
            merged += &part;
        }
        merged += &Stats::default();

        assert_eq!(merged.count(), 1000);
        assert_relative_eq!(merged.mean(), sequential.mean, max_relative = 1e-12);
        assert_relative_eq!(merged.variance(), sequential.variance, max_relative = 1e-6);
        assert_eq!(
            merged.min(),
            xs.iter().cloned().fold(f64::INFINITY, f64::min)
        );
    }

    #[test]
    fn tails_are_monotone() {
        let mut rng = StdRng::seed_from_u64(5);
        let e = Ensemble::from_particles((0..4096).map(|_| rng.gen_range(250.0..300.0)).collect());
        let tails = TailProbabilities::from_distribution(&e, e.mean());

        for side in [tails.smaller, tails.greater].iter() {
            assert!(side[0].probability >= side[1].probability);
            assert!(side[1].probability >= side[2].probability);
            assert!(side.iter().all(|t| (0. ..=1.).contains(&t.probability)));
        }
        assert_relative_eq!(tails.greater[0].threshold, 1.01 * e.mean());
        assert_relative_eq!(tails.smaller[2].threshold, 0.95 * e.mean());
    }

    #[test]
    fn tails_of_a_scalar() {
        let tails = TailProbabilities::from_distribution(&300., 300.);
        assert!(tails.smaller.iter().all(|t| t.probability == 0.));
        assert!(tails.greater.iter().all(|t| t.probability == 0.));
    }

    #[test]
    fn tails_are_not_mirrored() {
        // Right-skewed: most mass just below the mean, a long
        // tail far above it.
        let mut particles = vec![100.; 90];
        particles.extend(vec![110.; 10]);
        let e = Ensemble::from_particles(particles);
        let tails = TailProbabilities::from_distribution(&e, e.mean());
        assert_relative_eq!(tails.nominal, 101.);
        assert!(tails.greater.iter().all(|t| (t.probability - 0.1).abs() < 1e-12));
        assert!(tails.smaller.iter().all(|t| t.probability == 0.));
    }
}
