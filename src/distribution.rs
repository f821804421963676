//! Distribution sources and distributional values.
//!
//! The calibration formula is written once, generically over
//! [`Distributional`]. Plugging in `f64` gives the plain scalar
//! evaluation used by each Monte Carlo iteration; plugging in
//! [`Ensemble`] propagates a full sample-based distribution
//! through the formula in a single evaluation (the native
//! mode).
//!
//! Values come from a [`DistributionSource`]: either a
//! [`ScalarSource`] that draws one variate per call, or an
//! [`EnsembleSource`] that draws a fixed number of particles
//! per call.
use std::ops::{Add, Div, Mul, Sub};

use ndarray::{arr1, Array1};
use rand::{distributions::Uniform, Rng};

/// A value that may carry a full probability distribution.
pub trait Distributional:
    Clone
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// A degenerate distribution at `value`.
    fn constant(value: f64) -> Self;

    fn exp(&self) -> Self;
    fn ln(&self) -> Self;

    /// The nominal value: expectation of the distribution.
    fn mean(&self) -> f64;

    /// `P(self > threshold)`, in `[0, 1]`.
    fn probability_greater_than(&self, threshold: f64) -> f64;

    /// Number of realisations that are NaN or infinite.
    fn non_finite_count(&self) -> usize;

    /// Number of realisations carried by the value.
    fn realisations(&self) -> usize;
}

impl Distributional for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    // Explicit paths: `self.exp()` would resolve back to the
    // trait method.
    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    fn ln(&self) -> Self {
        f64::ln(*self)
    }

    fn mean(&self) -> f64 {
        *self
    }

    fn probability_greater_than(&self, threshold: f64) -> f64 {
        if *self > threshold {
            1.
        } else {
            0.
        }
    }

    fn non_finite_count(&self) -> usize {
        if self.is_finite() {
            0
        } else {
            1
        }
    }

    fn realisations(&self) -> usize {
        1
    }
}

/// Sample-based distribution.
///
/// Particle `i` of every ensemble drawn from the same
/// [`EnsembleSource`] belongs to the same joint realisation, so
/// element-wise arithmetic keeps the dependence between terms
/// that share an input. Constants are single-particle
/// ensembles and broadcast against any length.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble(Array1<f64>);

impl Ensemble {
    pub fn from_particles(particles: Vec<f64>) -> Self {
        Ensemble(Array1::from(particles))
    }

    pub fn particles(&self) -> &Array1<f64> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn variance(&self) -> f64 {
        self.0.var(0.)
    }
}

macro_rules! impl_ensemble_op {
    ($trt:ident, $method:ident, $op:tt) => {
        impl $trt for Ensemble {
            type Output = Ensemble;
            fn $method(self, rhs: Ensemble) -> Ensemble {
                Ensemble(&self.0 $op &rhs.0)
            }
        }
    };
}

impl_ensemble_op!(Add, add, +);
impl_ensemble_op!(Sub, sub, -);
impl_ensemble_op!(Mul, mul, *);
impl_ensemble_op!(Div, div, /);

impl Distributional for Ensemble {
    fn constant(value: f64) -> Self {
        Ensemble(arr1(&[value]))
    }

    fn exp(&self) -> Self {
        Ensemble(self.0.mapv(f64::exp))
    }

    fn ln(&self) -> Self {
        Ensemble(self.0.mapv(f64::ln))
    }

    fn mean(&self) -> f64 {
        self.0.mean().unwrap_or(f64::NAN)
    }

    fn probability_greater_than(&self, threshold: f64) -> f64 {
        if self.0.is_empty() {
            return 0.;
        }
        let above = self.0.iter().filter(|&&x| x > threshold).count();
        above as f64 / self.0.len() as f64
    }

    fn non_finite_count(&self) -> usize {
        self.0.iter().filter(|x| !x.is_finite()).count()
    }

    fn realisations(&self) -> usize {
        self.0.len()
    }
}

/// Supplier of input realisations.
pub trait DistributionSource {
    type Value: Distributional;

    /// A realisation (or full distribution) of `Uniform(low, high)`.
    ///
    /// Callers guarantee `low <= high` with finite bounds;
    /// profiles are validated before sampling.
    fn uniform(&mut self, low: f64, high: f64) -> Self::Value;

    fn exact(&mut self, value: f64) -> Self::Value {
        Self::Value::constant(value)
    }
}

/// Draws one scalar variate per call.
pub struct ScalarSource<R> {
    rng: R,
}

impl<R: Rng> ScalarSource<R> {
    pub fn new(rng: R) -> Self {
        ScalarSource { rng }
    }
}

impl<R: Rng> DistributionSource for ScalarSource<R> {
    type Value = f64;

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.sample(Uniform::new_inclusive(low, high))
    }
}

/// Draws `particles` independent variates per call.
pub struct EnsembleSource<R> {
    rng: R,
    particles: usize,
}

impl<R: Rng> EnsembleSource<R> {
    pub fn new(rng: R, particles: usize) -> Self {
        EnsembleSource { rng, particles }
    }

    pub fn particles(&self) -> usize {
        self.particles
    }
}

impl<R: Rng> DistributionSource for EnsembleSource<R> {
    type Value = Ensemble;

    fn uniform(&mut self, low: f64, high: f64) -> Ensemble {
        let dist = Uniform::new_inclusive(low, high);
        let rng = &mut self.rng;
        Ensemble(Array1::from_shape_fn(self.particles, |_| rng.sample(dist)))
    }
}
