//! Uncertainty-aware radiometric calibration for FLIR
//! microbolometer cameras.
//!
//! Converting raw sensor counts to temperature uses a handful
//! of physical parameters (emissivity, atmospheric and optics
//! transmission, ambient temperatures) and camera calibration
//! constants, none of which are known exactly. This crate
//! propagates their uncertainty through the nonlinear FLIR
//! calibration formula in one of two ways:
//!
//! 1. Natively, by evaluating the formula once on
//! sample-based [`Ensemble`][distribution::Ensemble] values
//! and querying tail probabilities on the result.
//!
//! 2. By Monte Carlo: repeatedly sampling an input vector,
//! evaluating the formula on scalars, and reducing the sample
//! buffer to mean and variance.
//!
//! # Usage
//!
//! ```rust
//! # fn test_compile() -> thermal_uq::Result<()> {
//! use indicatif::ProgressBar;
//! use thermal_uq::{CalibrationProfile, Driver, Overrides, ParameterId};
//!
//! let profile = CalibrationProfile::flir_ax5();
//! let overrides = Overrides::new().with(ParameterId::Counts, 30050.);
//! let driver = Driver::new(&profile, &overrides, Some(42));
//!
//! let native = driver.run_native(4096)?;
//! println!("{:.2} (P > +1%: {:.4})", native.mean, native.tails.greater[0].probability);
//!
//! let mc = driver.run_monte_carlo(10_000, &ProgressBar::hidden())?;
//! println!("{:.2} ± {:.2}", mc.summary.mean, mc.summary.variance.sqrt());
//! # Ok(())
//! # }
//! ```
//!
//! The formula itself is [`calibrate`][temperature::calibrate],
//! generic over [`Distributional`][distribution::Distributional]
//! values.

pub mod error;

pub mod distribution;
pub mod profile;
pub mod sampler;
pub mod temperature;

pub mod monte_carlo;
pub mod stats;

pub mod config;
pub mod output;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::error::{Error, Result};
pub use crate::monte_carlo::{Driver, Mode};
pub use crate::profile::{CalibrationProfile, Overrides, ParameterId};
