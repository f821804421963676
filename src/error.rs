use thiserror::Error;

use crate::profile::ParameterId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid uniform bounds for `{parameter}`: [{low}, {high}]")]
    InvalidBounds {
        parameter: ParameterId,
        low: f64,
        high: f64,
    },

    #[error("unknown parameter `{name}` (expected one of: {expected})")]
    UnknownParameter { name: String, expected: String },

    #[error("invalid override `{assignment}`: {reason}")]
    InvalidOverride { assignment: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("iteration count must be at least 1")]
    ZeroIterations,

    #[error("cannot reduce an empty sample buffer")]
    EmptySampleBuffer,

    #[error("distributions of {expected} and {found} particles cannot share rows")]
    ParticleCountMismatch { expected: usize, found: usize },

    /// The calibration formula left its valid domain (log of a
    /// non-positive argument, division by zero) for some
    /// realisations of the inputs.
    #[error(
        "non-finite calibration result{}: {non_finite} of {total} realisations",
        iteration_suffix(.iteration)
    )]
    NonFiniteResult {
        iteration: Option<usize>,
        non_finite: usize,
        total: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn iteration_suffix(iteration: &Option<usize>) -> String {
    iteration
        .map(|i| format!(" at iteration {}", i))
        .unwrap_or_default()
}

impl Error {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}
