//! Physical parameters of the calibration and their
//! uncertainty.
//!
//! A [`CalibrationProfile`] assigns a [`Parameter`] (exact or
//! uniform) to every input of the calibration formula. The
//! built-in [`CalibrationProfile::flir_ax5`] carries the FLIR Ax5
//! reference constants; others may be loaded from JSON.
//! Temperatures in a profile are in degrees Celsius.
use std::{collections::BTreeMap, fmt, io::Read, str::FromStr};

use itertools::Itertools;
use serde_derive::*;

use crate::error::{Error, Result};

/// Offset between Celsius and Kelvin. Exact, carries no
/// uncertainty.
pub const ABSOLUTE_ZERO_CELSIUS: f64 = 273.15;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParameterId {
    Counts,
    Emissivity,
    ReflectedTemperature,
    AtmosphericTemperature,
    AtmosphericTransmission,
    ExtOpticsTemperature,
    ExtOpticsTransmission,
    PlanckR,
    PlanckB,
    PlanckF,
    J0,
    J1,
}

impl ParameterId {
    pub const ALL: [ParameterId; 12] = [
        ParameterId::Counts,
        ParameterId::Emissivity,
        ParameterId::ReflectedTemperature,
        ParameterId::AtmosphericTemperature,
        ParameterId::AtmosphericTransmission,
        ParameterId::ExtOpticsTemperature,
        ParameterId::ExtOpticsTransmission,
        ParameterId::PlanckR,
        ParameterId::PlanckB,
        ParameterId::PlanckF,
        ParameterId::J0,
        ParameterId::J1,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParameterId::Counts => "counts",
            ParameterId::Emissivity => "emissivity",
            ParameterId::ReflectedTemperature => "reflected_temperature",
            ParameterId::AtmosphericTemperature => "atmospheric_temperature",
            ParameterId::AtmosphericTransmission => "atmospheric_transmission",
            ParameterId::ExtOpticsTemperature => "ext_optics_temperature",
            ParameterId::ExtOpticsTransmission => "ext_optics_transmission",
            ParameterId::PlanckR => "planck_r",
            ParameterId::PlanckB => "planck_b",
            ParameterId::PlanckF => "planck_f",
            ParameterId::J0 => "j0",
            ParameterId::J1 => "j1",
        }
    }

    /// Temperatures are given in Celsius and shifted to Kelvin
    /// by the sampler.
    pub fn is_temperature(self) -> bool {
        matches!(
            self,
            ParameterId::ReflectedTemperature
                | ParameterId::AtmosphericTemperature
                | ParameterId::ExtOpticsTemperature
        )
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParameterId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase().replace('-', "_");
        ParameterId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == key)
            .ok_or_else(|| Error::UnknownParameter {
                name: s.to_string(),
                expected: ParameterId::ALL.iter().map(|id| id.name()).join(", "),
            })
    }
}

/// Distribution of a single physical parameter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Exact(f64),
    Uniform { low: f64, high: f64 },
}

impl Parameter {
    pub fn uniform_around(mid: f64, half_width: f64) -> Self {
        Parameter::Uniform {
            low: mid - half_width,
            high: mid + half_width,
        }
    }

    pub fn midpoint(&self) -> f64 {
        match *self {
            Parameter::Exact(v) => v,
            Parameter::Uniform { low, high } => (low + high) / 2.,
        }
    }

    fn validate(&self, parameter: ParameterId) -> Result<()> {
        match *self {
            Parameter::Exact(_) => Ok(()),
            Parameter::Uniform { low, high } => {
                // The width must be finite too, or drawing overflows.
                if low.is_finite()
                    && high.is_finite()
                    && low <= high
                    && (high - low).is_finite()
                {
                    Ok(())
                } else {
                    Err(Error::InvalidBounds {
                        parameter,
                        low,
                        high,
                    })
                }
            }
        }
    }
}

/// Camera and scene parameters for one calibration.
///
/// Missing fields in a JSON profile fall back to the FLIR Ax5
/// values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CalibrationProfile {
    pub name: String,

    pub counts: Parameter,

    pub emissivity: Parameter,
    pub reflected_temperature: Parameter,

    pub atmospheric_temperature: Parameter,
    pub atmospheric_transmission: Parameter,

    pub ext_optics_temperature: Parameter,
    pub ext_optics_transmission: Parameter,

    pub planck_r: Parameter,
    pub planck_b: Parameter,
    pub planck_f: Parameter,
    pub j0: Parameter,
    pub j1: Parameter,
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::flir_ax5()
    }
}

impl CalibrationProfile {
    /// Reference constants for a FLIR Ax5 camera. The camera
    /// constants depend on the individual camera and
    /// temperature range.
    pub fn flir_ax5() -> Self {
        CalibrationProfile {
            name: "FLIR Ax5".into(),
            counts: Parameter::Uniform {
                low: 30000.,
                high: 30100.,
            },
            emissivity: Parameter::uniform_around(1.0, 0.05),
            reflected_temperature: Parameter::uniform_around(21.85, 0.005),
            atmospheric_temperature: Parameter::uniform_around(21.85, 0.005),
            atmospheric_transmission: Parameter::uniform_around(1.0, 0.05),
            ext_optics_temperature: Parameter::Exact(20.),
            ext_optics_transmission: Parameter::uniform_around(1.0, 0.05),
            planck_r: Parameter::Exact(16556.),
            planck_b: Parameter::uniform_around(1428.0, 0.05),
            planck_f: Parameter::uniform_around(1.0, 0.05),
            j0: Parameter::uniform_around(89.796, 0.0005),
            j1: Parameter::uniform_around(22.5916, 0.00005),
        }
    }

    pub fn from_json_reader<R: Read>(rdr: R) -> Result<Self> {
        let profile: CalibrationProfile = serde_json::from_reader(rdr)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn parameter(&self, id: ParameterId) -> &Parameter {
        match id {
            ParameterId::Counts => &self.counts,
            ParameterId::Emissivity => &self.emissivity,
            ParameterId::ReflectedTemperature => &self.reflected_temperature,
            ParameterId::AtmosphericTemperature => &self.atmospheric_temperature,
            ParameterId::AtmosphericTransmission => &self.atmospheric_transmission,
            ParameterId::ExtOpticsTemperature => &self.ext_optics_temperature,
            ParameterId::ExtOpticsTransmission => &self.ext_optics_transmission,
            ParameterId::PlanckR => &self.planck_r,
            ParameterId::PlanckB => &self.planck_b,
            ParameterId::PlanckF => &self.planck_f,
            ParameterId::J0 => &self.j0,
            ParameterId::J1 => &self.j1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ParameterId::ALL
            .iter()
            .try_for_each(|&id| self.parameter(id).validate(id))
    }
}

/// Fixed values that replace a parameter's distribution on
/// every evaluation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Overrides(BTreeMap<ParameterId, f64>);

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an override. A NaN value means "not set" and clears
    /// any existing override.
    pub fn set(&mut self, id: ParameterId, value: f64) {
        if value.is_nan() {
            self.0.remove(&id);
        } else {
            self.0.insert(id, value);
        }
    }

    pub fn with(mut self, id: ParameterId, value: f64) -> Self {
        self.set(id, value);
        self
    }

    pub fn get(&self, id: ParameterId) -> Option<f64> {
        self.0.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterId, f64)> + '_ {
        self.0.iter().map(|(&id, &v)| (id, v))
    }

    /// Parse and apply a value for `id`, as given on the command
    /// line.
    pub fn parse_value(&mut self, id: ParameterId, value: &str) -> Result<()> {
        let parsed: f64 = value.trim().parse().map_err(|e| Error::InvalidOverride {
            assignment: format!("{}={}", id, value),
            reason: format!("{}: must be a real number", e),
        })?;
        self.set(id, parsed);
        Ok(())
    }

    /// Parse and apply a `name=value` assignment.
    pub fn parse_assignment(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| Error::InvalidOverride {
                assignment: assignment.to_string(),
                reason: "expected `name=value`".into(),
            })?;
        let id: ParameterId = name.parse()?;
        self.parse_value(id, value)
    }
}
