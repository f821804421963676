//! Draw one realisation of every calibration input.
use serde_derive::*;

use crate::{
    distribution::{Distributional, DistributionSource},
    profile::{CalibrationProfile, Overrides, Parameter, ParameterId, ABSOLUTE_ZERO_CELSIUS},
};

/// One realisation of the inputs consumed by a single
/// evaluation of the calibration formula.
///
/// Temperatures are in Kelvin.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InputVector<V> {
    pub counts: V,

    pub emissivity: V,
    pub reflected_temperature: V,

    pub atmospheric_temperature: V,
    pub atmospheric_transmission: V,

    pub ext_optics_temperature: V,
    pub ext_optics_transmission: V,

    pub planck_r: V,
    pub planck_b: V,
    pub planck_f: V,
    pub j0: V,
    pub j1: V,
}

impl<V> InputVector<V> {
    /// Build the vector by evaluating `f` once per parameter, in
    /// the declaration order of [`ParameterId::ALL`].
    pub fn from_fn<F: FnMut(ParameterId) -> V>(mut f: F) -> Self {
        InputVector {
            counts: f(ParameterId::Counts),
            emissivity: f(ParameterId::Emissivity),
            reflected_temperature: f(ParameterId::ReflectedTemperature),
            atmospheric_temperature: f(ParameterId::AtmosphericTemperature),
            atmospheric_transmission: f(ParameterId::AtmosphericTransmission),
            ext_optics_temperature: f(ParameterId::ExtOpticsTemperature),
            ext_optics_transmission: f(ParameterId::ExtOpticsTransmission),
            planck_r: f(ParameterId::PlanckR),
            planck_b: f(ParameterId::PlanckB),
            planck_f: f(ParameterId::PlanckF),
            j0: f(ParameterId::J0),
            j1: f(ParameterId::J1),
        }
    }

    pub fn get(&self, id: ParameterId) -> &V {
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
}

/// Samples [`InputVector`]s from a profile.
///
/// Holds no state across calls: every call to
/// [`sample`](Self::sample) draws a fresh, independent
/// realisation of every parameter that is not overridden.
#[derive(Debug, Clone, Copy)]
pub struct InputSampler<'a> {
    profile: &'a CalibrationProfile,
    overrides: &'a Overrides,
}

impl<'a> InputSampler<'a> {
    pub fn new(profile: &'a CalibrationProfile, overrides: &'a Overrides) -> Self {
        InputSampler { profile, overrides }
    }

    pub fn sample<S: DistributionSource>(&self, source: &mut S) -> InputVector<S::Value> {
        InputVector::from_fn(|id| {
            let value = match (self.overrides.get(id), self.profile.parameter(id)) {
                (Some(v), _) => source.exact(v),
                (None, &Parameter::Exact(v)) => source.exact(v),
                (None, &Parameter::Uniform { low, high }) => source.uniform(low, high),
            };
            if id.is_temperature() {
                value + S::Value::constant(ABSOLUTE_ZERO_CELSIUS)
            } else {
                value
            }
        })
    }

    /// Every parameter at its midpoint (overrides still apply).
    pub fn nominal(&self) -> InputVector<f64> {
        InputVector::from_fn(|id| {
            let value = self
                .overrides
                .get(id)
                .unwrap_or_else(|| self.profile.parameter(id).midpoint());
            if id.is_temperature() {
                value + ABSOLUTE_ZERO_CELSIUS
            } else {
                value
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{EnsembleSource, ScalarSource};
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn draws_stay_within_profile_bounds() {
        let profile = CalibrationProfile::flir_ax5();
        let overrides = Overrides::new();
        let sampler = InputSampler::new(&profile, &overrides);
        let mut source = ScalarSource::new(StdRng::seed_from_u64(11));

        for _ in 0..1000 {
            let inputs = sampler.sample(&mut source);
            for &id in ParameterId::ALL.iter() {
                let offset = if id.is_temperature() {
                    ABSOLUTE_ZERO_CELSIUS
                } else {
                    0.
                };
                let value = *inputs.get(id) - offset;
                match *profile.parameter(id) {
                    Parameter::Exact(v) => assert_relative_eq!(value, v, epsilon = 1e-9),
                    Parameter::Uniform { low, high } => {
                        assert!(
                            low - 1e-9 <= value && value <= high + 1e-9,
                            "{} = {} outside [{}, {}]",
                            id,
                            value,
                            low,
                            high
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn draws_are_fresh_per_call() {
        let profile = CalibrationProfile::flir_ax5();
        let overrides = Overrides::new();
        let sampler = InputSampler::new(&profile, &overrides);
        let mut source = ScalarSource::new(StdRng::seed_from_u64(5));
        let a = sampler.sample(&mut source);
        let b = sampler.sample(&mut source);
        assert_ne!(a.counts, b.counts);
        assert_ne!(a.emissivity, b.emissivity);
    }

    #[test]
    fn overrides_replace_draws() {
        let profile = CalibrationProfile::flir_ax5();
        let overrides = Overrides::new()
            .with(ParameterId::Counts, 30050.)
            .with(ParameterId::ReflectedTemperature, 25.);
        let sampler = InputSampler::new(&profile, &overrides);

        let mut source = EnsembleSource::new(StdRng::seed_from_u64(1), 128);
        let inputs = sampler.sample(&mut source);
        assert_eq!(inputs.counts.len(), 1);
        assert_eq!(inputs.counts.particles()[0], 30050.);
        assert_relative_eq!(inputs.reflected_temperature.particles()[0], 298.15);
        assert_eq!(inputs.emissivity.len(), 128);
    }

    #[test]
    fn nominal_uses_midpoints_in_kelvin() {
        let profile = CalibrationProfile::flir_ax5();
        let overrides = Overrides::new();
        let nominal = InputSampler::new(&profile, &overrides).nominal();
        assert_relative_eq!(nominal.counts, 30050.);
        assert_relative_eq!(nominal.reflected_temperature, 295.0, epsilon = 1e-9);
        assert_relative_eq!(nominal.ext_optics_temperature, 293.15, epsilon = 1e-9);
        assert_relative_eq!(nominal.planck_b, 1428.0, epsilon = 1e-9);
    }
}
