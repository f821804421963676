//! Compute the calibrated temperature from raw sensor counts.
//!
//! FLIR-style radiometric calibration: the measured signal is
//! corrected for radiance reflected off the object, emitted by
//! the atmosphere, and emitted by the external optics, and then
//! inverted through the Planck curve of the camera.
//!
//! The formula is generic over [`Distributional`], so the same
//! code evaluates a single scalar realisation or propagates a
//! whole distribution.

use crate::{
    distribution::Distributional,
    error::{Error, Result},
    profile::ABSOLUTE_ZERO_CELSIUS,
    sampler::InputVector,
};

// R / (exp(B/T) - F)
fn pseudo_radiance<V: Distributional>(inputs: &InputVector<V>, temperature: &V) -> V {
    inputs.planck_r.clone()
        / ((inputs.planck_b.clone() / temperature.clone()).exp() - inputs.planck_f.clone())
}

/// Calibrated temperature for one realisation of the inputs.
///
/// Does not check the domain of the intermediate logarithm or
/// divisions; see [`calibrate_checked`].
pub fn calibrate<V: Distributional>(inputs: &InputVector<V>) -> V {
    let one = V::constant(1.);
    let emiss = &inputs.emissivity;
    let tau = &inputs.atmospheric_transmission;
    let ext = &inputs.ext_optics_transmission;

    // K1 = 1 / (tau * emiss * ext)
    let k1 = one.clone() / (tau.clone() * emiss.clone() * ext.clone());

    // reflected environment
    // r1 = (1 - emiss) / emiss * R / (exp(B/TRefl) - F)
    let r1 = (one.clone() - emiss.clone()) / emiss.clone()
        * pseudo_radiance(inputs, &inputs.reflected_temperature);

    // atmosphere
    // r2 = (1 - tau) / (emiss * tau) * R / (exp(B/TAtm) - F)
    let r2 = (one.clone() - tau.clone()) / (emiss.clone() * tau.clone())
        * pseudo_radiance(inputs, &inputs.atmospheric_temperature);

    // external optics
    // r3 = (1 - ext) / (emiss * tau * ext) * R / (exp(B/TExt) - F)
    let r3 = (one - ext.clone()) / (emiss.clone() * tau.clone() * ext.clone())
        * pseudo_radiance(inputs, &inputs.ext_optics_temperature);

    let k2 = r1 + r2 + r3;

    // signal = (counts - J0) / J1
    let signal = (inputs.counts.clone() - inputs.j0.clone()) / inputs.j1.clone();

    // B / ln(R / (K1 * signal - K2) + F) - 273.15
    inputs.planck_b.clone()
        / (inputs.planck_r.clone() / (k1 * signal - k2) + inputs.planck_f.clone()).ln()
        - V::constant(ABSOLUTE_ZERO_CELSIUS)
}

/// [`calibrate`], failing with [`Error::NonFiniteResult`] if
/// any realisation of the result is NaN or infinite.
pub fn calibrate_checked<V: Distributional>(inputs: &InputVector<V>) -> Result<V> {
    let value = calibrate(inputs);
    match value.non_finite_count() {
        0 => Ok(value),
        non_finite => Err(Error::NonFiniteResult {
            iteration: None,
            non_finite,
            total: value.realisations(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        distribution::{Ensemble, EnsembleSource},
        profile::{CalibrationProfile, Overrides, ParameterId},
        sampler::InputSampler,
    };
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    const NOMINAL_TEMPERATURE: f64 = 275.76154083739937;

    fn nominal() -> InputVector<f64> {
        InputVector {
            counts: 30050.,
            emissivity: 1.0,
            reflected_temperature: 295.0,
            atmospheric_temperature: 295.0,
            atmospheric_transmission: 1.0,
            ext_optics_temperature: 293.15,
            ext_optics_transmission: 1.0,
            planck_r: 16556.,
            planck_b: 1428.,
            planck_f: 1.,
            j0: 89.796,
            j1: 22.5916,
        }
    }

    #[test]
    fn nominal_temperature() {
        assert_relative_eq!(calibrate(&nominal()), NOMINAL_TEMPERATURE, epsilon = 1e-9);
    }

    #[test]
    fn profile_midpoints_match_nominal() {
        let profile = CalibrationProfile::flir_ax5();
        let overrides = Overrides::new();
        let inputs = InputSampler::new(&profile, &overrides).nominal();
        assert_relative_eq!(calibrate(&inputs), NOMINAL_TEMPERATURE, epsilon = 1e-9);
    }

    #[test]
    fn more_counts_is_warmer() {
        let mut inputs = nominal();
        let base = calibrate(&inputs);
        inputs.counts += 100.;
        assert!(calibrate(&inputs) > base);
    }

    #[test]
    fn lower_emissivity_is_warmer() {
        // Less of the signal is attributed to reflected radiance
        // at a cooler scene, so the object must be warmer.
        let mut inputs = nominal();
        let base = calibrate(&inputs);
        inputs.emissivity = 0.95;
        assert!(calibrate(&inputs) > base);
    }

    #[test]
    fn ensemble_of_constants_is_scalar() {
        let scalar = nominal();
        let ensemble = InputVector::from_fn(|id| Ensemble::constant(*scalar.get(id)));
        let result = calibrate(&ensemble);
        assert_eq!(result.len(), 1);
        assert_relative_eq!(result.particles()[0], NOMINAL_TEMPERATURE, epsilon = 1e-9);
    }

    #[test]
    fn ensemble_matches_scalar_per_particle() {
        let profile = CalibrationProfile::flir_ax5();
        let overrides = Overrides::new();
        let mut source = EnsembleSource::new(StdRng::seed_from_u64(42), 64);
        let inputs = InputSampler::new(&profile, &overrides).sample(&mut source);
        let result = calibrate(&inputs);

        for i in 0..64 {
            let at = |id: ParameterId| {
                let p = inputs.get(id).particles();
                if p.len() == 1 {
                    p[0]
                } else {
                    p[i]
                }
            };
            let scalar = InputVector::from_fn(at);
            assert_relative_eq!(result.particles()[i], calibrate(&scalar), epsilon = 1e-9);
        }
    }

    #[test]
    fn negative_log_argument_is_an_error() {
        // R / (K1 * signal - K2) + F < 0 once counts drop below J0.
        let mut inputs = nominal();
        inputs.counts = 0.;
        match calibrate_checked(&inputs) {
            Err(Error::NonFiniteResult {
                non_finite: 1,
                total: 1,
                ..
            }) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn zero_planck_denominator_is_an_error() {
        let mut inputs = nominal();
        inputs.planck_f = (inputs.planck_b / inputs.reflected_temperature).exp();
        assert!(calibrate(&inputs).is_nan());
        assert!(calibrate_checked(&inputs).is_err());
    }

    #[test]
    fn checked_ensemble_reports_particle_count() {
        let profile = CalibrationProfile::flir_ax5();
        let overrides = Overrides::new().with(ParameterId::Counts, 0.);
        let mut source = EnsembleSource::new(StdRng::seed_from_u64(9), 32);
        let inputs = InputSampler::new(&profile, &overrides).sample(&mut source);
        match calibrate_checked(&inputs) {
            Err(Error::NonFiniteResult {
                non_finite, total, ..
            }) => {
                assert_eq!(total, 32);
                assert!(non_finite > 0);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
