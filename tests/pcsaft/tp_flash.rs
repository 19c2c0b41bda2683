use super::pcsaft;
use approx::assert_relative_eq;
use ndarray::{arr1, Array1};
use petrosaft::si::*;
use petrosaft::{
    batch_tp_flash, EosError, KValueSeed, Phase, PhaseEquilibrium, SolverOptions, Verbosity,
};
use std::error::Error;

const T: f64 = 250.0;

fn wilson() -> KValueSeed {
    KValueSeed::Wilson {
        critical_temperature: arr1(&[369.83, 425.12]) * KELVIN,
        critical_pressure: arr1(&[42.48, 37.96]) * BAR,
        acentric_factor: arr1(&[0.152, 0.2]),
    }
}

fn check_two_phase<E>(vle: &PhaseEquilibrium<E>, feed: &Array1<f64>) -> Result<(), Box<dyn Error>>
where
    E: petrosaft::Residual,
{
    let beta = vle.vapor_fraction();
    let x = &vle.liquid().molefracs;
    let y = &vle.vapor().molefracs;
    assert_relative_eq!(x.sum(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(y.sum(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(beta + vle.liquid_fraction(), 1.0, epsilon = 1e-14);
    let z = beta * y + (1.0 - beta) * x;
    assert_relative_eq!(z, *feed, epsilon = 1e-8);

    // isofugacity
    let f_l = x.mapv(f64::ln) + vle.liquid().ln_phi()?;
    let f_v = y.mapv(f64::ln) + vle.vapor().ln_phi()?;
    assert_relative_eq!(f_l, f_v, epsilon = 1e-7);
    assert_relative_eq!(vle.vapor().pressure()?, vle.pressure(), max_relative = 1e-8);
    assert_relative_eq!(vle.liquid().pressure()?, vle.pressure(), max_relative = 1e-8);
    Ok(())
}

#[test]
fn two_phase() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let feed = arr1(&[0.67, 0.33]);
    let vle = PhaseEquilibrium::tp_flash(
        &eos,
        T * KELVIN,
        BAR,
        &feed,
        &KValueSeed::Fugacity,
        SolverOptions::default(),
    )?;
    assert!(!vle.is_single_phase());
    assert_relative_eq!(vle.vapor_fraction(), 0.826706789904412, epsilon = 1e-5);
    assert_relative_eq!(
        vle.liquid().molefracs,
        arr1(&[0.34953598001086517, 0.6504640199891348]),
        epsilon = 1e-5
    );
    assert_relative_eq!(
        vle.vapor().molefracs,
        arr1(&[0.7371752541798707, 0.2628247458201293]),
        epsilon = 1e-5
    );
    assert_relative_eq!(
        vle.k_values(),
        arr1(&[2.109011078510033, 0.40405731561413644]),
        max_relative = 1e-4
    );
    assert!(vle.vapor().density < vle.liquid().density);
    assert!(vle.iterations() > 0);
    check_two_phase(&vle, &feed)
}

#[test]
fn seeds_converge_to_the_same_split() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let feed = arr1(&[0.67, 0.33]);
    let options = SolverOptions::new().verbosity(Verbosity::Iter);
    let reference =
        PhaseEquilibrium::tp_flash(&eos, T * KELVIN, BAR, &feed, &KValueSeed::Fugacity, options)?;
    for seed in [wilson(), KValueSeed::Given(arr1(&[2.0, 0.5]))] {
        let vle = PhaseEquilibrium::tp_flash(&eos, T * KELVIN, BAR, &feed, &seed, options)?;
        assert_relative_eq!(
            vle.vapor_fraction(),
            reference.vapor_fraction(),
            epsilon = 1e-6
        );
        check_two_phase(&vle, &feed)?;
    }
    Ok(())
}

#[test]
fn compressed_liquid() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let feed = arr1(&[0.5, 0.5]);
    let vle = PhaseEquilibrium::tp_flash(
        &eos,
        T * KELVIN,
        10.0 * BAR,
        &feed,
        &KValueSeed::Fugacity,
        SolverOptions::default(),
    )?;
    assert!(vle.is_single_phase());
    assert_eq!(vle.vapor_fraction(), 0.0);
    assert_relative_eq!(vle.liquid().molefracs, feed, epsilon = 1e-10);
    assert!(vle.liquid().compressibility()? < 0.5);
    Ok(())
}

#[test]
fn superheated_vapor() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let feed = arr1(&[0.5, 0.5]);
    let vle = PhaseEquilibrium::tp_flash(
        &eos,
        T * KELVIN,
        0.1 * BAR,
        &feed,
        &KValueSeed::Fugacity,
        SolverOptions::default(),
    )?;
    assert!(vle.is_single_phase());
    assert_eq!(vle.vapor_fraction(), 1.0);
    assert_relative_eq!(vle.vapor().molefracs, feed, epsilon = 1e-10);
    Ok(())
}

#[test]
fn iteration_limit() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let res = PhaseEquilibrium::tp_flash(
        &eos,
        T * KELVIN,
        BAR,
        &arr1(&[0.67, 0.33]),
        &KValueSeed::Fugacity,
        SolverOptions::new().max_iter(2),
    );
    match res {
        Err(EosError::NotConverged {
            solver,
            iterations,
            estimate,
        }) => {
            assert_eq!(solver, "tp_flash");
            assert_eq!(iterations, 2);
            assert_relative_eq!(estimate.unwrap_or(f64::NAN), 0.8267, epsilon = 5e-3);
        }
        r => panic!("expected NotConverged, got {:?}", r.map(|vle| vle.vapor_fraction())),
    }
    Ok(())
}

#[test]
fn invalid_feed() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let options = SolverOptions::default();
    let seed = KValueSeed::default();
    assert!(matches!(
        PhaseEquilibrium::tp_flash(&eos, T * KELVIN, BAR, &arr1(&[0.6, 0.6]), &seed, options),
        Err(EosError::InvalidParameter(_))
    ));
    assert!(matches!(
        PhaseEquilibrium::tp_flash(&eos, T * KELVIN, BAR, &arr1(&[1.0]), &seed, options),
        Err(EosError::IncompatibleComponents(..))
    ));
    assert!(matches!(
        PhaseEquilibrium::tp_flash(
            &eos,
            T * KELVIN,
            BAR,
            &arr1(&[0.5, 0.5]),
            &KValueSeed::Given(arr1(&[2.0, -1.0])),
            options
        ),
        Err(EosError::InvalidParameter(_))
    ));
    Ok(())
}

#[test]
fn batch() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let feed = arr1(&[0.67, 0.33]);
    let t = T * KELVIN;
    let conditions = [(t, BAR), (t, -BAR), (t, 10.0 * BAR), (t, 0.1 * BAR)];
    let results = batch_tp_flash(
        &eos,
        &conditions,
        &feed,
        &KValueSeed::Fugacity,
        SolverOptions::default(),
    );
    assert_eq!(results.len(), conditions.len());
    let vle = results[0].as_ref().map_err(|e| e.to_string())?;
    assert_relative_eq!(vle.vapor_fraction(), 0.826706789904412, epsilon = 1e-5);
    assert!(results[1].is_err());
    let liquid = results[2].as_ref().map_err(|e| e.to_string())?;
    assert_eq!(liquid.vapor_fraction(), 0.0);
    let vapor = results[3].as_ref().map_err(|e| e.to_string())?;
    assert_eq!(vapor.vapor_fraction(), 1.0);
    Ok(())
}

#[test]
fn serialized_result() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let vle = PhaseEquilibrium::tp_flash(
        &eos,
        T * KELVIN,
        BAR,
        &arr1(&[0.67, 0.33]),
        &KValueSeed::Fugacity,
        SolverOptions::default(),
    )?;
    let result = vle.result();
    assert_eq!(result.vapor.phase, Phase::Vapor);
    assert_relative_eq!(
        result.vapor.phase_fraction + result.liquid.phase_fraction,
        1.0,
        epsilon = 1e-14
    );
    let json: serde_json::Value = serde_json::to_value(&result)?;
    assert_eq!(json["temperature"], 250.0);
    assert_eq!(json["pressure"], 1e5);
    assert_eq!(json["vapor"]["phase"], "Vapor");
    assert_eq!(json["k_values"]["dim"][0], 2);
    Ok(())
}
