use super::read_records;
use approx::assert_relative_eq;
use indexmap::IndexMap;
use ndarray::arr1;
use petrosaft::parameter::{
    BinaryRecord, ComponentGroup, Identifier, IdentifierOption, Parameter, ParameterError,
    ParameterSet, PseudoComponent, PseudoComponentRecord,
};
use petrosaft::pcsaft::{c7plus_default, PcSaft, PcSaftBinaryRecord, PcSaftParameters, PcSaftRecord};
use petrosaft::si::*;
use petrosaft::{DensityInitialization, KValueSeed, PhaseEquilibrium, SolverOptions, State};
use std::error::Error;
use std::sync::Arc;
use typenum::P3;

const SUPPLIER_OUTPUT: &str = r#"{
    "C7-C9": {"m": 2.85, "sigma": 3.75, "epsilon_k": 235.0, "mole_fraction": 0.3, "molar_mass": 115.5},
    "C10-C12": {"m": 4.55, "sigma": 4.05, "epsilon_k": 255.0, "mole_fraction": 0.25, "molar_mass": 155.5},
    "C13-C16": {"m": 6.85, "sigma": 4.35, "epsilon_k": 275.0, "mole_fraction": 0.2, "molar_mass": 200.5},
    "C17-C22": {"m": 9.55, "sigma": 4.65, "epsilon_k": 295.0, "mole_fraction": 0.15, "molar_mass": 280.5},
    "C23+": {"m": 13.05, "sigma": 4.95, "epsilon_k": 315.0, "mole_fraction": 0.1, "molar_mass": 380.5}
}"#;

type Records = IndexMap<String, PseudoComponentRecord<PcSaftRecord>>;

#[test]
fn supplier_output() -> Result<(), Box<dyn Error>> {
    let records: Records = serde_json::from_str(SUPPLIER_OUTPUT)?;
    let group = ComponentGroup::from_map("C7+", records)?;
    let default = c7plus_default()?;
    assert_eq!(group.len(), default.len());
    assert_eq!(group.molefracs(), default.molefracs());
    let names: Vec<_> = group
        .components()
        .iter()
        .map(|c| c.record.identifier.name.clone())
        .collect();
    assert_eq!(names[0].as_deref(), Some("C7-C9"));
    assert_eq!(names[4].as_deref(), Some("C23+"));
    Ok(())
}

#[test]
fn group_fractions_have_to_sum_to_one() -> Result<(), Box<dyn Error>> {
    for scale in [0.9, 1.1] {
        let mut records: Records = serde_json::from_str(SUPPLIER_OUTPUT)?;
        records
            .values_mut()
            .for_each(|r| r.mole_fraction *= scale);
        assert!(matches!(
            ComponentGroup::from_map("C7+", records),
            Err(ParameterError::InvalidParameter(_))
        ));
    }
    Ok(())
}

#[test]
fn invalid_pseudo_component() -> Result<(), Box<dyn Error>> {
    let mut records: Records = serde_json::from_str(SUPPLIER_OUTPUT)?;
    if let Some(r) = records.get_mut("C13-C16") {
        r.model_record.sigma = -4.35;
    }
    assert!(ComponentGroup::from_map("C7+", records).is_err());
    Ok(())
}

fn live_oil() -> Result<ParameterSet<PcSaftRecord, PcSaftBinaryRecord>, Box<dyn Error>> {
    let light = read_records(&["propane"])?
        .into_iter()
        .map(|r| PseudoComponent::new(r, 1.0))
        .collect::<Result<Vec<_>, _>>()?;
    let light = ComponentGroup::new("light ends", light)?;
    let binary = vec![BinaryRecord::new(
        Identifier::from_name("propane"),
        Identifier::from_name("C23+"),
        PcSaftBinaryRecord::from(0.02),
    )];
    Ok(ParameterSet::from_groups(
        vec![(light, 0.6), (c7plus_default()?, 0.4)],
        binary,
    )?)
}

#[test]
fn combined_groups() -> Result<(), Box<dyn Error>> {
    let set = live_oil()?;
    assert_eq!(set.components(), 6);
    assert_relative_eq!(
        *set.molefracs(),
        arr1(&[0.6, 0.12, 0.1, 0.08, 0.06, 0.04]),
        epsilon = 1e-14
    );
    let parameters = PcSaftParameters::from_parameter_set(&set, IdentifierOption::Name)?;
    assert_eq!(parameters.binary_record(0, 5).map(|b| b.k_ij), Some(0.02));
    assert_eq!(parameters.binary_record(5, 0).map(|b| b.k_ij), Some(0.02));
    assert!(parameters.binary_record(0, 1).is_none());

    let eos = PcSaft::new(Arc::new(parameters))?;
    assert_relative_eq!(eos.mixing_rules().k_ij(0, 5)?, 0.02);
    assert_relative_eq!(eos.mixing_rules().k_ij(1, 2)?, 0.0);

    // the composition can be changed without reading the records again
    let dead_oil = set.with_molefracs(arr1(&[0.0, 0.3, 0.25, 0.2, 0.15, 0.1]))?;
    assert_eq!(dead_oil.molefracs()[0], 0.0);
    assert!(set.with_molefracs(arr1(&[0.5, 0.3, 0.25, 0.2, 0.15, 0.1])).is_err());
    Ok(())
}

#[test]
fn liquid_density() -> Result<(), Box<dyn Error>> {
    let set = live_oil()?;
    let parameters = PcSaftParameters::from_parameter_set(&set, IdentifierOption::Name)?;
    let eos = Arc::new(PcSaft::new(Arc::new(parameters))?);
    let state = State::new_npt(
        &eos,
        300.0 * KELVIN,
        50.0 * BAR,
        &(set.molefracs() * MOL),
        DensityInitialization::Liquid,
        SolverOptions::default(),
    )?;
    assert_relative_eq!(state.pressure()?, 50.0 * BAR, max_relative = 1e-8);
    // an oil is denser than its light ends and lighter than water
    let rho = state.mass_density().convert_into(KILOGRAM / METER.powi::<P3>());
    assert!(rho > 450.0);
    assert!(rho < 1000.0);
    Ok(())
}

#[test]
fn flash_of_live_oil() -> Result<(), Box<dyn Error>> {
    let set = live_oil()?;
    let parameters = PcSaftParameters::from_parameter_set(&set, IdentifierOption::Name)?;
    let eos = Arc::new(PcSaft::new(Arc::new(parameters))?);
    let feed = set.molefracs().clone();
    let seed = KValueSeed::Given(arr1(&[10.0, 1e-2, 1e-3, 1e-4, 1e-5, 1e-6]));
    let vle = PhaseEquilibrium::tp_flash(&eos, 300.0 * KELVIN, BAR, &feed, &seed, SolverOptions::default())?;
    assert!(!vle.is_single_phase());
    // the vapor is mostly propane, the heaviest cut stays in the liquid
    assert!(vle.vapor().molefracs[0] > 0.9);
    assert!(vle.k_values()[5] < 1e-3);
    let beta = vle.vapor_fraction();
    let z = beta * &vle.vapor().molefracs + (1.0 - beta) * &vle.liquid().molefracs;
    assert_relative_eq!(z, feed, epsilon = 1e-8);
    Ok(())
}
