use super::{pcsaft, read_params};
use approx::assert_relative_eq;
use ndarray::arr1;
use petrosaft::pcsaft::{PcSaft, PcSaftOptions};
use petrosaft::si::*;
use petrosaft::{
    density_iteration, DensityInitialization, EosError, SolverOptions, State, Verbosity,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use typenum::P3;

fn conditions() -> (Temperature, Pressure) {
    (250.0 * KELVIN, 2e5 * PASCAL)
}

fn mol_m3() -> Density {
    MOL / METER.powi::<P3>()
}

#[test]
fn vapor_and_liquid_root() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let (t, p) = conditions();
    let x = arr1(&[1.0]);
    let options = SolverOptions::default();
    let vapor = density_iteration(&eos, t, p, &x, DensityInitialization::Vapor, options)?;
    let liquid = density_iteration(&eos, t, p, &x, DensityInitialization::Liquid, options)?;
    assert_relative_eq!(
        vapor.density.convert_into(mol_m3()),
        101.40385410963762,
        max_relative = 1e-7
    );
    assert_relative_eq!(
        liquid.density,
        12638.524369755463 * mol_m3(),
        max_relative = 1e-7
    );
    assert!(!vapor.phase_ambiguous);
    assert!(!liquid.phase_ambiguous);

    // round trip
    for root in [vapor, liquid] {
        let state = State::new_pure(&eos, t, root.density)?;
        assert_relative_eq!(state.pressure()?, p, max_relative = 1e-8);
    }
    Ok(())
}

#[test]
fn stable_root() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let (t, p) = conditions();
    let x = arr1(&[1.0]);
    let options = SolverOptions::default();
    let vapor = density_iteration(&eos, t, p, &x, DensityInitialization::Vapor, options)?;
    // below the saturation pressure of 2.18 bar the vapor is stable
    let stable = density_iteration(&eos, t, p, &x, DensityInitialization::None, options)?;
    assert_relative_eq!(stable.density, vapor.density, max_relative = 1e-10);
    // above, the liquid
    let p = 3.0 * BAR;
    let liquid = density_iteration(&eos, t, p, &x, DensityInitialization::Liquid, options)?;
    let stable = density_iteration(&eos, t, p, &x, DensityInitialization::None, options)?;
    assert_relative_eq!(stable.density, liquid.density, max_relative = 1e-10);
    Ok(())
}

#[test]
fn initial_density() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let (t, p) = conditions();
    let x = arr1(&[1.0]);
    let options = SolverOptions::new().verbosity(Verbosity::Iter);
    let root = density_iteration(
        &eos,
        t,
        p,
        &x,
        DensityInitialization::InitialDensity(12000.0 * mol_m3()),
        options,
    )?;
    assert_relative_eq!(
        root.density.convert_into(mol_m3()),
        12638.524369755463,
        max_relative = 1e-7
    );
    let root = density_iteration(
        &eos,
        t,
        p,
        &x,
        DensityInitialization::InitialDensity(50.0 * mol_m3()),
        options,
    )?;
    assert_relative_eq!(
        root.density.convert_into(mol_m3()),
        101.40385410963762,
        max_relative = 1e-7
    );
    Ok(())
}

#[test]
fn supercritical_root_is_ambiguous() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let x = arr1(&[1.0]);
    let (t, p) = (450.0 * KELVIN, 5.0 * MEGA * PASCAL);
    let vapor = density_iteration(
        &eos,
        t,
        p,
        &x,
        DensityInitialization::Vapor,
        SolverOptions::default(),
    )?;
    let liquid = density_iteration(
        &eos,
        t,
        p,
        &x,
        DensityInitialization::Liquid,
        SolverOptions::default(),
    )?;
    assert!(vapor.phase_ambiguous);
    assert_eq!(vapor.density, liquid.density);
    Ok(())
}

#[test]
fn scan_beyond_physical_packing_fraction() -> Result<(), Box<dyn Error>> {
    // packing fractions above one are rejected by the hard-sphere term,
    // which cuts the scan short instead of failing
    let params = read_params(&["propane"])?;
    let options = PcSaftOptions {
        max_eta: 1.5,
        ..Default::default()
    };
    let wide = Arc::new(PcSaft::with_options(params.clone(), options)?);
    let eos = Arc::new(PcSaft::new(params)?);
    let (t, p) = conditions();
    let x = arr1(&[1.0]);
    for init in [DensityInitialization::Vapor, DensityInitialization::Liquid] {
        let reference = density_iteration(&eos, t, p, &x, init, SolverOptions::default())?;
        let root = density_iteration(&wide, t, p, &x, init, SolverOptions::default())?;
        assert_relative_eq!(root.density, reference.density, max_relative = 1e-10);
        assert!(!root.phase_ambiguous);
    }
    Ok(())
}

#[test]
fn mixture_state() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let x = arr1(&[0.67, 0.33]);
    let state = State::new_tp(
        &eos,
        250.0 * KELVIN,
        10.0 * BAR,
        &x,
        DensityInitialization::Liquid,
        SolverOptions::default(),
    )?;
    assert_relative_eq!(state.pressure()?, 1e6 * PASCAL, max_relative = 1e-8);
    assert_relative_eq!(state.molefracs, x, max_relative = 1e-14);
    assert!(state.compressibility()? < 0.1);
    Ok(())
}

#[test]
fn associating_liquid() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["water_np"])?;
    let root = density_iteration(
        &eos,
        350.0 * KELVIN,
        BAR,
        &arr1(&[1.0]),
        DensityInitialization::Liquid,
        SolverOptions::default(),
    )?;
    assert_relative_eq!(
        root.density.convert_into(mol_m3()),
        49515.97758798159,
        max_relative = 1e-7
    );
    Ok(())
}

#[test]
fn invalid_pressure() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let res = density_iteration(
        &eos,
        250.0 * KELVIN,
        -1.0 * PASCAL,
        &arr1(&[1.0]),
        DensityInitialization::Vapor,
        SolverOptions::default(),
    );
    assert!(matches!(res, Err(EosError::InvalidState(..))));
    Ok(())
}

#[test]
fn iteration_limit() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let (t, p) = conditions();
    let res = density_iteration(
        &eos,
        t,
        p,
        &arr1(&[1.0]),
        DensityInitialization::Liquid,
        SolverOptions::new().max_iter(1),
    );
    match res {
        Err(EosError::NotConverged {
            solver,
            iterations,
            estimate,
        }) => {
            assert_eq!(solver, "density_iteration");
            assert_eq!(iterations, 1);
            assert!(estimate.map_or(false, |rho| rho > 0.0));
        }
        r => panic!("expected NotConverged, got {r:?}"),
    }
    Ok(())
}

#[test]
fn deadline_passed() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let (t, p) = conditions();
    let options = SolverOptions::new().deadline(Instant::now());
    let res = density_iteration(
        &eos,
        t,
        p,
        &arr1(&[1.0]),
        DensityInitialization::Liquid,
        options,
    );
    assert!(matches!(res, Err(EosError::NotConverged { .. })));
    Ok(())
}
