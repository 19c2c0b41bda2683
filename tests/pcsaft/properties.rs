use super::pcsaft;
use approx::assert_relative_eq;
use ndarray::{arr1, Array1};
use petrosaft::si::*;
use petrosaft::{EosError, State};
use std::error::Error;
use typenum::P3;

fn mol_m3() -> Density {
    MOL / METER.powi::<P3>()
}

#[test]
fn propane_liquid_like() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let state = State::new_pure(&eos, 300.0 * KELVIN, 12000.0 * mol_m3())?;
    assert_relative_eq!(
        state.compressibility()?,
        0.5763888358493611,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        state.pressure()?,
        17252508.345085356 * PASCAL,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        state.ln_phi()?[0],
        -2.444842747691328,
        max_relative = 1e-6
    );
    Ok(())
}

#[test]
fn propane_dilute() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let state = State::new_pure(&eos, 300.0 * KELVIN, 40.0 * mol_m3())?;
    assert_relative_eq!(
        state.compressibility()?,
        0.9852422861220689,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        state.pressure()?.convert_into(PASCAL),
        98301.12189342936,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        state.ln_phi()?[0],
        -0.014677347952873784,
        max_relative = 1e-6
    );
    Ok(())
}

#[test]
fn pressure_from_compressibility() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let t = 280.0 * KELVIN;
    let rho = 9000.0 * mol_m3();
    let state = State::new_density(&eos, t, rho, &arr1(&[0.3, 0.7]))?;
    assert_relative_eq!(
        state.pressure()?,
        state.compressibility()? * rho * RGAS * t,
        max_relative = 1e-12
    );
    Ok(())
}

#[test]
fn properties_are_idempotent() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let state = State::new_density(&eos, 250.0 * KELVIN, 12500.0 * mol_m3(), &arr1(&[0.67, 0.33]))?;
    let p1 = state.properties()?;
    let p2 = state.properties()?;
    assert!(p1.pressure > 0.0);
    assert_eq!(p1.pressure, p2.pressure);
    assert_eq!(p1.compressibility, p2.compressibility);
    assert_eq!(p1.ln_phi, p2.ln_phi);
    assert_eq!(
        p1.residual_chemical_potential,
        p2.residual_chemical_potential
    );
    assert_relative_eq!(p1.density, 12500.0, max_relative = 1e-12);
    let json = serde_json::to_string(&p1)?;
    assert!(json.contains("\"compressibility\""));
    assert!(json.contains("\"mass_density\""));
    Ok(())
}

#[test]
fn negative_pressure_state() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let state = State::new_density(&eos, 250.0 * KELVIN, 11000.0 * mol_m3(), &arr1(&[0.67, 0.33]))?;
    // a valid point of the van der Waals loop with p < 0
    let z = state.compressibility()?;
    assert!(z < 0.0);
    assert!(state.pressure()?.convert_into(PASCAL) < 0.0);
    for res in [state.ln_phi().map(|_| ()), state.properties().map(|_| ())] {
        match res {
            Err(EosError::OutOfDomain { quantity, value }) => {
                assert_eq!(quantity, "compressibility");
                assert_eq!(value, z);
            }
            r => panic!("expected OutOfDomain, got {r:?}"),
        }
    }
    Ok(())
}

#[test]
fn mass_density() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let x = arr1(&[0.4, 0.6]);
    let state = State::new_density(&eos, 250.0 * KELVIN, 10000.0 * mol_m3(), &x)?;
    let mw = 0.4 * 44.0962 + 0.6 * 58.123;
    assert_relative_eq!(
        state.mass_density().convert_into(KILOGRAM / METER.powi::<P3>()),
        10000.0 * mw * 1e-3,
        max_relative = 1e-12
    );
    Ok(())
}

#[test]
fn contributions_sum_to_residual() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let t = 250.0 * KELVIN;
    let state = State::new_density(&eos, t, 11000.0 * mol_m3(), &arr1(&[0.67, 0.33]))?;
    let contributions = state.residual_contributions()?;
    let names: Vec<_> = contributions.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Hard Sphere", "Hard Chain", "Dispersion"]);
    let z: f64 = contributions.iter().map(|c| c.compressibility).sum();
    assert_relative_eq!(z + 1.0, state.compressibility()?, max_relative = 1e-10);
    let a: f64 = contributions.iter().map(|c| c.helmholtz_energy).sum();
    assert_relative_eq!(
        a,
        (state.residual_helmholtz_energy()? / (RGAS * t * state.total_moles)).into_value(),
        max_relative = 1e-10
    );
    // hard chain and dispersion lower the pressure, hard spheres raise it
    assert!(contributions[0].compressibility > 0.0);
    assert!(contributions[2].compressibility < 0.0);
    assert!(contributions[0].dz_drho > 0.0);
    Ok(())
}

/// Compressibility of every term at the given density and (unnormalized) composition
fn term_compressibilities(rho: f64, n: &Array1<f64>) -> Result<Vec<f64>, Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let state = State::new_density(&eos, 250.0 * KELVIN, rho * mol_m3(), n)?;
    Ok(state
        .residual_contributions()?
        .iter()
        .map(|c| c.compressibility)
        .collect())
}

#[test]
fn term_derivatives_match_finite_differences() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let (rho, x) = (12500.0, arr1(&[0.67, 0.33]));
    let state = State::new_density(&eos, 250.0 * KELVIN, rho * mol_m3(), &x)?;
    let contributions = state.residual_contributions()?;

    let h = rho * 1e-6;
    let zp = term_compressibilities(rho + h, &x)?;
    let zm = term_compressibilities(rho - h, &x)?;
    for (k, c) in contributions.iter().enumerate() {
        assert_relative_eq!(
            c.dz_drho,
            (zp[k] - zm[k]) / (2.0 * h),
            epsilon = 1e-12,
            max_relative = 1e-6
        );
    }

    let h = 1e-6;
    for i in 0..2 {
        let mut dn = Array1::zeros(2);
        dn[i] = h;
        let zp = term_compressibilities(rho, &(&x + &dn))?;
        let zm = term_compressibilities(rho, &(&x - &dn))?;
        for (k, c) in contributions.iter().enumerate() {
            assert_relative_eq!(
                c.dz_dx[i],
                (zp[k] - zm[k]) / (2.0 * h),
                epsilon = 1e-8,
                max_relative = 1e-6
            );
        }
    }
    Ok(())
}

#[test]
fn derivatives_of_ln_phi() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let state = State::new_density(&eos, 250.0 * KELVIN, 11000.0 * mol_m3(), &arr1(&[0.67, 0.33]))?;
    let dln_phi = (state.dln_phi_dnj()? * MOL).into_value();
    // symmetric and Gibbs-Duhem consistent
    assert_relative_eq!(dln_phi[[0, 1]], dln_phi[[1, 0]], max_relative = 1e-8);
    let gd = (&state.moles / MOL).into_value() * &dln_phi.column(0);
    assert_relative_eq!(gd.sum(), 0.0, epsilon = 1e-8);
    assert!(state.dp_drho()?.convert_into(PASCAL / mol_m3()) > 0.0);
    Ok(())
}

#[test]
fn packing_fraction_out_of_domain() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane"])?;
    let state = State::new_pure(&eos, 300.0 * KELVIN, 1e6 * mol_m3())?;
    assert!(matches!(
        state.pressure(),
        Err(EosError::OutOfDomain { .. })
    ));
    assert!(matches!(
        state.properties(),
        Err(EosError::OutOfDomain { .. })
    ));
    Ok(())
}

#[test]
fn water() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["water_np"])?;
    // 1.23 molecules in 41.25 cubic Angstrom, scaled to moles
    let volume = 41.248289328513216 * ANGSTROM.powi::<P3>() * NAV * MOL;
    let state = State::new_nvt(&eos, 350.0 * KELVIN, volume, &(arr1(&[1.23]) * MOL))?;
    let contributions = state.residual_contributions()?;
    assert_eq!(contributions.len(), 4);
    assert_eq!(contributions[3].name, "Association");
    assert_relative_eq!(
        contributions[3].helmholtz_energy,
        -4.229878997054543,
        max_relative = 1e-8
    );
    Ok(())
}
