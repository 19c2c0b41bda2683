use super::pcsaft;
use ndarray::arr1;
use petrosaft::si::*;
use petrosaft::{DensityInitialization, SolverOptions, State};
use std::error::Error;

#[test]
fn two_phase_feed_is_unstable() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let feed = State::new_npt(
        &eos,
        250.0 * KELVIN,
        BAR,
        &(arr1(&[0.67, 0.33]) * MOL),
        DensityInitialization::None,
        SolverOptions::default(),
    )?;
    let trial_states = feed.stability_analysis(SolverOptions::default())?;
    assert!(!trial_states.is_empty());
    for trial in trial_states.iter() {
        assert!(feed.tangent_plane_distance(trial)? < 0.0);
    }
    assert!(!feed.is_stable(SolverOptions::default())?);
    Ok(())
}

#[test]
fn compressed_liquid_is_stable() -> Result<(), Box<dyn Error>> {
    let eos = pcsaft(&["propane", "butane"])?;
    let feed = State::new_npt(
        &eos,
        250.0 * KELVIN,
        10.0 * BAR,
        &(arr1(&[0.5, 0.5]) * MOL),
        DensityInitialization::None,
        SolverOptions::default(),
    )?;
    assert!(feed.is_stable(SolverOptions::default())?);
    // the feed itself is on its own tangent plane
    assert!(feed.tangent_plane_distance(&feed)?.abs() < 1e-12);
    Ok(())
}
