//! Thermodynamic states in SI units and in the reduced units of the
//! Helmholtz energy contributions.
//!
//! A state is fixed by temperature, volume and mole numbers. Nothing is
//! cached: every property is a pure function of these variables.
use crate::density_iteration::density_iteration;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::phase_equilibria::SolverOptions;
use crate::si::{Density, Moles, Pressure, Temperature, Volume, KELVIN, METER, MOL};
use ndarray::prelude::*;
use num_dual::*;
use std::fmt;
use std::sync::Arc;
use typenum::P3;

mod residual_properties;
pub use residual_properties::{StateProperties, TermContribution};

/// Root selection of a density iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DensityInitialization {
    /// Calculate a vapor phase, i.e. the root with the lowest density.
    Vapor,
    /// Calculate a liquid phase, i.e. the root with the highest density.
    Liquid,
    /// Use the root closest to the given density.
    InitialDensity(Density),
    /// Solve for every root and keep the one with the lowest molar Gibbs energy.
    None,
}

/// State in reduced units (Å³, molecules) with generic dual number
/// variables, the input of every Helmholtz energy contribution.
#[derive(Clone, Debug)]
pub struct StateHD<D: DualNum<f64>> {
    /// K
    pub temperature: D,
    /// Å³
    pub volume: D,
    /// number of molecules
    pub moles: Array1<D>,
    /// x_i
    pub molefracs: Array1<D>,
    /// number densities in Å⁻³
    pub partial_density: Array1<D>,
}

impl<D: DualNum<f64> + Copy> StateHD<D> {
    pub fn new(temperature: D, volume: D, moles: Array1<D>) -> Self {
        let total_moles = moles.iter().fold(D::zero(), |acc, &n| acc + n);
        let partial_density = moles.mapv(|n| n / volume);
        let molefracs = moles.mapv(|n| n / total_moles);

        Self {
            temperature,
            volume,
            moles,
            molefracs,
            partial_density,
        }
    }
}

/// A thermodynamic state together with the equation of state that created it.
///
/// The natural variables are $T$, $V$ and $N_i$; densities and mole fractions
/// are stored alongside. `State` objects are immutable. Derived properties are recomputed on every call,
/// so two calls with the same state always yield identical results.
#[derive(Debug)]
pub struct State<E> {
    pub eos: Arc<E>,
    pub temperature: Temperature,
    pub volume: Volume,
    pub moles: Moles<Array1<f64>>,
    /// $N=\sum_iN_i$
    pub total_moles: Moles,
    /// $\rho_i=N_i/V$
    pub partial_density: Density<Array1<f64>>,
    /// $\rho=N/V$
    pub density: Density,
    /// $x_i=N_i/N$
    pub molefracs: Array1<f64>,
    /// T in K, V in Å³ and N in molecules for [StateHD]
    reduced_temperature: f64,
    reduced_volume: f64,
    reduced_moles: Array1<f64>,
}

impl<E> Clone for State<E> {
    fn clone(&self) -> Self {
        Self {
            eos: self.eos.clone(),
            temperature: self.temperature,
            volume: self.volume,
            moles: self.moles.clone(),
            total_moles: self.total_moles,
            partial_density: self.partial_density.clone(),
            density: self.density,
            molefracs: self.molefracs.clone(),
            reduced_temperature: self.reduced_temperature,
            reduced_volume: self.reduced_volume,
            reduced_moles: self.reduced_moles.clone(),
        }
    }
}

impl<E: Residual> fmt::Display for State<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.eos.components() == 1 {
            write!(f, "T = {:.5}, ρ = {:.5}", self.temperature, self.density)
        } else {
            write!(
                f,
                "T = {:.5}, ρ = {:.5}, x = {:.5}",
                self.temperature, self.density, self.molefracs
            )
        }
    }
}

/// Variable that carries the dual part in a derivative evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Derivative {
    DV,
    DN(usize),
}

fn validate(temperature: Temperature, volume: Volume, moles: &Moles<Array1<f64>>) -> EosResult<()> {
    let invalid = |quantity: &str, value: f64| {
        Err(EosError::InvalidState("validate".into(), quantity.into(), value))
    };
    let positive = |x: f64| x.is_finite() && x > 0.0;
    let t = temperature.convert_into(KELVIN);
    if !positive(t) {
        return invalid("temperature", t);
    }
    let v = volume.convert_into(METER.powi::<P3>());
    if !positive(v) {
        return invalid("volume", v);
    }
    let n = (moles / MOL).into_value();
    if let Some(&n) = n.iter().find(|&&n| !n.is_finite() || n < 0.0) {
        return invalid("moles", n);
    }
    if n.sum() == 0.0 {
        return invalid("total moles", 0.0);
    }
    Ok(())
}

/// # State constructors
impl<E: Residual> State<E> {
    /// State from temperature, volume and mole numbers.
    ///
    /// Only signs and finiteness are checked. A density beyond the maximum
    /// packing fraction surfaces later as `OutOfDomain` from the properties.
    pub fn new_nvt(
        eos: &Arc<E>,
        temperature: Temperature,
        volume: Volume,
        moles: &Moles<Array1<f64>>,
    ) -> EosResult<Self> {
        eos.validate_moles(&moles.to_reduced())?;
        validate(temperature, volume, moles)?;

        let total_moles = moles.sum();
        Ok(Self {
            eos: eos.clone(),
            temperature,
            volume,
            moles: moles.to_owned(),
            total_moles,
            partial_density: moles / volume,
            density: total_moles / volume,
            molefracs: (moles / total_moles).into_value(),
            reduced_temperature: temperature.to_reduced(),
            reduced_volume: volume.to_reduced(),
            reduced_moles: moles.to_reduced(),
        })
    }

    /// Return a new `State` for one mole of a mixture with given temperature,
    /// molar density and composition.
    pub fn new_density(
        eos: &Arc<E>,
        temperature: Temperature,
        density: Density,
        molefracs: &Array1<f64>,
    ) -> EosResult<Self> {
        let rho = density.convert_into(MOL / METER.powi::<P3>());
        if !rho.is_finite() || rho <= 0.0 {
            return Err(EosError::InvalidState(
                String::from("new_density"),
                String::from("density"),
                rho,
            ));
        }
        let moles = molefracs / molefracs.sum() * MOL;
        Self::new_nvt(eos, temperature, MOL / density, &moles)
    }

    /// One mole of a pure component at given temperature and molar density.
    pub fn new_pure(eos: &Arc<E>, temperature: Temperature, density: Density) -> EosResult<Self> {
        Self::new_density(eos, temperature, density, &arr1(&[1.0]))
    }

    /// State at given temperature, pressure and mole numbers. The root of the
    /// pressure isotherm is chosen according to [DensityInitialization].
    pub fn new_npt(
        eos: &Arc<E>,
        temperature: Temperature,
        pressure: Pressure,
        moles: &Moles<Array1<f64>>,
        density_initialization: DensityInitialization,
        options: SolverOptions,
    ) -> EosResult<Self> {
        eos.validate_moles(&moles.to_reduced())?;
        validate(temperature, METER.powi::<P3>(), moles)?;
        let total_moles = moles.sum();
        let molefracs = (moles / total_moles).into_value();
        let root = density_iteration(
            eos,
            temperature,
            pressure,
            &molefracs,
            density_initialization,
            options,
        )?;
        Self::new_nvt(eos, temperature, total_moles / root.density, moles)
    }

    /// Return a new `State` for one mole of a mixture at given temperature, pressure
    /// and composition.
    pub fn new_tp(
        eos: &Arc<E>,
        temperature: Temperature,
        pressure: Pressure,
        molefracs: &Array1<f64>,
        density_initialization: DensityInitialization,
        options: SolverOptions,
    ) -> EosResult<Self> {
        Self::new_npt(
            eos,
            temperature,
            pressure,
            &(molefracs / molefracs.sum() * MOL),
            density_initialization,
            options,
        )
    }

    /// The state in reduced units, used as input for Helmholtz energy evaluations.
    pub fn reduced_state(&self) -> StateHD<f64> {
        StateHD::new(
            self.reduced_temperature,
            self.reduced_volume,
            self.reduced_moles.clone(),
        )
    }

    fn derive1(&self, derivative: Derivative) -> EosResult<Dual64> {
        let t = Dual64::from(self.reduced_temperature);
        let mut v = Dual64::from(self.reduced_volume);
        let mut n = self.reduced_moles.mapv(Dual64::from);
        match derivative {
            Derivative::DV => v = v.derivative(),
            Derivative::DN(i) => n[i] = n[i].derivative(),
        }
        self.eos.evaluate_residual(&StateHD::new(t, v, n))
    }

    fn derive2(&self, derivative: Derivative) -> EosResult<Dual2_64> {
        let t = Dual2_64::from(self.reduced_temperature);
        let mut v = Dual2_64::from(self.reduced_volume);
        let mut n = self.reduced_moles.mapv(Dual2_64::from);
        match derivative {
            Derivative::DV => v = v.derivative(),
            Derivative::DN(i) => n[i] = n[i].derivative(),
        }
        self.eos.evaluate_residual(&StateHD::new(t, v, n))
    }

    fn derive2_mixed(
        &self,
        derivative1: Derivative,
        derivative2: Derivative,
    ) -> EosResult<HyperDual64> {
        let t = HyperDual64::from(self.reduced_temperature);
        let mut v = HyperDual64::from(self.reduced_volume);
        let mut n = self.reduced_moles.mapv(HyperDual64::from);
        match derivative1 {
            Derivative::DV => v.eps1 = 1.0,
            Derivative::DN(i) => n[i].eps1 = 1.0,
        }
        match derivative2 {
            Derivative::DV => v.eps2 = 1.0,
            Derivative::DN(i) => n[i].eps2 = 1.0,
        }
        self.eos.evaluate_residual(&StateHD::new(t, v, n))
    }
}
