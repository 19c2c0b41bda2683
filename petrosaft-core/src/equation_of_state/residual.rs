use super::{HelmholtzEnergy, HelmholtzEnergyDual};
use crate::si::{Density, MolarWeight, Temperature};
use crate::StateHD;
use crate::{EosError, EosResult};
use ndarray::Array1;
use num_dual::DualNum;

/// Hard upper limit of the packing fraction of any fluid (close packing of spheres).
pub const MAX_PACKING_FRACTION: f64 = 0.74;

/// A residual Helmholtz energy model.
pub trait Residual: Send + Sync {
    /// Return the number of components of the model.
    fn components(&self) -> usize;

    /// Return the packing fraction of a state with the given temperature,
    /// number density in Angstrom^-3 and composition.
    ///
    /// The packing fraction has to be linear in the density. Density
    /// iterations use it to scan the physically accessible density range.
    fn compute_packing_fraction(
        &self,
        temperature: f64,
        density: f64,
        molefracs: &Array1<f64>,
    ) -> f64;

    /// Upper bound of the packing fraction considered in density iterations.
    fn max_packing_fraction(&self) -> f64 {
        MAX_PACKING_FRACTION
    }

    /// Return a slice of the individual contributions of the model.
    fn contributions(&self) -> &[Box<dyn HelmholtzEnergy>];

    /// Molar masses of all components.
    fn molar_weight(&self) -> MolarWeight<Array1<f64>>;

    /// Evaluate the residual reduced Helmholtz energy $\beta A^\mathrm{res}$.
    fn evaluate_residual<D: DualNum<f64> + Copy>(&self, state: &StateHD<D>) -> EosResult<D>
    where
        dyn HelmholtzEnergy: HelmholtzEnergyDual<D>,
    {
        self.contributions()
            .iter()
            .try_fold(D::zero(), |acc, c| Ok(acc + c.helmholtz_energy(state)?))
    }

    /// Evaluate the reduced Helmholtz energy of each individual contribution
    /// and return them together with a string representation of the contribution.
    fn evaluate_residual_contributions<D: DualNum<f64> + Copy>(
        &self,
        state: &StateHD<D>,
    ) -> EosResult<Vec<(String, D)>>
    where
        dyn HelmholtzEnergy: HelmholtzEnergyDual<D>,
    {
        self.contributions()
            .iter()
            .map(|c| Ok((c.to_string(), c.helmholtz_energy(state)?)))
            .collect()
    }

    /// Check if the provided mole numbers are consistent with the
    /// model.
    fn validate_moles(&self, moles: &Array1<f64>) -> EosResult<()> {
        if self.components() == moles.len() {
            Ok(())
        } else {
            Err(EosError::IncompatibleComponents(
                self.components(),
                moles.len(),
            ))
        }
    }

    /// Convert a packing fraction to a molar density.
    fn density_from_packing_fraction(
        &self,
        temperature: Temperature,
        packing_fraction: f64,
        molefracs: &Array1<f64>,
    ) -> Density {
        let eta_per_density =
            self.compute_packing_fraction(temperature.to_reduced(), 1.0, molefracs);
        Density::from_reduced(packing_fraction / eta_per_density)
    }

    /// Convert a molar density to a packing fraction.
    fn packing_fraction(
        &self,
        temperature: Temperature,
        density: Density,
        molefracs: &Array1<f64>,
    ) -> f64 {
        self.compute_packing_fraction(temperature.to_reduced(), density.to_reduced(), molefracs)
    }

    /// Largest molar density that density iterations consider.
    fn max_density(&self, temperature: Temperature, molefracs: &Array1<f64>) -> EosResult<Density> {
        self.validate_moles(molefracs)?;
        Ok(self.density_from_packing_fraction(
            temperature,
            self.max_packing_fraction(),
            molefracs,
        ))
    }
}
