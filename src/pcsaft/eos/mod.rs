use super::mixing_rules::{BinaryInteractionPolicy, MixingRules};
use super::parameters::PcSaftParameters;
use crate::association::Association;
use crate::hard_sphere::{HardSphere, HardSphereProperties};
use ndarray::Array1;
use petrosaft_core::si::{MolarWeight, GRAM, MOL};
use petrosaft_core::{EosResult, HelmholtzEnergy, Residual, Verbosity, MAX_PACKING_FRACTION};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

pub(crate) mod dispersion;
pub(crate) mod hard_chain;
use dispersion::Dispersion;
use hard_chain::HardChain;

/// Customization options for the PC-SAFT equation of state.
#[derive(Copy, Clone, Debug)]
pub struct PcSaftOptions {
    /// Largest packing fraction considered in density iterations.
    pub max_eta: f64,
    pub max_iter_association: usize,
    pub tol_association: f64,
    pub binary_policy: BinaryInteractionPolicy,
    /// Output of the association solver.
    pub verbosity: Verbosity,
    /// Wall-clock limit of the association solver.
    pub deadline: Option<Instant>,
}

impl Default for PcSaftOptions {
    fn default() -> Self {
        Self {
            max_eta: MAX_PACKING_FRACTION,
            max_iter_association: 200,
            tol_association: 1e-10,
            binary_policy: BinaryInteractionPolicy::DefaultZero,
            verbosity: Verbosity::None,
            deadline: None,
        }
    }
}

/// PC-SAFT equation of state.
///
/// The residual Helmholtz energy is the sum of the hard-sphere, hard-chain and
/// dispersion contributions, plus association if any component carries
/// association parameters.
pub struct PcSaft {
    parameters: Arc<PcSaftParameters>,
    mixing_rules: Arc<MixingRules>,
    options: PcSaftOptions,
    contributions: Vec<Box<dyn HelmholtzEnergy>>,
}

impl PcSaft {
    pub fn new(parameters: Arc<PcSaftParameters>) -> EosResult<Self> {
        Self::with_options(parameters, PcSaftOptions::default())
    }

    pub fn with_options(
        parameters: Arc<PcSaftParameters>,
        options: PcSaftOptions,
    ) -> EosResult<Self> {
        let mixing_rules = Arc::new(MixingRules::new(&parameters, options.binary_policy)?);
        let mut contributions: Vec<Box<dyn HelmholtzEnergy>> = Vec::with_capacity(4);
        contributions.push(Box::new(HardSphere::new(&parameters)));
        contributions.push(Box::new(HardChain {
            parameters: parameters.clone(),
        }));
        contributions.push(Box::new(Dispersion {
            mixing_rules: mixing_rules.clone(),
        }));
        if !parameters.association.is_empty() {
            contributions.push(Box::new(
                Association::new(
                    &parameters,
                    &parameters.association,
                    options.max_iter_association,
                    options.tol_association,
                )
                .with_verbosity(options.verbosity)
                .with_deadline(options.deadline),
            ));
        };

        Ok(Self {
            parameters,
            mixing_rules,
            options,
            contributions,
        })
    }

    pub fn parameters(&self) -> &Arc<PcSaftParameters> {
        &self.parameters
    }

    pub fn mixing_rules(&self) -> &Arc<MixingRules> {
        &self.mixing_rules
    }

    pub fn options(&self) -> &PcSaftOptions {
        &self.options
    }
}

impl Residual for PcSaft {
    fn components(&self) -> usize {
        self.parameters.pure_records.len()
    }

    fn compute_packing_fraction(
        &self,
        temperature: f64,
        density: f64,
        molefracs: &Array1<f64>,
    ) -> f64 {
        let [eta] = self
            .parameters
            .zeta(temperature, &(molefracs * density), [3]);
        eta
    }

    fn max_packing_fraction(&self) -> f64 {
        self.options.max_eta
    }

    fn contributions(&self) -> &[Box<dyn HelmholtzEnergy>] {
        &self.contributions
    }

    fn molar_weight(&self) -> MolarWeight<Array1<f64>> {
        self.parameters.molarweight.clone() * (GRAM / MOL)
    }
}

impl fmt::Display for PcSaft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PC-SAFT")
    }
}
