//! Combining rules for the cross interactions of unlike segments.
use super::parameters::PcSaftParameters;
use crate::hard_sphere::HardSphereProperties;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use petrosaft_core::{EosError, EosResult};
use std::sync::Arc;

/// Treatment of component pairs without a binary record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BinaryInteractionPolicy {
    /// Missing binary parameters are zero.
    #[default]
    DefaultZero,
    /// Missing binary parameters are an error.
    Strict,
}

/// Berthelot-Lorentz combining rules with binary corrections
/// $$\sigma_{ij}=\left(1-l_{ij}\right)\frac{\sigma_i+\sigma_j}{2},~~~~\varepsilon_{ij}=\left(1-k_{ij}\right)\sqrt{\varepsilon_i\varepsilon_j}$$
///
/// The cross parameters are evaluated once on construction.
#[derive(Debug)]
pub struct MixingRules {
    parameters: Arc<PcSaftParameters>,
    policy: BinaryInteractionPolicy,
    sigma_ij: Array2<f64>,
    epsilon_k_ij: Array2<f64>,
}

impl MixingRules {
    /// Fails with [EosError::InvalidParameter] if the policy is
    /// [BinaryInteractionPolicy::Strict] and a pair has no binary record.
    pub fn new(
        parameters: &Arc<PcSaftParameters>,
        policy: BinaryInteractionPolicy,
    ) -> EosResult<Self> {
        let n = parameters.m.len();
        let mut rules = Self {
            parameters: parameters.clone(),
            policy,
            sigma_ij: Array2::zeros((n, n)),
            epsilon_k_ij: Array2::zeros((n, n)),
        };
        let p = parameters;
        for i in 0..n {
            for j in 0..n {
                let (k_ij, l_ij) = (rules.k_ij(i, j)?, rules.l_ij(i, j)?);
                rules.sigma_ij[[i, j]] = (1.0 - l_ij) * 0.5 * (p.sigma[i] + p.sigma[j]);
                rules.epsilon_k_ij[[i, j]] = (1.0 - k_ij) * (p.epsilon_k[i] * p.epsilon_k[j]).sqrt();
            }
        }
        Ok(rules)
    }

    pub fn parameters(&self) -> &Arc<PcSaftParameters> {
        &self.parameters
    }

    fn binary<F: Fn(&super::PcSaftBinaryRecord) -> f64>(
        &self,
        i: usize,
        j: usize,
        f: F,
    ) -> EosResult<f64> {
        if i == j {
            return Ok(0.0);
        }
        match (self.parameters.binary_record(i, j), self.policy) {
            (Some(record), _) => Ok(f(record)),
            (None, BinaryInteractionPolicy::DefaultZero) => Ok(0.0),
            (None, BinaryInteractionPolicy::Strict) => Err(EosError::InvalidParameter(format!(
                "no binary interaction parameter for components {i} and {j}"
            ))),
        }
    }

    /// Binary correction $k_{ij}$ of the dispersion energy.
    pub fn k_ij(&self, i: usize, j: usize) -> EosResult<f64> {
        self.binary(i, j, |r| r.k_ij)
    }

    /// Binary correction $l_{ij}$ of the segment diameter.
    pub fn l_ij(&self, i: usize, j: usize) -> EosResult<f64> {
        self.binary(i, j, |r| r.l_ij)
    }

    /// Cross segment diameter in Angstrom.
    pub fn sigma_ij(&self, i: usize, j: usize) -> f64 {
        self.sigma_ij[[i, j]]
    }

    /// Cross energy parameter in Kelvin.
    pub fn epsilon_k_ij(&self, i: usize, j: usize) -> f64 {
        self.epsilon_k_ij[[i, j]]
    }

    /// $\bar m=\sum_ix_im_i$
    pub fn mean_segment_number<D: DualNum<f64> + Copy>(&self, molefracs: &Array1<D>) -> D {
        molefracs
            .iter()
            .zip(self.parameters.m.iter())
            .fold(D::zero(), |acc, (&x, &m)| acc + x * m)
    }

    /// $\bar d=\left(\frac{\sum_ix_im_id_i^3}{\sum_ix_im_i}\right)^{1/3}$
    pub fn mean_segment_diameter<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        molefracs: &Array1<D>,
    ) -> D {
        let d = self.parameters.hs_diameter(temperature);
        let md3 = molefracs
            .iter()
            .zip(self.parameters.m.iter())
            .zip(d.iter())
            .fold(D::zero(), |acc, ((&x, &m), &d)| acc + x * m * d.powi(3));
        (md3 / self.mean_segment_number(molefracs)).cbrt()
    }
}
