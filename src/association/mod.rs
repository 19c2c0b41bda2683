//! SAFT association contribution for molecules with two site types.
use crate::hard_sphere::{check_packing_fraction, contact_value, HardSphereProperties};
use ndarray::*;
use num_dual::linalg::{norm, LU};
use num_dual::*;
use petrosaft_core::parameter::ParameterError;
use petrosaft_core::{
    log_result, EosError, EosResult, HelmholtzEnergyDual, SolverOptions, StateHD, Verbosity,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

const MAX_ITER: usize = 200;
const TOL: f64 = 1e-10;

/// Step lengths of the successive substitution: plain substitution first,
/// then a single damped retry if it did not converge.
const DAMPING: [f64; 2] = [1.0, 0.5];

fn one() -> f64 {
    1.0
}

/// Pure component association parameters
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct AssociationRecord {
    /// Association volume parameter
    pub kappa_ab: f64,
    /// Association energy parameter in units of Kelvin
    pub epsilon_k_ab: f64,
    /// \# of association sites of type A
    #[serde(default = "one")]
    pub na: f64,
    /// \# of association sites of type B
    #[serde(default = "one")]
    pub nb: f64,
}

impl AssociationRecord {
    pub fn new(kappa_ab: f64, epsilon_k_ab: f64, na: f64, nb: f64) -> Self {
        Self {
            kappa_ab,
            epsilon_k_ab,
            na,
            nb,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [
            ("kappa_ab", self.kappa_ab),
            ("epsilon_k_ab", self.epsilon_k_ab),
            ("na", self.na),
            ("nb", self.nb),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParameterError::InvalidParameter(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for AssociationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationRecord(kappa_ab={}", self.kappa_ab)?;
        write!(f, ", epsilon_k_ab={}", self.epsilon_k_ab)?;
        write!(f, ", na={}", self.na)?;
        write!(f, ", nb={})", self.nb)
    }
}

/// Parameters of the associating components only.
#[derive(Clone, Debug)]
pub struct AssociationParameters {
    /// Indices of the associating components
    pub assoc_comp: Array1<usize>,
    pub kappa_ab: Array1<f64>,
    pub epsilon_k_ab: Array1<f64>,
    /// $\sigma_{ij}^3\sqrt{\kappa_i\kappa_j}$ with $\sigma_{ij}^3=\left(\sigma_i\sigma_j\right)^{3/2}$
    pub sigma3_kappa_aibj: Array2<f64>,
    pub epsilon_k_aibj: Array2<f64>,
    pub na: Array1<f64>,
    pub nb: Array1<f64>,
}

impl AssociationParameters {
    pub fn new(records: &[Option<AssociationRecord>], sigma: &Array1<f64>) -> Self {
        let (assoc_comp, records): (Vec<_>, Vec<_>) = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|r| (i, r)))
            .unzip();
        let field = |f: fn(&AssociationRecord) -> f64| records.iter().map(f).collect::<Array1<_>>();
        let kappa_ab = field(|r| r.kappa_ab);
        let epsilon_k_ab = field(|r| r.epsilon_k_ab);
        let sigma: Array1<f64> = assoc_comp.iter().map(|&i| sigma[i]).collect();
        let n = assoc_comp.len();

        Self {
            sigma3_kappa_aibj: Array2::from_shape_fn([n; 2], |(i, j)| {
                (sigma[i] * sigma[j]).powf(1.5) * (kappa_ab[i] * kappa_ab[j]).sqrt()
            }),
            epsilon_k_aibj: Array2::from_shape_fn([n; 2], |(i, j)| {
                0.5 * (epsilon_k_ab[i] + epsilon_k_ab[j])
            }),
            assoc_comp: Array1::from_vec(assoc_comp),
            kappa_ab,
            epsilon_k_ab,
            na: field(|r| r.na),
            nb: field(|r| r.nb),
        }
    }

    /// `true` if no component associates.
    pub fn is_empty(&self) -> bool {
        self.assoc_comp.is_empty()
    }

    /// Damped successive substitution of the mass action law
    /// $X_{Ai}=\left(1+\sum_j\rho_jn_{B,j}X_{Bj}\Delta_{ij}\right)^{-1}$
    /// and its counterpart for the B sites, starting from free sites.
    fn substitution(
        &self,
        delta: &Array2<f64>,
        rho: &Array1<f64>,
        damping: f64,
        options: &SolverOptions,
    ) -> EosResult<Array1<f64>> {
        let (max_iter, tol, _) = options.unwrap_or(MAX_ITER, TOL);
        let n = self.assoc_comp.len();
        let delta_rho = delta * rho;
        let mut x = Array1::ones(2 * n);
        for k in 1..=max_iter {
            options.check_deadline("association", k, x.iter().copied().reduce(f64::min))?;
            let (xa, xb) = x.view().split_at(Axis(0), n);
            let xa_new = (delta_rho.dot(&(&xb * &self.nb)) + 1.0).mapv(f64::recip);
            let xb_new = (delta_rho.dot(&(&xa * &self.na)) + 1.0).mapv(f64::recip);
            let step = concatenate![Axis(0), xa_new, xb_new] - &x;
            let res = step.iter().fold(0.0, |acc: f64, s| acc.max(s.abs()));
            x.scaled_add(damping, &step);
            if res < tol {
                return Ok(x);
            }
        }
        Err(EosError::not_converged(
            "association",
            max_iter,
            x.iter().copied().reduce(f64::min),
        ))
    }

    /// Newton step on $\frac{1}{X_{Ai}}-1-\sum_j\rho_jn_{B,j}X_{Bj}\Delta_{ij}=0$
    /// and its counterpart for the B sites.
    fn newton_step<D: DualNum<f64> + Copy + ScalarOperand>(
        &self,
        x: &mut Array1<D>,
        delta: &Array2<D>,
        rho: &Array1<D>,
    ) -> EosResult<f64> {
        let n = self.assoc_comp.len();
        let mut g = Array1::zeros(2 * n);
        let mut h = Array2::zeros((2 * n, 2 * n));
        for i in 0..n {
            let delta_rho = &delta.row(i) * rho;
            let bonded_a = (&delta_rho * &x.slice(s![n..]) * &self.nb).sum() + 1.0;
            let bonded_b = (&delta_rho * &x.slice(s![..n]) * &self.na).sum() + 1.0;
            g[i] = x[i].recip() - bonded_a;
            g[n + i] = x[n + i].recip() - bonded_b;
            h[(i, i)] = -bonded_a / x[i];
            h[(n + i, n + i)] = -bonded_b / x[n + i];
            for j in 0..n {
                h[(i, n + j)] = -delta_rho[j] * self.nb[j];
                h[(n + i, j)] = -delta_rho[j] * self.na[j];
            }
        }
        let dx = LU::new(h)?.solve(&g);
        *x = &*x - &dx;
        Ok(norm(&g.map(D::re)))
    }
}

/// Contribution $n\left(\ln X-\frac{X}{2}+\frac{1}{2}\right)$ of `n` sites with
/// non-bonded fraction `x`.
fn site_term<D: DualNum<f64> + Copy>(x: D, n: f64) -> D {
    (x.ln() - x * 0.5 + 0.5) * n
}

/// Non-bonded fraction of the A sites of a single component with A and B sites.
fn site_fraction_ab<D: DualNum<f64> + Copy>(delta_rho: D, na: f64, nb: f64) -> D {
    if delta_rho.re() > f64::EPSILON.sqrt() {
        let b = delta_rho * (nb - na) + 1.0;
        ((b.powi(2) + delta_rho * na * 4.0).sqrt() - b) / (delta_rho * na * 2.0)
    } else {
        D::one() + delta_rho * nb * (delta_rho * (nb + na) - 1.0)
    }
}

/// Non-bonded fraction of a single component with only one site type.
fn site_fraction_a<D: DualNum<f64> + Copy>(delta_rho: D, na: f64) -> D {
    if delta_rho.re() > f64::EPSILON.sqrt() {
        ((delta_rho * na * 4.0 + 1.0).sqrt() - 1.0) / (delta_rho * na * 2.0)
    } else {
        D::one() + delta_rho * na * (delta_rho * na * 2.0 - 1.0)
    }
}

/// Helmholtz energy of hydrogen bonding
/// $$\frac{\beta A}{V}=\sum_i\rho_i\sum_{\alpha\in\\{A,B\\}}n_\alpha\left(\ln X_{\alpha i}-\frac{X_{\alpha i}}{2}+\frac{1}{2}\right)$$
///
/// For a single associating component the fractions of non-bonded sites are
/// known analytically. Otherwise they are found by a damped successive
/// substitution in `f64` followed by `D::NDERIV` Newton steps in dual numbers,
/// so that the fractions carry exact derivatives.
pub struct Association<P> {
    parameters: Arc<P>,
    association_parameters: AssociationParameters,
    options: SolverOptions,
    force_cross_association: bool,
}

impl<P: HardSphereProperties> Association<P> {
    pub fn new(
        parameters: &Arc<P>,
        association_parameters: &AssociationParameters,
        max_iter: usize,
        tol: f64,
    ) -> Self {
        Self {
            parameters: Arc::clone(parameters),
            association_parameters: association_parameters.clone(),
            options: SolverOptions::new().max_iter(max_iter).tol(tol),
            force_cross_association: false,
        }
    }

    /// Always use the iterative solution, also for a single associating component.
    pub fn new_cross_association(
        parameters: &Arc<P>,
        association_parameters: &AssociationParameters,
        max_iter: usize,
        tol: f64,
    ) -> Self {
        Self {
            force_cross_association: true,
            ..Self::new(parameters, association_parameters, max_iter, tol)
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.options.verbosity = verbosity;
        self
    }

    /// Abort the iterative solution with `NotConverged` after `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.options.deadline = deadline;
        self
    }

    /// $\Delta_{ij}=g^\mathrm{hs}_{ij}\sigma_{ij}^3\kappa_{ij}\left(e^{\varepsilon_{ij}/kT}-1\right)$
    /// between all associating components.
    fn association_strength<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        partial_density: &Array1<D>,
    ) -> EosResult<Array2<D>> {
        let p = &self.parameters;
        let a = &self.association_parameters;
        let d = p.hs_diameter(temperature);
        let [zeta2, zeta3] = p.zeta(temperature, partial_density, [2, 3]);
        let void = (-check_packing_fraction(zeta3)? + 1.0).recip();
        let ac = &a.assoc_comp;
        Ok(Array2::from_shape_fn([ac.len(); 2], |(i, j)| {
            let (di, dj) = (d[ac[i]], d[ac[j]]);
            let well = (temperature.recip() * a.epsilon_k_aibj[(i, j)]).exp_m1();
            contact_value(zeta2, void, di * dj / (di + dj)) * well * a.sigma3_kappa_aibj[(i, j)]
        }))
    }

    fn cross_association<D: DualNum<f64> + Copy + ScalarOperand>(
        &self,
        rho: &Array1<D>,
        delta: &Array2<D>,
    ) -> EosResult<D> {
        if rho.sum().re() < f64::EPSILON {
            return Ok(D::zero());
        }
        let a = &self.association_parameters;
        let delta_re = delta.map(D::re);
        let rho_re = rho.map(D::re);
        let solve = |damping| a.substitution(&delta_re, &rho_re, damping, &self.options);
        let x = solve(DAMPING[0]).or_else(|e| match e {
            EosError::NotConverged { .. } if !self.options.deadline_passed() => {
                log_result!(
                    self.options.verbosity,
                    "association: {} Retrying with damping {}.",
                    e,
                    DAMPING[1]
                );
                solve(DAMPING[1])
            }
            e => Err(e),
        })?;

        let mut x = x.mapv(D::from);
        for _ in 0..D::NDERIV {
            a.newton_step(&mut x, delta, rho)?;
        }
        let n = a.assoc_comp.len();
        Ok(Zip::from(rho)
            .and(x.slice(s![..n]))
            .and(x.slice(s![n..]))
            .and(&a.na)
            .and(&a.nb)
            .fold(D::zero(), |acc, &rho, &xa, &xb, &na, &nb| {
                acc + rho * (site_term(xa, na) + site_term(xb, nb))
            }))
    }
}

impl<D: DualNum<f64> + Copy + ScalarOperand, P: HardSphereProperties> HelmholtzEnergyDual<D>
    for Association<P>
{
    fn helmholtz_energy(&self, state: &StateHD<D>) -> EosResult<D> {
        let a = &self.association_parameters;
        let delta = self.association_strength(state.temperature, &state.partial_density)?;
        if a.assoc_comp.len() > 1 || self.force_cross_association {
            let rho = a.assoc_comp.mapv(|i| state.partial_density[i]);
            return Ok(self.cross_association(&rho, &delta)? * state.volume);
        }

        let c = a.assoc_comp[0];
        let (na, nb) = (a.na[0], a.nb[0]);
        let delta_rho = delta[(0, 0)] * state.partial_density[c];
        let phi = if nb > 0.0 {
            let xa = site_fraction_ab(delta_rho, na, nb);
            let xb = (xa - 1.0) * (na / nb) + 1.0;
            site_term(xa, na) + site_term(xb, nb)
        } else {
            site_term(site_fraction_a(delta_rho, na), na)
        };
        Ok(phi * state.moles[c])
    }
}

impl<P> fmt::Display for Association<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Association")
    }
}
