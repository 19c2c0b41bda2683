use super::{PhaseEquilibrium, SolverOptions, Verbosity};
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::si::MOL;
use crate::state::{DensityInitialization, State};
use ndarray::*;
use num_dual::linalg::{smallest_ev, LU};

/// Mole fraction of the dominant component in a liquid trial phase.
const DOMINANT_FRACTION: f64 = 0.99;
const MAX_ITER_TPD: usize = 100;
const TOL_TPD: f64 = 1e-6;
/// A trial phase is only reported below this tangent plane distance.
const NEGATIVE_TPD: f64 = -1e-8;
const MIN_EIGENVALUE: f64 = 1e-3;
const HESSIAN_SHIFT: f64 = 0.25;
const MAX_HESSIAN_SHIFT: f64 = 30.0;

/// Scheme used in an iteration of the tangent plane distance minimization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TpdScheme {
    Substitution,
    Newton,
}

fn ln_or_zero(y: f64) -> f64 {
    if y > f64::EPSILON {
        y.ln()
    } else {
        0.0
    }
}

/// Trial phases far below the tangent plane converge with a looser tolerance.
fn relaxed_tolerance(tol: f64, tpd: f64, iteration: usize) -> f64 {
    if tpd < -1e-1 && iteration > 5 {
        tol * 1e3
    } else if tpd < -1e-1 {
        tol * 1e2
    } else if tpd < -1e-2 {
        tol * 1e1
    } else {
        tol
    }
}

/// # Stability analysis
impl<E: Residual> State<E> {
    /// `true` if no trial phase with a negative tangent plane distance exists.
    pub fn is_stable(&self, options: SolverOptions) -> EosResult<bool> {
        Ok(self.stability_analysis(options)?.is_empty())
    }

    /// Minimize the tangent plane distance from several trial phases: an ideal
    /// vapor and one liquid per component in which that component dominates.
    ///
    /// Returns the distinct minima with a negative tangent plane distance. They
    /// are initial estimates for a phase split. Trial phases for which the
    /// minimization fails are skipped unless the deadline has passed.
    pub fn stability_analysis(&self, options: SolverOptions) -> EosResult<Vec<State<E>>> {
        let n = self.eos.components();
        let mut minima: Vec<State<E>> = Vec::new();
        for trial in 0..=n {
            let label = if trial == n {
                String::from("vapor trial phase")
            } else {
                format!("liquid trial phase {}", trial + 1)
            };
            let Ok(mut trial_state) = self.trial_state(trial, options) else {
                continue;
            };
            let (tpd, iterations) = match self.minimize_tpd(&mut trial_state, options) {
                Ok(res) => res,
                Err(e) if !options.deadline_passed() => {
                    log_result!(options.verbosity, "{}: {}\n", label, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let outcome = match tpd {
                None => "trivial solution",
                Some(tpd) if tpd >= NEGATIVE_TPD => "minimum above the tangent plane",
                Some(_)
                    if minima
                        .iter()
                        .any(|s| PhaseEquilibrium::is_trivial_solution(s, &trial_state)) =>
                {
                    "known minimum"
                }
                Some(_) => {
                    minima.push(trial_state);
                    "new minimum"
                }
            };
            log_result!(
                options.verbosity,
                "{}: {} after {} step(s)\n",
                label,
                outcome,
                iterations
            );
        }
        Ok(minima)
    }

    /// Tangent plane distance $\sum_iw_i\left(\ln w_i+\ln\varphi_i(w)-\ln z_i-\ln\varphi_i(z)\right)$
    /// of a trial phase $w$ w.r.t. this state $z$.
    pub fn tangent_plane_distance(&self, trial_state: &State<E>) -> EosResult<f64> {
        let d = self.molefracs.mapv(f64::ln) + self.ln_phi()?;
        let ln_phi_w = trial_state.ln_phi()?;
        Ok(Zip::from(&trial_state.molefracs)
            .and(&ln_phi_w)
            .and(&d)
            .fold(0.0, |acc, &w, &lw, &d| {
                if w > 0.0 {
                    acc + w * (w.ln() + lw - d)
                } else {
                    acc
                }
            }))
    }

    fn trial_state(&self, trial: usize, options: SolverOptions) -> EosResult<State<E>> {
        let n = self.eos.components();
        let z = &self.molefracs;
        let (w, initialization) = if trial == n {
            let w = self.ln_phi()?.mapv(f64::exp) * z;
            (&w / w.sum(), DensityInitialization::Vapor)
        } else {
            let rest = (1.0 - DOMINANT_FRACTION) / (z.sum() - z[trial]);
            let w = Array1::from_shape_fn(n, |i| {
                if i == trial {
                    DOMINANT_FRACTION
                } else {
                    z[i] * rest
                }
            });
            (w, DensityInitialization::Liquid)
        };
        State::new_npt(
            &self.eos,
            self.temperature,
            self.pressure()?,
            &(w * MOL),
            initialization,
            options.subsolver(),
        )
    }

    /// Successive substitution that switches to a Newton scheme if it
    /// stagnates. Returns `None` for a trivial solution.
    fn minimize_tpd(
        &self,
        trial: &mut State<E>,
        options: SolverOptions,
    ) -> EosResult<(Option<f64>, usize)> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_TPD, TOL_TPD);
        let d = self.molefracs.mapv(f64::ln) + self.ln_phi()?;
        let mut scheme = TpdScheme::Substitution;
        let mut tol_k = tol;
        let mut tpd = 1e10;

        log_iter!(verbosity, " iter |    residual    |     tpd     | scheme");
        log_iter!(verbosity, "{:-<52}", "");
        for k in 1..=max_iter {
            options.check_deadline("stability analysis", k, Some(tpd))?;
            let residual = match scheme {
                TpdScheme::Substitution => {
                    let y = (&d - &trial.ln_phi()?).mapv(f64::exp);
                    let tpd_old = tpd;
                    tpd = 1.0 - y.sum();
                    let residual = (&y / y.sum() - &trial.molefracs).mapv(f64::abs).sum();
                    *trial = State::new_npt(
                        &trial.eos,
                        trial.temperature,
                        trial.pressure()?,
                        &(&y * MOL),
                        DensityInitialization::InitialDensity(trial.density),
                        options.subsolver(),
                    )?;
                    if (k > 4 && residual > tol_k) || (k > 2 && tpd > tpd_old + 1e-5) {
                        scheme = TpdScheme::Newton;
                    }
                    residual
                }
                TpdScheme::Newton => trial.tpd_newton_step(&d, &mut tpd, options)?,
            };
            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:11.8} | {:?}",
                k,
                residual,
                tpd,
                scheme
            );
            if PhaseEquilibrium::is_trivial_solution(self, trial) {
                return Ok((None, k));
            }
            tol_k = tol_k.max(relaxed_tolerance(tol, tpd, k));
            if residual < tol_k {
                return Ok((Some(tpd), k));
            }
        }
        Err(EosError::not_converged(
            "stability analysis",
            max_iter,
            Some(tpd),
        ))
    }

    /// Newton step in the variables $\sqrt{y_i}$. The Hessian is shifted by a
    /// multiple of the identity until it is positive definite, the step stays
    /// small and the tangent plane distance decreases.
    fn tpd_newton_step(
        &mut self,
        d: &Array1<f64>,
        tpd: &mut f64,
        options: SolverOptions,
    ) -> EosResult<f64> {
        let n = self.eos.components();
        let ln_phi = self.ln_phi()?;
        let y = (&self.moles / MOL).into_value();
        let ln_y = y.mapv(ln_or_zero);
        let sqrt_y = y.mapv(f64::sqrt);
        let gradient = (&ln_y + &ln_phi - d) * &sqrt_y;

        let mut hessian = (self.dln_phi_dnj()? * MOL).into_value();
        for i in 0..n {
            let mut row = hessian.row_mut(i);
            row *= &(sqrt_y[i] * &sqrt_y);
            if y[i] > f64::EPSILON {
                row[i] += ln_y[i] + ln_phi[i] - d[i];
            }
        }

        let mut shift = 1.0;
        let (y_new, tpd_new) = loop {
            let shifted = &hessian + &(Array2::<f64>::eye(n) * shift);
            let (min_eigenvalue, _) = smallest_ev(shifted.clone());
            if min_eigenvalue < MIN_EIGENVALUE && shift < 20.0 {
                shift += 2.0 * HESSIAN_SHIFT;
                continue;
            }

            let delta = LU::new(shifted)?.solve(&gradient);
            let too_large = delta
                .iter()
                .zip(y.iter())
                .any(|(dy, y)| ((0.5 * dy).powi(2) / y).abs() > 5.0);
            if too_large && shift < MAX_HESSIAN_SHIFT {
                shift += 2.0 * HESSIAN_SHIFT;
                continue;
            }

            let y_new = (&sqrt_y - &(delta / 2.0)).mapv(|v| v * v);
            let tpd_new = 1.0 + (&y_new * &(y_new.mapv(ln_or_zero) + &ln_phi - d - 1.0)).sum();
            if tpd_new > *tpd && shift < MAX_HESSIAN_SHIFT {
                shift += HESSIAN_SHIFT;
                continue;
            }
            break (y_new, tpd_new);
        };

        *tpd = tpd_new;
        *self = State::new_npt(
            &self.eos,
            self.temperature,
            self.pressure()?,
            &(y_new * MOL),
            DensityInitialization::InitialDensity(self.density),
            options.subsolver(),
        )?;
        Ok(gradient.mapv(f64::abs).sum())
    }
}
