use super::{PhaseEquilibrium, SolverOptions, Verbosity};
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::parameter::MOLEFRAC_TOLERANCE;
use crate::si::{Pressure, Temperature};
use crate::state::{DensityInitialization, State};
use ndarray::*;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

const MAX_ITER_TP: usize = 200;
const TOL_TP: f64 = 1e-8;
const MAX_ITER_RR: usize = 100;
const TOL_RR: f64 = 1e-12;

/// Initial values of the equilibrium ratios $K_i=\frac{y_i}{x_i}$.
#[derive(Clone, Debug, Default)]
pub enum KValueSeed {
    /// Ratio of the fugacity coefficients of the feed evaluated at the
    /// liquid and the vapor root of the pressure isotherm. If the isotherm
    /// has a single root, the flash is initialized with a stability analysis.
    #[default]
    Fugacity,
    /// Wilson correlation from critical temperatures, critical pressures and
    /// acentric factors.
    Wilson {
        critical_temperature: Temperature<Array1<f64>>,
        critical_pressure: Pressure<Array1<f64>>,
        acentric_factor: Array1<f64>,
    },
    /// Equilibrium ratios supplied by the caller.
    Given(Array1<f64>),
}

impl KValueSeed {
    fn k_values<E: Residual>(
        &self,
        feed: &State<E>,
        pressure: Pressure,
        options: SolverOptions,
    ) -> EosResult<Option<Array1<f64>>> {
        let n = feed.eos.components();
        let check = |len: usize| {
            if len != n {
                Err(EosError::IncompatibleComponents(n, len))
            } else {
                Ok(())
            }
        };
        match self {
            Self::Fugacity => {
                let vapor = State::new_tp(
                    &feed.eos,
                    feed.temperature,
                    pressure,
                    &feed.molefracs,
                    DensityInitialization::Vapor,
                    options.subsolver(),
                )?;
                let liquid = State::new_tp(
                    &feed.eos,
                    feed.temperature,
                    pressure,
                    &feed.molefracs,
                    DensityInitialization::Liquid,
                    options.subsolver(),
                )?;
                if PhaseEquilibrium::is_trivial_solution(&vapor, &liquid) {
                    return Ok(None);
                }
                Ok(Some((liquid.ln_phi()? - vapor.ln_phi()?).mapv(f64::exp)))
            }
            Self::Wilson {
                critical_temperature: tc,
                critical_pressure: pc,
                acentric_factor: omega,
            } => {
                check(tc.len())?;
                check(pc.len())?;
                check(omega.len())?;
                let tc_t = (tc / feed.temperature).into_value();
                let pc_p = (pc / pressure).into_value();
                Ok(Some(Zip::from(&tc_t).and(&pc_p).and(omega).map_collect(
                    |&tc_t, &pc_p, &omega| pc_p * (5.373 * (1.0 + omega) * (1.0 - tc_t)).exp(),
                )))
            }
            Self::Given(k) => {
                check(k.len())?;
                if let Some(&ki) = k.iter().find(|&&ki| !ki.is_finite() || ki <= 0.0) {
                    return Err(EosError::InvalidParameter(format!(
                        "initial K-values have to be positive, got {ki}"
                    )));
                }
                Ok(Some(k.clone()))
            }
        }
    }
}

/// Stages of the successive substitution in a flash calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashStep {
    Initialize,
    RachfordRiceSolve,
    UpdateCompositions,
    EvaluateFugacities,
    CheckConvergence,
    Converged,
    Failed,
}

impl fmt::Display for FlashStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:?}", self))
    }
}

/// Converged (or trivial) result of a successive substitution.
struct Substitution<E> {
    vapor: State<E>,
    liquid: State<E>,
    vapor_fraction: f64,
}

impl<E: Residual> Substitution<E> {
    fn is_trivial(&self) -> bool {
        PhaseEquilibrium::is_trivial_solution(&self.vapor, &self.liquid)
    }

    fn is_single_phase(&self) -> bool {
        self.vapor_fraction <= 0.0 || self.vapor_fraction >= 1.0
    }
}

/// # Flash calculations
impl<E: Residual> PhaseEquilibrium<E> {
    /// Perform a Tp-flash calculation for a feed with mole fractions `feed`
    /// at the given temperature and pressure.
    ///
    /// Equilibrium ratios are updated by successive substitution. A single phase
    /// result is only accepted if the feed passes a stability analysis; otherwise
    /// the iteration is restarted once from the unstable trial phase.
    pub fn tp_flash(
        eos: &Arc<E>,
        temperature: Temperature,
        pressure: Pressure,
        feed: &Array1<f64>,
        seed: &KValueSeed,
        options: SolverOptions,
    ) -> EosResult<Self> {
        eos.validate_moles(feed)?;
        if let Some(&z) = feed.iter().find(|&&z| !(0.0..=1.0).contains(&z)) {
            return Err(EosError::InvalidParameter(format!(
                "feed mole fraction {z} is outside of [0, 1]"
            )));
        }
        if (feed.sum() - 1.0).abs() > MOLEFRAC_TOLERANCE {
            return Err(EosError::InvalidParameter(format!(
                "feed mole fractions sum to {} instead of 1",
                feed.sum()
            )));
        }
        let verbosity = options.verbosity;
        log_iter!(verbosity, "{}", FlashStep::Initialize);
        let feed_state = State::new_tp(
            eos,
            temperature,
            pressure,
            feed,
            DensityInitialization::None,
            options.subsolver(),
        )?;

        let mut iterations = 0;
        let k = match seed.k_values(&feed_state, pressure, options)? {
            Some(k) => k,
            None => match Self::k_from_stability(&feed_state, options)? {
                Some(k) => k,
                None => {
                    log_result!(verbosity, "Tp flash: feed is stable");
                    return Self::stable_feed(feed_state, pressure, None, iterations);
                }
            },
        };

        let ss = Self::successive_substitution(&feed_state, pressure, k, &mut iterations, options)?;
        if !ss.is_trivial() && !ss.is_single_phase() {
            return Ok(Self::from_substitution(ss, pressure, iterations));
        }

        // single phase or trivial solution: check stability of the feed
        let k = match Self::k_from_stability(&feed_state, options)? {
            Some(k) => k,
            None => {
                log_result!(verbosity, "Tp flash: feed is stable");
                return Self::stable_feed(feed_state, pressure, Some(ss), iterations);
            }
        };
        log_result!(verbosity, "Tp flash: feed is unstable, restart");
        let ss = Self::successive_substitution(&feed_state, pressure, k, &mut iterations, options)?;
        if ss.is_trivial() {
            return Err(EosError::TrivialSolution);
        }
        if ss.is_single_phase() {
            return Err(EosError::IterationFailed(String::from("tp_flash")));
        }
        Ok(Self::from_substitution(ss, pressure, iterations))
    }

    fn from_substitution(ss: Substitution<E>, pressure: Pressure, iterations: usize) -> Self {
        Self::new(ss.vapor, ss.liquid, ss.vapor_fraction, pressure, iterations)
    }

    /// Equilibrium ratios from the most distinct unstable trial phase of a
    /// stability analysis, or `None` if the feed is stable.
    fn k_from_stability(
        feed_state: &State<E>,
        options: SolverOptions,
    ) -> EosResult<Option<Array1<f64>>> {
        let trial_states = feed_state.stability_analysis(options.subsolver())?;
        let distance = |s: &State<E>| (s.density / feed_state.density).into_value().ln().abs();
        let trial = trial_states
            .iter()
            .max_by(|s1, s2| distance(s1).total_cmp(&distance(s2)));
        Ok(trial.map(|trial| {
            let z = &feed_state.molefracs;
            let w = &trial.molefracs;
            let k = if trial.density < feed_state.density {
                w / z
            } else {
                z / w
            };
            k.mapv(|k| if k.is_finite() && k > 0.0 { k } else { 1.0 })
        }))
    }

    /// Result for a stable feed. Without a converged substitution, both phases
    /// are the feed itself and it is classified as vapor if $Z>0.5$.
    fn stable_feed(
        feed_state: State<E>,
        pressure: Pressure,
        ss: Option<Substitution<E>>,
        iterations: usize,
    ) -> EosResult<Self> {
        match ss {
            Some(ss) if !ss.is_trivial() => {
                let beta = if ss.vapor_fraction >= 1.0 { 1.0 } else { 0.0 };
                Ok(Self::new(ss.vapor, ss.liquid, beta, pressure, iterations))
            }
            _ => {
                let beta = if feed_state.compressibility()? > 0.5 {
                    1.0
                } else {
                    0.0
                };
                Ok(Self::new(
                    feed_state.clone(),
                    feed_state,
                    beta,
                    pressure,
                    iterations,
                ))
            }
        }
    }

    fn successive_substitution(
        feed_state: &State<E>,
        pressure: Pressure,
        mut k: Array1<f64>,
        iterations: &mut usize,
        options: SolverOptions,
    ) -> EosResult<Substitution<E>> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_TP, TOL_TP);
        let z = &feed_state.molefracs;
        let mut beta = None;

        log_iter!(
            verbosity,
            " iter |      step          |    residual    |    beta    |  liquid mole fractions  |  vapor mole fractions  "
        );
        log_iter!(verbosity, "{:-<118}", "");

        for _ in 0..max_iter {
            *iterations += 1;
            let iter = *iterations;
            options.check_deadline("tp_flash", iter, beta)?;

            log_iter!(verbosity, " {:4} | {:18} |", iter, FlashStep::RachfordRiceSolve);
            let b = rachford_rice(z, &k, beta, options.subsolver())?;
            beta = Some(b);

            log_iter!(verbosity, " {:4} | {:18} |", iter, FlashStep::UpdateCompositions);
            let x = z / &(1.0 + b * (&k - 1.0));
            let x = &x / x.sum();
            let y = &k * &x;
            let y = &y / y.sum();

            log_iter!(verbosity, " {:4} | {:18} |", iter, FlashStep::EvaluateFugacities);
            let liquid = State::new_tp(
                &feed_state.eos,
                feed_state.temperature,
                pressure,
                &x,
                DensityInitialization::Liquid,
                options.subsolver(),
            )?;
            let vapor = State::new_tp(
                &feed_state.eos,
                feed_state.temperature,
                pressure,
                &y,
                DensityInitialization::Vapor,
                options.subsolver(),
            )?;
            let k_new = (liquid.ln_phi()? - vapor.ln_phi()?).mapv(f64::exp);

            let residual = Zip::from(&k_new)
                .and(&k)
                .fold(0.0, |acc: f64, &k_new, &k| (k_new / k - 1.0).abs().max(acc));
            log_iter!(
                verbosity,
                " {:4} | {:18} | {:14.8e} | {:10.8} | {:.8} | {:.8}",
                iter,
                FlashStep::CheckConvergence,
                residual,
                b,
                x,
                y
            );
            k = k_new;

            let ss = Substitution {
                vapor,
                liquid,
                vapor_fraction: b,
            };
            if residual < tol || ss.is_trivial() {
                log_iter!(verbosity, " {:4} | {:18} |", iter, FlashStep::Converged);
                log_result!(
                    verbosity,
                    "Tp flash: calculation converged in {} step(s)\n",
                    iter
                );
                return Ok(ss);
            }
        }
        log_iter!(verbosity, " {:4} | {:18} |", iterations, FlashStep::Failed);
        Err(EosError::not_converged("tp_flash", *iterations, beta))
    }
}

/// Solve the Rachford-Rice equation $\sum_i\frac{z_i(K_i-1)}{1+\beta(K_i-1)}=0$
/// for the vapor fraction $\beta$.
///
/// Returns 0 if the feed is at or below its bubble point ($\sum_iz_iK_i\leq 1$)
/// and 1 if it is at or above its dew point ($\sum_i\frac{z_i}{K_i}\leq 1$).
/// The safeguarded Newton iteration honors the iteration limit, tolerance and
/// deadline of `options`.
pub fn rachford_rice(
    feed: &Array1<f64>,
    k: &Array1<f64>,
    beta_in: Option<f64>,
    options: SolverOptions,
) -> EosResult<f64> {
    let (max_iter, tol, _) = options.unwrap_or(MAX_ITER_RR, TOL_RR);
    if k.iter().any(|k| !k.is_finite() || *k < 0.0) {
        return Err(EosError::IterationFailed(String::from("rachford_rice")));
    }

    // check if solution exists
    if (feed * k).sum() <= 1.0 {
        return Ok(0.0);
    }
    if (feed / k).iter().filter(|x| !x.is_nan()).sum::<f64>() <= 1.0 {
        return Ok(1.0);
    }
    let (mut beta_min, mut beta_max) = (0.0, 1.0);

    // look for tighter bounds
    for (&k, &f) in k.iter().zip(feed.iter()) {
        if k > 1.0 {
            let b = (k * f - 1.0) / (k - 1.0);
            if b > beta_min {
                beta_min = b;
            }
        }
        if k < 1.0 {
            let b = (1.0 - f) / (1.0 - k);
            if b < beta_max {
                beta_max = b;
            }
        }
    }

    // initialize
    let mut beta = 0.5 * (beta_min + beta_max);
    if let Some(b) = beta_in {
        if b > beta_min && b < beta_max {
            beta = b;
        }
    }

    // iterate
    for i in 1..=max_iter {
        options.check_deadline("rachford_rice", i, Some(beta))?;
        let frac = (k - 1.0) / (1.0 - beta + beta * k);
        let g = (feed * &frac).sum();
        let dg = -(feed * &frac * &frac).sum();
        if g > 0.0 {
            beta_min = beta;
        } else {
            beta_max = beta;
        }

        let dbeta = g / dg;
        beta -= dbeta;

        if beta < beta_min || beta > beta_max {
            beta = 0.5 * (beta_min + beta_max);
        }
        if dbeta.abs() < tol {
            return Ok(beta);
        }
    }
    Err(EosError::not_converged("rachford_rice", max_iter, Some(beta)))
}

/// Tp-flash calculations for several temperatures and pressures of the same feed.
///
/// The flashes are independent of each other and run in parallel if the
/// `rayon` feature is enabled. Each entry of the result corresponds to the
/// conditions at the same position.
pub fn batch_tp_flash<E: Residual>(
    eos: &Arc<E>,
    conditions: &[(Temperature, Pressure)],
    feed: &Array1<f64>,
    seed: &KValueSeed,
    options: SolverOptions,
) -> Vec<EosResult<PhaseEquilibrium<E>>> {
    let flash = |&(temperature, pressure): &(Temperature, Pressure)| {
        PhaseEquilibrium::tp_flash(eos, temperature, pressure, feed, seed, options)
    };
    #[cfg(feature = "rayon")]
    let results = conditions.par_iter().map(flash).collect();
    #[cfg(not(feature = "rayon"))]
    let results = conditions.iter().map(flash).collect();
    results
}
