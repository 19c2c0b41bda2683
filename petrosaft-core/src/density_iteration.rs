use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::phase_equilibria::{SolverOptions, Verbosity};
use crate::si::{Density, MolarEnergy, Pressure, Temperature, METER, MOL, PASCAL};
use crate::state::{DensityInitialization, State};
use ndarray::Array1;
use std::sync::Arc;
use typenum::P3;

const ETA_MIN: f64 = 1e-10;
const POINTS_PER_DECADE: f64 = 10.0;
const MAX_ITER_DENSITY: usize = 100;
const TOL_DENSITY: f64 = 1e-9;
const TOL_ETA: f64 = 1e-10;

/// Result of a density iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityRoot {
    pub density: Density,
    /// `true` if the pressure isotherm has a single root at the given
    /// conditions so that the phase cannot be identified.
    pub phase_ambiguous: bool,
    /// Number of Newton/bisection steps
    pub iterations: usize,
}

/// Pressure isotherm parametrized by the packing fraction.
struct Isotherm<'a, E> {
    eos: &'a Arc<E>,
    temperature: Temperature,
    pressure: Pressure,
    molefracs: &'a Array1<f64>,
    /// molar density per unit packing fraction
    scale: Density,
}

impl<'a, E: Residual> Isotherm<'a, E> {
    fn density(&self, eta: f64) -> Density {
        self.scale * eta
    }

    fn density_in_mol_m3(&self, eta: f64) -> f64 {
        self.density(eta).convert_into(MOL / METER.powi::<P3>())
    }

    /// Relative pressure residual and its derivative w.r.t. the packing fraction.
    fn residual(&self, eta: f64) -> EosResult<(f64, f64)> {
        let (p, dp_drho) =
            State::new_density(self.eos, self.temperature, self.density(eta), self.molefracs)?
                .p_dpdrho()?;
        Ok((
            ((p - self.pressure) / self.pressure).into_value(),
            (dp_drho * self.scale / self.pressure).into_value(),
        ))
    }

    fn residual_molar_gibbs_energy(&self, eta: f64) -> EosResult<MolarEnergy> {
        State::new_density(self.eos, self.temperature, self.density(eta), self.molefracs)?
            .residual_molar_gibbs_energy()
    }
}

/// Sign changes of $p(\eta)-p$ on a logarithmic grid in the packing fraction.
fn scan<E: Residual>(
    isotherm: &Isotherm<E>,
    max_eta: f64,
    verbosity: Verbosity,
) -> EosResult<Vec<[(f64, f64); 2]>> {
    let mut grid: Vec<f64> = (0..)
        .map(|k| ETA_MIN * 10f64.powf(k as f64 / POINTS_PER_DECADE))
        .take_while(|&eta| eta < max_eta)
        .collect();
    grid.push(max_eta);

    let mut values: Vec<(f64, f64)> = Vec::with_capacity(grid.len());
    for &eta in grid.iter() {
        match isotherm.residual(eta) {
            Ok((f, _)) => values.push((eta, f)),
            Err(EosError::OutOfDomain { quantity, value }) if !values.is_empty() => {
                log_result!(
                    verbosity,
                    "density iteration: {} = {} out of domain, scan truncated at eta = {:.6e}",
                    quantity,
                    value,
                    eta
                );
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(values
        .windows(2)
        .filter(|w| w[0].1 * w[1].1 <= 0.0)
        .map(|w| [w[0], w[1]])
        .collect())
}

/// Safeguarded Newton iteration within a bracket of the packing fraction.
fn solve_bracket<E: Residual>(
    isotherm: &Isotherm<E>,
    bracket: [(f64, f64); 2],
    eta0: f64,
    options: SolverOptions,
) -> EosResult<(f64, usize)> {
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_DENSITY, TOL_DENSITY);
    let [(mut lo, f_lo), (mut hi, _)] = bracket;
    let mut eta = eta0;

    log_iter!(verbosity, " iter |    residual    |  density [mol/m³]  | bisection");
    log_iter!(verbosity, "{:-<56}", "");
    for i in 1..=max_iter {
        options.check_deadline("density_iteration", i, Some(isotherm.density_in_mol_m3(eta)))?;
        let (f, df) = isotherm.residual(eta)?;
        if f.abs() < tol {
            log_result!(
                verbosity,
                "density iteration: converged in {} step(s) to {:.8e} mol/m³",
                i,
                isotherm.density_in_mol_m3(eta)
            );
            return Ok((eta, i));
        }

        // shrink the bracket
        if f.signum() == f_lo.signum() {
            lo = eta;
        } else {
            hi = eta;
        }

        let mut eta_new = eta - f / df;
        let bisection = !(eta_new > lo && eta_new < hi);
        if bisection {
            eta_new = 0.5 * (lo + hi);
        }
        log_iter!(
            verbosity,
            " {:4} | {:14.8e} | {:18.10e} | {}",
            i,
            f,
            isotherm.density_in_mol_m3(eta),
            bisection
        );

        let delta = eta_new - eta;
        eta = eta_new;
        if delta.abs() < TOL_ETA * eta {
            log_result!(
                verbosity,
                "density iteration: step size converged in {} step(s)",
                i
            );
            return Ok((eta, i));
        }
    }
    log_result!(verbosity, "density iteration: not converged");
    Err(EosError::not_converged(
        "density_iteration",
        max_iter,
        Some(isotherm.density_in_mol_m3(eta)),
    ))
}

/// Find the molar density of a mixture at given temperature, pressure and
/// composition.
///
/// All roots of the pressure isotherm are bracketed by a logarithmic scan of the
/// packing fraction up to [Residual::max_packing_fraction]. The root is selected
/// according to `initialization` and refined with a Newton iteration that falls
/// back to bisection whenever a step leaves the bracket.
pub fn density_iteration<E: Residual>(
    eos: &Arc<E>,
    temperature: Temperature,
    pressure: Pressure,
    molefracs: &Array1<f64>,
    initialization: DensityInitialization,
    options: SolverOptions,
) -> EosResult<DensityRoot> {
    eos.validate_moles(molefracs)?;
    let p = pressure.convert_into(PASCAL);
    if !p.is_finite() || p <= 0.0 {
        return Err(EosError::InvalidState(
            String::from("density iteration"),
            String::from("pressure"),
            p,
        ));
    }
    let molefracs = molefracs / molefracs.sum();
    let isotherm = Isotherm {
        eos,
        temperature,
        pressure,
        molefracs: &molefracs,
        scale: eos.density_from_packing_fraction(temperature, 1.0, &molefracs),
    };

    let brackets = scan(&isotherm, eos.max_packing_fraction(), options.verbosity)?;
    let phase_ambiguous = brackets.len() == 1;
    let geometric_mean = |b: &[(f64, f64); 2]| (b[0].0 * b[1].0).sqrt();

    let (eta, iterations) = match (initialization, brackets.first(), brackets.last()) {
        (_, None, _) | (_, _, None) => {
            return Err(EosError::IterationFailed(String::from("density_iteration")))
        }
        (DensityInitialization::Vapor, Some(b), _) => {
            solve_bracket(&isotherm, *b, geometric_mean(b), options)?
        }
        (DensityInitialization::Liquid, _, Some(b)) => {
            solve_bracket(&isotherm, *b, geometric_mean(b), options)?
        }
        (DensityInitialization::InitialDensity(rho), _, _) => {
            let eta0 = (rho / isotherm.scale).into_value();
            if !eta0.is_finite() || eta0 <= 0.0 {
                return Err(EosError::InvalidState(
                    String::from("density iteration"),
                    String::from("initial density"),
                    rho.convert_into(MOL / METER.powi::<P3>()),
                ));
            }
            let distance = |b: &[(f64, f64); 2]| {
                if eta0 >= b[0].0 && eta0 <= b[1].0 {
                    0.0
                } else {
                    (eta0 / geometric_mean(b)).ln().abs()
                }
            };
            let b = brackets
                .iter()
                .min_by(|b1, b2| distance(b1).total_cmp(&distance(b2)))
                .ok_or_else(|| EosError::IterationFailed(String::from("density_iteration")))?;
            let start = if distance(b) == 0.0 {
                eta0
            } else {
                geometric_mean(b)
            };
            solve_bracket(&isotherm, *b, start, options)?
        }
        (DensityInitialization::None, _, _) => {
            let mut best: Option<(f64, MolarEnergy)> = None;
            let mut iterations = 0;
            for b in brackets.iter() {
                let (eta, i) = solve_bracket(&isotherm, *b, geometric_mean(b), options)?;
                iterations += i;
                let g = isotherm.residual_molar_gibbs_energy(eta)?;
                if best.map_or(true, |(_, g_best)| g < g_best) {
                    best = Some((eta, g));
                }
            }
            let (eta, _) =
                best.ok_or_else(|| EosError::IterationFailed(String::from("density_iteration")))?;
            (eta, iterations)
        }
    };

    Ok(DensityRoot {
        density: isotherm.density(eta),
        phase_ambiguous,
        iterations,
    })
}
