use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::si::{Pressure, KELVIN, METER, MOL, PASCAL};
use crate::state::State;
use ndarray::Array1;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use typenum::P3;

mod stability_analysis;
mod tp_flash;
pub use tp_flash::{batch_tp_flash, rachford_rice, FlashStep, KValueSeed};

/// Level of detail in the iteration output.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Do not print output.
    #[default]
    None,
    /// Print information about the success of failure of the iteration.
    Result,
    /// Print a detailed outpur for every iteration.
    Iter,
}

/// Options for the various solvers.
///
/// If the values are [None], solver specific default
/// values are used.
#[derive(Copy, Clone, Debug, Default)]
pub struct SolverOptions {
    /// Maximum number of iterations.
    pub max_iter: Option<usize>,
    /// Tolerance.
    pub tol: Option<f64>,
    /// Iteration output indicated by the [Verbosity] enum.
    pub verbosity: Verbosity,
    /// Point in time after which iterations are aborted.
    pub deadline: Option<Instant>,
}

impl From<(Option<usize>, Option<f64>, Option<Verbosity>)> for SolverOptions {
    fn from(options: (Option<usize>, Option<f64>, Option<Verbosity>)) -> Self {
        Self {
            max_iter: options.0,
            tol: options.1,
            verbosity: options.2.unwrap_or(Verbosity::None),
            deadline: None,
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline relative to now.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    pub fn unwrap_or(self, max_iter: usize, tol: f64) -> (usize, f64, Verbosity) {
        (
            self.max_iter.unwrap_or(max_iter),
            self.tol.unwrap_or(tol),
            self.verbosity,
        )
    }

    /// Options for a nested solver: solver specific defaults, no output and
    /// the same deadline.
    pub(crate) fn subsolver(&self) -> Self {
        Self {
            deadline: self.deadline,
            ..Self::default()
        }
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Abort an iteration with [EosError::NotConverged] once the deadline has passed.
    pub fn check_deadline(
        &self,
        solver: &str,
        iterations: usize,
        estimate: Option<f64>,
    ) -> EosResult<()> {
        if self.deadline_passed() {
            log_result!(
                self.verbosity,
                "{}: deadline passed after {} iteration(s)",
                solver,
                iterations
            );
            return Err(EosError::not_converged(solver, iterations, estimate));
        }
        Ok(())
    }
}

/// Label of a phase in a vapor-liquid equilibrium.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Vapor,
    Liquid,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vapor => write!(f, "vapor"),
            Self::Liquid => write!(f, "liquid"),
        }
    }
}

/// Composition, density and amount of a single phase.
#[derive(Clone, Debug, Serialize)]
pub struct PhaseState {
    pub phase: Phase,
    /// Mole fractions
    pub molefracs: Array1<f64>,
    /// Molar density in mol/m³
    pub density: f64,
    /// Molar phase fraction
    pub phase_fraction: f64,
}

/// Serializable summary of a flash calculation.
#[derive(Clone, Debug, Serialize)]
pub struct FlashResult {
    /// Temperature in K
    pub temperature: f64,
    /// Pressure in Pa
    pub pressure: f64,
    pub vapor: PhaseState,
    pub liquid: PhaseState,
    pub k_values: Array1<f64>,
    /// Number of successive substitution steps
    pub iterations: usize,
}

/// A two-phase vapor-liquid equilibrium.
///
/// If the feed is stable, one of the phase fractions is zero and the
/// corresponding state holds the composition of the incipient phase.
/// Then `vapor().molefracs` or `liquid().molefracs` is that composition.
/// The phase fractions satisfy $\beta_V+\beta_L=1$ and the material balance
/// $\beta_V y_i+\beta_L x_i=z_i$ holds for every component.
#[derive(Debug)]
pub struct PhaseEquilibrium<E> {
    states: [State<E>; 2],
    vapor_fraction: f64,
    pressure: Pressure,
    iterations: usize,
}

impl<E> Clone for PhaseEquilibrium<E> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            vapor_fraction: self.vapor_fraction,
            pressure: self.pressure,
            iterations: self.iterations,
        }
    }
}

impl<E: Residual> fmt::Display for PhaseEquilibrium<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "vapor ({:.8}): {}", self.vapor_fraction, self.vapor())?;
        write!(f, "liquid ({:.8}): {}", self.liquid_fraction(), self.liquid())
    }
}

impl<E> PhaseEquilibrium<E> {
    pub(super) fn new(
        vapor: State<E>,
        liquid: State<E>,
        vapor_fraction: f64,
        pressure: Pressure,
        iterations: usize,
    ) -> Self {
        Self {
            states: [vapor, liquid],
            vapor_fraction,
            pressure,
            iterations,
        }
    }

    pub fn vapor(&self) -> &State<E> {
        &self.states[0]
    }

    pub fn liquid(&self) -> &State<E> {
        &self.states[1]
    }

    /// Molar vapor fraction $\beta_V$.
    pub fn vapor_fraction(&self) -> f64 {
        self.vapor_fraction
    }

    /// Molar liquid fraction $\beta_L=1-\beta_V$.
    pub fn liquid_fraction(&self) -> f64 {
        1.0 - self.vapor_fraction
    }

    /// Pressure of the flash.
    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    /// Number of successive substitution steps.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Equilibrium ratios $K_i=\frac{y_i}{x_i}$.
    pub fn k_values(&self) -> Array1<f64> {
        &self.vapor().molefracs / &self.liquid().molefracs
    }

    /// `true` if only a single phase is present.
    pub fn is_single_phase(&self) -> bool {
        self.vapor_fraction <= 0.0 || self.vapor_fraction >= 1.0
    }

    pub fn phase_state(&self, phase: Phase) -> PhaseState {
        let (state, phase_fraction) = match phase {
            Phase::Vapor => (self.vapor(), self.vapor_fraction()),
            Phase::Liquid => (self.liquid(), self.liquid_fraction()),
        };
        PhaseState {
            phase,
            molefracs: state.molefracs.clone(),
            density: state.density.convert_into(MOL / METER.powi::<P3>()),
            phase_fraction,
        }
    }

    pub fn result(&self) -> FlashResult {
        FlashResult {
            temperature: self.vapor().temperature.convert_into(KELVIN),
            pressure: self.pressure.convert_into(PASCAL),
            vapor: self.phase_state(Phase::Vapor),
            liquid: self.phase_state(Phase::Liquid),
            k_values: self.k_values(),
            iterations: self.iterations,
        }
    }
}

const TRIVIAL_REL_DEVIATION: f64 = 1e-5;

/// # Utility functions
impl<E> PhaseEquilibrium<E> {
    /// Check if the two states form a trivial solution
    pub fn is_trivial_solution(state1: &State<E>, state2: &State<E>) -> bool {
        let rho1 = state1.partial_density.to_reduced();
        let rho2 = state2.partial_density.to_reduced();
        rho1.iter()
            .zip(rho2.iter())
            .filter(|(&rho1, _)| rho1 > 0.0)
            .fold(0.0, |acc: f64, (&rho1, &rho2)| {
                (rho2 / rho1 - 1.0).abs().max(acc)
            })
            < TRIVIAL_REL_DEVIATION
    }
}
