#![warn(clippy::all)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]
//! Generic machinery of the `petrosaft` equation of state engine: Helmholtz
//! energy traits, thermodynamic states, density iteration and flash solvers.

/// Print messages with level `Verbosity::Iter` or higher.
#[macro_export]
macro_rules! log_iter {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= Verbosity::Iter {
            println!($($arg)*);
        }
    }
}

/// Print messages with level `Verbosity::Result` or higher.
#[macro_export]
macro_rules! log_result {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= Verbosity::Result {
            println!($($arg)*);
        }
    }
}

mod density_iteration;
mod equation_of_state;
mod errors;
pub mod parameter;
mod phase_equilibria;
mod state;
pub mod si;

pub use density_iteration::{density_iteration, DensityRoot};
pub use equation_of_state::{HelmholtzEnergy, HelmholtzEnergyDual, Residual, MAX_PACKING_FRACTION};
pub use errors::{EosError, EosResult};
pub use phase_equilibria::{
    batch_tp_flash, rachford_rice, FlashResult, FlashStep, KValueSeed, Phase, PhaseEquilibrium,
    PhaseState, SolverOptions, Verbosity,
};
pub use state::{DensityInitialization, State, StateHD, StateProperties, TermContribution};
