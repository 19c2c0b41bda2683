use crate::parameter::ParameterError;
use num_dual::linalg::LinAlgError;
use thiserror::Error;

/// Error type for invalid input, unphysical states and convergence problems.
#[derive(Error, Debug)]
pub enum EosError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{quantity} = {value} is outside of the physical domain.")]
    OutOfDomain { quantity: String, value: f64 },
    #[error("`{solver}` did not converge within {iterations} iteration(s) (last estimate: {estimate:?}).")]
    NotConverged {
        solver: String,
        iterations: usize,
        estimate: Option<f64>,
    },
    #[error("`{0}` encountered illegal values during the iteration.")]
    IterationFailed(String),
    #[error("Iteration resulted in trivial solution.")]
    TrivialSolution,
    #[error("Equation of state is initialized for {0} components while the input specifies {1} components.")]
    IncompatibleComponents(usize, usize),
    #[error("Invalid state in {0}: {1} = {2}.")]
    InvalidState(String, String, f64),
    #[error(transparent)]
    ParameterError(ParameterError),
    #[error(transparent)]
    LinAlgError(#[from] LinAlgError),
}

impl EosError {
    pub fn not_converged(solver: &str, iterations: usize, estimate: Option<f64>) -> Self {
        Self::NotConverged {
            solver: solver.to_owned(),
            iterations,
            estimate,
        }
    }

    pub fn out_of_domain(quantity: &str, value: f64) -> Self {
        Self::OutOfDomain {
            quantity: quantity.to_owned(),
            value,
        }
    }
}

impl From<ParameterError> for EosError {
    fn from(e: ParameterError) -> Self {
        match e {
            ParameterError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            e => Self::ParameterError(e),
        }
    }
}

/// Convenience type for `Result<T, EosError>`.
pub type EosResult<T> = Result<T, EosError>;
