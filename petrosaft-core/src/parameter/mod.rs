//! Structures and traits that can be used to build model parameters for equations of state.
//!
//! Parameters enter the engine in two steps: the supplier output is validated
//! into a [ParameterSet] (records plus overall composition), which is then
//! turned into the arrays of a specific model via [Parameter::from_parameter_set].
use ndarray::Array2;
use thiserror::Error;

mod identifier;
mod model_record;
mod parameter_set;

pub use identifier::{Identifier, IdentifierOption};
pub use model_record::{check_positive, BinaryRecord, ModelRecord, PureRecord};
pub use parameter_set::{
    ComponentGroup, ParameterSet, PseudoComponent, PseudoComponentRecord, MOLEFRAC_TOLERANCE,
};

/// Constructor methods for parameters.
///
/// By implementing `Parameter` for a type, you define how parameters
/// of an equation of state can be constructed from a sequence of
/// pure component records and possibly binary interaction parameters.
pub trait Parameter
where
    Self: Sized,
{
    type Pure: ModelRecord;
    type Binary: Clone;

    /// Creates parameters from records for pure substances and possibly binary parameters.
    ///
    /// Entries of the binary matrix are `None` for pairs without a record.
    fn from_records(
        pure_records: Vec<PureRecord<Self::Pure>>,
        binary_records: Option<Array2<Option<Self::Binary>>>,
    ) -> Result<Self, ParameterError>;

    /// Creates parameters for a pure component from a pure record.
    fn new_pure(pure_record: PureRecord<Self::Pure>) -> Result<Self, ParameterError> {
        Self::from_records(vec![pure_record], None)
    }

    /// Creates parameters for a binary system from pure records and an optional
    /// binary interaction parameter.
    fn new_binary(
        pure_records: Vec<PureRecord<Self::Pure>>,
        binary_record: Option<Self::Binary>,
    ) -> Result<Self, ParameterError> {
        let binary_record = binary_record.map(|br| {
            Array2::from_shape_fn([2, 2], |(i, j)| (i != j).then(|| br.clone()))
        });
        Self::from_records(pure_records, binary_record)
    }

    /// Creates parameters from a validated [ParameterSet].
    fn from_parameter_set(
        parameter_set: &ParameterSet<Self::Pure, Self::Binary>,
        identifier_option: IdentifierOption,
    ) -> Result<Self, ParameterError> {
        let binary_records = parameter_set.binary_matrix(identifier_option)?;
        Self::from_records(parameter_set.pure_records().to_vec(), binary_records)
    }

    /// Return the original pure and binary records that were used to construct the parameters.
    #[allow(clippy::type_complexity)]
    fn records(&self) -> (&[PureRecord<Self::Pure>], Option<&Array2<Option<Self::Binary>>>);
}

/// Error type for incomplete parameter information and malformed parameters.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("{0}")]
    InvalidParameter(String),
    #[error("The identifier '{0}' is not available for all components.")]
    IdentifierNotFound(String),
    #[error("Incompatible parameters: {0}")]
    IncompatibleParameters(String),
}
