use super::identifier::Identifier;
use super::ParameterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical validation of a model record.
///
/// Implemented by every pure component record so that malformed
/// supplier output is rejected before any equation of state is evaluated.
pub trait ModelRecord: Clone {
    fn validate(&self) -> Result<(), ParameterError>;
}

/// Return an error if `value` is not a finite, strictly positive number.
pub fn check_positive(name: &str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

/// A collection of parameters of a pure substance or pseudo-component.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PureRecord<M> {
    pub identifier: Identifier,
    /// Molar mass in g/mol
    pub molarweight: f64,
    pub model_record: M,
}

impl<M: ModelRecord> PureRecord<M> {
    /// Create a new `PureRecord`.
    ///
    /// Fails if the molar mass is not positive or the model record
    /// violates its physical bounds.
    pub fn new(
        identifier: Identifier,
        molarweight: f64,
        model_record: M,
    ) -> Result<Self, ParameterError> {
        let record = Self {
            identifier,
            molarweight,
            model_record,
        };
        record.validate()?;
        Ok(record)
    }

    /// Validate records that were created without [PureRecord::new], e.g. by deserialization.
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_positive(&format!("molar mass of {}", self.identifier), self.molarweight)?;
        self.model_record.validate().map_err(|e| match e {
            ParameterError::InvalidParameter(msg) => {
                ParameterError::InvalidParameter(format!("{}: {msg}", self.identifier))
            }
            e => e,
        })
    }
}

impl<M: fmt::Display> fmt::Display for PureRecord<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PureRecord({}, molarweight={} g/mol, {})",
            self.identifier, self.molarweight, self.model_record
        )
    }
}

/// Interaction parameters of a pair of components.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BinaryRecord<I, B> {
    /// Identifier of the first component
    pub id1: I,
    /// Identifier of the second component
    pub id2: I,
    /// Binary interaction parameter(s)
    pub model_record: B,
}

impl<I, B> BinaryRecord<I, B> {
    pub fn new(id1: I, id2: I, model_record: B) -> Self {
        Self {
            id1,
            id2,
            model_record,
        }
    }
}

impl<I: fmt::Display, B: fmt::Display> fmt::Display for BinaryRecord<I, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryRecord({} | {}: {})", self.id1, self.id2, self.model_record)
    }
}
