use super::{
    BinaryRecord, Identifier, IdentifierOption, ModelRecord, ParameterError, PureRecord,
};
use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Allowed deviation of a sum of mole fractions from unity.
pub const MOLEFRAC_TOLERANCE: f64 = 1e-6;

fn check_molefrac_sum(context: &str, sum: f64) -> Result<(), ParameterError> {
    if (sum - 1.0).abs() > MOLEFRAC_TOLERANCE || !sum.is_finite() {
        return Err(ParameterError::InvalidParameter(format!(
            "mole fractions of {context} sum to {sum} instead of 1"
        )));
    }
    Ok(())
}

/// Pseudo-component as delivered by the parameter supplier.
///
/// The model parameters are flattened into the same map as the mole fraction
/// and molar mass, i.e. `{"m": 2.85, "sigma": 3.75, "epsilon_k": 235.0,
/// "mole_fraction": 0.3, "molarweight": 115.5}` for PC-SAFT.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PseudoComponentRecord<M> {
    #[serde(flatten)]
    pub model_record: M,
    /// Mole fraction within the group
    pub mole_fraction: f64,
    /// Molar mass in g/mol
    #[serde(alias = "molar_mass")]
    pub molarweight: f64,
}

/// A pure component record together with its mole fraction within a closed group.
#[derive(Debug, Clone)]
pub struct PseudoComponent<M> {
    pub record: PureRecord<M>,
    mole_fraction: f64,
}

impl<M: ModelRecord> PseudoComponent<M> {
    pub fn new(record: PureRecord<M>, mole_fraction: f64) -> Result<Self, ParameterError> {
        record.validate()?;
        if !(mole_fraction > 0.0 && mole_fraction <= 1.0) {
            return Err(ParameterError::InvalidParameter(format!(
                "mole fraction of {} must be in (0, 1], got {mole_fraction}",
                record.identifier
            )));
        }
        Ok(Self {
            record,
            mole_fraction,
        })
    }

    /// Mole fraction within the group.
    pub fn mole_fraction(&self) -> f64 {
        self.mole_fraction
    }
}

/// A closed group of pseudo-components, e.g. the characterized C7+ fraction.
///
/// The group-local mole fractions sum to one.
#[derive(Debug, Clone)]
pub struct ComponentGroup<M> {
    name: String,
    components: Vec<PseudoComponent<M>>,
}

impl<M: ModelRecord> ComponentGroup<M> {
    pub fn new(name: &str, components: Vec<PseudoComponent<M>>) -> Result<Self, ParameterError> {
        if components.is_empty() {
            return Err(ParameterError::InvalidParameter(format!(
                "component group {name} is empty"
            )));
        }
        check_molefrac_sum(
            &format!("group {name}"),
            components.iter().map(|c| c.mole_fraction).sum(),
        )?;
        Ok(Self {
            name: name.to_owned(),
            components,
        })
    }

    /// Ingest the output of the parameter supplier.
    ///
    /// The keys of the map are used as names of the pseudo-components,
    /// their order determines the component order.
    pub fn from_map(
        name: &str,
        records: IndexMap<String, PseudoComponentRecord<M>>,
    ) -> Result<Self, ParameterError> {
        let components = records
            .into_iter()
            .map(|(id, r)| {
                let identifier = Identifier::from_name(&id);
                let record = PureRecord::new(identifier, r.molarweight, r.model_record)?;
                PseudoComponent::new(record, r.mole_fraction)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, components)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[PseudoComponent<M>] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Group-local mole fractions.
    pub fn molefracs(&self) -> Array1<f64> {
        self.components.iter().map(|c| c.mole_fraction).collect()
    }
}

/// Validated, immutable component parameters of a mixture together with
/// the overall composition.
#[derive(Debug, Clone)]
pub struct ParameterSet<M, B> {
    pure_records: Vec<PureRecord<M>>,
    binary_records: Vec<BinaryRecord<Identifier, B>>,
    molefracs: Array1<f64>,
}

impl<M: ModelRecord, B: Clone> ParameterSet<M, B> {
    /// Create a parameter set for an arbitrary mixture of components.
    ///
    /// Every record is validated and the overall mole fractions need to
    /// be non-negative and sum to one.
    pub fn new(
        pure_records: Vec<PureRecord<M>>,
        molefracs: Array1<f64>,
        binary_records: Vec<BinaryRecord<Identifier, B>>,
    ) -> Result<Self, ParameterError> {
        if pure_records.is_empty() {
            return Err(ParameterError::InvalidParameter(
                "a mixture needs at least one component".into(),
            ));
        }
        if pure_records.len() != molefracs.len() {
            return Err(ParameterError::IncompatibleParameters(format!(
                "{} records but {} mole fractions",
                pure_records.len(),
                molefracs.len()
            )));
        }
        for r in pure_records.iter() {
            r.validate()?;
        }
        if let Some(x) = molefracs.iter().find(|&&x| !(0.0..=1.0).contains(&x)) {
            return Err(ParameterError::InvalidParameter(format!(
                "overall mole fraction {x} is outside of [0, 1]"
            )));
        }
        check_molefrac_sum("the mixture", molefracs.sum())?;
        Ok(Self {
            pure_records,
            binary_records,
            molefracs,
        })
    }

    /// Parameter set of a single closed group. The overall composition
    /// equals the group-local composition.
    pub fn from_group(
        group: ComponentGroup<M>,
        binary_records: Vec<BinaryRecord<Identifier, B>>,
    ) -> Result<Self, ParameterError> {
        Self::from_groups(vec![(group, 1.0)], binary_records)
    }

    /// Combine several closed groups with the given overall group fractions.
    pub fn from_groups(
        groups: Vec<(ComponentGroup<M>, f64)>,
        binary_records: Vec<BinaryRecord<Identifier, B>>,
    ) -> Result<Self, ParameterError> {
        let mut pure_records = Vec::new();
        let mut molefracs = Vec::new();
        for (group, fraction) in groups {
            for c in group.components {
                molefracs.push(c.mole_fraction * fraction);
                pure_records.push(c.record);
            }
        }
        Self::new(pure_records, Array1::from_vec(molefracs), binary_records)
    }

    /// A new parameter set with identical components and a different composition.
    pub fn with_molefracs(&self, molefracs: Array1<f64>) -> Result<Self, ParameterError> {
        Self::new(
            self.pure_records.clone(),
            molefracs,
            self.binary_records.clone(),
        )
    }

    pub fn components(&self) -> usize {
        self.pure_records.len()
    }

    pub fn pure_records(&self) -> &[PureRecord<M>] {
        &self.pure_records
    }

    pub fn binary_records(&self) -> &[BinaryRecord<Identifier, B>] {
        &self.binary_records
    }

    /// Overall mole fractions aligned with the component order.
    pub fn molefracs(&self) -> &Array1<f64> {
        &self.molefracs
    }

    /// Arrange the binary records in a matrix aligned with the component order.
    ///
    /// Entries are `None` where no record was specified for the pair. Returns
    /// `None` if no binary records exist at all.
    pub fn binary_matrix(
        &self,
        identifier_option: IdentifierOption,
    ) -> Result<Option<Array2<Option<B>>>, ParameterError> {
        if self.binary_records.is_empty() {
            return Ok(None);
        }
        let binary_map: HashMap<(String, String), &B> = self
            .binary_records
            .iter()
            .filter_map(|br| {
                let id1 = br.id1.as_string(identifier_option)?;
                let id2 = br.id2.as_string(identifier_option)?;
                Some(((id1, id2), &br.model_record))
            })
            .collect();
        let ids = self
            .pure_records
            .iter()
            .map(|r| {
                r.identifier.as_string(identifier_option).ok_or_else(|| {
                    ParameterError::IdentifierNotFound(format!("{:?}", identifier_option))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let n = ids.len();
        Ok(Some(Array2::from_shape_fn([n, n], |(i, j)| {
            binary_map
                .get(&(ids[i].clone(), ids[j].clone()))
                .or_else(|| binary_map.get(&(ids[j].clone(), ids[i].clone())))
                .map(|&b| b.clone())
        })))
    }
}
