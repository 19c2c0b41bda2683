use crate::association::{AssociationParameters, AssociationRecord};
use crate::hard_sphere::HardSphereProperties;
use indexmap::IndexMap;
use ndarray::{Array1, Array2, Zip};
use num_dual::DualNum;
use petrosaft_core::parameter::{
    check_positive, ComponentGroup, ModelRecord, Parameter, ParameterError,
    PseudoComponentRecord, PureRecord,
};
use serde::{Deserialize, Serialize};

/// PC-SAFT pure-component parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PcSaftRecord {
    /// Segment number
    pub m: f64,
    /// Segment diameter in units of Angstrom
    pub sigma: f64,
    /// Energetic parameter in units of Kelvin
    pub epsilon_k: f64,
    /// Association parameters
    #[serde(flatten)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub association_record: Option<AssociationRecord>,
}

impl PcSaftRecord {
    pub fn new(
        m: f64,
        sigma: f64,
        epsilon_k: f64,
        association_record: Option<AssociationRecord>,
    ) -> Self {
        Self {
            m,
            sigma,
            epsilon_k,
            association_record,
        }
    }
}

impl ModelRecord for PcSaftRecord {
    fn validate(&self) -> Result<(), ParameterError> {
        check_positive("m", self.m)?;
        check_positive("sigma", self.sigma)?;
        check_positive("epsilon_k", self.epsilon_k)?;
        if let Some(record) = &self.association_record {
            record.validate()?;
        }
        Ok(())
    }
}

impl std::fmt::Display for PcSaftRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PcSaftRecord(m={}", self.m)?;
        write!(f, ", sigma={}", self.sigma)?;
        write!(f, ", epsilon_k={}", self.epsilon_k)?;
        if let Some(n) = &self.association_record {
            write!(f, ", association_record={}", n)?;
        }
        write!(f, ")")
    }
}

/// PC-SAFT binary interaction parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct PcSaftBinaryRecord {
    /// Correction of the cross energy parameter
    #[serde(default)]
    pub k_ij: f64,
    /// Correction of the cross segment diameter
    #[serde(default)]
    pub l_ij: f64,
}

impl PcSaftBinaryRecord {
    pub fn new(k_ij: Option<f64>, l_ij: Option<f64>) -> Self {
        Self {
            k_ij: k_ij.unwrap_or_default(),
            l_ij: l_ij.unwrap_or_default(),
        }
    }

    fn validate(&self) -> Result<(), ParameterError> {
        if !self.k_ij.is_finite() || self.k_ij >= 1.0 || !self.l_ij.is_finite() || self.l_ij >= 1.0
        {
            return Err(ParameterError::InvalidParameter(format!(
                "binary parameters must be finite and below 1, got {self}"
            )));
        }
        Ok(())
    }
}

impl From<f64> for PcSaftBinaryRecord {
    fn from(k_ij: f64) -> Self {
        Self { k_ij, l_ij: 0.0 }
    }
}

impl std::fmt::Display for PcSaftBinaryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PcSaftBinaryRecord(k_ij={}, l_ij={})", self.k_ij, self.l_ij)
    }
}

/// Parameter set required for the PC-SAFT equation of state.
///
/// Cross parameters are not stored here but evaluated by
/// [MixingRules](super::MixingRules).
#[derive(Debug)]
pub struct PcSaftParameters {
    pub molarweight: Array1<f64>,
    pub m: Array1<f64>,
    pub sigma: Array1<f64>,
    pub epsilon_k: Array1<f64>,
    pub association: AssociationParameters,
    pub pure_records: Vec<PureRecord<PcSaftRecord>>,
    pub binary_records: Option<Array2<Option<PcSaftBinaryRecord>>>,
}

impl Parameter for PcSaftParameters {
    type Pure = PcSaftRecord;
    type Binary = PcSaftBinaryRecord;

    fn from_records(
        pure_records: Vec<PureRecord<Self::Pure>>,
        binary_records: Option<Array2<Option<Self::Binary>>>,
    ) -> Result<Self, ParameterError> {
        let n = pure_records.len();
        if n == 0 {
            return Err(ParameterError::InvalidParameter(
                "at least one pure record is required".into(),
            ));
        }
        for record in &pure_records {
            record.validate()?;
        }
        if let Some(br) = &binary_records {
            if br.dim() != (n, n) {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "binary records of shape {:?} for {n} components",
                    br.dim()
                )));
            }
            br.iter().flatten().try_for_each(PcSaftBinaryRecord::validate)?;
        }

        let column = |f: fn(&PcSaftRecord) -> f64| -> Array1<f64> {
            pure_records.iter().map(|r| f(&r.model_record)).collect()
        };
        let sigma = column(|r| r.sigma);
        let association_records: Vec<_> = pure_records
            .iter()
            .map(|r| r.model_record.association_record)
            .collect();

        Ok(Self {
            molarweight: pure_records.iter().map(|r| r.molarweight).collect(),
            m: column(|r| r.m),
            epsilon_k: column(|r| r.epsilon_k),
            association: AssociationParameters::new(&association_records, &sigma),
            sigma,
            pure_records,
            binary_records,
        })
    }

    fn records(
        &self,
    ) -> (
        &[PureRecord<PcSaftRecord>],
        Option<&Array2<Option<PcSaftBinaryRecord>>>,
    ) {
        (&self.pure_records, self.binary_records.as_ref())
    }
}

impl HardSphereProperties for PcSaftParameters {
    fn segment_number(&self) -> &Array1<f64> {
        &self.m
    }

    /// $d_i=\sigma_i\left(1-0.12\,e^{-3\varepsilon_i/kT}\right)$
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D> {
        let beta = temperature.recip();
        Zip::from(&self.sigma)
            .and(&self.epsilon_k)
            .map_collect(|&sigma, &epsilon_k| {
                (-(beta * (-3.0 * epsilon_k)).exp() * 0.12 + 1.0) * sigma
            })
    }
}

impl PcSaftParameters {
    /// Binary record of the pair `(i, j)`, if one was specified.
    pub fn binary_record(&self, i: usize, j: usize) -> Option<&PcSaftBinaryRecord> {
        self.binary_records
            .as_ref()
            .and_then(|br| br.get((i, j)))
            .and_then(Option::as_ref)
    }

    /// Markdown table of the pure-component parameters.
    pub fn to_markdown(&self) -> String {
        let header = "|component|molarweight|$m$|$\\sigma$|$\\varepsilon$|$\\kappa_{AB}$|$\\varepsilon_{AB}$|$N_A$|$N_B$|\n|-|-|-|-|-|-|-|-|-|";
        let rows = self.pure_records.iter().enumerate().map(|(i, record)| {
            let name = record
                .identifier
                .name
                .clone()
                .unwrap_or_else(|| format!("Component {}", i + 1));
            let r = &record.model_record;
            let assoc = r.association_record.unwrap_or_default();
            format!(
                "|{name}|{}|{}|{}|{}|{}|{}|{}|{}|",
                record.molarweight,
                r.m,
                r.sigma,
                r.epsilon_k,
                assoc.kappa_ab,
                assoc.epsilon_k_ab,
                assoc.na,
                assoc.nb,
            )
        });
        std::iter::once(header.to_owned())
            .chain(rows)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Default characterization of a C7+ fraction as five pseudo-components
/// (name, m, sigma, epsilon_k, mole fraction, molar mass).
const C7PLUS_DEFAULT: [(&str, f64, f64, f64, f64, f64); 5] = [
    ("C7-C9", 2.85, 3.75, 235.0, 0.30, 115.5),
    ("C10-C12", 4.55, 4.05, 255.0, 0.25, 155.5),
    ("C13-C16", 6.85, 4.35, 275.0, 0.20, 200.5),
    ("C17-C22", 9.55, 4.65, 295.0, 0.15, 280.5),
    ("C23+", 13.05, 4.95, 315.0, 0.10, 380.5),
];

/// The default C7+ pseudo-components as a closed group named `C7+`.
pub fn c7plus_default() -> Result<ComponentGroup<PcSaftRecord>, ParameterError> {
    let records: IndexMap<_, _> = C7PLUS_DEFAULT
        .iter()
        .map(|&(name, m, sigma, epsilon_k, mole_fraction, molarweight)| {
            (
                name.to_owned(),
                PseudoComponentRecord {
                    model_record: PcSaftRecord::new(m, sigma, epsilon_k, None),
                    mole_fraction,
                    molarweight,
                },
            )
        })
        .collect();
    ComponentGroup::from_map("C7+", records)
}
