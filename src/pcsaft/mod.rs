//! Perturbed-Chain Statistical Associating Fluid Theory (PC-SAFT)
//!
//! [Gross et al. (2001)](https://doi.org/10.1021/ie0003887)
mod eos;
mod mixing_rules;
pub(crate) mod parameters;

pub use eos::{PcSaft, PcSaftOptions};
pub use mixing_rules::{BinaryInteractionPolicy, MixingRules};
pub use parameters::{c7plus_default, PcSaftBinaryRecord, PcSaftParameters, PcSaftRecord};
