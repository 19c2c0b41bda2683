#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! PC-SAFT equation of state for heavy petroleum fractions.
//!
//! The generic machinery (states, density iteration, flash) is re-exported from
//! `petrosaft-core`; this crate adds the model: parameters, mixing rules and the
//! hard-sphere, hard-chain, dispersion and association contributions.

pub mod association;
pub mod hard_sphere;
pub mod pcsaft;

pub use petrosaft_core::*;
