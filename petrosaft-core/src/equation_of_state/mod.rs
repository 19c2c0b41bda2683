mod helmholtz_energy;
mod residual;

pub use helmholtz_energy::{HelmholtzEnergy, HelmholtzEnergyDual};
pub use residual::{Residual, MAX_PACKING_FRACTION};
