use super::PcSaftParameters;
use crate::hard_sphere::{check_packing_fraction, contact_value, HardSphereProperties};
use ndarray::Zip;
use num_dual::*;
use petrosaft_core::{EosResult, HelmholtzEnergyDual, StateHD};
use std::fmt;
use std::sync::Arc;

/// Chain formation from tangent hard spheres,
/// $\frac{\beta A}{V}=\sum_i\rho_i(1-m_i)\ln g_{ii}^\mathrm{hs}(d_i)$.
pub struct HardChain {
    pub parameters: Arc<PcSaftParameters>,
}

impl<D: DualNum<f64> + Copy> HelmholtzEnergyDual<D> for HardChain {
    fn helmholtz_energy(&self, state: &StateHD<D>) -> EosResult<D> {
        let p = &self.parameters;
        let t = state.temperature;
        let [zeta2, zeta3] = p.zeta(t, &state.partial_density, [2, 3]);
        let void = (-check_packing_fraction(zeta3)? + 1.0).recip();
        let a = Zip::from(&state.partial_density)
            .and(&p.m)
            .and(&p.hs_diameter(t))
            .fold(D::zero(), |acc, &rho, &m, &d| {
                acc - rho * (m - 1.0) * contact_value(zeta2, void, d * 0.5).ln()
            });
        Ok(a * state.volume)
    }
}

impl fmt::Display for HardChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hard Chain")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcsaft::parameters::utils::{
        butane_parameters, propane_butane_parameters, propane_parameters,
    };
    use approx::assert_relative_eq;
    use ndarray::arr1;
    use petrosaft_core::EosError;

    fn hard_chain(parameters: Arc<PcSaftParameters>) -> HardChain {
        HardChain { parameters }
    }

    #[test]
    fn helmholtz_energy() {
        let s = StateHD::new(250.0, 1000.0, arr1(&[1.0]));
        let a = hard_chain(propane_parameters()).helmholtz_energy(&s).unwrap();
        assert_relative_eq!(a, -0.12402626171926148, epsilon = 1e-10);
    }

    #[test]
    fn pure_limit_of_mixture() {
        let mixture = hard_chain(propane_butane_parameters());
        let pures = [propane_parameters(), butane_parameters()];
        let (t, v) = (250.0, 2.5e28);
        for (i, pure) in pures.into_iter().enumerate() {
            let mut n = arr1(&[0.0, 0.0]);
            n[i] = 1.0;
            let a_pure = hard_chain(pure)
                .helmholtz_energy(&StateHD::new(t, v, arr1(&[1.0])))
                .unwrap();
            let a_mix = mixture.helmholtz_energy(&StateHD::new(t, v, n)).unwrap();
            assert_relative_eq!(a_pure, a_mix, epsilon = 1e-14);
        }
    }

    #[test]
    fn out_of_domain() {
        // eta > 1
        let s = StateHD::new(250.0, 10.0, arr1(&[1.0]));
        assert!(matches!(
            hard_chain(propane_parameters()).helmholtz_energy(&s),
            Err(EosError::OutOfDomain { .. })
        ));
    }
}
