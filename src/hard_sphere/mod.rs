//! Hard-sphere reference fluid of chain molecules.
use ndarray::{Array1, Zip};
use num_dual::DualNum;
use petrosaft_core::{EosError, EosResult, HelmholtzEnergyDual, StateHD};
use std::f64::consts::{FRAC_PI_6, PI};
use std::fmt;
use std::sync::Arc;

/// Segment numbers and temperature dependent segment diameters of a
/// homosegmented chain model.
pub trait HardSphereProperties {
    /// Segment number $m_i$ of every component.
    fn segment_number(&self) -> &Array1<f64>;

    /// Temperature dependent segment diameter $d_i$ of every component.
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D>;

    /// Moments $\zeta_k=\frac{\pi}{6}\sum_i\rho_im_id_i^k$ for the requested `k`.
    fn zeta<D: DualNum<f64> + Copy, const N: usize>(
        &self,
        temperature: D,
        partial_density: &Array1<D>,
        k: [i32; N],
    ) -> [D; N] {
        let m = self.segment_number();
        let d = self.hs_diameter(temperature);
        k.map(|k| {
            Zip::from(partial_density)
                .and(m)
                .and(&d)
                .fold(D::zero(), |acc, &rho, &m, &d| acc + rho * m * d.powi(k))
                * FRAC_PI_6
        })
    }

    /// $\zeta_2/\zeta_3$ from the mole fractions, finite in the limit of zero density.
    fn zeta_23<D: DualNum<f64> + Copy>(&self, temperature: D, molefracs: &Array1<D>) -> D {
        let [zeta2, zeta3] = self.zeta(temperature, molefracs, [2, 3]);
        zeta2 / zeta3
    }
}

/// Return the packing fraction if it lies strictly between 0 and 1.
pub fn check_packing_fraction<D: DualNum<f64> + Copy>(eta: D) -> EosResult<D> {
    let re = eta.re();
    if re > 0.0 && re < 1.0 {
        Ok(eta)
    } else {
        Err(EosError::out_of_domain("packing fraction", re))
    }
}

/// Contact value of the hard-sphere pair correlation function at
/// $\bar d_{ij}=\frac{d_id_j}{d_i+d_j}$, where `void` is $\frac{1}{1-\zeta_3}$.
pub fn contact_value<D: DualNum<f64> + Copy>(zeta2: D, void: D, d_ij: D) -> D {
    let x = zeta2 * void * d_ij;
    void * (x * 3.0 + x.powi(2) * 2.0 + 1.0)
}

/// BMCSL hard-sphere mixture ([Boublík, 1970](https://doi.org/10.1063/1.1673824),
/// [Mansoori et al., 1971](https://doi.org/10.1063/1.1675048)) applied to the
/// segments of the chains:
/// $$\frac{\beta A}{V}=\frac{6}{\pi}\left(\frac{3\zeta_1\zeta_2}{1-\zeta_3}+\frac{\zeta_2^3}{\zeta_3\left(1-\zeta_3\right)^2}+\left(\frac{\zeta_2^3}{\zeta_3^2}-\zeta_0\right)\ln\left(1-\zeta_3\right)\right)$$
pub struct HardSphere<P> {
    parameters: Arc<P>,
}

impl<P> HardSphere<P> {
    pub fn new(parameters: &Arc<P>) -> Self {
        Self {
            parameters: Arc::clone(parameters),
        }
    }
}

impl<D: DualNum<f64> + Copy, P: HardSphereProperties> HelmholtzEnergyDual<D> for HardSphere<P> {
    fn helmholtz_energy(&self, state: &StateHD<D>) -> EosResult<D> {
        let t = state.temperature;
        let [zeta0, zeta1, zeta2, zeta3] =
            self.parameters.zeta(t, &state.partial_density, [0, 1, 2, 3]);
        let eta = check_packing_fraction(zeta3)?;
        // 1 / (1 - eta)
        let void = (-eta + 1.0).recip();
        let ratio = self.parameters.zeta_23(t, &state.molefracs);
        let phi = zeta1 * zeta2 * void * 3.0
            + (zeta2 * void).powi(2) * ratio
            + (zeta2 * ratio.powi(2) - zeta0) * (-eta).ln_1p();
        Ok(phi * state.volume * 6.0 / PI)
    }
}

impl<P> fmt::Display for HardSphere<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hard Sphere")
    }
}
