use super::MixingRules;
use crate::hard_sphere::{check_packing_fraction, HardSphereProperties};
use num_dual::DualNum;
use petrosaft_core::{EosResult, HelmholtzEnergyDual, StateHD};
use std::f64::consts::{FRAC_PI_6, PI};
use std::fmt;
use std::sync::Arc;

// Universal constants of the power series in the packing fraction
// (Gross and Sadowski, 2001).
pub const A0: [f64; 7] = [
    0.91056314451539,
    0.63612814494991,
    2.68613478913903,
    -26.5473624914884,
    97.7592087835073,
    -159.591540865600,
    91.2977740839123,
];
pub const A1: [f64; 7] = [
    -0.30840169182720,
    0.18605311591713,
    -2.50300472586548,
    21.4197936296668,
    -65.2558853303492,
    83.3186804808856,
    -33.7469229297323,
];
pub const A2: [f64; 7] = [
    -0.09061483509767,
    0.45278428063920,
    0.59627007280101,
    -1.72418291311787,
    -4.13021125311661,
    13.7766318697211,
    -8.67284703679646,
];
pub const B0: [f64; 7] = [
    0.72409469413165,
    2.23827918609380,
    -4.00258494846342,
    -21.00357681484648,
    26.8556413626615,
    206.5513384066188,
    -355.60235612207947,
];
pub const B1: [f64; 7] = [
    -0.57554980753450,
    0.69950955214436,
    3.89256733895307,
    -17.21547164777212,
    192.6722644652495,
    -161.8264616487648,
    -165.2076934555607,
];
pub const B2: [f64; 7] = [
    0.09768831158356,
    -0.25575749816100,
    -9.15585615297321,
    20.64207597439724,
    -38.80443005206285,
    93.6267740770146,
    -29.66690558514725,
];

/// Power series $\sum_k\left(a_{0k}+\frac{m-1}{m}a_{1k}+\frac{m-1}{m}\frac{m-2}{m}a_{2k}\right)\eta^k$
/// for the integrals $I_1$ and $I_2$.
fn integral<D: DualNum<f64> + Copy>(a: [&[f64; 7]; 3], m: D, eta: D) -> D {
    let m1 = (m - 1.0) / m;
    let m2 = m1 * (m - 2.0) / m;
    (0..7).rev().fold(D::zero(), |acc, k| {
        acc * eta + m2 * a[2][k] + m1 * a[1][k] + a[0][k]
    })
}

/// Compressibility term $C_1$ of the hard-chain reference.
fn c1<D: DualNum<f64> + Copy>(m: D, eta: D) -> D {
    let eta2 = eta * eta;
    let chain = (eta * 8.0 - eta2 * 2.0) / (eta - 1.0).powi(4);
    let mix = (eta * 20.0 - eta2 * 27.0 + eta2 * eta * 12.0 - eta2 * eta2 * 2.0)
        / ((eta - 1.0) * (eta - 2.0)).powi(2);
    (m * chain - (m - 1.0) * mix + 1.0).recip()
}

/// Second order perturbation by the attraction between the segments
/// (Gross and Sadowski, 2001).
pub struct Dispersion {
    pub mixing_rules: Arc<MixingRules>,
}

impl<D: DualNum<f64> + Copy> HelmholtzEnergyDual<D> for Dispersion {
    fn helmholtz_energy(&self, state: &StateHD<D>) -> EosResult<D> {
        let mix = &self.mixing_rules;
        let p = mix.parameters();
        let t = state.temperature;
        let rho = &state.partial_density;
        let m = mix.mean_segment_number(&state.molefracs);

        let d = p.hs_diameter(t);
        let eta = check_packing_fraction((rho * &p.m * &d * &d * &d).sum() * FRAC_PI_6)?;

        // double sums over all segment pairs
        let mut m2es3 = D::zero();
        let mut m2e2s3 = D::zero();
        for i in 0..p.m.len() {
            for j in 0..p.m.len() {
                let e = t.recip() * mix.epsilon_k_ij(i, j);
                let x = rho[i] * rho[j] * (p.m[i] * p.m[j] * mix.sigma_ij(i, j).powi(3));
                m2es3 += x * e;
                m2e2s3 += x * e * e;
            }
        }

        let i1 = integral([&A0, &A1, &A2], m, eta);
        let i2 = integral([&B0, &B1, &B2], m, eta);
        Ok(-(m2es3 * i1 * 2.0 + m2e2s3 * m * c1(m, eta) * i2) * PI * state.volume)
    }
}

impl fmt::Display for Dispersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispersion")
    }
}
