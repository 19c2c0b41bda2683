use super::{Derivative::*, State, StateHD};
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::si::*;
use ndarray::{Array1, Array2};
use num_dual::*;
use serde::Serialize;
use typenum::P3;

/// Properties of a single phase state.
#[derive(Clone, Debug, Serialize)]
pub struct StateProperties {
    /// Temperature in K
    pub temperature: f64,
    /// Molar density in mol/m³
    pub density: f64,
    /// Pressure in Pa
    pub pressure: f64,
    /// Compressibility factor
    pub compressibility: f64,
    /// Logarithms of the fugacity coefficients
    pub ln_phi: Array1<f64>,
    /// Residual chemical potentials in J/mol
    pub residual_chemical_potential: Array1<f64>,
    /// Mass density in kg/m³
    pub mass_density: f64,
}

/// Contribution of a single Helmholtz energy term to the compressibility
/// factor and its first partial derivatives at constant temperature.
#[derive(Clone, Debug, Serialize)]
pub struct TermContribution {
    pub name: String,
    /// Reduced residual Helmholtz energy per molecule $\beta A/N$
    pub helmholtz_energy: f64,
    /// Contribution to the compressibility factor
    pub compressibility: f64,
    /// Derivative w.r.t. the molar density in m³/mol at constant composition
    pub dz_drho: f64,
    /// Derivatives $\left(\frac{\partial Z}{\partial N_i}\right)_{T,\rho}$ for one molecule
    /// of mixture, i.e. $\sum_j\frac{\partial Z}{\partial x_j}\left(\delta_{ij}-x_j\right)$
    pub dz_dx: Array1<f64>,
}

fn check_compressibility(z: f64) -> EosResult<f64> {
    if z > 0.0 {
        Ok(z)
    } else {
        Err(EosError::out_of_domain("compressibility", z))
    }
}

/// # State properties
impl<E: Residual> State<E> {
    fn reduced_total_moles(&self) -> f64 {
        self.reduced_moles.sum()
    }

    /// Residual Helmholtz energy $A^\text{res}$ of the system.
    pub fn residual_helmholtz_energy(&self) -> EosResult<Energy> {
        let a = self.eos.evaluate_residual(&self.reduced_state())?;
        Ok(Energy::from_reduced(a * self.reduced_temperature))
    }

    /// Pressure: $p=-\left(\frac{\partial A}{\partial V}\right)_{T,N_i}$
    pub fn pressure(&self) -> EosResult<Pressure> {
        let a = self.derive1(DV)?;
        let p = self.reduced_total_moles() / self.reduced_volume - a.eps;
        Ok(Pressure::from_reduced(p * self.reduced_temperature))
    }

    /// Compressibility factor: $Z=\frac{pV}{NRT}$
    pub fn compressibility(&self) -> EosResult<f64> {
        let a = self.derive1(DV)?;
        Ok(1.0 - self.reduced_volume * a.eps / self.reduced_total_moles())
    }

    /// Residual chemical potential: $\mu_i^\text{res}=\left(\frac{\partial A^\text{res}}{\partial N_i}\right)_{T,V,N_j}$
    pub fn residual_chemical_potential(&self) -> EosResult<MolarEnergy<Array1<f64>>> {
        let mu = (0..self.eos.components())
            .map(|i| Ok(self.derive1(DN(i))?.eps * self.reduced_temperature))
            .collect::<EosResult<Array1<f64>>>()?;
        Ok(MolarEnergy::from_reduced(mu))
    }

    /// Logarithm of the fugacity coefficient: $\ln\varphi_i=\beta\mu_i^\mathrm{res}\left(T,p,\lbrace N_i\rbrace\right)-\ln Z$
    ///
    /// Defined for $Z>0$ only. States with a non-positive pressure yield
    /// [EosError::OutOfDomain].
    pub fn ln_phi(&self) -> EosResult<Array1<f64>> {
        let z = check_compressibility(self.compressibility()?)?;
        let rt = RGAS * self.temperature;
        Ok((self.residual_chemical_potential()? / rt).into_value() - z.ln())
    }

    /// Pressure and its derivative w.r.t. the molar density.
    pub(crate) fn p_dpdrho(&self) -> EosResult<(Pressure, PressurePerDensity)> {
        let a = self.derive2(DV)?;
        let t = self.reduced_temperature;
        let n = self.reduced_total_moles();
        let v = self.reduced_volume;
        let p = t * (n / v - a.v1);
        let dp_dv = t * (-n / (v * v) - a.v2);
        Ok((
            Pressure::from_reduced(p),
            PressurePerDensity::from_reduced(-v * v / n * dp_dv),
        ))
    }

    /// Partial derivative of pressure w.r.t. volume: $\left(\frac{\partial p}{\partial V}\right)_{T,N_i}$
    pub fn dp_dv(&self) -> EosResult<PressurePerVolume> {
        let a = self.derive2(DV)?;
        let n = self.reduced_total_moles();
        let v = self.reduced_volume;
        Ok(PressurePerVolume::from_reduced(
            self.reduced_temperature * (-n / (v * v) - a.v2),
        ))
    }

    /// Partial derivative of pressure w.r.t. density: $\left(\frac{\partial p}{\partial \rho}\right)_{T,N_i}$
    pub fn dp_drho(&self) -> EosResult<PressurePerDensity> {
        Ok(self.p_dpdrho()?.1)
    }

    /// Partial derivative of pressure w.r.t. moles: $\left(\frac{\partial p}{\partial N_i}\right)_{T,V,N_j}$
    pub fn dp_dni(&self) -> EosResult<PressurePerMoles<Array1<f64>>> {
        let dp = (0..self.eos.components())
            .map(|i| {
                let a = self.derive2_mixed(DV, DN(i))?;
                Ok(self.reduced_temperature * (1.0 / self.reduced_volume - a.eps1eps2))
            })
            .collect::<EosResult<Array1<f64>>>()?;
        Ok(PressurePerMoles::from_reduced(dp))
    }

    /// Partial derivative of chemical potential w.r.t. moles: $\left(\frac{\partial\mu_i}{\partial N_j}\right)_{T,V,N_k}$
    pub fn dmu_res_dni(&self) -> EosResult<MolarEnergyPerMoles<Array2<f64>>> {
        let n = self.eos.components();
        let mut dmu = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let a = self.derive2_mixed(DN(i), DN(j))?;
                dmu[[i, j]] = a.eps1eps2 * self.reduced_temperature;
                dmu[[j, i]] = dmu[[i, j]];
            }
        }
        Ok(MolarEnergyPerMoles::from_reduced(dmu))
    }

    /// Partial derivative of the logarithm of the fugacity coefficient w.r.t. moles: $\left(\frac{\partial\ln\varphi_i}{\partial N_j}\right)_{T,p,N_k}$
    pub fn dln_phi_dnj(&self) -> EosResult<InverseMoles<Array2<f64>>> {
        let t = self.reduced_temperature;
        let dp_dn = self.dp_dni()?.to_reduced();
        let dp_dv = self.dp_dv()?.to_reduced();
        let mut dln_phi = self.dmu_res_dni()?.to_reduced() / t;
        let n = self.eos.components();
        for i in 0..n {
            for j in 0..n {
                dln_phi[[i, j]] +=
                    1.0 / self.reduced_total_moles() + dp_dn[i] * dp_dn[j] / (t * dp_dv);
            }
        }
        Ok(InverseMoles::from_reduced(dln_phi))
    }

    /// Residual molar Gibbs energy: $g^\text{res}(T,p,\mathbf{x})=\frac{A^\text{res}+pV}{N}-RT-RT\ln Z$
    pub fn residual_molar_gibbs_energy(&self) -> EosResult<MolarEnergy> {
        let a = self.derive1(DV)?;
        let n = self.reduced_total_moles();
        let z = check_compressibility(1.0 - self.reduced_volume * a.eps / n)?;
        Ok(MolarEnergy::from_reduced(
            self.reduced_temperature * (a.re / n + z - 1.0 - z.ln()),
        ))
    }

    /// Molar mass of the mixture.
    pub fn total_molar_weight(&self) -> MolarWeight {
        let mw = self.eos.molar_weight().convert_into(GRAM / MOL);
        (&self.molefracs * &mw).sum() * (GRAM / MOL)
    }

    /// Mass density $\rho_m=\rho\sum_ix_iM_i$.
    pub fn mass_density(&self) -> MassDensity {
        self.density * self.total_molar_weight()
    }

    /// Evaluate all single phase properties of the state at once.
    pub fn properties(&self) -> EosResult<StateProperties> {
        let m3 = METER.powi::<P3>();
        Ok(StateProperties {
            temperature: self.temperature.convert_into(KELVIN),
            density: self.density.convert_into(MOL / m3),
            pressure: self.pressure()?.convert_into(PASCAL),
            compressibility: self.compressibility()?,
            ln_phi: self.ln_phi()?,
            residual_chemical_potential: self
                .residual_chemical_potential()?
                .convert_into(JOULE / MOL),
            mass_density: self.mass_density().convert_into(KILOGRAM / m3),
        })
    }

    /// Contributions of the individual Helmholtz energy terms to the
    /// compressibility factor and its first derivatives.
    pub fn residual_contributions(&self) -> EosResult<Vec<TermContribution>> {
        let n = self.reduced_total_moles();
        let v = self.reduced_volume;
        let t = self.reduced_temperature;

        // volume derivatives at constant moles
        let state = StateHD::new(
            Dual2_64::from(t),
            Dual2_64::from(v).derivative(),
            self.reduced_moles.mapv(Dual2_64::from),
        );
        let a = self.eos.evaluate_residual_contributions(&state)?;

        // amount derivatives at constant density for one molecule
        let rho = n / v;
        let ncomp = self.eos.components();
        let mut dz_dx = vec![Array1::zeros(ncomp); a.len()];
        for i in 0..ncomp {
            let mut volume = HyperDual64::from(rho.recip());
            volume.eps1 = 1.0;
            volume.eps2 = rho.recip();
            let mut moles = self.molefracs.mapv(HyperDual64::from);
            moles[i].eps2 = 1.0;
            let state = StateHD::new(HyperDual64::from(t), volume, moles);
            for (k, (_, a)) in self
                .eos
                .evaluate_residual_contributions(&state)?
                .into_iter()
                .enumerate()
            {
                dz_dx[k][i] = -a.eps1eps2 / rho;
            }
        }

        let molar_volume = METER.powi::<P3>() / MOL;
        Ok(a.into_iter()
            .zip(dz_dx)
            .map(|((name, a), dz_dx)| TermContribution {
                name,
                helmholtz_energy: a.re / n,
                compressibility: -v * a.v1 / n,
                dz_drho: MolarVolume::from_reduced((a.v1 + v * a.v2) * v * v / (n * n))
                    .convert_into(molar_volume),
                dz_dx,
            })
            .collect())
    }
}
