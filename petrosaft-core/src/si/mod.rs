//! Physical quantities with units checked at compile time.
//!
//! Every quantity at the public boundary of the engine (temperatures,
//! pressures, densities, amounts, energies) is a [Quantity] whose unit is a
//! type-level array of the exponents of the SI base units
//! `[s, m, kg, A, K, mol, cd]`. Values are converted with [Quantity::convert_into]
//! or divided by a unit, which yields a [Dimensionless] quantity.
//!
//! Internally, [StateHD](crate::StateHD) works in reduced units: volumes in Å³,
//! amounts as numbers of molecules and energies in units of $k_\mathrm{B}\cdot1\\,\mathrm{K}$.
//! [Quantity::to_reduced] and [Quantity::from_reduced] translate between both.
//!
//! ```
//! # use petrosaft_core::si::*;
//! let p = 5.0 * BAR;
//! assert_eq!(p.convert_into(PASCAL), 5e5);
//! let rho = p / (RGAS * 300.0 * KELVIN);
//! assert!((rho.convert_into(MOL / METER.powi::<typenum::P3>()) - 200.45).abs() < 1e-2);
//! ```
#![allow(clippy::type_complexity)]
use std::marker::PhantomData;
use std::ops::{Div, Mul, Sub};
use typenum::{ATerm, Diff, Integer, Negate, Quot, Sum, TArr, P1, Z0};

mod array;
mod fmt;
mod ops;

pub type SIUnit<T, L, M, I, THETA, N, J> =
    TArr<T, TArr<L, TArr<M, TArr<I, TArr<THETA, TArr<N, TArr<J, ATerm>>>>>>>;

/// Physical quantity with compile-time checked unit.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Quantity<T, U>(T, PhantomData<U>);

pub type _Dimensionless = SIUnit<Z0, Z0, Z0, Z0, Z0, Z0, Z0>;
pub type _Time = SIUnit<P1, Z0, Z0, Z0, Z0, Z0, Z0>;
pub type _Length = SIUnit<Z0, P1, Z0, Z0, Z0, Z0, Z0>;
pub type _Mass = SIUnit<Z0, Z0, P1, Z0, Z0, Z0, Z0>;
pub type _Temperature = SIUnit<Z0, Z0, Z0, Z0, P1, Z0, Z0>;
pub type _Moles = SIUnit<Z0, Z0, Z0, Z0, Z0, P1, Z0>;

pub type Dimensionless<T = f64> = Quantity<T, _Dimensionless>;
pub type Time<T = f64> = Quantity<T, _Time>;
pub type Length<T = f64> = Quantity<T, _Length>;
pub type Mass<T = f64> = Quantity<T, _Mass>;
pub type Temperature<T = f64> = Quantity<T, _Temperature>;
pub type Moles<T = f64> = Quantity<T, _Moles>;

pub type _Area = Sum<_Length, _Length>;
pub type _Volume = Sum<_Area, _Length>;
pub type Volume<T = f64> = Quantity<T, _Volume>;
pub type _Energy = Sum<_Mass, Diff<_Area, Sum<_Time, _Time>>>;
pub type Energy<T = f64> = Quantity<T, _Energy>;
pub type _Pressure = Diff<_Energy, _Volume>;
pub type Pressure<T = f64> = Quantity<T, _Pressure>;
pub type _Entropy = Diff<_Energy, _Temperature>;
pub type Entropy<T = f64> = Quantity<T, _Entropy>;
pub type _MolarEntropy = Diff<_Entropy, _Moles>;
pub type MolarEntropy<T = f64> = Quantity<T, _MolarEntropy>;
pub type _MolarEnergy = Diff<_Energy, _Moles>;
pub type MolarEnergy<T = f64> = Quantity<T, _MolarEnergy>;
pub type _MolarWeight = Diff<_Mass, _Moles>;
pub type MolarWeight<T = f64> = Quantity<T, _MolarWeight>;
pub type _Density = Diff<_Moles, _Volume>;
pub type Density<T = f64> = Quantity<T, _Density>;
pub type _MassDensity = Diff<_Mass, _Volume>;
pub type MassDensity<T = f64> = Quantity<T, _MassDensity>;
pub type _MolarVolume = Diff<_Volume, _Moles>;
pub type MolarVolume<T = f64> = Quantity<T, _MolarVolume>;
pub type _PressurePerVolume = Diff<_Pressure, _Volume>;
pub type PressurePerVolume<T = f64> = Quantity<T, _PressurePerVolume>;
pub type _PressurePerDensity = Diff<_Pressure, _Density>;
pub type PressurePerDensity<T = f64> = Quantity<T, _PressurePerDensity>;
pub type _PressurePerMoles = Diff<_Pressure, _Moles>;
pub type PressurePerMoles<T = f64> = Quantity<T, _PressurePerMoles>;
pub type _MolarEnergyPerMoles = Diff<_MolarEnergy, _Moles>;
pub type MolarEnergyPerMoles<T = f64> = Quantity<T, _MolarEnergyPerMoles>;
pub type _InverseMoles = Negate<_Moles>;
pub type InverseMoles<T = f64> = Quantity<T, _InverseMoles>;

/// SI base unit second $\\left(\text{s}\\right)$
pub const SECOND: Time = Quantity(1.0, PhantomData);
/// SI base unit meter $\\left(\text{m}\\right)$
pub const METER: Length = Quantity(1.0, PhantomData);
/// SI base unit kilogram $\\left(\text{kg}\\right)$
pub const KILOGRAM: Mass = Quantity(1.0, PhantomData);
/// SI base unit Kelvin $\\left(\text{K}\\right)$
pub const KELVIN: Temperature = Quantity(1.0, PhantomData);
/// SI base unit mol $\\left(\text{mol}\\right)$
pub const MOL: Moles = Quantity(1.0, PhantomData);

/// Derived unit Pascal $\\left(1\\,\text{Pa}=1\\,\\frac{\text{kg}}{\text{m}\\cdot\text{s}^2}\\right)$
pub const PASCAL: Pressure = Quantity(1.0, PhantomData);
/// Derived unit Joule $\\left(1\\,\text{J}=1\\,\text{kg}\\frac{\text{m}^2}{\text{s}^2}\\right)$
pub const JOULE: Energy = Quantity(1.0, PhantomData);

/// Ångstrom $\\left(1\\,\text{\\AA}=10^{-10}\\,\text{m}\\right)$
pub const ANGSTROM: Length = Quantity(1e-10, PhantomData);
/// Bar $\\left(1\\,\text{bar}=10^5\\,\text{Pa}\\right)$
pub const BAR: Pressure = Quantity(1e5, PhantomData);
/// Gram $\\left(1\\,\text{g}=10^{-3}\\,\text{kg}\\right)$
pub const GRAM: Mass = Quantity(1e-3, PhantomData);
/// Liter $\\left(1\\,\text{l}=10^{-3}\\,\text{m}^3\\right)$
pub const LITER: Volume = Quantity(1e-3, PhantomData);

/// Boltzmann constant $\\left(k_\text{B}=1.380649\times 10^{-23}\\,\\frac{\text{J}}{\text{K}}\\right)$
pub const KB: Entropy = Quantity(1.380649e-23, PhantomData);
/// Avogadro constant $\\left(N_\text{A}=6.02214076\times 10^{23}\\,\text{mol}^{-1}\\right)$
pub const NAV: InverseMoles = Quantity(6.02214076e23, PhantomData);
/// Ideal gas constant $\\left(R=N_\text{A}k_\text{B}\\right)$
pub const RGAS: MolarEntropy = Quantity(8.31446261815324, PhantomData);

/// Prefix milli $\\left(\text{m}=10^{-3}\\right)$
pub const MILLI: f64 = 1e-3;
/// Prefix kilo $\\left(\text{k}=10^{3}\\right)$
pub const KILO: f64 = 1e3;
/// Prefix mega $\\left(\text{M}=10^{6}\\right)$
pub const MEGA: f64 = 1e6;

impl<T> Dimensionless<T> {
    /// Return the value of a dimensionless quantity.
    pub fn into_value(self) -> T {
        self.0
    }
}

impl<T, U> Quantity<T, U> {
    /// Express the quantity as a multiple of `unit`.
    pub fn convert_into<T2>(self, unit: Quantity<T2, U>) -> Quot<T, T2>
    where
        T: Div<T2>,
        U: Sub<U, Output = _Dimensionless>,
    {
        (self / unit).into_value()
    }
}

impl<T> From<T> for Dimensionless<T> {
    fn from(value: T) -> Self {
        Quantity(value, PhantomData)
    }
}

/// Ps, Å, the mass that makes $k_\mathrm{B}\cdot1\\,\mathrm{K}$ the energy unit,
/// A, K, one molecule and cd.
const REFERENCE_VALUES: [f64; 7] = [1e-12, 1e-10, 1.380649e-27, 1.0, 1.0, 1.0 / 6.02214076e23, 1.0];

fn reference<T, L, M, I, THETA, N, J>() -> f64
where
    T: Integer,
    L: Integer,
    M: Integer,
    I: Integer,
    THETA: Integer,
    N: Integer,
    J: Integer,
{
    [T::I32, L::I32, M::I32, I::I32, THETA::I32, N::I32, J::I32]
        .iter()
        .zip(REFERENCE_VALUES)
        .fold(1.0, |acc, (&e, r)| acc * r.powi(e))
}

/// Conversion to and from reduced units
impl<Inner, T, L, M, I, THETA, N, J> Quantity<Inner, SIUnit<T, L, M, I, THETA, N, J>>
where
    T: Integer,
    L: Integer,
    M: Integer,
    I: Integer,
    THETA: Integer,
    N: Integer,
    J: Integer,
{
    pub fn from_reduced(value: Inner) -> Self
    where
        Inner: Mul<f64, Output = Inner>,
    {
        Self(value * reference::<T, L, M, I, THETA, N, J>(), PhantomData)
    }

    pub fn to_reduced<'a>(&'a self) -> Inner
    where
        &'a Inner: Div<f64, Output = Inner>,
    {
        &self.0 / reference::<T, L, M, I, THETA, N, J>()
    }
}
