use super::*;
use ndarray::{Array, Dimension};
use std::fmt;
use typenum::{N1, N2, N3, P2, P3};

const UNIT_SYMBOLS: [&str; 7] = ["s", "m", "kg", "A", "K", "mol", "cd"];

impl<Inner, T, L, M, I, THETA, N, J> fmt::Debug for Quantity<Inner, SIUnit<T, L, M, I, THETA, N, J>>
where
    Inner: fmt::Debug,
    T: Integer,
    L: Integer,
    M: Integer,
    I: Integer,
    THETA: Integer,
    N: Integer,
    J: Integer,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)?;
        let exponents = [T::I8, L::I8, M::I8, I::I8, THETA::I8, N::I8, J::I8];
        for (e, symbol) in exponents.into_iter().zip(UNIT_SYMBOLS) {
            match e {
                0 => (),
                1 => write!(f, " {symbol}")?,
                _ => write!(f, " {symbol}^{e}")?,
            }
        }
        Ok(())
    }
}

/// `Display` in the unit used throughout the public API for that dimension.
macro_rules! impl_display {
    ($t:ident, $l:ident, $m:ident, $theta:ident, $n:ident, $unit:expr, $symbol:expr) => {
        impl fmt::Display for Quantity<f64, SIUnit<$t, $l, $m, Z0, $theta, $n, Z0>> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.convert_into($unit).fmt(f)?;
                write!(f, " {}", $symbol)
            }
        }

        impl<D: Dimension> fmt::Display
            for Quantity<Array<f64, D>, SIUnit<$t, $l, $m, Z0, $theta, $n, Z0>>
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                (self / $unit).into_value().fmt(f)?;
                write!(f, " {}", $symbol)
            }
        }
    };
}

const M3: Volume = Quantity(1.0, PhantomData);
const JMK: MolarEntropy = Quantity(1.0, PhantomData);

impl_display!(Z0, Z0, Z0, P1, Z0, KELVIN, "K");
impl_display!(Z0, Z0, Z0, Z0, P1, MOL, "mol");
impl_display!(Z0, P3, Z0, Z0, Z0, M3, "m³");
impl_display!(N2, N1, P1, Z0, Z0, PASCAL, "Pa");
impl_display!(N2, P2, P1, Z0, Z0, JOULE, "J");
impl_display!(Z0, N3, Z0, Z0, P1, MOL / M3, "mol/m³");
impl_display!(Z0, P3, Z0, Z0, N1, M3 / MOL, "m³/mol");
impl_display!(Z0, N3, P1, Z0, Z0, KILOGRAM / M3, "kg/m³");
impl_display!(Z0, Z0, P1, Z0, N1, GRAM / MOL, "g/mol");
impl_display!(N2, P2, P1, Z0, N1, JOULE / MOL, "J/mol");
impl_display!(N2, P2, P1, N1, N1, JMK, "J/mol/K");
