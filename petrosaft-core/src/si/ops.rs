use super::Quantity;
use approx::{AbsDiffEq, RelativeEq};
use ndarray::{Array, ArrayBase, Data, DataMut, DataOwned, Dimension};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Sub};
use typenum::{Diff, Integer, Negate, Prod, Sum};

/// Products and quotients of two quantities combine their units with
/// `$unit_op` (`Add` for `Mul`, `Sub` for `Div`).
macro_rules! impl_mul_div {
    ($op:ident, $method:ident, $unit_op:ident, $unit_out:ident) => {
        impl<T1, T2, U1, U2> $op<Quantity<T2, U2>> for Quantity<T1, U1>
        where
            T1: $op<T2>,
            U1: $unit_op<U2>,
        {
            type Output = Quantity<<T1 as $op<T2>>::Output, $unit_out<U1, U2>>;
            fn $method(self, rhs: Quantity<T2, U2>) -> Self::Output {
                Quantity(self.0.$method(rhs.0), PhantomData)
            }
        }

        impl<'a, T1, T2, U1, U2> $op<Quantity<T2, U2>> for &'a Quantity<T1, U1>
        where
            &'a T1: $op<T2>,
            U1: $unit_op<U2>,
        {
            type Output = Quantity<<&'a T1 as $op<T2>>::Output, $unit_out<U1, U2>>;
            fn $method(self, rhs: Quantity<T2, U2>) -> Self::Output {
                Quantity((&self.0).$method(rhs.0), PhantomData)
            }
        }

        impl<'b, T1, T2, U1, U2> $op<&'b Quantity<T2, U2>> for Quantity<T1, U1>
        where
            T1: $op<&'b T2>,
            U1: $unit_op<U2>,
        {
            type Output = Quantity<<T1 as $op<&'b T2>>::Output, $unit_out<U1, U2>>;
            fn $method(self, rhs: &'b Quantity<T2, U2>) -> Self::Output {
                Quantity(self.0.$method(&rhs.0), PhantomData)
            }
        }

        impl<'a, 'b, T1, T2, U1, U2> $op<&'b Quantity<T2, U2>> for &'a Quantity<T1, U1>
        where
            &'a T1: $op<&'b T2>,
            U1: $unit_op<U2>,
        {
            type Output = Quantity<<&'a T1 as $op<&'b T2>>::Output, $unit_out<U1, U2>>;
            fn $method(self, rhs: &'b Quantity<T2, U2>) -> Self::Output {
                Quantity((&self.0).$method(&rhs.0), PhantomData)
            }
        }

        impl<T: $op<f64>, U> $op<f64> for Quantity<T, U> {
            type Output = Quantity<T::Output, U>;
            fn $method(self, rhs: f64) -> Self::Output {
                Quantity(self.0.$method(rhs), PhantomData)
            }
        }

        impl<'a, T, U> $op<f64> for &'a Quantity<T, U>
        where
            &'a T: $op<f64>,
        {
            type Output = Quantity<<&'a T as $op<f64>>::Output, U>;
            fn $method(self, rhs: f64) -> Self::Output {
                Quantity((&self.0).$method(rhs), PhantomData)
            }
        }
    };
}

impl_mul_div!(Mul, mul, Add, Sum);
impl_mul_div!(Div, div, Sub, Diff);

/// Sums and differences require identical units.
macro_rules! impl_add_sub {
    ($op:ident, $method:ident) => {
        impl<T1: $op<T2>, T2, U> $op<Quantity<T2, U>> for Quantity<T1, U> {
            type Output = Quantity<T1::Output, U>;
            fn $method(self, rhs: Quantity<T2, U>) -> Self::Output {
                Quantity(self.0.$method(rhs.0), PhantomData)
            }
        }

        impl<'a, T1, T2, U> $op<Quantity<T2, U>> for &'a Quantity<T1, U>
        where
            &'a T1: $op<T2>,
        {
            type Output = Quantity<<&'a T1 as $op<T2>>::Output, U>;
            fn $method(self, rhs: Quantity<T2, U>) -> Self::Output {
                Quantity((&self.0).$method(rhs.0), PhantomData)
            }
        }

        impl<'b, T1, T2, U> $op<&'b Quantity<T2, U>> for Quantity<T1, U>
        where
            T1: $op<&'b T2>,
        {
            type Output = Quantity<<T1 as $op<&'b T2>>::Output, U>;
            fn $method(self, rhs: &'b Quantity<T2, U>) -> Self::Output {
                Quantity(self.0.$method(&rhs.0), PhantomData)
            }
        }

        impl<'a, 'b, T1, T2, U> $op<&'b Quantity<T2, U>> for &'a Quantity<T1, U>
        where
            &'a T1: $op<&'b T2>,
        {
            type Output = Quantity<<&'a T1 as $op<&'b T2>>::Output, U>;
            fn $method(self, rhs: &'b Quantity<T2, U>) -> Self::Output {
                Quantity((&self.0).$method(&rhs.0), PhantomData)
            }
        }
    };
}

impl_add_sub!(Add, add);
impl_add_sub!(Sub, sub);

impl<T, U> Mul<Quantity<T, U>> for f64
where
    f64: Mul<T>,
{
    type Output = Quantity<<f64 as Mul<T>>::Output, U>;
    fn mul(self, rhs: Quantity<T, U>) -> Self::Output {
        Quantity(self * rhs.0, PhantomData)
    }
}

impl<T, U: Neg> Div<Quantity<T, U>> for f64
where
    f64: Div<T>,
{
    type Output = Quantity<<f64 as Div<T>>::Output, Negate<U>>;
    fn div(self, rhs: Quantity<T, U>) -> Self::Output {
        Quantity(self / rhs.0, PhantomData)
    }
}

/// Arrays of plain numbers times a scalar unit
impl<U, S: Data<Elem = f64>, D: Dimension> Mul<Quantity<f64, U>> for &ArrayBase<S, D> {
    type Output = Quantity<Array<f64, D>, U>;
    fn mul(self, rhs: Quantity<f64, U>) -> Self::Output {
        Quantity(self * rhs.0, PhantomData)
    }
}

impl<U, S: DataOwned<Elem = f64> + DataMut, D: Dimension> Mul<Quantity<f64, U>>
    for ArrayBase<S, D>
{
    type Output = Quantity<ArrayBase<S, D>, U>;
    fn mul(self, rhs: Quantity<f64, U>) -> Self::Output {
        Quantity(self * rhs.0, PhantomData)
    }
}

impl<T: Neg, U> Neg for Quantity<T, U> {
    type Output = Quantity<T::Output, U>;
    fn neg(self) -> Self::Output {
        Quantity(-self.0, PhantomData)
    }
}

impl<U> Quantity<f64, U> {
    pub fn powi<E: Integer>(self) -> Quantity<f64, Prod<U, E>>
    where
        U: Mul<E>,
    {
        Quantity(self.0.powi(E::I32), PhantomData)
    }
}

impl<T: PartialEq, U> PartialEq for Quantity<T, U> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: PartialOrd, U> PartialOrd for Quantity<T, U> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl<T: AbsDiffEq, U> AbsDiffEq for Quantity<T, U> {
    type Epsilon = T::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.0.abs_diff_eq(&other.0, epsilon)
    }
}

impl<T: RelativeEq, U> RelativeEq for Quantity<T, U> {
    fn default_max_relative() -> Self::Epsilon {
        T::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        self.0.relative_eq(&other.0, epsilon, max_relative)
    }
}
