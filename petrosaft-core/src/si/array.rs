use super::Quantity;
use ndarray::{Array, ArrayBase, Data, Dimension, NdIndex};
use std::marker::PhantomData;

impl<S: Data<Elem = f64>, U, D: Dimension> Quantity<ArrayBase<S, D>, U> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> Quantity<f64, U> {
        Quantity(self.0.sum(), PhantomData)
    }

    pub fn to_owned(&self) -> Quantity<Array<f64, D>, U> {
        Quantity(self.0.to_owned(), PhantomData)
    }

    pub fn get<I: NdIndex<D>>(&self, index: I) -> Quantity<f64, U> {
        Quantity(self.0[index], PhantomData)
    }
}
