use super::distribution::Distribution;
use super::measure::Measure;
use crate::error::InputError;
use crate::numeric::Matrix;
use crate::Arbitrary;
use serde::Deserialize;
use serde::Serialize;

/// dense non-negative ground cost between two fixed supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMatrix(Matrix);

impl CostMatrix {
    /// validate a raw matrix at the API boundary
    pub fn new(matrix: Matrix) -> Result<Self, InputError> {
        if !matrix.is_finite() {
            return Err(InputError::NonFinite { field: "cost" });
        }
        match matrix.data().iter().position(|&c| c < 0.) {
            Some(index) => Err(InputError::NegativeMass { index }),
            None => Ok(Self(matrix)),
        }
    }
    /// check shape against a pair of marginals
    pub fn conforms(&self, a: &Distribution, b: &Distribution) -> Result<(), InputError> {
        if self.0.rows() != a.len() {
            Err(InputError::DimensionMismatch {
                rows: self.0.rows(),
                cols: self.0.cols(),
                len: a.len(),
            })
        } else if self.0.cols() != b.len() {
            Err(InputError::DimensionMismatch {
                rows: self.0.rows(),
                cols: self.0.cols(),
                len: b.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.0
    }
    pub fn rows(&self) -> usize {
        self.0.rows()
    }
    pub fn cols(&self) -> usize {
        self.0.cols()
    }
    pub fn max(&self) -> f64 {
        self.0.max()
    }
    pub fn median(&self) -> f64 {
        crate::numeric::median(self.0.data())
    }
}

impl Measure for CostMatrix {
    type X = usize;
    type Y = usize;
    fn distance(&self, x: usize, y: usize) -> f64 {
        self.0.get(x, y)
    }
}

impl From<CostMatrix> for Matrix {
    fn from(cost: CostMatrix) -> Self {
        cost.0
    }
}

impl Arbitrary for CostMatrix {
    fn random() -> Self {
        Self(Matrix::random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_cost() {
        let m = Matrix::from_rows(vec![vec![0., 1.], vec![-1., 0.]]);
        assert!(CostMatrix::new(m).is_err());
    }

    #[test]
    fn conforms_checks_both_axes() {
        let c = CostMatrix::new(Matrix::zeros(2, 3)).expect("valid cost");
        let a2 = Distribution::uniform(2);
        let b3 = Distribution::uniform(3);
        assert!(c.conforms(&a2, &b3).is_ok());
        assert!(c.conforms(&b3, &a2).is_err());
    }
}
