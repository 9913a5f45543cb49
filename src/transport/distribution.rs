use super::density::Density;
use crate::error::InputError;
use crate::Arbitrary;
use crate::Mass;
use serde::Deserialize;
use serde::Serialize;

/// dense non-negative marginal over a fixed support.
///
/// entries are expected to sum to (approximately) one. zero entries are
/// fine; the solvers floor their exponentials rather than reject them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution(Vec<Mass>);

impl Distribution {
    /// validate a raw weight vector at the API boundary
    pub fn new(weights: Vec<Mass>) -> Result<Self, InputError> {
        if weights.is_empty() {
            return Err(InputError::EmptyDistribution);
        }
        InputError::finite("distribution", &weights)?;
        match weights.iter().position(|&w| w < 0.) {
            Some(index) => Err(InputError::NegativeMass { index }),
            None => Ok(Self(weights)),
        }
    }
    pub fn uniform(n: usize) -> Self {
        Self(vec![1. / n as Mass; n])
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn weights(&self) -> &[Mass] {
        &self.0
    }
    pub fn mass(&self) -> Mass {
        self.0.iter().sum()
    }
}

impl Density for Distribution {
    type S = usize;
    fn density(&self, x: usize) -> f64 {
        self.0[x]
    }
    fn support(&self) -> impl Iterator<Item = usize> {
        0..self.0.len()
    }
}

impl Arbitrary for Distribution {
    fn random() -> Self {
        let n = 2 + rand::random_range(0..8);
        let raw = (0..n).map(|_| rand::random::<f64>()).collect::<Vec<_>>();
        Self(crate::numeric::normalize(&raw))
    }
}
