use super::distribution::Distribution;
use crate::numeric::Matrix;
use crate::Energy;
use crate::Mass;
use serde::Deserialize;
use serde::Serialize;

/// solver configuration shared by every sinkhorn variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinkhornConfig {
    pub epsilon: Energy,
    pub iterations: usize,
    pub tolerance: Mass,
}

impl Default for SinkhornConfig {
    fn default() -> Self {
        Self {
            epsilon: crate::SINKHORN_EPSILON,
            iterations: crate::SINKHORN_ITERATIONS,
            tolerance: crate::SINKHORN_TOLERANCE,
        }
    }
}

impl From<Energy> for SinkhornConfig {
    fn from(epsilon: Energy) -> Self {
        Self {
            epsilon,
            ..Self::default()
        }
    }
}

/// the outcome of an entropic transport solve.
///
/// the plan is always returned, converged or not; the caller decides
/// whether a non-converged plan is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportResult {
    /// optimal plan, rows indexed by source support
    pub plan: Matrix,
    /// <plan, cost> under the ground cost
    pub cost: f64,
    /// LHS dual potential
    pub lhs: Vec<f64>,
    /// RHS dual potential
    pub rhs: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl TransportResult {
    /// worst marginal deviation of the plan against its prescribed marginals
    pub fn marginal_error(&self, a: &Distribution, b: &Distribution) -> Mass {
        let rows = (0..self.plan.rows())
            .map(|i| (self.plan.row(i).iter().sum::<Mass>() - a.weights()[i]).abs())
            .fold(0., f64::max);
        let cols = (0..self.plan.cols())
            .map(|j| {
                let sum = (0..self.plan.rows()).map(|i| self.plan.get(i, j)).sum::<Mass>();
                (sum - b.weights()[j]).abs()
            })
            .fold(0., f64::max);
        rows.max(cols)
    }
}
