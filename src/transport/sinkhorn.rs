use super::cost::CostMatrix;
use super::coupling::Coupling;
use super::distribution::Distribution;
use super::result::SinkhornConfig;
use super::result::TransportResult;
use crate::error::InputError;
use crate::numeric::Matrix;
use crate::Mass;

/// entropically regularized transport in the multiplicative domain.
///
/// scales the Gibbs kernel exp(-C/e) by potentials u, v until the plan
/// diag(u) K diag(v) reproduces both marginals. denominators are floored
/// rather than allowed to underflow, so zero-mass support points are fine.
pub struct Sinkhorn<'a> {
    a: &'a Distribution,
    b: &'a Distribution,
    cost: &'a CostMatrix,
    kernel: Matrix,
    u: Vec<Mass>,
    v: Vec<Mass>,
    config: SinkhornConfig,
    iterations: usize,
    converged: bool,
}

impl Sinkhorn<'_> {
    /// convergence is only checked every few sweeps; the check costs a
    /// full kernel product
    const CADENCE: usize = 5;

    fn minimize(mut self) -> Self {
        for i in 0..self.config.iterations {
            let kv = self.kernel.mul_vec(&self.v);
            self.u = self
                .a
                .weights()
                .iter()
                .zip(kv.iter())
                .map(|(a, kv)| a / kv.max(crate::SINKHORN_FLOOR))
                .collect();
            let ku = self.kernel.tmul_vec(&self.u);
            self.v = self
                .b
                .weights()
                .iter()
                .zip(ku.iter())
                .map(|(b, ku)| b / ku.max(crate::SINKHORN_FLOOR))
                .collect();
            self.iterations = i + 1;
            if (i + 1) % Self::CADENCE == 0 && self.residual() < self.config.tolerance {
                self.converged = true;
                break;
            }
        }
        self
    }

    /// worst violation of the source marginal under current potentials
    fn residual(&self) -> Mass {
        self.kernel
            .mul_vec(&self.v)
            .iter()
            .zip(self.u.iter())
            .zip(self.a.weights())
            .map(|((kv, u), a)| (u * kv - a).abs())
            .fold(0., f64::max)
    }

    fn plan(&self) -> Matrix {
        Matrix::from_fn(self.a.len(), self.b.len(), |i, j| self.flow(i, j))
    }
}

impl Coupling for Sinkhorn<'_> {
    type X = usize;
    type Y = usize;
    type P = Distribution;
    type Q = Distribution;
    type M = CostMatrix;

    fn minimize(self) -> Self {
        self.minimize()
    }
    fn flow(&self, x: usize, y: usize) -> f64 {
        self.u[x] * self.kernel.get(x, y) * self.v[y]
    }
    fn cost(&self) -> f64 {
        self.plan().frobenius(self.cost.matrix())
    }
}

impl<'a> From<(&'a Distribution, &'a Distribution, &'a CostMatrix, SinkhornConfig)>
    for Sinkhorn<'a>
{
    fn from(
        (a, b, cost, config): (&'a Distribution, &'a Distribution, &'a CostMatrix, SinkhornConfig),
    ) -> Self {
        Self {
            kernel: cost.matrix().map(|c| (-c / config.epsilon).exp()),
            u: vec![1.; a.len()],
            v: vec![1.; b.len()],
            iterations: 0,
            converged: false,
            config,
            cost,
            a,
            b,
        }
    }
}

impl From<Sinkhorn<'_>> for TransportResult {
    fn from(sinkhorn: Sinkhorn<'_>) -> Self {
        let epsilon = sinkhorn.config.epsilon;
        let dual = |potentials: &[Mass]| {
            potentials
                .iter()
                .map(|p| epsilon * p.max(crate::DIVISION_FLOOR).ln())
                .collect::<Vec<_>>()
        };
        Self {
            plan: sinkhorn.plan(),
            cost: sinkhorn.cost(),
            lhs: dual(&sinkhorn.u),
            rhs: dual(&sinkhorn.v),
            iterations: sinkhorn.iterations,
            converged: sinkhorn.converged,
        }
    }
}

/// solve entropic OT between a and b under the given ground cost.
pub fn sinkhorn(
    a: &Distribution,
    b: &Distribution,
    cost: &CostMatrix,
    config: SinkhornConfig,
) -> Result<TransportResult, InputError> {
    cost.conforms(a, b)?;
    Ok(TransportResult::from(
        Sinkhorn::from((a, b, cost, config)).minimize(),
    ))
}
