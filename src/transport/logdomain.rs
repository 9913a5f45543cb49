use super::cost::CostMatrix;
use super::coupling::Coupling;
use super::distribution::Distribution;
use super::result::SinkhornConfig;
use super::result::TransportResult;
use crate::error::InputError;
use crate::numeric::logsumexp;
use crate::numeric::Matrix;
use crate::Mass;

/// entropically regularized transport in the dual (log) domain.
///
/// when e is small the Gibbs kernel exp(-C/e) underflows to zero and the
/// multiplicative iteration stalls. the dual iteration over potentials
/// f, g stays finite for arbitrarily small e at the price of a log-sum-exp
/// per row per sweep.
pub struct LogSinkhorn<'a> {
    a: &'a Distribution,
    b: &'a Distribution,
    cost: &'a CostMatrix,
    f: Vec<f64>,
    g: Vec<f64>,
    config: SinkhornConfig,
    iterations: usize,
    converged: bool,
}

impl LogSinkhorn<'_> {
    const CADENCE: usize = 5;

    /// multiplicative updates underflow roughly when e drops below
    /// a hundredth of the median ground cost
    pub fn preferable(cost: &CostMatrix, epsilon: f64) -> bool {
        epsilon < 0.01 * cost.median()
    }

    fn minimize(mut self) -> Self {
        let e = self.config.epsilon;
        for i in 0..self.config.iterations {
            self.f = self
                .a
                .support_logs()
                .enumerate()
                .map(|(x, log_a)| {
                    let shifted = (0..self.b.len())
                        .map(|y| (self.g[y] - self.cost.matrix().get(x, y)) / e)
                        .collect::<Vec<_>>();
                    e * log_a - e * logsumexp(&shifted)
                })
                .collect();
            self.g = self
                .b
                .support_logs()
                .enumerate()
                .map(|(y, log_b)| {
                    let shifted = (0..self.a.len())
                        .map(|x| (self.f[x] - self.cost.matrix().get(x, y)) / e)
                        .collect::<Vec<_>>();
                    e * log_b - e * logsumexp(&shifted)
                })
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
        (0..self.a.len())
            .map(|x| {
                let row = (0..self.b.len()).map(|y| self.flow(x, y)).sum::<Mass>();
                (row - self.a.weights()[x]).abs()
            })
            .fold(0., f64::max)
    }

    fn plan(&self) -> Matrix {
        Matrix::from_fn(self.a.len(), self.b.len(), |x, y| self.flow(x, y))
    }
}

impl Coupling for LogSinkhorn<'_> {
    type X = usize;
    type Y = usize;
    type P = Distribution;
    type Q = Distribution;
    type M = CostMatrix;

    fn minimize(self) -> Self {
        self.minimize()
    }
    fn flow(&self, x: usize, y: usize) -> f64 {
        ((self.f[x] + self.g[y] - self.cost.matrix().get(x, y)) / self.config.epsilon).exp()
    }
    fn cost(&self) -> f64 {
        self.plan().frobenius(self.cost.matrix())
    }
}

impl Distribution {
    /// floored logs of the weights, in support order
    fn support_logs(&self) -> impl Iterator<Item = f64> + '_ {
        self.weights()
            .iter()
            .map(|w| w.max(crate::DIVISION_FLOOR).ln())
    }
}

impl<'a> From<(&'a Distribution, &'a Distribution, &'a CostMatrix, SinkhornConfig)>
    for LogSinkhorn<'a>
{
    fn from(
        (a, b, cost, config): (&'a Distribution, &'a Distribution, &'a CostMatrix, SinkhornConfig),
    ) -> Self {
        Self {
            f: vec![0.; a.len()],
            g: vec![0.; b.len()],
            iterations: 0,
            converged: false,
            config,
            cost,
            a,
            b,
        }
    }
}

impl From<LogSinkhorn<'_>> for TransportResult {
    fn from(solver: LogSinkhorn<'_>) -> Self {
        Self {
            plan: solver.plan(),
            cost: solver.cost(),
            lhs: solver.f.clone(),
            rhs: solver.g.clone(),
            iterations: solver.iterations,
            converged: solver.converged,
        }
    }
}

/// solve entropic OT in the log domain.
pub fn sinkhorn_log(
    a: &Distribution,
    b: &Distribution,
    cost: &CostMatrix,
    config: SinkhornConfig,
) -> Result<TransportResult, InputError> {
    cost.conforms(a, b)?;
    Ok(TransportResult::from(
        LogSinkhorn::from((a, b, cost, config)).minimize(),
    ))
}

/// solve entropic OT, picking the domain by the size of epsilon
/// relative to the ground cost.
pub fn transport(
    a: &Distribution,
    b: &Distribution,
    cost: &CostMatrix,
    config: SinkhornConfig,
) -> Result<TransportResult, InputError> {
    match LogSinkhorn::preferable(cost, config.epsilon) {
        true => sinkhorn_log(a, b, cost, config),
        false => super::sinkhorn::sinkhorn(a, b, cost, config),
    }
}
