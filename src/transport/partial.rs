use super::cost::CostMatrix;
use super::coupling::Coupling;
use super::distribution::Distribution;
use super::result::SinkhornConfig;
use super::result::TransportResult;
use super::sinkhorn::sinkhorn;
use crate::error::InputError;
use crate::numeric::Matrix;
use crate::Energy;
use crate::Mass;

/// partial transport: move only m units of mass, letting the rest idle.
///
/// implemented by augmenting the problem with one dummy source and one
/// dummy target priced at twice the largest ground cost. the dummy
/// column absorbs whatever source mass is not part of the m transported
/// units, and symmetrically for the dummy row. the returned plan is the
/// real N x M block of the augmented solution.
pub fn partial_sinkhorn(
    a: &Distribution,
    b: &Distribution,
    cost: &CostMatrix,
    m: Mass,
    epsilon: Energy,
) -> Result<TransportResult, InputError> {
    cost.conforms(a, b)?;
    if !m.is_finite() || m < 0. {
        return Err(InputError::NonFinite { field: "mass" });
    }
    let n = a.len();
    let k = b.len();
    let slack = 2. * cost.max().max(0.);
    let augmented = Matrix::from_fn(n + 1, k + 1, |i, j| match (i == n, j == k) {
        (false, false) => cost.matrix().get(i, j),
        _ => slack,
    });
    let mut lhs = a.weights().to_vec();
    let mut rhs = b.weights().to_vec();
    lhs.push((b.mass() - m).max(0.));
    rhs.push((a.mass() - m).max(0.));
    let lhs = Distribution::new(lhs).expect("augmented marginal stays well-formed");
    let rhs = Distribution::new(rhs).expect("augmented marginal stays well-formed");
    let augmented = CostMatrix::new(augmented).expect("augmented cost stays well-formed");
    let config = SinkhornConfig::from(epsilon);
    let full = sinkhorn(&lhs, &rhs, &augmented, config)?;
    let plan = Matrix::from_fn(n, k, |i, j| full.plan.get(i, j));
    Ok(TransportResult {
        cost: plan.frobenius(cost.matrix()),
        lhs: full.lhs[..n].to_vec(),
        rhs: full.rhs[..k].to_vec(),
        iterations: full.iterations,
        converged: full.converged,
        plan,
    })
}

/// unbalanced transport: marginals are soft constraints with strength p.
///
/// the scaling updates are damped by t = p / (p + e). large p recovers
/// the balanced solver; small p lets mass be created or destroyed at
/// cost proportional to the divergence from the marginals.
pub struct Unbalanced<'a> {
    a: &'a Distribution,
    b: &'a Distribution,
    cost: &'a CostMatrix,
    kernel: Matrix,
    u: Vec<Mass>,
    v: Vec<Mass>,
    tau: f64,
    config: SinkhornConfig,
    iterations: usize,
    converged: bool,
}

impl Unbalanced<'_> {
    const CADENCE: usize = 5;

    fn minimize(mut self) -> Self {
        for i in 0..self.config.iterations {
            let prev = self.u.clone();
            let kv = self.kernel.mul_vec(&self.v);
            self.u = self
                .a
                .weights()
                .iter()
                .zip(kv.iter())
                .map(|(a, kv)| (a / kv.max(crate::SINKHORN_FLOOR)).powf(self.tau))
                .collect();
            let ku = self.kernel.tmul_vec(&self.u);
            self.v = self
                .b
                .weights()
                .iter()
                .zip(ku.iter())
                .map(|(b, ku)| (b / ku.max(crate::SINKHORN_FLOOR)).powf(self.tau))
                .collect();
            self.iterations = i + 1;
            let drift = self
                .u
                .iter()
                .zip(prev.iter())
                .map(|(u, p)| (u - p).abs())
                .fold(0., f64::max);
            if (i + 1) % Self::CADENCE == 0 && drift < self.config.tolerance {
                self.converged = true;
                break;
            }
        }
        self
    }

    fn plan(&self) -> Matrix {
        Matrix::from_fn(self.a.len(), self.b.len(), |x, y| self.flow(x, y))
    }
}

impl Coupling for Unbalanced<'_> {
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

impl<'a> From<(&'a Distribution, &'a Distribution, &'a CostMatrix, Energy, f64)>
    for Unbalanced<'a>
{
    fn from(
        (a, b, cost, epsilon, rho): (&'a Distribution, &'a Distribution, &'a CostMatrix, Energy, f64),
    ) -> Self {
        Self {
            kernel: cost.matrix().map(|c| (-c / epsilon).exp()),
            u: vec![1.; a.len()],
            v: vec![1.; b.len()],
            tau: rho / (rho + epsilon),
            config: SinkhornConfig::from(epsilon),
            iterations: 0,
            converged: false,
            cost,
            a,
            b,
        }
    }
}

impl From<Unbalanced<'_>> for TransportResult {
    fn from(solver: Unbalanced<'_>) -> Self {
        let epsilon = solver.config.epsilon;
        let dual = |potentials: &[Mass]| {
            potentials
                .iter()
                .map(|p| epsilon * p.max(crate::DIVISION_FLOOR).ln())
                .collect::<Vec<_>>()
        };
        Self {
            plan: solver.plan(),
            cost: solver.cost(),
            lhs: dual(&solver.u),
            rhs: dual(&solver.v),
            iterations: solver.iterations,
            converged: solver.converged,
        }
    }
}

/// solve unbalanced entropic OT with marginal relaxation strength rho.
pub fn unbalanced_sinkhorn(
    a: &Distribution,
    b: &Distribution,
    cost: &CostMatrix,
    epsilon: Energy,
    rho: f64,
) -> Result<TransportResult, InputError> {
    cost.conforms(a, b)?;
    if !rho.is_finite() || rho <= 0. {
        return Err(InputError::NonFinite { field: "rho" });
    }
    Ok(TransportResult::from(
        Unbalanced::from((a, b, cost, epsilon, rho)).minimize(),
    ))
}
