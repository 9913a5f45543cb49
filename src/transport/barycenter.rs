use super::cost::CostMatrix;
use super::distribution::Distribution;
use crate::error::InputError;
use crate::numeric::l1;
use crate::numeric::normalize;
use crate::numeric::Matrix;
use crate::Energy;
use crate::Mass;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarycenterConfig {
    pub epsilon: Energy,
    pub iterations: usize,
    pub tolerance: Mass,
}

impl Default for BarycenterConfig {
    fn default() -> Self {
        Self {
            epsilon: crate::SINKHORN_EPSILON,
            iterations: crate::SINKHORN_ITERATIONS,
            tolerance: 1e-8,
        }
    }
}

/// Wasserstein barycenter of measures sharing one fixed n-point support,
/// by iterative Bregman projections.
///
/// each measure keeps a scaling vector v_i; one sweep projects every
/// coupling onto its marginal constraint and the barycenter is the
/// lambda-weighted geometric mean of the projected images K v_i.
pub fn fixed_support_barycenter(
    measures: &[Distribution],
    cost: &CostMatrix,
    lambdas: &[f64],
    config: BarycenterConfig,
) -> Result<Vec<Mass>, InputError> {
    if measures.is_empty() {
        return Err(InputError::EmptyDistribution);
    }
    let n = measures[0].len();
    if cost.rows() != n || cost.cols() != n {
        return Err(InputError::DimensionMismatch {
            rows: cost.rows(),
            cols: cost.cols(),
            len: n,
        });
    }
    for measure in measures {
        cost.conforms(measure, measure)?;
    }
    if lambdas.len() != measures.len() {
        return Err(InputError::DimensionMismatch {
            rows: lambdas.len(),
            cols: 1,
            len: measures.len(),
        });
    }
    InputError::finite("lambdas", lambdas)?;

    let lambdas = normalize(lambdas);
    let kernel: Matrix = cost.matrix().map(|c| (-c / config.epsilon).exp());
    let mut scalings = vec![vec![1.; n]; measures.len()];
    let mut bary = vec![1. / n as Mass; n];
    for sweep in 0..config.iterations {
        let mut log_bary = vec![0.; n];
        for (i, measure) in measures.iter().enumerate() {
            let kv = kernel.mul_vec(&scalings[i]);
            let u = bary
                .iter()
                .zip(kv.iter())
                .map(|(b, kv)| b / kv.max(crate::SINKHORN_FLOOR))
                .collect::<Vec<_>>();
            let ku = kernel.tmul_vec(&u);
            scalings[i] = measure
                .weights()
                .iter()
                .zip(ku.iter())
                .map(|(m, ku)| m / ku.max(crate::SINKHORN_FLOOR))
                .collect();
            let kv = kernel.mul_vec(&scalings[i]);
            for (log, kv) in log_bary.iter_mut().zip(kv.iter()) {
                *log += lambdas[i] * kv.max(crate::SINKHORN_FLOOR).ln();
            }
        }
        let next = normalize(&log_bary.iter().map(|l| l.exp()).collect::<Vec<_>>());
        let drift = l1(&next
            .iter()
            .zip(bary.iter())
            .map(|(n, b)| n - b)
            .collect::<Vec<_>>());
        bary = next;
        if drift < config.tolerance {
            log::debug!("barycenter converged after {} sweeps", sweep + 1);
            break;
        }
    }
    Ok(bary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_cost(n: usize) -> CostMatrix {
        CostMatrix::new(Matrix::from_fn(n, n, |i, j| {
            ((i as f64 - j as f64) / n as f64).powi(2)
        }))
        .expect("valid cost")
    }

    #[test]
    fn barycenter_of_one_measure_is_that_measure() {
        let mu = Distribution::new(vec![0.1, 0.2, 0.4, 0.2, 0.1]).expect("valid");
        let bary = fixed_support_barycenter(
            &[mu.clone()],
            &line_cost(5),
            &[1.],
            BarycenterConfig::default(),
        )
        .expect("well-formed inputs");
        let drift = bary
            .iter()
            .zip(mu.weights())
            .map(|(b, m)| (b - m).abs())
            .sum::<f64>();
        assert!(drift < 0.05, "{}", drift);
    }

    #[test]
    fn barycenter_sits_between_separated_spikes() {
        let n = 9;
        let mut left = vec![0.; n];
        let mut right = vec![0.; n];
        left[0] = 1.;
        right[n - 1] = 1.;
        let left = Distribution::new(left).expect("valid");
        let right = Distribution::new(right).expect("valid");
        let config = BarycenterConfig {
            epsilon: 0.05,
            ..BarycenterConfig::default()
        };
        let bary = fixed_support_barycenter(
            &[left, right],
            &line_cost(n),
            &[0.5, 0.5],
            config,
        )
        .expect("well-formed inputs");
        let mean = bary
            .iter()
            .enumerate()
            .map(|(i, b)| i as f64 * b)
            .sum::<f64>();
        assert!((mean - (n - 1) as f64 / 2.).abs() < 1., "{}", mean);
    }

    #[test]
    fn barycenter_is_a_distribution() {
        let mus = vec![
            Distribution::new(vec![0.7, 0.1, 0.1, 0.1]).expect("valid"),
            Distribution::new(vec![0.1, 0.1, 0.1, 0.7]).expect("valid"),
            Distribution::new(vec![0.25, 0.25, 0.25, 0.25]).expect("valid"),
        ];
        let bary = fixed_support_barycenter(
            &mus,
            &line_cost(4),
            &[1., 1., 1.],
            BarycenterConfig::default(),
        )
        .expect("well-formed inputs");
        assert!((bary.iter().sum::<f64>() - 1.).abs() < 1e-9);
        assert!(bary.iter().all(|&b| b >= 0.));
    }

    #[test]
    fn rejects_mismatched_lambdas() {
        let mu = Distribution::uniform(3);
        let err = fixed_support_barycenter(
            &[mu],
            &line_cost(3),
            &[0.5, 0.5],
            BarycenterConfig::default(),
        );
        assert!(err.is_err());
    }
}
