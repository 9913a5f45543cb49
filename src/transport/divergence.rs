use super::cost::CostMatrix;
use super::distribution::Distribution;
use super::logdomain::transport;
use super::result::SinkhornConfig;
use crate::error::InputError;
use crate::Energy;

/// debiased sinkhorn divergence
///
///   S(a, b) = OT(a, b) - OT(a, a) / 2 - OT(b, b) / 2
///
/// the self terms cancel the entropic bias, so S(a, a) vanishes up to
/// iteration residual and rankings by S behave like rankings by true
/// Wasserstein distance. requires a square ground cost since both
/// marginals must live on comparable supports.
pub fn sinkhorn_divergence_symmetric(
    a: &Distribution,
    b: &Distribution,
    cost: &CostMatrix,
    epsilon: Energy,
) -> Result<f64, InputError> {
    if cost.rows() != cost.cols() {
        return Err(InputError::DimensionMismatch {
            rows: cost.rows(),
            cols: cost.cols(),
            len: cost.rows(),
        });
    }
    let config = SinkhornConfig::from(epsilon);
    let ab = transport(a, b, cost, config)?.cost;
    let aa = transport(a, a, cost, config)?.cost;
    let bb = transport(b, b, cost, config)?.cost;
    Ok(ab - aa / 2. - bb / 2.)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Matrix;
    use crate::Arbitrary;

    fn absolute(n: usize) -> CostMatrix {
        CostMatrix::new(Matrix::from_fn(n, n, |i, j| {
            (i as f64 - j as f64).abs() / n as f64
        }))
        .expect("valid cost")
    }

    #[test]
    fn self_divergence_vanishes() {
        let a = Distribution::random();
        let cost = absolute(a.len());
        let s = sinkhorn_divergence_symmetric(&a, &a, &cost, 0.05).expect("well-formed inputs");
        assert!(s.abs() < 0.05, "{}", s);
    }

    #[test]
    fn divergence_is_empirically_nonnegative() {
        for _ in 0..8 {
            let a = Distribution::random();
            let raw = (0..a.len()).map(|_| rand::random::<f64>()).collect::<Vec<_>>();
            let b = Distribution::new(crate::numeric::normalize(&raw)).expect("valid");
            let cost = absolute(a.len());
            let s = sinkhorn_divergence_symmetric(&a, &b, &cost, 0.05).expect("well-formed inputs");
            assert!(s > -0.05, "{}", s);
        }
    }

    #[test]
    fn separated_masses_diverge_more() {
        let a = Distribution::new(vec![1., 0., 0., 0.]).expect("valid");
        let near = Distribution::new(vec![0., 1., 0., 0.]).expect("valid");
        let far = Distribution::new(vec![0., 0., 0., 1.]).expect("valid");
        let cost = absolute(4);
        let s_near = sinkhorn_divergence_symmetric(&a, &near, &cost, 0.05).expect("valid");
        let s_far = sinkhorn_divergence_symmetric(&a, &far, &cost, 0.05).expect("valid");
        assert!(s_far > s_near, "{} > {}", s_far, s_near);
    }
}
