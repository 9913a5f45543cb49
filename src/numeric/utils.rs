//! small float kernels shared by every solver in the crate.

/// max-shifted log-sum-exp
pub fn logsumexp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    max + xs.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}

/// numerically stable softmax
pub fn softmax(xs: &[f64]) -> Vec<f64> {
    let lse = logsumexp(xs);
    xs.iter().map(|x| (x - lse).exp()).collect()
}

/// project onto the probability simplex: floor negatives at zero, divide by L1 mass
pub fn normalize(xs: &[f64]) -> Vec<f64> {
    let floored = xs.iter().map(|x| x.max(0.)).collect::<Vec<_>>();
    let mass = floored.iter().sum::<f64>();
    match mass > 0. {
        true => floored.iter().map(|x| x / mass).collect(),
        false => vec![1. / xs.len() as f64; xs.len()],
    }
}

/// rescale into [0, 1]. a constant input maps to all zeros.
pub fn minmax(xs: &[f64]) -> Vec<f64> {
    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    match hi - lo > 0. {
        true => xs.iter().map(|x| (x - lo) / (hi - lo)).collect(),
        false => vec![0.; xs.len()],
    }
}

pub fn l1(xs: &[f64]) -> f64 {
    xs.iter().map(|x| x.abs()).sum()
}

pub fn l2(xs: &[f64]) -> f64 {
    xs.iter().map(|x| x * x).sum::<f64>().sqrt()
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// median by sorting a copy. even lengths average the middle pair.
pub fn median(xs: &[f64]) -> f64 {
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
    let n = sorted.len();
    match n {
        0 => 0.,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logsumexp_shifts_without_overflow() {
        let xs = [1000., 1000.];
        assert!((logsumexp(&xs) - (1000. + 2f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[1., 2., 3., 4.]);
        assert!((p.iter().sum::<f64>() - 1.).abs() < 1e-12);
        assert!(p.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn normalize_floors_negatives() {
        let p = normalize(&[-1., 1., 3.]);
        assert!(p[0] == 0.);
        assert!((p.iter().sum::<f64>() - 1.).abs() < 1e-12);
    }

    #[test]
    fn normalize_of_zeros_is_uniform() {
        let p = normalize(&[0., 0., 0., 0.]);
        assert!(p.iter().all(|&x| x == 0.25));
    }

    #[test]
    fn minmax_of_constant_is_zero() {
        assert!(minmax(&[5., 5., 5.]).iter().all(|&x| x == 0.));
        let scaled = minmax(&[1., 2., 3.]);
        assert!(scaled == vec![0., 0.5, 1.]);
    }

    #[test]
    fn median_even_and_odd() {
        assert!(median(&[3., 1., 2.]) == 2.);
        assert!(median(&[4., 1., 2., 3.]) == 2.5);
    }
}
