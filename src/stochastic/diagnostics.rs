use crate::numeric::euclidean;
use crate::Energy;

/// mean pairwise L2 distance between sampled states. zero when there
/// is nothing to compare.
pub fn layout_diversity(samples: &[Vec<f64>]) -> f64 {
    let n = samples.len();
    if n < 2 {
        return 0.;
    }
    let row = |i: usize| {
        (i + 1..n)
            .map(|j| euclidean(&samples[i], &samples[j]))
            .sum::<f64>()
    };
    // the parallel path collects per-row partials in index order and
    // folds them sequentially, so both paths sum identically
    #[cfg(feature = "parallel")]
    let partials = {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(row).collect::<Vec<_>>()
    };
    #[cfg(not(feature = "parallel"))]
    let partials = (0..n).map(row).collect::<Vec<_>>();
    let pairs = n * (n - 1) / 2;
    partials.iter().sum::<f64>() / pairs as f64
}

/// effective sample size from the energy trace:
///
///   n / (1 + 2 sum rho_k)
///
/// with empirical autocorrelations truncated at the first rho_k below
/// 0.05. degenerate traces (too short, or zero variance) count every
/// sample as independent.
pub fn effective_sample_size(energies: &[Energy]) -> f64 {
    let n = energies.len();
    if n < 4 {
        return n as f64;
    }
    let mean = energies.iter().sum::<f64>() / n as f64;
    let variance = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n as f64;
    if variance <= 0. {
        return n as f64;
    }
    let mut tail = 0.;
    for k in 1..n / 2 {
        let rho = (0..n - k)
            .map(|i| (energies[i] - mean) * (energies[i + k] - mean))
            .sum::<f64>()
            / ((n - k) as f64 * variance);
        if rho < 0.05 {
            break;
        }
        tail += rho;
    }
    (n as f64 / (1. + 2. * tail)).clamp(1., n as f64)
}
