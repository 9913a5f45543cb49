use crate::numeric::Matrix;
use crate::numeric::Mulberry32;
use crate::Energy;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CmaesConfig {
    /// initial step size
    pub sigma: f64,
    pub max_evaluations: usize,
    /// offspring per generation; zero means the standard 4 + 3 ln n
    pub population: usize,
    pub seed: u32,
}

impl Default for CmaesConfig {
    fn default() -> Self {
        Self {
            sigma: 0.5,
            max_evaluations: 2000,
            population: 0,
            seed: crate::DEFAULT_SEED,
        }
    }
}

/// box constraints on the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// reflect off the walls instead of clamping onto them
    pub reflect: bool,
}

impl Bounds {
    fn clip(&self, x: &mut [f64]) {
        for (i, xi) in x.iter_mut().enumerate() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            if *xi < lo {
                *xi = match self.reflect {
                    true => (2. * lo - *xi).min(hi),
                    false => lo,
                };
            } else if *xi > hi {
                *xi = match self.reflect {
                    true => (2. * hi - *xi).max(lo),
                    false => hi,
                };
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmaesResult {
    pub best_state: Vec<f64>,
    pub best_energy: Energy,
    pub evaluations: usize,
}

/// covariance matrix adaptation, the standard rank-one plus rank-mu
/// flavor. the covariance is re-eigendecomposed each generation; for
/// the dimensions layouts need that cost is noise.
struct Cmaes<'a, F: Fn(&[f64]) -> Energy> {
    energy: F,
    bounds: Option<&'a Bounds>,
    rng: Mulberry32,
    n: usize,
    lambda: usize,
    mu: usize,
    weights: Vec<f64>,
    mu_eff: f64,
    c_sigma: f64,
    d_sigma: f64,
    c_c: f64,
    c_1: f64,
    c_mu: f64,
    chi_n: f64,
    mean: Vec<f64>,
    sigma: f64,
    covariance: Matrix,
    path_sigma: Vec<f64>,
    path_c: Vec<f64>,
    generation: usize,
    evaluations: usize,
    budget: usize,
    best: (Vec<f64>, Energy),
}

impl<'a, F: Fn(&[f64]) -> Energy> Cmaes<'a, F> {
    fn new(initial: &[f64], config: CmaesConfig, energy: F, bounds: Option<&'a Bounds>) -> Self {
        let n = initial.len();
        let lambda = match config.population {
            0 => 4 + (3. * (n as f64).ln()).floor() as usize,
            given => given,
        };
        let mu = lambda / 2;
        let raw = (0..mu)
            .map(|i| ((mu as f64) + 0.5).ln() - ((i + 1) as f64).ln())
            .collect::<Vec<_>>();
        let total = raw.iter().sum::<f64>();
        let weights = raw.iter().map(|w| w / total).collect::<Vec<_>>();
        let mu_eff = 1. / weights.iter().map(|w| w * w).sum::<f64>();
        let nf = n as f64;
        let c_sigma = (mu_eff + 2.) / (nf + mu_eff + 5.);
        let d_sigma = 1. + 2. * (((mu_eff - 1.) / (nf + 1.)).sqrt() - 1.).max(0.) + c_sigma;
        let c_c = (4. + mu_eff / nf) / (nf + 4. + 2. * mu_eff / nf);
        let c_1 = 2. / ((nf + 1.3).powi(2) + mu_eff);
        let c_mu = (1. - c_1)
            .min(2. * (mu_eff - 2. + 1. / mu_eff) / ((nf + 2.).powi(2) + mu_eff));
        let chi_n = nf.sqrt() * (1. - 1. / (4. * nf) + 1. / (21. * nf * nf));
        let initial_energy = energy(initial);
        Self {
            rng: Mulberry32::from(config.seed),
            bounds,
            n,
            lambda,
            mu,
            weights,
            mu_eff,
            c_sigma,
            d_sigma,
            c_c,
            c_1,
            c_mu,
            chi_n,
            mean: initial.to_vec(),
            sigma: config.sigma,
            covariance: Matrix::from_fn(n, n, |i, j| (i == j) as usize as f64),
            path_sigma: vec![0.; n],
            path_c: vec![0.; n],
            generation: 0,
            evaluations: 1,
            budget: config.max_evaluations,
            best: (initial.to_vec(), initial_energy),
            energy,
        }
    }

    fn minimize(mut self) -> Self {
        while self.evaluations < self.budget {
            self.generation += 1;
            let (values, vectors) = jacobi(&self.covariance);
            let scales = values.iter().map(|v| v.max(1e-20).sqrt()).collect::<Vec<_>>();
            let mut offspring = vec![];
            for _ in 0..self.lambda {
                if self.evaluations >= self.budget {
                    break;
                }
                let z = (0..self.n).map(|_| self.rng.gaussian()).collect::<Vec<_>>();
                let mut x = self.mean.clone();
                for i in 0..self.n {
                    let step = (0..self.n)
                        .map(|j| vectors.get(i, j) * scales[j] * z[j])
                        .sum::<f64>();
                    x[i] += self.sigma * step;
                }
                if let Some(bounds) = self.bounds {
                    bounds.clip(&mut x);
                }
                let e = (self.energy)(&x);
                self.evaluations += 1;
                if e < self.best.1 {
                    self.best = (x.clone(), e);
                }
                offspring.push((x, e));
            }
            if offspring.len() < self.mu {
                break;
            }
            offspring.sort_by(|a, b| a.1.partial_cmp(&b.1).expect("finite energies"));
            self.adapt(&offspring, &values, &vectors);
        }
        self
    }

    /// mean, paths, covariance, and step updates from the ranked brood
    fn adapt(&mut self, offspring: &[(Vec<f64>, Energy)], values: &[f64], vectors: &Matrix) {
        let old_mean = self.mean.clone();
        self.mean = vec![0.; self.n];
        for (w, (x, _)) in self.weights.iter().zip(offspring.iter()) {
            for i in 0..self.n {
                self.mean[i] += w * x[i];
            }
        }
        let shift = (0..self.n)
            .map(|i| (self.mean[i] - old_mean[i]) / self.sigma)
            .collect::<Vec<_>>();

        // whitened shift through C^(-1/2) = B D^(-1) B'
        let mut whitened = vec![0.; self.n];
        for i in 0..self.n {
            let mut back = 0.;
            for j in 0..self.n {
                let projected = (0..self.n)
                    .map(|k| vectors.get(k, j) * shift[k])
                    .sum::<f64>();
                back += vectors.get(i, j) * projected / values[j].max(1e-20).sqrt();
            }
            whitened[i] = back;
        }
        let cs = self.c_sigma;
        for i in 0..self.n {
            self.path_sigma[i] = (1. - cs) * self.path_sigma[i]
                + (cs * (2. - cs) * self.mu_eff).sqrt() * whitened[i];
        }
        let norm = self.path_sigma.iter().map(|p| p * p).sum::<f64>().sqrt();
        let drift = 1. - (1. - cs).powi(2 * self.generation as i32);
        let steady = norm / drift.max(1e-12).sqrt() / self.chi_n < 1.4 + 2. / (self.n as f64 + 1.);
        let h = steady as usize as f64;

        let cc = self.c_c;
        for i in 0..self.n {
            self.path_c[i] =
                (1. - cc) * self.path_c[i] + h * (cc * (2. - cc) * self.mu_eff).sqrt() * shift[i];
        }

        let decay = 1. - self.c_1 - self.c_mu;
        let bump = (1. - h) * cc * (2. - cc);
        let mut next = Matrix::zeros(self.n, self.n);
        for i in 0..self.n {
            for j in 0..self.n {
                let mut value = decay * self.covariance.get(i, j)
                    + self.c_1
                        * (self.path_c[i] * self.path_c[j] + bump * self.covariance.get(i, j));
                for (w, (x, _)) in self.weights.iter().zip(offspring.iter()) {
                    let yi = (x[i] - old_mean[i]) / self.sigma;
                    let yj = (x[j] - old_mean[j]) / self.sigma;
                    value += self.c_mu * w * yi * yj;
                }
                next.set(i, j, value);
            }
        }
        self.covariance = next;
        self.sigma *= ((cs / self.d_sigma) * (norm / self.chi_n - 1.)).exp();
    }
}

/// minimize an energy from an initial point. deterministic per seed;
/// the best point ever evaluated is returned, so the result can never
/// be worse than the start.
pub fn cmaes(
    initial: &[f64],
    config: CmaesConfig,
    energy: impl Fn(&[f64]) -> Energy,
    bounds: Option<&Bounds>,
) -> CmaesResult {
    let solver = Cmaes::new(initial, config, energy, bounds).minimize();
    log::debug!(
        "{:<32}{:.3e} after {} evaluations",
        "cmaes finished",
        solver.best.1,
        solver.evaluations
    );
    CmaesResult {
        best_state: solver.best.0,
        best_energy: solver.best.1,
        evaluations: solver.evaluations,
    }
}

/// cyclic Jacobi eigendecomposition of a symmetric matrix.
/// returns eigenvalues and the orthonormal eigenvectors as columns.
fn jacobi(matrix: &Matrix) -> (Vec<f64>, Matrix) {
    let n = matrix.rows();
    let mut a = matrix.clone();
    let mut v = Matrix::from_fn(n, n, |i, j| (i == j) as usize as f64);
    for _ in 0..64 {
        let off = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .filter(|(i, j)| i != j)
            .map(|(i, j)| a.get(i, j).powi(2))
            .sum::<f64>();
        if off < 1e-22 {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a.get(p, q);
                if apq.abs() < 1e-300 {
                    continue;
                }
                let theta = (a.get(q, q) - a.get(p, p)) / (2. * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.).sqrt());
                let c = 1. / (t * t + 1.).sqrt();
                let s = t * c;
                for k in 0..n {
                    let akp = a.get(k, p);
                    let akq = a.get(k, q);
                    a.set(k, p, c * akp - s * akq);
                    a.set(k, q, s * akp + c * akq);
                }
                for k in 0..n {
                    let apk = a.get(p, k);
                    let aqk = a.get(q, k);
                    a.set(p, k, c * apk - s * aqk);
                    a.set(q, k, s * apk + c * aqk);
                }
                for k in 0..n {
                    let vkp = v.get(k, p);
                    let vkq = v.get(k, q);
                    v.set(k, p, c * vkp - s * vkq);
                    v.set(k, q, s * vkp + c * vkq);
                }
            }
        }
    }
    ((0..n).map(|i| a.get(i, i)).collect(), v)
}
