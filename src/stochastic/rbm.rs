use crate::numeric::Matrix;
use crate::numeric::Mulberry32;
use crate::Energy;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RbmConfig {
    pub visible: usize,
    pub hidden: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    /// gibbs steps per contrastive divergence update
    pub cd_steps: usize,
    pub seed: u32,
}

impl Default for RbmConfig {
    fn default() -> Self {
        Self {
            visible: 16,
            hidden: 8,
            learning_rate: 0.1,
            momentum: 0.5,
            weight_decay: 1e-4,
            cd_steps: 1,
            seed: crate::DEFAULT_SEED,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1. / (1. + (-x).exp())
}

/// restricted boltzmann machine over binary layout features,
/// trained by CD-k with momentum and weight decay.
#[derive(Debug, Clone, PartialEq)]
pub struct Rbm {
    config: RbmConfig,
    /// visible x hidden
    weights: Matrix,
    visible_bias: Vec<f64>,
    hidden_bias: Vec<f64>,
    weight_velocity: Matrix,
    visible_velocity: Vec<f64>,
    hidden_velocity: Vec<f64>,
    rng: Mulberry32,
}

impl From<RbmConfig> for Rbm {
    fn from(config: RbmConfig) -> Self {
        let mut rng = Mulberry32::from(config.seed);
        let weights = Matrix::from_fn(config.visible, config.hidden, |_, _| 0.01 * rng.gaussian());
        Self {
            weights,
            visible_bias: vec![0.; config.visible],
            hidden_bias: vec![0.; config.hidden],
            weight_velocity: Matrix::zeros(config.visible, config.hidden),
            visible_velocity: vec![0.; config.visible],
            hidden_velocity: vec![0.; config.hidden],
            rng,
            config,
        }
    }
}

impl Rbm {
    /// p(h | v) = sigma(W'v + c)
    pub fn hidden_probabilities(&self, visible: &[f64]) -> Vec<f64> {
        (0..self.config.hidden)
            .map(|j| {
                let drive = (0..self.config.visible)
                    .map(|i| self.weights.get(i, j) * visible[i])
                    .sum::<f64>();
                sigmoid(drive + self.hidden_bias[j])
            })
            .collect()
    }

    /// p(v | h) = sigma(W h + b)
    pub fn visible_probabilities(&self, hidden: &[f64]) -> Vec<f64> {
        (0..self.config.visible)
            .map(|i| {
                let drive = (0..self.config.hidden)
                    .map(|j| self.weights.get(i, j) * hidden[j])
                    .sum::<f64>();
                sigmoid(drive + self.visible_bias[i])
            })
            .collect()
    }

    fn bernoulli(&mut self, probabilities: &[f64]) -> Vec<f64> {
        probabilities
            .iter()
            .map(|&p| self.rng.chance(p) as usize as f64)
            .collect()
    }

    /// one mean-field up-down pass
    pub fn reconstruct(&self, visible: &[f64]) -> Vec<f64> {
        self.visible_probabilities(&self.hidden_probabilities(visible))
    }

    /// F(v) = -b'v - sum_j log(1 + exp((W'v + c)_j))
    pub fn free_energy(&self, visible: &[f64]) -> Energy {
        let bias = visible
            .iter()
            .zip(self.visible_bias.iter())
            .map(|(v, b)| v * b)
            .sum::<f64>();
        let hidden = (0..self.config.hidden)
            .map(|j| {
                let drive = (0..self.config.visible)
                    .map(|i| self.weights.get(i, j) * visible[i])
                    .sum::<f64>()
                    + self.hidden_bias[j];
                // softplus without overflow
                drive.max(0.) + (-(drive.abs())).exp().ln_1p()
            })
            .sum::<f64>();
        -bias - hidden
    }

    /// one CD-k sweep over the batch; returns mean reconstruction error
    pub fn train_cd(&mut self, batch: &[Vec<f64>]) -> f64 {
        if batch.is_empty() {
            return 0.;
        }
        let v = self.config.visible;
        let h = self.config.hidden;
        let mut weight_grad = Matrix::zeros(v, h);
        let mut visible_grad = vec![0.; v];
        let mut hidden_grad = vec![0.; h];
        let mut error = 0.;
        for sample in batch {
            let positive_h = self.hidden_probabilities(sample);
            let mut fantasy_h = self.bernoulli(&positive_h);
            let mut fantasy_v = sample.clone();
            for _ in 0..self.config.cd_steps.max(1) {
                fantasy_v = self.visible_probabilities(&fantasy_h);
                let probabilities = self.hidden_probabilities(&fantasy_v);
                fantasy_h = self.bernoulli(&probabilities);
            }
            let negative_h = self.hidden_probabilities(&fantasy_v);
            for i in 0..v {
                for j in 0..h {
                    let delta = sample[i] * positive_h[j] - fantasy_v[i] * negative_h[j];
                    weight_grad.set(i, j, weight_grad.get(i, j) + delta);
                }
                visible_grad[i] += sample[i] - fantasy_v[i];
            }
            for j in 0..h {
                hidden_grad[j] += positive_h[j] - negative_h[j];
            }
            error += sample
                .iter()
                .zip(fantasy_v.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>();
        }
        let scale = self.config.learning_rate / batch.len() as f64;
        for i in 0..v {
            for j in 0..h {
                let step = scale * weight_grad.get(i, j)
                    - self.config.learning_rate * self.config.weight_decay * self.weights.get(i, j)
                    + self.config.momentum * self.weight_velocity.get(i, j);
                self.weight_velocity.set(i, j, step);
                self.weights.set(i, j, self.weights.get(i, j) + step);
            }
            let step = scale * visible_grad[i] + self.config.momentum * self.visible_velocity[i];
            self.visible_velocity[i] = step;
            self.visible_bias[i] += step;
        }
        for j in 0..h {
            let step = scale * hidden_grad[j] + self.config.momentum * self.hidden_velocity[j];
            self.hidden_velocity[j] = step;
            self.hidden_bias[j] += step;
        }
        error / batch.len() as f64
    }

    /// run a gibbs chain from uniform noise and return the settled
    /// visible probabilities
    pub fn sample(&mut self, steps: usize) -> Vec<f64> {
        let start = (0..self.config.visible)
            .map(|_| self.rng.chance(0.5) as usize as f64)
            .collect::<Vec<_>>();
        let mut visible = start;
        for _ in 0..steps.max(1) {
            let hidden = self.hidden_probabilities(&visible);
            let hidden = self.bernoulli(&hidden);
            let probabilities = self.visible_probabilities(&hidden);
            visible = self.bernoulli(&probabilities);
        }
        let hidden = self.hidden_probabilities(&visible);
        let hidden = self.bernoulli(&hidden);
        self.visible_probabilities(&hidden)
    }

    /// weights leave as copies, never as views into the machine
    pub fn weights(&self) -> (Matrix, Vec<f64>, Vec<f64>) {
        (
            self.weights.clone(),
            self.visible_bias.clone(),
            self.hidden_bias.clone(),
        )
    }
    pub fn set_weights(&mut self, weights: Matrix, visible_bias: Vec<f64>, hidden_bias: Vec<f64>) {
        assert!(weights.rows() == self.config.visible, "shape mismatch");
        assert!(weights.cols() == self.config.hidden, "shape mismatch");
        self.weights = weights;
        self.visible_bias = visible_bias;
        self.hidden_bias = hidden_bias;
    }
}
