use super::metropolis::Sampled;
use crate::numeric::Mulberry32;
use crate::Energy;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HmcConfig {
    pub samples: usize,
    pub burn_in: usize,
    pub leapfrog_steps: usize,
    pub step_size: f64,
    /// finite-difference step for the energy gradient
    pub gradient_step: f64,
    pub seed: u32,
}

impl Default for HmcConfig {
    fn default() -> Self {
        Self {
            samples: 100,
            burn_in: 50,
            leapfrog_steps: 10,
            step_size: 0.1,
            gradient_step: 1e-5,
            seed: crate::DEFAULT_SEED,
        }
    }
}

/// central finite differences; the energy is a black box here
fn gradient(energy: &impl Fn(&[f64]) -> Energy, x: &[f64], h: f64) -> Vec<f64> {
    let mut grad = vec![0.; x.len()];
    let mut probe = x.to_vec();
    for i in 0..x.len() {
        probe[i] = x[i] + h;
        let above = energy(&probe);
        probe[i] = x[i] - h;
        let below = energy(&probe);
        probe[i] = x[i];
        grad[i] = (above - below) / (2. * h);
    }
    grad
}

/// hamiltonian monte carlo with a black-box energy.
///
/// momenta are standard normal, trajectories are leapfrog-integrated
/// with finite-difference gradients, and the accept test is on the
/// joint hamiltonian, so integration error turns into rejection
/// instead of bias.
pub fn sample_layouts_hmc(
    initial: &[f64],
    config: HmcConfig,
    energy: impl Fn(&[f64]) -> Energy,
) -> Sampled {
    let mut rng = Mulberry32::from(config.seed);
    let h = config.gradient_step;
    let mut current = initial.to_vec();
    let mut current_energy = energy(&current);
    let mut samples = vec![];
    let mut energies = vec![];
    let mut accepted = 0usize;
    let total = config.burn_in + config.samples;
    for step in 0..total {
        let momentum = (0..current.len())
            .map(|_| rng.gaussian())
            .collect::<Vec<_>>();
        let kinetic = momentum.iter().map(|p| p * p / 2.).sum::<f64>();
        let hamiltonian = current_energy + kinetic;

        let mut x = current.clone();
        let mut p = momentum;
        let mut grad = gradient(&energy, &x, h);
        for _ in 0..config.leapfrog_steps {
            for i in 0..x.len() {
                p[i] -= config.step_size / 2. * grad[i];
                x[i] += config.step_size * p[i];
            }
            grad = gradient(&energy, &x, h);
            for i in 0..x.len() {
                p[i] -= config.step_size / 2. * grad[i];
            }
        }
        let trial_energy = energy(&x);
        let trial_kinetic = p.iter().map(|p| p * p / 2.).sum::<f64>();
        let trial_hamiltonian = trial_energy + trial_kinetic;
        if rng.chance((hamiltonian - trial_hamiltonian).exp().min(1.)) {
            current = x;
            current_energy = trial_energy;
            accepted += 1;
        }
        if step >= config.burn_in {
            samples.push(current.clone());
            energies.push(current_energy);
        }
    }
    log::debug!(
        "{:<32}{} of {} accepted",
        "hmc sampling done",
        accepted,
        total
    );
    Sampled {
        samples,
        energies,
        acceptance_rate: match total {
            0 => 0.,
            _ => accepted as f64 / total as f64,
        },
        accepted,
        proposed: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian_well(x: &[f64]) -> f64 {
        x.iter().map(|v| v * v / 2.).sum()
    }

    #[test]
    fn gradients_match_the_analytic_well() {
        let g = gradient(&gaussian_well, &[1., -2.], 1e-5);
        assert!((g[0] - 1.).abs() < 1e-6);
        assert!((g[1] + 2.).abs() < 1e-6);
    }

    #[test]
    fn well_tuned_chain_accepts_most_proposals() {
        let out = sample_layouts_hmc(&[0.5, -0.5], HmcConfig::default(), gaussian_well);
        assert!(out.acceptance_rate > 0.8, "{}", out.acceptance_rate);
        assert!(out.samples.len() == 100);
    }

    #[test]
    fn samples_concentrate_near_the_mode() {
        let config = HmcConfig {
            samples: 300,
            ..HmcConfig::default()
        };
        let out = sample_layouts_hmc(&[3.], config, gaussian_well);
        let mean = out.samples.iter().map(|s| s[0]).sum::<f64>() / out.samples.len() as f64;
        assert!(mean.abs() < 0.5, "{}", mean);
        let spread = out
            .samples
            .iter()
            .map(|s| (s[0] - mean).powi(2))
            .sum::<f64>()
            / out.samples.len() as f64;
        assert!(spread > 0.3, "chain should actually move, var {spread}");
    }

    #[test]
    fn deterministic_per_seed() {
        let one = sample_layouts_hmc(&[1.], HmcConfig::default(), gaussian_well);
        let two = sample_layouts_hmc(&[1.], HmcConfig::default(), gaussian_well);
        assert!(one == two);
    }
}
