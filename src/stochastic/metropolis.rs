use crate::numeric::Mulberry32;
use crate::Energy;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McmcConfig {
    pub temperature: Energy,
    pub samples: usize,
    pub burn_in: usize,
    /// record every k-th state after burn-in
    pub thin: usize,
    pub seed: u32,
}

impl Default for McmcConfig {
    fn default() -> Self {
        Self {
            temperature: 1.,
            samples: 100,
            burn_in: 100,
            thin: 5,
            seed: crate::DEFAULT_SEED,
        }
    }
}

/// what a sampling run hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampled {
    pub samples: Vec<Vec<f64>>,
    pub energies: Vec<Energy>,
    pub acceptance_rate: f64,
    pub accepted: usize,
    pub proposed: usize,
}

/// metropolis-hastings over layout states.
///
/// the chain records its current state every k-th step after burn-in
/// whether the latest proposal was accepted or not; thinning is about
/// decorrelation, not about cherry-picking successes.
pub fn sample_layouts_mh(
    initial: &[f64],
    config: McmcConfig,
    energy: impl Fn(&[f64]) -> Energy,
    neighbor: impl Fn(&[f64], &mut Mulberry32) -> Vec<f64>,
) -> Sampled {
    let mut rng = Mulberry32::from(config.seed);
    let thin = config.thin.max(1);
    let mut current = initial.to_vec();
    let mut current_energy = energy(&current);
    let mut samples = vec![];
    let mut energies = vec![];
    let mut accepted = 0usize;
    let total = config.burn_in + thin * config.samples;
    for step in 0..total {
        let proposal = neighbor(&current, &mut rng);
        let proposal_energy = energy(&proposal);
        let delta = proposal_energy - current_energy;
        if delta <= 0. || rng.chance((-delta / config.temperature.max(1e-12)).exp()) {
            current = proposal;
            current_energy = proposal_energy;
            accepted += 1;
        }
        let past_burn_in = step >= config.burn_in;
        if past_burn_in && (step - config.burn_in) % thin == thin - 1 {
            samples.push(current.clone());
            energies.push(current_energy);
        }
    }
    log::debug!(
        "{:<32}{} of {} accepted",
        "mh sampling done",
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
