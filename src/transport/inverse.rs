use super::cost::CostMatrix;
use super::distribution::Distribution;
use super::logdomain::transport;
use super::matching::build_cost_matrix;
use super::matching::Event;
use super::matching::FeatureWeights;
use super::matching::Venue;
use super::result::SinkhornConfig;
use crate::error::InputError;
use crate::numeric::Matrix;
use crate::Energy;
use serde::Deserialize;
use serde::Serialize;

/// one observed booking decision between an event and a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching {
    pub event: usize,
    pub venue: usize,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    pub learning_rate: f64,
    pub iterations: usize,
    pub epsilon: Energy,
    pub gradient_step: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: crate::LEARNING_RATE,
            iterations: crate::LEARNING_ITERATIONS,
            epsilon: crate::LEARNING_EPSILON,
            gradient_step: crate::LEARNING_GRADIENT_STEP,
        }
    }
}

/// empirical plan implied by observed matchings. successes weigh full,
/// failures weigh a tenth, rows are normalized, and events that were
/// never observed get a noncommittal uniform row.
fn observed_plan(matchings: &[Matching], n: usize, m: usize) -> Result<Matrix, InputError> {
    let mut plan = Matrix::zeros(n, m);
    for (index, matching) in matchings.iter().enumerate() {
        if matching.event >= n || matching.venue >= m {
            return Err(InputError::IndexOutOfRange { index });
        }
        let weight = match matching.success {
            true => crate::MATCH_SUCCESS_WEIGHT,
            false => crate::MATCH_FAILURE_WEIGHT,
        };
        let prior = plan.get(matching.event, matching.venue);
        plan.set(matching.event, matching.venue, prior + weight);
    }
    for i in 0..n {
        let mass = plan.row(i).iter().sum::<f64>();
        match mass > 0. {
            true => (0..m).for_each(|j| plan.set(i, j, plan.get(i, j) / mass)),
            false => (0..m).for_each(|j| plan.set(i, j, 1. / m as f64)),
        }
    }
    Ok(plan)
}

/// plan predicted by entropic transport under candidate feature weights
fn predicted_plan(
    weights: FeatureWeights,
    events: &[Event],
    venues: &[Venue],
    epsilon: Energy,
) -> Result<Matrix, InputError> {
    let cost = CostMatrix::new(build_cost_matrix(events, venues, weights)?)?;
    let a = Distribution::uniform(events.len());
    let b = Distribution::uniform(venues.len());
    Ok(transport(&a, &b, &cost, SinkhornConfig::from(epsilon))?.plan)
}

/// squared frobenius distance between predicted and observed plans
fn loss(
    weights: FeatureWeights,
    observed: &Matrix,
    events: &[Event],
    venues: &[Venue],
    epsilon: Energy,
) -> Result<f64, InputError> {
    let predicted = predicted_plan(weights, events, venues, epsilon)?;
    Ok(predicted
        .data()
        .iter()
        .zip(observed.data())
        .map(|(p, o)| (p - o) * (p - o))
        .sum())
}

/// recover feature weights that explain observed matchings, by gradient
/// descent on the plan-fitting loss with central finite differences.
pub fn learn_cost_weights(
    matchings: &[Matching],
    events: &[Event],
    venues: &[Venue],
    init: Option<FeatureWeights>,
    config: LearningConfig,
) -> Result<FeatureWeights, InputError> {
    if events.is_empty() || venues.is_empty() {
        return Err(InputError::EmptyDistribution);
    }
    let observed = observed_plan(matchings, events.len(), venues.len())?;
    let h = config.gradient_step;
    let mut weights = init.unwrap_or_default().renormalized();
    for round in 0..config.iterations {
        let mut gradient = [0.; 4];
        for k in 0..4 {
            let mut plus = weights.to_vec();
            let mut minus = weights.to_vec();
            plus[k] += h;
            minus[k] -= h;
            let above = loss(FeatureWeights::from(plus), &observed, events, venues, config.epsilon)?;
            let below = loss(FeatureWeights::from(minus), &observed, events, venues, config.epsilon)?;
            gradient[k] = (above - below) / (2. * h);
        }
        let step = weights
            .to_vec()
            .iter()
            .zip(gradient.iter())
            .map(|(w, g)| w - config.learning_rate * g)
            .collect::<Vec<_>>();
        weights = FeatureWeights::from([step[0], step[1], step[2], step[3]]).renormalized();
        if round % 20 == 19 {
            log::debug!(
                "{:<32}{:?}",
                format!("inverse OT round {}", round + 1),
                weights
            );
        }
    }
    Ok(weights)
}

/// how well candidate weights explain the observations, squashed into
/// (0, 1] so hosts can show it as a quality figure.
pub fn evaluate_weights(
    weights: FeatureWeights,
    matchings: &[Matching],
    events: &[Event],
    venues: &[Venue],
    config: LearningConfig,
) -> Result<f64, InputError> {
    if events.is_empty() || venues.is_empty() {
        return Err(InputError::EmptyDistribution);
    }
    let observed = observed_plan(matchings, events.len(), venues.len())?;
    let l = loss(weights, &observed, events, venues, config.epsilon)?;
    Ok((-l * events.len() as f64 * venues.len() as f64).exp())
}
