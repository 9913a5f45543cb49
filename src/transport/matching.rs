use crate::error::InputError;
use crate::numeric::minmax;
use crate::numeric::Matrix;
use serde::Deserialize;
use serde::Serialize;

/// mean Earth radius in kilometers
const EARTH_RADIUS: f64 = 6371.;

/// demand side of the matching problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub guests: f64,
    pub budget: f64,
    pub amenities: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// supply side of the matching problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub capacity: f64,
    pub price: f64,
    pub amenities: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// convex combination over the four feature distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub capacity: f64,
    pub price: f64,
    pub amenity: f64,
    pub location: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            capacity: 0.25,
            price: 0.25,
            amenity: 0.25,
            location: 0.25,
        }
    }
}

impl FeatureWeights {
    pub fn to_vec(self) -> [f64; 4] {
        [self.capacity, self.price, self.amenity, self.location]
    }
    /// clamp each weight into [0.01, 1] and rescale to sum one
    pub fn renormalized(self) -> Self {
        let clamped = self.to_vec().map(|w| w.clamp(0.01, 1.));
        let total = clamped.iter().sum::<f64>();
        Self::from(clamped.map(|w| w / total))
    }
}

impl From<[f64; 4]> for FeatureWeights {
    fn from([capacity, price, amenity, location]: [f64; 4]) -> Self {
        Self {
            capacity,
            price,
            amenity,
            location,
        }
    }
}

/// undersized venues hurt twice as fast as oversized ones waste
fn capacity_distance(event: &Event, venue: &Venue) -> f64 {
    let guests = event.guests.max(1.);
    match venue.capacity < event.guests {
        true => 2.0 * (event.guests - venue.capacity) / guests,
        false => 0.3 * (venue.capacity - event.guests) / guests,
    }
}

/// over-budget venues are capped at 3x so one outlier cannot dominate
fn price_distance(event: &Event, venue: &Venue) -> f64 {
    let budget = event.budget.max(crate::DIVISION_FLOOR);
    match venue.price > event.budget {
        true => (1.5 * (venue.price - event.budget) / budget).min(3.0),
        false => 0.1 * (event.budget - venue.price) / budget,
    }
}

/// fraction of required amenities the venue lacks; extras are free
fn amenity_distance(event: &Event, venue: &Venue) -> f64 {
    match event.amenities.is_empty() {
        true => 0.,
        false => {
            let missing = event
                .amenities
                .iter()
                .filter(|required| !venue.amenities.contains(required))
                .count();
            missing as f64 / event.amenities.len() as f64
        }
    }
}

/// great-circle distance in kilometers
fn location_distance(event: &Event, venue: &Venue) -> f64 {
    let phi1 = event.latitude.to_radians();
    let phi2 = venue.latitude.to_radians();
    let dphi = (venue.latitude - event.latitude).to_radians();
    let dlambda = (venue.longitude - event.longitude).to_radians();
    let a = (dphi / 2.).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.).sin().powi(2);
    2. * EARTH_RADIUS * a.sqrt().atan2((1. - a).sqrt())
}

/// heterogeneous ground cost between events and venues.
///
/// each of the four feature distances is min-max normalized over the
/// whole matrix before the weighted sum, so no single unit system
/// dominates the blend.
pub fn build_cost_matrix(
    events: &[Event],
    venues: &[Venue],
    weights: FeatureWeights,
) -> Result<Matrix, InputError> {
    if events.is_empty() || venues.is_empty() {
        return Err(InputError::EmptyDistribution);
    }
    for event in events {
        InputError::finite(
            "event",
            &[event.guests, event.budget, event.latitude, event.longitude],
        )?;
    }
    for venue in venues {
        InputError::finite(
            "venue",
            &[venue.capacity, venue.price, venue.latitude, venue.longitude],
        )?;
    }
    let weights = weights.renormalized().to_vec();
    let features: [&dyn Fn(&Event, &Venue) -> f64; 4] = [
        &capacity_distance,
        &price_distance,
        &amenity_distance,
        &location_distance,
    ];
    let n = events.len();
    let m = venues.len();
    let mut blended = vec![0.; n * m];
    for (feature, weight) in features.iter().zip(weights) {
        let raw = events
            .iter()
            .flat_map(|e| venues.iter().map(move |v| feature(e, v)))
            .collect::<Vec<_>>();
        for (b, r) in blended.iter_mut().zip(minmax(&raw)) {
            *b += weight * r;
        }
    }
    Ok(Matrix::from_fn(n, m, |i, j| blended[i * m + j]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(guests: f64, budget: f64) -> Event {
        Event {
            guests,
            budget,
            amenities: vec![],
            latitude: 0.,
            longitude: 0.,
        }
    }

    fn venue(capacity: f64, price: f64) -> Venue {
        Venue {
            capacity,
            price,
            amenities: vec![],
            latitude: 0.,
            longitude: 0.,
        }
    }

    #[test]
    fn shortfall_costs_more_than_excess() {
        let e = event(100., 1000.);
        let short = venue(80., 1000.);
        let wide = venue(120., 1000.);
        assert!(capacity_distance(&e, &short) > capacity_distance(&e, &wide));
    }

    #[test]
    fn over_budget_is_capped() {
        let e = event(10., 100.);
        let pricey = venue(10., 1e9);
        assert!(price_distance(&e, &pricey) == 3.0);
    }

    #[test]
    fn missing_amenities_fraction() {
        let mut e = event(10., 100.);
        e.amenities = vec!["stage".into(), "bar".into(), "parking".into()];
        let mut v = venue(10., 100.);
        v.amenities = vec!["bar".into(), "wifi".into()];
        assert!((amenity_distance(&e, &v) - 2. / 3.).abs() < 1e-12);
    }

    #[test]
    fn haversine_quarter_meridian() {
        let e = Event {
            latitude: 0.,
            longitude: 0.,
            ..event(1., 1.)
        };
        let v = Venue {
            latitude: 90.,
            longitude: 0.,
            ..venue(1., 1.)
        };
        let quarter = std::f64::consts::PI * EARTH_RADIUS / 2.;
        assert!((location_distance(&e, &v) - quarter).abs() < 1.);
    }

    #[test]
    fn cost_matrix_is_normalized_and_shaped() {
        let events = vec![event(50., 500.), event(200., 2000.)];
        let venues = vec![venue(60., 450.), venue(150., 3000.), venue(300., 800.)];
        let cost = build_cost_matrix(&events, &venues, FeatureWeights::default())
            .expect("well-formed inputs");
        assert!(cost.rows() == 2);
        assert!(cost.cols() == 3);
        assert!(cost.data().iter().all(|&c| (0. ..=1.).contains(&c)));
    }

    #[test]
    fn weights_renormalize_to_simplex() {
        let w = FeatureWeights::from([10., 0., 0., 0.]).renormalized();
        let total = w.to_vec().iter().sum::<f64>();
        assert!((total - 1.).abs() < 1e-12);
        assert!(w.price >= 0.01);
    }
}
