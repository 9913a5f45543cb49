use super::support::Support;

/// generalization of *element-wise* cost between
/// two Density spaces over arbitrary Support.
///
/// image space X and range space Y need not share a support;
/// what matters is that a cost is defined between any x and any y.
pub trait Measure {
    type X: Support;
    type Y: Support;
    fn distance(&self, x: Self::X, y: Self::Y) -> f64;
}
