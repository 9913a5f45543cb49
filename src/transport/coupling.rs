use super::density::Density;
use super::measure::Measure;
use super::support::Support;

/// a joint distribution over (X, Y) with prescribed marginals,
/// together with a procedure that drives it toward optimality.
pub trait Coupling {
    type X: Support;
    type Y: Support;
    type P: Density<S = Self::X>;
    type Q: Density<S = Self::Y>;
    type M: Measure<X = Self::X, Y = Self::Y>;

    /// drive the coupling toward the cost-minimizing plan
    fn minimize(self) -> Self;
    /// mass moved from x to y under the current plan
    fn flow(&self, x: Self::X, y: Self::Y) -> f64;
    /// total cost of the current plan
    fn cost(&self) -> f64;
}
