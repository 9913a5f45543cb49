/// marker trait for any type that can
/// be interpreted as a support point of a probability distribution.
///
/// the transport core works over dense fixed supports, so the canonical
/// implementation is a plain index into a marginal vector. the trait
/// exists so that couplings stay generic over what a "point" is.
pub trait Support: Copy + Eq {}

impl Support for usize {}
