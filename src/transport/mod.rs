mod barycenter;
mod cost;
mod coupling;
mod density;
mod distribution;
mod divergence;
mod interpolate;
mod inverse;
mod logdomain;
mod matching;
mod measure;
mod partial;
mod result;
mod sinkhorn;
mod support;

pub use barycenter::*;
pub use cost::*;
pub use coupling::*;
pub use density::*;
pub use distribution::*;
pub use divergence::*;
pub use interpolate::*;
pub use inverse::*;
pub use logdomain::*;
pub use matching::*;
pub use measure::*;
pub use partial::*;
pub use result::*;
pub use sinkhorn::*;
pub use support::*;
