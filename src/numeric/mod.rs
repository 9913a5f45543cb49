mod matrix;
mod rng;
mod utils;

pub use matrix::*;
pub use rng::*;
pub use utils::*;
