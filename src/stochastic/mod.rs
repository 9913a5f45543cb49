mod cmaes;
mod diagnostics;
mod hamiltonian;
mod metropolis;
mod nsga;
mod rbm;

pub use cmaes::*;
pub use diagnostics::*;
pub use hamiltonian::*;
pub use metropolis::*;
pub use nsga::*;
pub use rbm::*;
