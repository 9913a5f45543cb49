pub mod error;
pub mod layout;
pub mod numeric;
pub mod stochastic;
pub mod transport;

/// dimensional analysis types
type Meters = f64;
type Radians = f64;
type Mass = f64;
type Energy = f64;
type Score = f64;

/// sinkhorn optimal transport parameters
const SINKHORN_EPSILON: Energy = 0.01;
const SINKHORN_ITERATIONS: usize = 100;
const SINKHORN_TOLERANCE: Mass = 1e-6;
const SINKHORN_FLOOR: Mass = 1e-30;
const DIVISION_FLOOR: Mass = 1e-300;

// layout solver parameters
const GRID_CELL_SIZE: Meters = 0.15;
const MIN_AISLE_WIDTH: Meters = 0.914; // ADA 36in
const EXIT_CLEARANCE: Meters = 1.12; // fire code 44in
const SITE_BOUND: Meters = 100.;
const CHAIR_SETBACK: Meters = 0.35;
const WALL_MARGIN: Meters = 0.3;
const ANNEALING_ITERATIONS: usize = 2000;
const ANNEALING_INITIAL_TEMP: Energy = 10.;
const ANNEALING_COOLING_RATE: Energy = 0.995;
const MAX_PLACEMENT_ATTEMPTS: usize = 200;
const MAX_RESTARTS: usize = 3;
const MAX_BACKTRACKS: usize = 20;
const CONVERGENCE_WINDOW: usize = 200;
const CONVERGENCE_THRESHOLD: Score = 1e-3;
const DEFAULT_SEED: u32 = 42;

// inverse optimal transport parameters
const LEARNING_RATE: f64 = 0.01;
const LEARNING_ITERATIONS: usize = 100;
const LEARNING_EPSILON: Energy = 0.05;
const LEARNING_GRADIENT_STEP: f64 = 1e-4;
const MATCH_SUCCESS_WEIGHT: Mass = 1.0;
const MATCH_FAILURE_WEIGHT: Mass = 0.1;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// initialize logging
#[cfg(feature = "native")]
pub fn init() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
