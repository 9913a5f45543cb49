use super::anneal::Annealer;
use super::checker;
use super::furnishing::FurnitureSpec;
use super::greedy::Seeder;
use super::grouping;
use super::grouping::Grouping;
use super::placement::Placement;
use super::room::Room;
use super::scores;
use super::scores::LayoutScores;
use super::scores::Weights;
use super::violation::Violation;
use crate::error::InputError;
use crate::numeric::Mulberry32;
use crate::Energy;
use crate::Meters;
use serde::Deserialize;
use serde::Serialize;

/// every knob of the layout solver, with regulation-driven defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub grid_cell_size: Meters,
    pub min_aisle_width: Meters,
    pub exit_clearance: Meters,
    pub annealing_iterations: usize,
    pub annealing_initial_temp: Energy,
    pub annealing_cooling_rate: Energy,
    pub max_placement_attempts: usize,
    pub seed: u32,
    pub enable_backtracking: bool,
    pub max_restarts: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            grid_cell_size: crate::GRID_CELL_SIZE,
            min_aisle_width: crate::MIN_AISLE_WIDTH,
            exit_clearance: crate::EXIT_CLEARANCE,
            annealing_iterations: crate::ANNEALING_ITERATIONS,
            annealing_initial_temp: crate::ANNEALING_INITIAL_TEMP,
            annealing_cooling_rate: crate::ANNEALING_COOLING_RATE,
            max_placement_attempts: crate::MAX_PLACEMENT_ATTEMPTS,
            seed: crate::DEFAULT_SEED,
            enable_backtracking: true,
            max_restarts: crate::MAX_RESTARTS,
        }
    }
}

/// the whole problem in one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub room: Room,
    pub specs: Vec<FurnitureSpec>,
    pub weights: Option<Weights>,
    pub options: SolverOptions,
}

impl LayoutRequest {
    pub fn new(room: Room, specs: Vec<FurnitureSpec>) -> Self {
        Self {
            room,
            specs,
            weights: None,
            options: SolverOptions::default(),
        }
    }

    /// boundary validation for hosts that take requests from outside
    pub fn check(&self) -> Result<(), InputError> {
        InputError::finite("room", &[self.room.width, self.room.depth])?;
        if self.room.width <= 0. || self.room.depth <= 0. {
            return Err(InputError::NonFinite { field: "room" });
        }
        for spec in self.specs.iter() {
            InputError::finite("spec", &[spec.width, spec.depth])?;
        }
        for exit in self.room.exits.iter() {
            InputError::finite("exit", &[exit.x, exit.z, exit.opening, exit.facing])?;
        }
        for obstacle in self.room.obstacles.iter() {
            InputError::finite(
                "obstacle",
                &[obstacle.x, obstacle.z, obstacle.width, obstacle.depth],
            )?;
        }
        Ok(())
    }
}

/// bookkeeping a host can display next to the floorplan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutStats {
    pub elapsed_ms: f64,
    pub placed: usize,
    pub requested: usize,
    pub annealing_iterations: usize,
    pub restarts: usize,
    pub backtracks: usize,
}

/// the solver's full answer. the layout comes back even when it is
/// infeasible; the flag and the violation list say so.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    pub feasible: bool,
    pub placements: Vec<Placement>,
    pub scores: LayoutScores,
    pub violations: Vec<Violation>,
    pub groupings: Vec<Grouping>,
    pub stats: LayoutStats,
}

/// seed greedily, refine by annealing, tuck in the chairs, then score
/// and validate whatever stands. never fails: numeric inputs are taken
/// as given and unplaceable items are quietly reflected in capacity.
pub fn solve(request: &LayoutRequest) -> LayoutResult {
    let start = std::time::Instant::now();
    let weights = request.weights.unwrap_or_default();
    let options = &request.options;
    let room = &request.room;
    let specs = &request.specs;
    log::info!(
        "{:<32}{}x{} room, {} specs",
        "solving layout",
        room.width,
        room.depth,
        specs.len()
    );

    let rng = Mulberry32::from(options.seed);
    let seeded = Seeder::new(room, specs, options, rng).seed();
    let backtracks = seeded.backtracks;
    let annealed = Annealer::new(room, specs, options, weights, seeded).anneal();

    let mut placements = annealed.placements;
    let placed = placements.len();
    let mut grid = annealed.grid;
    let mut hash = checker::build_hash(&placements, options.grid_cell_size);
    let groupings = grouping::group_chairs(room, specs, &mut placements, &mut grid, &mut hash);

    let violations = checker::violations_hashed(room, &placements, options, &hash);
    let scores = scores::score(room, specs, &placements, weights);
    let requested = specs.iter().map(|s| s.count).sum();
    log::info!(
        "{:<32}{} placed, {} violations, total {:.3}",
        "layout solved",
        placements.len(),
        violations.len(),
        scores.total
    );
    LayoutResult {
        feasible: violations.is_empty(),
        placements,
        scores,
        violations,
        groupings,
        stats: LayoutStats {
            elapsed_ms: start.elapsed().as_secs_f64() * 1e3,
            placed,
            requested,
            annealing_iterations: annealed.iterations,
            restarts: annealed.restarts,
            backtracks,
        },
    }
}
