use super::graph::ConstraintGraph;
use super::greedy::Seeded;
use super::grid::Grid;
use super::placement::Placement;
use super::room::Room;
use super::scores::Weights;
use super::solver::SolverOptions;
use crate::numeric::Mulberry32;
use crate::Energy;
use crate::Score;

/// phase two: simulated annealing over three move types.
///
/// translate nudges one footprint by a temperature-scaled offset,
/// rotate quarter-turns it, swap exchanges two positions. every trial
/// goes through the incremental graph; a rejected trial restores the
/// grid and graph exactly, so the occupancy state never drifts from
/// the placement list.
pub struct Annealer<'a> {
    room: &'a Room,
    options: &'a SolverOptions,
    grid: Grid,
    graph: ConstraintGraph,
    rng: Mulberry32,
    temperature: Energy,
    iterations: usize,
}

/// phase two's deliverable.
pub struct Annealed {
    pub placements: Vec<Placement>,
    pub grid: Grid,
    pub iterations: usize,
    pub restarts: usize,
    pub objective: Score,
}

impl<'a> Annealer<'a> {
    pub fn new(
        room: &'a Room,
        specs: &[super::furnishing::FurnitureSpec],
        options: &'a SolverOptions,
        weights: Weights,
        seeded: Seeded,
    ) -> Self {
        let graph = ConstraintGraph::new(
            room.clone(),
            specs.to_vec(),
            seeded.placements,
            *options,
            weights,
        );
        Self {
            room,
            options,
            grid: seeded.grid,
            graph,
            rng: seeded.rng,
            temperature: options.annealing_initial_temp,
            iterations: 0,
        }
    }

    /// temperature-independent displacement scale for this room
    fn scale(&self) -> f64 {
        self.room.area().sqrt() / 10. * 0.05
    }

    pub fn anneal(mut self) -> Annealed {
        let mut best = (self.graph.placements().to_vec(), self.graph.objective());
        let restarts = self.options.max_restarts;
        for restart in 0..=restarts {
            if restart > 0 {
                self.reset(&best.0);
                self.temperature = self.options.annealing_initial_temp
                    * (1. - restart as f64 / (restarts + 1) as f64);
            }
            let mut window: Score = self.graph.objective();
            for iteration in 0..self.options.annealing_iterations {
                self.step();
                self.temperature *= self.options.annealing_cooling_rate;
                self.iterations += 1;
                if self.graph.objective() > best.1 {
                    best = (self.graph.placements().to_vec(), self.graph.objective());
                }
                if (iteration + 1) % crate::CONVERGENCE_WINDOW == 0 {
                    let gained = self.graph.objective() - window;
                    if gained < crate::CONVERGENCE_THRESHOLD {
                        break;
                    }
                    window = self.graph.objective();
                }
            }
            log::debug!(
                "{:<32}restart {} best {:.4}",
                "annealing pass done",
                restart,
                best.1
            );
        }
        self.reset(&best.0);
        Annealed {
            placements: best.0,
            grid: self.grid,
            iterations: self.iterations,
            restarts,
            objective: best.1,
        }
    }

    /// rebuild occupancy and the graph from scratch around a snapshot
    fn reset(&mut self, placements: &[Placement]) {
        self.grid = Grid::new(self.room, self.options.grid_cell_size, self.options.exit_clearance);
        for placement in placements {
            self.grid.occupy(&placement.aabb());
        }
        self.graph.rebuild(placements.to_vec());
    }

    fn step(&mut self) {
        if self.graph.placements().is_empty() {
            return;
        }
        let roll = self.rng.next();
        if roll < 0.6 {
            self.translate();
        } else if roll < 0.8 {
            self.rotate();
        } else {
            self.swap();
        }
    }

    /// metropolis test on the objective delta
    fn accepts(&mut self, delta: Score) -> bool {
        delta > 0. || self.rng.chance((delta / self.temperature.max(1e-3)).exp())
    }

    /// zone-pinned items keep the spot the seeder gave them
    fn pinned(&self, index: usize) -> bool {
        let placement = self.graph.placements()[index];
        self.graph.specs()[placement.spec].fixed_zone.is_some()
    }

    /// try one placement at a new pose; restore everything on refusal
    fn attempt(&mut self, index: usize, trial: Placement) {
        let current = self.graph.placements()[index];
        let before = self.graph.objective();
        self.grid.vacate(&current.aabb());
        let aabb = trial.aabb();
        if !self.grid.can_place(&aabb)
            || !self.grid.has_aisle_clearance(&aabb, self.options.min_aisle_width)
        {
            self.grid.occupy(&current.aabb());
            return;
        }
        self.grid.occupy(&aabb);
        let clean = self.graph.displace(index, trial);
        let delta = self.graph.objective() - before;
        if clean && self.accepts(delta) {
            return;
        }
        self.grid.vacate(&aabb);
        self.grid.occupy(&current.aabb());
        self.graph.displace(index, current);
    }

    fn translate(&mut self) {
        let index = self.rng.below(self.graph.placements().len());
        if self.pinned(index) {
            return;
        }
        let current = self.graph.placements()[index];
        let reach = self.temperature * self.scale();
        let dx = (self.rng.gaussian() * reach).clamp(-reach, reach);
        let dz = (self.rng.gaussian() * reach).clamp(-reach, reach);
        let x = self
            .grid
            .snap((current.x + dx).clamp(current.width / 2., self.room.width - current.width / 2.));
        let z = self
            .grid
            .snap((current.z + dz).clamp(current.depth / 2., self.room.depth - current.depth / 2.));
        self.attempt(index, current.moved_to(x, z));
    }

    fn rotate(&mut self) {
        let index = self.rng.below(self.graph.placements().len());
        if self.pinned(index) {
            return;
        }
        let current = self.graph.placements()[index];
        self.attempt(index, current.turned());
    }

    /// exchange the positions of two placements, keeping each one's
    /// own extents and rotation
    fn swap(&mut self) {
        let n = self.graph.placements().len();
        if n < 2 {
            return;
        }
        let i = self.rng.below(n);
        let j = self.rng.below(n);
        if i == j || self.pinned(i) || self.pinned(j) {
            return;
        }
        let a = self.graph.placements()[i];
        let b = self.graph.placements()[j];
        let a_trial = a.moved_to(b.x, b.z);
        let b_trial = b.moved_to(a.x, a.z);
        let before = self.graph.objective();

        self.grid.vacate(&a.aabb());
        self.grid.vacate(&b.aabb());
        if !self.grid.can_place(&a_trial.aabb()) {
            self.grid.occupy(&a.aabb());
            self.grid.occupy(&b.aabb());
            return;
        }
        self.grid.occupy(&a_trial.aabb());
        if !self.grid.can_place(&b_trial.aabb()) {
            self.grid.vacate(&a_trial.aabb());
            self.grid.occupy(&a.aabb());
            self.grid.occupy(&b.aabb());
            return;
        }
        self.grid.occupy(&b_trial.aabb());

        let clean_a = self.graph.displace(i, a_trial);
        let clean_b = self.graph.displace(j, b_trial);
        let delta = self.graph.objective() - before;
        if clean_a && clean_b && self.accepts(delta) {
            return;
        }
        self.grid.vacate(&a_trial.aabb());
        self.grid.vacate(&b_trial.aabb());
        self.grid.occupy(&a.aabb());
        self.grid.occupy(&b.aabb());
        self.graph.displace(i, a);
        self.graph.displace(j, b);
    }
}
