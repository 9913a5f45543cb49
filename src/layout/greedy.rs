use super::grid::Grid;
use super::hash::SpatialHash;
use super::placement::Placement;
use super::room::Room;
use super::solver::SolverOptions;
use crate::numeric::Mulberry32;

/// one instance waiting to be placed.
#[derive(Debug, Clone, Copy)]
struct Task {
    spec: usize,
    instance: usize,
}

/// phase one: greedy seeding with limited backtracking.
///
/// tasks are ordered hardest first: zone-pinned items, then wall
/// huggers, then everything else by descending footprint. a failed
/// placement may evict the most recent success and retry it, up to a
/// fixed backtrack budget.
pub struct Seeder<'a> {
    room: &'a Room,
    specs: &'a [super::furnishing::FurnitureSpec],
    options: &'a SolverOptions,
    grid: Grid,
    hash: SpatialHash,
    rng: Mulberry32,
    placements: Vec<Placement>,
    /// task index that produced each placement, for backtracking
    origins: Vec<usize>,
    backtracks: usize,
}

/// everything phase two needs to continue, including the advanced
/// generator so the whole solve consumes one stream.
pub struct Seeded {
    pub placements: Vec<Placement>,
    pub grid: Grid,
    pub hash: SpatialHash,
    pub backtracks: usize,
    pub rng: Mulberry32,
}

impl<'a> Seeder<'a> {
    pub fn new(
        room: &'a Room,
        specs: &'a [super::furnishing::FurnitureSpec],
        options: &'a SolverOptions,
        rng: Mulberry32,
    ) -> Self {
        Self {
            grid: Grid::new(room, options.grid_cell_size, options.exit_clearance),
            hash: SpatialHash::new(options.grid_cell_size),
            placements: vec![],
            origins: vec![],
            backtracks: 0,
            room,
            specs,
            options,
            rng,
        }
    }

    /// zone-pinned first, wall-adjacent next, the rest largest first
    fn tasks(&self) -> Vec<Task> {
        let mut tasks = self
            .specs
            .iter()
            .enumerate()
            .flat_map(|(spec, s)| (0..s.count).map(move |instance| Task { spec, instance }))
            .collect::<Vec<_>>();
        tasks.sort_by(|a, b| {
            let class = |t: &Task| {
                let spec = &self.specs[t.spec];
                match (spec.fixed_zone.is_some(), spec.wall_adjacent) {
                    (true, _) => 0,
                    (false, true) => 1,
                    (false, false) => 2,
                }
            };
            let area = |t: &Task| self.specs[t.spec].footprint();
            class(a)
                .cmp(&class(b))
                .then(area(b).partial_cmp(&area(a)).expect("finite footprints"))
        });
        tasks
    }

    pub fn seed(mut self) -> Seeded {
        let tasks = self.tasks();
        let mut cursor = 0;
        while cursor < tasks.len() {
            if self.attempt(&tasks[cursor], cursor) {
                cursor += 1;
            } else if self.options.enable_backtracking
                && self.backtracks < crate::MAX_BACKTRACKS
                && !self.placements.is_empty()
            {
                let evicted = self.placements.pop().expect("nonempty placements");
                let origin = self.origins.pop().expect("parallel to placements");
                self.grid.vacate(&evicted.aabb());
                self.hash.remove(self.placements.len());
                self.backtracks += 1;
                cursor = origin;
            } else {
                log::debug!("{:<32}task {}", "skipping unplaceable item", cursor);
                cursor += 1;
            }
        }
        log::debug!(
            "{:<32}{} of {} with {} backtracks",
            "greedy phase placed",
            self.placements.len(),
            tasks.len(),
            self.backtracks
        );
        Seeded {
            placements: self.placements,
            grid: self.grid,
            hash: self.hash,
            backtracks: self.backtracks,
            rng: self.rng,
        }
    }

    fn attempt(&mut self, task: &Task, origin: usize) -> bool {
        let spec = &self.specs[task.spec];
        if spec.fixed_zone.is_some() {
            if self.attempt_zone(task, origin) {
                return true;
            }
            return self.attempt_general(task, origin);
        }
        if spec.wall_adjacent {
            return self.attempt_walls(task, origin);
        }
        self.attempt_general(task, origin)
    }

    /// try the zone's canonical anchor under both cardinal rotations
    fn attempt_zone(&mut self, task: &Task, origin: usize) -> bool {
        let spec = &self.specs[task.spec];
        let zone = spec.fixed_zone.expect("zone-pinned task");
        let (x, z) = zone.anchor(self.room.width, self.room.depth);
        for cardinal in 0..2 {
            let candidate = Placement::new(
                task.spec,
                task.instance,
                spec,
                self.grid.snap(x),
                self.grid.snap(z),
                cardinal,
            );
            if self.admit(candidate, origin) {
                return true;
            }
        }
        false
    }

    /// sample along each wall at a fixed margin, long side parallel
    fn attempt_walls(&mut self, task: &Task, origin: usize) -> bool {
        let spec = &self.specs[task.spec];
        let budget = (self.options.max_placement_attempts / 4).max(1);
        let margin = crate::WALL_MARGIN;
        for wall in 0..4 {
            for _ in 0..budget {
                let cardinal = match wall {
                    0 | 1 => 0,
                    _ => 1,
                };
                let (width, depth) = match cardinal {
                    0 => (spec.width, spec.depth),
                    _ => (spec.depth, spec.width),
                };
                let along = self.rng.next();
                let (x, z) = match wall {
                    // north and south walls
                    0 => (
                        margin + width / 2. + along * (self.room.width - width - 2. * margin),
                        margin + depth / 2.,
                    ),
                    1 => (
                        margin + width / 2. + along * (self.room.width - width - 2. * margin),
                        self.room.depth - margin - depth / 2.,
                    ),
                    // east and west walls
                    2 => (
                        self.room.width - margin - width / 2.,
                        margin + depth / 2. + along * (self.room.depth - depth - 2. * margin),
                    ),
                    _ => (
                        margin + width / 2.,
                        margin + depth / 2. + along * (self.room.depth - depth - 2. * margin),
                    ),
                };
                let candidate = Placement::new(
                    task.spec,
                    task.instance,
                    spec,
                    self.grid.snap(x),
                    self.grid.snap(z),
                    cardinal,
                );
                if self.admit(candidate, origin) {
                    return true;
                }
            }
        }
        false
    }

    /// uniform rejection sampling over the interior
    fn attempt_general(&mut self, task: &Task, origin: usize) -> bool {
        let spec = &self.specs[task.spec];
        for _ in 0..self.options.max_placement_attempts {
            let cardinal = match self.rng.chance(0.5) {
                true => 0,
                false => 1,
            };
            let (width, depth) = match cardinal {
                0 => (spec.width, spec.depth),
                _ => (spec.depth, spec.width),
            };
            if width >= self.room.width || depth >= self.room.depth {
                return false;
            }
            let x = self.rng.range(width / 2., self.room.width - width / 2.);
            let z = self.rng.range(depth / 2., self.room.depth - depth / 2.);
            let candidate = Placement::new(
                task.spec,
                task.instance,
                spec,
                self.grid.snap(x),
                self.grid.snap(z),
                cardinal,
            );
            if self.admit(candidate, origin) {
                return true;
            }
        }
        false
    }

    /// commit the candidate if the grid allows it
    fn admit(&mut self, candidate: Placement, origin: usize) -> bool {
        let aabb = candidate.aabb();
        if !self.grid.can_place(&aabb) {
            return false;
        }
        if !self.grid.has_aisle_clearance(&aabb, self.options.min_aisle_width) {
            return false;
        }
        self.grid.occupy(&aabb);
        self.hash.insert(self.placements.len(), aabb);
        self.placements.push(candidate);
        self.origins.push(origin);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::furnishing::FurnitureSpec;
    use crate::layout::furnishing::Kind;
    use crate::layout::furnishing::Zone;

    fn seed(room: &Room, specs: &[FurnitureSpec]) -> Seeded {
        let options = SolverOptions::default();
        Seeder::new(room, specs, &options, Mulberry32::from(crate::DEFAULT_SEED)).seed()
    }

    #[test]
    fn spacious_room_fits_everything() {
        let room = Room::new(20., 15.);
        let specs = vec![
            FurnitureSpec::new(Kind::RoundTable, 1.8, 1.8, 4),
            FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 20),
        ];
        let seeded = seed(&room, &specs);
        assert!(seeded.placements.len() >= 24, "{}", seeded.placements.len());
    }

    #[test]
    fn zone_pinned_stage_lands_north() {
        let room = Room::new(15., 12.);
        let specs = vec![FurnitureSpec::new(Kind::Stage, 4., 2., 1).pinned(Zone::North)];
        let seeded = seed(&room, &specs);
        assert!(seeded.placements.len() == 1);
        assert!(seeded.placements[0].z < 6., "{}", seeded.placements[0].z);
    }

    #[test]
    fn wall_adjacent_bar_hugs_a_wall() {
        let room = Room::new(15., 12.);
        let specs = vec![FurnitureSpec::new(Kind::Bar, 3., 0.8, 1).against_wall()];
        let seeded = seed(&room, &specs);
        assert!(seeded.placements.len() == 1);
        let p = &seeded.placements[0];
        let aabb = p.aabb();
        let near_wall = aabb.min_x < 1.
            || aabb.min_z < 1.
            || aabb.max_x > room.width - 1.
            || aabb.max_z > room.depth - 1.;
        assert!(near_wall, "{:?}", p);
    }

    #[test]
    fn hardest_items_are_scheduled_first() {
        let room = Room::new(20., 15.);
        let specs = vec![
            FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 2),
            FurnitureSpec::new(Kind::Stage, 4., 2., 1).pinned(Zone::North),
            FurnitureSpec::new(Kind::RoundTable, 1.8, 1.8, 1),
        ];
        let options = SolverOptions::default();
        let seeder = Seeder::new(&room, &specs, &options, Mulberry32::from(1));
        let tasks = seeder.tasks();
        assert!(tasks[0].spec == 1, "stage first");
        assert!(tasks[1].spec == 2, "table before chairs");
    }

    #[test]
    fn impossible_item_is_skipped_silently() {
        let room = Room::new(6., 6.);
        let specs = vec![FurnitureSpec::new(Kind::Stage, 30., 30., 1)];
        let seeded = seed(&room, &specs);
        assert!(seeded.placements.is_empty());
    }

    #[test]
    fn seeded_layouts_have_no_overlaps() {
        let room = Room::new(18., 14.);
        let specs = vec![
            FurnitureSpec::new(Kind::RoundTable, 1.8, 1.8, 5),
            FurnitureSpec::new(Kind::RectTable, 1.8, 0.8, 4),
        ];
        let seeded = seed(&room, &specs);
        for (i, a) in seeded.placements.iter().enumerate() {
            for b in seeded.placements.iter().skip(i + 1) {
                assert!(!a.aabb().intersects(&b.aabb()), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn determinism_per_seed() {
        let room = Room::new(18., 14.);
        let specs = vec![FurnitureSpec::new(Kind::RoundTable, 1.8, 1.8, 6)];
        let one = seed(&room, &specs);
        let two = seed(&room, &specs);
        assert!(one.placements == two.placements);
    }
}
