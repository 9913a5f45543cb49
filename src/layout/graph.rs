use super::checker;
use super::furnishing::FurnitureSpec;
use super::hash::SpatialHash;
use super::placement::Placement;
use super::room::Room;
use super::scores;
use super::scores::Weights;
use super::solver::SolverOptions;
use super::violation::Violation;
use crate::Score;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::BTreeSet;

/// what each dependency node computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// one placement, as given
    Input(usize),
    /// that placement's local violation list
    Local(usize),
    /// deduplicated union of all local lists
    Global,
    /// the weighted soft objective
    Objective,
}

/// incremental constraint evaluation as a dataflow graph.
///
/// each input node feeds its local violation node, every local node
/// feeds the global violations node, and the global node feeds the
/// objective. values are cached per node; a move recomputes only the
/// nodes its dirt can reach, and equal recomputed values stop the
/// propagation early.
pub struct ConstraintGraph {
    room: Room,
    specs: Vec<FurnitureSpec>,
    options: SolverOptions,
    weights: Weights,
    topology: DiGraph<Role, ()>,
    locals: Vec<NodeIndex>,
    global: NodeIndex,
    placements: Vec<Placement>,
    hash: SpatialHash,
    local_cache: Vec<Vec<Violation>>,
    global_cache: Vec<Violation>,
    objective_cache: Score,
}

impl ConstraintGraph {
    /// moving one placement can change aisle findings this far away
    fn reach(&self) -> f64 {
        self.options.min_aisle_width + 1.
    }

    pub fn new(
        room: Room,
        specs: Vec<FurnitureSpec>,
        placements: Vec<Placement>,
        options: SolverOptions,
        weights: Weights,
    ) -> Self {
        let mut topology = DiGraph::new();
        let global = topology.add_node(Role::Global);
        let objective = topology.add_node(Role::Objective);
        topology.add_edge(global, objective, ());
        let locals = (0..placements.len())
            .map(|i| {
                let input = topology.add_node(Role::Input(i));
                let local = topology.add_node(Role::Local(i));
                topology.add_edge(input, local, ());
                topology.add_edge(local, global, ());
                local
            })
            .collect();
        let hash = checker::build_hash(&placements, options.grid_cell_size);
        let mut this = Self {
            room,
            specs,
            options,
            weights,
            topology,
            locals,
            global,
            placements,
            hash,
            local_cache: vec![],
            global_cache: vec![],
            objective_cache: 0.,
        };
        this.local_cache = (0..this.placements.len())
            .map(|i| this.evaluate_local(i))
            .collect();
        this.global_cache = this.evaluate_global();
        this.objective_cache = this.evaluate_objective();
        this
    }

    /// throw away every cache and start from the given placements.
    /// restarts use this after rebuilding their grid.
    pub fn rebuild(&mut self, placements: Vec<Placement>) {
        *self = Self::new(
            self.room.clone(),
            self.specs.clone(),
            placements,
            self.options,
            self.weights,
        );
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
    pub fn specs(&self) -> &[FurnitureSpec] {
        &self.specs
    }
    pub fn violations(&self) -> &[Violation] {
        &self.global_cache
    }
    pub fn objective(&self) -> Score {
        self.objective_cache
    }
    pub fn local(&self, index: usize) -> &[Violation] {
        &self.local_cache[index]
    }
    pub fn hash(&self) -> &SpatialHash {
        &self.hash
    }

    fn evaluate_local(&self, index: usize) -> Vec<Violation> {
        checker::validate_single(&self.room, &self.placements, index, &self.options, &self.hash)
    }

    /// gather along the in-edges of the global node, deduplicating by
    /// violation identity
    fn evaluate_global(&self) -> Vec<Violation> {
        let mut seen = BTreeSet::new();
        let mut merged = vec![];
        let mut feeders = self
            .topology
            .neighbors_directed(self.global, Direction::Incoming)
            .collect::<Vec<_>>();
        feeders.sort();
        for node in feeders {
            let Role::Local(index) = self.topology[node] else {
                continue;
            };
            for violation in self.local_cache[index].iter() {
                if seen.insert(violation.key()) {
                    merged.push(violation.clone());
                }
            }
        }
        merged
    }

    fn evaluate_objective(&self) -> Score {
        scores::score(&self.room, &self.specs, &self.placements, self.weights).total
    }

    /// move one placement and propagate. neighbors within aisle reach
    /// of either the old or new footprint are re-evaluated; if no
    /// local list actually changed, downstream recompute is skipped.
    /// returns true when the moved placement's own local list is clean.
    pub fn displace(&mut self, index: usize, placement: Placement) -> bool {
        let mut affected = self
            .hash
            .query(&self.placements[index].aabb().inflate(self.reach()))
            .into_iter()
            .collect::<BTreeSet<_>>();
        self.placements[index] = placement;
        self.hash.update(index, placement.aabb());
        affected.extend(self.hash.query(&placement.aabb().inflate(self.reach())));
        affected.insert(index);

        let mut changed = false;
        for &i in affected.iter() {
            let fresh = self.evaluate_local(i);
            if fresh != self.local_cache[i] {
                self.local_cache[i] = fresh;
                changed = true;
            }
        }
        // the moved input always invalidates the objective (positions
        // feed the soft scores even when no violation changes)
        if changed {
            self.global_cache = self.evaluate_global();
        }
        let objective = self.evaluate_objective();
        if (objective - self.objective_cache).abs() > 1e-10 {
            self.objective_cache = objective;
        }
        self.local_cache[index].is_empty()
    }

    /// count of nodes, for diagnostics
    pub fn order(&self) -> usize {
        self.topology.node_count()
    }
    pub fn is_clean(&self) -> bool {
        self.global_cache.is_empty()
    }
    pub fn locals(&self) -> &[NodeIndex] {
        &self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::furnishing::Kind;

    fn fixture() -> ConstraintGraph {
        let room = Room::new(20., 15.);
        let spec = FurnitureSpec::new(Kind::RectTable, 1.8, 0.8, 3);
        let placements = vec![
            Placement::new(0, 0, &spec, 4., 4., 0),
            Placement::new(0, 1, &spec, 10., 4., 0),
            Placement::new(0, 2, &spec, 16., 4., 0),
        ];
        ConstraintGraph::new(
            room,
            vec![spec],
            placements,
            SolverOptions::default(),
            Weights::default(),
        )
    }

    #[test]
    fn clean_layout_has_no_violations() {
        let graph = fixture();
        assert!(graph.is_clean());
        assert!(graph.order() == 2 + 2 * 3);
    }

    #[test]
    fn displacing_into_overlap_dirties_the_global_node() {
        let mut graph = fixture();
        let collide = graph.placements()[0].moved_to(10.2, 4.);
        let clean = graph.displace(0, collide);
        assert!(!clean);
        assert!(!graph.is_clean());
        assert!(graph.violations().len() == 1);
    }

    #[test]
    fn moving_back_heals_the_graph() {
        let mut graph = fixture();
        let home = graph.placements()[0];
        graph.displace(0, home.moved_to(10.2, 4.));
        let clean = graph.displace(0, home);
        assert!(clean);
        assert!(graph.is_clean());
    }

    #[test]
    fn incremental_matches_fresh_rebuild() {
        let mut graph = fixture();
        graph.displace(0, graph.placements()[0].moved_to(9.2, 4.));
        graph.displace(2, graph.placements()[2].moved_to(12., 8.));
        let incremental = graph
            .violations()
            .iter()
            .map(Violation::key)
            .collect::<Vec<_>>();
        let fresh = ConstraintGraph::new(
            Room::new(20., 15.),
            graph.specs.clone(),
            graph.placements().to_vec(),
            SolverOptions::default(),
            Weights::default(),
        );
        let rebuilt = fresh
            .violations()
            .iter()
            .map(Violation::key)
            .collect::<Vec<_>>();
        assert!(incremental == rebuilt);
    }

    #[test]
    fn objective_tracks_moves() {
        let mut graph = fixture();
        let before = graph.objective();
        graph.displace(0, graph.placements()[0].moved_to(4., 11.));
        let after = graph.objective();
        assert!(before != after || (before - after).abs() < 1e-10);
        assert!((0. ..=1.).contains(&after));
    }
}
