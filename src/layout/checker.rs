use super::hash::SpatialHash;
use super::placement::Placement;
use super::room::Room;
use super::solver::SolverOptions;
use super::violation::Violation;
use crate::error::InputError;
use serde::Serialize;

/// a placement list the validator has certified free of hard
/// violations. only the validator can mint one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedLayout {
    placements: Vec<Placement>,
}

impl ValidatedLayout {
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}

/// outcome of the standalone validation entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub violations: Vec<Violation>,
    /// present exactly when valid
    pub layout: Option<ValidatedLayout>,
}

/// violations local to one placement: bounds, obstacles, exit zones,
/// and pairwise conflicts against the given candidate set. pairwise
/// findings are reported with sorted indices so keys deduplicate.
pub fn local_violations(
    room: &Room,
    placements: &[Placement],
    index: usize,
    candidates: impl Iterator<Item = usize>,
    options: &SolverOptions,
) -> Vec<Violation> {
    let mut found = vec![];
    let subject = &placements[index];
    let aabb = subject.aabb();
    if !room.contains(&aabb) {
        found.push(Violation::out_of_bounds(index));
    }
    for (o, obstacle) in room.obstacles.iter().enumerate() {
        if aabb.intersects(&obstacle.aabb()) {
            found.push(Violation::obstacle_overlap(index, o));
        }
    }
    for (e, exit) in room.exits.iter().enumerate() {
        if aabb.intersects(&exit.zone(options.exit_clearance)) {
            found.push(Violation::exit_blocked(index, e));
        }
    }
    for other in candidates {
        if other == index {
            continue;
        }
        let (i, j) = (index.min(other), index.max(other));
        let theirs = placements[other].aabb();
        if aabb.intersects(&theirs) {
            found.push(Violation::overlap(i, j));
            continue;
        }
        // aisles are walkways between furniture groups; chairs tuck
        // against their tables far closer than any walkway
        if subject.kind.is_chair() || placements[other].kind.is_chair() {
            continue;
        }
        let gap = aabb.gap(&theirs);
        if gap < options.min_aisle_width {
            found.push(Violation::aisle_too_narrow(i, j, gap, options.min_aisle_width));
        }
    }
    found
}

/// brute-force O(n^2) sweep over every placement pair.
pub fn violations(room: &Room, placements: &[Placement], options: &SolverOptions) -> Vec<Violation> {
    let mut found = vec![];
    for index in 0..placements.len() {
        found.extend(local_violations(
            room,
            placements,
            index,
            index + 1..placements.len(),
            options,
        ));
    }
    found
}

/// same result as the brute-force sweep, but candidate pairs come from
/// the spatial hash. the probe box is inflated by the aisle width so
/// near-misses are still visited.
pub fn violations_hashed(
    room: &Room,
    placements: &[Placement],
    options: &SolverOptions,
    hash: &SpatialHash,
) -> Vec<Violation> {
    let mut found = vec![];
    for index in 0..placements.len() {
        let probe = placements[index].aabb().inflate(options.min_aisle_width);
        let candidates = hash
            .query(&probe)
            .into_iter()
            .filter(|&other| other > index);
        found.extend(local_violations(room, placements, index, candidates, options));
    }
    found
}

/// local violations of a single placement, using the hash for
/// neighbor candidates. the annealing loop calls this after each move.
pub fn validate_single(
    room: &Room,
    placements: &[Placement],
    index: usize,
    options: &SolverOptions,
    hash: &SpatialHash,
) -> Vec<Violation> {
    let probe = placements[index].aabb().inflate(options.min_aisle_width);
    local_violations(room, placements, index, hash.query(&probe).into_iter(), options)
}

/// populate a hash with every placement footprint
pub fn build_hash(placements: &[Placement], cell: f64) -> SpatialHash {
    let mut hash = SpatialHash::new(cell);
    for (index, placement) in placements.iter().enumerate() {
        hash.insert(index, placement.aabb());
    }
    hash
}

/// standalone validation entry point. malformed numerics are rejected
/// before any constraint checking; a clean layout earns the branded
/// certificate.
pub fn validate(
    room: &Room,
    placements: &[Placement],
    options: &SolverOptions,
) -> Result<Validation, InputError> {
    for (index, placement) in placements.iter().enumerate() {
        InputError::finite(
            "placement",
            &[
                placement.x,
                placement.z,
                placement.rotation,
                placement.width,
                placement.depth,
            ],
        )?;
        if placement.x.abs() > crate::SITE_BOUND || placement.z.abs() > crate::SITE_BOUND {
            return Err(InputError::PositionOutOfBounds { index });
        }
    }
    let hash = build_hash(placements, options.grid_cell_size);
    let violations = violations_hashed(room, placements, options, &hash);
    let valid = violations.is_empty();
    Ok(Validation {
        valid,
        layout: valid.then(|| ValidatedLayout {
            placements: placements.to_vec(),
        }),
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::furnishing::FurnitureSpec;
    use crate::layout::furnishing::Kind;
    use crate::layout::room::Exit;
    use crate::layout::room::Obstacle;
    use std::collections::BTreeSet;

    fn table_at(x: f64, z: f64) -> Placement {
        let spec = FurnitureSpec::new(Kind::RectTable, 1.8, 0.8, 1);
        Placement::new(0, 0, &spec, x, z, 0)
    }

    fn options() -> SolverOptions {
        SolverOptions::default()
    }

    #[test]
    fn overlapping_pair_is_flagged_once() {
        let room = Room::new(20., 15.);
        let placements = vec![table_at(5., 5.), table_at(5.5, 5.)];
        let found = violations(&room, &placements, &options());
        assert!(found.len() == 1);
        assert!(found[0].kind == crate::layout::ViolationKind::Overlap);
    }

    #[test]
    fn narrow_aisle_between_tables_is_flagged() {
        let room = Room::new(20., 15.);
        let placements = vec![table_at(5., 5.), table_at(7.3, 5.)];
        let found = violations(&room, &placements, &options());
        assert!(found.len() == 1);
        assert!(found[0].kind == crate::layout::ViolationKind::AisleTooNarrow);
    }

    #[test]
    fn chairs_may_tuck_close_without_aisle_violations() {
        let room = Room::new(20., 15.);
        let chair_spec = FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 1);
        let placements = vec![table_at(5., 5.), Placement::new(1, 0, &chair_spec, 5., 5.9, 0)];
        let found = violations(&room, &placements, &options());
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn exit_zone_intrusion_is_flagged() {
        let room = Room::new(20., 15.).with_exit(Exit {
            x: 10.,
            z: 15.,
            opening: 1.8,
            facing: std::f64::consts::FRAC_PI_2,
        });
        let placements = vec![table_at(10., 13.5)];
        let found = violations(&room, &placements, &options());
        assert!(found.iter().any(|v| v.kind == crate::layout::ViolationKind::ExitBlocked));
    }

    #[test]
    fn obstacle_overlap_is_flagged() {
        let room = Room::new(20., 15.).with_obstacle(Obstacle {
            x: 5.,
            z: 5.,
            width: 1.,
            depth: 1.,
        });
        let placements = vec![table_at(5., 5.)];
        let found = violations(&room, &placements, &options());
        assert!(found.iter().any(|v| v.kind == crate::layout::ViolationKind::ObstacleOverlap));
    }

    #[test]
    fn out_of_bounds_is_flagged() {
        let room = Room::new(20., 15.);
        let placements = vec![table_at(0.2, 5.)];
        let found = violations(&room, &placements, &options());
        assert!(found.iter().any(|v| v.kind == crate::layout::ViolationKind::OutOfBounds));
    }

    #[test]
    fn hashed_sweep_matches_brute_force() {
        for _ in 0..20 {
            let room = Room::new(20., 15.);
            let placements = (0..30)
                .map(|_| {
                    table_at(
                        rand::random::<f64>() * 20.,
                        rand::random::<f64>() * 15.,
                    )
                })
                .collect::<Vec<_>>();
            let opts = options();
            let hash = build_hash(&placements, opts.grid_cell_size);
            let brute = violations(&room, &placements, &opts)
                .iter()
                .map(Violation::key)
                .collect::<BTreeSet<_>>();
            let hashed = violations_hashed(&room, &placements, &opts, &hash)
                .iter()
                .map(Violation::key)
                .collect::<BTreeSet<_>>();
            assert!(brute == hashed);
        }
    }

    #[test]
    fn validator_brands_clean_layouts_only() {
        let room = Room::new(20., 15.);
        let clean = vec![table_at(5., 5.), table_at(10., 10.)];
        let validation = validate(&room, &clean, &options()).expect("finite placements");
        assert!(validation.valid);
        assert!(validation.layout.is_some());

        let dirty = vec![table_at(5., 5.), table_at(5.2, 5.)];
        let validation = validate(&room, &dirty, &options()).expect("finite placements");
        assert!(!validation.valid);
        assert!(validation.layout.is_none());
    }

    #[test]
    fn far_away_position_is_a_typed_rejection() {
        let room = Room::new(20., 15.);
        let placements = vec![table_at(999., 0.)];
        let err = validate(&room, &placements, &options());
        assert!(err == Err(InputError::PositionOutOfBounds { index: 0 }));
    }
}
