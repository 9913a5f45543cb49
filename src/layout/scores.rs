use super::furnishing::FurnitureSpec;
use super::placement::Placement;
use super::room::Room;
use crate::Score;
use serde::Deserialize;
use serde::Serialize;

/// relative importance of the four soft objectives. capacity is
/// reported alongside but never weighted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub space_utilization: f64,
    pub sightline: f64,
    pub symmetry: f64,
    pub exit_access: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            space_utilization: 0.3,
            sightline: 0.3,
            symmetry: 0.2,
            exit_access: 0.2,
        }
    }
}

/// every soft objective, each in [0, 1], plus their weighted blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutScores {
    pub capacity: Score,
    pub space_utilization: Score,
    pub sightline_coverage: Score,
    pub symmetry: Score,
    pub exit_access: Score,
    pub total: Score,
}

/// fraction of the request actually standing
fn capacity(specs: &[FurnitureSpec], placements: &[Placement]) -> Score {
    let requested = specs.iter().map(|s| s.count).sum::<usize>();
    match requested {
        0 => 1.,
        _ => (placements.len() as f64 / requested as f64).min(1.),
    }
}

/// rooms feel right around forty percent coverage; emptier wastes the
/// floor, fuller chokes it
fn space_utilization(room: &Room, placements: &[Placement]) -> Score {
    let covered = placements.iter().map(|p| p.width * p.depth).sum::<f64>();
    let coverage = covered / room.area();
    (1. - (coverage - 0.4).abs() / 0.4).max(0.)
}

/// fraction of seats that can see the focal point past every
/// non-chair footprint
fn sightline_coverage(room: &Room, placements: &[Placement]) -> Score {
    let Some(focal) = room.focal_point else {
        return 1.;
    };
    let chairs = placements
        .iter()
        .filter(|p| p.kind.is_chair())
        .collect::<Vec<_>>();
    if chairs.is_empty() {
        return 1.;
    }
    let blockers = placements
        .iter()
        .filter(|p| !p.kind.is_chair())
        .map(Placement::aabb)
        .collect::<Vec<_>>();
    let seeing = chairs
        .iter()
        .filter(|chair| {
            let seat = (chair.x, chair.z);
            !blockers
                .iter()
                .any(|b| b.blocks_segment(seat, (focal.x, focal.z)))
        })
        .count();
    seeing as f64 / chairs.len() as f64
}

/// how closely the layout mirrors itself across the room's vertical
/// centerline. each matched pair contributes from both sides.
fn symmetry(room: &Room, placements: &[Placement]) -> Score {
    if placements.is_empty() {
        return 1.;
    }
    let threshold = 0.1 * room.width;
    let mut matched = 0usize;
    let mut deviation = 0f64;
    for p in placements {
        let mirror = (room.width - p.x, p.z);
        let best = placements
            .iter()
            .filter(|q| q.kind == p.kind)
            .map(|q| (q.x - mirror.0).hypot(q.z - mirror.1))
            .min_by(|a, b| a.partial_cmp(b).expect("finite distances"));
        if let Some(best) = best {
            if best < threshold {
                matched += 1;
                deviation += best;
            }
        }
    }
    match matched {
        0 => 0.,
        _ => {
            let ratio = matched as f64 / placements.len() as f64;
            ratio * (1. - (deviation / matched as f64) / threshold)
        }
    }
}

/// the worst seat should still be near a way out
fn exit_access(room: &Room, placements: &[Placement]) -> Score {
    if room.exits.is_empty() || placements.is_empty() {
        return 1.;
    }
    let chairs = placements
        .iter()
        .filter(|p| p.kind.is_chair())
        .collect::<Vec<_>>();
    let subjects: Vec<&Placement> = match chairs.is_empty() {
        true => placements.iter().collect(),
        false => chairs,
    };
    let worst = subjects
        .iter()
        .map(|p| {
            room.exits
                .iter()
                .map(|exit| exit.distance_to(p.x, p.z))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0., f64::max);
    (1. - worst / room.diagonal()).clamp(0., 1.)
}

/// weighted blend of the soft objectives, all clamped into [0, 1].
pub fn score(
    room: &Room,
    specs: &[FurnitureSpec],
    placements: &[Placement],
    weights: Weights,
) -> LayoutScores {
    let space_utilization = space_utilization(room, placements).clamp(0., 1.);
    let sightline_coverage = sightline_coverage(room, placements).clamp(0., 1.);
    let symmetry = symmetry(room, placements).clamp(0., 1.);
    let exit_access = exit_access(room, placements).clamp(0., 1.);
    let mass = weights.space_utilization + weights.sightline + weights.symmetry + weights.exit_access;
    let total = match mass > 0. {
        true => {
            (weights.space_utilization * space_utilization
                + weights.sightline * sightline_coverage
                + weights.symmetry * symmetry
                + weights.exit_access * exit_access)
                / mass
        }
        false => 0.,
    };
    LayoutScores {
        capacity: capacity(specs, placements).clamp(0., 1.),
        space_utilization,
        sightline_coverage,
        symmetry,
        exit_access,
        total: total.clamp(0., 1.),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::furnishing::Kind;
    use crate::layout::room::Exit;

    fn chair_at(x: f64, z: f64) -> Placement {
        let spec = FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 1);
        Placement::new(0, 0, &spec, x, z, 0)
    }

    fn table_at(x: f64, z: f64) -> Placement {
        let spec = FurnitureSpec::new(Kind::RectTable, 2., 1., 1);
        Placement::new(1, 0, &spec, x, z, 0)
    }

    #[test]
    fn all_scores_stay_in_unit_interval() {
        let room = Room::new(12., 10.).with_focal_point(6., 1.);
        let placements = vec![chair_at(2., 5.), chair_at(10., 5.), table_at(6., 5.)];
        let specs = vec![
            FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 2),
            FurnitureSpec::new(Kind::RectTable, 2., 1., 1),
        ];
        let scores = score(&room, &specs, &placements, Weights::default());
        for s in [
            scores.capacity,
            scores.space_utilization,
            scores.sightline_coverage,
            scores.symmetry,
            scores.exit_access,
            scores.total,
        ] {
            assert!((0. ..=1.).contains(&s), "{:?}", scores);
        }
    }

    #[test]
    fn capacity_is_placed_over_requested() {
        let room = Room::new(12., 10.);
        let specs = vec![FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 4)];
        let placements = vec![chair_at(2., 2.), chair_at(4., 2.)];
        let scores = score(&room, &specs, &placements, Weights::default());
        assert!(scores.capacity == 0.5);
    }

    #[test]
    fn blocked_sightline_lowers_coverage() {
        let room = Room::new(12., 10.).with_focal_point(6., 1.);
        let clear = vec![chair_at(6., 8.)];
        let blocked = vec![chair_at(6., 8.), table_at(6., 5.)];
        let specs = vec![FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 1)];
        let open = score(&room, &specs, &clear, Weights::default());
        let shut = score(&room, &specs, &blocked, Weights::default());
        assert!(open.sightline_coverage == 1.);
        assert!(shut.sightline_coverage == 0.);
    }

    #[test]
    fn mirrored_layout_scores_high_symmetry() {
        let room = Room::new(12., 10.);
        let specs = vec![FurnitureSpec::new(Kind::RectTable, 2., 1., 2)];
        let mirrored = vec![table_at(3., 5.), table_at(9., 5.)];
        let lopsided = vec![table_at(3., 5.), table_at(5., 8.)];
        let good = score(&room, &specs, &mirrored, Weights::default());
        let poor = score(&room, &specs, &lopsided, Weights::default());
        assert!(good.symmetry > 0.9, "{}", good.symmetry);
        assert!(poor.symmetry < good.symmetry);
    }

    #[test]
    fn seats_near_exits_score_better_access() {
        let room = Room::new(12., 10.).with_exit(Exit {
            x: 6.,
            z: 10.,
            opening: 1.8,
            facing: std::f64::consts::FRAC_PI_2,
        });
        let near = vec![chair_at(6., 9.)];
        let far = vec![chair_at(6., 1.)];
        let specs = vec![FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 1)];
        let close = score(&room, &specs, &near, Weights::default());
        let distant = score(&room, &specs, &far, Weights::default());
        assert!(close.exit_access > distant.exit_access);
    }
}
