use super::furnishing::FurnitureSpec;
use super::furnishing::Kind;
use super::grid::Grid;
use super::hash::SpatialHash;
use super::placement::Placement;
use super::room::Room;
use crate::Meters;
use serde::Deserialize;
use serde::Serialize;

/// default chair footprint for synthesized seating
const CHAIR_SIZE: Meters = 0.5;

/// which chairs ended up serving which table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub table: usize,
    pub chairs: Vec<usize>,
    pub seats: usize,
}

/// phase three: tuck chairs around every grouping table.
///
/// round tables ring their chairs evenly; rectangular ones seat them
/// along the two long edges. candidates that fall outside the room or
/// onto occupied cells are dropped, so a crowded table simply seats
/// fewer than asked.
pub fn group_chairs(
    room: &Room,
    specs: &[FurnitureSpec],
    placements: &mut Vec<Placement>,
    grid: &mut Grid,
    hash: &mut SpatialHash,
) -> Vec<Grouping> {
    let mut groupings = vec![];
    for table in 0..placements.len() {
        let spec = &specs[placements[table].spec];
        if spec.chairs_per_unit == 0 || placements[table].kind.is_chair() {
            continue;
        }
        let mut chairs = vec![];
        for (x, z, rotation) in seats(&placements[table], spec.chairs_per_unit) {
            let x = grid.snap(x);
            let z = grid.snap(z);
            let candidate = Placement {
                spec: placements[table].spec,
                instance: chairs.len(),
                x,
                z,
                rotation,
                width: CHAIR_SIZE,
                depth: CHAIR_SIZE,
                kind: Kind::Chair,
            };
            let aabb = candidate.aabb();
            if !room.contains(&aabb) || !grid.can_place(&aabb) {
                continue;
            }
            grid.occupy(&aabb);
            hash.insert(placements.len(), aabb);
            chairs.push(placements.len());
            placements.push(candidate);
        }
        if !chairs.is_empty() {
            groupings.push(Grouping {
                table,
                chairs,
                seats: spec.chairs_per_unit,
            });
        }
    }
    groupings
}

/// ideal seat poses around one table, each facing the table center
fn seats(table: &Placement, count: usize) -> Vec<(Meters, Meters, f64)> {
    match table.kind.is_round() {
        true => ring_seats(table, count),
        false => edge_seats(table, count),
    }
}

fn ring_seats(table: &Placement, count: usize) -> Vec<(Meters, Meters, f64)> {
    let radius = table.width.max(table.depth) / 2. + crate::CHAIR_SETBACK;
    (0..count)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / count as f64 + table.rotation;
            let x = table.x + radius * angle.cos();
            let z = table.z + radius * angle.sin();
            (x, z, facing(x, z, table))
        })
        .collect()
}

/// chairs along the two long edges, evenly spread
fn edge_seats(table: &Placement, count: usize) -> Vec<(Meters, Meters, f64)> {
    let per_side = count.div_ceil(2);
    let (long, short, along_x) = match table.width >= table.depth {
        true => (table.width, table.depth, true),
        false => (table.depth, table.width, false),
    };
    let spacing = long / (per_side + 1) as f64;
    let setback = short / 2. + crate::CHAIR_SETBACK;
    let mut out = vec![];
    for side in [-1f64, 1f64] {
        for k in 1..=per_side {
            if out.len() == count {
                break;
            }
            let offset = k as f64 * spacing - long / 2.;
            let (x, z) = match along_x {
                true => (table.x + offset, table.z + side * setback),
                false => (table.x + side * setback, table.z + offset),
            };
            out.push((x, z, facing(x, z, table)));
        }
    }
    out
}

/// rotation pointing from the seat toward the table center
fn facing(x: Meters, z: Meters, table: &Placement) -> f64 {
    (table.z - z).atan2(table.x - x)
}
