use super::aabb::Aabb;
use crate::Meters;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// bucket identifier for one hash cell: a Cantor pairing of the cell
/// coordinates shifted into the positive quadrant, so nearby cells get
/// distinct keys without collisions.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct CellKey(u64);

impl CellKey {
    const SHIFT: i64 = 1 << 20;
}

impl From<(i64, i64)> for CellKey {
    fn from((ix, iz): (i64, i64)) -> Self {
        let a = (ix + Self::SHIFT) as u64;
        let b = (iz + Self::SHIFT) as u64;
        Self((a + b) * (a + b + 1) / 2 + b)
    }
}

/// cell-indexed bucketing of placement AABBs for near-neighbor queries.
///
/// wide footprints are written into every cell they touch, so a query
/// is a union over the cells the probe box touches. equivalent to the
/// brute-force pairwise sweep, just cheaper.
#[derive(Debug, Clone, Default)]
pub struct SpatialHash {
    cell: Meters,
    buckets: BTreeMap<CellKey, BTreeSet<usize>>,
    extents: BTreeMap<usize, Aabb>,
}

impl SpatialHash {
    pub fn new(cell: Meters) -> Self {
        Self {
            cell,
            buckets: BTreeMap::new(),
            extents: BTreeMap::new(),
        }
    }

    fn cells(&self, aabb: &Aabb) -> Vec<CellKey> {
        let ix0 = (aabb.min_x / self.cell).floor() as i64;
        let ix1 = (aabb.max_x / self.cell).floor() as i64;
        let iz0 = (aabb.min_z / self.cell).floor() as i64;
        let iz1 = (aabb.max_z / self.cell).floor() as i64;
        (iz0..=iz1)
            .flat_map(|iz| (ix0..=ix1).map(move |ix| CellKey::from((ix, iz))))
            .collect()
    }

    pub fn insert(&mut self, index: usize, aabb: Aabb) {
        for key in self.cells(&aabb) {
            self.buckets.entry(key).or_default().insert(index);
        }
        self.extents.insert(index, aabb);
    }

    pub fn remove(&mut self, index: usize) {
        if let Some(aabb) = self.extents.remove(&index) {
            for key in self.cells(&aabb) {
                if let Some(bucket) = self.buckets.get_mut(&key) {
                    bucket.remove(&index);
                    if bucket.is_empty() {
                        self.buckets.remove(&key);
                    }
                }
            }
        }
    }

    pub fn update(&mut self, index: usize, aabb: Aabb) {
        self.remove(index);
        self.insert(index, aabb);
    }

    /// all indices whose footprint shares a cell with the probe box
    pub fn query(&self, aabb: &Aabb) -> BTreeSet<usize> {
        self.cells(aabb)
            .into_iter()
            .filter_map(|key| self.buckets.get(&key))
            .flatten()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }
    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_finds_overlapping_neighbors() {
        let mut hash = SpatialHash::new(1.);
        hash.insert(0, Aabb::centered(2., 2., 1., 1.));
        hash.insert(1, Aabb::centered(9., 9., 1., 1.));
        let hits = hash.query(&Aabb::centered(2.5, 2., 2., 2.));
        assert!(hits.contains(&0));
        assert!(!hits.contains(&1));
    }

    #[test]
    fn wide_items_span_many_cells() {
        let mut hash = SpatialHash::new(1.);
        hash.insert(0, Aabb::centered(5., 5., 8., 1.));
        assert!(hash.query(&Aabb::centered(1.5, 5., 0.5, 0.5)).contains(&0));
        assert!(hash.query(&Aabb::centered(8.5, 5., 0.5, 0.5)).contains(&0));
    }

    #[test]
    fn update_moves_the_entry() {
        let mut hash = SpatialHash::new(1.);
        hash.insert(0, Aabb::centered(2., 2., 1., 1.));
        hash.update(0, Aabb::centered(8., 8., 1., 1.));
        assert!(hash.query(&Aabb::centered(2., 2., 2., 2.)).is_empty());
        assert!(hash.query(&Aabb::centered(8., 8., 2., 2.)).contains(&0));
    }

    #[test]
    fn remove_clears_every_touched_cell() {
        let mut hash = SpatialHash::new(1.);
        hash.insert(0, Aabb::centered(5., 5., 6., 6.));
        hash.remove(0);
        assert!(hash.is_empty());
        assert!(hash.query(&Aabb::centered(5., 5., 10., 10.)).is_empty());
    }

    #[test]
    fn keys_are_collision_free_nearby() {
        let mut seen = std::collections::BTreeSet::new();
        for ix in -50..50 {
            for iz in -50..50 {
                assert!(seen.insert(CellKey::from((ix, iz))));
            }
        }
    }
}
