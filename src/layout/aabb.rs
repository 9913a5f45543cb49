use crate::Meters;
use serde::Deserialize;
use serde::Serialize;

/// axis-aligned bounding box in room coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min_x: Meters,
    pub min_z: Meters,
    pub max_x: Meters,
    pub max_z: Meters,
}

impl Aabb {
    /// box of the given full width and depth centered on (x, z)
    pub fn centered(x: Meters, z: Meters, width: Meters, depth: Meters) -> Self {
        Self {
            min_x: x - width / 2.,
            min_z: z - depth / 2.,
            max_x: x + width / 2.,
            max_z: z + depth / 2.,
        }
    }

    pub fn width(&self) -> Meters {
        self.max_x - self.min_x
    }
    pub fn depth(&self) -> Meters {
        self.max_z - self.min_z
    }
    pub fn center(&self) -> (Meters, Meters) {
        (
            (self.min_x + self.max_x) / 2.,
            (self.min_z + self.max_z) / 2.,
        )
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_z < other.max_z
            && other.min_z < self.max_z
    }

    /// inter-edge separation. zero when the boxes touch or overlap;
    /// diagonal neighbors measure corner to corner.
    pub fn gap(&self, other: &Self) -> Meters {
        let dx = (self.min_x - other.max_x).max(other.min_x - self.max_x).max(0.);
        let dz = (self.min_z - other.max_z).max(other.min_z - self.max_z).max(0.);
        match (dx > 0., dz > 0.) {
            (true, true) => dx.hypot(dz),
            _ => dx.max(dz),
        }
    }

    pub fn inflate(&self, by: Meters) -> Self {
        Self {
            min_x: self.min_x - by,
            min_z: self.min_z - by,
            max_x: self.max_x + by,
            max_z: self.max_z + by,
        }
    }

    /// slab test: does the segment from (x0, z0) to (x1, z1) pass
    /// through the interior of this box?
    pub fn blocks_segment(&self, (x0, z0): (Meters, Meters), (x1, z1): (Meters, Meters)) -> bool {
        let dx = x1 - x0;
        let dz = z1 - z0;
        let mut enter = 0f64;
        let mut exit = 1f64;
        for (delta, origin, lo, hi) in [
            (dx, x0, self.min_x, self.max_x),
            (dz, z0, self.min_z, self.max_z),
        ] {
            if delta.abs() < 1e-12 {
                if origin <= lo || origin >= hi {
                    return false;
                }
                continue;
            }
            let t0 = (lo - origin) / delta;
            let t1 = (hi - origin) / delta;
            let (near, far) = (t0.min(t1), t0.max(t1));
            enter = enter.max(near);
            exit = exit.min(far);
            if enter >= exit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_box_has_given_extent() {
        let b = Aabb::centered(5., 5., 2., 4.);
        assert!(b.min_x == 4. && b.max_x == 6.);
        assert!(b.min_z == 3. && b.max_z == 7.);
        assert!(b.width() == 2. && b.depth() == 4.);
    }

    #[test]
    fn gap_is_zero_on_overlap() {
        let a = Aabb::centered(0., 0., 2., 2.);
        let b = Aabb::centered(1., 0., 2., 2.);
        assert!(a.intersects(&b));
        assert!(a.gap(&b) == 0.);
    }

    #[test]
    fn gap_measures_single_axis_separation() {
        let a = Aabb::centered(0., 0., 2., 2.);
        let b = Aabb::centered(3.5, 0., 2., 2.);
        assert!(!a.intersects(&b));
        assert!((a.gap(&b) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn gap_measures_diagonal_separation() {
        let a = Aabb::centered(0., 0., 2., 2.);
        let b = Aabb::centered(5., 5., 2., 2.);
        let expected = (3f64 * 3. + 3. * 3.).sqrt();
        assert!((a.gap(&b) - expected).abs() < 1e-12);
    }

    #[test]
    fn segment_through_interior_is_blocked() {
        let b = Aabb::centered(5., 5., 2., 2.);
        assert!(b.blocks_segment((0., 5.), (10., 5.)));
        assert!(!b.blocks_segment((0., 0.), (10., 0.)));
        // grazing an edge does not block
        assert!(!b.blocks_segment((0., 4.), (10., 4.)));
    }

    #[test]
    fn vertical_segment_against_slab() {
        let b = Aabb::centered(5., 5., 2., 2.);
        assert!(b.blocks_segment((5., 0.), (5., 10.)));
        assert!(!b.blocks_segment((7., 0.), (7., 10.)));
    }
}
