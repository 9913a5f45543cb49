use super::aabb::Aabb;
use super::furnishing::FurnitureSpec;
use super::furnishing::Kind;
use crate::Meters;
use crate::Radians;
use serde::Deserialize;
use serde::Serialize;

/// a single furnishing instance standing on the floor.
///
/// rotation is snapped to a cardinal; width and depth are the effective
/// extents after that rotation (the short and long axes swap on odd
/// quarter turns), so the AABB never needs to re-derive them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// index into the request's spec list
    pub spec: usize,
    /// which of the spec's count this is
    pub instance: usize,
    pub x: Meters,
    pub z: Meters,
    pub rotation: Radians,
    pub width: Meters,
    pub depth: Meters,
    pub kind: Kind,
}

impl Placement {
    pub fn new(
        spec: usize,
        instance: usize,
        from: &FurnitureSpec,
        x: Meters,
        z: Meters,
        cardinal: usize,
    ) -> Self {
        let (width, depth) = match cardinal % 2 {
            0 => (from.width, from.depth),
            _ => (from.depth, from.width),
        };
        Self {
            spec,
            instance,
            x,
            z,
            rotation: cardinal as f64 * std::f64::consts::FRAC_PI_2,
            width,
            depth,
            kind: from.kind,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::centered(self.x, self.z, self.width, self.depth)
    }
    pub fn cardinal(&self) -> usize {
        ((self.rotation / std::f64::consts::FRAC_PI_2).round() as i64).rem_euclid(4) as usize
    }

    /// same footprint elsewhere
    pub fn moved_to(&self, x: Meters, z: Meters) -> Self {
        Self { x, z, ..*self }
    }
    /// quarter turn: toggles between cardinal 0 and 1 and swaps extents
    pub fn turned(&self) -> Self {
        Self {
            rotation: match self.cardinal() % 2 {
                0 => std::f64::consts::FRAC_PI_2,
                _ => 0.,
            },
            width: self.depth,
            depth: self.width,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> FurnitureSpec {
        FurnitureSpec::new(Kind::RectTable, 1.8, 0.8, 1)
    }

    #[test]
    fn odd_cardinals_swap_extents() {
        let flat = Placement::new(0, 0, &spec(), 5., 5., 0);
        let turned = Placement::new(0, 0, &spec(), 5., 5., 1);
        assert!(flat.width == 1.8 && flat.depth == 0.8);
        assert!(turned.width == 0.8 && turned.depth == 1.8);
        assert!(turned.cardinal() == 1);
    }

    #[test]
    fn turned_is_involutive_on_extents() {
        let p = Placement::new(0, 0, &spec(), 5., 5., 0);
        let back = p.turned().turned();
        assert!(back.width == p.width);
        assert!(back.depth == p.depth);
        assert!(back.cardinal() == 0);
    }

    #[test]
    fn aabb_matches_effective_extents() {
        let p = Placement::new(0, 0, &spec(), 5., 5., 1);
        let aabb = p.aabb();
        assert!((aabb.width() - 0.8).abs() < 1e-12);
        assert!((aabb.depth() - 1.8).abs() < 1e-12);
    }
}
