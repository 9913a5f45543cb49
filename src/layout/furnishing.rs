use crate::Meters;
use serde::Deserialize;
use serde::Serialize;

/// every footprint shape the solver knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Chair,
    RoundTable,
    RectTable,
    TrestleTable,
    Podium,
    Stage,
    Bar,
}

impl Kind {
    pub fn is_chair(&self) -> bool {
        matches!(self, Self::Chair)
    }
    pub fn is_round(&self) -> bool {
        matches!(self, Self::RoundTable)
    }
}

/// wall or quadrant a spec is pinned to. north is small z, toward the
/// head of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    North,
    South,
    East,
    West,
    Center,
}

impl Zone {
    /// canonical anchor point for the zone
    pub fn anchor(&self, width: Meters, depth: Meters) -> (Meters, Meters) {
        match self {
            Self::North => (width / 2., depth * 0.15),
            Self::South => (width / 2., depth * 0.85),
            Self::East => (width * 0.85, depth / 2.),
            Self::West => (width * 0.15, depth / 2.),
            Self::Center => (width / 2., depth / 2.),
        }
    }
}

/// one line item of the furnishing request: how many of which footprint,
/// and any placement pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureSpec {
    pub kind: Kind,
    pub width: Meters,
    pub depth: Meters,
    pub count: usize,
    /// zero means not a grouping table
    pub chairs_per_unit: usize,
    pub wall_adjacent: bool,
    pub fixed_zone: Option<Zone>,
}

impl FurnitureSpec {
    pub fn new(kind: Kind, width: Meters, depth: Meters, count: usize) -> Self {
        Self {
            kind,
            width,
            depth,
            count,
            chairs_per_unit: 0,
            wall_adjacent: false,
            fixed_zone: None,
        }
    }
    pub fn with_chairs(mut self, chairs_per_unit: usize) -> Self {
        self.chairs_per_unit = chairs_per_unit;
        self
    }
    pub fn against_wall(mut self) -> Self {
        self.wall_adjacent = true;
        self
    }
    pub fn pinned(mut self, zone: Zone) -> Self {
        self.fixed_zone = Some(zone);
        self
    }

    pub fn footprint(&self) -> f64 {
        self.width * self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn north_anchor_is_near_the_head_wall() {
        let (x, z) = Zone::North.anchor(15., 12.);
        assert!(x == 7.5);
        assert!(z < 6.);
    }

    #[test]
    fn builder_sets_pins() {
        let spec = FurnitureSpec::new(Kind::Stage, 4., 2., 1).pinned(Zone::North);
        assert!(spec.fixed_zone == Some(Zone::North));
        assert!(spec.footprint() == 8.);
    }
}
