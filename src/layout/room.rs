use super::aabb::Aabb;
use crate::Arbitrary;
use crate::Meters;
use crate::Radians;
use serde::Deserialize;
use serde::Serialize;

/// a doorway along the room perimeter. the facing angle points out of
/// the room, 0 = +x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    pub x: Meters,
    pub z: Meters,
    pub opening: Meters,
    pub facing: Radians,
}

impl Exit {
    /// keep-clear box around the doorway
    pub fn zone(&self, clearance: Meters) -> Aabb {
        Aabb::centered(
            self.x,
            self.z,
            self.opening + 2. * clearance,
            self.opening + 2. * clearance,
        )
    }
    pub fn distance_to(&self, x: Meters, z: Meters) -> Meters {
        (self.x - x).hypot(self.z - z)
    }
}

/// an immovable rectangle (column, planter, service station).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: Meters,
    pub z: Meters,
    pub width: Meters,
    pub depth: Meters,
}

impl Obstacle {
    pub fn aabb(&self) -> Aabb {
        Aabb::centered(self.x, self.z, self.width, self.depth)
    }
}

/// what every seat should be able to see.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: Meters,
    pub z: Meters,
}

/// the rectangular floor being planned. origin at the bottom-left
/// corner, x rightward, z forward. immutable to the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub width: Meters,
    pub depth: Meters,
    pub exits: Vec<Exit>,
    pub obstacles: Vec<Obstacle>,
    pub focal_point: Option<FocalPoint>,
}

impl Room {
    pub fn new(width: Meters, depth: Meters) -> Self {
        Self {
            width,
            depth,
            exits: vec![],
            obstacles: vec![],
            focal_point: None,
        }
    }
    pub fn with_exit(mut self, exit: Exit) -> Self {
        self.exits.push(exit);
        self
    }
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }
    pub fn with_focal_point(mut self, x: Meters, z: Meters) -> Self {
        self.focal_point = Some(FocalPoint { x, z });
        self
    }

    pub fn area(&self) -> f64 {
        self.width * self.depth
    }
    pub fn diagonal(&self) -> Meters {
        self.width.hypot(self.depth)
    }
    pub fn bounds(&self) -> Aabb {
        Aabb {
            min_x: 0.,
            min_z: 0.,
            max_x: self.width,
            max_z: self.depth,
        }
    }
    /// does the box sit inside the floor, within tolerance?
    pub fn contains(&self, aabb: &Aabb) -> bool {
        const TOLERANCE: Meters = 1e-6;
        aabb.min_x >= -TOLERANCE
            && aabb.min_z >= -TOLERANCE
            && aabb.max_x <= self.width + TOLERANCE
            && aabb.max_z <= self.depth + TOLERANCE
    }
}

impl Arbitrary for Room {
    fn random() -> Self {
        let width = 8. + rand::random::<f64>() * 16.;
        let depth = 6. + rand::random::<f64>() * 12.;
        Self::new(width, depth).with_exit(Exit {
            x: width / 2.,
            z: depth,
            opening: 1.8,
            facing: std::f64::consts::FRAC_PI_2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_zone_spans_opening_plus_clearance() {
        let exit = Exit {
            x: 5.,
            z: 0.,
            opening: 2.,
            facing: 0.,
        };
        let zone = exit.zone(1.12);
        assert!((zone.width() - (2. + 2.24)).abs() < 1e-12);
        assert!(zone.min_x < 5. && zone.max_x > 5.);
    }

    #[test]
    fn contains_tolerates_boundary_contact() {
        let room = Room::new(10., 8.);
        assert!(room.contains(&Aabb::centered(5., 4., 10., 8.)));
        assert!(!room.contains(&Aabb::centered(5., 4., 10.1, 8.)));
    }
}
