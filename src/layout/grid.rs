use super::aabb::Aabb;
use super::room::Room;
use crate::Meters;

/// what a grid cell is currently holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
    Obstacle,
    Occupied,
    ExitZone,
}

/// uniform occupancy discretization of the floor.
///
/// walls ring the outermost cells; obstacles and exit keep-clear zones
/// are painted once at construction and never change. placements flip
/// cells between empty and occupied only.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cell: Meters,
    nx: usize,
    nz: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(room: &Room, cell: Meters, exit_clearance: Meters) -> Self {
        let nx = (room.width / cell).ceil() as usize;
        let nz = (room.depth / cell).ceil() as usize;
        let mut this = Self {
            cell,
            nx,
            nz,
            cells: vec![Cell::Empty; nx * nz],
        };
        for ix in 0..nx {
            for iz in 0..nz {
                if ix == 0 || iz == 0 || ix == nx - 1 || iz == nz - 1 {
                    this.cells[iz * nx + ix] = Cell::Wall;
                }
            }
        }
        for obstacle in room.obstacles.iter() {
            this.paint(&obstacle.aabb(), Cell::Obstacle);
        }
        for exit in room.exits.iter() {
            this.paint(&exit.zone(exit_clearance), Cell::ExitZone);
        }
        this
    }

    pub fn cell_size(&self) -> Meters {
        self.cell
    }
    /// nearest lattice point
    pub fn snap(&self, x: Meters) -> Meters {
        (x / self.cell).round() * self.cell
    }

    /// inclusive cell index range covered by [lo, hi)
    fn span(&self, lo: Meters, hi: Meters) -> std::ops::RangeInclusive<i64> {
        let first = (lo / self.cell).floor() as i64;
        let last = (hi / self.cell - 1e-9).ceil() as i64 - 1;
        first..=last.max(first)
    }

    fn at(&self, ix: i64, iz: i64) -> Cell {
        match ix >= 0 && iz >= 0 && (ix as usize) < self.nx && (iz as usize) < self.nz {
            true => self.cells[iz as usize * self.nx + ix as usize],
            false => Cell::Wall,
        }
    }

    fn paint(&mut self, aabb: &Aabb, cell: Cell) {
        for iz in self.span(aabb.min_z, aabb.max_z) {
            for ix in self.span(aabb.min_x, aabb.max_x) {
                if ix >= 0 && iz >= 0 && (ix as usize) < self.nx && (iz as usize) < self.nz {
                    self.cells[iz as usize * self.nx + ix as usize] = cell;
                }
            }
        }
    }

    /// true only if every covered cell is empty
    pub fn can_place(&self, aabb: &Aabb) -> bool {
        self.span(aabb.min_z, aabb.max_z).all(|iz| {
            self.span(aabb.min_x, aabb.max_x)
                .all(|ix| self.at(ix, iz) == Cell::Empty)
        })
    }

    /// claim the footprint. painted cells (walls, obstacles, exit
    /// zones) are left alone.
    pub fn occupy(&mut self, aabb: &Aabb) {
        self.flip(aabb, Cell::Empty, Cell::Occupied);
    }
    /// release the footprint
    pub fn vacate(&mut self, aabb: &Aabb) {
        self.flip(aabb, Cell::Occupied, Cell::Empty);
    }
    fn flip(&mut self, aabb: &Aabb, from: Cell, to: Cell) {
        for iz in self.span(aabb.min_z, aabb.max_z) {
            for ix in self.span(aabb.min_x, aabb.max_x) {
                if ix >= 0 && iz >= 0 && (ix as usize) < self.nx && (iz as usize) < self.nz {
                    let cell = &mut self.cells[iz as usize * self.nx + ix as usize];
                    if *cell == from {
                        *cell = to;
                    }
                }
            }
        }
    }

    /// a walkable strip of at least min_aisle must be empty on both
    /// x-sides or on both z-sides of the footprint
    pub fn has_aisle_clearance(&self, aabb: &Aabb, min_aisle: Meters) -> bool {
        let reach = (min_aisle / self.cell).ceil() as i64;
        let xs = self.span(aabb.min_x, aabb.max_x);
        let zs = self.span(aabb.min_z, aabb.max_z);
        let strip_x = |from: i64, step: i64| {
            (1..=reach).all(|k| {
                zs.clone()
                    .all(|iz| self.at(from + step * k, iz) == Cell::Empty)
            })
        };
        let strip_z = |from: i64, step: i64| {
            (1..=reach).all(|k| {
                xs.clone()
                    .all(|ix| self.at(ix, from + step * k) == Cell::Empty)
            })
        };
        let across_x = strip_x(*xs.start(), -1) && strip_x(*xs.end(), 1);
        let across_z = strip_z(*zs.start(), -1) && strip_z(*zs.end(), 1);
        across_x || across_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::room::Obstacle;

    fn grid() -> Grid {
        Grid::new(&Room::new(10., 8.), crate::GRID_CELL_SIZE, crate::EXIT_CLEARANCE)
    }

    #[test]
    fn interior_is_placeable_boundary_is_not() {
        let g = grid();
        assert!(g.can_place(&Aabb::centered(5., 4., 1., 1.)));
        assert!(!g.can_place(&Aabb::centered(0., 4., 1., 1.)));
        assert!(!g.can_place(&Aabb::centered(5., 8., 1., 1.)));
    }

    #[test]
    fn occupy_then_vacate_roundtrips() {
        let mut g = grid();
        let before = g.clone();
        let footprint = Aabb::centered(5., 4., 1.5, 0.8);
        g.occupy(&footprint);
        assert!(!g.can_place(&footprint));
        g.vacate(&footprint);
        assert!(g == before);
    }

    #[test]
    fn obstacles_are_painted_and_immune_to_vacate() {
        let room = Room::new(10., 8.).with_obstacle(Obstacle {
            x: 5.,
            z: 4.,
            width: 2.,
            depth: 2.,
        });
        let mut g = Grid::new(&room, crate::GRID_CELL_SIZE, crate::EXIT_CLEARANCE);
        let blocked = Aabb::centered(5., 4., 1., 1.);
        assert!(!g.can_place(&blocked));
        g.vacate(&blocked);
        assert!(!g.can_place(&blocked));
    }

    #[test]
    fn aisle_clearance_requires_both_sides() {
        let mut g = grid();
        let subject = Aabb::centered(5., 4., 1., 1.);
        assert!(g.has_aisle_clearance(&subject, crate::MIN_AISLE_WIDTH));
        // box in a tight pocket: neighbors crowd both x sides and both z sides
        g.occupy(&Aabb::centered(3.9, 4., 0.6, 6.));
        g.occupy(&Aabb::centered(6.1, 4., 0.6, 6.));
        g.occupy(&Aabb::centered(5., 2.9, 6., 0.6));
        g.occupy(&Aabb::centered(5., 5.1, 6., 0.6));
        assert!(!g.has_aisle_clearance(&subject, crate::MIN_AISLE_WIDTH));
    }

    #[test]
    fn snap_lands_on_lattice() {
        let g = grid();
        let snapped = g.snap(1.37);
        assert!((snapped / g.cell_size()).fract().abs() < 1e-9);
    }
}
