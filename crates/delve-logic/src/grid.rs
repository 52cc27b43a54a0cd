//! Grid primitives — cells, points, directions, the map, room rectangles.
//!
//! The grid is structurally immutable after generation: walls and floors
//! never change mid-run. Entity contents (monsters, potions, the player)
//! are tracked separately and overlaid at render time.

use serde::{Deserialize, Serialize};

/// A single map cell: impassable rock or walkable floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Floor,
}

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell one step in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Four-way movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit offset for this direction. `Up` decreases y (row 0 is the top).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Fixed-size map of wall/floor cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid with every cell set to `fill`.
    pub fn filled(width: i32, height: i32, fill: Cell) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![fill; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    /// Cell kind at `p`. Out-of-bounds reads resolve as `Wall`, so callers
    /// never need a separate bounds check before a walkability test.
    pub fn get(&self, p: Point) -> Cell {
        if self.in_bounds(p) {
            self.cells[self.index(p)]
        } else {
            Cell::Wall
        }
    }

    /// Set the cell at `p`. Out-of-bounds writes are ignored, which lets
    /// corridor carving run off the edge harmlessly.
    pub fn set(&mut self, p: Point, cell: Cell) {
        if self.in_bounds(p) {
            let idx = self.index(p);
            self.cells[idx] = cell;
        }
    }

    pub fn is_floor(&self, p: Point) -> bool {
        self.get(p) == Cell::Floor
    }

    /// All floor cells in row-major order.
    pub fn floor_cells(&self) -> Vec<Point> {
        let mut floors = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let p = Point::new(x, y);
                if self.is_floor(p) {
                    floors.push(p);
                }
            }
        }
        floors
    }

    fn index(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }
}

/// Axis-aligned rectangle used for room carving and corridor anchoring.
/// Not retained after placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Strict overlap test. Touching edges do not count as intersection, so
    /// adjacent rooms may share a wall line.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x + self.w <= other.x
            || other.x + other.w <= self.x
            || self.y + self.h <= other.y
            || other.y + other.h <= self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_grid() {
        let grid = Grid::filled(20, 10, Cell::Wall);
        assert_eq!(grid.width(), 20);
        assert_eq!(grid.height(), 10);
        assert!(!grid.is_floor(Point::new(0, 0)));
        assert!(grid.floor_cells().is_empty());
    }

    #[test]
    fn test_out_of_bounds_reads_as_wall() {
        let grid = Grid::filled(5, 5, Cell::Floor);
        assert!(grid.is_floor(Point::new(4, 4)));
        assert_eq!(grid.get(Point::new(-1, 0)), Cell::Wall);
        assert_eq!(grid.get(Point::new(5, 0)), Cell::Wall);
        assert_eq!(grid.get(Point::new(0, 5)), Cell::Wall);
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::filled(5, 5, Cell::Wall);
        grid.set(Point::new(2, 3), Cell::Floor);
        assert!(grid.is_floor(Point::new(2, 3)));
        assert_eq!(grid.floor_cells(), vec![Point::new(2, 3)]);
        // out-of-bounds write is a no-op
        grid.set(Point::new(9, 9), Cell::Floor);
        assert_eq!(grid.floor_cells().len(), 1);
    }

    #[test]
    fn test_direction_deltas() {
        let p = Point::new(3, 3);
        assert_eq!(p.step(Direction::Up), Point::new(3, 2));
        assert_eq!(p.step(Direction::Down), Point::new(3, 4));
        assert_eq!(p.step(Direction::Left), Point::new(2, 3));
        assert_eq!(p.step(Direction::Right), Point::new(4, 3));
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Point::new(0, 0).manhattan(Point::new(3, 4)), 7);
        assert_eq!(Point::new(3, 4).manhattan(Point::new(3, 4)), 0);
    }

    #[test]
    fn test_rect_center() {
        let r = Rect::new(2, 2, 4, 3);
        assert_eq!(r.center(), Point::new(4, 3));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(1, 1, 4, 4);
        let b = Rect::new(3, 3, 4, 4);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_rect_touching_is_not_overlap() {
        let a = Rect::new(1, 1, 4, 4);
        let b = Rect::new(5, 1, 4, 4); // shares the x=5 edge
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_rect_disjoint() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(10, 10, 2, 2);
        assert!(!a.intersects(&b));
    }
}
