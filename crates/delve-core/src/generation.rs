//! Dungeon synthesis — room-and-corridor carving.
//!
//! The map starts as solid rock. Candidate rooms are sampled until they fit
//! without overlapping an accepted room, each new room is linked to the
//! previous one by an L-shaped corridor, and a degenerate zero-floor map
//! falls back to an open interior. The whole process is a pure function of
//! the RNG stream: the same seed always carves the same dungeon.

use delve_logic::grid::{Cell, Grid, Point, Rect};
use rand::Rng;

/// Knobs for map synthesis. Defaults mirror the classic 20×10 layout.
#[derive(Debug, Clone)]
pub struct DungeonConfig {
    pub width: i32,
    pub height: i32,
    /// Inclusive range for the number of rooms to carve.
    pub rooms_min: u32,
    pub rooms_max: u32,
    /// Inclusive ranges for candidate room dimensions.
    pub room_w_min: i32,
    pub room_w_max: i32,
    pub room_h_min: i32,
    pub room_h_max: i32,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 10,
            rooms_min: 3,
            rooms_max: 6,
            room_w_min: 3,
            room_w_max: 8,
            room_h_min: 3,
            room_h_max: 5,
        }
    }
}

/// Carved map plus the rooms that produced it. The rooms are only needed
/// for initial placement and are not retained in the session.
#[derive(Debug, Clone)]
pub struct Dungeon {
    pub grid: Grid,
    pub rooms: Vec<Rect>,
}

/// Rejected candidates allowed per room slot before the slot is abandoned.
/// Rejection retries the same slot; the accepted-room counter only advances
/// on acceptance.
const MAX_ROOM_ATTEMPTS: u32 = 200;

/// Carve a room-and-corridor dungeon.
pub fn generate_dungeon(config: &DungeonConfig, rng: &mut impl Rng) -> Dungeon {
    assert!(
        config.room_w_max <= config.width - 2 && config.room_h_max <= config.height - 2,
        "room dimension ranges must fit inside the border margin"
    );

    let mut grid = Grid::filled(config.width, config.height, Cell::Wall);
    let mut rooms: Vec<Rect> = Vec::new();
    let target = rng.gen_range(config.rooms_min..=config.rooms_max) as usize;

    while rooms.len() < target {
        let mut accepted = None;
        for _ in 0..MAX_ROOM_ATTEMPTS {
            let w = rng.gen_range(config.room_w_min..=config.room_w_max);
            let h = rng.gen_range(config.room_h_min..=config.room_h_max);
            // Position keeps a 1-cell rock border on every side.
            let x = rng.gen_range(1..=config.width - w - 1);
            let y = rng.gen_range(1..=config.height - h - 1);
            let candidate = Rect::new(x, y, w, h);
            if rooms.iter().any(|r| candidate.intersects(r)) {
                continue;
            }
            accepted = Some(candidate);
            break;
        }
        let Some(room) = accepted else {
            log::warn!(
                "room carving exhausted after {} of {} rooms",
                rooms.len(),
                target
            );
            break;
        };
        carve_room(&mut grid, &room);
        if let Some(prev) = rooms.last() {
            connect(&mut grid, prev.center(), room.center(), rng);
        }
        rooms.push(room);
    }

    // Degenerate map with no floor at all: open the whole interior so the
    // dungeon is guaranteed traversable.
    if grid.floor_cells().is_empty() {
        for y in 1..config.height - 1 {
            for x in 1..config.width - 1 {
                grid.set(Point::new(x, y), Cell::Floor);
            }
        }
    }

    Dungeon { grid, rooms }
}

/// Uniform random floor cell, or `None` on an all-rock grid.
pub fn random_floor_cell(grid: &Grid, rng: &mut impl Rng) -> Option<Point> {
    let floors = grid.floor_cells();
    if floors.is_empty() {
        None
    } else {
        Some(floors[rng.gen_range(0..floors.len())])
    }
}

fn carve_room(grid: &mut Grid, room: &Rect) {
    for y in room.y..room.y + room.h {
        for x in room.x..room.x + room.w {
            grid.set(Point::new(x, y), Cell::Floor);
        }
    }
}

/// L-shaped corridor between two room centers, leg order chosen uniformly.
fn connect(grid: &mut Grid, from: Point, to: Point, rng: &mut impl Rng) {
    if rng.gen_range(0..2) == 0 {
        carve_h(grid, from.x, to.x, from.y);
        carve_v(grid, from.y, to.y, to.x);
    } else {
        carve_v(grid, from.y, to.y, from.x);
        carve_h(grid, from.x, to.x, to.y);
    }
}

fn carve_h(grid: &mut Grid, x1: i32, x2: i32, y: i32) {
    for x in x1.min(x2)..=x1.max(x2) {
        grid.set(Point::new(x, y), Cell::Floor);
    }
}

fn carve_v(grid: &mut Grid, y1: i32, y2: i32, x: i32) {
    for y in y1.min(y2)..=y1.max(y2) {
        grid.set(Point::new(x, y), Cell::Floor);
    }
}
