//! Single-step pathfinding for grid agents.
//!
//! `next_step` computes the first move of a shortest route via BFS over
//! 4-directional floor adjacency. Other agents count as blocked cells except
//! the target itself, so a chaser can always step onto its quarry. When no
//! path exists the function degrades to a greedy axis step, and when even
//! that is illegal it stays put — the function is total.

use std::collections::VecDeque;

use crate::grid::{Grid, Point};

/// Neighbor expansion order: +x, −x, +y, −y. Fixed so that equal-length
/// paths resolve identically on every run with the same inputs.
const NEIGHBOR_ORDER: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// First cell after `start` along a shortest path to `target`.
///
/// - `start == target` returns `start` (no-op).
/// - Cells in `occupied` are impassable unless they equal `target`.
/// - With no BFS path, tries one greedy step along the axis with the larger
///   distance to cover (ties favor horizontal), then the other axis.
/// - Returns `start` when no legal step exists.
pub fn next_step(grid: &Grid, start: Point, target: Point, occupied: &[Point]) -> Point {
    if start == target {
        return start;
    }

    let blocked = |p: Point| -> bool {
        if !grid.is_floor(p) {
            return true;
        }
        p != target && occupied.contains(&p)
    };

    if let Some(step) = bfs_first_step(grid, start, target, &blocked) {
        return step;
    }

    greedy_step(start, target, &blocked)
}

/// BFS from `start`; on reaching `target`, backtracks the parent chain to
/// the first step out of `start`. `None` when `target` is unreachable.
fn bfs_first_step(
    grid: &Grid,
    start: Point,
    target: Point,
    blocked: &impl Fn(Point) -> bool,
) -> Option<Point> {
    let width = grid.width();
    let cells = (width * grid.height()) as usize;
    let index = |p: Point| (p.y * width + p.x) as usize;

    let mut visited = vec![false; cells];
    let mut parent: Vec<Option<Point>> = vec![None; cells];
    let mut queue = VecDeque::new();

    visited[index(start)] = true;
    queue.push_back(start);

    let mut found = false;
    'search: while let Some(cur) = queue.pop_front() {
        for (dx, dy) in NEIGHBOR_ORDER {
            let next = Point::new(cur.x + dx, cur.y + dy);
            if !grid.in_bounds(next) || visited[index(next)] || blocked(next) {
                continue;
            }
            visited[index(next)] = true;
            parent[index(next)] = Some(cur);
            if next == target {
                found = true;
                break 'search;
            }
            queue.push_back(next);
        }
    }

    if !found {
        return None;
    }

    // Walk the parent chain back from the target until the cell whose
    // parent is the start — that cell is the first step.
    let mut cur = target;
    loop {
        let prev = parent[index(cur)]?;
        if prev == start {
            return Some(cur);
        }
        cur = prev;
    }
}

fn greedy_step(start: Point, target: Point, blocked: &impl Fn(Point) -> bool) -> Point {
    let dx = (target.x - start.x).signum();
    let dy = (target.y - start.y).signum();
    let horizontal = Point::new(start.x + dx, start.y);
    let vertical = Point::new(start.x, start.y + dy);

    let (first, second) = if (target.x - start.x).abs() >= (target.y - start.y).abs() {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };

    if first != start && !blocked(first) {
        first
    } else if second != start && !blocked(second) {
        second
    } else {
        start
    }
}
