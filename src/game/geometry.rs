//! Grid geometry - facing directions and arena bounds

use serde::{Deserialize, Serialize};

/// Cardinal facing direction on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// Unit step for this direction. Screen coordinates: y grows downwards.
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Check that a tile lies inside a `width` x `height` arena
pub fn in_bounds(x: i32, y: i32, width: i32, height: i32) -> bool {
    (0..width).contains(&x) && (0..height).contains(&y)
}

/// Apply one step in `dir`, dropping each component that would leave the arena.
///
/// Returns the new position and whether any component was blocked.
pub fn step_clamped(x: i32, y: i32, dir: Direction, width: i32, height: i32) -> ((i32, i32), bool) {
    let (dx, dy) = dir.vector();
    let (cx, cy) = (x + dx, y + dy);

    let nx = if (0..width).contains(&cx) { cx } else { x };
    let ny = if (0..height).contains(&cy) { cy } else { y };

    let blocked = (nx, ny) != (cx, cy);
    ((nx, ny), blocked)
}
