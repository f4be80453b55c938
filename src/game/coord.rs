/// Integer grid coordinates, the four travel directions and rectangular areas.
///
/// The grid is y-up: `Up` increases `y`, `Down` decreases it. Every level code
/// format and the tie-break order of the scheduler depend on this convention.

use serde::{Deserialize, Serialize};

// ============================================================================
// Position
// ============================================================================

/// A cell slot on the grid.
///
/// Ordering is `(x, y)` lexicographic so positions can key a `BTreeMap`
/// (undo batches rely on that for deterministic replay order).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ZERO: Position = Position { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring slot one step in `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> Position {
        let (dx, dy) = dir.offset();
        Position::new(self.x + dx, self.y + dy)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbours in `Direction::ALL` order.
    pub fn neighbors(self) -> [Position; 4] {
        Direction::ALL.map(|dir| self.step(dir))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

// ============================================================================
// Direction
// ============================================================================

/// One of the four facings a cell can have.
///
/// The discriminants are part of every wire format (V1/V3/J1 codes and the
/// multiplayer protocol), so they must never be reordered.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Right = 0,
    Down = 1,
    Left = 2,
    Up = 3,
}

impl Direction {
    /// All four directions in numeric order.
    pub const ALL: [Direction; 4] = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    /// Build a direction from any integer, wrapping modulo 4 (negative values included).
    #[inline]
    pub fn from_i32(value: i32) -> Direction {
        match value.rem_euclid(4) {
            0 => Direction::Right,
            1 => Direction::Down,
            2 => Direction::Left,
            _ => Direction::Up,
        }
    }

    #[inline]
    pub fn from_u8(value: u8) -> Direction {
        Direction::from_i32(value as i32)
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Unit step for this direction (y-up).
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, 1),
        }
    }

    /// Rotate by `quarter_turns` clockwise steps (negative = counter-clockwise).
    #[inline]
    pub fn rotate(self, quarter_turns: i32) -> Direction {
        Direction::from_i32(self as i32 + quarter_turns)
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        self.rotate(2)
    }

    /// Clockwise quarter turns needed to go from `self` to `other`, in `0..4`.
    #[inline]
    pub fn turns_to(self, other: Direction) -> i32 {
        (other as i32 - self as i32).rem_euclid(4)
    }

    /// Same axis (Right/Left or Down/Up).
    #[inline]
    pub fn is_parallel(self, other: Direction) -> bool {
        (self as u8) % 2 == (other as u8) % 2
    }
}

// ============================================================================
// Areas
// ============================================================================

/// Dimensions of a bounded grid. Valid positions are `0..width` × `0..height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    #[inline]
    pub fn area(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Row-major index used by all flattened level code formats.
    #[inline]
    pub fn index_of(&self, pos: Position) -> usize {
        (pos.x + pos.y * self.width) as usize
    }

    #[inline]
    pub fn position_of(&self, index: usize) -> Position {
        let width = self.width.max(1) as usize;
        Position::new((index % width) as i32, (index / width) as i32)
    }

    /// Toroidal wrap of an out-of-range position back into the grid.
    #[inline]
    pub fn wrap(&self, pos: Position) -> Position {
        Position::new(pos.x.rem_euclid(self.width.max(1)), pos.y.rem_euclid(self.height.max(1)))
    }
}

/// Rectangular selection anchored at its bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub bottom: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, bottom: i32, width: i32, height: i32) -> Self {
        Self { left, bottom, width, height }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.left
            && pos.y >= self.bottom
            && pos.x < self.left + self.width
            && pos.y < self.bottom + self.height
    }

    /// Every position in the rectangle, column by column.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width).flat_map(move |dx| {
            (0..self.height).map(move |dy| Position::new(self.left + dx, self.bottom + dy))
        })
    }
}

impl From<Size> for Rect {
    fn from(size: Size) -> Self {
        Rect::new(0, 0, size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_offsets_are_y_up() {
        assert_eq!(Position::ZERO.step(Direction::Right), Position::new(1, 0));
        assert_eq!(Position::ZERO.step(Direction::Down), Position::new(0, -1));
        assert_eq!(Position::ZERO.step(Direction::Left), Position::new(-1, 0));
        assert_eq!(Position::ZERO.step(Direction::Up), Position::new(0, 1));
    }

    #[test]
    fn test_rotation_algebra_wraps_mod_4() {
        assert_eq!(Direction::Right.rotate(1), Direction::Down);
        assert_eq!(Direction::Right.rotate(-1), Direction::Up);
        assert_eq!(Direction::Up.rotate(6), Direction::Down);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
        assert_eq!(Direction::Up.turns_to(Direction::Right), 1);
        assert_eq!(Direction::Right.turns_to(Direction::Up), 3);
        assert_eq!(Direction::from_i32(-5), Direction::Up);
    }

    #[test]
    fn test_size_wrap_is_toroidal() {
        let size = Size::new(4, 3);
        assert_eq!(size.wrap(Position::new(4, 1)), Position::new(0, 1));
        assert_eq!(size.wrap(Position::new(-1, 1)), Position::new(3, 1));
        assert_eq!(size.wrap(Position::new(2, 3)), Position::new(2, 0));
        assert_eq!(size.wrap(Position::new(2, -1)), Position::new(2, 2));
    }

    #[test]
    fn test_rect_positions_cover_area() {
        let rect = Rect::new(1, 2, 2, 3);
        let positions: Vec<_> = rect.positions().collect();
        assert_eq!(positions.len(), 6);
        assert!(positions.iter().all(|p| rect.contains(*p)));
        assert_eq!(positions[0], Position::new(1, 2));
    }
}
