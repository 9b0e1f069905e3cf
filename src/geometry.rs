//! Coordinates, walls and pawns.
//!
//! The board origin is the bottom-left cell. `Cell` addresses the 9x9 pawn
//! grid, `WallPoint` addresses the corners between cells where a wall's
//! midpoint sits. A horizontal wall at `(x, y)` lies on the line between rows
//! `y - 1` and `y`, spanning columns `x - 1` and `x`; a vertical wall at
//! `(x, y)` lies between columns `x - 1` and `x`, spanning rows `y - 1` and `y`.

use std::fmt;
use std::ops::{Add, Sub};

use crate::constants::{FENCE_SPACE_HEIGHT, FENCE_SPACE_WIDTH, HEIGHT, WIDTH};

/// A pawn cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn manhattan(self, other: Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    #[inline]
    pub fn is_inside(self) -> bool {
        (0..WIDTH).contains(&self.x) && (0..HEIGHT).contains(&self.y)
    }

    /// Row-major index into a `CELLS`-sized array. Only valid inside the board.
    #[inline]
    pub(crate) fn index(self) -> usize {
        (self.x + self.y * WIDTH) as usize
    }

    /// The eight wall placements that touch this cell's border.
    pub fn surrounding_walls(self) -> [Wall; 8] {
        let Cell { x, y } = self;
        [
            Wall::new(x, y, Orientation::Horizontal),
            Wall::new(x + 1, y, Orientation::Horizontal),
            Wall::new(x, y, Orientation::Vertical),
            Wall::new(x, y + 1, Orientation::Vertical),
            Wall::new(x, y + 1, Orientation::Horizontal),
            Wall::new(x + 1, y + 1, Orientation::Horizontal),
            Wall::new(x + 1, y, Orientation::Vertical),
            Wall::new(x + 1, y + 1, Orientation::Vertical),
        ]
    }
}

impl Add for Cell {
    type Output = Cell;

    fn add(self, rhs: Cell) -> Cell {
        Cell::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Cell {
    type Output = Cell;

    fn sub(self, rhs: Cell) -> Cell {
        Cell::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A single orthogonal step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit offset of this direction.
    pub fn offset(self) -> Cell {
        match self {
            Direction::Up => Cell::new(0, 1),
            Direction::Down => Cell::new(0, -1),
            Direction::Left => Cell::new(-1, 0),
            Direction::Right => Cell::new(1, 0),
        }
    }

    #[inline]
    pub fn step(self, from: Cell) -> Cell {
        from + self.offset()
    }

    /// The direction leading from `current` to an orthogonal neighbour `next`.
    pub fn between(current: Cell, next: Cell) -> Option<Direction> {
        let d = next - current;
        match (d.x, d.y) {
            (0, 1) => Some(Direction::Up),
            (0, -1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }
}

/// A wall midpoint on the corner lattice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WallPoint {
    pub x: i32,
    pub y: i32,
}

impl WallPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Walls never sit on the outer ring of the lattice.
    #[inline]
    pub fn is_inside(self) -> bool {
        (1..FENCE_SPACE_WIDTH - 1).contains(&self.x) && (1..FENCE_SPACE_HEIGHT - 1).contains(&self.y)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// A wall placement: orientation at a lattice point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Wall {
    pub point: WallPoint,
    pub orientation: Orientation,
}

impl Wall {
    pub const fn new(x: i32, y: i32, orientation: Orientation) -> Self {
        Self {
            point: WallPoint::new(x, y),
            orientation,
        }
    }
}

/// The row a pawn must reach.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GoalSide {
    MinY,
    MaxY,
}

impl GoalSide {
    pub fn row(self) -> i32 {
        match self {
            GoalSide::MinY => 0,
            GoalSide::MaxY => HEIGHT - 1,
        }
    }

    #[inline]
    pub fn contains(self, cell: Cell) -> bool {
        cell.y == self.row()
    }
}

/// A player identifier, rendered as a single character on the board dump.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlayerId(pub char);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pawn {
    pub id: PlayerId,
    pub goal: GoalSide,
    pub cell: Cell,
    pub fences_left: u32,
}

impl Pawn {
    pub fn new(id: PlayerId, goal: GoalSide, cell: Cell) -> Self {
        Self::with_fences(id, goal, cell, crate::constants::INITIAL_FENCES)
    }

    pub fn with_fences(id: PlayerId, goal: GoalSide, cell: Cell, fences_left: u32) -> Self {
        Self {
            id,
            goal,
            cell,
            fences_left,
        }
    }

    pub fn has_won(&self) -> bool {
        self.goal.contains(self.cell)
    }
}
