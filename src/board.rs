//! Board rules: pawn movement, jumps and wall placement.
//!
//! `BoardState` holds the wall map and the pawns. It answers legality
//! questions and applies moves and walls; turn order lives in
//! [`GameState`](crate::game::GameState).

use std::fmt;

use crate::constants::{FENCE_SPACE_HEIGHT, FENCE_SPACE_WIDTH, HEIGHT, WIDTH};
use crate::error::ActionError;
use crate::geometry::{Cell, Direction, Orientation, Pawn, PlayerId, Wall, WallPoint};
use crate::path_finder::PathFinder;
use crate::wall_map::WallMap;

/// Orthogonal neighbour offsets.
const AROUNDS: [Cell; 4] = [Cell::new(0, 1), Cell::new(0, -1), Cell::new(1, 0), Cell::new(-1, 0)];

/// Offsets reachable only by jumping over an adjacent pawn.
const HOP_AROUNDS: [Cell; 8] = [
    Cell::new(-1, -1),
    Cell::new(-1, 1),
    Cell::new(1, -1),
    Cell::new(1, 1),
    Cell::new(0, 2),
    Cell::new(0, -2),
    Cell::new(2, 0),
    Cell::new(-2, 0),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardState {
    walls: WallMap,
    pawns: Vec<Pawn>,
}

impl BoardState {
    /// Create a board with no walls.
    ///
    /// # Panics
    ///
    /// Panics if two pawns share an id or a cell.
    pub fn new(pawns: Vec<Pawn>) -> Self {
        for (i, p) in pawns.iter().enumerate() {
            assert!(
                pawns[..i].iter().all(|q| q.id != p.id),
                "duplicate pawn id {}",
                p.id
            );
            assert!(
                pawns[..i].iter().all(|q| q.cell != p.cell),
                "pawns share cell {}",
                p.cell
            );
        }
        Self {
            walls: WallMap::new(),
            pawns,
        }
    }

    /// Replace the wall map wholesale, bypassing legality checks.
    pub fn set_wall_map(&mut self, walls: WallMap) {
        self.walls = walls;
    }

    pub fn with_wall_map(mut self, walls: WallMap) -> Self {
        self.set_wall_map(walls);
        self
    }

    pub fn walls(&self) -> &WallMap {
        &self.walls
    }

    pub fn pawns(&self) -> &[Pawn] {
        &self.pawns
    }

    /// Every placed wall, scanning x then y.
    pub fn all_walls(&self) -> Vec<Wall> {
        self.walls.iter().collect()
    }

    /// A path finder over the current walls.
    pub fn path_finder(&self) -> PathFinder {
        PathFinder::new(self.walls)
    }

    fn pawn_index(&self, id: PlayerId) -> usize {
        self.pawns
            .iter()
            .position(|p| p.id == id)
            .unwrap_or_else(|| panic!("no pawn with id {id}"))
    }

    /// The pawn owned by `id`.
    ///
    /// # Panics
    ///
    /// Panics if no pawn has that id.
    pub fn pawn(&self, id: PlayerId) -> &Pawn {
        &self.pawns[self.pawn_index(id)]
    }

    fn is_occupied(&self, cell: Cell) -> bool {
        self.pawns.iter().any(|p| p.cell == cell)
    }

    /// Whether the pawn of `id` may move to `to` this turn.
    ///
    /// Single steps need a free, unwalled neighbour. Two-cell moves are jumps
    /// over an adjacent pawn: straight over it when the cell behind is open,
    /// otherwise diagonally to either side of it.
    pub fn can_move_pawn(&self, id: PlayerId, to: Cell) -> bool {
        if !to.is_inside() {
            return false;
        }

        let pawn = self.pawn(id);
        match pawn.cell.manhattan(to) {
            1 => !self.exists_fence_between(pawn.cell, to) && !self.is_occupied(to),
            2 => !self.is_occupied(to) && self.can_jump(pawn, to),
            _ => false,
        }
    }

    fn can_jump(&self, pawn: &Pawn, to: Cell) -> bool {
        for other in self.pawns.iter().filter(|p| p.id != pawn.id) {
            for advance in AROUNDS {
                if pawn.cell + advance != other.cell
                    || self.exists_fence_between(pawn.cell, other.cell)
                    || self.exists_fence_between(other.cell, to)
                {
                    continue;
                }

                let behind = other.cell + advance;
                let blocked = self.exists_fence_between(other.cell, behind) || !behind.is_inside();
                if blocked {
                    if behind != to && other.cell.manhattan(to) == 1 {
                        return true;
                    }
                } else if behind == to {
                    return true;
                }
            }
        }
        false
    }

    /// Move the pawn of `id` to `to` if legal.
    pub fn move_pawn(&mut self, id: PlayerId, to: Cell) -> Result<(), ActionError> {
        if !self.can_move_pawn(id, to) {
            return Err(ActionError::CannotMove);
        }
        let i = self.pawn_index(id);
        self.pawns[i].cell = to;
        Ok(())
    }

    /// Whether a wall may be placed at `at`, ignoring whose turn it is.
    ///
    /// Rejects out-of-range points, occupied points and same-orientation
    /// neighbours along the wall's axis. A wall touching others at two of its
    /// leading end, middle and trailing end might close a region, so only
    /// then is every pawn's route to its goal verified on a copy of the map.
    pub fn can_add_fence(&self, at: WallPoint, orientation: Orientation) -> bool {
        use Orientation::{Horizontal, Vertical};

        if !at.is_inside() {
            return false;
        }

        let w = &self.walls;
        let (x, y) = (at.x, at.y);

        if w.get(x, y).is_some() {
            return false;
        }

        let collides = match orientation {
            Horizontal => w.is(x - 1, y, Horizontal) || w.is(x + 1, y, Horizontal),
            Vertical => w.is(x, y - 1, Vertical) || w.is(x, y + 1, Vertical),
        };
        if collides {
            return false;
        }

        let (leading, trailing, middle) = match orientation {
            Horizontal => (
                x == 1
                    || w.is(x - 2, y, Horizontal)
                    || w.is(x - 1, y, Vertical)
                    || w.is(x - 1, y - 1, Vertical)
                    || w.is(x - 1, y + 1, Vertical),
                x == FENCE_SPACE_WIDTH - 2
                    || w.is(x + 2, y, Horizontal)
                    || w.is(x + 1, y, Vertical)
                    || w.is(x + 1, y - 1, Vertical)
                    || w.is(x + 1, y + 1, Vertical),
                w.is(x, y + 1, Vertical) || w.is(x, y - 1, Vertical),
            ),
            Vertical => (
                y == 1
                    || w.is(x, y - 2, Vertical)
                    || w.is(x, y - 1, Horizontal)
                    || w.is(x - 1, y - 1, Horizontal)
                    || w.is(x + 1, y - 1, Horizontal),
                y == FENCE_SPACE_HEIGHT - 2
                    || w.is(x, y + 2, Vertical)
                    || w.is(x, y + 1, Horizontal)
                    || w.is(x - 1, y + 1, Horizontal)
                    || w.is(x + 1, y + 1, Horizontal),
                w.is(x + 1, y, Horizontal) || w.is(x - 1, y, Horizontal),
            ),
        };

        if (leading && trailing) || (leading && middle) || (middle && trailing) {
            let mut finder = PathFinder::new(w.with(Wall { point: at, orientation }));
            if !self.pawns.iter().all(|p| finder.pawn_has_path(p)) {
                return false;
            }
        }

        true
    }

    /// Place a wall for `id`, spending one of their walls.
    pub fn add_fence(&mut self, at: WallPoint, orientation: Orientation, id: PlayerId) -> Result<(), ActionError> {
        if !self.can_add_fence(at, orientation) {
            return Err(ActionError::CannotPut);
        }
        let i = self.pawn_index(id);
        if self.pawns[i].fences_left == 0 {
            return Err(ActionError::CannotPut);
        }
        self.pawns[i].fences_left -= 1;
        self.walls.set(at, Some(orientation));
        Ok(())
    }

    /// Whether a wall separates two orthogonally adjacent cells.
    pub fn exists_fence_between(&self, one: Cell, two: Cell) -> bool {
        if !one.is_inside() || !two.is_inside() || one.manhattan(two) != 1 {
            return false;
        }

        let (one, two) = if one.x <= two.x && one.y <= two.y { (one, two) } else { (two, one) };
        let direction = if one.y == two.y { Direction::Right } else { Direction::Up };
        self.walls.blocks_step(one, direction)
    }

    /// Every cell the pawn of `id` may move to.
    pub fn available_moves(&self, id: PlayerId) -> Vec<Cell> {
        let origin = self.pawn(id).cell;
        let neighbours = AROUNDS.map(|d| origin + d);
        let beside_pawn = neighbours.iter().any(|&c| self.is_occupied(c));

        let hops = HOP_AROUNDS.iter().filter(|_| beside_pawn).map(|&d| origin + d);
        neighbours
            .into_iter()
            .chain(hops)
            .filter(|&c| self.can_move_pawn(id, c))
            .collect()
    }

    /// Text rendering with an optional route overlay.
    ///
    /// Row 8 is printed first. Pawns show as `[id]`, route cells as `[.]`
    /// with the route start as `[s]`, vertical walls as `|` and horizontal
    /// walls as `===`.
    pub fn dump_with_route(&self, route: &[Cell]) -> String {
        let mut buf = String::new();
        let header: Vec<String> = self.pawns.iter().map(|p| format!("{}: {}", p.id, p.fences_left)).collect();
        buf.push_str(&header.join(", "));
        buf.push('\n');

        for y in (0..HEIGHT).rev() {
            for x in 0..WIDTH {
                let cell = Cell::new(x, y);
                if let Some(pawn) = self.pawns.iter().find(|p| p.cell == cell) {
                    buf.push_str(&format!("[{}]", pawn.id));
                } else if route.first() == Some(&cell) {
                    buf.push_str("[s]");
                } else if route.contains(&cell) {
                    buf.push_str("[.]");
                } else {
                    buf.push_str("[ ]");
                }
                let right = self.exists_fence_between(cell, Cell::new(x + 1, y));
                buf.push(if right { '|' } else { ' ' });
            }
            buf.push_str(&format!("{y}\n"));

            if y != 0 {
                for x in 0..WIDTH {
                    let below = self.exists_fence_between(Cell::new(x, y), Cell::new(x, y - 1));
                    let right = self.exists_fence_between(Cell::new(x, y), Cell::new(x + 1, y));
                    buf.push_str(if below { "===" } else { "   " });
                    buf.push(if right { '|' } else { ' ' });
                }
                buf.push('\n');
            }
        }
        for x in 0..WIDTH {
            buf.push_str(&format!(" {x}  "));
        }
        buf.push('\n');
        buf
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dump_with_route(&[]))
    }
}
