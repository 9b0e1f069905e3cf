//! Breadth-first shortest paths over a wall configuration.
//!
//! A `PathFinder` is bound to one `WallMap` snapshot. Pawns are not obstacles
//! here: connectivity and distances only consider walls.

use std::collections::VecDeque;

use crate::constants::{CELLS, WIDTH};
use crate::geometry::{Cell, Direction, GoalSide, Pawn};
use crate::random::{FixedSource, RandomSource};
use crate::wall_map::WallMap;

#[derive(Copy, Clone, Default)]
struct Visit {
    visited: bool,
    previous: Option<Cell>,
}

/// Per-search visitation record, one entry per cell.
#[derive(Clone)]
struct VisitMap {
    nodes: [Visit; CELLS],
}

impl VisitMap {
    fn new() -> Self {
        Self {
            nodes: [Visit::default(); CELLS],
        }
    }

    #[inline]
    fn get(&self, cell: Cell) -> Visit {
        self.nodes[cell.index()]
    }

    #[inline]
    fn mark(&mut self, cell: Cell, previous: Option<Cell>) {
        self.nodes[cell.index()] = Visit {
            visited: true,
            previous,
        };
    }

    fn any_visited_in_row(&self, row: i32) -> bool {
        (0..WIDTH).any(|x| self.get(Cell::new(x, row)).visited)
    }

    /// Walk the `previous` chain back from `end` and return it start-first.
    fn trace(&self, end: Cell) -> Vec<Cell> {
        let mut path = vec![end];
        let mut cur = end;
        while let Some(prev) = self.get(cur).previous {
            path.push(prev);
            cur = prev;
        }
        path.reverse();
        path
    }
}

const VERTICAL_FIRST: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];
const HORIZONTAL_FIRST: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

pub struct PathFinder {
    walls: WallMap,
    /// Visitation map of the most recent connectivity search.
    last_visit: Option<Box<VisitMap>>,
}

impl PathFinder {
    pub fn new(walls: WallMap) -> Self {
        Self {
            walls,
            last_visit: None,
        }
    }

    pub fn walls(&self) -> &WallMap {
        &self.walls
    }

    /// Whether a wall blocks the step from `from` in `direction`.
    #[inline]
    pub fn has_fence(&self, from: Cell, direction: Direction) -> bool {
        self.walls.blocks_step(from, direction)
    }

    /// Shortest path from `from` to the nearest goal-row cell, start included.
    ///
    /// The generator decides between two neighbour orders, which changes
    /// which of several equally short paths comes back. Empty when the goal
    /// is unreachable or `from` is off the board.
    pub fn path_to_goal<R: RandomSource>(&self, from: Cell, goal: GoalSide, rng: &mut R) -> Vec<Cell> {
        if !from.is_inside() {
            return Vec::new();
        }
        let (end, visits) = self.search(from, goal, rng);
        match end {
            Some(end) => visits.trace(end),
            None => Vec::new(),
        }
    }

    pub fn pawn_path<R: RandomSource>(&self, pawn: &Pawn, rng: &mut R) -> Vec<Cell> {
        self.path_to_goal(pawn.cell, pawn.goal, rng)
    }

    /// Number of steps on a shortest path, 0 when unreachable.
    pub fn distance_to_goal(&self, from: Cell, goal: GoalSide) -> usize {
        self.path_to_goal(from, goal, &mut FixedSource).len().saturating_sub(1)
    }

    pub fn pawn_distance(&self, pawn: &Pawn) -> usize {
        self.distance_to_goal(pawn.cell, pawn.goal)
    }

    /// Pure connectivity check.
    ///
    /// If the previous search already reached `from`, the cells it visited
    /// form `from`'s component (or part of it), so a visited goal-row cell
    /// proves reachability without searching again. Off-board cells have no
    /// path.
    pub fn has_path_to_goal(&mut self, from: Cell, goal: GoalSide) -> bool {
        if !from.is_inside() {
            return false;
        }
        if let Some(visits) = &self.last_visit {
            if visits.get(from).visited && visits.any_visited_in_row(goal.row()) {
                return true;
            }
        }

        let (end, visits) = self.search(from, goal, &mut FixedSource);
        self.last_visit = Some(visits);
        end.is_some()
    }

    pub fn pawn_has_path(&mut self, pawn: &Pawn) -> bool {
        self.has_path_to_goal(pawn.cell, pawn.goal)
    }

    fn search<R: RandomSource>(&self, from: Cell, goal: GoalSide, rng: &mut R) -> (Option<Cell>, Box<VisitMap>) {
        let order = if rng.coin() { VERTICAL_FIRST } else { HORIZONTAL_FIRST };

        let mut visits = Box::new(VisitMap::new());
        visits.mark(from, None);
        if goal.contains(from) {
            return (Some(from), visits);
        }

        let mut queue = VecDeque::with_capacity(32);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for direction in order {
                let next = direction.step(current);
                if !next.is_inside() || visits.get(next).visited {
                    continue;
                }
                if self.has_fence(current, direction) {
                    continue;
                }
                visits.mark(next, Some(current));
                if goal.contains(next) {
                    return (Some(next), visits);
                }
                queue.push_back(next);
            }
        }

        (None, visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Orientation, Wall};
    use crate::random::Xoshiro256;

    #[test]
    fn test_open_board_distance() {
        let finder = PathFinder::new(WallMap::new());
        assert_eq!(finder.distance_to_goal(Cell::new(4, 0), GoalSide::MaxY), 8);
        assert_eq!(finder.distance_to_goal(Cell::new(4, 8), GoalSide::MinY), 8);
        assert_eq!(finder.distance_to_goal(Cell::new(0, 8), GoalSide::MaxY), 0);
    }

    #[test]
    fn test_path_is_connected_and_ends_on_goal() {
        let walls = WallMap::new()
            .with(Wall::new(4, 2, Orientation::Horizontal))
            .with(Wall::new(6, 2, Orientation::Horizontal));
        let finder = PathFinder::new(walls);
        let mut g = Xoshiro256::seed_from_u64(5);
        let path = finder.path_to_goal(Cell::new(4, 0), GoalSide::MaxY, &mut g);
        assert_eq!(path.first(), Some(&Cell::new(4, 0)));
        assert!(GoalSide::MaxY.contains(*path.last().unwrap()));
        for w in path.windows(2) {
            let d = Direction::between(w[0], w[1]).expect("steps are orthogonal");
            assert!(!finder.has_fence(w[0], d));
        }
    }

    #[test]
    fn test_has_fence_both_sides() {
        let finder = PathFinder::new(WallMap::new().with(Wall::new(3, 3, Orientation::Vertical)));
        // Vertical wall at (3,3) separates columns 2 and 3 on rows 2 and 3.
        assert!(finder.has_fence(Cell::new(2, 2), Direction::Right));
        assert!(finder.has_fence(Cell::new(3, 3), Direction::Left));
        assert!(!finder.has_fence(Cell::new(2, 4), Direction::Right));
        assert!(!finder.has_fence(Cell::new(2, 2), Direction::Up));
    }

    #[test]
    fn test_has_path_memo_agrees_with_fresh_search() {
        // Seal cells (0,0) and (1,0) against the bottom edge.
        let walls = WallMap::new()
            .with(Wall::new(1, 1, Orientation::Horizontal))
            .with(Wall::new(2, 1, Orientation::Vertical));
        let mut finder = PathFinder::new(walls);
        assert!(!finder.has_path_to_goal(Cell::new(0, 0), GoalSide::MaxY));
        assert!(!finder.has_path_to_goal(Cell::new(1, 0), GoalSide::MaxY));
        assert!(finder.has_path_to_goal(Cell::new(0, 0), GoalSide::MinY));
        for x in 0..WIDTH {
            let cell = Cell::new(x, 4);
            assert!(finder.has_path_to_goal(cell, GoalSide::MaxY));
            assert!(finder.has_path_to_goal(cell, GoalSide::MinY));
        }
        assert!(!finder.has_path_to_goal(Cell::new(1, 0), GoalSide::MaxY));
        assert_eq!(finder.distance_to_goal(Cell::new(0, 0), GoalSide::MaxY), 0);
    }

    #[test]
    fn test_off_board_start_has_no_path() {
        let mut finder = PathFinder::new(WallMap::new());
        let mut g = Xoshiro256::seed_from_u64(3);
        for from in [Cell::new(-1, 0), Cell::new(4, -1), Cell::new(9, 4), Cell::new(4, 9)] {
            assert!(finder.path_to_goal(from, GoalSide::MaxY, &mut g).is_empty());
            assert_eq!(finder.distance_to_goal(from, GoalSide::MinY), 0);
            assert!(!finder.has_path_to_goal(from, GoalSide::MaxY));
        }
        // The memo from an on-board search does not leak to off-board cells.
        assert!(finder.has_path_to_goal(Cell::new(4, 4), GoalSide::MaxY));
        assert!(!finder.has_path_to_goal(Cell::new(4, 9), GoalSide::MaxY));
    }
}
