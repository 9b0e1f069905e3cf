//! Storage of placed walls keyed by lattice point.

use std::fmt;

use crate::constants::{FENCE_SLOTS, FENCE_SPACE_HEIGHT, FENCE_SPACE_WIDTH};
use crate::geometry::{Cell, Direction, Orientation, Wall, WallPoint};

/// At most one wall per lattice point.
///
/// The map is a flat `Copy` array so hypothetical boards can be forked
/// without allocation. Reads outside the storable region answer `None`,
/// which lets neighbour lookups run off the edge without bounds checks.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct WallMap {
    slots: [Option<Orientation>; FENCE_SLOTS],
}

impl Default for WallMap {
    fn default() -> Self {
        Self::new()
    }
}

impl WallMap {
    pub fn new() -> Self {
        Self {
            slots: [None; FENCE_SLOTS],
        }
    }

    #[inline]
    fn offset(x: i32, y: i32) -> usize {
        ((x - 1) + (y - 1) * (FENCE_SPACE_WIDTH - 2)) as usize
    }

    /// Orientation of the wall at `(x, y)`, if any.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Orientation> {
        if !WallPoint::new(x, y).is_inside() {
            return None;
        }
        self.slots[Self::offset(x, y)]
    }

    /// True when a wall of exactly `orientation` sits at `(x, y)`.
    #[inline]
    pub fn is(&self, x: i32, y: i32, orientation: Orientation) -> bool {
        self.get(x, y) == Some(orientation)
    }

    /// Place or clear the wall at `point`.
    ///
    /// # Panics
    ///
    /// Panics if `point` is outside the storable region.
    pub fn set(&mut self, point: WallPoint, orientation: Option<Orientation>) {
        assert!(point.is_inside(), "wall point {point:?} out of range");
        self.slots[Self::offset(point.x, point.y)] = orientation;
    }

    /// Whether a wall blocks the step from `from` in `direction`.
    ///
    /// Each cell edge is covered by the two lattice points at its ends.
    pub fn blocks_step(&self, from: Cell, direction: Direction) -> bool {
        use Orientation::{Horizontal, Vertical};
        let (x, y) = (from.x, from.y);
        match direction {
            Direction::Up => self.is(x, y + 1, Horizontal) || self.is(x + 1, y + 1, Horizontal),
            Direction::Down => self.is(x, y, Horizontal) || self.is(x + 1, y, Horizontal),
            Direction::Left => self.is(x, y, Vertical) || self.is(x, y + 1, Vertical),
            Direction::Right => self.is(x + 1, y, Vertical) || self.is(x + 1, y + 1, Vertical),
        }
    }

    /// Copy of this map with `wall` inserted.
    pub fn with(mut self, wall: Wall) -> Self {
        self.set(wall.point, Some(wall.orientation));
        self
    }

    /// Placed walls in column-major scan order (x outer, y inner).
    pub fn iter(&self) -> impl Iterator<Item = Wall> + '_ {
        (1..FENCE_SPACE_WIDTH - 1).flat_map(move |x| {
            (1..FENCE_SPACE_HEIGHT - 1)
                .filter_map(move |y| self.get(x, y).map(|o| Wall::new(x, y, o)))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl fmt::Debug for WallMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map() {
        let map = WallMap::new();
        assert!(map.is_empty());
        assert_eq!(map.get(4, 4), None);
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn test_out_of_range_reads_are_empty() {
        let map = WallMap::new().with(Wall::new(1, 1, Orientation::Vertical));
        assert_eq!(map.get(0, 1), None);
        assert_eq!(map.get(-3, 12), None);
        assert_eq!(map.get(9, 9), None);
        assert!(map.is(1, 1, Orientation::Vertical));
        assert!(!map.is(1, 1, Orientation::Horizontal));
    }

    #[test]
    fn test_copy_is_independent() {
        let base = WallMap::new().with(Wall::new(3, 3, Orientation::Horizontal));
        let forked = base.with(Wall::new(5, 5, Orientation::Vertical));
        assert_eq!(base.len(), 1);
        assert_eq!(forked.len(), 2);
        assert_eq!(
            forked.iter().collect::<Vec<_>>(),
            vec![
                Wall::new(3, 3, Orientation::Horizontal),
                Wall::new(5, 5, Orientation::Vertical)
            ]
        );
    }

    #[test]
    #[should_panic]
    fn test_set_outside_panics() {
        let mut map = WallMap::new();
        map.set(WallPoint::new(0, 0), Some(Orientation::Horizontal));
    }
}
