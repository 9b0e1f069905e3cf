//! Constants for board geometry, wall supply, search parameters and
//! rollout probabilities.
//!
//! Pawn cells use a 9x9 grid with the origin at the bottom-left corner.
//! Wall points live on the 10x10 lattice of cell corners, but the outer ring
//! of that lattice can never hold a wall, so only `[1, 9) x [1, 9)` is stored.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of cell columns.
pub const WIDTH: i32 = 9;

/// Number of cell rows.
pub const HEIGHT: i32 = 9;

/// Width of the wall-point lattice (one more than the cell grid).
pub const FENCE_SPACE_WIDTH: i32 = WIDTH + 1;

/// Height of the wall-point lattice.
pub const FENCE_SPACE_HEIGHT: i32 = HEIGHT + 1;

/// Number of storable wall points (outer ring excluded).
pub const FENCE_SLOTS: usize = ((FENCE_SPACE_WIDTH - 2) * (FENCE_SPACE_HEIGHT - 2)) as usize;

/// Number of cells on the board.
pub const CELLS: usize = (WIDTH * HEIGHT) as usize;

/// Walls each pawn starts with.
pub const INITIAL_FENCES: u32 = 10;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of simulations per decision.
pub const N_SIMS: usize = 7500;

/// Exploration constant `C` in `ratio + sqrt(C * ln(parent) / child)`.
pub const UCT_CONST: f32 = 0.5;

/// Maximum number of nodes rolled out together in one parallel batch.
pub const ROLLOUT_CHUNK_SIZE: usize = 12;

/// Turns played with the shortest-path opening instead of a search.
pub const OPENING_TURNS: usize = 2;

/// Playouts longer than this are abandoned without a winner.
pub const MAX_ROLLOUT_TURNS: usize = 1000;

// =============================================================================
// Rollout Policy Probabilities (percent)
// =============================================================================

/// Chance of trying a wall placement (or a retreat when out of walls).
pub const ROLLOUT_FENCE_PERCENT: u64 = 30;

/// Chance of a uniformly random pawn move, stacked after the wall band.
pub const ROLLOUT_RANDOM_MOVE_PERCENT: u64 = 1;

// =============================================================================
// Move Refinement
// =============================================================================

/// Win ratios inside this range are not considered decided.
pub const DECIDED_RATIO_LOW: f32 = 0.045;

/// Upper bound of the undecided range.
pub const DECIDED_RATIO_HIGH: f32 = 0.98;

/// Below this ratio a wall that does not lengthen any opponent path is dropped.
pub const HOPELESS_RATIO: f32 = 0.02;

/// Pawn moves within this margin of the best count as tied.
pub const TIE_MARGIN: f32 = 0.02;
