//! Quoridor rules engine and Monte Carlo Tree Search player.
//!
//! Two pawns race across a 9x9 board to the opposite edge while spending
//! walls to lengthen each other's route. No wall may cut a pawn off from its
//! goal entirely.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and search parameters
//! - [`geometry`] - Cells, wall points, directions and pawns
//! - [`wall_map`] - Compact wall storage
//! - [`board`] - Move and wall legality
//! - [`path_finder`] - Breadth-first shortest paths
//! - [`game`] - Turn order and immutable state transitions
//! - [`playout`] - Rollout policy and wall candidate heuristics
//! - [`mcts`] - Tree search with parallel rollouts
//! - [`player`] - Player controllers
//! - [`session`] - History, undo and match running
//!
//! ## Example
//!
//! ```
//! use quoridor_mcts::game::{GameState, Mutation};
//! use quoridor_mcts::geometry::{Cell, PlayerId};
//! use quoridor_mcts::mcts::{MonteCarloTreeSearch, SearchConfig};
//!
//! let game = GameState::standard(PlayerId('A'), PlayerId('B'), true);
//! let game = game.apply(Mutation::MovePawn(Cell::new(4, 1))).unwrap();
//! let game = game.apply(Mutation::MovePawn(Cell::new(4, 7))).unwrap();
//!
//! let mut mcts = MonteCarloTreeSearch::new(SearchConfig {
//!     seed: Some(1),
//!     ..SearchConfig::default()
//! });
//! let best = mcts.decide_move(&game, 100);
//! assert!(game.apply(best).is_ok());
//! ```

pub mod board;
pub mod constants;
pub mod error;
pub mod game;
pub mod geometry;
pub mod mcts;
pub mod path_finder;
pub mod player;
pub mod playout;
pub mod random;
pub mod session;
pub mod wall_map;
