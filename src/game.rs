//! Game state: board plus turn order, advanced one mutation at a time.

use std::fmt;

use crate::board::BoardState;
use crate::error::ActionError;
use crate::geometry::{Cell, GoalSide, Orientation, Pawn, PlayerId, WallPoint};

/// A turn action that changes the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mutation {
    MovePawn(Cell),
    PutFence(WallPoint, Orientation),
}

impl Mutation {
    pub fn is_move(&self) -> bool {
        matches!(self, Mutation::MovePawn(_))
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::MovePawn(c) => write!(f, "movePawn({}, {})", c.x, c.y),
            Mutation::PutFence(p, o) => write!(f, "putFence({}, {}, {o})", p.x, p.y),
        }
    }
}

/// Board, turn order and turn counter.
///
/// Treated as a value: `apply` returns a new state and leaves `self` alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    /// Turn order.
    pub players: Vec<PlayerId>,
    pub turn_count: usize,
    pub board: BoardState,
}

impl GameState {
    pub fn new(players: Vec<PlayerId>, turn_count: usize, board: BoardState) -> Self {
        Self {
            players,
            turn_count,
            board,
        }
    }

    /// Standard two-player opening: `p1` starts at (4,0) heading for the top
    /// row, `p2` at (4,8) heading for the bottom row.
    pub fn standard(p1: PlayerId, p2: PlayerId, p1_moves_first: bool) -> Self {
        let board = BoardState::new(vec![
            Pawn::new(p1, GoalSide::MaxY, Cell::new(4, 0)),
            Pawn::new(p2, GoalSide::MinY, Cell::new(4, 8)),
        ]);
        let players = if p1_moves_first { vec![p1, p2] } else { vec![p2, p1] };
        Self::new(players, 0, board)
    }

    pub fn current_player(&self) -> PlayerId {
        self.players[self.turn_count % self.players.len()]
    }

    /// Everyone except the player to move, in turn order.
    pub fn other_players(&self) -> Vec<PlayerId> {
        let current = self.turn_count % self.players.len();
        self.players
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != current)
            .map(|(_, &p)| p)
            .collect()
    }

    pub fn is_win(&self, player: PlayerId) -> bool {
        self.board.pawn(player).has_won()
    }

    pub fn is_finished(&self) -> bool {
        self.board.pawns().iter().any(Pawn::has_won)
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.players.iter().copied().find(|&p| self.is_win(p))
    }

    /// Apply `mutation` for the player to move.
    pub fn apply(&self, mutation: Mutation) -> Result<GameState, ActionError> {
        let player = self.current_player();
        let mut board = self.board.clone();
        match mutation {
            Mutation::MovePawn(to) => board.move_pawn(player, to)?,
            Mutation::PutFence(at, orientation) => board.add_fence(at, orientation, player)?,
        }
        Ok(GameState::new(self.players.clone(), self.turn_count + 1, board))
    }
}
