//! Rule-violation errors reported to callers as values.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("cannot move: pawn move is not legal")]
    CannotMove,

    #[error("cannot put: wall placement is not legal or no walls are left")]
    CannotPut,

    #[error("no history: not enough turns to undo")]
    NoHistory,
}
