//! Minimal turn orchestration: history, undo and stale-proposal filtering.

use std::sync::mpsc::{Receiver, channel};

use log::{debug, info, warn};

use crate::error::ActionError;
use crate::game::{GameState, Mutation};
use crate::geometry::PlayerId;
use crate::player::{PlayerController, Proposal};

/// Something a player may submit on their turn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Mutate(Mutation),
    /// Take back the last two turns.
    Undo,
}

impl From<Mutation> for Action {
    fn from(m: Mutation) -> Self {
        Action::Mutate(m)
    }
}

/// What happened to a submitted action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Won(PlayerId),
    Undone,
    /// Computed against a state that is no longer current; ignored.
    Stale,
}

/// Game history, newest state last. Never empty.
#[derive(Clone, Debug)]
pub struct Session {
    history: Vec<GameState>,
}

impl Session {
    pub fn new(initial: GameState) -> Self {
        Self {
            history: vec![initial],
        }
    }

    pub fn current(&self) -> &GameState {
        // `history` always holds the initial state.
        &self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[GameState] {
        &self.history
    }

    /// Apply `action` if it was decided on the current state.
    pub fn submit(&mut self, based_on: &GameState, action: Action) -> Result<Outcome, ActionError> {
        if based_on != self.current() {
            return Ok(Outcome::Stale);
        }

        match action {
            Action::Undo => {
                if self.history.len() < 3 {
                    return Err(ActionError::NoHistory);
                }
                self.history.truncate(self.history.len() - 2);
                Ok(Outcome::Undone)
            }
            Action::Mutate(m) => {
                let next = self.current().apply(m)?;
                let winner = next.winner();
                self.history.push(next);
                Ok(winner.map_or(Outcome::Accepted, Outcome::Won))
            }
        }
    }
}

/// Ask the players for actions in turn until someone wins or `max_turns`
/// requests have been made.
///
/// Rejected actions are logged and the same player is asked again. Returns
/// the winner, if any.
pub fn run_match(
    players: &mut [Box<dyn PlayerController>],
    session: &mut Session,
    max_turns: usize,
) -> Option<PlayerId> {
    if let Some(winner) = session.current().winner() {
        return Some(winner);
    }

    for _ in 0..max_turns {
        let state = session.current().clone();
        let to_move = state.current_player();
        let Some(player) = players.iter_mut().find(|p| p.player_id() == to_move) else {
            panic!("no controller for {to_move}");
        };
        // A fresh channel per request: a player that gives up drops its
        // sender and `receive` sees the disconnect instead of blocking.
        let (tx, rx) = channel();
        player.request_action(&state, tx);

        let Some(proposal) = receive(&rx, &state) else {
            warn!("{to_move} stopped proposing actions");
            return None;
        };
        match session.submit(&proposal.based_on, proposal.action) {
            Ok(Outcome::Won(winner)) => {
                info!("{winner} wins after {} turns", session.current().turn_count);
                return Some(winner);
            }
            Ok(Outcome::Accepted) => {
                debug!("{to_move}: {:?}\n{}", proposal.action, session.current().board);
            }
            Ok(Outcome::Undone) => debug!("{to_move} took back two turns"),
            Ok(Outcome::Stale) => {}
            Err(e) => warn!("{to_move}: {:?} rejected: {e}", proposal.action),
        }
    }
    None
}

/// Next proposal made against `state`, discarding leftovers from earlier turns.
fn receive(rx: &Receiver<Proposal>, state: &GameState) -> Option<Proposal> {
    loop {
        let proposal = rx.recv().ok()?;
        if proposal.based_on == *state {
            return Some(proposal);
        }
        debug!("dropping stale proposal from {}", proposal.player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Cell, Orientation, WallPoint};

    const A: PlayerId = PlayerId('A');
    const B: PlayerId = PlayerId('B');

    #[test]
    fn test_submit_appends_history() {
        let mut session = Session::new(GameState::standard(A, B, true));
        let state = session.current().clone();
        let outcome = session.submit(&state, Mutation::MovePawn(Cell::new(4, 1)).into());
        assert_eq!(outcome, Ok(Outcome::Accepted));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.current().turn_count, 1);
    }

    #[test]
    fn test_stale_proposal_is_ignored() {
        let mut session = Session::new(GameState::standard(A, B, true));
        let old = session.current().clone();
        session.submit(&old, Mutation::MovePawn(Cell::new(4, 1)).into()).unwrap();
        let outcome = session.submit(&old, Mutation::MovePawn(Cell::new(3, 0)).into());
        assert_eq!(outcome, Ok(Outcome::Stale));
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_rejected_action_keeps_state() {
        let mut session = Session::new(GameState::standard(A, B, true));
        let state = session.current().clone();
        assert_eq!(
            session.submit(&state, Mutation::MovePawn(Cell::new(4, 2)).into()),
            Err(ActionError::CannotMove)
        );
        assert_eq!(
            session.submit(
                &state,
                Mutation::PutFence(WallPoint::new(9, 1), Orientation::Horizontal).into()
            ),
            Err(ActionError::CannotPut)
        );
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_undo_needs_two_turns() {
        let mut session = Session::new(GameState::standard(A, B, true));
        let s0 = session.current().clone();
        assert_eq!(session.submit(&s0, Action::Undo), Err(ActionError::NoHistory));

        session.submit(&s0, Mutation::MovePawn(Cell::new(4, 1)).into()).unwrap();
        let s1 = session.current().clone();
        assert_eq!(session.submit(&s1, Action::Undo), Err(ActionError::NoHistory));

        session.submit(&s1, Mutation::MovePawn(Cell::new(4, 7)).into()).unwrap();
        let s2 = session.current().clone();
        assert_eq!(session.submit(&s2, Action::Undo), Ok(Outcome::Undone));
        assert_eq!(session.current(), &s0);
    }
}
