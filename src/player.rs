//! Player controllers: anything that can propose an action for a state.

use std::sync::mpsc::{Sender, channel};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::game::{GameState, Mutation};
use crate::geometry::PlayerId;
use crate::mcts::{MonteCarloTreeSearch, SearchConfig};
use crate::playout::available_shortest_moves;
use crate::random::{RandomSource, Xoshiro256};
use crate::session::Action;

/// An action together with the state it was decided on.
#[derive(Clone, Debug)]
pub struct Proposal {
    pub player: PlayerId,
    pub based_on: GameState,
    pub action: Action,
}

/// A participant asked to act on its turn.
///
/// Implementations may answer synchronously or later from another thread;
/// either way the answer goes through `submit`.
pub trait PlayerController: Send {
    fn player_id(&self) -> PlayerId;

    fn request_action(&mut self, state: &GameState, submit: Sender<Proposal>);
}

struct Job {
    state: GameState,
    submit: Sender<Proposal>,
}

/// Searches with MCTS on a dedicated worker thread.
///
/// The worker owns its search tree for the player's whole game, so each
/// request can reuse the subtree from the previous one.
pub struct MonteCarloPlayer {
    id: PlayerId,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl MonteCarloPlayer {
    pub fn new(id: PlayerId, config: SearchConfig) -> Self {
        let (tx, rx) = channel::<Job>();
        let worker = thread::spawn(move || {
            let simulations = config.simulations;
            let mut mcts = MonteCarloTreeSearch::new(config);
            for job in rx {
                let mutation = mcts.decide_move(&job.state, simulations);
                debug!("{id} proposes {mutation}");
                let proposal = Proposal {
                    player: id,
                    based_on: job.state,
                    action: Action::Mutate(mutation),
                };
                if job.submit.send(proposal).is_err() {
                    warn!("{id}: session closed before the proposal arrived");
                }
            }
        });

        Self {
            id,
            jobs: Some(tx),
            worker: Some(worker),
        }
    }
}

impl PlayerController for MonteCarloPlayer {
    fn player_id(&self) -> PlayerId {
        self.id
    }

    fn request_action(&mut self, state: &GameState, submit: Sender<Proposal>) {
        let job = Job {
            state: state.clone(),
            submit,
        };
        let sent = self.jobs.as_ref().is_some_and(|jobs| jobs.send(job).is_ok());
        if !sent {
            warn!("{}: search worker is gone", self.id);
        }
    }
}

impl Drop for MonteCarloPlayer {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("{}: search worker panicked", self.id);
            }
        }
    }
}

/// Greedy baseline: always steps along a shortest route and never walls.
pub struct ShortestPathPlayer {
    id: PlayerId,
    rng: Xoshiro256,
}

impl ShortestPathPlayer {
    pub fn new(id: PlayerId, seed: u64) -> Self {
        Self {
            id,
            rng: Xoshiro256::seed_from_u64(seed),
        }
    }
}

impl PlayerController for ShortestPathPlayer {
    fn player_id(&self) -> PlayerId {
        self.id
    }

    fn request_action(&mut self, state: &GameState, submit: Sender<Proposal>) {
        let pawn = state.board.pawn(self.id);
        let path = state.board.path_finder().pawn_path(pawn, &mut self.rng);
        let moves = available_shortest_moves(&state.board.available_moves(self.id), &path);
        let Some(&to) = self.rng.choose(&moves) else {
            warn!("{} has no legal move", self.id);
            return;
        };
        let proposal = Proposal {
            player: self.id,
            based_on: state.clone(),
            action: Action::Mutate(Mutation::MovePawn(to)),
        };
        if submit.send(proposal).is_err() {
            warn!("{}: session closed before the proposal arrived", self.id);
        }
    }
}
