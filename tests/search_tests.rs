//! End-to-end tests for the search engine and match running.

use quoridor_mcts::board::BoardState;
use quoridor_mcts::game::{GameState, Mutation};
use quoridor_mcts::geometry::{Cell, GoalSide, Orientation, Pawn, PlayerId, WallPoint};
use quoridor_mcts::mcts::{MonteCarloTreeSearch, SearchConfig};
use quoridor_mcts::player::{PlayerController, ShortestPathPlayer};
use quoridor_mcts::session::{Session, run_match};

const A: PlayerId = PlayerId('A');
const B: PlayerId = PlayerId('B');

fn config(seed: u64) -> SearchConfig {
    SearchConfig {
        simulations: 200,
        threads: 4,
        seed: Some(seed),
        ..SearchConfig::default()
    }
}

/// Both pawns one step out, so the opening shortcut no longer applies.
fn after_opening() -> GameState {
    GameState::standard(A, B, true)
        .apply(Mutation::MovePawn(Cell::new(4, 1)))
        .unwrap()
        .apply(Mutation::MovePawn(Cell::new(4, 7)))
        .unwrap()
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_same_seed_same_move() {
    let game = after_opening();
    let first = MonteCarloTreeSearch::with_seed(42).decide_move(&game, 200);
    let second = MonteCarloTreeSearch::with_seed(42).decide_move(&game, 200);
    assert_eq!(first, second);
}

#[test]
fn test_thread_count_does_not_change_result() {
    let game = after_opening();
    let narrow = MonteCarloTreeSearch::new(SearchConfig {
        threads: 1,
        ..config(9)
    })
    .decide_move(&game, 150);
    let wide = MonteCarloTreeSearch::new(SearchConfig {
        threads: 8,
        ..config(9)
    })
    .decide_move(&game, 150);
    assert_eq!(narrow, wide);
}

// =============================================================================
// Search behaviour
// =============================================================================

#[test]
fn test_reroot_keeps_statistics() {
    let game = after_opening();
    let mut mcts = MonteCarloTreeSearch::new(config(5));
    let mine = mcts.decide_move(&game, 300);
    let after_mine = game.apply(mine).unwrap();

    // Pick a reply the tree has expanded, if any.
    let tree = mcts.tree().unwrap();
    let root = tree.root();
    let Some(&my_node) = tree[root]
        .children()
        .iter()
        .find(|&&c| tree[c].mutation == Some(mine))
    else {
        panic!("chosen move is not a root child");
    };
    let Some(&reply_node) = tree[my_node].children().iter().max_by_key(|&&c| tree[c].simulated) else {
        return;
    };
    let reply = tree[reply_node].mutation.unwrap();
    let kept = tree[reply_node].simulated;
    let next = after_mine.apply(reply).unwrap();

    mcts.set_game_state(&next);
    let tree = mcts.tree().unwrap();
    assert_eq!(tree[tree.root()].simulated, kept);

    let m = mcts.search_best_move(100);
    assert!(next.apply(m).is_ok());
}

#[test]
fn test_takes_the_winning_step() {
    let board = BoardState::new(vec![
        Pawn::with_fences(A, GoalSide::MaxY, Cell::new(2, 7), 3),
        Pawn::with_fences(B, GoalSide::MinY, Cell::new(6, 1), 3),
    ]);
    let game = GameState::new(vec![A, B], 30, board);
    let m = MonteCarloTreeSearch::new(config(3)).decide_move(&game, 400);
    assert_eq!(m, Mutation::MovePawn(Cell::new(2, 8)));
}

// =============================================================================
// Matches
// =============================================================================

#[test]
fn test_shortest_path_players_finish() {
    let mut players: Vec<Box<dyn PlayerController>> = vec![
        Box::new(ShortestPathPlayer::new(A, 1)),
        Box::new(ShortestPathPlayer::new(B, 2)),
    ];
    let mut session = Session::new(GameState::standard(A, B, true));
    let winner = run_match(&mut players, &mut session, 100);
    // B jumps over A when they meet and gains a step.
    assert_eq!(winner, Some(B));
    assert!(session.current().is_finished());
    assert_eq!(session.history().len(), session.current().turn_count + 1);
}

#[test]
fn test_match_respects_turn_limit() {
    let mut players: Vec<Box<dyn PlayerController>> = vec![
        Box::new(ShortestPathPlayer::new(A, 1)),
        Box::new(ShortestPathPlayer::new(B, 2)),
    ];
    let mut session = Session::new(GameState::standard(A, B, true));
    assert_eq!(run_match(&mut players, &mut session, 4), None);
    assert_eq!(session.current().turn_count, 4);

    let state = session.current().clone();
    assert!(session
        .submit(&state, Mutation::PutFence(WallPoint::new(4, 4), Orientation::Horizontal).into())
        .is_ok());
}
