//! Monte Carlo playouts and the move generators they share with expansion.
//!
//! A playout advances a game to a finished state with a cheap biased policy:
//! mostly shortest-path steps, sometimes a heuristic wall, rarely a random
//! move. The terminal state tells the tree who won.

use std::collections::{HashMap, HashSet};

use crate::constants::{
    FENCE_SPACE_HEIGHT, FENCE_SPACE_WIDTH, HEIGHT, MAX_ROLLOUT_TURNS, ROLLOUT_FENCE_PERCENT,
    ROLLOUT_RANDOM_MOVE_PERCENT, WIDTH,
};
use crate::game::{GameState, Mutation};
use crate::geometry::{Cell, Direction, GoalSide, Orientation, PlayerId, Wall};
use crate::random::RandomSource;

/// Apply a mutation that was drawn from a legal set.
///
/// # Panics
///
/// Panics if the game rejects it, which means a generator produced an
/// illegal action.
pub(crate) fn apply_legal(game: &GameState, mutation: Mutation) -> GameState {
    match game.apply(mutation) {
        Ok(next) => next,
        Err(e) => panic!("{mutation} rejected at turn {}: {e}", game.turn_count),
    }
}

/// Play `game` out until someone wins.
///
/// Gives up after `MAX_ROLLOUT_TURNS` and returns a state with no winner.
pub fn rollout<R: RandomSource>(mut game: GameState, rng: &mut R) -> GameState {
    let mut last_points: HashMap<PlayerId, Cell> = HashMap::new();
    let mut turns = 0;

    while !game.is_finished() {
        if turns >= MAX_ROLLOUT_TURNS {
            break;
        }
        turns += 1;

        match rollout_action(&game, &mut last_points, rng) {
            Some(mutation) => game = apply_legal(&game, mutation),
            None => break,
        }
    }

    game
}

/// The playout policy's action for the player to move, `None` when the
/// mover has no shortest-path step.
///
/// `last_points` remembers where low-on-walls pawns stood before their last
/// forward step.
fn rollout_action<R: RandomSource>(
    game: &GameState,
    last_points: &mut HashMap<PlayerId, Cell>,
    rng: &mut R,
) -> Option<Mutation> {
    let pawn = game.board.pawn(game.current_player());
    let roll = rng.below(100) as u64;

    if roll < ROLLOUT_FENCE_PERCENT {
        if pawn.fences_left > 0 {
            let mut candidates = next_candidate_fences(game, rng);
            rng.shuffle(&mut candidates);
            let legal = candidates
                .into_iter()
                .find(|w| game.board.can_add_fence(w.point, w.orientation));
            if let Some(wall) = legal {
                return Some(Mutation::PutFence(wall.point, wall.orientation));
            }
        } else {
            // Out of walls against an opponent who still has some: step
            // back to stall rather than racing into their walls.
            let opponent_has_walls = game
                .board
                .pawns()
                .iter()
                .any(|p| p.id != pawn.id && p.fences_left > 0);
            if opponent_has_walls {
                if let Some(&last) = last_points.get(&pawn.id) {
                    if game.board.available_moves(pawn.id).contains(&last) {
                        last_points.remove(&pawn.id);
                        return Some(Mutation::MovePawn(last));
                    }
                }
            }
        }
    } else if roll < ROLLOUT_FENCE_PERCENT + ROLLOUT_RANDOM_MOVE_PERCENT {
        let moves = game.board.available_moves(pawn.id);
        if let Some(&to) = rng.choose(&moves) {
            return Some(Mutation::MovePawn(to));
        }
    }

    if pawn.fences_left < 2 {
        last_points.insert(pawn.id, pawn.cell);
    }

    // Ties between shortest routes are broken at random: some are easier
    // to obstruct than others.
    let path = game.board.path_finder().pawn_path(pawn, rng);
    let moves = available_shortest_moves(&game.board.available_moves(pawn.id), &path);
    rng.choose(&moves).map(|&to| Mutation::MovePawn(to))
}

/// Moves that follow `path` as far as a single turn allows.
///
/// Prefers the cell two steps along (a jump), then one step along, and falls
/// back to every available move when neither is reachable.
pub fn available_shortest_moves(available: &[Cell], path: &[Cell]) -> Vec<Cell> {
    if let Some(&two) = path.get(2) {
        if available.contains(&two) {
            return vec![two];
        }
    }
    if let Some(&one) = path.get(1) {
        if available.contains(&one) {
            return vec![one];
        }
    }
    available.to_vec()
}

/// Walls that would cut one of the steps of `path`.
pub fn path_blocking_fences(path: &[Cell]) -> Vec<Wall> {
    use Orientation::{Horizontal, Vertical};

    let mut out = Vec::new();
    for w in path.windows(2) {
        let (cur, next) = (w[0], w[1]);
        let (x, y) = (cur.x, cur.y);
        let pair = match Direction::between(cur, next) {
            Some(Direction::Up) => [Wall::new(x, y + 1, Horizontal), Wall::new(x + 1, y + 1, Horizontal)],
            Some(Direction::Down) => [Wall::new(x, y, Horizontal), Wall::new(x + 1, y, Horizontal)],
            Some(Direction::Left) => [Wall::new(x, y, Vertical), Wall::new(x, y + 1, Vertical)],
            Some(Direction::Right) => [Wall::new(x + 1, y, Vertical), Wall::new(x + 1, y + 1, Vertical)],
            None => continue,
        };
        out.extend(pair);
    }
    dedup_walls(out)
}

/// Heuristic wall candidates for the player to move. Not filtered for
/// legality.
///
/// Draws from the neighbourhood of placed walls, the rim of the board, both
/// pawns, and two book openings tied to specific turns.
pub fn next_candidate_fences<R: RandomSource>(game: &GameState, rng: &mut R) -> Vec<Wall> {
    use Orientation::{Horizontal, Vertical};

    let mut ret = Vec::new();
    let placed = game.board.all_walls();
    let no_walls_yet = placed.is_empty();

    for wall in placed {
        let (x, y) = (wall.point.x, wall.point.y);
        match wall.orientation {
            Horizontal => ret.extend([
                Wall::new(x - 2, y, Horizontal),
                Wall::new(x + 2, y, Horizontal),
                Wall::new(x - 3, y, Horizontal),
                Wall::new(x + 3, y, Horizontal),
                Wall::new(x - 1, y - 1, Vertical),
                Wall::new(x + 1, y - 1, Vertical),
                Wall::new(x - 1, y + 1, Vertical),
                Wall::new(x + 1, y + 1, Vertical),
                Wall::new(x + 2, y, Vertical),
                Wall::new(x - 2, y, Vertical),
            ]),
            Vertical => ret.extend([
                Wall::new(x, y - 2, Vertical),
                Wall::new(x, y + 2, Vertical),
                Wall::new(x, y - 3, Vertical),
                Wall::new(x, y + 3, Vertical),
                Wall::new(x - 1, y - 1, Horizontal),
                Wall::new(x - 1, y + 1, Horizontal),
                Wall::new(x + 1, y - 1, Horizontal),
                Wall::new(x + 1, y + 1, Horizontal),
                Wall::new(x, y + 2, Horizontal),
                Wall::new(x, y - 2, Horizontal),
            ]),
        }
    }

    let turn = game.turn_count;
    let pawn = game.board.pawn(game.current_player());

    // Rim walls for building long detours. Only while walls are plentiful.
    if turn >= 8 && pawn.fences_left > 2 {
        let y = [1, 2, 3][rng.below(3)];
        ret.extend([
            Wall::new(1, y, Horizontal),
            Wall::new(FENCE_SPACE_WIDTH - 1, y, Horizontal),
            Wall::new(1, FENCE_SPACE_HEIGHT - 1 - y, Horizontal),
            Wall::new(FENCE_SPACE_WIDTH - 1, FENCE_SPACE_HEIGHT - 1 - y, Horizontal),
        ]);
    }

    if turn >= 4 {
        let others = game.other_players();
        if !others.is_empty() {
            let opponent = others[rng.below(others.len())];
            ret.extend(game.board.pawn(opponent).cell.surrounding_walls());
        }
    }
    if turn >= 7 || !no_walls_yet {
        ret.extend(pawn.cell.surrounding_walls());
    }

    // Shiller opening: a vertical wall in front of the mover's own start.
    if (turn == 4 || turn == 5) && no_walls_yet {
        let shift = if rng.coin() { 1 } else { 0 };
        let y = match pawn.goal {
            GoalSide::MinY => HEIGHT - 1,
            GoalSide::MaxY => 1,
        };
        ret.push(Wall::new(WIDTH / 2 + shift, y, Vertical));
    }

    // Quick two-row opening, only on the first player's second turn.
    if turn == 2 {
        let shift = if rng.coin() { -1 } else { 2 };
        let y = match pawn.goal {
            GoalSide::MinY => HEIGHT - 2,
            GoalSide::MaxY => 2,
        };
        ret.push(Wall::new(WIDTH / 2 + shift, y, Horizontal));
    }

    dedup_walls(ret)
}

/// Drop repeated walls, keeping first occurrences in order.
pub(crate) fn dedup_walls(walls: Vec<Wall>) -> Vec<Wall> {
    let mut seen = HashSet::with_capacity(walls.len());
    walls.into_iter().filter(|w| seen.insert(*w)).collect()
}
