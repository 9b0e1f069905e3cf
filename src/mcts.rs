//! Monte Carlo Tree Search over wall-and-pawn games.
//!
//! This module implements MCTS with:
//! - UCT selection, breaking ties uniformly at random
//! - Restricted expansion (greedy moves and targeted walls once the
//!   opponents are out of walls, heuristic wall candidates otherwise)
//! - Batched rollouts of sibling nodes on a bounded rayon pool
//! - Tree reuse across turns by promoting a grandchild of the old root
//! - Post-search refinement of the chosen move
//!
//! Nodes live in an arena and refer to their parent by index. Only the root
//! stores a `GameState`; every other node's state is rebuilt by replaying the
//! mutations on the path from the root.

use std::ops::{Index, IndexMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use log::{debug, info, trace, warn};
use rayon::prelude::*;

use crate::constants::{
    DECIDED_RATIO_HIGH, DECIDED_RATIO_LOW, HOPELESS_RATIO, N_SIMS, OPENING_TURNS, ROLLOUT_CHUNK_SIZE,
    TIE_MARGIN, UCT_CONST,
};
use crate::game::{GameState, Mutation};
use crate::geometry::{Pawn, PlayerId};
use crate::playout::{
    apply_legal, available_shortest_moves, dedup_walls, next_candidate_fences, path_blocking_fences,
    rollout,
};
use crate::random::{RandomSource, SplitMix64, Xoshiro256};

/// Index of a node in a [`SearchTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// Action leading here from the parent. `None` only for a fresh root.
    pub mutation: Option<Mutation>,
    /// Player credited with this node's wins: the one who played `mutation`,
    /// or the player to move for a fresh root.
    pub actor: PlayerId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub wins: u32,
    pub simulated: u32,
    /// Simulations credited without a rollout (forced single-child expansions).
    pub skipped: u32,
    pub terminal: bool,
    cached: Option<GameState>,
}

impl Node {
    fn new(mutation: Option<Mutation>, actor: PlayerId, parent: Option<NodeId>) -> Self {
        Self {
            mutation,
            actor,
            parent,
            children: Vec::new(),
            wins: 0,
            simulated: 0,
            skipped: 0,
            terminal: false,
            cached: None,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn is_simulated(&self) -> bool {
        self.simulated > 0
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Wins over real rollouts. Skipped simulations carry no evidence and are
    /// left out of the denominator; with no rollouts at all this is 0.
    pub fn win_ratio(&self) -> f32 {
        let evaluated = self.simulated.saturating_sub(self.skipped);
        if evaluated == 0 {
            0.0
        } else {
            self.wins as f32 / evaluated as f32
        }
    }
}

/// Arena-backed search tree.
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Index<NodeId> for SearchTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.as_usize()]
    }
}

impl IndexMut<NodeId> for SearchTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.as_usize()]
    }
}

impl SearchTree {
    /// A one-node tree rooted at `game`.
    pub fn new(game: GameState) -> Self {
        let mut root = Node::new(None, game.current_player(), None);
        root.cached = Some(game);
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn add_child(&mut self, parent: NodeId, mutation: Mutation, actor: PlayerId) -> NodeId {
        let id = self.alloc(Node::new(Some(mutation), actor, Some(parent)));
        self[parent].children.push(id);
        id
    }

    /// Rebuild the game state at `id` from the nearest cached ancestor.
    ///
    /// # Panics
    ///
    /// Panics if the chain holds a mutation the game rejects, which can only
    /// happen if the tree was built from illegal actions.
    pub fn make_game(&self, id: NodeId) -> GameState {
        let mut pending = Vec::new();
        let mut cur = id;
        let base = loop {
            let node = &self[cur];
            if let Some(game) = &node.cached {
                break game;
            }
            match (node.mutation, node.parent) {
                (Some(m), Some(parent)) => {
                    pending.push(m);
                    cur = parent;
                }
                _ => panic!("node {cur:?} has neither cached state nor a parent mutation"),
            }
        };

        let mut game = base.clone();
        for m in pending.into_iter().rev() {
            game = apply_legal(&game, m);
        }
        game
    }

    /// UCT score of a simulated non-root node.
    pub fn uct_value(&self, id: NodeId, c: f32) -> f32 {
        let node = &self[id];
        let parent_sims = node.parent.map_or(1, |p| self[p].simulated).max(1);
        let exploration = (c * (parent_sims as f32).ln() / node.simulated as f32).sqrt();
        node.win_ratio() + exploration
    }

    /// Child with the highest win ratio; the first one wins ties.
    pub fn max_win_ratio_child(&self, id: NodeId) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for &child in &self[id].children {
            match best {
                Some(b) if self[child].win_ratio() <= self[b].win_ratio() => {}
                _ => best = Some(child),
            }
        }
        best
    }

    /// Credit a rollout result to `id` and all of its ancestors.
    fn backpropagate(&mut self, id: NodeId, result: &GameState) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = &mut self[n];
            node.simulated += 1;
            if result.is_win(node.actor) {
                node.wins += 1;
            }
            cur = node.parent;
        }
    }

    /// Credit a simulation without evidence to `id` and all of its ancestors.
    fn credit_skipped(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = &mut self[n];
            node.simulated += 1;
            node.skipped += 1;
            cur = node.parent;
        }
    }

    /// A node two plies below the root whose state equals `game`.
    fn find_grandchild(&self, game: &GameState) -> Option<NodeId> {
        self[self.root]
            .children
            .iter()
            .flat_map(|&c| self[c].children.iter().copied())
            .find(|&g| self.make_game(g) == *game)
    }

    /// Make `id` the root, keeping its subtree and dropping everything else.
    ///
    /// The new root caches its game state; nodes are renumbered breadth-first.
    fn promote(self, id: NodeId) -> SearchTree {
        let game = self.make_game(id);

        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut order = vec![id];
        let mut head = 0;
        while head < order.len() {
            let old = order[head];
            head += 1;
            order.extend(self[old].children.iter().copied());
        }

        let mut remap = vec![u32::MAX; self.nodes.len()];
        for (new, old) in order.iter().enumerate() {
            remap[old.as_usize()] = new as u32;
        }

        let mut old_nodes: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        for old in order {
            if let Some(mut node) = old_nodes[old.as_usize()].take() {
                node.parent = node
                    .parent
                    .map(|p| remap[p.as_usize()])
                    .filter(|&p| p != u32::MAX)
                    .map(NodeId);
                for child in &mut node.children {
                    *child = NodeId(remap[child.as_usize()]);
                }
                nodes.push(node);
            }
        }

        let root = &mut nodes[0];
        root.parent = None;
        root.cached = Some(game);
        SearchTree {
            nodes,
            root: NodeId(0),
        }
    }
}

/// Runtime search parameters.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Simulations added per decision.
    pub simulations: usize,
    /// Maximum rollouts in one parallel batch.
    pub chunk_size: usize,
    /// UCT exploration constant.
    pub uct_const: f32,
    /// Rollout worker threads.
    pub threads: usize,
    /// Seed for all generator slots; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: N_SIMS,
            chunk_size: ROLLOUT_CHUNK_SIZE,
            uct_const: UCT_CONST,
            threads: ROLLOUT_CHUNK_SIZE,
            seed: None,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Persistent MCTS engine for one player.
///
/// Keep one instance per player across a game so earlier simulations can be
/// reused after re-rooting.
pub struct MonteCarloTreeSearch {
    config: SearchConfig,
    tree: Option<SearchTree>,
    total_simulations: usize,
    /// One generator per rollout slot. Slot 0 also drives the sequential
    /// parts of the search.
    generators: Mutex<Vec<Xoshiro256>>,
    pool: Option<rayon::ThreadPool>,
}

impl Default for MonteCarloTreeSearch {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl MonteCarloTreeSearch {
    pub fn new(config: SearchConfig) -> Self {
        let mut seeder = match config.seed {
            Some(seed) => SplitMix64::new(seed),
            None => SplitMix64::from_entropy(),
        };
        let slots = config.chunk_size.max(1);
        let generators = (0..slots).map(|_| Xoshiro256::from_source(&mut seeder)).collect();

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("falling back to the global rayon pool: {e}");
                None
            }
        };

        Self {
            config,
            tree: None,
            total_simulations: 0,
            generators: Mutex::new(generators),
            pool,
        }
    }

    /// Default configuration with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(SearchConfig {
            seed: Some(seed),
            ..SearchConfig::default()
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn tree(&self) -> Option<&SearchTree> {
        self.tree.as_ref()
    }

    /// Simulations run over the engine's lifetime.
    pub fn total_simulations(&self) -> usize {
        self.total_simulations
    }

    /// Point the search at `game`.
    ///
    /// If `game` is two plies below the current root, that grandchild becomes
    /// the root with its statistics intact. Otherwise the tree starts over.
    pub fn set_game_state(&mut self, game: &GameState) {
        if let Some(tree) = self.tree.take() {
            if let Some(id) = tree.find_grandchild(game) {
                let tree = tree.promote(id);
                let root = tree.root();
                debug!(
                    "promoted grandchild to root; children's simulated counts: {:?}",
                    tree[root].children.iter().map(|&c| tree[c].simulated).collect::<Vec<_>>()
                );
                self.tree = Some(tree);
                return;
            }
        }
        self.tree = Some(SearchTree::new(game.clone()));
    }

    /// Re-root on `game` and search it with `simulations` more simulations.
    pub fn decide_move(&mut self, game: &GameState, simulations: usize) -> Mutation {
        self.set_game_state(game);
        self.search_best_move(simulations)
    }

    /// Search the current root and return the chosen action.
    ///
    /// # Panics
    ///
    /// Panics if no game state was set or if the root position has no legal
    /// action.
    pub fn search_best_move(&mut self, simulations: usize) -> Mutation {
        let started = Instant::now();
        let Self {
            config,
            tree,
            total_simulations,
            generators,
            pool,
        } = self;
        let generators: &Mutex<Vec<Xoshiro256>> = generators;
        let Some(tree) = tree.as_mut() else {
            panic!("search_best_move called before set_game_state");
        };

        let root_game = tree.make_game(tree.root());
        if root_game.turn_count < OPENING_TURNS {
            return opening_move(&root_game, &mut lock(generators)[0]);
        }

        let target = *total_simulations + simulations;
        while *total_simulations < target {
            *total_simulations += iterate(tree, config, generators, pool.as_ref());
        }

        let best = choose_move(tree, &root_game, &mut lock(generators)[0]);

        for line in summarize(tree, config.uct_const, 3) {
            info!("{line}");
        }
        info!(
            "search for {} took {:?}; estimated win ratio {:.3}",
            root_game.current_player(),
            started.elapsed(),
            tree.max_win_ratio_child(tree.root()).map_or(0.0, |c| tree[c].win_ratio())
        );

        match tree[best].mutation {
            Some(m) => m,
            None => panic!("root child without a mutation"),
        }
    }

    /// Top `n` root children by win ratio, one line each.
    pub fn root_summary(&self, n: usize) -> Vec<String> {
        match &self.tree {
            Some(tree) => summarize(tree, self.config.uct_const, n),
            None => Vec::new(),
        }
    }
}

fn summarize(tree: &SearchTree, c: f32, n: usize) -> Vec<String> {
    let mut children = tree[tree.root()].children.clone();
    children.sort_by(|&a, &b| {
        tree[b]
            .win_ratio()
            .partial_cmp(&tree[a].win_ratio())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    children
        .into_iter()
        .take(n)
        .filter_map(|id| {
            let node = &tree[id];
            let m = node.mutation?;
            let mut line = format!(
                "child: {m} uct: {:.4} win/simulated: {}/{} = {:.4}",
                if node.is_simulated() { tree.uct_value(id, c) } else { 0.0 },
                node.wins,
                node.simulated - node.skipped,
                node.win_ratio()
            );
            if node.skipped > 0 {
                line.push_str(&format!(" (skipped: {})", node.skipped));
            }
            Some(line)
        })
        .collect()
}

/// One step along a shortest path, used for the first turns of a game.
fn opening_move<R: RandomSource>(game: &GameState, rng: &mut R) -> Mutation {
    let pawn = game.board.pawn(game.current_player());
    let path = game.board.path_finder().pawn_path(pawn, rng);
    let moves = available_shortest_moves(&game.board.available_moves(pawn.id), &path);
    if moves.is_empty() {
        panic!("{} has no legal move at turn {}", pawn.id, game.turn_count);
    }
    Mutation::MovePawn(moves[rng.below(moves.len())])
}

/// One selection, expansion-or-rollout and backpropagation round.
///
/// Returns the number of simulations it accounted for.
fn iterate(
    tree: &mut SearchTree,
    config: &SearchConfig,
    generators: &Mutex<Vec<Xoshiro256>>,
    pool: Option<&rayon::ThreadPool>,
) -> usize {
    let targets = find_next_rollout_candidates(tree, config.uct_const, &mut lock(generators)[0]);
    if targets.len() != 1 {
        return concurrent_rollout(tree, &targets, config.chunk_size, generators, pool);
    }

    let target = targets[0];
    let node = &tree[target];
    if (node.is_simulated() || node.is_root()) && !node.terminal {
        let game = tree.make_game(target);
        let actor = game.current_player();
        let mutations = expansion_mutations(&game, &mut lock(generators)[0]);
        let children: Vec<NodeId> = mutations
            .into_iter()
            .map(|m| tree.add_child(target, m, actor))
            .collect();

        return match children.as_slice() {
            [] => panic!("no legal action for {actor} at turn {}", game.turn_count),
            &[only] => {
                // A forced reply needs no rollout, but its terminal flag still matters.
                tree[only].terminal = tree.make_game(only).is_finished();
                tree.credit_skipped(only);
                1
            }
            _ => concurrent_rollout(tree, &children, config.chunk_size, generators, pool),
        };
    }

    let game = tree.make_game(target);
    if game.is_finished() {
        tree[target].terminal = true;
    }
    let result = rollout(game, &mut lock(generators)[0]);
    tree.backpropagate(target, &result);
    1
}

/// Descend by UCT until reaching unsimulated children or a leaf.
///
/// Unsimulated children are returned as a batch; a leaf is returned alone.
fn find_next_rollout_candidates<R: RandomSource>(tree: &SearchTree, c: f32, rng: &mut R) -> Vec<NodeId> {
    let mut id = tree.root();
    loop {
        let children = tree[id].children();
        let unsimulated: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|&ch| !tree[ch].is_simulated())
            .collect();
        if !unsimulated.is_empty() {
            return unsimulated;
        }
        if children.is_empty() {
            return vec![id];
        }

        let mut best = vec![children[0]];
        let mut max_uct = tree.uct_value(children[0], c);
        for &child in &children[1..] {
            let uct = tree.uct_value(child, c);
            if uct > max_uct {
                max_uct = uct;
                best.clear();
                best.push(child);
            } else if uct == max_uct {
                best.push(child);
            }
        }
        id = best[rng.below(best.len())];
    }
}

/// Roll out a random sample of `candidates` in parallel, then backpropagate
/// the results in order.
///
/// Worker `i` borrows generator slot `i` for the duration of its rollout, so
/// the outcome depends only on the seed, not on thread scheduling.
fn concurrent_rollout(
    tree: &mut SearchTree,
    candidates: &[NodeId],
    chunk_size: usize,
    generators: &Mutex<Vec<Xoshiro256>>,
    pool: Option<&rayon::ThreadPool>,
) -> usize {
    let selected = lock(generators)[0].sample(candidates, chunk_size.max(1));
    trace!("rolling out {} of {} candidates", selected.len(), candidates.len());

    let shared: &SearchTree = tree;
    let run = || {
        selected
            .par_iter()
            .enumerate()
            .map(|(slot, &node)| {
                let mut rng = lock(generators)[slot].clone();
                let game = shared.make_game(node);
                let terminal = game.is_finished();
                let result = rollout(game, &mut rng);
                lock(generators)[slot] = rng;
                (node, terminal, result)
            })
            .collect::<Vec<_>>()
    };
    let results = match pool {
        Some(pool) => pool.install(run),
        None => run(),
    };

    for (node, terminal, result) in results {
        if terminal {
            tree[node].terminal = true;
        }
        tree.backpropagate(node, &result);
    }
    selected.len()
}

/// Child actions considered when expanding a node for the player to move.
fn expansion_mutations<R: RandomSource>(game: &GameState, rng: &mut R) -> Vec<Mutation> {
    let player = game.current_player();
    let pawn = game.board.pawn(player);
    let opponents: Vec<&Pawn> = game.board.pawns().iter().filter(|p| p.id != player).collect();
    let opponents_out_of_walls = opponents.iter().all(|p| p.fences_left == 0);
    let finder = game.board.path_finder();

    // With no walls left to fear, only shortest-path steps are worth trying.
    let available = game.board.available_moves(player);
    let moves = if opponents_out_of_walls {
        available_shortest_moves(&available, &finder.pawn_path(pawn, rng))
    } else {
        available
    };
    let mut out: Vec<Mutation> = moves.into_iter().map(Mutation::MovePawn).collect();

    if pawn.fences_left > 0 {
        let candidates = if opponents_out_of_walls && !opponents.is_empty() {
            let opponent = opponents[rng.below(opponents.len())];
            let path = finder.pawn_path(opponent, rng);
            if pawn.fences_left == 1 {
                path_blocking_fences(&path)
            } else if path.len() > 2 {
                dedup_walls(
                    path[1..path.len() - 1]
                        .iter()
                        .flat_map(|c| c.surrounding_walls())
                        .collect(),
                )
            } else {
                Vec::new()
            }
        } else {
            next_candidate_fences(game, rng)
        };

        out.extend(
            candidates
                .into_iter()
                .filter(|w| game.board.can_add_fence(w.point, w.orientation))
                .map(|w| Mutation::PutFence(w.point, w.orientation)),
        );
    }

    out
}

/// Pick the root child to play, then apply the refinement heuristics.
fn choose_move<R: RandomSource>(tree: &SearchTree, root_game: &GameState, rng: &mut R) -> NodeId {
    let root = tree.root();
    let Some(mut best) = tree.max_win_ratio_child(root) else {
        panic!("search finished without any root child");
    };
    let siblings = tree[root].children();
    let board = &root_game.board;
    let finder = board.path_finder();
    let is_move_to = |id: NodeId, to| tree[id].mutation == Some(Mutation::MovePawn(to));

    // Near-decided games: walk the shortest path instead of wandering.
    let ratio = tree[best].win_ratio();
    let best_is_move = tree[best].mutation.is_some_and(|m| m.is_move());
    if !(DECIDED_RATIO_LOW..=DECIDED_RATIO_HIGH).contains(&ratio) && best_is_move {
        let pawn = board.pawn(tree[best].actor);
        let path = finder.pawn_path(pawn, rng);
        if let Some(&step) = path.get(1) {
            if let Some(&shortest) = siblings.iter().find(|&&c| c != best && is_move_to(c, step)) {
                debug!("decided position: replacing a detour with the shortest step");
                best = shortest;
            }
        }
    }

    // A hopeless wall that lengthens nobody's route is wasted.
    if let Some(Mutation::PutFence(..)) = tree[best].mutation.filter(|_| tree[best].win_ratio() < HOPELESS_RATIO) {
        let actor = tree[best].actor;
        let lengthens = match tree[best].mutation.map(|m| root_game.apply(m)) {
            Some(Ok(after)) => {
                let after_finder = after.board.path_finder();
                board
                    .pawns()
                    .iter()
                    .filter(|p| p.id != actor)
                    .any(|opp| finder.pawn_distance(opp) < after_finder.pawn_distance(after.board.pawn(opp.id)))
            }
            _ => false,
        };
        if !lengthens {
            let mut ranked = siblings.to_vec();
            ranked.sort_by(|&a, &b| {
                tree[b]
                    .win_ratio()
                    .partial_cmp(&tree[a].win_ratio())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            if let Some(&mv) = ranked.iter().find(|&&c| tree[c].mutation.is_some_and(|m| m.is_move())) {
                debug!("hopeless position: replacing a pointless wall with a move");
                best = mv;
            }
        }
    }

    // Among moves tied within the margin, prefer one on a shortest path.
    if let Some(Mutation::MovePawn(best_to)) = tree[best].mutation {
        let best_ratio = tree[best].win_ratio();
        let tied: Vec<NodeId> = siblings
            .iter()
            .copied()
            .filter(|&c| {
                c != best
                    && tree[c].mutation.is_some_and(|m| m.is_move())
                    && tree[c].win_ratio() + TIE_MARGIN > best_ratio
            })
            .collect();
        if !tied.is_empty() {
            let pawn = board.pawn(tree[best].actor);
            let path = finder.pawn_path(pawn, rng);
            let already_shortest = finder.distance_to_goal(best_to, pawn.goal) + 1 == path.len().saturating_sub(1);
            if !already_shortest {
                if let Some(&step) = path.get(1) {
                    if let Some(&shortest) = tied.iter().find(|&&c| is_move_to(c, step)) {
                        debug!("tied moves: preferring the shortest step");
                        best = shortest;
                    }
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardState;
    use crate::geometry::{Cell, GoalSide, Orientation, WallPoint};
    use crate::random::FixedSource;

    const A: PlayerId = PlayerId('A');
    const B: PlayerId = PlayerId('B');

    fn small_config(seed: u64) -> SearchConfig {
        SearchConfig {
            simulations: 200,
            chunk_size: ROLLOUT_CHUNK_SIZE,
            uct_const: UCT_CONST,
            threads: 4,
            seed: Some(seed),
        }
    }

    fn midgame() -> GameState {
        let game = GameState::standard(A, B, true);
        let moves = [
            Mutation::MovePawn(Cell::new(4, 1)),
            Mutation::MovePawn(Cell::new(4, 7)),
            Mutation::MovePawn(Cell::new(4, 2)),
            Mutation::PutFence(WallPoint::new(4, 3), Orientation::Horizontal),
        ];
        moves.iter().fold(game, |g, &m| g.apply(m).unwrap())
    }

    #[test]
    fn test_make_game_replays_chain() {
        let game = GameState::standard(A, B, true);
        let mut tree = SearchTree::new(game.clone());
        let c1 = tree.add_child(tree.root(), Mutation::MovePawn(Cell::new(4, 1)), A);
        let c2 = tree.add_child(c1, Mutation::MovePawn(Cell::new(4, 7)), B);
        let expected = game
            .apply(Mutation::MovePawn(Cell::new(4, 1)))
            .unwrap()
            .apply(Mutation::MovePawn(Cell::new(4, 7)))
            .unwrap();
        assert_eq!(tree.make_game(c2), expected);
        assert_eq!(tree.make_game(tree.root()), game);
    }

    #[test]
    fn test_backpropagate_credits_winner_only() {
        let game = GameState::standard(A, B, true);
        let mut tree = SearchTree::new(game);
        let c1 = tree.add_child(tree.root(), Mutation::MovePawn(Cell::new(4, 1)), A);
        let c2 = tree.add_child(c1, Mutation::MovePawn(Cell::new(4, 7)), B);

        let won_by_a = GameState::new(
            vec![A, B],
            30,
            BoardState::new(vec![
                Pawn::new(A, GoalSide::MaxY, Cell::new(2, 8)),
                Pawn::new(B, GoalSide::MinY, Cell::new(6, 6)),
            ]),
        );
        tree.backpropagate(c2, &won_by_a);
        assert_eq!((tree[c2].simulated, tree[c2].wins), (1, 0));
        assert_eq!((tree[c1].simulated, tree[c1].wins), (1, 1));
        assert_eq!((tree[tree.root()].simulated, tree[tree.root()].wins), (1, 1));

        tree.credit_skipped(c2);
        assert_eq!(tree[c2].skipped, 1);
        assert_eq!(tree[c1].simulated, 2);
        assert_eq!(tree[c1].win_ratio(), 1.0);
        assert_eq!(tree[c2].win_ratio(), 0.0);
    }

    #[test]
    fn test_promote_keeps_subtree_only() {
        let game = GameState::standard(A, B, true);
        let mut tree = SearchTree::new(game.clone());
        let root = tree.root();
        let a1 = tree.add_child(root, Mutation::MovePawn(Cell::new(4, 1)), A);
        let a2 = tree.add_child(root, Mutation::MovePawn(Cell::new(3, 0)), A);
        let b1 = tree.add_child(a1, Mutation::MovePawn(Cell::new(4, 7)), B);
        let _b2 = tree.add_child(a2, Mutation::MovePawn(Cell::new(4, 7)), B);
        let leaf = tree.add_child(b1, Mutation::MovePawn(Cell::new(4, 2)), A);
        tree.backpropagate(leaf, &game);

        let target = tree.make_game(b1);
        assert_eq!(tree.find_grandchild(&target), Some(b1));

        let promoted = tree.promote(b1);
        assert_eq!(promoted.len(), 2);
        let new_root = promoted.root();
        assert!(promoted[new_root].is_root());
        assert_eq!(promoted[new_root].simulated, 1);
        assert_eq!(promoted.make_game(new_root), target);
        let child = promoted[new_root].children()[0];
        assert_eq!(promoted[child].parent(), Some(new_root));
        assert_eq!(
            promoted.make_game(child),
            target.apply(Mutation::MovePawn(Cell::new(4, 2))).unwrap()
        );
    }

    #[test]
    fn test_opening_moves_forward() {
        let mut mcts = MonteCarloTreeSearch::new(small_config(1));
        let game = GameState::standard(A, B, true);
        assert_eq!(mcts.decide_move(&game, 200), Mutation::MovePawn(Cell::new(4, 1)));
        assert_eq!(mcts.total_simulations(), 0);
    }

    #[test]
    fn test_search_returns_legal_action() {
        let mut mcts = MonteCarloTreeSearch::new(small_config(7));
        let game = midgame();
        let m = mcts.decide_move(&game, 200);
        assert!(game.apply(m).is_ok(), "{m} is not legal");
        assert!(mcts.total_simulations() >= 200);
        let tree = mcts.tree().unwrap();
        assert!(tree[tree.root()].simulated as usize >= 200);
        assert!(!mcts.root_summary(3).is_empty());
    }

    #[test]
    fn test_expansion_when_opponent_has_no_walls() {
        let board = BoardState::new(vec![
            Pawn::with_fences(A, GoalSide::MaxY, Cell::new(4, 2), 1),
            Pawn::with_fences(B, GoalSide::MinY, Cell::new(4, 6), 0),
        ]);
        let game = GameState::new(vec![A, B], 10, board);
        let mut rng = Xoshiro256::seed_from_u64(3);
        let mutations = expansion_mutations(&game, &mut rng);
        let moves: Vec<_> = mutations.iter().filter(|m| m.is_move()).collect();
        assert_eq!(moves, vec![&Mutation::MovePawn(Cell::new(4, 3))]);
        // With one wall left only placements that cut B's path are offered.
        assert!(mutations.iter().any(|m| !m.is_move()));
        for m in mutations.iter().filter(|m| !m.is_move()) {
            let after = game.apply(*m).unwrap();
            let before_finder = game.board.path_finder();
            let after_finder = after.board.path_finder();
            let path = before_finder.pawn_path(game.board.pawn(B), &mut crate::random::FixedSource);
            let cuts = path.windows(2).any(|s| after.board.exists_fence_between(s[0], s[1]));
            let longer = after_finder.pawn_distance(after.board.pawn(B)) >= before_finder.pawn_distance(game.board.pawn(B));
            assert!(cuts || longer);
        }
    }

    #[test]
    fn test_one_iteration_caps_the_batch() {
        let config = small_config(4);
        let generators = Mutex::new(
            (0..config.chunk_size as u64)
                .map(Xoshiro256::seed_from_u64)
                .collect::<Vec<_>>(),
        );
        let mut tree = SearchTree::new(midgame());
        let root = tree.root();

        let simulated = iterate(&mut tree, &config, &generators, None);
        let children = tree[root].children().to_vec();
        assert!(children.len() > ROLLOUT_CHUNK_SIZE, "only {} children", children.len());
        assert_eq!(simulated, ROLLOUT_CHUNK_SIZE);
        assert_eq!(tree[root].simulated as usize, ROLLOUT_CHUNK_SIZE);
        let rolled: Vec<_> = children.iter().filter(|&&c| tree[c].is_simulated()).collect();
        assert_eq!(rolled.len(), ROLLOUT_CHUNK_SIZE);
        assert!(rolled.iter().all(|&&c| tree[c].simulated == 1));

        // The next round rolls out the leftovers, still no more than a batch.
        let leftovers = children.len() - ROLLOUT_CHUNK_SIZE;
        let simulated = iterate(&mut tree, &config, &generators, None);
        assert_eq!(simulated, leftovers.min(ROLLOUT_CHUNK_SIZE));
    }

    /// A tree whose root children carry the given `(mutation, wins, simulated)`.
    fn scored_root(game: &GameState, children: &[(Mutation, u32, u32)]) -> (SearchTree, Vec<NodeId>) {
        let mut tree = SearchTree::new(game.clone());
        let root = tree.root();
        let actor = game.current_player();
        let ids = children
            .iter()
            .map(|&(m, wins, simulated)| {
                let id = tree.add_child(root, m, actor);
                tree[id].wins = wins;
                tree[id].simulated = simulated;
                tree[root].simulated += simulated;
                id
            })
            .collect();
        (tree, ids)
    }

    fn step(x: i32, y: i32) -> Mutation {
        Mutation::MovePawn(Cell::new(x, y))
    }

    #[test]
    fn test_decided_position_takes_shortest_step() {
        // A at (4,0): only (4,1) is on a shortest path.
        let game = GameState::standard(A, B, true);
        let (tree, ids) = scored_root(&game, &[(step(3, 0), 99, 100), (step(4, 1), 90, 100), (step(5, 0), 50, 100)]);
        assert_eq!(choose_move(&tree, &game, &mut FixedSource), ids[1]);

        let (tree, ids) = scored_root(&game, &[(step(3, 0), 2, 100), (step(4, 1), 1, 100), (step(5, 0), 0, 100)]);
        assert_eq!(choose_move(&tree, &game, &mut FixedSource), ids[1]);
    }

    #[test]
    fn test_undecided_position_keeps_best_ratio() {
        let game = GameState::standard(A, B, true);
        let (tree, ids) = scored_root(&game, &[(step(3, 0), 60, 100), (step(4, 1), 45, 100), (step(5, 0), 50, 100)]);
        assert_eq!(choose_move(&tree, &game, &mut FixedSource), ids[0]);
    }

    #[test]
    fn test_hopeless_pointless_wall_becomes_best_move() {
        let game = GameState::standard(A, B, true);
        // A wall far from B's column changes nothing for B.
        let wall = Mutation::PutFence(WallPoint::new(1, 1), Orientation::Vertical);
        let (tree, ids) = scored_root(&game, &[(wall, 1, 100), (step(5, 0), 0, 100), (step(3, 0), 1, 200)]);
        assert_eq!(choose_move(&tree, &game, &mut FixedSource), ids[2]);
    }

    #[test]
    fn test_hopeless_wall_that_lengthens_is_kept() {
        let game = GameState::standard(A, B, true);
        // Cuts (4,8)-(4,7) and (3,8)-(3,7), pushing B one step sideways.
        let wall = Mutation::PutFence(WallPoint::new(4, 8), Orientation::Horizontal);
        let after = game.apply(wall).unwrap();
        assert_eq!(after.board.path_finder().pawn_distance(after.board.pawn(B)), 9);

        let (tree, ids) = scored_root(&game, &[(wall, 1, 100), (step(4, 1), 0, 100), (step(3, 0), 0, 100)]);
        assert_eq!(choose_move(&tree, &game, &mut FixedSource), ids[0]);
    }

    #[test]
    fn test_tied_moves_prefer_shortest_step() {
        let game = GameState::standard(A, B, true);
        let (tree, ids) = scored_root(&game, &[(step(3, 0), 50, 100), (step(4, 1), 49, 100), (step(5, 0), 10, 100)]);
        assert_eq!(choose_move(&tree, &game, &mut FixedSource), ids[1]);

        // Outside the margin the better ratio stands.
        let (tree, ids) = scored_root(&game, &[(step(3, 0), 50, 100), (step(4, 1), 45, 100), (step(5, 0), 10, 100)]);
        assert_eq!(choose_move(&tree, &game, &mut FixedSource), ids[0]);
    }
}
