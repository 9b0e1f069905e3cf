//! Quoridor MCTS command line.
//!
//! ## Usage
//!
//! - `quoridor-mcts` - Show a demo
//! - `quoridor-mcts demo` - Search one position and print the board
//! - `quoridor-mcts self-play` - Play a full game between two engines

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

use quoridor_mcts::constants::N_SIMS;
use quoridor_mcts::game::{GameState, Mutation};
use quoridor_mcts::geometry::{Cell, PlayerId};
use quoridor_mcts::mcts::{MonteCarloTreeSearch, SearchConfig};
use quoridor_mcts::player::{MonteCarloPlayer, PlayerController, ShortestPathPlayer};
use quoridor_mcts::session::{Session, run_match};

const FIRST: PlayerId = PlayerId('M');
const SECOND: PlayerId = PlayerId('m');

/// Quoridor engine driven by Monte Carlo Tree Search
#[derive(Parser)]
#[command(name = "quoridor-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search an early position and print the result
    Demo {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Let the engine play a whole game
    SelfPlay {
        #[command(flatten)]
        search: SearchArgs,
        /// Who plays the second pawn
        #[arg(long, value_enum, default_value_t = Opponent::Mcts)]
        opponent: Opponent,
        /// Stop after this many requests even without a winner
        #[arg(long, default_value_t = 300)]
        max_turns: usize,
    },
}

#[derive(clap::Args, Clone)]
struct SearchArgs {
    /// Simulations per decision
    #[arg(long, default_value_t = N_SIMS)]
    sims: usize,
    /// Seed for reproducible searches
    #[arg(long)]
    seed: Option<u64>,
    /// Rollout worker threads
    #[arg(long)]
    threads: Option<usize>,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        SearchConfig {
            simulations: self.sims,
            threads: self.threads.unwrap_or(defaults.threads),
            seed: self.seed,
            ..defaults
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Opponent {
    Mcts,
    Shortest,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::SelfPlay {
            search,
            opponent,
            max_turns,
        }) => self_play(&search, opponent, max_turns),
        Some(Commands::Demo { search }) => run_demo(&search),
        None => run_demo(&SearchArgs {
            sims: 1000,
            seed: None,
            threads: None,
        }),
    }
}

fn run_demo(search: &SearchArgs) -> Result<()> {
    println!("Quoridor MCTS\n");

    let mut game = GameState::standard(FIRST, SECOND, true);
    for step in [Cell::new(4, 1), Cell::new(4, 7)] {
        game = game.apply(Mutation::MovePawn(step))?;
    }
    println!("{}", game.board);

    let config = search.config();
    let sims = config.simulations;
    let mut mcts = MonteCarloTreeSearch::new(config);
    println!("Running {sims} simulations for {}...", game.current_player());
    let best = mcts.decide_move(&game, sims);
    for line in mcts.root_summary(3) {
        println!("{line}");
    }
    println!("Best action: {best}");

    let next = game.apply(best)?;
    let pawn = next.board.pawn(SECOND);
    let route = next.board.path_finder().pawn_path(pawn, &mut quoridor_mcts::random::FixedSource);
    println!("{}", next.board.dump_with_route(&route));
    Ok(())
}

fn self_play(search: &SearchArgs, opponent: Opponent, max_turns: usize) -> Result<()> {
    let second: Box<dyn PlayerController> = match opponent {
        Opponent::Mcts => Box::new(MonteCarloPlayer::new(SECOND, search.config())),
        Opponent::Shortest => Box::new(ShortestPathPlayer::new(SECOND, search.seed.unwrap_or(0))),
    };
    let mut players: Vec<Box<dyn PlayerController>> =
        vec![Box::new(MonteCarloPlayer::new(FIRST, search.config())), second];

    let first_is_m = search.seed.map_or_else(fastrand::bool, |s| s % 2 == 0);
    let mut session = Session::new(GameState::standard(FIRST, SECOND, first_is_m));
    let winner = run_match(&mut players, &mut session, max_turns);
    println!("{}", session.current().board);

    match winner {
        Some(id) => {
            println!("{id} wins after {} turns", session.current().turn_count);
            Ok(())
        }
        None => bail!("no winner after {max_turns} requests"),
    }
}
