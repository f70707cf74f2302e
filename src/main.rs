//! gomoku-search: a Gomoku engine with an exact solver and MCTS.
//!
//! ## Usage
//!
//! - `gomoku-search` - Start the GTP server
//! - `gomoku-search gtp` - Same, explicitly
//! - `gomoku-search demo` - Play one self-play game and print it
//!
//! Logs go to stderr; stdout carries GTP traffic only.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gomoku_search::board::Color;
use gomoku_search::config::EngineConfig;
use gomoku_search::constants::{DEFAULT_SIZE, DEFAULT_TIME_LIMIT, EXPLORATION, N_SIMS};
use gomoku_search::gtp::{GenMove, GtpEngine};
use gomoku_search::policy::PlayoutPolicy;

/// gomoku-search: Gomoku engine with an alpha-beta solver and MCTS
#[derive(Parser)]
#[command(name = "gomoku-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Board size (5..=25)
    #[arg(long, global = true, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// MCTS simulations per move
    #[arg(long, global = true, default_value_t = N_SIMS)]
    sims: usize,

    /// UCT exploration constant
    #[arg(long, global = true, default_value_t = EXPLORATION)]
    exploration: f64,

    /// Solver time limit per move in seconds (0 disables the solver)
    #[arg(long, global = true, default_value_t = DEFAULT_TIME_LIMIT)]
    time_limit: u64,

    /// Playout policy: random or rule_based
    #[arg(long, global = true, default_value_t = PlayoutPolicy::Random)]
    policy: PlayoutPolicy,

    /// Seed for reproducible rollouts
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log filter (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GUI applications
    Gtp,
    /// Play a self-play game and print every position
    Demo,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            board_size: self.size,
            simulations: self.sims,
            exploration: self.exploration,
            time_limit: Duration::from_secs(self.time_limit),
            policy: self.policy,
            seed: self.seed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, &cli.log_level),
    )
    .target(env_logger::Target::Stderr)
    .init();

    let config = cli.engine_config();
    config.validate().context("invalid engine settings")?;
    log::info!("starting with {config:?}");
    let mut engine = GtpEngine::with_config(config)?;

    match cli.command {
        Some(Commands::Gtp) | None => engine.run().context("GTP loop failed")?,
        Some(Commands::Demo) => run_demo(&mut engine)?,
    }
    Ok(())
}

fn run_demo(engine: &mut GtpEngine) -> anyhow::Result<()> {
    println!("gomoku-search self-play on {0}x{0}\n", engine.board().size());

    let mut color = Color::Black;
    loop {
        match engine.genmove(color)? {
            GenMove::Play(mv) => {
                println!("{color} plays {}", engine.board().format_point(mv));
                println!("{}", engine.board());
            }
            GenMove::Pass => {
                println!("{color} passes: board full, draw");
                break;
            }
            GenMove::Resign => {
                println!("{color} resigns: {} wins", color.opponent());
                break;
            }
        }
        color = color.opponent();
    }
    Ok(())
}
