//! Go Text Protocol (GTP) front end, with the GoGui rules extensions.
//!
//! The engine reads one command per line and answers `= result` or
//! `? error`, each followed by a blank line. A numeric id in front of a
//! command is echoed back in the response (`=7 ...`).
//!
//! ## Supported Commands
//!
//! - `protocol_version`, `name`, `version`, `known_command <cmd>`,
//!   `list_commands`, `quit`
//! - `boardsize <n>`, `clear_board`, `showboard`, `komi <v>` (ignored)
//! - `play <color> <vertex|pass>`, `genmove <color>`, `legal_moves <color>`
//! - `timelimit <seconds>` and `solve` for the exact solver
//! - `policy random|rule_based` and `policy_moves` for the playout policy
//! - `gogui-rules_*` and `gogui-analyze_commands` for GoGui
//!
//! ## Example
//!
//! ```ignore
//! use gomoku_search::config::EngineConfig;
//! use gomoku_search::gtp::GtpEngine;
//! let mut engine = GtpEngine::with_config(EngineConfig::default())?;
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};
use std::time::Duration;

use thiserror::Error;

use crate::board::{Board, BoardError, Cell, Color, MoveError, Point};
use crate::config::{ConfigError, EngineConfig};
use crate::mcts::Mcts;
use crate::policy::PlayoutPolicy;
use crate::solver::{Outcome, Solver};

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "protocol_version",
    "quit",
    "name",
    "version",
    "known_command",
    "list_commands",
    "boardsize",
    "clear_board",
    "showboard",
    "komi",
    "play",
    "genmove",
    "legal_moves",
    "timelimit",
    "solve",
    "policy",
    "policy_moves",
    "gogui-rules_game_id",
    "gogui-rules_board_size",
    "gogui-rules_legal_moves",
    "gogui-rules_side_to_move",
    "gogui-rules_board",
    "gogui-rules_final_result",
    "gogui-analyze_commands",
];

const ANALYZE_COMMANDS: &str = "pstring/Legal Moves For ToPlay/gogui-rules_legal_moves\n\
pstring/Side to Play/gogui-rules_side_to_move\n\
pstring/Final Result/gogui-rules_final_result\n\
pstring/Board Size/gogui-rules_board_size\n\
pstring/Rules GameID/gogui-rules_game_id\n\
pstring/Show Board/gogui-rules_board\n\
pstring/Policy Moves/policy_moves\n\
pstring/Solve/solve";

/// Reasons a command fails; the message becomes the `?` response.
#[derive(Debug, Error)]
pub enum GtpError {
    #[error("unknown command")]
    UnknownCommand,
    #[error("wrong number of arguments: {command} expects {expected}")]
    WrongArity { command: String, expected: usize },
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    #[error("invalid argument '{0}'")]
    InvalidArgument(String),
    #[error("illegal move: \"{0}\" occupied")]
    Occupied(String),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What `genmove` decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenMove {
    Play(Point),
    Pass,
    Resign,
}

/// GTP engine state.
pub struct GtpEngine {
    board: Board,
    config: EngineConfig,
    solver: Solver,
    /// Search tree kept across moves of one game
    mcts: Mcts,
    rng: fastrand::Rng,
}

impl GtpEngine {
    /// Create an engine from validated settings.
    pub fn with_config(config: EngineConfig) -> Result<Self, GtpError> {
        config.validate()?;
        let board = Board::new(config.board_size)?;
        let (mcts, rng) = match config.seed {
            Some(seed) => (
                Mcts::with_seed(config.policy, seed),
                fastrand::Rng::with_seed(seed.wrapping_add(1)),
            ),
            None => (Mcts::new(config.policy), fastrand::Rng::new()),
        };
        Ok(Self {
            solver: Solver::new(board.size()),
            board,
            config,
            mcts,
            rng,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mcts(&self) -> &Mcts {
        &self.mcts
    }

    /// Run the GTP command loop on stdin and stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((&command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();
            log::trace!("<< {line}");

            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            let response = match self.execute(&command, args) {
                Ok(message) => format!("={id_str} {message}"),
                Err(err) => {
                    log::debug!("{command} failed: {err}");
                    format!("?{id_str} {err}")
                }
            };
            log::trace!(">> {response}");
            write!(output, "{response}\n\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    fn expect_args(command: &str, args: &[&str], expected: usize) -> Result<(), GtpError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(GtpError::WrongArity {
                command: command.to_string(),
                expected,
            })
        }
    }

    fn parse_color(arg: &str) -> Result<Color, GtpError> {
        Color::from_gtp(arg).ok_or_else(|| GtpError::InvalidColor(arg.to_string()))
    }

    /// Execute one command and return the text of a successful response.
    pub fn execute(&mut self, command: &str, args: &[&str]) -> Result<String, GtpError> {
        let arity = match command {
            "boardsize" | "known_command" | "komi" | "genmove" | "legal_moves" | "timelimit"
            | "policy" => Some(1),
            "play" => Some(2),
            _ => None,
        };
        if let Some(expected) = arity {
            Self::expect_args(command, args, expected)?;
        }

        match command {
            "protocol_version" => Ok("2".to_string()),
            "quit" => Ok(String::new()),
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),
            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),
            "known_command" => {
                let known = KNOWN_COMMANDS.contains(&args[0].to_lowercase().as_str());
                Ok(if known { "true" } else { "false" }.to_string())
            }
            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "boardsize" => {
                let size = args[0]
                    .parse::<usize>()
                    .map_err(|_| GtpError::InvalidArgument(args[0].to_string()))?;
                self.set_board_size(size)?;
                Ok(String::new())
            }
            "clear_board" => {
                self.board.reset();
                self.mcts.reset(Color::Black);
                Ok(String::new())
            }
            "showboard" => Ok(format!("\n{}", self.board.to_string().trim_end())),
            "komi" => Ok(String::new()),

            "play" => {
                let color = Self::parse_color(args[0])?;
                self.play(color, args[1])?;
                Ok(String::new())
            }
            "genmove" => {
                let color = Self::parse_color(args[0])?;
                Ok(match self.genmove(color)? {
                    GenMove::Play(mv) => self.board.format_point(mv),
                    GenMove::Pass => "pass".to_string(),
                    GenMove::Resign => "resign".to_string(),
                })
            }
            "legal_moves" => {
                Self::parse_color(args[0])?;
                Ok(self.legal_move_names().join(" "))
            }

            "timelimit" => {
                let seconds = args[0]
                    .parse::<u64>()
                    .map_err(|_| GtpError::InvalidArgument(args[0].to_string()))?;
                self.config.time_limit = Duration::from_secs(seconds);
                Ok(String::new())
            }
            "solve" => Ok(self.solve()),

            "policy" => {
                let policy = args[0]
                    .parse::<PlayoutPolicy>()
                    .map_err(|_| GtpError::InvalidArgument(args[0].to_string()))?;
                self.config.policy = policy;
                self.mcts.set_policy(policy);
                Ok(format!("Policy set to {policy}"))
            }
            "policy_moves" => Ok(self.policy_moves()),

            "gogui-rules_game_id" => Ok("Gomoku".to_string()),
            "gogui-rules_board_size" => Ok(self.board.size().to_string()),
            "gogui-rules_legal_moves" => Ok(self.legal_move_names().join(" ").to_lowercase()),
            "gogui-rules_side_to_move" => Ok(self.board.current_player().to_string()),
            "gogui-rules_board" => Ok(self.rules_board()),
            "gogui-rules_final_result" => Ok(self.final_result().to_string()),
            "gogui-analyze_commands" => Ok(ANALYZE_COMMANDS.to_string()),

            _ => Err(GtpError::UnknownCommand),
        }
    }

    fn set_board_size(&mut self, size: usize) -> Result<(), GtpError> {
        let config = EngineConfig {
            board_size: size,
            ..self.config.clone()
        };
        config.validate()?;
        self.board = Board::new(size)?;
        self.config = config;
        self.mcts.reset(Color::Black);
        Ok(())
    }

    /// Play `vertex` for `color` and advance the search tree past it.
    pub fn play(&mut self, color: Color, vertex: &str) -> Result<(), GtpError> {
        if vertex.eq_ignore_ascii_case("pass") {
            self.board.set_current_player(color.opponent());
            self.mcts.reset(color.opponent());
            return Ok(());
        }
        let pt = self.board.parse_point(vertex)?;
        match self.board.play_move(pt, color) {
            Ok(()) => {}
            Err(MoveError::Occupied) => return Err(GtpError::Occupied(vertex.to_lowercase())),
            Err(err) => return Err(err.into()),
        }
        log::debug!("{color} played {}", self.board.format_point(pt));
        self.advance_tree(pt, color);
        Ok(())
    }

    /// Choose and play a move for `color`.
    ///
    /// Resigns if the opponent already has five and passes on a full board.
    /// Otherwise a proven win from the solver is played directly; failing
    /// that MCTS picks the move.
    pub fn genmove(&mut self, color: Color) -> Result<GenMove, GtpError> {
        match self.board.detect_five_in_a_row() {
            Some(winner) if winner != color => return Ok(GenMove::Resign),
            Some(_) => return Ok(GenMove::Pass),
            None => {}
        }
        if self.board.is_full() {
            return Ok(GenMove::Pass);
        }

        let Some(mv) = self.choose_move(color) else {
            return Ok(GenMove::Pass);
        };
        self.board.play_move(mv, color)?;
        log::info!("{color} plays {}", self.board.format_point(mv));
        self.advance_tree(mv, color);
        Ok(GenMove::Play(mv))
    }

    fn choose_move(&mut self, color: Color) -> Option<Point> {
        if !self.config.time_limit.is_zero() {
            let result = self.solver.solve(&self.board, color, Some(self.config.time_limit));
            if result.outcome == Outcome::Win {
                if let Some(mv) = result.best_move {
                    return Some(mv);
                }
            }
        }

        let mv = self.mcts.get_move(
            &self.board,
            color,
            self.config.simulations,
            self.config.exploration,
        );
        mv.or_else(|| {
            log::debug!("no searched move, picking a random empty point");
            self.rng.choice(self.board.empty_points())
        })
    }

    /// Keep the subtree under `mv` if the tree was built for `color`.
    fn advance_tree(&mut self, mv: Point, color: Color) {
        if self.mcts.to_play() == color {
            self.mcts.update_with_move(mv);
        } else {
            self.mcts.reset(color.opponent());
        }
    }

    fn solve(&mut self) -> String {
        let to_move = self.board.current_player();
        let budget = Some(self.config.time_limit);
        let result = self.solver.solve(&self.board, to_move, budget);
        match (result.outcome, result.best_move) {
            (Outcome::Unknown, _) => "unknown".to_string(),
            (_, Some(mv)) => format!("{result} {}", self.board.format_point(mv)),
            (_, None) => result.to_string(),
        }
    }

    fn policy_moves(&self) -> String {
        let color = self.board.current_player();
        let (category, moves) = self.config.policy.candidate_moves(&self.board, color);
        if moves.is_empty() {
            return String::new();
        }
        let names = self.sorted_names(&moves);
        format!("{category} {}", names.join(" "))
    }

    fn legal_move_names(&self) -> Vec<String> {
        if self.board.detect_five_in_a_row().is_some() {
            return Vec::new();
        }
        self.sorted_names(&self.board.empty_points())
    }

    fn sorted_names(&self, points: &[Point]) -> Vec<String> {
        let mut names: Vec<String> = points.iter().map(|&pt| self.board.format_point(pt)).collect();
        names.sort();
        names
    }

    fn rules_board(&self) -> String {
        let size = self.board.size();
        let mut out = String::with_capacity((size + 1) * size + 1);
        out.push('\n');
        for row in (1..=size).rev() {
            for col in 1..=size {
                out.push(match self.board.get(self.board.point(row, col)) {
                    Cell::Stone(Color::Black) => 'X',
                    Cell::Stone(Color::White) => 'O',
                    _ => '.',
                });
            }
            if row > 1 {
                out.push('\n');
            }
        }
        out
    }

    fn final_result(&self) -> &'static str {
        match self.board.detect_five_in_a_row() {
            Some(Color::Black) => "black",
            Some(Color::White) => "white",
            None if self.board.is_full() => "draw",
            None => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> GtpEngine {
        let config = EngineConfig {
            simulations: 20,
            time_limit: Duration::from_millis(50),
            seed: Some(42),
            ..EngineConfig::default()
        };
        GtpEngine::with_config(config).unwrap()
    }

    fn exec(engine: &mut GtpEngine, line: &str) -> Result<String, GtpError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        engine.execute(parts[0], &parts[1..])
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = GtpEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = GtpEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_and_protocol() {
        let mut engine = engine();
        assert_eq!(exec(&mut engine, "name").unwrap(), "gomoku-search");
        assert_eq!(exec(&mut engine, "protocol_version").unwrap(), "2");
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine();
        assert_eq!(exec(&mut engine, "known_command solve").unwrap(), "true");
        assert_eq!(exec(&mut engine, "known_command fly").unwrap(), "false");
        assert!(matches!(exec(&mut engine, "fly"), Err(GtpError::UnknownCommand)));
    }

    #[test]
    fn test_arity_checked() {
        let mut engine = engine();
        assert!(matches!(
            exec(&mut engine, "play b"),
            Err(GtpError::WrongArity { expected: 2, .. })
        ));
    }

    #[test]
    fn test_boardsize() {
        let mut engine = engine();
        assert!(exec(&mut engine, "boardsize 9").is_ok());
        assert_eq!(engine.board().size(), 9);
        assert_eq!(engine.config().board_size, 9);
        assert!(matches!(exec(&mut engine, "boardsize 4"), Err(GtpError::Config(_))));
        assert_eq!(engine.board().size(), 9);
    }

    #[test]
    fn test_play_occupied_is_illegal() {
        let mut engine = engine();
        exec(&mut engine, "play b c3").unwrap();
        let err = exec(&mut engine, "play w C3").unwrap_err();
        assert_eq!(err.to_string(), "illegal move: \"c3\" occupied");
        assert_eq!(engine.board().stone_count(), 1);
        assert_eq!(engine.board().current_player(), Color::White);
    }

    #[test]
    fn test_play_and_clear() {
        let mut engine = engine();
        exec(&mut engine, "play b d4").unwrap();
        exec(&mut engine, "play w e4").unwrap();
        exec(&mut engine, "clear_board").unwrap();
        assert_eq!(engine.board().stone_count(), 0);
        assert_eq!(exec(&mut engine, "gogui-rules_side_to_move").unwrap(), "black");
    }

    #[test]
    fn test_genmove_plays_legal_move() {
        let mut engine = engine();
        exec(&mut engine, "play b d4").unwrap();
        let answer = exec(&mut engine, "genmove w").unwrap();
        let pt = engine.board().parse_point(&answer).unwrap();
        assert_eq!(engine.board().get(pt), Cell::Stone(Color::White));
        assert_eq!(engine.board().stone_count(), 2);
        assert_eq!(engine.mcts().to_play(), Color::Black);
    }

    #[test]
    fn test_genmove_takes_win() {
        let mut engine = engine();
        for line in ["play b a1", "play w a7", "play b b1", "play w b7", "play b c1", "play w c7", "play b d1"] {
            exec(&mut engine, line).unwrap();
        }
        // White ignores the four on row 1.
        exec(&mut engine, "play w g7").unwrap();
        assert_eq!(exec(&mut engine, "genmove b").unwrap(), "E1");
        assert_eq!(exec(&mut engine, "gogui-rules_final_result").unwrap(), "black");
        assert_eq!(exec(&mut engine, "gogui-rules_legal_moves").unwrap(), "");
        assert_eq!(exec(&mut engine, "genmove w").unwrap(), "resign");
    }

    #[test]
    fn test_policy_commands() {
        let mut engine = engine();
        for line in ["play w c3", "play w c4", "play w c5"] {
            exec(&mut engine, line).unwrap();
        }
        engine.board.set_current_player(Color::Black);
        let answer = exec(&mut engine, "policy_moves").unwrap();
        assert!(answer.starts_with("Random "));

        assert_eq!(exec(&mut engine, "policy rule_based").unwrap(), "Policy set to rule_based");
        assert_eq!(exec(&mut engine, "policy_moves").unwrap(), "BlockOpenFour C1 C2 C6 C7");
        assert!(exec(&mut engine, "policy greedy").is_err());
    }

    #[test]
    fn test_rules_board() {
        let mut engine = engine();
        exec(&mut engine, "boardsize 5").unwrap();
        exec(&mut engine, "play b a1").unwrap();
        exec(&mut engine, "play w e5").unwrap();
        let board = exec(&mut engine, "gogui-rules_board").unwrap();
        assert_eq!(board, "\n....O\n.....\n.....\n.....\nX....");
    }

    #[test]
    fn test_run_with_echoes_ids() {
        let mut engine = engine();
        let input = b"1 name\n# comment\n\n2 fly\nquit\nname\n";
        let mut output = Vec::new();
        engine.run_with(&input[..], &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "=1 gomoku-search\n\n?2 unknown command\n\n= \n\n");
    }
}
