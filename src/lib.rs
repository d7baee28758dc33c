//! Adversarial search for Isolation-style grid games: fixed-depth minimax and
//! iterative-deepening alpha-beta under a real-time budget, with pluggable
//! static evaluation.

pub mod board;
pub mod engine;
pub mod error;
pub mod eval;
pub mod game;
pub mod search;
pub mod timer;

pub use board::{Board, PlayerId};
pub use engine::{AgentConfig, AlphaBetaEngine, Engine, EngineKind, MinimaxEngine, SearchStats};
pub use error::{Error, Result};
pub use eval::{Heuristic, ScoreFn};
pub use game::{is_terminal, GameState, Move};
pub use timer::{Deadline, SearchTimeout, TimeGuard};
