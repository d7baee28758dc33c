use std::path::Path;
use clap::ValueEnum;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::eval::{Heuristic, ScoreFn};
use crate::game::{GameState, Move};
use crate::search::{SearchResult, Searcher};
use crate::timer::{TimeGuard, DEFAULT_TIMEOUT_MS};

pub const DEFAULT_SEARCH_DEPTH: u32 = 3;

/// Settings fixed when an agent is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Plies searched by the fixed-depth engine.
    pub search_depth: u32,
    pub heuristic: Heuristic,
    /// Remaining milliseconds below which a search is abandoned.
    pub timeout_ms: f64,
    /// Optional cap on iterative deepening. `None` deepens until time runs out.
    pub max_depth: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            search_depth: DEFAULT_SEARCH_DEPTH,
            heuristic: Heuristic::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_depth: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.search_depth == 0 {
            return Err(Error::InvalidConfig("search_depth must be at least 1".into()));
        }
        if !self.timeout_ms.is_finite() || self.timeout_ms < 0.0 {
            return Err(Error::InvalidConfig(format!("timeout_ms must be a non-negative number, got {}", self.timeout_ms)));
        }
        if self.max_depth == Some(0) {
            return Err(Error::InvalidConfig("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Bookkeeping from the most recent move request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Game states entered across every pass.
    pub nodes: u64,
    /// Deepest pass that finished before the deadline; 0 if none did.
    pub completed_depth: u32,
}

pub trait Engine<S: GameState> {
    /// Chooses a move for the active player. Never fails: running out of time
    /// falls back to the best completed answer, or `Move::NONE`.
    fn select_move(&mut self, state: &S, time_left: &dyn Fn() -> f64) -> Move;

    fn stats(&self) -> SearchStats;
}

/// Fixed-depth minimax without pruning.
pub struct MinimaxEngine<S: GameState> {
    search_depth: u32,
    score: ScoreFn<S>,
    timeout_ms: f64,
    stats: SearchStats,
}

impl<S: GameState> MinimaxEngine<S> {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_score_fn(config.search_depth, config.heuristic.score_fn(), config.timeout_ms))
    }

    pub fn with_score_fn(search_depth: u32, score: ScoreFn<S>, timeout_ms: f64) -> Self {
        Self {
            search_depth: search_depth.max(1),
            score,
            timeout_ms,
            stats: SearchStats::default(),
        }
    }

    /// One minimax pass at `depth`, leaving the node count in [`stats`](Engine::stats).
    pub fn minimax(&mut self, state: &S, depth: u32, time_left: &dyn Fn() -> f64) -> SearchResult<Move> {
        let guard = TimeGuard::new(time_left, self.timeout_ms);
        let mut searcher = Searcher::new(guard, self.score, state.active_player());
        let result = searcher.minimax(state, depth);
        self.stats = SearchStats {
            nodes: searcher.nodes(),
            completed_depth: if result.is_ok() { depth } else { 0 },
        };
        result
    }
}

impl<S: GameState> Engine<S> for MinimaxEngine<S> {
    fn select_move(&mut self, state: &S, time_left: &dyn Fn() -> f64) -> Move {
        match self.minimax(state, self.search_depth, time_left) {
            Ok(mv) => {
                debug!("minimax depth {} chose {} after {} nodes", self.search_depth, mv, self.stats.nodes);
                mv
            },
            Err(timeout) => {
                info!("{} during minimax depth {} after {} nodes", timeout, self.search_depth, self.stats.nodes);
                Move::NONE
            },
        }
    }

    fn stats(&self) -> SearchStats {
        self.stats
    }
}

/// Iterative-deepening minimax with alpha-beta pruning.
pub struct AlphaBetaEngine<S: GameState> {
    score: ScoreFn<S>,
    timeout_ms: f64,
    max_depth: Option<u32>,
    stats: SearchStats,
}

impl<S: GameState> AlphaBetaEngine<S> {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_score_fn(config.heuristic.score_fn(), config.timeout_ms, config.max_depth))
    }

    pub fn with_score_fn(score: ScoreFn<S>, timeout_ms: f64, max_depth: Option<u32>) -> Self {
        Self {
            score,
            timeout_ms,
            max_depth,
            stats: SearchStats::default(),
        }
    }

    /// One pruned pass at a fixed `depth`, leaving the node count in [`stats`](Engine::stats).
    pub fn alphabeta(&mut self, state: &S, depth: u32, time_left: &dyn Fn() -> f64) -> SearchResult<Move> {
        let guard = TimeGuard::new(time_left, self.timeout_ms);
        let mut searcher = Searcher::new(guard, self.score, state.active_player());
        let result = searcher.alphabeta(state, depth, f64::NEG_INFINITY, f64::INFINITY);
        self.stats = SearchStats {
            nodes: searcher.nodes(),
            completed_depth: if result.is_ok() { depth } else { 0 },
        };
        result
    }
}

impl<S: GameState> Engine<S> for AlphaBetaEngine<S> {
    fn select_move(&mut self, state: &S, time_left: &dyn Fn() -> f64) -> Move {
        self.stats = SearchStats::default();
        if state.legal_moves(state.active_player()).is_empty() {
            return Move::NONE;
        }

        let guard = TimeGuard::new(time_left, self.timeout_ms);
        let mut searcher = Searcher::new(guard, self.score, state.active_player());
        let mut best_move = Move::NONE;
        let mut depth = 1;
        while self.max_depth.map_or(true, |max| depth <= max) {
            match searcher.alphabeta(state, depth, f64::NEG_INFINITY, f64::INFINITY) {
                Ok(mv) => {
                    best_move = mv;
                    self.stats.completed_depth = depth;
                    debug!("alphabeta depth {} chose {} ({} nodes so far)", depth, mv, searcher.nodes());
                },
                Err(timeout) => {
                    info!("{} during alphabeta depth {}, keeping {} from depth {}",
                          timeout, depth, best_move, self.stats.completed_depth);
                    break;
                },
            }
            depth += 1;
        }
        self.stats.nodes = searcher.nodes();
        best_move
    }

    fn stats(&self) -> SearchStats {
        self.stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Minimax,
    #[default]
    #[value(name = "alphabeta")]
    #[serde(rename = "alphabeta")]
    AlphaBeta,
}

impl EngineKind {
    pub fn build<S: GameState + 'static>(self, config: &AgentConfig) -> Result<Box<dyn Engine<S> + Send>> {
        let engine: Box<dyn Engine<S> + Send> = match self {
            EngineKind::Minimax => Box::new(MinimaxEngine::new(config)?),
            EngineKind::AlphaBeta => Box::new(AlphaBetaEngine::new(config)?),
        };
        Ok(engine)
    }
}
