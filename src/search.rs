//! Depth-limited game-tree search.
//!
//! A [`Searcher`] lives for one move request. It scores every leaf from the
//! point of view of the player to move at the root, so maximizing layers are
//! that player's turns and minimizing layers are the opponent's. Each node
//! checks the [`TimeGuard`] first and a [`SearchTimeout`] unwinds straight
//! back to the caller through `?`.

use crate::eval::ScoreFn;
use crate::game::{is_terminal, GameState, Move};
use crate::timer::{SearchTimeout, TimeGuard};

pub type SearchResult<T> = Result<T, SearchTimeout>;

pub struct Searcher<'a, S: GameState> {
    guard: TimeGuard<'a>,
    score: ScoreFn<S>,
    player: S::Player,
    nodes: u64,
}

/// The largest `f64` strictly below `x`.
fn next_below(x: f64) -> f64 {
    if x.is_nan() || x == f64::NEG_INFINITY {
        x
    } else if x == 0.0 {
        -f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}

impl<'a, S: GameState> Searcher<'a, S> {
    pub fn new(guard: TimeGuard<'a>, score: ScoreFn<S>, player: S::Player) -> Self {
        Self { guard, score, player, nodes: 0 }
    }

    /// Game states entered so far, the root of every pass included.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    fn enter(&mut self) -> SearchResult<()> {
        self.guard.check()?;
        self.nodes += 1;
        Ok(())
    }

    fn leaf_score(&self, state: &S, depth: u32) -> Option<f64> {
        (depth == 0 || is_terminal(state)).then(|| (self.score)(state, self.player))
    }

    /// Best move for the active player, exploring every line to `depth` plies.
    /// Later moves win ties. `Move::NONE` if there is nothing to play.
    pub fn minimax(&mut self, state: &S, depth: u32) -> SearchResult<Move> {
        self.enter()?;
        let legal_moves = state.legal_moves(state.active_player());
        let Some(&seed) = legal_moves.first() else {
            return Ok(Move::NONE);
        };

        let mut best_move = seed;
        let mut best_value = f64::NEG_INFINITY;
        for mv in legal_moves {
            let value = self.min_value(&state.forecast_move(mv), depth.saturating_sub(1))?;
            if value >= best_value {
                best_value = value;
                best_move = mv;
            }
        }
        Ok(best_move)
    }

    pub fn min_value(&mut self, state: &S, depth: u32) -> SearchResult<f64> {
        self.enter()?;
        if let Some(score) = self.leaf_score(state, depth) {
            return Ok(score);
        }
        let mut value = f64::INFINITY;
        for mv in state.legal_moves(state.active_player()) {
            value = value.min(self.max_value(&state.forecast_move(mv), depth - 1)?);
        }
        Ok(value)
    }

    pub fn max_value(&mut self, state: &S, depth: u32) -> SearchResult<f64> {
        self.enter()?;
        if let Some(score) = self.leaf_score(state, depth) {
            return Ok(score);
        }
        let mut value = f64::NEG_INFINITY;
        for mv in state.legal_moves(state.active_player()) {
            value = value.max(self.min_value(&state.forecast_move(mv), depth - 1)?);
        }
        Ok(value)
    }

    /// [`minimax`](Self::minimax) with alpha-beta pruning. Picks the same move
    /// as plain minimax at the same depth, except that the first move proving
    /// a value of at least `beta` is returned straight away.
    pub fn alphabeta(&mut self, state: &S, depth: u32, mut alpha: f64, beta: f64) -> SearchResult<Move> {
        self.enter()?;
        let legal_moves = state.legal_moves(state.active_player());
        let Some(&seed) = legal_moves.first() else {
            return Ok(Move::NONE);
        };

        let mut best_move = seed;
        let mut best_value = f64::NEG_INFINITY;
        for mv in legal_moves {
            // A child failing low against a bound just under alpha is strictly
            // worse than the best so far, so a returned tie is always exact.
            let child_alpha = next_below(alpha);
            let value = self.ab_min_value(&state.forecast_move(mv), depth.saturating_sub(1), child_alpha, beta)?;
            if value >= best_value {
                best_value = value;
                best_move = mv;
            }
            if best_value >= beta {
                return Ok(best_move);
            }
            alpha = alpha.max(best_value);
        }
        Ok(best_move)
    }

    pub fn ab_max_value(&mut self, state: &S, depth: u32, mut alpha: f64, beta: f64) -> SearchResult<f64> {
        self.enter()?;
        if let Some(score) = self.leaf_score(state, depth) {
            return Ok(score);
        }
        let mut value = f64::NEG_INFINITY;
        for mv in state.legal_moves(state.active_player()) {
            value = value.max(self.ab_min_value(&state.forecast_move(mv), depth - 1, alpha, beta)?);
            if value >= beta {
                return Ok(value);
            }
            alpha = alpha.max(value);
        }
        Ok(value)
    }

    pub fn ab_min_value(&mut self, state: &S, depth: u32, alpha: f64, mut beta: f64) -> SearchResult<f64> {
        self.enter()?;
        if let Some(score) = self.leaf_score(state, depth) {
            return Ok(score);
        }
        let mut value = f64::INFINITY;
        for mv in state.legal_moves(state.active_player()) {
            value = value.min(self.ab_max_value(&state.forecast_move(mv), depth - 1, alpha, beta)?);
            if value <= alpha {
                return Ok(value);
            }
            beta = beta.min(value);
        }
        Ok(value)
    }
}
