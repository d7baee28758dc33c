//! Static evaluation of non-terminal states.
//!
//! Every heuristic scores a state from `player`'s point of view, which need
//! not be the player to move. Decided games always score `-inf` for the loser
//! and `+inf` for the winner; anything else gets a finite value.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::game::GameState;

/// How much more an opponent move costs than an own move is worth.
pub const MOBILITY_WEIGHT: f64 = 1.6;

/// A pluggable evaluation function.
pub type ScoreFn<S> = fn(&S, <S as GameState>::Player) -> f64;

fn decided<S: GameState>(state: &S, player: S::Player) -> Option<f64> {
    if state.is_loser(player) {
        Some(f64::NEG_INFINITY)
    } else if state.is_winner(player) {
        Some(f64::INFINITY)
    } else {
        None
    }
}

/// Own move count minus the weighted opponent move count.
pub fn mobility_score<S: GameState>(state: &S, player: S::Player) -> f64 {
    if let Some(score) = decided(state, player) {
        return score;
    }
    let own_moves = state.legal_moves(player).len() as f64;
    let opp_moves = state.legal_moves(state.opponent(player)).len() as f64;
    own_moves - MOBILITY_WEIGHT * opp_moves
}

/// Euclidean distance between the two players. Zero while either is off the board.
pub fn distance_score<S: GameState>(state: &S, player: S::Player) -> f64 {
    if let Some(score) = decided(state, player) {
        return score;
    }
    match (state.player_location(player), state.player_location(state.opponent(player))) {
        (Some(own), Some(opp)) => {
            let dr = (own.row - opp.row) as f64;
            let dc = (own.col - opp.col) as f64;
            (dr * dr + dc * dc).sqrt()
        },
        _ => 0.0,
    }
}

/// The historical variant of [`distance_score`], which adds the two players'
/// coordinates instead of subtracting them. Kept for score parity only.
pub fn summed_distance_score<S: GameState>(state: &S, player: S::Player) -> f64 {
    if let Some(score) = decided(state, player) {
        return score;
    }
    match (state.player_location(player), state.player_location(state.opponent(player))) {
        (Some(own), Some(opp)) => {
            let sr = (own.row + opp.row) as f64;
            let sc = (own.col + opp.col) as f64;
            (sr * sr + sc * sc).sqrt()
        },
        _ => 0.0,
    }
}

/// Own move count plus the number of open cells left on the board.
pub fn openness_score<S: GameState>(state: &S, player: S::Player) -> f64 {
    if let Some(score) = decided(state, player) {
        return score;
    }
    (state.legal_moves(player).len() + state.blank_spaces().len()) as f64
}

/// Configuration-level choice of evaluation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    #[default]
    Mobility,
    Distance,
    SummedDistance,
    Openness,
}

impl Heuristic {
    pub fn score_fn<S: GameState>(self) -> ScoreFn<S> {
        match self {
            Heuristic::Mobility => mobility_score::<S>,
            Heuristic::Distance => distance_score::<S>,
            Heuristic::SummedDistance => summed_distance_score::<S>,
            Heuristic::Openness => openness_score::<S>,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, PlayerId};
    use crate::game::Move;

    const ALL: [Heuristic; 4] = [
        Heuristic::Mobility, Heuristic::Distance, Heuristic::SummedDistance, Heuristic::Openness,
    ];

    fn decided_board() -> Board {
        Board::from_cells(3, 3, &[], [Some(Move::new(1, 1)), Some(Move::new(0, 0))], PlayerId::One)
            .unwrap()
    }

    #[test]
    fn decided_games_score_infinite() {
        let board = decided_board();
        for heuristic in ALL {
            let score = heuristic.score_fn::<Board>();
            assert_eq!(score(&board, PlayerId::One), f64::NEG_INFINITY, "{:?}", heuristic);
            assert_eq!(score(&board, PlayerId::Two), f64::INFINITY, "{:?}", heuristic);
        }
    }

    #[test]
    fn mobility_penalizes_opponent_moves() {
        let board = Board::new(7, 7)
            .forecast_move(Move::new(3, 3))
            .forecast_move(Move::new(0, 0));
        // 8 own jumps against 2 for the opponent
        let score = mobility_score(&board, PlayerId::One);
        assert!((score - (8.0 - 1.6 * 2.0)).abs() < 1e-9);
        let score = mobility_score(&board, PlayerId::Two);
        assert!((score - (2.0 - 1.6 * 8.0)).abs() < 1e-9);
    }

    #[test]
    fn distance_measures_separation() {
        let board = Board::new(7, 7)
            .forecast_move(Move::new(1, 1))
            .forecast_move(Move::new(4, 5));
        assert_eq!(distance_score(&board, PlayerId::One), 5.0);
        assert_eq!(distance_score(&board, PlayerId::Two), 5.0);
        assert_eq!(summed_distance_score(&board, PlayerId::One), (25.0f64 + 36.0).sqrt());
    }

    #[test]
    fn distance_is_zero_before_placement() {
        let board = Board::new(7, 7).forecast_move(Move::new(1, 1));
        assert_eq!(distance_score(&board, PlayerId::One), 0.0);
        assert_eq!(summed_distance_score(&board, PlayerId::Two), 0.0);
    }

    #[test]
    fn openness_counts_own_moves_and_blank_cells() {
        let board = Board::new(7, 7)
            .forecast_move(Move::new(3, 3))
            .forecast_move(Move::new(0, 0));
        assert_eq!(openness_score(&board, PlayerId::One), (8 + 47) as f64);
        assert_eq!(openness_score(&board, PlayerId::Two), (2 + 47) as f64);
    }

    #[test]
    fn heuristic_config_names() {
        let parsed: Heuristic = serde_json::from_str("\"summed_distance\"").unwrap();
        assert_eq!(parsed, Heuristic::SummedDistance);
        assert_eq!(Heuristic::default(), Heuristic::Mobility);
    }
}
