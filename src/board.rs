use std::fmt;
use bitvec::prelude::*;

use crate::error::{Error, Result};
use crate::game::{GameState, Move};

pub const DEFAULT_WIDTH: usize = 7;
pub const DEFAULT_HEIGHT: usize = 7;

/// Players move like chess knights once they are on the board.
const KNIGHT_JUMPS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

pub type CellSet = BitVec<u64, Lsb0>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

/// An Isolation board. Each cell a player lands on stays blocked for the
/// rest of the game; the first player left without a move loses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    blocked: CellSet,
    locations: [Option<Move>; 2],
    active: PlayerId,
    move_count: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            blocked: bitvec![u64, Lsb0; 0; width * height],
            locations: [None, None],
            active: PlayerId::One,
            move_count: 0,
        }
    }

    /// Builds an arbitrary position. Player locations count as blocked cells;
    /// only the placed players count towards [`move_count`](Self::move_count).
    pub fn from_cells(
            width: usize,
            height: usize,
            blocked: &[Move],
            locations: [Option<Move>; 2],
            active: PlayerId,
    ) -> Result<Self> {
        let mut board = Self::new(width, height);
        for &cell in blocked.iter().chain(locations.iter().flatten()) {
            let idx = board.index(cell).ok_or(Error::OutOfBounds { cell, width, height })?;
            board.blocked.set(idx, true);
        }
        if let [Some(a), Some(b)] = locations {
            if a == b {
                return Err(Error::InvalidInput(format!("both players placed on {}", a)));
            }
        }
        board.locations = locations;
        board.active = active;
        board.move_count = locations.iter().flatten().count();
        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    fn index(&self, cell: Move) -> Option<usize> {
        let in_bounds = cell.row >= 0 && cell.col >= 0
            && (cell.row as usize) < self.height && (cell.col as usize) < self.width;
        in_bounds.then(|| cell.row as usize * self.width + cell.col as usize)
    }

    fn cell(&self, idx: usize) -> Move {
        Move::new((idx / self.width) as i32, (idx % self.width) as i32)
    }

    fn is_open(&self, cell: Move) -> bool {
        self.index(cell).map_or(false, |idx| !self.blocked[idx])
    }

    fn moves_from(&self, location: Option<Move>) -> Vec<Move> {
        match location {
            None => self.blank_spaces(),
            Some(from) => KNIGHT_JUMPS.iter()
                .map(|&(dr, dc)| Move::new(from.row + dr, from.col + dc))
                .filter(|&cell| self.is_open(cell))
                .collect(),
        }
    }

    fn active_is_stuck(&self) -> bool {
        self.legal_moves(self.active).is_empty()
    }

    /// Validated move application. `None` passes, which is only allowed
    /// when the active player has nothing left to play.
    pub fn apply_move(&self, maybe_move: Option<Move>) -> Result<Self> {
        let legal_moves = self.legal_moves(self.active);
        match maybe_move {
            Some(mv) if legal_moves.contains(&mv) => Ok(self.forecast_move(mv)),
            None if legal_moves.is_empty() => {
                let mut board = self.clone();
                board.active = self.active.other();
                Ok(board)
            },
            _ => Err(Error::IllegalMove(maybe_move)),
        }
    }
}

impl GameState for Board {
    type Player = PlayerId;

    fn active_player(&self) -> PlayerId {
        self.active
    }

    fn legal_moves(&self, player: PlayerId) -> Vec<Move> {
        self.moves_from(self.locations[player.index()])
    }

    fn forecast_move(&self, mv: Move) -> Self {
        let mut board = self.clone();
        if let Some(idx) = self.index(mv) {
            board.blocked.set(idx, true);
        }
        board.locations[self.active.index()] = Some(mv);
        board.active = self.active.other();
        board.move_count += 1;
        board
    }

    fn utility(&self, player: PlayerId) -> f64 {
        if !self.active_is_stuck() {
            0.0
        } else if player == self.active {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }
    }

    fn is_winner(&self, player: PlayerId) -> bool {
        player != self.active && self.active_is_stuck()
    }

    fn is_loser(&self, player: PlayerId) -> bool {
        player == self.active && self.active_is_stuck()
    }

    fn opponent(&self, player: PlayerId) -> PlayerId {
        player.other()
    }

    fn player_location(&self, player: PlayerId) -> Option<Move> {
        self.locations[player.index()]
    }

    fn blank_spaces(&self) -> Vec<Move> {
        self.blocked.iter_zeros().map(|idx| self.cell(idx)).collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let cell = Move::new(row as i32, col as i32);
                let symbol = if self.locations[0] == Some(cell) {
                    '1'
                } else if self.locations[1] == Some(cell) {
                    '2'
                } else if self.is_open(cell) {
                    '.'
                } else {
                    '#'
                };
                write!(f, "{}", symbol)?;
                if col + 1 < self.width {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_can_target_any_blank_cell() {
        let board = Board::new(3, 3);
        assert_eq!(board.legal_moves(PlayerId::One).len(), 9);
        assert_eq!(board.blank_spaces().len(), 9);
        assert_eq!(board.active_player(), PlayerId::One);
    }

    #[test]
    fn forecast_blocks_cell_and_switches_turn() {
        let board = Board::new(3, 3);
        let next = board.forecast_move(Move::new(0, 0));
        assert_eq!(next.active_player(), PlayerId::Two);
        assert_eq!(next.player_location(PlayerId::One), Some(Move::new(0, 0)));
        assert_eq!(next.blank_spaces().len(), 8);
        assert_eq!(next.move_count(), 1);
        // the source board is untouched
        assert_eq!(board.blank_spaces().len(), 9);
    }

    #[test]
    fn placed_players_jump_like_knights() {
        let board = Board::new(7, 7)
            .forecast_move(Move::new(3, 3))
            .forecast_move(Move::new(0, 0));
        let mut moves = board.legal_moves(PlayerId::One);
        moves.sort_by_key(|m| (m.row, m.col));
        assert_eq!(moves, vec![
            Move::new(1, 2), Move::new(1, 4), Move::new(2, 1), Move::new(2, 5),
            Move::new(4, 1), Move::new(4, 5), Move::new(5, 2), Move::new(5, 4),
        ]);
        let mut corner = board.legal_moves(PlayerId::Two);
        corner.sort_by_key(|m| (m.row, m.col));
        assert_eq!(corner, vec![Move::new(1, 2), Move::new(2, 1)]);
    }

    #[test]
    fn stuck_active_player_loses() {
        // the centre of a 3x3 board has no knight jumps
        let board = Board::from_cells(
            3, 3, &[], [Some(Move::new(1, 1)), Some(Move::new(0, 0))], PlayerId::One,
        ).unwrap();
        assert!(board.is_loser(PlayerId::One));
        assert!(board.is_winner(PlayerId::Two));
        assert!(!board.is_winner(PlayerId::One));
        assert_eq!(board.utility(PlayerId::One), f64::NEG_INFINITY);
        assert_eq!(board.utility(PlayerId::Two), f64::INFINITY);
    }

    #[test]
    fn undecided_board_has_zero_utility() {
        let board = Board::default();
        assert_eq!(board.utility(PlayerId::One), 0.0);
        assert!(!board.is_loser(PlayerId::One));
        assert!(!board.is_winner(PlayerId::Two));
    }

    #[test]
    fn apply_move_rejects_illegal_moves() {
        let board = Board::new(3, 3).forecast_move(Move::new(0, 0));
        assert!(matches!(board.apply_move(Some(Move::new(0, 0))), Err(Error::IllegalMove(_))));
        assert!(matches!(board.apply_move(Some(Move::new(5, 5))), Err(Error::IllegalMove(_))));
        assert!(matches!(board.apply_move(None), Err(Error::IllegalMove(None))));
        assert!(board.apply_move(Some(Move::new(2, 2))).is_ok());
    }

    #[test]
    fn passing_is_allowed_only_without_moves() {
        let board = Board::from_cells(
            3, 3, &[], [Some(Move::new(1, 1)), Some(Move::new(0, 0))], PlayerId::One,
        ).unwrap();
        let passed = board.apply_move(None).unwrap();
        assert_eq!(passed.active_player(), PlayerId::Two);
    }

    #[test]
    fn from_cells_counts_placed_players_not_walls() {
        let walls = [Move::new(0, 1), Move::new(1, 0), Move::new(2, 2)];
        let board = Board::from_cells(
            3, 3, &walls, [Some(Move::new(0, 0)), Some(Move::new(1, 1))], PlayerId::One,
        ).unwrap();
        assert_eq!(board.move_count(), 2);
        assert_eq!(board.blank_spaces().len(), 4);
        let unplaced = Board::from_cells(3, 3, &walls, [None, None], PlayerId::One).unwrap();
        assert_eq!(unplaced.move_count(), 0);
    }

    #[test]
    fn from_cells_validates_input() {
        let err = Board::from_cells(3, 3, &[Move::new(3, 0)], [None, None], PlayerId::One);
        assert!(matches!(err, Err(Error::OutOfBounds { .. })));
        let same = Some(Move::new(1, 1));
        let err = Board::from_cells(3, 3, &[], [same, same], PlayerId::One);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn display_marks_players_and_blocked_cells() {
        let board = Board::from_cells(
            3, 2, &[Move::new(1, 2)], [Some(Move::new(0, 0)), Some(Move::new(1, 1))], PlayerId::One,
        ).unwrap();
        assert_eq!(board.to_string(), "1 . .\n. 2 #\n");
    }
}
