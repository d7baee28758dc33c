use std::fmt;
use serde::ser::{Serialize, Serializer, SerializeTuple};
use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};

/// A target cell on the grid, as `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub row: i32,
    pub col: i32,
}

impl Move {
    /// "No legal move" / forfeit.
    pub const NONE: Move = Move { row: -1, col: -1 };

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl From<(i32, i32)> for Move {
    fn from((row, col): (i32, i32)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl Serialize for Move {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        let mut s = serializer.serialize_tuple(2)?;
        s.serialize_element(&self.row)?;
        s.serialize_element(&self.col)?;
        s.end()
    }
}

struct MoveVisitor;
impl<'de> Visitor<'de> for MoveVisitor {
    type Value = Move;
    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON array [row, col]")
    }
    fn visit_seq<V>(self, mut seq: V) -> Result<Move, V::Error> where V: SeqAccess<'de> {
        let row = seq.next_element::<i32>()?
            .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
        let col = seq.next_element::<i32>()?
            .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
        if seq.next_element::<serde::de::IgnoredAny>()?.is_some() {
            return Err(serde::de::Error::invalid_length(3, &self));
        }
        Ok(Move { row, col })
    }
}

impl<'de> Deserialize<'de> for Move {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        deserializer.deserialize_tuple(2, MoveVisitor)
    }
}

/// The view of a two-player, zero-sum, turn-based grid game that the
/// search needs. States are immutable: `forecast_move` returns a new one.
pub trait GameState: Clone {
    /// Identifies one of the two competitors. Only ever compared for equality.
    type Player: Copy + Eq + fmt::Debug;

    fn active_player(&self) -> Self::Player;

    /// Legal moves for `player`; empty if it has none.
    fn legal_moves(&self, player: Self::Player) -> Vec<Move>;

    /// Successor state after the active player plays `mv`. `mv` must be legal.
    fn forecast_move(&self, mv: Move) -> Self;

    /// Nonzero only once the game is decided: positive for a win, negative for a loss.
    fn utility(&self, player: Self::Player) -> f64;

    fn is_winner(&self, player: Self::Player) -> bool;

    fn is_loser(&self, player: Self::Player) -> bool;

    fn opponent(&self, player: Self::Player) -> Self::Player;

    /// `None` until the player has been placed on the board.
    fn player_location(&self, player: Self::Player) -> Option<Move>;

    fn blank_spaces(&self) -> Vec<Move>;
}

/// A state is terminal for its active player once the game has been decided
/// or that player has nowhere left to move.
pub fn is_terminal<S: GameState>(state: &S) -> bool {
    let player = state.active_player();
    state.utility(player) != 0.0 || state.legal_moves(player).is_empty()
}
