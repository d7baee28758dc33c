use thiserror::Error;

use crate::game::Move;

#[derive(Error, Debug)]
pub enum Error {
    #[error("illegal move: {0:?}")]
    IllegalMove(Option<Move>),

    #[error("cell {cell} is outside the {width}x{height} board")]
    OutOfBounds { cell: Move, width: usize, height: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
