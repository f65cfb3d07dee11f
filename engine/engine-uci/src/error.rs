//! UCI error types.

use thiserror::Error;

/// Errors surfaced by command parsing and the engine loop.
#[derive(Debug, Error)]
pub enum UciError {
    #[error("malformed position command")]
    MalformedPosition,

    #[error("invalid FEN: {fen}")]
    InvalidFen { fen: String },

    #[error("invalid move: {uci_move}")]
    InvalidMove { uci_move: String },

    #[error("missing value for go parameter {param}")]
    MissingGoValue { param: String },

    #[error("invalid value {value} for go parameter {param}")]
    InvalidGoValue { param: String, value: String },

    #[error("malformed setoption command")]
    MalformedSetOption,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
