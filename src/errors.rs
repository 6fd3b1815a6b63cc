//! Boundary error type.
//!
//! Interior engine code never fails: positions are valid by construction
//! and search operates only on generated moves. Errors exist where text or
//! external data enters the engine, and rejecting an input must leave the
//! engine state untouched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid move text: {0}")]
    InvalidMoveText(String),

    #[error("move {0} is not legal in the current position")]
    IllegalMove(String),

    #[error("opening book import failed: {0}")]
    BookImport(String),
}
