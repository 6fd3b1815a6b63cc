//! Coordinate conversions between algebraic square names and indices.

use crate::board::types::{file_of, rank_of, Square};
use crate::errors::EngineError;

/// Convert an algebraic coordinate (for example `e4`) to a square index.
#[inline]
pub fn algebraic_to_square(text: &str) -> Result<Square, EngineError> {
    let bytes = text.as_bytes();
    if bytes.len() != 2 {
        return Err(EngineError::InvalidMoveText(format!(
            "bad square coordinate: {text}"
        )));
    }

    let file = bytes[0];
    let rank = bytes[1];

    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(EngineError::InvalidMoveText(format!(
            "bad square coordinate: {text}"
        )));
    }

    Ok((rank - b'1') * 8 + (file - b'a'))
}

/// Convert a square index (`0..=63`) to its algebraic coordinate.
#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    debug_assert!(square < 64);
    let file = char::from(b'a' + file_of(square));
    let rank = char::from(b'1' + rank_of(square));
    format!("{file}{rank}")
}
