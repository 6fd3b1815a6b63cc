//! Draw detection: fifty-move rule, insufficient material, threefold
//! repetition.

use crate::board::position::Position;
use crate::board::types::{Bitboard, PieceKind};

const DARK_SQUARES: Bitboard = 0xAA55_AA55_AA55_AA55;

/// True when the position is drawn by rule.
pub fn is_draw(position: &Position) -> bool {
    position.halfmove_clock() >= 100
        || has_insufficient_material(position)
        || is_threefold_repetition(position)
}

/// Material combinations that cannot deliver mate: bare kings, a lone
/// minor piece, or bishops that all share one square color.
pub fn has_insufficient_material(position: &Position) -> bool {
    if position.kind_bb(PieceKind::Pawn) != 0
        || position.kind_bb(PieceKind::Rook) != 0
        || position.kind_bb(PieceKind::Queen) != 0
    {
        return false;
    }

    let knights = position.kind_bb(PieceKind::Knight);
    let bishops = position.kind_bb(PieceKind::Bishop);
    let minor_count = (knights | bishops).count_ones();

    if minor_count <= 1 {
        return true;
    }

    if knights == 0 {
        let dark_bishops = bishops & DARK_SQUARES;
        return dark_bishops == bishops || dark_bishops == 0;
    }

    false
}

/// Scan the undo stack back to the last irreversible move. The halfmove
/// clock bounds the window, since captures and pawn moves reset it. The
/// current position is drawn when its key already occurred twice.
pub fn is_threefold_repetition(position: &Position) -> bool {
    let current = position.zobrist_key();
    let window = position.halfmove_clock() as usize;
    let mut seen = 0usize;

    for undo in position.undo_stack().iter().rev().take(window) {
        if undo.prev_zobrist_key == current {
            seen += 1;
            if seen >= 2 {
                return true;
            }
        }
    }

    false
}
