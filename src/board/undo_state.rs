use crate::board::moves::Move;
use crate::board::types::{CastlingRights, Piece, Square};

/// Single undo record pushed by `make_move` / `make_null_move`.
///
/// Irreversible state (castling, en passant, halfmove clock, hash) is
/// restored by copy; the piece movement itself is replayed backwards.
#[derive(Debug, Clone, Copy)]
pub struct UndoState {
    pub mv: Move,
    pub captured: Option<Piece>,

    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,
    pub prev_zobrist_key: u64,
}
