//! Zobrist key tables and mixing rules.
//!
//! Keys are generated from a fixed seed so hashes are deterministic across
//! runs. The en-passant file term is mixed in only when an en-passant
//! capture is actually pseudo-legally available to the side to move, which
//! matches the published book hashing convention and keeps repetition
//! detection from distinguishing positions that differ only by an unusable
//! en-passant square.

use std::sync::OnceLock;

use crate::attacks::tables::pawn_attacks;
use crate::board::position::Position;
use crate::board::types::{file_of, CastlingRights, Color, Piece, PieceKind, Square};

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[u64; 64]; 12],
    castling: [u64; 16],
    en_passant_file: [u64; 8],
    side_to_move: u64,
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut seed: u64 = 0x1234_5678_9ABC_DEF0;

    let mut piece_square = [[0u64; 64]; 12];
    for piece in &mut piece_square {
        for key in piece.iter_mut() {
            *key = next_random_u64(&mut seed);
        }
    }

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = next_random_u64(&mut seed);
    }

    let mut en_passant_file = [0u64; 8];
    for key in &mut en_passant_file {
        *key = next_random_u64(&mut seed);
    }

    let side_to_move = next_random_u64(&mut seed);

    ZobristTables {
        piece_square,
        castling,
        en_passant_file,
        side_to_move,
    }
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Key for a `(piece, square)` occupancy term.
#[inline]
pub fn piece_square_key(piece: Piece, square: Square) -> u64 {
    tables().piece_square[piece.index()][square as usize]
}

/// Key contribution for a castling-rights mask (`0..=15`).
#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    tables().castling[(castling_rights & 0x0F) as usize]
}

/// Key contribution for an en-passant file.
#[inline]
pub fn en_passant_file_key(file: u8) -> u64 {
    tables().en_passant_file[file as usize]
}

/// Side-to-move toggle key (xor in when Black is to move).
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// En-passant hash term for the position's current state.
///
/// Returns the file key only when a side-to-move pawn stands ready to
/// capture on the en-passant target square; zero otherwise.
#[inline]
pub fn en_passant_term(position: &Position) -> u64 {
    let Some(ep_square) = position.en_passant_square() else {
        return 0;
    };
    let us = position.side_to_move();
    let capturing_pawns =
        pawn_attacks(us.opposite(), ep_square) & position.pieces(us, PieceKind::Pawn);
    if capturing_pawns != 0 {
        en_passant_file_key(file_of(ep_square))
    } else {
        0
    }
}

/// Compute the full position key from scratch. The incremental key
/// maintained by make/unmake must always agree with this.
pub fn compute_key(position: &Position) -> u64 {
    let mut key = 0u64;

    for square in 0..64u8 {
        if let Some(piece) = position.piece_at(square) {
            key ^= piece_square_key(piece, square);
        }
    }

    key ^= castling_key(position.castling_rights());
    if position.side_to_move() == Color::Black {
        key ^= side_to_move_key();
    }
    key ^= en_passant_term(position);

    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::position::Position;

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let pawn_a1 = piece_square_key(Piece::new(Color::White, PieceKind::Pawn), 0);
        let pawn_a1_again = piece_square_key(Piece::new(Color::White, PieceKind::Pawn), 0);
        let pawn_a2 = piece_square_key(Piece::new(Color::White, PieceKind::Pawn), 8);
        assert_eq!(pawn_a1, pawn_a1_again);
        assert_ne!(pawn_a1, pawn_a2);
        assert_ne!(side_to_move_key(), 0);
    }

    #[test]
    fn unusable_en_passant_square_does_not_change_the_key() {
        // After 1.e4 the en-passant square e3 is set but no black pawn can
        // capture there, so the term must not be mixed in.
        let with_ep =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .expect("FEN should parse");
        let without_ep =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
                .expect("FEN should parse");
        assert_eq!(with_ep.zobrist_key(), without_ep.zobrist_key());
    }

    #[test]
    fn usable_en_passant_square_changes_the_key() {
        // Black pawn on d4 can capture on c3, so the ep term matters.
        let with_ep =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/8/2Pp4/8/PP1PPPPP/RNBQKBNR b KQkq c3 0 2")
                .expect("FEN should parse");
        let without_ep =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/8/2Pp4/8/PP1PPPPP/RNBQKBNR b KQkq - 0 2")
                .expect("FEN should parse");
        assert_ne!(with_ep.zobrist_key(), without_ep.zobrist_key());
    }
}
