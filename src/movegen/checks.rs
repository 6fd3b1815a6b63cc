//! Attack queries over a position: square attack tests, combined attacker
//! sets, x-ray attacks, and pin detection.

use crate::attacks::magic::{between, bishop_attacks, rook_attacks};
use crate::attacks::tables::{king_attacks, knight_attacks, pawn_attacks};
use crate::board::position::Position;
use crate::board::types::{square_bb, Bitboard, Color, PieceKind, Square};

/// Is `square` attacked by any piece of `attacker`?
pub fn is_square_attacked(position: &Position, square: Square, attacker: Color) -> bool {
    // A pawn of `attacker` attacks `square` exactly when a pawn of the
    // other color standing on `square` would attack it back.
    if pawn_attacks(attacker.opposite(), square) & position.pieces(attacker, PieceKind::Pawn) != 0 {
        return true;
    }

    if knight_attacks(square) & position.pieces(attacker, PieceKind::Knight) != 0 {
        return true;
    }

    if king_attacks(square) & position.pieces(attacker, PieceKind::King) != 0 {
        return true;
    }

    let occupied = position.occupied();

    let diagonal_sliders =
        position.pieces(attacker, PieceKind::Bishop) | position.pieces(attacker, PieceKind::Queen);
    if bishop_attacks(square, occupied) & diagonal_sliders != 0 {
        return true;
    }

    let straight_sliders =
        position.pieces(attacker, PieceKind::Rook) | position.pieces(attacker, PieceKind::Queen);
    if rook_attacks(square, occupied) & straight_sliders != 0 {
        return true;
    }

    false
}

/// Is the given side's king currently attacked?
#[inline]
pub fn is_in_check(position: &Position, color: Color) -> bool {
    is_square_attacked(position, position.king_square(color), color.opposite())
}

/// All pieces of both colors attacking `square` under the current
/// occupancy.
pub fn attacks_to(position: &Position, square: Square) -> Bitboard {
    let occupied = position.occupied();
    let mut attackers = 0u64;

    attackers |=
        pawn_attacks(Color::White, square) & position.pieces(Color::Black, PieceKind::Pawn);
    attackers |=
        pawn_attacks(Color::Black, square) & position.pieces(Color::White, PieceKind::Pawn);

    attackers |= knight_attacks(square) & position.kind_bb(PieceKind::Knight);
    attackers |= king_attacks(square) & position.kind_bb(PieceKind::King);

    let diagonal_sliders = position.kind_bb(PieceKind::Bishop) | position.kind_bb(PieceKind::Queen);
    attackers |= bishop_attacks(square, occupied) & diagonal_sliders;

    let straight_sliders = position.kind_bb(PieceKind::Rook) | position.kind_bb(PieceKind::Queen);
    attackers |= rook_attacks(square, occupied) & straight_sliders;

    attackers
}

/// Rook-style attacks from `square` that pass through the first layer of
/// `blockers`.
pub fn xray_rook_attacks(square: Square, blockers: Bitboard, occupied: Bitboard) -> Bitboard {
    let attacks = rook_attacks(square, occupied);
    let first_layer = blockers & attacks;
    attacks ^ rook_attacks(square, occupied ^ first_layer)
}

/// Bishop-style attacks from `square` that pass through the first layer of
/// `blockers`.
pub fn xray_bishop_attacks(square: Square, blockers: Bitboard, occupied: Bitboard) -> Bitboard {
    let attacks = bishop_attacks(square, occupied);
    let first_layer = blockers & attacks;
    attacks ^ bishop_attacks(square, occupied ^ first_layer)
}

/// Pieces of `color` pinned to their own king by an enemy slider: the
/// single piece standing between the king and an x-raying rook, bishop, or
/// queen.
pub fn pinned_pieces(position: &Position, color: Color) -> Bitboard {
    let mut pinned = 0u64;
    let king_square = position.king_square(color);
    let own = position.color_bb(color);
    let occupied = position.occupied();
    let them = color.opposite();

    let straight_pinners =
        position.pieces(them, PieceKind::Rook) | position.pieces(them, PieceKind::Queen);
    let mut pinners = xray_rook_attacks(king_square, own, occupied) & straight_pinners;
    while pinners != 0 {
        let pinner_square = pinners.trailing_zeros() as Square;
        pinners &= pinners - 1;
        let blockers = between(king_square, pinner_square) & own;
        if blockers.count_ones() == 1 {
            pinned |= blockers;
        }
    }

    let diagonal_pinners =
        position.pieces(them, PieceKind::Bishop) | position.pieces(them, PieceKind::Queen);
    let mut pinners = xray_bishop_attacks(king_square, own, occupied) & diagonal_pinners;
    while pinners != 0 {
        let pinner_square = pinners.trailing_zeros() as Square;
        pinners &= pinners - 1;
        let blockers = between(king_square, pinner_square) & own;
        if blockers.count_ones() == 1 {
            pinned |= blockers;
        }
    }

    pinned
}

/// Is the piece on `square` pinned to its own king?
#[inline]
pub fn is_pinned(position: &Position, square: Square, color: Color) -> bool {
    pinned_pieces(position, color) & square_bb(square) != 0
}
