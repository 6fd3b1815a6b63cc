//! Pseudo-legal and fully legal move enumeration.
//!
//! Pseudo-legal generation walks the piece bitboards and emits encoded
//! moves; legality is settled by making each candidate, testing the own
//! king for attack, and unmaking. Castling is generated with its emptiness
//! and king-path attack conditions checked up front.

use crate::attacks::magic::{bishop_attacks, queen_attacks, rook_attacks};
use crate::attacks::tables::{king_attacks, knight_attacks, pawn_attacks};
use crate::board::moves::{
    make_castling, make_en_passant, make_move, make_promotion, move_kind, move_to, Move, MoveKind,
};
use crate::board::position::Position;
use crate::board::types::{
    rank_of, square_bb, Bitboard, Color, PieceKind, Square, CASTLE_BLACK_KINGSIDE,
    CASTLE_BLACK_QUEENSIDE, CASTLE_WHITE_KINGSIDE, CASTLE_WHITE_QUEENSIDE,
};
use crate::movegen::checks::{is_in_check, is_square_attacked};

/// Generate every pseudo-legal move for the side to move.
pub fn generate_pseudo_legal(position: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    let us = position.side_to_move();

    let mut pawns = position.pieces(us, PieceKind::Pawn);
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;
        generate_pawn_moves(position, us, from, &mut moves);
    }

    generate_piece_moves(position, us, PieceKind::Knight, &mut moves);
    generate_piece_moves(position, us, PieceKind::Bishop, &mut moves);
    generate_piece_moves(position, us, PieceKind::Rook, &mut moves);
    generate_piece_moves(position, us, PieceKind::Queen, &mut moves);
    generate_piece_moves(position, us, PieceKind::King, &mut moves);

    generate_castling(position, us, &mut moves);

    moves
}

fn generate_pawn_moves(position: &Position, us: Color, from: Square, moves: &mut Vec<Move>) {
    let (up, promotion_rank, start_rank): (i8, u8, u8) = match us {
        Color::White => (8, 6, 1),
        Color::Black => (-8, 1, 6),
    };
    let them = us.opposite();
    let occupied = position.occupied();

    let single_to = (from as i8 + up) as Square;
    if occupied & square_bb(single_to) == 0 {
        if rank_of(from) == promotion_rank {
            push_promotions(from, single_to, moves);
        } else {
            moves.push(make_move(from, single_to));

            if rank_of(from) == start_rank {
                let double_to = (from as i8 + 2 * up) as Square;
                if occupied & square_bb(double_to) == 0 {
                    moves.push(make_move(from, double_to));
                }
            }
        }
    }

    let attacks = pawn_attacks(us, from);
    let mut captures = attacks & position.color_bb(them);
    while captures != 0 {
        let to = captures.trailing_zeros() as Square;
        captures &= captures - 1;
        if rank_of(from) == promotion_rank {
            push_promotions(from, to, moves);
        } else {
            moves.push(make_move(from, to));
        }
    }

    if let Some(ep_square) = position.en_passant_square() {
        if attacks & square_bb(ep_square) != 0 {
            moves.push(make_en_passant(from, ep_square));
        }
    }
}

fn push_promotions(from: Square, to: Square, moves: &mut Vec<Move>) {
    moves.push(make_promotion(from, to, PieceKind::Queen));
    moves.push(make_promotion(from, to, PieceKind::Rook));
    moves.push(make_promotion(from, to, PieceKind::Bishop));
    moves.push(make_promotion(from, to, PieceKind::Knight));
}

fn generate_piece_moves(position: &Position, us: Color, kind: PieceKind, moves: &mut Vec<Move>) {
    let targets = !position.color_bb(us);
    let occupied = position.occupied();

    let mut pieces = position.pieces(us, kind);
    while pieces != 0 {
        let from = pieces.trailing_zeros() as Square;
        pieces &= pieces - 1;

        let attacks = match kind {
            PieceKind::Knight => knight_attacks(from),
            PieceKind::Bishop => bishop_attacks(from, occupied),
            PieceKind::Rook => rook_attacks(from, occupied),
            PieceKind::Queen => queen_attacks(from, occupied),
            PieceKind::King => king_attacks(from),
            PieceKind::Pawn => unreachable!("pawns use generate_pawn_moves"),
        };

        let mut destinations = attacks & targets;
        while destinations != 0 {
            let to = destinations.trailing_zeros() as Square;
            destinations &= destinations - 1;
            moves.push(make_move(from, to));
        }
    }
}

fn generate_castling(position: &Position, us: Color, moves: &mut Vec<Move>) {
    if is_in_check(position, us) {
        return;
    }

    let occupied = position.occupied();
    let rights = position.castling_rights();
    let them = us.opposite();

    // (right, king from, king to, squares that must be empty, squares the
    // king crosses that must be safe)
    let lines: [(u8, Square, Square, Bitboard, [Square; 2]); 2] = match us {
        Color::White => [
            (
                CASTLE_WHITE_KINGSIDE,
                4,
                6,
                square_bb(5) | square_bb(6),
                [5, 6],
            ),
            (
                CASTLE_WHITE_QUEENSIDE,
                4,
                2,
                square_bb(1) | square_bb(2) | square_bb(3),
                [3, 2],
            ),
        ],
        Color::Black => [
            (
                CASTLE_BLACK_KINGSIDE,
                60,
                62,
                square_bb(61) | square_bb(62),
                [61, 62],
            ),
            (
                CASTLE_BLACK_QUEENSIDE,
                60,
                58,
                square_bb(57) | square_bb(58) | square_bb(59),
                [59, 58],
            ),
        ],
    };

    for (right, from, to, must_be_empty, crossed) in lines {
        if rights & right == 0 || occupied & must_be_empty != 0 {
            continue;
        }
        if crossed
            .iter()
            .any(|&sq| is_square_attacked(position, sq, them))
        {
            continue;
        }
        moves.push(make_castling(from, to));
    }
}

/// A pseudo-legal move is legal when the mover's king is safe afterwards.
pub fn is_legal(position: &mut Position, mv: Move) -> bool {
    let us = position.side_to_move();
    position.make_move(mv);
    let legal = !is_in_check(position, us);
    position.unmake_move();
    legal
}

/// Generate all fully legal moves for the side to move.
pub fn generate_legal(position: &mut Position) -> Vec<Move> {
    let pseudo = generate_pseudo_legal(position);
    let mut legal = Vec::with_capacity(pseudo.len());

    for mv in pseudo {
        if is_legal(position, mv) {
            legal.push(mv);
        }
    }

    legal
}

/// Generate legal captures only (including en passant), for quiescence.
pub fn generate_captures(position: &mut Position) -> Vec<Move> {
    let pseudo = generate_pseudo_legal(position);
    let mut captures = Vec::new();

    for mv in pseudo {
        let is_capture = position.piece_at(move_to(mv)).is_some()
            || move_kind(mv) == MoveKind::EnPassant;
        if is_capture && is_legal(position, mv) {
            captures.push(mv);
        }
    }

    captures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::moves::move_from;
    use crate::util::move_text::move_to_text;

    #[test]
    fn starting_position_has_twenty_moves() {
        let mut position = Position::new();
        assert_eq!(generate_legal(&mut position).len(), 20);
    }

    #[test]
    fn kiwipete_has_fortyeight_moves() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .expect("FEN should parse");
        assert_eq!(generate_legal(&mut position).len(), 48);
    }

    #[test]
    fn promotions_expand_to_four_moves() {
        let mut position =
            Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let promotions: Vec<Move> = generate_legal(&mut position)
            .into_iter()
            .filter(|&mv| move_kind(mv) == MoveKind::Promotion)
            .collect();
        assert_eq!(promotions.len(), 4);
    }

    #[test]
    fn castling_is_rejected_through_an_attacked_crossing_square() {
        // Black rook on f8 covers f1, so white may not castle kingside but
        // may castle queenside.
        let mut position = Position::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1")
            .expect("FEN should parse");
        let moves = generate_legal(&mut position);
        let castles: Vec<String> = moves
            .iter()
            .filter(|&&mv| move_kind(mv) == MoveKind::Castling)
            .map(|&mv| move_to_text(mv))
            .collect();
        assert_eq!(castles, vec!["e1c1".to_owned()]);
    }

    #[test]
    fn castling_is_rejected_while_in_check() {
        let mut position = Position::from_fen("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1")
            .expect("FEN should parse");
        let moves = generate_legal(&mut position);
        assert!(moves
            .iter()
            .all(|&mv| move_kind(mv) != MoveKind::Castling));
    }

    #[test]
    fn pinned_piece_may_not_expose_the_king() {
        // The e4 knight is pinned by the e8 rook; none of its moves are
        // legal.
        let mut position =
            Position::from_fen("4r1k1/8/8/8/4N3/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let moves = generate_legal(&mut position);
        assert!(moves.iter().all(|&mv| move_from(mv) != 28));
    }

    #[test]
    fn capture_generation_matches_the_legal_capture_subset() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .expect("FEN should parse");

        let captures = generate_captures(&mut position);
        let legal = generate_legal(&mut position);
        let legal_captures: Vec<Move> = legal
            .into_iter()
            .filter(|&mv| {
                position.piece_at(move_to(mv)).is_some() || move_kind(mv) == MoveKind::EnPassant
            })
            .collect();

        assert_eq!(captures.len(), legal_captures.len());
        assert_eq!(captures.len(), 8);
    }

    #[test]
    fn en_passant_is_generated_when_available() {
        let mut position =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .expect("FEN should parse");
        let moves = generate_legal(&mut position);
        assert!(moves
            .iter()
            .any(|&mv| move_kind(mv) == MoveKind::EnPassant && move_to_text(mv) == "e5f6"));
    }
}
