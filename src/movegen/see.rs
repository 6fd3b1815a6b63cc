//! Static exchange evaluation.
//!
//! Simulates the full capture sequence on the destination square without
//! mutating the position: build the gain list forward, pruning when the
//! side to move can already refuse profitably, then fold it back with a
//! minimax over the list.

use crate::attacks::magic::{bishop_attacks, rook_attacks};
use crate::board::moves::{move_from, move_kind, move_to, Move, MoveKind};
use crate::board::position::Position;
use crate::board::types::{square_bb, Piece, PieceKind};
use crate::movegen::checks::attacks_to;

/// Exchange values indexed by `PieceKind::index()`.
pub const SEE_PIECE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20_000];

#[inline]
pub fn see_value(kind: PieceKind) -> i32 {
    SEE_PIECE_VALUES[kind.index()]
}

/// Estimated material delta of playing the capture `mv`, in centipawns.
/// Non-captures score zero.
pub fn see(position: &Position, mv: Move) -> i32 {
    let from = move_from(mv);
    let to = move_to(mv);

    let Some(attacker) = position.piece_at(from) else {
        return 0;
    };

    let captured = if move_kind(mv) == MoveKind::EnPassant {
        Some(Piece::new(attacker.color.opposite(), PieceKind::Pawn))
    } else {
        position.piece_at(to)
    };
    let Some(captured) = captured else {
        return 0;
    };

    let mut gain = [0i32; 32];
    let mut depth = 0usize;

    // Pieces whose removal can uncover a new slider attack on `to`.
    let may_xray = position.kind_bb(PieceKind::Pawn)
        | position.kind_bb(PieceKind::Bishop)
        | position.kind_bb(PieceKind::Rook)
        | position.kind_bb(PieceKind::Queen);

    let mut from_set = square_bb(from);
    let mut occupied = position.occupied();
    let mut attackers = attacks_to(position, to) & occupied;

    let mut side = attacker.color;
    let mut attacker_kind = attacker.kind;

    gain[0] = see_value(captured.kind);

    loop {
        depth += 1;
        gain[depth] = see_value(attacker_kind) - gain[depth - 1];

        // Both continuing and stopping lose for the side to move.
        if (-gain[depth - 1]).max(gain[depth]) < 0 {
            break;
        }

        attackers ^= from_set;
        occupied ^= from_set;

        if from_set & may_xray != 0 {
            let diagonal_sliders = position.kind_bb(PieceKind::Bishop)
                | position.kind_bb(PieceKind::Queen);
            attackers |= bishop_attacks(to, occupied) & diagonal_sliders & occupied;

            let straight_sliders =
                position.kind_bb(PieceKind::Rook) | position.kind_bb(PieceKind::Queen);
            attackers |= rook_attacks(to, occupied) & straight_sliders & occupied;
        }

        side = side.opposite();
        attackers &= occupied;

        // Least valuable attacker for the new side to move.
        from_set = 0;
        for kind in PieceKind::ALL {
            let candidates = attackers & position.pieces(side, kind);
            if candidates != 0 {
                attacker_kind = kind;
                from_set = candidates & candidates.wrapping_neg();
                break;
            }
        }

        if from_set == 0 {
            break;
        }
    }

    for d in (1..depth).rev() {
        gain[d - 1] = -(-gain[d - 1]).max(gain[d]);
    }

    gain[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::moves::{make_en_passant, make_move};
    use crate::board::position::Position;
    use crate::util::move_text::parse_move_text;

    fn see_of(fen: &str, move_text: &str) -> i32 {
        let position = Position::from_fen(fen).expect("FEN should parse");
        let mv = parse_move_text(move_text, &position).expect("move text should parse");
        see(&position, mv)
    }

    #[test]
    fn undefended_pawn_wins_a_pawn() {
        assert_eq!(see_of("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5"), 100);
    }

    #[test]
    fn defended_pawn_traded_by_pawn_is_even() {
        // exd5 is met by cxd5: 100 - 100.
        assert_eq!(
            see_of("4k3/8/2p5/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5"),
            0
        );
    }

    #[test]
    fn rook_grabbing_a_defended_pawn_loses_the_exchange() {
        // Rxd5 is met by cxd5: 100 - 500.
        assert_eq!(
            see_of("4k3/8/2p5/3p4/8/8/3R4/4K3 w - - 0 1", "d2d5"),
            -400
        );
    }

    #[test]
    fn xray_backup_does_not_rescue_a_losing_rook_grab() {
        // Doubled rooks against a pawn-defended pawn: the refusal prune
        // stops the sequence once both continuing and stopping lose, so
        // the score stays firmly negative.
        let value = see_of("4k3/8/2p5/3p4/8/8/3R4/3RK3 w - - 0 1", "d2d5");
        assert_eq!(value, -400);
    }

    #[test]
    fn queen_must_not_grab_a_defended_pawn() {
        assert_eq!(
            see_of("4k3/8/2p5/3p4/8/8/3Q4/4K3 w - - 0 1", "d2d5"),
            -800
        );
    }

    #[test]
    fn non_capture_scores_zero() {
        let position = Position::new();
        assert_eq!(see(&position, make_move(12, 28)), 0);
    }

    #[test]
    fn en_passant_counts_the_bypassed_pawn_as_the_victim() {
        // exf6 en passant wins the f5 pawn but f6 is defended twice, so
        // the exchange is dead even.
        let position =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .expect("FEN should parse");
        let mv = make_en_passant(36, 45);
        assert_eq!(see(&position, mv), 0);

        // With the defenders gone the full pawn value shows up.
        let undefended =
            Position::from_fen("rnbqkb2/ppp4r/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQq f6 0 3")
                .expect("FEN should parse");
        assert_eq!(see(&undefended, mv), 100);
    }

    #[test]
    fn exchange_sequence_matches_a_hand_minimax() {
        // White: Nc3, pawn e4. Black: pawn d5, Nf6. After exd5 Nxd5 Nxd5
        // the sequence is P(100) - guarded: exd5 (+100), Nxd5 (-100+? )
        // Hand minimax: exd5 wins a pawn, black recaptures with the
        // knight, white recaptures with the knight: +100 -100 +320 folded
        // = +100.
        assert_eq!(
            see_of("4k3/8/5n2/3p4/4P3/2N5/8/4K3 w - - 0 1", "e4d5"),
            100
        );
    }
}
