//! Long-algebraic move text: from-square, to-square, and a trailing
//! promotion letter when applicable. The null move renders as `0000`.

use crate::board::moves::{
    make_castling, make_en_passant, make_move, make_promotion, move_from, move_kind, move_to,
    promotion_kind, Move, MoveKind, NULL_MOVE,
};
use crate::board::position::Position;
use crate::board::types::{file_of, PieceKind};
use crate::errors::EngineError;
use crate::util::algebraic::{algebraic_to_square, square_to_algebraic};

pub fn move_to_text(mv: Move) -> String {
    if mv == NULL_MOVE {
        return "0000".to_owned();
    }

    let mut out = square_to_algebraic(move_from(mv));
    out.push_str(&square_to_algebraic(move_to(mv)));

    if move_kind(mv) == MoveKind::Promotion {
        out.push(match promotion_kind(mv) {
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            _ => 'q',
        });
    }

    out
}

/// Parse long-algebraic move text against a position. The position is
/// needed to classify the move kind (castling, en passant, promotion); the
/// caller is still responsible for validating the result against the legal
/// move list.
pub fn parse_move_text(text: &str, position: &Position) -> Result<Move, EngineError> {
    if text.len() != 4 && text.len() != 5 {
        return Err(EngineError::InvalidMoveText(text.to_owned()));
    }

    let from = algebraic_to_square(&text[0..2])?;
    let to = algebraic_to_square(&text[2..4])?;

    let piece = position
        .piece_at(from)
        .ok_or_else(|| EngineError::InvalidMoveText(format!("no piece on {}", &text[0..2])))?;
    if piece.color != position.side_to_move() {
        return Err(EngineError::InvalidMoveText(format!(
            "{} does not hold a side-to-move piece",
            &text[0..2]
        )));
    }

    if text.len() == 5 {
        let promote_to = match text.as_bytes()[4] {
            b'n' => PieceKind::Knight,
            b'b' => PieceKind::Bishop,
            b'r' => PieceKind::Rook,
            b'q' => PieceKind::Queen,
            other => {
                return Err(EngineError::InvalidMoveText(format!(
                    "bad promotion letter '{}'",
                    other as char
                )))
            }
        };
        return Ok(make_promotion(from, to, promote_to));
    }

    if piece.kind == PieceKind::King && from.abs_diff(to) == 2 {
        return Ok(make_castling(from, to));
    }

    if piece.kind == PieceKind::Pawn
        && position.en_passant_square() == Some(to)
        && file_of(from) != file_of(to)
        && position.piece_at(to).is_none()
    {
        return Ok(make_en_passant(from, to));
    }

    Ok(make_move(from, to))
}
