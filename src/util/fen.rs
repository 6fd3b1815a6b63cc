//! FEN parsing and serialization.
//!
//! Six whitespace-separated fields: piece placement, side to move,
//! castling rights, en-passant target, halfmove clock, fullmove number.
//! Parsing rejects malformed input without touching any engine state, and
//! every accepted position serializes back to a canonical FEN.

use crate::board::position::Position;
use crate::board::types::{
    make_square, Color, Piece, PieceKind, Square, CASTLE_BLACK_KINGSIDE, CASTLE_BLACK_QUEENSIDE,
    CASTLE_WHITE_KINGSIDE, CASTLE_WHITE_QUEENSIDE,
};
use crate::board::zobrist;
use crate::errors::EngineError;
use crate::util::algebraic::{algebraic_to_square, square_to_algebraic};

pub fn parse_fen(fen: &str) -> Result<Position, EngineError> {
    let mut fields = fen.split_whitespace();

    let board_field = next_field(&mut fields, "piece placement")?;
    let side_field = next_field(&mut fields, "side to move")?;
    let castling_field = next_field(&mut fields, "castling rights")?;
    let en_passant_field = next_field(&mut fields, "en-passant square")?;
    let halfmove_field = next_field(&mut fields, "halfmove clock")?;
    let fullmove_field = next_field(&mut fields, "fullmove number")?;

    if fields.next().is_some() {
        return Err(EngineError::InvalidFen("trailing fields".to_owned()));
    }

    let mut position = Position::empty();

    parse_board(board_field, &mut position)?;

    position.side_to_move = match side_field {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(EngineError::InvalidFen(format!(
                "bad side-to-move field: {other}"
            )))
        }
    };

    position.castling_rights = parse_castling(castling_field)?;
    position.en_passant_square = parse_en_passant(en_passant_field)?;

    position.halfmove_clock = halfmove_field
        .parse::<u16>()
        .map_err(|_| EngineError::InvalidFen(format!("bad halfmove clock: {halfmove_field}")))?;
    position.fullmove_number = fullmove_field
        .parse::<u16>()
        .map_err(|_| EngineError::InvalidFen(format!("bad fullmove number: {fullmove_field}")))?;

    for color in [Color::White, Color::Black] {
        if position.pieces(color, PieceKind::King).count_ones() != 1 {
            return Err(EngineError::InvalidFen(
                "each side needs exactly one king".to_owned(),
            ));
        }
    }

    position.zobrist_key = zobrist::compute_key(&position);

    Ok(position)
}

fn next_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    name: &str,
) -> Result<&'a str, EngineError> {
    fields
        .next()
        .ok_or_else(|| EngineError::InvalidFen(format!("missing {name} field")))
}

fn parse_board(board_field: &str, position: &mut Position) -> Result<(), EngineError> {
    let ranks: Vec<&str> = board_field.split('/').collect();
    if ranks.len() != 8 {
        return Err(EngineError::InvalidFen(
            "piece placement must contain 8 ranks".to_owned(),
        ));
    }

    for (fen_rank, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank as u8;
        let mut file = 0u8;

        for ch in rank_text.chars() {
            if let Some(skip) = ch.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(EngineError::InvalidFen(format!(
                        "bad empty-square run '{ch}'"
                    )));
                }
                file += skip as u8;
                continue;
            }

            if file >= 8 {
                return Err(EngineError::InvalidFen(format!(
                    "rank {} overflows 8 files",
                    rank + 1
                )));
            }

            let piece = piece_from_char(ch)
                .ok_or_else(|| EngineError::InvalidFen(format!("bad piece character '{ch}'")))?;
            position.put_piece(piece, make_square(file, rank));
            file += 1;
        }

        if file != 8 {
            return Err(EngineError::InvalidFen(format!(
                "rank {} does not sum to 8 files",
                rank + 1
            )));
        }
    }

    Ok(())
}

fn parse_castling(castling_field: &str) -> Result<u8, EngineError> {
    if castling_field == "-" {
        return Ok(0);
    }

    let mut rights = 0u8;
    for ch in castling_field.chars() {
        rights |= match ch {
            'K' => CASTLE_WHITE_KINGSIDE,
            'Q' => CASTLE_WHITE_QUEENSIDE,
            'k' => CASTLE_BLACK_KINGSIDE,
            'q' => CASTLE_BLACK_QUEENSIDE,
            other => {
                return Err(EngineError::InvalidFen(format!(
                    "bad castling character '{other}'"
                )))
            }
        };
    }

    Ok(rights)
}

fn parse_en_passant(en_passant_field: &str) -> Result<Option<Square>, EngineError> {
    if en_passant_field == "-" {
        return Ok(None);
    }

    let square = algebraic_to_square(en_passant_field)
        .map_err(|_| EngineError::InvalidFen(format!("bad en-passant field: {en_passant_field}")))?;
    Ok(Some(square))
}

fn piece_from_char(ch: char) -> Option<Piece> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };

    let kind = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some(Piece::new(color, kind))
}

pub fn generate_fen(position: &Position) -> String {
    let mut out = String::new();

    for rank in (0..8u8).rev() {
        let mut empty_run = 0u8;

        for file in 0..8u8 {
            match position.piece_at(make_square(file, rank)) {
                Some(piece) => {
                    if empty_run > 0 {
                        out.push(char::from(b'0' + empty_run));
                        empty_run = 0;
                    }
                    out.push(piece_to_char(piece));
                }
                None => empty_run += 1,
            }
        }

        if empty_run > 0 {
            out.push(char::from(b'0' + empty_run));
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(match position.side_to_move() {
        Color::White => 'w',
        Color::Black => 'b',
    });

    out.push(' ');
    let rights = position.castling_rights();
    if rights == 0 {
        out.push('-');
    } else {
        if rights & CASTLE_WHITE_KINGSIDE != 0 {
            out.push('K');
        }
        if rights & CASTLE_WHITE_QUEENSIDE != 0 {
            out.push('Q');
        }
        if rights & CASTLE_BLACK_KINGSIDE != 0 {
            out.push('k');
        }
        if rights & CASTLE_BLACK_QUEENSIDE != 0 {
            out.push('q');
        }
    }

    out.push(' ');
    match position.en_passant_square() {
        Some(square) => out.push_str(&square_to_algebraic(square)),
        None => out.push('-'),
    }

    out.push_str(&format!(
        " {} {}",
        position.halfmove_clock(),
        position.fullmove_number()
    ));

    out
}

fn piece_to_char(piece: Piece) -> char {
    let base = match piece.kind {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };
    match piece.color {
        Color::White => base.to_ascii_uppercase(),
        Color::Black => base,
    }
}
