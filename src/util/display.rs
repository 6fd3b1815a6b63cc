//! ASCII rendering of a position for debugging and logs.

use crate::board::position::Position;
use crate::board::types::{make_square, Color, PieceKind};

/// Render the board from White's perspective, rank 8 on top, with the FEN
/// appended on the final line.
pub fn render_position(position: &Position) -> String {
    let mut out = String::new();

    for rank in (0..8u8).rev() {
        out.push(char::from(b'1' + rank));
        out.push(' ');
        for file in 0..8u8 {
            match position.piece_at(make_square(file, rank)) {
                Some(piece) => {
                    let base = match piece.kind {
                        PieceKind::Pawn => 'p',
                        PieceKind::Knight => 'n',
                        PieceKind::Bishop => 'b',
                        PieceKind::Rook => 'r',
                        PieceKind::Queen => 'q',
                        PieceKind::King => 'k',
                    };
                    out.push(match piece.color {
                        Color::White => base.to_ascii_uppercase(),
                        Color::Black => base,
                    });
                }
                None => out.push('.'),
            }
            out.push(' ');
        }
        out.push('\n');
    }

    out.push_str("  a b c d e f g h\n");
    out.push_str(&format!("FEN: {}", position.to_fen()));
    out
}
