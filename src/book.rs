//! Opening book keyed by position hash, importable from TSV opening
//! datasets.
//!
//! Each data row is a move sequence from the starting position (a `uci` or
//! `moves` column) with an optional weight. Every prefix of a sequence
//! contributes a weighted candidate move for the position it was reached
//! from. Probing picks among the strongest candidates with a weighted
//! random draw so the engine does not play one opening forever.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::Rng;

use crate::board::moves::Move;
use crate::board::position::Position;
use crate::errors::EngineError;
use crate::movegen::generator::generate_legal;
use crate::util::move_text::parse_move_text;

/// Fallback lines compiled into the binary, used when no book file is
/// found next to the engine.
const DEFAULT_BOOK_TSV: &str = "\
uci\tweight
e2e4 e7e5 g1f3 b8c6 f1b5\t40
e2e4 c7c5 g1f3 d7d6 d2d4\t35
d2d4 d7d5 c2c4 e7e6 b1c3\t30
d2d4 g8f6 c2c4 e7e6 g1f3\t25
e2e4 e7e6 d2d4 d7d5 b1c3\t20
e2e4 c7c6 d2d4 d7d5 b1c3\t18
c2c4 e7e5 b1c3 g8f6 g1f3\t15
g1f3 d7d5 g2g3 g8f6 f1g2\t12
";

/// Number of top-weighted candidates the probe chooses among.
const PROBE_VARIETY: usize = 3;

#[derive(Debug, Clone)]
pub struct BookMove {
    pub mv: Move,
    pub weight: u32,
}

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    by_key: HashMap<u64, Vec<BookMove>>,
}

impl OpeningBook {
    /// Load a book file when one is present, otherwise the embedded
    /// default lines.
    pub fn load_default() -> Self {
        for candidate in ["book/openings.tsv", "openings.tsv"] {
            if Path::new(candidate).exists() {
                if let Ok(book) = Self::from_tsv_path(candidate) {
                    return book;
                }
            }
        }

        Self::from_tsv_str(DEFAULT_BOOK_TSV).unwrap_or_default()
    }

    pub fn from_tsv_path(path: &str) -> Result<Self, EngineError> {
        let data = fs::read_to_string(path)
            .map_err(|err| EngineError::BookImport(format!("reading {path}: {err}")))?;
        Self::from_tsv_str(&data)
    }

    pub fn from_tsv_str(tsv: &str) -> Result<Self, EngineError> {
        let mut lines = tsv.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| EngineError::BookImport("empty TSV".to_owned()))?;

        let mut sequence_column = None;
        let mut weight_column = None;
        for (index, name) in header.split('\t').enumerate() {
            match name.trim().to_ascii_lowercase().as_str() {
                "uci" | "moves" => sequence_column = Some(index),
                "weight" | "count" | "plays" => weight_column = Some(index),
                _ => {}
            }
        }
        let sequence_column = sequence_column.ok_or_else(|| {
            EngineError::BookImport("TSV needs a 'uci' or 'moves' column".to_owned())
        })?;

        let mut weights: HashMap<u64, HashMap<Move, u32>> = HashMap::new();

        for line in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            let sequence = fields
                .get(sequence_column)
                .map(|field| field.trim())
                .filter(|field| !field.is_empty())
                .ok_or_else(|| {
                    EngineError::BookImport(format!("row without a move sequence: {line}"))
                })?;

            let row_weight = weight_column
                .and_then(|index| fields.get(index))
                .and_then(|field| field.trim().parse::<u32>().ok())
                .unwrap_or(1)
                .max(1);

            let mut position = Position::new();
            for token in sequence.split_whitespace() {
                let mv = parse_move_text(token, &position).map_err(|err| {
                    EngineError::BookImport(format!("move '{token}' in row '{line}': {err}"))
                })?;
                if !generate_legal(&mut position).contains(&mv) {
                    return Err(EngineError::BookImport(format!(
                        "illegal move '{token}' in row '{line}'"
                    )));
                }

                let entry = weights
                    .entry(position.zobrist_key())
                    .or_default()
                    .entry(mv)
                    .or_insert(0);
                *entry = entry.saturating_add(row_weight);

                position.make_move(mv);
            }
        }

        let mut by_key = HashMap::with_capacity(weights.len());
        for (key, move_weights) in weights {
            let mut candidates: Vec<BookMove> = move_weights
                .into_iter()
                .map(|(mv, weight)| BookMove { mv, weight })
                .collect();
            candidates.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.mv.cmp(&b.mv)));
            by_key.insert(key, candidates);
        }

        Ok(Self { by_key })
    }

    #[inline]
    pub fn positions(&self) -> usize {
        self.by_key.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Book move for the position, or `None` on a miss. The caller still
    /// validates the move against its own legal move list.
    pub fn probe(&self, position: &Position) -> Option<Move> {
        let candidates = self.by_key.get(&position.zobrist_key())?;
        if candidates.is_empty() {
            return None;
        }

        let pool = &candidates[..candidates.len().min(PROBE_VARIETY)];
        let total: u32 = pool.iter().map(|candidate| candidate.weight).sum();

        let mut draw = rand::thread_rng().gen_range(0..total.max(1));
        for candidate in pool {
            if draw < candidate.weight {
                return Some(candidate.mv);
            }
            draw -= candidate.weight;
        }

        pool.first().map(|candidate| candidate.mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::move_text::move_to_text;

    #[test]
    fn default_book_covers_the_starting_position() {
        let book = OpeningBook::load_default();
        assert!(!book.is_empty());

        let position = Position::new();
        let mv = book.probe(&position).expect("startpos should be in book");
        let text = move_to_text(mv);
        assert!(
            ["e2e4", "d2d4", "c2c4", "g1f3"].contains(&text.as_str()),
            "unexpected book move {text}"
        );
    }

    #[test]
    fn probed_moves_are_always_legal() {
        let book = OpeningBook::load_default();
        let mut position = Position::new();
        for _ in 0..6 {
            let Some(mv) = book.probe(&position) else {
                break;
            };
            assert!(generate_legal(&mut position).contains(&mv));
            position.make_move(mv);
        }
    }

    #[test]
    fn weights_accumulate_across_rows() {
        let tsv = "uci\tweight\ne2e4 e7e5\t10\ne2e4 c7c5\t5\n";
        let book = OpeningBook::from_tsv_str(tsv).expect("TSV should import");

        // e2e4 is in both rows, so the startpos entry carries both
        // weights and always wins the draw.
        let position = Position::new();
        let mv = book.probe(&position).expect("startpos should be in book");
        assert_eq!(move_to_text(mv), "e2e4");
    }

    #[test]
    fn off_book_positions_miss() {
        let book = OpeningBook::load_default();
        let position =
            Position::from_fen("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1").expect("FEN should parse");
        assert!(book.probe(&position).is_none());
    }

    #[test]
    fn bad_rows_are_rejected() {
        assert!(OpeningBook::from_tsv_str("").is_err());
        assert!(OpeningBook::from_tsv_str("san\ne4 e5\n").is_err());
        assert!(OpeningBook::from_tsv_str("uci\ne2e5\n").is_err());
        assert!(OpeningBook::from_tsv_str("uci\ne2e4 e2e4\n").is_err());
    }
}
