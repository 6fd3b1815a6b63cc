//! The coordinator: opening book, then tablebases, then full search.
//!
//! Owns the transposition table, the evaluator, and the loaded external
//! resources. A new game clears the search state but keeps the book and
//! tablebases loaded.

use crate::board::moves::Move;
use crate::board::position::Position;
use crate::book::OpeningBook;
use crate::engine::time_management::{resolve_movetime, TimeStrategy};
use crate::movegen::generator::generate_legal;
use crate::search::evaluation::TaperedScorer;
use crate::search::iterative_deepening::{find_best_move, SearchConfig};
use crate::search::transposition_table::TranspositionTable;
use crate::tablebase::{can_probe, TablebaseProbe, Wdl};
use crate::util::move_text::move_to_text;

const DEFAULT_DEPTH: u8 = 6;
const DEFAULT_HASH_MB: usize = 64;

/// Raw `go` parameters as the UCI layer parsed them.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub movestogo: Option<u16>,
}

#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub best_move: Option<Move>,
    pub info_lines: Vec<String>,
}

pub struct Coordinator {
    tt: TranspositionTable,
    scorer: TaperedScorer,
    book: Option<OpeningBook>,
    tablebase: Option<Box<dyn TablebaseProbe>>,
    default_depth: u8,
    own_book: bool,
    time_strategy: TimeStrategy,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            tt: TranspositionTable::new_with_mb(DEFAULT_HASH_MB),
            scorer: TaperedScorer,
            book: None,
            tablebase: None,
            default_depth: DEFAULT_DEPTH,
            own_book: true,
            time_strategy: TimeStrategy::Adaptive,
        }
    }

    pub fn with_book(mut self, book: OpeningBook) -> Self {
        self.book = Some(book);
        self
    }

    pub fn set_tablebase(&mut self, tablebase: Box<dyn TablebaseProbe>) {
        self.tablebase = Some(tablebase);
    }

    /// Reset per-game search state. Loaded books and tablebases survive a
    /// new game.
    pub fn new_game(&mut self) {
        self.tt.clear();
    }

    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), String> {
        if name.eq_ignore_ascii_case("Hash") {
            let mb = value
                .parse::<usize>()
                .map_err(|_| format!("bad Hash value: {value}"))?;
            self.tt = TranspositionTable::new_with_mb(mb.clamp(1, 4096));
            return Ok(());
        }
        if name.eq_ignore_ascii_case("OwnBook") {
            self.own_book = value.eq_ignore_ascii_case("true");
            return Ok(());
        }
        if name.eq_ignore_ascii_case("FixedDepth") {
            let depth = value
                .parse::<u8>()
                .map_err(|_| format!("bad FixedDepth value: {value}"))?;
            self.default_depth = if depth == 0 { DEFAULT_DEPTH } else { depth };
            return Ok(());
        }
        if name.eq_ignore_ascii_case("TimeStrategy") {
            self.time_strategy = match value.to_ascii_lowercase().as_str() {
                "adaptive" => TimeStrategy::Adaptive,
                "fraction20" => TimeStrategy::Fraction20,
                other => return Err(format!("unknown TimeStrategy: {other}")),
            };
            return Ok(());
        }

        // Unknown options are ignored for GUI compatibility.
        Ok(())
    }

    /// Pick a move: book first, tablebases second, search last.
    pub fn choose_move(&mut self, position: &Position, params: &GoParams) -> EngineOutput {
        let mut output = EngineOutput::default();
        let mut working = position.clone();

        let legal = generate_legal(&mut working);
        if legal.is_empty() {
            return output;
        }

        if self.own_book {
            if let Some(book) = &self.book {
                match book.probe(&working) {
                    Some(mv) if legal.contains(&mv) => {
                        output
                            .info_lines
                            .push(format!("info string book move {}", move_to_text(mv)));
                        output.best_move = Some(mv);
                        return output;
                    }
                    Some(mv) => {
                        // A book entry that fails legal-move validation is
                        // dropped, never played.
                        output.info_lines.push(format!(
                            "info string book move {} rejected as illegal",
                            move_to_text(mv)
                        ));
                    }
                    None => {}
                }
            }
        }

        if let Some(tablebase) = &self.tablebase {
            if can_probe(&working, tablebase.max_pieces()) {
                if let Some(probe) = tablebase.probe_root(&working) {
                    if probe.wdl != Wdl::Unknown && legal.contains(&probe.best_move) {
                        output.info_lines.push(format!(
                            "info string tablebase hit: {:?} dtz {}",
                            probe.wdl, probe.dtz
                        ));
                        output.best_move = Some(probe.best_move);
                        return output;
                    }
                }
            }
        }

        let config = SearchConfig {
            max_depth: params.depth.unwrap_or(self.default_depth),
            movetime_ms: resolve_movetime(&working, params, self.time_strategy),
            max_nodes: None,
        };

        let result = find_best_move(&mut working, &self.scorer, &config, &mut self.tt);

        let pv_text: Vec<String> = result.pv.iter().map(|&mv| move_to_text(mv)).collect();
        output.info_lines.push(format!(
            "info depth {} score cp {} nodes {} nps {} pv {}",
            result.reached_depth,
            result.best_score,
            result.nodes,
            result.nps,
            pv_text.join(" ")
        ));
        output.best_move = result.best_move;
        output
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::moves::{make_move, NULL_MOVE};
    use crate::tablebase::{NullTablebase, RootProbe};

    struct FixedTablebase {
        response: RootProbe,
    }

    impl TablebaseProbe for FixedTablebase {
        fn max_pieces(&self) -> u32 {
            5
        }

        fn probe_wdl(&self, _position: &Position) -> Wdl {
            self.response.wdl
        }

        fn probe_root(&self, _position: &Position) -> Option<RootProbe> {
            Some(self.response)
        }
    }

    #[test]
    fn searches_when_no_book_is_loaded() {
        let mut coordinator = Coordinator::new();
        let position = Position::new();
        let output = coordinator.choose_move(&position, &GoParams::default());
        assert!(output.best_move.is_some());
        assert!(output
            .info_lines
            .iter()
            .any(|line| line.starts_with("info depth")));
    }

    #[test]
    fn book_moves_short_circuit_the_search() {
        let mut coordinator = Coordinator::new().with_book(OpeningBook::load_default());
        let position = Position::new();
        let output = coordinator.choose_move(&position, &GoParams::default());
        assert!(output.best_move.is_some());
        assert!(output
            .info_lines
            .iter()
            .any(|line| line.contains("book move")));
    }

    #[test]
    fn disabling_own_book_skips_the_book() {
        let mut coordinator = Coordinator::new().with_book(OpeningBook::load_default());
        coordinator
            .set_option("OwnBook", "false")
            .expect("option should be accepted");
        let position = Position::new();
        let output = coordinator.choose_move(
            &position,
            &GoParams {
                depth: Some(2),
                ..GoParams::default()
            },
        );
        assert!(output
            .info_lines
            .iter()
            .all(|line| !line.contains("book move")));
    }

    #[test]
    fn a_valid_tablebase_move_is_used_verbatim() {
        let position =
            Position::from_fen("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1").expect("FEN should parse");
        let mv = make_move(12, 20); // e2e3, legal here

        let mut coordinator = Coordinator::new();
        coordinator.set_tablebase(Box::new(FixedTablebase {
            response: RootProbe {
                best_move: mv,
                wdl: Wdl::Win,
                dtz: 12,
            },
        }));

        let output = coordinator.choose_move(&position, &GoParams::default());
        assert_eq!(output.best_move, Some(mv));
        assert!(output
            .info_lines
            .iter()
            .any(|line| line.contains("tablebase hit")));
    }

    #[test]
    fn an_illegal_tablebase_move_falls_through_to_search() {
        let position =
            Position::from_fen("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1").expect("FEN should parse");

        let mut coordinator = Coordinator::new();
        coordinator.set_tablebase(Box::new(FixedTablebase {
            response: RootProbe {
                best_move: NULL_MOVE,
                wdl: Wdl::Win,
                dtz: 0,
            },
        }));

        let output = coordinator.choose_move(
            &position,
            &GoParams {
                depth: Some(3),
                ..GoParams::default()
            },
        );
        let best = output.best_move.expect("search should still find a move");
        assert_ne!(best, NULL_MOVE);
    }

    #[test]
    fn null_tablebase_is_transparent() {
        let position =
            Position::from_fen("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1").expect("FEN should parse");
        let mut coordinator = Coordinator::new();
        coordinator.set_tablebase(Box::new(NullTablebase));
        let output = coordinator.choose_move(
            &position,
            &GoParams {
                depth: Some(3),
                ..GoParams::default()
            },
        );
        assert!(output.best_move.is_some());
    }

    #[test]
    fn new_game_preserves_the_loaded_book() {
        let mut coordinator = Coordinator::new().with_book(OpeningBook::load_default());
        coordinator.new_game();
        let position = Position::new();
        let output = coordinator.choose_move(&position, &GoParams::default());
        assert!(output
            .info_lines
            .iter()
            .any(|line| line.contains("book move")));
    }

    #[test]
    fn mated_positions_yield_no_move() {
        let mut coordinator = Coordinator::new();
        let position = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .expect("FEN should parse");
        let output = coordinator.choose_move(&position, &GoParams::default());
        assert!(output.best_move.is_none());
    }
}
