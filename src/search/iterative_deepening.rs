//! Iterative-deepening principal-variation search.
//!
//! The searcher owns the per-search heuristic state (killers, history,
//! countermoves, PV triangle) and borrows the shared transposition table.
//! Time is polled cooperatively every 1024 nodes; when the budget expires
//! mid-iteration the partial depth is discarded and the best move from the
//! last completed iteration stands.

use std::time::{Duration, Instant};

use crate::board::draw::is_draw;
use crate::board::moves::{move_from, move_kind, move_to, Move, MoveKind, NULL_MOVE};
use crate::board::position::Position;
use crate::board::types::{Color, PieceKind};
use crate::movegen::checks::is_in_check;
use crate::movegen::generator::generate_legal;
use crate::movegen::see::{see, see_value};
use crate::search::evaluation::BoardScorer;
use crate::search::transposition_table::{Bound, TranspositionTable, TtStats};

pub const MATE_SCORE: i32 = 10_000;
pub const MAX_PLY: usize = 64;

const TIME_CHECK_MASK: u64 = 0x3FF;
const ASPIRATION_WINDOW: i32 = 50;
const NULL_MOVE_REDUCTION: i8 = 3;
const DELTA_MARGIN: i32 = 900;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_depth: u8,
    pub movetime_ms: Option<u64>,
    pub max_nodes: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            movetime_ms: None,
            max_nodes: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub best_score: i32,
    pub reached_depth: u8,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub nps: u64,
    pub pv: Vec<Move>,
    pub tt_stats: TtStats,
}

/// Run an iterative-deepening search over `position`.
pub fn find_best_move<S: BoardScorer>(
    position: &mut Position,
    scorer: &S,
    config: &SearchConfig,
    tt: &mut TranspositionTable,
) -> SearchResult {
    let started_at = Instant::now();
    let deadline = config
        .movetime_ms
        .map(|ms| started_at + Duration::from_millis(ms.max(1)));

    tt.new_generation();

    let mut searcher = Searcher {
        scorer,
        tt,
        deadline,
        node_cap: config.max_nodes.filter(|cap| *cap > 0),
        nodes: 0,
        stopped: false,
        killers: [[NULL_MOVE; 2]; MAX_PLY],
        history: [[0; 64]; 64],
        countermoves: Box::new([[NULL_MOVE; 64]; 64]),
        pv_table: Box::new([[NULL_MOVE; MAX_PLY]; MAX_PLY]),
        pv_length: [0; MAX_PLY],
    };

    let mut result = SearchResult::default();
    let mut root_moves = generate_legal(position);

    if root_moves.is_empty() {
        result.best_score = if is_in_check(position, position.side_to_move()) {
            -MATE_SCORE
        } else {
            0
        };
        return result;
    }

    let mut best_move = root_moves[0];
    let mut best_score = -MATE_SCORE;
    let mut have_completed_iteration = false;

    for depth in 1..=config.max_depth {
        if searcher.out_of_budget() {
            break;
        }

        let use_aspiration = depth >= 5 && have_completed_iteration;
        let (mut alpha, beta) = if use_aspiration {
            (best_score - ASPIRATION_WINDOW, best_score + ASPIRATION_WINDOW)
        } else {
            (-MATE_SCORE, MATE_SCORE)
        };
        let window = (alpha, beta);

        searcher.order_moves(position, &mut root_moves, 0, Some(best_move), None);

        let mut iter_best_move = root_moves[0];
        let mut iter_best_score = -MATE_SCORE;
        let mut iter_pv = vec![root_moves[0]];

        for &mv in &root_moves {
            position.make_move(mv);
            let score = -searcher.negamax(position, depth as i8 - 1, -beta, -alpha, 1, Some(mv));
            position.unmake_move();

            if searcher.stopped {
                break;
            }

            if score > iter_best_score {
                iter_best_score = score;
                iter_best_move = mv;
                iter_pv = searcher.continuation_pv(mv);
            }
            alpha = alpha.max(score);
        }

        if searcher.stopped {
            // Partial iteration: discard and keep the previous best.
            break;
        }

        // Re-search the best move on an aspiration failure.
        if use_aspiration && (iter_best_score <= window.0 || iter_best_score >= window.1) {
            position.make_move(iter_best_move);
            let score = -searcher.negamax(
                position,
                depth as i8 - 1,
                -MATE_SCORE,
                MATE_SCORE,
                1,
                Some(iter_best_move),
            );
            position.unmake_move();
            if searcher.stopped {
                break;
            }
            iter_best_score = score;
            iter_pv = searcher.continuation_pv(iter_best_move);
        }

        best_move = iter_best_move;
        best_score = iter_best_score;
        have_completed_iteration = true;

        result.best_move = Some(best_move);
        result.best_score = best_score;
        result.reached_depth = depth;
        result.pv = iter_pv;
    }

    if result.best_move.is_none() {
        // The very first iteration hit the budget: fall back to the first
        // legal move rather than none at all.
        result.best_move = Some(best_move);
        result.best_score = best_score;
    }

    result.nodes = searcher.nodes;
    result.elapsed_ms = started_at.elapsed().as_millis() as u64;
    result.nps = if result.elapsed_ms == 0 {
        0
    } else {
        result.nodes.saturating_mul(1000) / result.elapsed_ms
    };
    result.tt_stats = searcher.tt.stats();

    result
}

struct Searcher<'a, S: BoardScorer> {
    scorer: &'a S,
    tt: &'a mut TranspositionTable,
    deadline: Option<Instant>,
    node_cap: Option<u64>,
    nodes: u64,
    stopped: bool,

    killers: [[Move; 2]; MAX_PLY],
    history: [[i32; 64]; 64],
    countermoves: Box<[[Move; 64]; 64]>,
    pv_table: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    pv_length: [usize; MAX_PLY],
}

impl<S: BoardScorer> Searcher<'_, S> {
    fn out_of_budget(&self) -> bool {
        if let Some(cap) = self.node_cap {
            if self.nodes >= cap {
                return true;
            }
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Count a node and poll the clock every 1024 nodes.
    #[inline]
    fn tick(&mut self) {
        self.nodes += 1;
        if self.nodes & TIME_CHECK_MASK == 0 && self.out_of_budget() {
            self.stopped = true;
        }
    }

    /// Root move plus the continuation the ply-1 row of the triangle holds
    /// for it. Only valid right after that root move was searched.
    fn continuation_pv(&self, root_move: Move) -> Vec<Move> {
        let mut pv = Vec::with_capacity(self.pv_length[1] + 1);
        pv.push(root_move);
        pv.extend_from_slice(&self.pv_table[1][..self.pv_length[1]]);
        pv
    }

    fn negamax(
        &mut self,
        position: &mut Position,
        depth: i8,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        prev_move: Option<Move>,
    ) -> i32 {
        self.tick();
        if self.stopped {
            return 0;
        }

        if ply >= MAX_PLY - 1 {
            return self.scorer.score(position);
        }
        self.pv_length[ply] = 0;

        if is_draw(position) {
            return 0;
        }

        let alpha_orig = alpha;
        let hash = position.zobrist_key();

        let mut tt_move = NULL_MOVE;
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.best_move;
            if entry.depth >= depth {
                let score = i32::from(entry.score);
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }
                if alpha >= beta {
                    return score;
                }
            }
        }

        if depth <= 0 {
            return self.quiescence(position, alpha, beta, 0, ply);
        }

        let us = position.side_to_move();
        let in_check = is_in_check(position, us);
        let is_pv = beta - alpha > 1;

        if self.null_move_allowed(position, depth, in_check, ply) {
            position.make_null_move();
            let null_depth = (depth - 1 - NULL_MOVE_REDUCTION).max(0);
            let score = -self.negamax(position, null_depth, -beta, -beta + 1, ply + 1, None);
            position.unmake_null_move();

            if self.stopped {
                return 0;
            }
            if score >= beta {
                return beta;
            }
        }

        let static_eval = if in_check { 0 } else { self.scorer.score(position) };

        // Reverse futility: the position is so far above beta that a
        // depth-scaled margin cannot bring it back.
        if depth <= 6 && !is_pv && !in_check && static_eval - 100 * i32::from(depth) >= beta {
            return static_eval;
        }

        // Razoring: hopelessly below alpha, verify with quiescence.
        if depth <= 3 && !is_pv && !in_check {
            let margin = 300 + 150 * i32::from(depth);
            if static_eval + margin < alpha {
                let score = self.quiescence(position, alpha, beta, 0, ply);
                if score < alpha {
                    return score;
                }
            }
        }

        let futility_prune =
            depth <= 3 && !in_check && static_eval + 100 + 200 * i32::from(depth) <= alpha;

        let mut moves = generate_legal(position);
        if moves.is_empty() {
            return if in_check { -MATE_SCORE + ply as i32 } else { 0 };
        }

        // Internal iterative deepening: a PV node without a hash move gets
        // a shallow search to seed one.
        if tt_move == NULL_MOVE && is_pv && depth >= 4 {
            self.negamax(position, depth - 2, alpha, beta, ply, prev_move);
            if self.stopped {
                return 0;
            }
            if let Some(entry) = self.tt.probe(hash) {
                if entry.best_move != NULL_MOVE && moves.contains(&entry.best_move) {
                    tt_move = entry.best_move;
                }
            }
        }

        let tt_move = if tt_move != NULL_MOVE {
            Some(tt_move)
        } else {
            None
        };
        self.order_moves(position, &mut moves, ply, tt_move, prev_move);

        let mut best_score = -MATE_SCORE;
        let mut best_move = moves[0];

        for (index, &mv) in moves.iter().enumerate() {
            let is_capture = position.piece_at(move_to(mv)).is_some()
                || move_kind(mv) == MoveKind::EnPassant;
            let is_promotion = move_kind(mv) == MoveKind::Promotion;
            let is_killer = self.is_killer(mv, ply);

            if futility_prune && index > 0 && !is_capture && !is_promotion {
                continue;
            }

            // Late-move pruning: quiet non-killers far down the list at
            // shallow depth are skipped outright.
            if depth <= 3
                && index >= 3 + (depth as usize) * (depth as usize)
                && !is_capture
                && !is_promotion
                && !is_killer
            {
                continue;
            }

            position.make_move(mv);

            let gives_check = is_in_check(position, position.side_to_move());
            let extension = i8::from(gives_check);
            let new_depth = depth - 1 + extension;

            let score = if index == 0 {
                -self.negamax(position, new_depth, -beta, -alpha, ply + 1, Some(mv))
            } else {
                let mut reduction = 0i8;
                if depth >= 3
                    && index >= 3
                    && !is_capture
                    && !gives_check
                    && !is_promotion
                    && !is_killer
                {
                    reduction = 1
                        + i8::from(depth >= 6)
                        + i8::from(index >= 6)
                        + i8::from(depth >= 8 && index >= 10);
                    reduction = reduction.min(new_depth.max(0));
                }

                let mut score = -self.negamax(
                    position,
                    new_depth - reduction,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    Some(mv),
                );

                if score > alpha && score < beta {
                    if reduction > 0 {
                        score = -self.negamax(
                            position,
                            new_depth,
                            -alpha - 1,
                            -alpha,
                            ply + 1,
                            Some(mv),
                        );
                    }
                    if score > alpha && score < beta {
                        score =
                            -self.negamax(position, new_depth, -beta, -alpha, ply + 1, Some(mv));
                    }
                }

                score
            };

            position.unmake_move();

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                self.update_pv(ply, mv);
            }

            alpha = alpha.max(score);
            if alpha >= beta {
                if !is_capture {
                    self.store_killer(mv, ply);
                    self.update_history(mv, depth);
                    if let Some(prev) = prev_move {
                        self.countermoves[move_from(prev) as usize][move_to(prev) as usize] = mv;
                    }
                }
                break;
            }
        }

        let bound = if best_score <= alpha_orig {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(hash, depth, best_score, best_move, bound);

        best_score
    }

    fn quiescence(
        &mut self,
        position: &mut Position,
        mut alpha: i32,
        beta: i32,
        qs_depth: usize,
        ply: usize,
    ) -> i32 {
        self.tick();
        if self.stopped {
            return 0;
        }
        if ply >= MAX_PLY - 1 {
            return self.scorer.score(position);
        }

        let in_check = is_in_check(position, position.side_to_move());
        let mut stand_pat = 0;

        if !in_check {
            stand_pat = self.scorer.score(position);
            if stand_pat >= beta {
                return beta;
            }
            // Delta pruning: even winning a queen cannot lift alpha.
            if stand_pat + DELTA_MARGIN < alpha {
                return alpha;
            }
            alpha = alpha.max(stand_pat);
        }

        let mut moves = if in_check {
            // Checks must be answered in full; stand-pat is not an option.
            let evasions = generate_legal(position);
            if evasions.is_empty() {
                return -MATE_SCORE + ply as i32;
            }
            evasions
        } else {
            let mut captures = crate::movegen::generator::generate_captures(position);
            if qs_depth == 0 {
                self.append_quiet_checks(position, &mut captures);
            }
            captures
        };

        self.order_moves(position, &mut moves, ply, None, None);

        for &mv in &moves {
            if !in_check {
                if see(position, mv) < 0 {
                    continue;
                }
                // Capture futility: the victim plus a margin still cannot
                // reach alpha.
                if let Some(captured) = position.piece_at(move_to(mv)) {
                    if stand_pat + see_value(captured.kind) + 200 < alpha {
                        continue;
                    }
                }
            }

            position.make_move(mv);
            let score = -self.quiescence(position, -beta, -alpha, qs_depth + 1, ply + 1);
            position.unmake_move();

            if self.stopped {
                return 0;
            }

            if score >= beta {
                return beta;
            }
            alpha = alpha.max(score);
        }

        alpha
    }

    /// Quiet moves that give check, added at the first quiescence ply to
    /// soften the horizon effect.
    fn append_quiet_checks(&mut self, position: &mut Position, moves: &mut Vec<Move>) {
        let all = generate_legal(position);
        for mv in all {
            let is_capture = position.piece_at(move_to(mv)).is_some()
                || move_kind(mv) == MoveKind::EnPassant;
            if is_capture {
                continue;
            }
            position.make_move(mv);
            let gives_check = is_in_check(position, position.side_to_move());
            position.unmake_move();
            if gives_check {
                moves.push(mv);
            }
        }
    }

    fn null_move_allowed(
        &self,
        position: &Position,
        depth: i8,
        in_check: bool,
        ply: usize,
    ) -> bool {
        if depth < 3 || in_check || ply == 0 {
            return false;
        }

        // Zugzwang guards: pawn endings and bare-minor endings pass.
        let us = position.side_to_move();
        let material = position.material_count(us);
        let non_pawn_pieces = (position.pieces(us, PieceKind::Knight)
            | position.pieces(us, PieceKind::Bishop)
            | position.pieces(us, PieceKind::Rook)
            | position.pieces(us, PieceKind::Queen))
        .count_ones();

        !(material <= 100 || non_pawn_pieces == 0 || (non_pawn_pieces == 1 && material < 500))
    }

    fn order_moves(
        &self,
        position: &Position,
        moves: &mut [Move],
        ply: usize,
        tt_move: Option<Move>,
        prev_move: Option<Move>,
    ) {
        moves.sort_by_key(|&mv| -self.move_order_score(position, mv, ply, tt_move, prev_move));
    }

    fn move_order_score(
        &self,
        position: &Position,
        mv: Move,
        ply: usize,
        tt_move: Option<Move>,
        prev_move: Option<Move>,
    ) -> i32 {
        if Some(mv) == tt_move {
            return 1_000_000;
        }

        let mut score = 0i32;
        let is_capture =
            position.piece_at(move_to(mv)).is_some() || move_kind(mv) == MoveKind::EnPassant;

        if is_capture {
            let exchange = see(position, mv);
            score += if exchange > 0 {
                20_000 + exchange
            } else if exchange == 0 {
                10_000
            } else {
                5_000 + exchange
            };
        } else {
            if let Some(prev) = prev_move {
                let counter =
                    self.countermoves[move_from(prev) as usize][move_to(prev) as usize];
                if counter == mv {
                    score += 9_500;
                }
            }
            if self.is_killer(mv, ply) {
                score += 9_000;
            }
            score += self.history[move_from(mv) as usize][move_to(mv) as usize];
        }

        if move_kind(mv) == MoveKind::Promotion {
            score += 15_000;
        }

        score
    }

    fn store_killer(&mut self, mv: Move, ply: usize) {
        if ply >= MAX_PLY {
            return;
        }
        if self.killers[ply][0] != mv {
            self.killers[ply][1] = self.killers[ply][0];
            self.killers[ply][0] = mv;
        }
    }

    fn is_killer(&self, mv: Move, ply: usize) -> bool {
        ply < MAX_PLY && (self.killers[ply][0] == mv || self.killers[ply][1] == mv)
    }

    /// History bonus with gravity: the running score decays toward zero as
    /// new bonuses arrive, keeping the magnitude bounded.
    fn update_history(&mut self, mv: Move, depth: i8) {
        let from = move_from(mv) as usize;
        let to = move_to(mv) as usize;
        let bonus = i32::from(depth) * i32::from(depth);

        let entry = &mut self.history[from][to];
        *entry += bonus - *entry * bonus.abs() / 10_000;
        *entry = (*entry).clamp(-10_000, 10_000);
    }

    fn update_pv(&mut self, ply: usize, mv: Move) {
        if ply + 1 >= MAX_PLY {
            return;
        }
        self.pv_table[ply][0] = mv;
        let child_length = self.pv_length[ply + 1];
        for i in 0..child_length {
            self.pv_table[ply][i + 1] = self.pv_table[ply + 1][i];
        }
        self.pv_length[ply] = child_length + 1;
    }
}
