//! Perft: exhaustive legal-move tree counting for move generator
//! certification.

use crate::board::position::Position;
use crate::movegen::generator::generate_legal;

/// Number of legal leaf positions at `depth` plies. Depth 0 is one node.
pub fn perft(position: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_legal(position);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for mv in moves {
        position.make_move(mv);
        nodes += perft(position, depth - 1);
        position.unmake_move();
    }

    nodes
}

/// Per-root-move node counts, for diffing against a reference engine when
/// a perft total disagrees.
pub fn perft_divide(position: &mut Position, depth: u8) -> Vec<(crate::board::moves::Move, u64)> {
    let moves = generate_legal(position);
    let mut results = Vec::with_capacity(moves.len());

    for mv in moves {
        position.make_move(mv);
        let nodes = if depth > 1 {
            perft(position, depth - 1)
        } else {
            1
        };
        position.unmake_move();
        results.push((mv, nodes));
    }

    results
}
