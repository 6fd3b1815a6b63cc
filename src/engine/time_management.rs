//! Time management: converting raw clock data into a per-move budget.
//!
//! The UCI layer passes the clocks through untouched; the strategy here
//! decides the final `movetime` the search will honor.

use crate::board::position::Position;
use crate::board::types::Color;
use crate::engine::coordinator::GoParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStrategy {
    /// Fixed rule: spend 1/20th of the remaining clock.
    Fraction20,
    /// Adaptive rule using the clock, the increment, and the game phase.
    Adaptive,
}

/// Resolve `params` into a concrete per-move budget. An explicit
/// `movetime` always wins; without any clock data the budget stays unset
/// (depth-limited search).
pub fn resolve_movetime(
    position: &Position,
    params: &GoParams,
    strategy: TimeStrategy,
) -> Option<u64> {
    if let Some(movetime) = params.movetime_ms {
        return Some(movetime);
    }

    let (remaining, increment) = match position.side_to_move() {
        Color::White => (params.wtime_ms, params.winc_ms),
        Color::Black => (params.btime_ms, params.binc_ms),
    };
    let remaining = remaining?;

    let budget = match strategy {
        TimeStrategy::Fraction20 => (remaining / 20).max(1),
        TimeStrategy::Adaptive => {
            adaptive_budget_ms(position, remaining, increment, params.movestogo)
        }
    };

    Some(budget)
}

fn adaptive_budget_ms(
    position: &Position,
    remaining_ms: u64,
    increment_ms: Option<u64>,
    movestogo: Option<u16>,
) -> u64 {
    let moves_played = u64::from(position.fullmove_number());
    let expected_moves_left = if let Some(togo) = movestogo {
        u64::from(togo.max(1))
    } else if moves_played < 15 {
        40
    } else if moves_played < 35 {
        26
    } else {
        16
    };

    // Keep a reserve so a long think never flags the clock.
    let reserve = (remaining_ms / 25).clamp(50, remaining_ms.saturating_sub(1).max(50));
    let usable = remaining_ms.saturating_sub(reserve);
    let base = usable / expected_moves_left.max(1);
    let increment_bonus = increment_ms.unwrap_or(0).saturating_mul(3) / 4;

    let target = base.saturating_add(increment_bonus);
    let min_budget = if remaining_ms < 1_000 { 5 } else { 15 };
    let max_budget = (remaining_ms / 4).max(1);

    target.clamp(min_budget, max_budget)
}
