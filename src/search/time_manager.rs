//! Deciding, per search, a soft/hard deadline and whether iterative
//! deepening should break between depths. Separated from the worker loop so
//! a clock-partitioning strategy for game time controls can be swapped in
//! without touching the search itself.

use std::time::{Duration, Instant};

use crate::board::position::Position;
use crate::score::{is_win, VALUE_WIN};
use crate::search::SearchLimits;

/// Gives the GUI <-> engine round trip some slack so a hard deadline
/// computed from the clock doesn't get blown by communication overhead.
const TIME_BUFFER: Duration = Duration::from_millis(30);
/// Rough average game length in moves per side; used to partition a clock
/// budget absent a `movestogo` hint from the caller.
const AVERAGE_MOVES_LEFT: i32 = 30;

/// What the coordinator derives from a `SearchLimits` to decide when a
/// search should stop. `deadline()` is an optional hard wall-clock cutoff;
/// `break_iterative_deepening` is consulted after every completed depth.
pub trait TimeManager: Send {
    fn init(&mut self, start: Instant, limits: &SearchLimits, root: &Position);
    /// Hard cutoff past which the search must abandon its current
    /// recursion, if this limit kind has one.
    fn deadline(&self) -> Option<Instant>;
    /// `true` if the given node total already satisfies a fixed-nodes
    /// limit; checked at the same node-counter checkpoints as the deadline.
    fn nodes_exceeded(&self, total_nodes: u64) -> bool;
    /// Consulted between iterative-deepening depths: `true` asks the worker
    /// to stop deepening even though the hard deadline hasn't passed.
    fn break_iterative_deepening(&self, depth: i32, score: i32, elapsed: Duration) -> bool;
}

/// Handles every `SearchLimits` variant: fixed depth/nodes/time are direct,
/// `Clock` partitions the remaining time the way the teacher's
/// `GameTime::update_recommended_time` does, and `Infinite` never signals a
/// stop on its own (the caller must fire the cancellation flag).
pub struct StandardTimeManager {
    limits: SearchLimits,
    soft_time: Option<Duration>,
    hard_time: Option<Duration>,
    fixed_depth: Option<i32>,
    fixed_nodes: Option<u64>,
    start: Instant,
}

impl Default for StandardTimeManager {
    fn default() -> Self {
        Self {
            limits: SearchLimits::Infinite,
            soft_time: None,
            hard_time: None,
            fixed_depth: None,
            fixed_nodes: None,
            start: Instant::now(),
        }
    }
}

impl TimeManager for StandardTimeManager {
    fn init(&mut self, start: Instant, limits: &SearchLimits, root: &Position) {
        self.limits = *limits;
        self.start = start;
        self.soft_time = None;
        self.hard_time = None;
        self.fixed_depth = None;
        self.fixed_nodes = None;

        match *limits {
            SearchLimits::FixedDepth(d) => self.fixed_depth = Some(d),
            SearchLimits::FixedNodes(n) => self.fixed_nodes = Some(n),
            SearchLimits::FixedTime(d) => {
                self.soft_time = Some(d);
                self.hard_time = Some(d);
            }
            SearchLimits::Infinite => {}
            SearchLimits::Clock { white_time, black_time, white_inc, black_inc, moves_to_go } => {
                let (clock, inc) = match root.side_to_move {
                    crate::types::piece::Color::White => (white_time, white_inc),
                    crate::types::piece::Color::Black => (black_time, black_inc),
                };
                let est_moves_left = moves_to_go.unwrap_or(AVERAGE_MOVES_LEFT).max(1);
                let clock = clock.saturating_sub(TIME_BUFFER);
                let share = clock / est_moves_left as u32 + inc;
                self.soft_time = Some(share);
                // Hard stop gives a deeper iteration room to finish, capped
                // so a single move can never eat the whole remaining clock.
                self.hard_time = Some((share * 3).min(clock));
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.hard_time.map(|d| self.start + d)
    }

    fn nodes_exceeded(&self, total_nodes: u64) -> bool {
        self.fixed_nodes.is_some_and(|n| total_nodes >= n)
    }

    fn break_iterative_deepening(&self, depth: i32, score: i32, elapsed: Duration) -> bool {
        if let Some(d) = self.fixed_depth {
            return depth >= d;
        }
        if let Some(soft) = self.soft_time {
            if elapsed >= soft {
                return true;
            }
            // A mate within the depth already searched is as good as it
            // gets; no later iteration can usefully improve on it.
            if is_win(score) && VALUE_WIN + depth >= score {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::{build_position, STARTING_FEN};

    #[test]
    fn fixed_depth_breaks_once_reached() {
        let mut tm = StandardTimeManager::default();
        let pos = build_position(STARTING_FEN);
        tm.init(Instant::now(), &SearchLimits::FixedDepth(6), &pos);
        assert!(tm.break_iterative_deepening(6, 0, Duration::ZERO));
        assert!(!tm.break_iterative_deepening(5, 0, Duration::ZERO));
    }

    #[test]
    fn fixed_nodes_has_no_hard_deadline() {
        let mut tm = StandardTimeManager::default();
        let pos = build_position(STARTING_FEN);
        tm.init(Instant::now(), &SearchLimits::FixedNodes(1_000), &pos);
        assert!(tm.deadline().is_none());
        assert!(tm.nodes_exceeded(1_000));
        assert!(!tm.nodes_exceeded(999));
    }

    #[test]
    fn infinite_never_signals_a_break() {
        let mut tm = StandardTimeManager::default();
        let pos = build_position(STARTING_FEN);
        tm.init(Instant::now(), &SearchLimits::Infinite, &pos);
        assert!(tm.deadline().is_none());
        assert!(!tm.break_iterative_deepening(50, 0, Duration::from_secs(3600)));
    }

    #[test]
    fn clock_limits_derive_a_soft_and_hard_budget() {
        let mut tm = StandardTimeManager::default();
        let pos = build_position(STARTING_FEN);
        tm.init(
            Instant::now(),
            &SearchLimits::Clock {
                white_time: Duration::from_secs(60),
                black_time: Duration::from_secs(60),
                white_inc: Duration::ZERO,
                black_inc: Duration::ZERO,
                moves_to_go: None,
            },
            &pos,
        );
        assert!(tm.deadline().is_some());
        assert!(tm.soft_time.unwrap() < tm.hard_time.unwrap());
    }
}
