//! Iterative-deepening alpha-beta search: per-worker stack/PV types, the
//! search loop itself, the lock-free-TT-backed coordinator, time management,
//! and the late-move-reduction table.

pub mod coordinator;
pub mod lmr;
pub mod time_manager;
pub mod worker;

use arrayvec::ArrayVec;
use std::ops::{Index, IndexMut};

use crate::moves::mv::Move;

/// Frames per worker stack; one per ply the search can reach plus slack for
/// the `height + 2` lookback used by the `improving` heuristic and NMP's
/// double-null guard.
pub const STACK_SIZE: usize = 128;
/// Deepest height (plies from root) the search will recurse to before
/// falling back to a static evaluation.
pub const MAX_HEIGHT: i32 = 127;

/// Per-ply scratch state threaded through the recursive search: this ply's
/// killer slots and the move actually played here, consulted by child
/// frames for continuation-history context and NMP's no-consecutive-nulls
/// rule.
#[derive(Clone, Copy, Default)]
pub struct SearchFrame {
    pub killers: crate::history::Killers,
    pub played_move: Move,
    pub static_eval: i32,
    pub double_extensions: i32,
    pub cutoffs: i32,
    /// Zobrist key of the position searched at this frame, so the
    /// in-progress line can be walked for a repetition without the
    /// recursion threading positions through a separate parameter.
    pub key: u64,
    /// That position's half-move clock, so the repetition walk can stop at
    /// the most recent irreversible move the same way the source's
    /// per-frame position snapshot does.
    pub rule50: usize,
    /// The move that produced this frame's own position (`Position::
    /// last_move`), distinct from `played_move` (the move this frame goes
    /// on to try). `MoveEmpty` both at the root and right after a null
    /// move, which is also where the repetition walk must stop.
    pub frame_last_move: Move,
}

#[derive(Clone)]
pub struct SearchStack {
    frames: [SearchFrame; STACK_SIZE],
}

impl Default for SearchStack {
    fn default() -> Self {
        Self { frames: [SearchFrame::default(); STACK_SIZE] }
    }
}

impl SearchStack {
    /// The move played at `height`, or `Move::EMPTY` if `height` is
    /// negative (no parent, as seen from the root frame).
    pub fn played_move(&self, height: i32) -> Move {
        if height < 0 {
            Move::EMPTY
        } else {
            self.frames[height as usize].played_move
        }
    }
}

impl Index<i32> for SearchStack {
    type Output = SearchFrame;
    fn index(&self, height: i32) -> &Self::Output {
        &self.frames[height as usize]
    }
}

impl IndexMut<i32> for SearchStack {
    fn index_mut(&mut self, height: i32) -> &mut Self::Output {
        &mut self.frames[height as usize]
    }
}

/// Ordered sequence of moves continuing from a given ply, rebuilt bottom-up
/// on every score improvement.
#[derive(Clone, Default)]
pub struct PrincipalVariation {
    pub line: ArrayVec<Move, { MAX_HEIGHT as usize + 1 }>,
}

impl PrincipalVariation {
    pub fn clear(&mut self) {
        self.line.clear();
    }

    /// Prepends `m` to `child`'s line, becoming this frame's new pv.
    pub fn update(&mut self, m: Move, child: &PrincipalVariation) {
        self.line.clear();
        self.line.push(m);
        self.line.extend(child.line.iter().copied());
    }
}

/// What governs when iterative deepening stops for a `Search` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SearchLimits {
    FixedDepth(i32),
    FixedNodes(u64),
    FixedTime(std::time::Duration),
    Clock { white_time: std::time::Duration, black_time: std::time::Duration, white_inc: std::time::Duration, black_inc: std::time::Duration, moves_to_go: Option<i32> },
    Infinite,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits::Infinite
    }
}

/// The non-local "abandon this recursion" signals raised deep in the worker
/// and caught at the iterative-deepening boundary (§5 of the source design:
/// no TT update is left half-written, and the wrapper republishes the best
/// main line completed before the unwind).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unwind {
    /// The cancellation signal fired; abandon the whole search.
    Timeout,
    /// Another worker already published a main line at or past this depth;
    /// abandon this depth only and move to the next.
    StaleDepth,
}

pub type SearchResult<T> = Result<T, Unwind>;

/// The coordinator's single source of truth for "the best completed
/// iteration so far". Workers propose replacements only when their
/// completed iteration has strictly greater depth; the guard is `>`, not
/// `>=`, so arrival order never breaks a tie.
#[derive(Clone, Default)]
pub struct MainLine {
    pub depth: i32,
    pub score: i32,
    pub moves: Vec<Move>,
}

