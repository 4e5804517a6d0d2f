//! Lazy, phased move ordering: transposition move, then good captures, then
//! killers, then quiets ranked by history, then losing captures and any
//! remainder. Each phase is generated only once its predecessor is
//! exhausted, so a beta cutoff in an early phase never pays for later ones.

use crate::board::position::Position;
use crate::history::{ContinuationContext, HistoryTable, Killers};
use crate::moves::movegen::GenType;
use crate::moves::movelist::{MoveList, MoveListEntry};
use crate::moves::mv::Move;
use crate::see::see_ge_zero;
use crate::types::piece::{Color, PieceName};

#[derive(Default, PartialEq, Eq)]
enum Phase {
    #[default]
    TTMove,
    CapturesInit,
    GoodCaptures,
    FirstKiller,
    SecondKiller,
    QuietsInit,
    Quiets,
    BadCaptures,
    Finished,
}

/// Re-yields the same ordered sequence on [`MovePicker::reset`], which the
/// singular-extension probe relies on to walk every move except `tt_move`
/// without regenerating or re-scoring anything. Captures and quiets are kept
/// in separate lists so losing captures can be deferred past the whole
/// quiet-move phase instead of interleaving with it by raw score.
pub struct MovePicker {
    phase: Phase,
    gen_quiets: bool,

    captures: MoveList,
    cap_current: usize,
    captures_ready: bool,
    quiets: MoveList,
    quiet_current: usize,
    quiets_ready: bool,

    tt_move: Move,
    killers: Killers,
    color: Color,
}

impl MovePicker {
    pub fn new(tt_move: Move, killers: Killers, color: Color, gen_quiets: bool) -> Self {
        MovePicker {
            phase: Phase::TTMove,
            gen_quiets,
            captures: MoveList::default(),
            cap_current: 0,
            captures_ready: false,
            quiets: MoveList::default(),
            quiet_current: 0,
            quiets_ready: false,
            tt_move,
            killers,
            color,
        }
    }

    /// Rewinds to the start of the move list without rescoring or
    /// regenerating, so singular-extension probing sees the same order.
    /// Always replays from `TTMove` — the main loop that resumes after the
    /// probe needs `tt_move` re-yielded so it actually gets searched.
    pub fn reset(&mut self) {
        self.cap_current = 0;
        self.quiet_current = 0;
        self.phase = Phase::TTMove;
    }

    pub fn next(&mut self, pos: &Position, history: &HistoryTable, ctx: &ContinuationContext) -> Option<MoveListEntry> {
        if self.phase == Phase::TTMove {
            self.phase = Phase::CapturesInit;
            if self.tt_move != Move::EMPTY && pos.is_pseudo_legal(self.tt_move) {
                return Some(MoveListEntry { m: self.tt_move, score: TT_MOVE });
            }
        }

        if self.phase == Phase::CapturesInit {
            self.phase = Phase::GoodCaptures;
            if !self.captures_ready {
                self.captures = pos.generate_moves(GenType::CapturesOnly);
                score_captures(pos, history, self.color, &mut self.captures);
                self.captures_ready = true;
            }
        }

        if self.phase == Phase::GoodCaptures {
            while self.cap_current < self.captures.len() {
                let entry = self.captures.pick_move(self.cap_current);
                if entry.m == self.tt_move {
                    self.cap_current += 1;
                    continue;
                }
                if entry.score >= GOOD_CAPTURE_THRESHOLD {
                    self.cap_current += 1;
                    return Some(entry);
                }
                // Every remaining entry from here on is sorted descending
                // but below the good-capture threshold; leave them for the
                // trailing `BadCaptures` phase instead of draining them now.
                break;
            }
            self.phase = if self.gen_quiets { Phase::FirstKiller } else { Phase::BadCaptures };
        }

        if self.phase == Phase::FirstKiller {
            self.phase = Phase::SecondKiller;
            if self.gen_quiets && self.killers.killer1 != self.tt_move && pos.is_pseudo_legal(self.killers.killer1) {
                return Some(MoveListEntry { m: self.killers.killer1, score: KILLER_ONE });
            }
        }

        if self.phase == Phase::SecondKiller {
            self.phase = Phase::QuietsInit;
            if self.gen_quiets
                && self.killers.killer2 != self.tt_move
                && self.killers.killer2 != self.killers.killer1
                && pos.is_pseudo_legal(self.killers.killer2)
            {
                return Some(MoveListEntry { m: self.killers.killer2, score: KILLER_TWO });
            }
        }

        if self.phase == Phase::QuietsInit {
            self.phase = Phase::Quiets;
            if self.gen_quiets && !self.quiets_ready {
                self.quiets = pos.generate_moves(GenType::QuietsOnly);
                score_quiets(history, self.color, ctx, &mut self.quiets.arr);
                self.quiets_ready = true;
            }
        }

        if self.phase == Phase::Quiets {
            while self.quiet_current < self.quiets.len() {
                let entry = self.quiets.pick_move(self.quiet_current);
                self.quiet_current += 1;
                if self.is_cached(entry.m) {
                    continue;
                }
                return Some(entry);
            }
            self.phase = Phase::BadCaptures;
        }

        if self.phase == Phase::BadCaptures {
            while self.cap_current < self.captures.len() {
                let entry = self.captures.pick_move(self.cap_current);
                self.cap_current += 1;
                if entry.m == self.tt_move {
                    continue;
                }
                return Some(entry);
            }
            self.phase = Phase::Finished;
            return None;
        }

        None
    }

    fn is_cached(&self, m: Move) -> bool {
        m == self.tt_move || self.killers.contains(m)
    }
}

/// Captures and promotions only, ordered by captured-piece value then SEE;
/// used inside quiescence search where no quiet move is ever considered.
pub struct QMovePicker {
    moves: MoveList,
    current: usize,
}

impl QMovePicker {
    pub fn new(pos: &Position, history: &HistoryTable, color: Color) -> Self {
        let mut moves = pos.generate_moves(GenType::CapturesOnly);
        score_captures(pos, history, color, &mut moves);
        QMovePicker { moves, current: 0 }
    }

    pub fn next(&mut self) -> Option<MoveListEntry> {
        if self.current < self.moves.len() {
            let entry = self.moves.pick_move(self.current);
            self.current += 1;
            Some(entry)
        } else {
            None
        }
    }
}

fn score_captures(pos: &Position, history: &HistoryTable, color: Color, moves: &mut MoveList) {
    const MVV: [i32; 6] = [0, 2400, 2400, 4800, 9600, 0];
    for entry in moves.arr.iter_mut() {
        entry.score = if entry.m.is_promotion() {
            if entry.m.promotion_piece() == PieceName::Queen {
                QUEEN_PROMOTION + history.capture_history(color, pos, entry.m)
            } else {
                BAD_PROMOTION
            }
        } else {
            let good = see_ge_zero(pos, entry.m);
            let victim = if entry.m.is_en_passant_candidate() { PieceName::Pawn } else { entry.m.captured_piece() };
            (if good { GOOD_CAPTURE } else { BAD_CAPTURE }) + MVV[victim.idx()] + history.capture_history(color, pos, entry.m)
        };
    }
}

fn score_quiets(history: &HistoryTable, color: Color, ctx: &ContinuationContext, moves: &mut [MoveListEntry]) {
    for entry in moves.iter_mut() {
        entry.score = history.quiet_history(color, entry.m, ctx);
    }
}

const TT_MOVE: i32 = i32::MAX - 1000;
const QUEEN_PROMOTION: i32 = 20_000_001;
pub const GOOD_CAPTURE: i32 = 10_000_000;
const KILLER_ONE: i32 = 1_000_000;
const KILLER_TWO: i32 = 900_000;
pub const BAD_CAPTURE: i32 = -10_000;
const BAD_PROMOTION: i32 = -QUEEN_PROMOTION;
/// Separates "good/equal" captures (score dominated by [`GOOD_CAPTURE`] or
/// [`QUEEN_PROMOTION`]) from losing ones (dominated by [`BAD_CAPTURE`] or
/// [`BAD_PROMOTION`]): history/MVV contributions never swing a score across
/// this line in either direction.
const GOOD_CAPTURE_THRESHOLD: i32 = 500_000;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::build_position;

    /// A position where white has both a free capture (knight takes an
    /// undefended pawn) and a losing one (rook takes a pawn defended twice),
    /// plus plenty of quiet king moves, so the phase order in §4.7 is
    /// exercised end to end.
    #[test]
    fn losing_captures_are_deferred_past_quiets() {
        let pos = build_position("4k3/7p/2p1p3/3p2N1/3R4/8/8/4K3 w - - 0 1");
        let history = HistoryTable::default();
        let ctx = ContinuationContext { prev1: Move::EMPTY, prev2: Move::EMPTY, prev4: Move::EMPTY };
        let mut picker = MovePicker::new(Move::EMPTY, Killers::default(), pos.side_to_move, true);

        let mut seen_quiet = false;
        let mut losing_capture_index = None;
        let mut i = 0;
        while let Some(entry) = picker.next(&pos, &history, &ctx) {
            if !entry.m.is_capture() {
                seen_quiet = true;
            } else if !see_ge_zero(&pos, entry.m) {
                losing_capture_index = Some(i);
                // A losing capture must not appear before any quiet move
                // has already been yielded, per the phase-5-after-phase-4
                // ordering.
                assert!(seen_quiet, "losing capture {:?} yielded before any quiet move", entry.m);
            }
            i += 1;
        }
        assert!(losing_capture_index.is_some(), "expected a losing capture to be generated in this position");
    }
}
