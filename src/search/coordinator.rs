//! The public entry point: owns the transposition table, the per-worker
//! heuristic state that survives across calls, and the Lazy-SMP fan-out
//! that turns one `Search` call into several cooperating threads.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::board::position::Position;
use crate::eval::EvaluatorFactory;
use crate::moves::mv::Move;
use crate::score::UciScore;
use crate::search::time_manager::{StandardTimeManager, TimeManager};
use crate::search::worker::{generate_root_moves, Worker, WorkerState};
use crate::search::{MainLine, SearchLimits};
use crate::tt::TranspositionTable;

const DEFAULT_HASH_MB: usize = 16;
const DEFAULT_THREADS: usize = 1;

/// One position plus the game history leading up to it, so repetition
/// detection sees moves played before the search itself starts.
#[derive(Clone, Default)]
pub struct GameHistory {
    pub positions: Vec<Position>,
}

impl GameHistory {
    pub fn push(&mut self, pos: Position) {
        self.positions.push(pos);
    }

    /// Counts position keys walking backward from the most recent position,
    /// stopping once the last irreversible move (`Rule50 == 0`) is included
    /// — moves before it can never repeat the positions that follow.
    fn keys(&self) -> FxHashMap<u64, u32> {
        let mut keys: FxHashMap<u64, u32> = FxHashMap::default();
        for pos in self.positions.iter().rev() {
            *keys.entry(pos.key()).or_insert(0) += 1;
            if pos.rule50() == 0 {
                break;
            }
        }
        keys
    }
}

/// Everything a single `Engine::search` call needs: the position to search
/// from, the history behind it (for repetition), and what should stop
/// iterative deepening.
pub struct SearchParams<'a> {
    pub root: Position,
    pub history: GameHistory,
    pub limits: SearchLimits,
    pub progress: Option<Box<dyn FnMut(&SearchInfo) + Send + 'a>>,
}

/// A snapshot of search progress, handed to the caller's progress callback
/// (depth completed, or every half-second of an in-progress depth) and
/// returned as the final result.
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: i32,
    pub sel_depth: i32,
    pub score: UciScore,
    pub main_line: Vec<Move>,
    pub nodes: u64,
    pub elapsed: Duration,
    pub hashfull: usize,
}

/// Persisted per-thread state: history tables and a boxed evaluator
/// instance. Recreated only when the thread count changes; zeroed (not
/// dropped) by `Engine::clear`.
pub struct Engine {
    hash_mb: usize,
    threads: usize,
    evaluator_factory: EvaluatorFactory,
    tt: TranspositionTable,
    lmr: crate::search::lmr::LmrTable,
    worker_states: Vec<WorkerState>,
}

impl Engine {
    pub fn new(evaluator_factory: EvaluatorFactory) -> Self {
        let mut engine = Self {
            hash_mb: DEFAULT_HASH_MB,
            threads: DEFAULT_THREADS,
            evaluator_factory,
            tt: TranspositionTable::new(DEFAULT_HASH_MB),
            lmr: crate::search::lmr::LmrTable::new(),
            worker_states: Vec::new(),
        };
        engine.prepare();
        engine
    }

    pub fn set_hash_mb(&mut self, mb: usize) {
        if mb != self.hash_mb {
            self.hash_mb = mb;
            self.tt = TranspositionTable::new(mb);
        }
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    pub fn hash_mb(&self) -> usize {
        self.hash_mb
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Recreates per-thread state only if the thread count changed since the
    /// last call, mirroring the persisted-state contract a UCI front end
    /// relies on between `setoption` and `go`.
    pub fn prepare(&mut self) {
        if self.worker_states.len() != self.threads {
            self.worker_states = (0..self.threads).map(|_| WorkerState::new((self.evaluator_factory)())).collect();
            log::debug!("prepared {} worker states", self.threads);
        }
    }

    /// Resets history tables and the transposition table without
    /// reallocating either, for a UCI `ucinewgame`.
    pub fn clear(&mut self) {
        for state in &mut self.worker_states {
            state.clear();
        }
        self.tt.clear();
    }

    /// Runs iterative-deepening Lazy-SMP search to the limits in `params`,
    /// blocking until a stop condition fires, and returns the best
    /// completed iteration. `stop` lets the caller cancel early (e.g. a UCI
    /// `stop` command); the search also self-cancels on its own limits.
    pub fn search(&mut self, stop: &AtomicBool, mut params: SearchParams) -> SearchInfo {
        self.prepare();
        self.tt.prepare_new_search();

        let start = Instant::now();
        let mut time_manager = StandardTimeManager::default();
        time_manager.init(start, &params.limits, &params.root);

        let root_tt_move = self.tt.read(params.root.key(), 0).map(|e| e.best_move()).unwrap_or(Move::EMPTY);
        let base_root_moves = generate_root_moves(&params.root, root_tt_move);
        if base_root_moves.is_empty() {
            return SearchInfo {
                depth: 0,
                sel_depth: 0,
                score: UciScore::from_raw(if params.root.in_check() { crate::score::loss_in(0) } else { 0 }),
                main_line: Vec::new(),
                nodes: 0,
                elapsed: start.elapsed(),
                hashfull: self.tt.permille_usage(),
            };
        }

        let global_nodes = AtomicU64::new(0);
        let global_depth = AtomicI32::new(0);
        let global_sel_depth = AtomicI32::new(0);
        let main_line = Mutex::new(MainLine::default());
        let history_keys = params.history.keys();
        let mut progress_cb = params.progress.take();

        std::thread::scope(|scope| {
            for (idx, state) in self.worker_states.iter_mut().enumerate() {
                let tt = &self.tt;
                let lmr = &self.lmr;
                let root = &params.root;
                let global_nodes = &global_nodes;
                let global_depth = &global_depth;
                let global_sel_depth = &global_sel_depth;
                let main_line = &main_line;
                let history_keys = &history_keys;
                let time_manager = &time_manager;
                let mut root_moves = base_root_moves.clone();
                let (start_depth, inc_depth) = stagger(idx);
                // Only the thread driving time-management decisions (idx 0)
                // reports progress, so only it is handed the callback.
                let progress: Option<&mut (dyn FnMut(&SearchInfo) + Send)> =
                    if idx == 0 { progress_cb.as_deref_mut().map(|f| f as &mut (dyn FnMut(&SearchInfo) + Send)) } else { None };

                scope.spawn(move || {
                    let mut worker = Worker::new(
                        state,
                        tt,
                        lmr,
                        stop,
                        global_nodes,
                        global_depth,
                        global_sel_depth,
                        main_line,
                        history_keys,
                        time_manager,
                        idx,
                        start,
                    );
                    worker.iterative_deepening(root, &mut root_moves, start_depth, inc_depth, progress);
                });
            }
        });

        let final_line = main_line.into_inner().unwrap();
        let info = SearchInfo {
            depth: final_line.depth,
            sel_depth: global_sel_depth.load(Ordering::Relaxed),
            score: UciScore::from_raw(final_line.score),
            main_line: final_line.moves,
            nodes: global_nodes.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
            hashfull: self.tt.permille_usage(),
        };
        if let Some(mut progress) = progress_cb {
            progress(&info);
        }
        log::info!("search finished at depth {} in {:?}, {} nodes", info.depth, info.elapsed, info.nodes);
        info
    }
}

/// Staggers Lazy-SMP helper threads across nearby depths instead of having
/// every worker duplicate the main thread's exact schedule: thread 0 always
/// runs the plain `1, 2, 3, ...` ladder since it is the one the coordinator
/// treats as authoritative for time-management decisions.
fn stagger(thread_idx: usize) -> (i32, i32) {
    if thread_idx == 0 {
        (1, 1)
    } else {
        let start = 1 + (thread_idx as i32 % 2);
        (start, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::{build_position, STARTING_FEN};
    use crate::eval::default_evaluator_factory;

    #[test]
    fn search_returns_a_legal_move_from_the_opening_position() {
        let mut engine = Engine::new(default_evaluator_factory);
        let stop = AtomicBool::new(false);
        let params = SearchParams {
            root: build_position(STARTING_FEN),
            history: GameHistory::default(),
            limits: SearchLimits::FixedDepth(3),
            progress: None,
        };
        let info = engine.search(&stop, params);
        assert!(!info.main_line.is_empty());
    }

    #[test]
    fn progress_callback_fires_for_deep_enough_iterations() {
        use std::sync::atomic::AtomicUsize;

        let mut engine = Engine::new(default_evaluator_factory);
        let stop = AtomicBool::new(false);
        let calls = AtomicUsize::new(0);
        let mut last_depth = 0;
        let params = SearchParams {
            root: build_position(STARTING_FEN),
            history: GameHistory::default(),
            limits: SearchLimits::FixedDepth(6),
            progress: Some(Box::new(|info: &SearchInfo| {
                calls.fetch_add(1, Ordering::Relaxed);
                last_depth = info.depth;
            })),
        };
        let info = engine.search(&stop, params);
        assert!(calls.load(Ordering::Relaxed) >= 1, "expected at least one throttled progress callback by depth 6");
        assert_eq!(last_depth, info.depth);
    }

    #[test]
    fn prepare_is_idempotent_when_thread_count_is_unchanged() {
        let mut engine = Engine::new(default_evaluator_factory);
        engine.prepare();
        assert_eq!(engine.worker_states.len(), 1);
    }

    #[test]
    fn set_threads_recreates_worker_states_on_next_prepare() {
        let mut engine = Engine::new(default_evaluator_factory);
        engine.set_threads(2);
        engine.prepare();
        assert_eq!(engine.worker_states.len(), 2);
    }
}
