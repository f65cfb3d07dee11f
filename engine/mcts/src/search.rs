//! The search driver: iterate select/expand/simulate/update until stopped.
//!
//! The driver is single-threaded and cooperative. Every thousand
//! iterations it polls: reports the current principal variations, drains
//! pending control signals and checks the thinking budget. Stopping is
//! sticky: once requested, the search finishes the current iteration,
//! emits its final report and returns.

use engine_core::{black_wins, white_wins, Rules, BLACK_MATES, WHITE_MATES};
use tracing::debug;

use crate::config::SearchConfig;
use crate::node::{NodeId, NodeValue};
use crate::rng::PlayoutRng;
use crate::similarity::similarity;
use crate::time::{SearchLimits, TimeControl};
use crate::trap::TrapMemory;
use crate::tree::SearchTree;

/// Iterations between polls.
pub const POLL_INTERVAL: u64 = 1000;

/// Initial reported depth; bumped as the iteration count outgrows it.
const INITIAL_DEPTH: u32 = 10;

/// Control signals observed during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSignal {
    /// Finish the current iteration and emit the result.
    Stop,
    /// The pondered move was played: switch to timed mode.
    PonderHit,
    /// Stop and ask the host to shut down.
    Quit,
}

/// Non-blocking source of control signals, polled between iterations.
pub trait SignalSource {
    fn poll_signal(&mut self) -> Option<SearchSignal>;
}

/// A source that never signals; useful for fixed-budget searches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignals;

impl SignalSource for NoSignals {
    fn poll_signal(&mut self) -> Option<SearchSignal> {
        None
    }
}

/// What a finished search hands back to the caller.
#[derive(Debug, Clone)]
pub struct SearchReport<M> {
    /// Most visited root child, absent when the root was terminal.
    pub best_move: Option<M>,
    /// Iterations performed.
    pub iterations: u64,
    /// Similarity of this root to the remembered previous root.
    pub similarity: f64,
    /// A quit signal was received during the search.
    pub quit: bool,
}

/// The trap-aware searcher. Owns the cross-search state: configuration,
/// playout randomness and the per-side trap memory.
pub struct Searcher<R: Rules> {
    config: SearchConfig,
    rng: PlayoutRng,
    traps: TrapMemory<R>,
}

impl<R: Rules> Searcher<R> {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            rng: PlayoutRng::default(),
            traps: TrapMemory::new(),
        }
    }

    /// Builder pattern: reseed the playout randomness.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng.reseed(seed);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SearchConfig {
        &mut self.config
    }

    /// Run one search from `root_pos`.
    ///
    /// Each iteration grows the tree by up to two plies (select, expand,
    /// select again, expand again) and runs the playout from the deeper
    /// frontier. Info lines and the final `bestmove` are written through
    /// `sink`; control arrives through `signals`.
    pub fn search(
        &mut self,
        rules: &R,
        root_pos: &R::Position,
        limits: &SearchLimits,
        signals: &mut dyn SignalSource,
        sink: &mut dyn FnMut(String),
    ) -> SearchReport<R::Action> {
        let side = rules.side_to_move(root_pos);
        let white_to_move = side.is_white();
        let multi_pv = self.config.multi_pv;

        // Measure the new root against the remembered one for this side,
        // keep that root's trap moves for the playouts, then replace the
        // snapshot with the new root.
        let sim = similarity(
            self.config.sim_method,
            rules,
            root_pos,
            self.traps.reference(side),
        );
        let trap_set = self.traps.trap_moves(side).to_vec();
        self.traps.remember(rules, side, root_pos);

        debug!(sim, multi_pv, white_to_move, "search started");

        let mut tree: SearchTree<R> = SearchTree::new();
        let root = tree.root();
        let mut clock = TimeControl::start(limits);
        let mut depth = INITIAL_DEPTH;
        let mut iterations: u64 = 0;
        let mut stop = false;
        let mut quit = false;
        let mut pondering = limits.ponder;
        let mut stop_on_ponderhit = false;

        while !stop {
            let s0 = tree.select(root, rules, root_pos);
            let e0 = tree.expand(s0, rules, root_pos);
            let s1 = tree.select(e0, rules, root_pos);
            let e1 = tree.expand(s1, rules, root_pos);
            let outcome = tree.simulate(
                e1,
                sim,
                &trap_set,
                rules,
                root_pos,
                &mut self.rng,
                &self.config,
            );
            tree.update(e1, outcome, rules, root_pos);

            if iterations % POLL_INTERVAL == 0 {
                if (iterations as f64).ln() > depth as f64 {
                    depth += 1;
                    sink(format!("info depth {depth}"));
                }
                emit_multi_pv(
                    &tree, rules, depth, iterations, clock.elapsed_ms(), white_to_move, multi_pv,
                    sink,
                );

                while let Some(signal) = signals.poll_signal() {
                    match signal {
                        SearchSignal::Stop => {
                            pondering = false;
                            stop = true;
                        }
                        SearchSignal::Quit => {
                            pondering = false;
                            stop = true;
                            quit = true;
                        }
                        SearchSignal::PonderHit => {
                            pondering = false;
                            clock.activate();
                            if stop_on_ponderhit {
                                stop = true;
                            }
                        }
                    }
                }

                if !stop {
                    if clock.expired() {
                        stop = true;
                        pondering = false;
                    } else if pondering && clock.would_expire() {
                        // Out of budget while pondering: stop as soon as
                        // the ponder move is confirmed.
                        stop_on_ponderhit = true;
                    }
                }
            }
            iterations += 1;
        }

        emit_multi_pv(
            &tree, rules, depth, iterations, clock.elapsed_ms(), white_to_move, multi_pv, sink,
        );
        sink(format!("info string sim={sim}"));

        let best_move = tree.best_child(root).and_then(|id| tree.get(id).last_move);
        if let Some(mv) = best_move {
            sink(format!("bestmove {}", rules.format_move(mv)));
        }

        debug!(iterations, nodes = tree.len(), quit, "search finished");

        SearchReport {
            best_move,
            iterations,
            similarity: sim,
            quit,
        }
    }
}

/// Emit one `info ... multipv k ...` line per reported variation, best
/// first.
#[allow(clippy::too_many_arguments)]
fn emit_multi_pv<R: Rules>(
    tree: &SearchTree<R>,
    rules: &R,
    depth: u32,
    iterations: u64,
    elapsed_ms: u64,
    white_to_move: bool,
    multi_pv: u32,
    sink: &mut dyn FnMut(String),
) {
    let sorted = tree.sorted_root_children();
    for (index, &child) in sorted.iter().take(multi_pv as usize).enumerate() {
        sink(pv_info_line(
            tree, rules, child, index as u32, depth, iterations, elapsed_ms, white_to_move,
        ));
    }
}

#[allow(clippy::too_many_arguments)]
fn pv_info_line<R: Rules>(
    tree: &SearchTree<R>,
    rules: &R,
    child: NodeId,
    index: u32,
    depth: u32,
    iterations: u64,
    elapsed_ms: u64,
    white_to_move: bool,
) -> String {
    let node = tree.get(child);
    let score = score_token(node.value, node.total(), node.visits, white_to_move);

    let mut line = format!(
        "info depth {depth} multipv {} score {score} nodes {iterations}",
        index + 1
    );
    if elapsed_ms > 0 {
        line.push_str(&format!(" nps {}", 1000 * iterations / elapsed_ms));
    }
    line.push_str(&format!(" time {elapsed_ms} pv"));
    for mv in tree.principal_variation(child) {
        line.push(' ');
        line.push_str(&rules.format_move(mv));
    }
    line
}

/// Format a root child's score: a centipawn-like value derived from the
/// win rate, or a signed mate distance once the child is proven. Both are
/// reported from the perspective of the side to move at the root.
fn score_token(value: NodeValue, total: f64, visits: u32, white_to_move: bool) -> String {
    if let NodeValue::Proven(v) = value {
        if white_wins(v) {
            let plies = WHITE_MATES - v + 1;
            let mate = (plies + 1) / 2;
            let signed = if white_to_move { mate } else { -mate };
            return format!("mate {signed}");
        }
        if black_wins(v) {
            let plies = v - BLACK_MATES + 1;
            let mate = (plies + 1) / 2;
            let signed = if white_to_move { -mate } else { mate };
            return format!("mate {signed}");
        }
    }

    let mut winrate = if visits > 0 {
        total / visits as f64
    } else {
        0.5
    };
    if !white_to_move {
        winrate = 1.0 - winrate;
    }
    format!("cp {}", (1000.0 * winrate - 500.0).round() as i64)
}

/// Convenience wrapper mirroring the driver's entry point for hosts that
/// do not keep a searcher alive between moves.
pub fn uct<R: Rules>(
    rules: &R,
    root_pos: &R::Position,
    limits: &SearchLimits,
    config: SearchConfig,
    signals: &mut dyn SignalSource,
    sink: &mut dyn FnMut(String),
) -> SearchReport<R::Action> {
    Searcher::new(config).search(rules, root_pos, limits, signals, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_hexapawn::Hexapawn;
    use std::time::Duration;

    struct Script {
        polls: u32,
        signal_at: u32,
        signal: SearchSignal,
    }

    impl Script {
        fn new(signal_at: u32, signal: SearchSignal) -> Self {
            Self {
                polls: 0,
                signal_at,
                signal,
            }
        }
    }

    impl SignalSource for Script {
        fn poll_signal(&mut self) -> Option<SearchSignal> {
            self.polls += 1;
            if self.polls == self.signal_at {
                Some(self.signal)
            } else {
                None
            }
        }
    }

    fn run(
        rules: &Hexapawn,
        fen: &str,
        limits: SearchLimits,
        signals: &mut dyn SignalSource,
    ) -> (SearchReport<games_hexapawn::PawnMove>, Vec<String>) {
        let pos = rules.parse_fen(fen);
        let mut lines = Vec::new();
        let mut searcher: Searcher<Hexapawn> =
            Searcher::new(SearchConfig::default()).with_rng_seed(42);
        let report = searcher.search(rules, &pos, &limits, signals, &mut |line| {
            lines.push(line)
        });
        (report, lines)
    }

    #[test]
    fn timed_search_emits_exactly_one_bestmove() {
        let rules = Hexapawn::standard();
        let (report, lines) = run(
            &rules,
            "ppp/3/PPP w 0",
            SearchLimits::timed(Duration::from_millis(400)),
            &mut NoSignals,
        );

        let bestmoves: Vec<&String> =
            lines.iter().filter(|l| l.starts_with("bestmove ")).collect();
        assert_eq!(bestmoves.len(), 1);
        assert!(report.iterations >= 1);

        // The chosen move is legal from the root.
        let pos = rules.parse_fen("ppp/3/PPP w 0");
        let legal = rules.legal_moves(&pos);
        assert!(legal.contains(&report.best_move.unwrap()));
        let text = bestmoves[0].strip_prefix("bestmove ").unwrap();
        assert!(rules.parse_move(&pos, text).is_some());
    }

    #[test]
    fn mate_in_one_is_found_and_reported() {
        let rules = Hexapawn::standard();
        let (report, lines) = run(
            &rules,
            "1p1/P2/3 w 0",
            SearchLimits::timed(Duration::from_millis(400)),
            &mut NoSignals,
        );

        let best = report.best_move.expect("a best move must exist");
        let pos = rules.parse_fen("1p1/P2/3 w 0");
        let after = rules.apply(&pos, best);
        assert!(rules.is_mate(&after), "the chosen move should mate");

        let mate_line = lines
            .iter()
            .rfind(|l| l.contains("multipv 1") && l.contains("score mate"))
            .expect("a mate score should be reported");
        assert!(mate_line.contains("score mate 1"), "{mate_line}");
    }

    #[test]
    fn forced_stalemate_line_is_played() {
        let rules = Hexapawn::new(2, 3);
        // White's only move walks into Black's stalemate.
        let (report, lines) = run(
            &rules,
            "p1/2/P1 w 0",
            SearchLimits::timed(Duration::from_millis(200)),
            &mut NoSignals,
        );
        let best = report.best_move.expect("single legal move");
        assert_eq!(rules.format_move(best), "a1a2");
        assert!(lines.iter().any(|l| l == "bestmove a1a2"));
    }

    #[test]
    fn terminal_root_yields_no_bestmove() {
        let rules = Hexapawn::standard();
        // Black just promoted: White to move is mated.
        let (report, lines) = run(
            &rules,
            "3/1P1/2p w 0",
            SearchLimits::timed(Duration::from_millis(100)),
            &mut NoSignals,
        );
        assert!(report.best_move.is_none());
        assert!(!lines.iter().any(|l| l.starts_with("bestmove")));
    }

    #[test]
    fn stop_signal_ends_an_infinite_search() {
        let rules = Hexapawn::standard();
        let mut script = Script::new(2, SearchSignal::Stop);
        let (report, _) = run(&rules, "ppp/3/PPP w 0", SearchLimits::infinite(), &mut script);
        assert!(!report.quit);
        // Stopped at the second poll: just over one poll interval.
        assert!(report.iterations <= 2 * POLL_INTERVAL);
    }

    #[test]
    fn quit_signal_is_reported() {
        let rules = Hexapawn::standard();
        let mut script = Script::new(1, SearchSignal::Quit);
        let (report, _) = run(&rules, "ppp/3/PPP w 0", SearchLimits::infinite(), &mut script);
        assert!(report.quit);
    }

    #[test]
    fn ponderhit_applies_a_deferred_timeout() {
        let rules = Hexapawn::standard();
        // Zero budget while pondering: the first poll flags the deferred
        // stop, the ponderhit then ends the search.
        let limits = SearchLimits {
            time: Duration::ZERO,
            infinite: false,
            ponder: true,
        };
        let mut script = Script::new(2, SearchSignal::PonderHit);
        let (report, _) = run(&rules, "ppp/3/PPP w 0", limits, &mut script);
        assert!(!report.quit);
        assert!(report.iterations <= 2 * POLL_INTERVAL);
    }

    #[test]
    fn multi_pv_reports_each_variation() {
        let rules = Hexapawn::standard();
        let pos = rules.startpos();
        let mut lines = Vec::new();
        let mut searcher: Searcher<Hexapawn> =
            Searcher::new(SearchConfig::default().with_multi_pv(2)).with_rng_seed(7);
        searcher.search(
            &rules,
            &pos,
            &SearchLimits::timed(Duration::from_millis(200)),
            &mut NoSignals,
            &mut |line| lines.push(line),
        );
        assert!(lines.iter().any(|l| l.contains("multipv 1")));
        assert!(lines.iter().any(|l| l.contains("multipv 2")));
        assert!(lines.iter().any(|l| l.starts_with("info string sim=")));
    }

    #[test]
    fn similarity_reference_persists_between_searches() {
        let rules = Hexapawn::standard();
        let mut searcher: Searcher<Hexapawn> =
            Searcher::new(SearchConfig::default()).with_rng_seed(11);
        let limits = SearchLimits::timed(Duration::from_millis(100));
        let mut sink = |_line: String| {};

        // First search for White: nothing remembered yet.
        let pos = rules.startpos();
        let first = searcher.search(&rules, &pos, &limits, &mut NoSignals, &mut sink);
        assert_eq!(first.similarity, 1.0);

        // Second search from the identical root: full similarity again,
        // this time measured against the remembered snapshot.
        let second = searcher.search(&rules, &pos, &limits, &mut NoSignals, &mut sink);
        assert!((second.similarity - 1.0).abs() < 1e-12);

        // A different White root scores below identity.
        let other = rules.parse_fen("ppp/1P1/P1P w 2");
        let third = searcher.search(&rules, &other, &limits, &mut NoSignals, &mut sink);
        assert!(third.similarity < 1.0);

        // Black's slot is independent: first Black search sees no
        // reference.
        let black_root = rules.parse_fen("ppp/3/PPP b 1");
        let fourth = searcher.search(&rules, &black_root, &limits, &mut NoSignals, &mut sink);
        assert_eq!(fourth.similarity, 1.0);
    }

    #[test]
    fn score_token_formats_both_regimes() {
        // Even win rate, White perspective.
        let token = score_token(NodeValue::Statistical { sum: 5.0 }, 5.0, 10, true);
        assert_eq!(token, "cp 0");
        // 75% for White reads as -250 for a Black-to-move root.
        let token = score_token(NodeValue::Statistical { sum: 7.5 }, 7.5, 10, false);
        assert_eq!(token, "cp -250");
        // Proven mates.
        let token = score_token(NodeValue::Proven(WHITE_MATES), f64::from(WHITE_MATES), 3, true);
        assert_eq!(token, "mate 1");
        let token = score_token(
            NodeValue::Proven(WHITE_MATES - 2),
            f64::from(WHITE_MATES - 2),
            3,
            true,
        );
        assert_eq!(token, "mate 2");
        let token = score_token(NodeValue::Proven(BLACK_MATES), f64::from(BLACK_MATES), 3, true);
        assert_eq!(token, "mate -1");
        let token = score_token(NodeValue::Proven(BLACK_MATES), f64::from(BLACK_MATES), 3, false);
        assert_eq!(token, "mate 1");
    }
}
