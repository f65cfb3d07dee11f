//! Heuristic playout from a tree node to a terminal state.
//!
//! The playout policy is not uniform random: it grabs decisive moves when
//! one exists, prefers good captures 60% of the time, and terminates early
//! on remembered trap positions with a probability equal to the root
//! similarity. Outcomes are win-rate scores in {0, 0.5, 1}, possibly scaled
//! by a per-node playout weight, except for positions that are already
//! mated, which yield exact mate sentinels.

use engine_core::{Color, Rules, Value, BLACK_MATES, WHITE_MATES};
use tracing::trace;

use crate::config::SearchConfig;
use crate::node::{NodeId, Outcome};
use crate::rng::PlayoutRng;
use crate::tree::SearchTree;

/// Probability (percent) of picking the best-SEE move instead of a uniform
/// random one.
const SEE_BIAS_PERCENT: u32 = 60;

impl<R: Rules> SearchTree<R> {
    /// Run one playout from `id`.
    ///
    /// `sim` is the similarity of the current root to the remembered
    /// previous root for the side to move; `trap_set` is the trap-move list
    /// captured from that previous root. The node's playout weight is
    /// updated first and scales winning and drawn outcomes observed at
    /// natural termination.
    pub fn simulate(
        &mut self,
        id: NodeId,
        sim: f64,
        trap_set: &[R::Action],
        rules: &R,
        root_pos: &R::Position,
        rng: &mut PlayoutRng,
        config: &SearchConfig,
    ) -> Outcome {
        let weight = {
            let node = self.get_mut(id);
            node.sim_counter = if config.legacy_sim_growth {
                (node.sim_counter - 1.0 + 0.001).exp()
            } else {
                node.sim_counter + 0.001
            };
            node.sim_counter
        };

        let mut pos = self.position_at(id, rules, root_pos);

        if rules.is_draw(&pos) {
            return Outcome::Score(weight * 0.5);
        }
        if rules.is_mate(&pos) {
            // The side to move has been mated, so the opposite side owns
            // the proven result.
            return match rules.side_to_move(&pos) {
                Color::White => Outcome::Proven(BLACK_MATES),
                Color::Black => Outcome::Proven(WHITE_MATES),
            };
        }

        rng.jitter();

        while !rules.is_draw(&pos) && !rules.is_mate(&pos) {
            let moves = rules.legal_moves(&pos);
            if moves.is_empty() {
                // Stalemate: not covered by the draw predicate.
                return Outcome::Score(0.5);
            }

            let mover = rules.side_to_move(&pos);
            if has_decisive_move(rules, &mut pos, &moves) {
                return Outcome::Score(if mover.is_white() { 1.0 } else { 0.0 });
            }

            let index = if rng.percent(SEE_BIAS_PERCENT) {
                pick_move_by_see(rules, &pos, &moves, rng)
            } else {
                rng.index(moves.len())
            };
            let mv = moves[index];

            rules.play_undoable(&mut pos, mv);
            if rules.is_trap(&pos) && trap_set.contains(&mv) && rng.probability(sim) {
                trace!(sim, "playout terminated on remembered trap");
                return Outcome::Score(if mover.is_white() { 1.0 } else { 0.0 });
            }

            // Re-apply through the setup path so the undo stack does not
            // grow with the playout length.
            rules.undo(&mut pos, mv);
            rules.play(&mut pos, mv);
        }

        if rules.is_mate(&pos) {
            return match rules.side_to_move(&pos) {
                Color::White => Outcome::Score(0.0),
                Color::Black => Outcome::Score(weight * 1.0),
            };
        }
        Outcome::Score(weight * 0.5)
    }
}

/// Whether the side to move can mate on the spot. Only check-giving moves
/// are probed.
fn has_decisive_move<R: Rules>(rules: &R, pos: &mut R::Position, moves: &[R::Action]) -> bool {
    for &mv in moves {
        if !rules.gives_check(pos, mv) {
            continue;
        }
        rules.play_undoable(pos, mv);
        let mate = rules.is_mate(pos);
        rules.undo(pos, mv);
        if mate {
            return true;
        }
    }
    false
}

/// Index of the move with the best positive SEE score. Ties among the best
/// score, and the case where no move wins material, fall back to a uniform
/// random choice.
fn pick_move_by_see<R: Rules>(
    rules: &R,
    pos: &R::Position,
    moves: &[R::Action],
    rng: &mut PlayoutRng,
) -> usize {
    let mut best_score: Value = 0;
    let mut best: Vec<usize> = Vec::new();
    for (i, &mv) in moves.iter().enumerate() {
        let score = rules.see(pos, mv);
        if score > best_score {
            best_score = score;
            best.clear();
            best.push(i);
        } else if score == best_score && score > 0 {
            best.push(i);
        }
    }
    match best.len() {
        0 => rng.index(moves.len()),
        1 => best[0],
        n => best[rng.index(n)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_hexapawn::Hexapawn;

    type Tree = SearchTree<Hexapawn>;

    fn run_once(
        rules: &Hexapawn,
        fen: &str,
        sim: f64,
        trap_set: &[games_hexapawn::PawnMove],
        seed: u64,
    ) -> Outcome {
        let root_pos = rules.parse_fen(fen);
        let mut tree = Tree::new();
        let mut rng = PlayoutRng::seeded(seed);
        let config = SearchConfig::default();
        tree.simulate(
            tree.root(),
            sim,
            trap_set,
            rules,
            &root_pos,
            &mut rng,
            &config,
        )
    }

    #[test]
    fn mated_position_returns_proven_sentinel() {
        let rules = Hexapawn::standard();
        // White pawn promoted: Black to move is mated.
        assert_eq!(
            run_once(&rules, "P2/3/1p1 b", 1.0, &[], 1),
            Outcome::Proven(WHITE_MATES)
        );
        // Black pawn promoted: White to move is mated.
        assert_eq!(
            run_once(&rules, "3/1P1/2p w", 1.0, &[], 1),
            Outcome::Proven(BLACK_MATES)
        );
    }

    #[test]
    fn drawn_position_returns_weighted_half() {
        let rules = Hexapawn::standard().with_draw_horizon(4);
        let outcome = run_once(&rules, "ppp/3/PPP w 4", 1.0, &[], 1);
        match outcome {
            Outcome::Score(s) => assert!((s - 0.5005).abs() < 1e-9, "score {s}"),
            other => panic!("expected score, got {other:?}"),
        }
    }

    #[test]
    fn stalemate_returns_unscaled_half() {
        let rules = Hexapawn::new(2, 3);
        // Black has no moves: blocked push, nothing to capture.
        let outcome = run_once(&rules, "p1/P1/2 b", 1.0, &[], 1);
        assert_eq!(outcome, Outcome::Score(0.5));
    }

    #[test]
    fn decisive_move_ends_the_playout_immediately() {
        let rules = Hexapawn::standard();
        // White promotes next ply whatever the dice say.
        for seed in 0..16 {
            let outcome = run_once(&rules, "1p1/P2/3 w", 1.0, &[], seed);
            assert_eq!(outcome, Outcome::Score(1.0));
        }
        // Mirror position: Black promotes.
        for seed in 0..16 {
            let outcome = run_once(&rules, "3/2p/1P1 b", 1.0, &[], seed);
            assert_eq!(outcome, Outcome::Score(0.0));
        }
    }

    #[test]
    fn sim_counter_update_defaults_to_additive() {
        let rules = Hexapawn::standard();
        let root_pos = rules.startpos();
        let mut tree = Tree::new();
        let mut rng = PlayoutRng::seeded(9);
        let config = SearchConfig::default();
        for _ in 0..3 {
            tree.simulate(tree.root(), 1.0, &[], &rules, &root_pos, &mut rng, &config);
        }
        let counter = tree.get(tree.root()).sim_counter;
        assert!((counter - 1.003).abs() < 1e-9, "counter {counter}");
    }

    #[test]
    fn legacy_growth_is_exponential() {
        let rules = Hexapawn::standard();
        let root_pos = rules.startpos();
        let mut tree = Tree::new();
        let mut rng = PlayoutRng::seeded(9);
        let config = SearchConfig::default().with_legacy_sim_growth(true);
        tree.simulate(tree.root(), 1.0, &[], &rules, &root_pos, &mut rng, &config);
        let counter = tree.get(tree.root()).sim_counter;
        assert!((counter - 0.001f64.exp()).abs() < 1e-9, "counter {counter}");
    }

    #[test]
    fn trap_gate_fires_at_the_similarity_rate() {
        let rules = Hexapawn::new(2, 3);
        // White a1 vs Black b2: the capture leaves Black without a move
        // (trapped); the push hands Black an immediate promotion. The
        // capture carries the best SEE, so it is chosen ~80% of the time.
        let root_pos = rules.parse_fen("2/1p/P1 w");
        let trap_set = rules.trap_moves(&root_pos);
        assert_eq!(trap_set.len(), 1);

        let sim = 0.8;
        let config = SearchConfig::default();
        let mut rng = PlayoutRng::seeded(1234);

        let mut trap_wins = 0u32;
        let mut trap_misses = 0u32;
        for _ in 0..2000 {
            let mut tree = Tree::new();
            let outcome = tree.simulate(
                tree.root(),
                sim,
                &trap_set,
                &rules,
                &root_pos,
                &mut rng,
                &config,
            );
            match outcome {
                // Trap gate fired: the mover (White) wins.
                Outcome::Score(s) if s == 1.0 => trap_wins += 1,
                // Trap reached but the gate stayed open: the playout goes
                // on to the blocked position and scores one half.
                Outcome::Score(s) if s == 0.5 => trap_misses += 1,
                // The push line: Black promotes decisively.
                Outcome::Score(s) if s == 0.0 => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        let total = (trap_wins + trap_misses) as f64;
        assert!(total > 1000.0, "trap line should dominate, got {total}");
        let rate = trap_wins as f64 / total;
        assert!(
            (rate - sim).abs() < 0.05,
            "termination rate {rate} should track sim {sim}"
        );
    }

    #[test]
    fn trap_gate_requires_membership() {
        let rules = Hexapawn::new(2, 3);
        let root_pos = rules.parse_fen("2/1p/P1 w");
        // Empty trap set: the gate never fires, so a full-similarity search
        // still never returns the trap win.
        let mut rng = PlayoutRng::seeded(77);
        let config = SearchConfig::default();
        for _ in 0..200 {
            let mut tree = Tree::new();
            let outcome = tree.simulate(
                tree.root(),
                1.0,
                &[],
                &rules,
                &root_pos,
                &mut rng,
                &config,
            );
            assert_ne!(outcome, Outcome::Score(1.0));
        }
    }

    #[test]
    fn zero_similarity_disables_the_gate() {
        let rules = Hexapawn::new(2, 3);
        let root_pos = rules.parse_fen("2/1p/P1 w");
        let trap_set = rules.trap_moves(&root_pos);
        let mut rng = PlayoutRng::seeded(78);
        let config = SearchConfig::default();
        for _ in 0..200 {
            let mut tree = Tree::new();
            let outcome = tree.simulate(
                tree.root(),
                0.0,
                &trap_set,
                &rules,
                &root_pos,
                &mut rng,
                &config,
            );
            assert_ne!(outcome, Outcome::Score(1.0));
        }
    }

    #[test]
    fn see_bias_prefers_winning_captures() {
        let rules = Hexapawn::standard();
        // White b2 can capture either a3 or c3 (both SEE +100 with no
        // defender) or nothing else; ties among best captures are split
        // randomly.
        let pos = rules.parse_fen("p1p/1P1/3 w");
        let moves = rules.legal_moves(&pos);
        let mut rng = PlayoutRng::seeded(5);
        let mut seen = [false; 8];
        for _ in 0..64 {
            let index = pick_move_by_see(&rules, &pos, &moves, &mut rng);
            let score = rules.see(&pos, moves[index]);
            assert_eq!(score, 100);
            seen[index] = true;
        }
        assert!(seen[0] && seen[1], "both best captures should be drawn");
    }

    #[test]
    fn see_fallback_is_uniform_when_nothing_wins_material() {
        let rules = Hexapawn::standard();
        let pos = rules.startpos();
        let moves = rules.legal_moves(&pos);
        let mut rng = PlayoutRng::seeded(6);
        let mut counts = [0u32; 3];
        for _ in 0..300 {
            counts[pick_move_by_see(&rules, &pos, &moves, &mut rng)] += 1;
        }
        for &count in &counts {
            assert!(count > 50, "counts {counts:?} should be roughly uniform");
        }
    }
}
