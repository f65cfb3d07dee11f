//! Position similarity measures.
//!
//! Seven measures quantify how much a position resembles a reference
//! position, each returning a value in [0, 1]. The search uses one of them
//! to weigh remembered trap knowledge: the more the current root resembles
//! the root under which a trap was observed, the more the trap is trusted
//! during playouts.
//!
//! The move-set measures compare positions through their legal moves; the
//! expandable-state measures compare the positions one ply deeper through
//! Zobrist keys; the `Rec*` variants additionally re-examine mismatched
//! pairs with a secondary measure and accept them above a threshold.

use engine_core::{PieceKind, Rules};

/// Value of the static measure.
pub const CONST_SIM: f64 = 0.5;

/// Similarity reported when no reference position exists.
pub const DEFAULT_SIM: f64 = 1.0;

/// Acceptance threshold for recursively compared mismatches.
pub const ACC_THRESHOLD: f64 = 0.6;

/// Intersection credit for an accepted mismatch.
pub const REC_INCREMENT: f64 = 1.0;

/// Sentinel returned by [`similarity_fen`] when either position fails to
/// parse. Distinct from every valid similarity.
pub const INVALID_FEN: f64 = -998.0;

const DEPTH_WEIGHT: f64 = 1.0;
const BREADTH_WEIGHT: f64 = 1.0;

/// The available similarity measures.
///
/// The discriminants are the stable keys used by the similarity test
/// console and its CSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimMethod {
    Constant,
    DepthBreadth,
    InflPieces,
    LegalMoves,
    RecLegalMoves,
    ExpandableStates,
    RecExpandableStates,
}

impl SimMethod {
    /// Every measure, in key order.
    pub const ALL: [SimMethod; 7] = [
        SimMethod::Constant,
        SimMethod::DepthBreadth,
        SimMethod::InflPieces,
        SimMethod::LegalMoves,
        SimMethod::RecLegalMoves,
        SimMethod::ExpandableStates,
        SimMethod::RecExpandableStates,
    ];

    /// Resolve a numeric key (0..=6).
    pub fn from_key(key: u32) -> Option<SimMethod> {
        Self::ALL.get(key as usize).copied()
    }

    /// Canonical upper-case name, as used in result files.
    pub fn name(self) -> &'static str {
        match self {
            SimMethod::Constant => "CONSTANT",
            SimMethod::DepthBreadth => "DEPTH_BREADTH",
            SimMethod::InflPieces => "INFL_PIECES",
            SimMethod::LegalMoves => "LEGAL_MOVES",
            SimMethod::RecLegalMoves => "REC_LEGAL_MOVES",
            SimMethod::ExpandableStates => "EXPANDABLE_STATES",
            SimMethod::RecExpandableStates => "REC_EXPANDABLE_STATES",
        }
    }
}

/// Similarity of `cur` to the reference `prev` under `method`.
///
/// An absent reference yields [`DEFAULT_SIM`] for every method.
pub fn similarity<R: Rules>(
    method: SimMethod,
    rules: &R,
    cur: &R::Position,
    prev: Option<&R::Position>,
) -> f64 {
    let Some(prev) = prev else {
        return DEFAULT_SIM;
    };
    match method {
        SimMethod::Constant => CONST_SIM,
        SimMethod::DepthBreadth => depth_breadth(rules, cur, prev),
        SimMethod::InflPieces => infl_pieces(rules, cur, prev),
        SimMethod::LegalMoves => legal_moves(rules, cur, prev),
        SimMethod::RecLegalMoves => rec_legal_moves(rules, cur, prev),
        SimMethod::ExpandableStates => expandable_states(rules, cur, prev),
        SimMethod::RecExpandableStates => rec_expandable_states(rules, cur, prev),
    }
}

/// FEN wrapper: parse both positions and compare them.
///
/// Returns [`INVALID_FEN`] when either side fails to parse (key 0).
pub fn similarity_fen<R: Rules>(method: SimMethod, rules: &R, cur: &str, prev: &str) -> f64 {
    let cur = rules.parse_fen(cur);
    let prev = rules.parse_fen(prev);
    if rules.key(&cur) == 0 || rules.key(&prev) == 0 {
        return INVALID_FEN;
    }
    similarity(method, rules, &cur, Some(&prev))
}

/// `1 - |a-b| / (a+b)`, defined as 1 when both are zero.
fn balance(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        1.0
    } else {
        1.0 - (a - b).abs() / (a + b)
    }
}

/// Intersection-over-union with empty unions counting as identical.
fn jaccard(inter: f64, uni: f64) -> f64 {
    if uni <= 0.0 {
        1.0
    } else {
        (inter / uni).clamp(0.0, 1.0)
    }
}

fn depth_breadth<R: Rules>(rules: &R, cur: &R::Position, prev: &R::Position) -> f64 {
    let depth = balance(rules.ply(cur) as f64, rules.ply(prev) as f64);
    let breadth = balance(
        rules.legal_moves(cur).len() as f64,
        rules.legal_moves(prev).len() as f64,
    );
    (DEPTH_WEIGHT * depth + BREADTH_WEIGHT * breadth) / (DEPTH_WEIGHT + BREADTH_WEIGHT)
}

fn infl_pieces<R: Rules>(rules: &R, cur: &R::Position, prev: &R::Position) -> f64 {
    let cur_side = rules.side_to_move(cur);
    let prev_side = rules.side_to_move(prev);
    let mut inter = 0u32;
    let mut sum = 0u32;
    for kind in PieceKind::ALL {
        let a = rules.piece_count(cur, cur_side, kind);
        let b = rules.piece_count(prev, prev_side, kind);
        inter += a.min(b);
        sum += a.max(b);
    }
    jaccard(inter as f64, sum as f64)
}

fn legal_moves<R: Rules>(rules: &R, cur: &R::Position, prev: &R::Position) -> f64 {
    let cur_moves = rules.legal_moves(cur);
    let mut prev_moves = rules.legal_moves(prev);
    let uni = (cur_moves.len() + prev_moves.len()) as f64;

    let mut inter = 0.0;
    for mv in cur_moves {
        if let Some(j) = prev_moves.iter().position(|&other| other == mv) {
            prev_moves.swap_remove(j);
            inter += 1.0;
        }
    }
    jaccard(inter, uni - inter)
}

fn rec_legal_moves<R: Rules>(rules: &R, cur: &R::Position, prev: &R::Position) -> f64 {
    let mut cur_moves = rules.legal_moves(cur);
    let mut prev_moves = rules.legal_moves(prev);
    let uni = (cur_moves.len() + prev_moves.len()) as f64;

    // Eliminate exact matches by descending index so removal never shifts
    // an index still to be visited.
    let mut inter = 0.0;
    let mut i = cur_moves.len();
    while i > 0 {
        i -= 1;
        if let Some(j) = prev_moves.iter().rposition(|&other| other == cur_moves[i]) {
            cur_moves.remove(i);
            prev_moves.remove(j);
            inter += 1.0;
        }
    }

    let accepted = accept_mismatches(rules, cur, prev, &cur_moves, &prev_moves, SimMethod::LegalMoves);
    jaccard(inter + accepted, uni - inter - accepted)
}

fn expandable_states<R: Rules>(rules: &R, cur: &R::Position, prev: &R::Position) -> f64 {
    let cur_moves = rules.legal_moves(cur);
    let mut prev_moves = rules.legal_moves(prev);
    let uni = (cur_moves.len() + prev_moves.len()) as f64;

    let mut inter = 0.0;
    for mv in cur_moves {
        let key = rules.key(&rules.apply(cur, mv));
        if let Some(j) = prev_moves
            .iter()
            .position(|&other| rules.key(&rules.apply(prev, other)) == key)
        {
            prev_moves.remove(j);
            inter += 1.0;
        }
    }
    jaccard(inter, uni - inter)
}

fn rec_expandable_states<R: Rules>(rules: &R, cur: &R::Position, prev: &R::Position) -> f64 {
    let mut cur_moves = rules.legal_moves(cur);
    let mut prev_moves = rules.legal_moves(prev);
    let uni = (cur_moves.len() + prev_moves.len()) as f64;

    let mut inter = 0.0;
    let mut i = cur_moves.len();
    while i > 0 {
        if prev_moves.is_empty() {
            break;
        }
        i -= 1;
        let key = rules.key(&rules.apply(cur, cur_moves[i]));
        if let Some(j) = prev_moves
            .iter()
            .rposition(|&other| rules.key(&rules.apply(prev, other)) == key)
        {
            cur_moves.remove(i);
            prev_moves.remove(j);
            inter += 1.0;
        }
    }

    let accepted = accept_mismatches(
        rules,
        cur,
        prev,
        &cur_moves,
        &prev_moves,
        SimMethod::ExpandableStates,
    );
    jaccard(inter + accepted, uni - inter - accepted)
}

/// Compare mismatched move pairs one ply deeper: a pair whose child
/// positions share a key, or whose child positions score above
/// [`ACC_THRESHOLD`] under `method`, earns [`REC_INCREMENT`] extra
/// intersection credit.
fn accept_mismatches<R: Rules>(
    rules: &R,
    cur: &R::Position,
    prev: &R::Position,
    cur_moves: &[R::Action],
    prev_moves: &[R::Action],
    method: SimMethod,
) -> f64 {
    let mut accepted = 0.0;
    for &m1 in cur_moves {
        let p1 = rules.apply(cur, m1);
        let k1 = rules.key(&p1);
        for &m2 in prev_moves {
            let p2 = rules.apply(prev, m2);
            if rules.key(&p2) == k1 {
                accepted += REC_INCREMENT;
                break;
            }
            if similarity(method, rules, &p1, Some(&p2)) > ACC_THRESHOLD {
                accepted += REC_INCREMENT;
                break;
            }
        }
    }
    accepted
}
