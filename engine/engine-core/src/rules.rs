//! The rules-adapter trait: everything the search needs from a game.
//!
//! A `Rules` implementation owns the board representation, move generation
//! and the static knowledge about a game (evaluation, exchange scoring,
//! terminal and trap predicates). The search clones positions rather than
//! mutating shared instances; positions are therefore required to be
//! `Clone`, and the three application paths mirror how the search uses
//! them:
//!
//! - [`Rules::apply`] clones and applies, for one-ply lookahead on a
//!   position the caller wants to keep;
//! - [`Rules::play`] applies in place without recording undo state, used
//!   when replaying a move chain onto a scratch clone;
//! - [`Rules::play_undoable`] / [`Rules::undo`] bracket a speculative move
//!   with stack-based undo, used for short probes inside a playout.

use crate::types::{Color, PieceKind};
use crate::value::Value;

/// Static evaluation result: score from the side to move's perspective plus
/// an uncertainty margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub value: Value,
    pub margin: Value,
}

/// Main trait for game implementations consumed by the search.
///
/// # Contract
///
/// - `legal_moves` returns a deterministic, stable ordering for a given
///   position; the search relies on it for reproducible expansion.
/// - `key` returns a Zobrist-style hash; 0 is reserved for invalid
///   positions (in particular, failed [`Rules::parse_fen`] results).
/// - `trap_moves` enumerates the moves from a position whose destination
///   triggers the trap predicate.
pub trait Rules {
    /// Board state. Cloned freely by the search; `Clone` should be cheap
    /// relative to a playout.
    type Position: Clone;

    /// Move identifier, comparable for equality.
    type Action: Copy + PartialEq + Eq + std::fmt::Debug;

    /// The game's starting position.
    fn startpos(&self) -> Self::Position;

    /// Parse a FEN-style position string. On failure the returned position
    /// must report a `key` of 0.
    fn parse_fen(&self, fen: &str) -> Self::Position;

    /// All legal moves, in a deterministic order.
    fn legal_moves(&self, pos: &Self::Position) -> Vec<Self::Action>;

    /// Clone `pos` and apply `mv` to the clone.
    fn apply(&self, pos: &Self::Position, mv: Self::Action) -> Self::Position {
        let mut next = pos.clone();
        self.play(&mut next, mv);
        next
    }

    /// Apply `mv` in place without recording undo state.
    fn play(&self, pos: &mut Self::Position, mv: Self::Action);

    /// Apply `mv` in place, recording enough state for [`Rules::undo`].
    fn play_undoable(&self, pos: &mut Self::Position, mv: Self::Action);

    /// Revert the most recent [`Rules::play_undoable`] application of `mv`.
    fn undo(&self, pos: &mut Self::Position, mv: Self::Action);

    /// Static evaluation from the side to move's perspective.
    fn evaluate(&self, pos: &Self::Position) -> Evaluation;

    /// Static exchange evaluation of `mv`.
    fn see(&self, pos: &Self::Position, mv: Self::Action) -> Value;

    /// Whether `mv` gives check (or, for games without check, threatens an
    /// immediate win); used to pre-filter the decisive-move scan.
    fn gives_check(&self, pos: &Self::Position, mv: Self::Action) -> bool;

    /// Drawn position (repetition, move-count horizon, ...). Stalemates are
    /// detected separately through an empty move list.
    fn is_draw(&self, pos: &Self::Position) -> bool;

    /// The side to move has been mated.
    fn is_mate(&self, pos: &Self::Position) -> bool;

    /// The side to move is caught in a short-horizon forced loss.
    fn is_trap(&self, pos: &Self::Position) -> bool;

    /// Zobrist-style position key; 0 means invalid.
    fn key(&self, pos: &Self::Position) -> u64;

    fn side_to_move(&self, pos: &Self::Position) -> Color;

    /// Plies played since the game's starting position.
    fn ply(&self, pos: &Self::Position) -> u32;

    /// Number of pieces of `kind` owned by `side`.
    fn piece_count(&self, pos: &Self::Position, side: Color, kind: PieceKind) -> u32;

    /// Moves whose destination position satisfies [`Rules::is_trap`].
    fn trap_moves(&self, pos: &Self::Position) -> Vec<Self::Action>;

    /// Move in UCI-style coordinate text.
    fn format_move(&self, mv: Self::Action) -> String;

    /// Inverse of [`Rules::format_move`], resolved against the legal moves
    /// of `pos`.
    fn parse_move(&self, pos: &Self::Position, text: &str) -> Option<Self::Action> {
        self.legal_moves(pos)
            .into_iter()
            .find(|&mv| self.format_move(mv) == text)
    }
}
