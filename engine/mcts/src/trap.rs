//! Per-side memory of previously searched root positions.
//!
//! Between successive searches the engine remembers, for each side, the
//! last root position it searched on that side's turn together with the
//! trap-candidate moves enumerable from it. The next search on the same
//! side's turn measures its new root against the remembered one and weighs
//! the remembered traps by that similarity.

use engine_core::{Color, Rules};

struct Snapshot<R: Rules> {
    position: R::Position,
    trap_moves: Vec<R::Action>,
}

/// Two-slot store: one previously searched root per side.
pub struct TrapMemory<R: Rules> {
    white: Option<Snapshot<R>>,
    black: Option<Snapshot<R>>,
}

impl<R: Rules> TrapMemory<R> {
    pub fn new() -> Self {
        Self {
            white: None,
            black: None,
        }
    }

    fn slot(&self, side: Color) -> &Option<Snapshot<R>> {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// The remembered root for `side`, if any.
    pub fn reference(&self, side: Color) -> Option<&R::Position> {
        self.slot(side).as_ref().map(|snap| &snap.position)
    }

    /// Trap-candidate moves of the remembered root for `side`; empty when
    /// nothing is remembered.
    pub fn trap_moves(&self, side: Color) -> &[R::Action] {
        self.slot(side)
            .as_ref()
            .map(|snap| snap.trap_moves.as_slice())
            .unwrap_or(&[])
    }

    /// Store `pos` as the new remembered root for `side`, replacing any
    /// prior snapshot. The trap moves are enumerated once here so lookups
    /// during playouts stay cheap.
    pub fn remember(&mut self, rules: &R, side: Color, pos: &R::Position) {
        let snapshot = Snapshot {
            position: pos.clone(),
            trap_moves: rules.trap_moves(pos),
        };
        match side {
            Color::White => self.white = Some(snapshot),
            Color::Black => self.black = Some(snapshot),
        }
    }
}

impl<R: Rules> Default for TrapMemory<R> {
    fn default() -> Self {
        Self::new()
    }
}
