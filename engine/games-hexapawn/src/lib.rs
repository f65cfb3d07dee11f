//! Hexapawn rules adapter for the ambush engine
//!
//! This crate provides a complete reference implementation of the
//! `engine_core::Rules` trait, small enough to reason about in tests yet
//! rich enough to exercise every part of the search contract: promotion
//! mates, blocked (stalemate-like) positions, draw horizons, captures with
//! exchange scores and short-horizon trap positions.
//!
//! # Rules
//!
//! Pawns fill each side's home rank. A pawn pushes one square straight
//! forward onto an empty square and captures one square diagonally forward.
//! Reaching the far rank wins immediately (the opponent is "mated"). Under
//! this adapter's conventions a side with no legal moves is stalemated, not
//! lost, and a configurable ply horizon declares long games drawn.
//!
//! Board sizes from 2x3 up to 8x8 are supported; the classic game is 3x3.

use engine_core::{Color, Evaluation, PieceKind, Rules, Value};
use once_cell::sync::Lazy;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

#[cfg(test)]
mod tests;

const EMPTY: u8 = 0;
const WHITE_PAWN: u8 = 1;
const BLACK_PAWN: u8 = 2;

/// Zobrist keys for up to an 8x8 board: one key per (side, square) plus a
/// side-to-move key. Generated once from a fixed seed so position keys are
/// stable across processes.
struct ZobristTable {
    squares: [[u64; 64]; 2],
    black_to_move: u64,
}

static ZOBRIST: Lazy<ZobristTable> = Lazy::new(|| {
    let mut rng = ChaCha20Rng::seed_from_u64(0x6865_7861_7061_776e);
    let mut squares = [[0u64; 64]; 2];
    for side in &mut squares {
        for key in side.iter_mut() {
            *key = rng.next_u64();
        }
    }
    ZobristTable {
        squares,
        black_to_move: rng.next_u64(),
    }
});

/// A pawn move: origin and destination square indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PawnMove {
    pub from: u8,
    pub to: u8,
}

#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: PawnMove,
    captured: u8,
}

/// Hexapawn board state.
///
/// Squares are indexed `rank * files + file` with rank 0 on White's side.
#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<u8>,
    side_to_move: Color,
    ply: u32,
    undo_stack: Vec<Undo>,
    valid: bool,
}

/// The hexapawn rules adapter.
///
/// Holds the board geometry and the draw horizon; positions produced by one
/// `Hexapawn` instance must only be used with that instance.
#[derive(Debug, Clone)]
pub struct Hexapawn {
    files: usize,
    ranks: usize,
    draw_horizon: u32,
}

impl Hexapawn {
    /// Board of `files` x `ranks` squares, draw horizon of 4 moves per
    /// square as a generous default.
    pub fn new(files: usize, ranks: usize) -> Self {
        assert!((2..=8).contains(&files), "files out of range");
        assert!((3..=8).contains(&ranks), "ranks out of range");
        Self {
            files,
            ranks,
            draw_horizon: (files * ranks * 4) as u32,
        }
    }

    /// The classic 3x3 game.
    pub fn standard() -> Self {
        Self::new(3, 3)
    }

    /// Override the ply count at which positions become drawn.
    pub fn with_draw_horizon(mut self, horizon: u32) -> Self {
        self.draw_horizon = horizon;
        self
    }

    pub fn files(&self) -> usize {
        self.files
    }

    pub fn ranks(&self) -> usize {
        self.ranks
    }

    fn square(&self, file: usize, rank: usize) -> usize {
        rank * self.files + file
    }

    fn file_of(&self, sq: usize) -> usize {
        sq % self.files
    }

    fn rank_of(&self, sq: usize) -> usize {
        sq / self.files
    }

    fn pawn_of(side: Color) -> u8 {
        match side {
            Color::White => WHITE_PAWN,
            Color::Black => BLACK_PAWN,
        }
    }

    fn promotion_rank(&self, side: Color) -> usize {
        match side {
            Color::White => self.ranks - 1,
            Color::Black => 0,
        }
    }

    /// Forward rank delta for `side`, as a signed step.
    fn forward(side: Color) -> isize {
        match side {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    fn moves_for(&self, pos: &Board, side: Color) -> Vec<PawnMove> {
        let own = Self::pawn_of(side);
        let enemy = Self::pawn_of(side.opponent());
        let step = Self::forward(side);
        let mut moves = Vec::new();

        for from in 0..self.files * self.ranks {
            if pos.cells[from] != own {
                continue;
            }
            let rank = self.rank_of(from) as isize + step;
            if rank < 0 || rank >= self.ranks as isize {
                continue;
            }
            let file = self.file_of(from);
            // Diagonal captures first, left before right, then the push:
            // a fixed order keeps move generation deterministic.
            if file > 0 {
                let to = self.square(file - 1, rank as usize);
                if pos.cells[to] == enemy {
                    moves.push(PawnMove {
                        from: from as u8,
                        to: to as u8,
                    });
                }
            }
            if file + 1 < self.files {
                let to = self.square(file + 1, rank as usize);
                if pos.cells[to] == enemy {
                    moves.push(PawnMove {
                        from: from as u8,
                        to: to as u8,
                    });
                }
            }
            let to = self.square(file, rank as usize);
            if pos.cells[to] == EMPTY {
                moves.push(PawnMove {
                    from: from as u8,
                    to: to as u8,
                });
            }
        }
        moves
    }

    /// True if `side` has a move onto its promotion rank.
    fn has_promoting_move(&self, pos: &Board, side: Color) -> bool {
        let target = self.promotion_rank(side);
        self.moves_for(pos, side)
            .iter()
            .any(|mv| self.rank_of(mv.to as usize) == target)
    }

    /// True if `attacker` has a pawn bearing on `sq`.
    fn attacked_by(&self, pos: &Board, sq: usize, attacker: Color) -> bool {
        let pawn = Self::pawn_of(attacker);
        // A pawn attacks diagonally forward, so look one rank behind `sq`
        // from the attacker's point of view.
        let origin_rank = self.rank_of(sq) as isize - Self::forward(attacker);
        if origin_rank < 0 || origin_rank >= self.ranks as isize {
            return false;
        }
        let file = self.file_of(sq);
        if file > 0 && pos.cells[self.square(file - 1, origin_rank as usize)] == pawn {
            return true;
        }
        if file + 1 < self.files && pos.cells[self.square(file + 1, origin_rank as usize)] == pawn {
            return true;
        }
        false
    }

    fn invalid_board(&self) -> Board {
        Board {
            cells: vec![EMPTY; self.files * self.ranks],
            side_to_move: Color::White,
            ply: 0,
            undo_stack: Vec::new(),
            valid: false,
        }
    }

    /// Render a position in the FEN-like `rows side [ply]` form.
    pub fn to_fen(&self, pos: &Board) -> String {
        let mut rows = Vec::with_capacity(self.ranks);
        for rank in (0..self.ranks).rev() {
            let mut row = String::new();
            let mut run = 0;
            for file in 0..self.files {
                match pos.cells[self.square(file, rank)] {
                    EMPTY => run += 1,
                    cell => {
                        if run > 0 {
                            row.push_str(&run.to_string());
                            run = 0;
                        }
                        row.push(if cell == WHITE_PAWN { 'P' } else { 'p' });
                    }
                }
            }
            if run > 0 {
                row.push_str(&run.to_string());
            }
            rows.push(row);
        }
        let side = if pos.side_to_move.is_white() { 'w' } else { 'b' };
        format!("{} {} {}", rows.join("/"), side, pos.ply)
    }
}

impl Rules for Hexapawn {
    type Position = Board;
    type Action = PawnMove;

    fn startpos(&self) -> Board {
        let mut cells = vec![EMPTY; self.files * self.ranks];
        for file in 0..self.files {
            cells[self.square(file, 0)] = WHITE_PAWN;
            cells[self.square(file, self.ranks - 1)] = BLACK_PAWN;
        }
        Board {
            cells,
            side_to_move: Color::White,
            ply: 0,
            undo_stack: Vec::new(),
            valid: true,
        }
    }

    fn parse_fen(&self, fen: &str) -> Board {
        let mut fields = fen.split_whitespace();
        let Some(rows) = fields.next() else {
            return self.invalid_board();
        };
        let Some(side) = fields.next() else {
            return self.invalid_board();
        };
        let ply = match fields.next() {
            Some(text) => match text.parse::<u32>() {
                Ok(ply) => ply,
                Err(_) => return self.invalid_board(),
            },
            None => 0,
        };

        let side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return self.invalid_board(),
        };

        let row_list: Vec<&str> = rows.split('/').collect();
        if row_list.len() != self.ranks {
            return self.invalid_board();
        }

        let mut cells = vec![EMPTY; self.files * self.ranks];
        for (i, row) in row_list.iter().enumerate() {
            let rank = self.ranks - 1 - i;
            let mut file = 0usize;
            for ch in row.chars() {
                match ch {
                    'P' | 'p' => {
                        if file >= self.files {
                            return self.invalid_board();
                        }
                        cells[self.square(file, rank)] =
                            if ch == 'P' { WHITE_PAWN } else { BLACK_PAWN };
                        file += 1;
                    }
                    '1'..='8' => file += ch as usize - '0' as usize,
                    _ => return self.invalid_board(),
                }
            }
            if file != self.files {
                return self.invalid_board();
            }
        }

        Board {
            cells,
            side_to_move,
            ply,
            undo_stack: Vec::new(),
            valid: true,
        }
    }

    fn legal_moves(&self, pos: &Board) -> Vec<PawnMove> {
        if !pos.valid || self.is_mate(pos) {
            return Vec::new();
        }
        self.moves_for(pos, pos.side_to_move)
    }

    fn play(&self, pos: &mut Board, mv: PawnMove) {
        pos.cells[mv.to as usize] = pos.cells[mv.from as usize];
        pos.cells[mv.from as usize] = EMPTY;
        pos.side_to_move = pos.side_to_move.opponent();
        pos.ply += 1;
    }

    fn play_undoable(&self, pos: &mut Board, mv: PawnMove) {
        let captured = pos.cells[mv.to as usize];
        pos.undo_stack.push(Undo { mv, captured });
        self.play(pos, mv);
    }

    fn undo(&self, pos: &mut Board, mv: PawnMove) {
        let undo = pos
            .undo_stack
            .pop()
            .filter(|u| u.mv == mv)
            .unwrap_or(Undo { mv, captured: EMPTY });
        pos.cells[mv.from as usize] = pos.cells[mv.to as usize];
        pos.cells[mv.to as usize] = undo.captured;
        pos.side_to_move = pos.side_to_move.opponent();
        pos.ply -= 1;
    }

    fn evaluate(&self, pos: &Board) -> Evaluation {
        let mut white = 0i32;
        let mut black = 0i32;
        for sq in 0..self.files * self.ranks {
            match pos.cells[sq] {
                WHITE_PAWN => white += 100 + 10 * self.rank_of(sq) as i32,
                BLACK_PAWN => black += 100 + 10 * (self.ranks - 1 - self.rank_of(sq)) as i32,
                _ => {}
            }
        }
        let white_view = white - black;
        let value = if pos.side_to_move.is_white() {
            white_view
        } else {
            -white_view
        };
        Evaluation { value, margin: 25 }
    }

    fn see(&self, pos: &Board, mv: PawnMove) -> Value {
        let mover = pos.side_to_move;
        let gain = if pos.cells[mv.to as usize] == Self::pawn_of(mover.opponent()) {
            100
        } else {
            0
        };
        let loss = if self.attacked_by(pos, mv.to as usize, mover.opponent()) {
            100
        } else {
            0
        };
        gain - loss
    }

    fn gives_check(&self, pos: &Board, mv: PawnMove) -> bool {
        self.rank_of(mv.to as usize) == self.promotion_rank(pos.side_to_move)
    }

    fn is_draw(&self, pos: &Board) -> bool {
        pos.valid && !self.is_mate(pos) && pos.ply >= self.draw_horizon
    }

    fn is_mate(&self, pos: &Board) -> bool {
        if !pos.valid {
            return false;
        }
        let opponent = pos.side_to_move.opponent();
        let pawn = Self::pawn_of(opponent);
        let rank = self.promotion_rank(opponent);
        (0..self.files).any(|file| pos.cells[self.square(file, rank)] == pawn)
    }

    fn is_trap(&self, pos: &Board) -> bool {
        if !pos.valid || self.is_mate(pos) || self.is_draw(pos) {
            return false;
        }
        // Every reply hands the opponent an immediate promotion; a position
        // with no replies at all counts as trapped (the mover is out of
        // useful options either way).
        let side = pos.side_to_move;
        self.legal_moves(pos).iter().all(|&mv| {
            let after = self.apply(pos, mv);
            self.has_promoting_move(&after, side.opponent())
        })
    }

    fn key(&self, pos: &Board) -> u64 {
        if !pos.valid {
            return 0;
        }
        let mut key = 0u64;
        for sq in 0..self.files * self.ranks {
            let wide = self.rank_of(sq) * 8 + self.file_of(sq);
            match pos.cells[sq] {
                WHITE_PAWN => key ^= ZOBRIST.squares[0][wide],
                BLACK_PAWN => key ^= ZOBRIST.squares[1][wide],
                _ => {}
            }
        }
        if pos.side_to_move == Color::Black {
            key ^= ZOBRIST.black_to_move;
        }
        if key == 0 {
            // Reserve 0 for invalid positions.
            0x9e37_79b9_7f4a_7c15
        } else {
            key
        }
    }

    fn side_to_move(&self, pos: &Board) -> Color {
        pos.side_to_move
    }

    fn ply(&self, pos: &Board) -> u32 {
        pos.ply
    }

    fn piece_count(&self, pos: &Board, side: Color, kind: PieceKind) -> u32 {
        if kind != PieceKind::Pawn {
            return 0;
        }
        let pawn = Self::pawn_of(side);
        pos.cells.iter().filter(|&&cell| cell == pawn).count() as u32
    }

    fn trap_moves(&self, pos: &Board) -> Vec<PawnMove> {
        self.legal_moves(pos)
            .into_iter()
            .filter(|&mv| self.is_trap(&self.apply(pos, mv)))
            .collect()
    }

    fn format_move(&self, mv: PawnMove) -> String {
        let mut text = String::with_capacity(4);
        for sq in [mv.from as usize, mv.to as usize] {
            text.push((b'a' + self.file_of(sq) as u8) as char);
            text.push((b'1' + self.rank_of(sq) as u8) as char);
        }
        text
    }
}
