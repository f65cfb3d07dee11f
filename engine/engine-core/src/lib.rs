//! Core traits and types for the ambush search engine
//!
//! This crate defines the boundary between the search core and the game it
//! searches:
//! - `Rules`: the adapter trait a game implementation provides (move
//!   generation, move application, evaluation, terminal predicates, keys)
//! - `Value`: the centipawn/mate-distance scalar with its proven-win bands
//! - `Color` / `PieceKind`: the shared board vocabulary
//!
//! The search crates are generic over `Rules` and never look inside a
//! position; everything they need is expressed through this contract.

pub mod rules;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use rules::{Evaluation, Rules};
pub use types::{Color, PieceKind};
pub use value::{black_wins, clamp_proven, white_wins, Value, BLACK_MATES, MAX_PLY, WHITE_MATES};
