//! Trap-aware Monte Carlo tree search for the ambush engine.
//!
//! This crate is game-agnostic: it searches anything that implements the
//! `engine_core::Rules` trait. Each search iteration runs two rounds of
//! UCT selection and expansion, a heuristic playout from the deeper
//! frontier and a backpropagation step that distinguishes statistical
//! scores from proven mate-distance values.
//!
//! # Overview
//!
//! 1. **Selection**: descend through fully expanded nodes by the UCT
//!    formula, always scored from White's perspective
//! 2. **Expansion**: append the next unexplored legal move as a child,
//!    in move-generation order
//! 3. **Playout**: play to a terminal state with a policy that prefers
//!    decisive moves and good captures, terminating early on remembered
//!    trap positions with probability equal to the root similarity
//! 4. **Backpropagation**: add playout scores to statistical nodes;
//!    install and propagate exact values with minimax semantics once a
//!    mate is observed
//!
//! Across searches the engine keeps, per side, the previously searched
//! root position. A similarity measure between that snapshot and the new
//! root modulates how much the remembered trap moves are trusted.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Searcher                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │ SearchTree  │  │   Rules     │  │   TrapMemory    │  │
//! │  │  (arena)    │  │ (adapter)   │  │  (per side)     │  │
//! │  └──────┬──────┘  └──────┬──────┘  └────────┬────────┘  │
//! │         │                │                  │           │
//! │         ▼                ▼                  ▼           │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │   select → expand → select → expand → simulate →  │  │
//! │  │                 update, poll every 1000           │  │
//! │  └───────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod node;
pub mod playout;
pub mod rng;
pub mod search;
pub mod similarity;
pub mod time;
pub mod trap;
pub mod tree;

// Re-export main types
pub use config::SearchConfig;
pub use node::{Node, NodeId, NodeValue, Outcome};
pub use rng::PlayoutRng;
pub use search::{
    uct, NoSignals, SearchReport, SearchSignal, Searcher, SignalSource, POLL_INTERVAL,
};
pub use similarity::{
    similarity, similarity_fen, SimMethod, ACC_THRESHOLD, CONST_SIM, DEFAULT_SIM, INVALID_FEN,
    REC_INCREMENT,
};
pub use time::{SearchLimits, TimeControl};
pub use trap::TrapMemory;
pub use tree::SearchTree;
