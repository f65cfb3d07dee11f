//! Search tree node representation.
//!
//! Each node represents the position reached by playing a move from its
//! parent. A node never stores the position itself (it is recovered by
//! replaying the move chain from the search root), so a node stays small:
//! statistics, the incoming move and the child list.

use engine_core::Value;

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// Accumulated node value: a running sum of playout scores until the node
/// is resolved, an exact mate-distance value afterwards.
///
/// Keeping the two regimes as variants makes the update rules explicit: an
/// ordinary playout never dilutes a proven value, and a proven value is
/// only replaced by a better proven value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeValue {
    Statistical { sum: f64 },
    Proven(Value),
}

impl NodeValue {
    /// True once the node holds an exact result.
    #[inline]
    pub fn is_proven(&self) -> bool {
        matches!(self, NodeValue::Proven(_))
    }
}

/// Result of a single playout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Ordinary game outcome in win-rate space, possibly scaled by the
    /// node's playout weight.
    Score(f64),
    /// Exact mate-distance result observed at the playout's start position.
    Proven(Value),
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node<M> {
    /// Parent node index (NONE for the root).
    pub parent: NodeId,

    /// Move that led to this node from the parent (None at the root).
    pub last_move: Option<M>,

    /// Children in expansion order. Expansion order equals legal-move
    /// order, so `children[i]` corresponds to `legal_moves(pos)[i]`.
    pub children: Vec<NodeId>,

    /// Legal-move count at this node's position, learned on first
    /// expansion. `None` means not yet generated.
    pub max_moves: Option<usize>,

    /// Number of times this node has been updated.
    pub visits: u32,

    /// Aggregated value, statistical or proven.
    pub value: NodeValue,

    /// Negated static evaluation of this node's position at creation time,
    /// used as a first-visit tie-breaker in selection.
    pub heuristic_score: Value,

    /// Per-node playout weight, grown a little on every simulation run
    /// from this node.
    pub sim_counter: f64,
}

impl<M> Node<M> {
    /// Create the root node.
    pub fn new_root() -> Self {
        Self {
            parent: NodeId::NONE,
            last_move: None,
            children: Vec::new(),
            max_moves: None,
            visits: 0,
            value: NodeValue::Statistical { sum: 0.0 },
            heuristic_score: 0,
            sim_counter: 1.0,
        }
    }

    /// Create a child node for `last_move` with its creation-time score.
    pub fn new_child(parent: NodeId, last_move: M, heuristic_score: Value) -> Self {
        Self {
            parent,
            last_move: Some(last_move),
            children: Vec::new(),
            max_moves: None,
            visits: 0,
            value: NodeValue::Statistical { sum: 0.0 },
            heuristic_score,
            sim_counter: 1.0,
        }
    }

    /// The aggregate value as a plain number: the statistical sum, or the
    /// proven value itself. Dividing by `visits` yields either an ordinary
    /// win rate or a number far outside [0, 1] that steers selection
    /// straight toward (or away from) the proven line.
    #[inline]
    pub fn total(&self) -> f64 {
        match self.value {
            NodeValue::Statistical { sum } => sum,
            NodeValue::Proven(v) => v as f64,
        }
    }

    /// Whether every legal move at this node has a corresponding child.
    #[inline]
    pub fn fully_expanded(&self) -> bool {
        self.max_moves == Some(self.children.len())
    }
}
