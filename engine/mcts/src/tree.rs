//! Search tree with arena allocation.
//!
//! Nodes live in a contiguous `Vec` and refer to each other through
//! `NodeId` indices; dropping the tree drops every node. A node's position
//! is never stored; it is recovered by cloning the search root and
//! replaying the move chain, which keeps nodes small at the cost of
//! O(depth) work per visit.

use engine_core::{
    black_wins, clamp_proven, white_wins, Color, Rules, Value, BLACK_MATES, WHITE_MATES,
};

use crate::node::{Node, NodeId, NodeValue, Outcome};

/// UCT exploration numerator: `sqrt(2 ln N / n)`.
const EXPLORATION: f64 = 2.0;

/// Weight of the heuristic-score tie-breaker in the selection formula.
const HEURISTIC_WEIGHT: f64 = 0.001;

/// Arena-backed search tree over one root position.
#[derive(Debug)]
pub struct SearchTree<R: Rules> {
    nodes: Vec<Node<R::Action>>,
    root: NodeId,
}

impl<R: Rules> SearchTree<R> {
    /// Create a tree holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new_root()],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<R::Action> {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<R::Action> {
        &mut self.nodes[id.0 as usize]
    }

    /// Total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a child of `parent` for `mv` and link it.
    pub fn add_child(&mut self, parent: NodeId, mv: R::Action, heuristic_score: Value) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new_child(parent, mv, heuristic_score));
        self.get_mut(parent).children.push(id);
        id
    }

    /// The move sequence leading from the root to `id`, in play order.
    pub fn moves_from_root(&self, id: NodeId) -> Vec<R::Action> {
        let mut moves = Vec::new();
        let mut cur = id;
        while cur != self.root {
            let node = self.get(cur);
            if let Some(mv) = node.last_move {
                moves.push(mv);
            }
            cur = node.parent;
        }
        moves.reverse();
        moves
    }

    /// Recover the position at `id` by replaying its move chain onto a
    /// clone of the search root.
    pub fn position_at(&self, id: NodeId, rules: &R, root_pos: &R::Position) -> R::Position {
        let mut pos = root_pos.clone();
        for mv in self.moves_from_root(id) {
            rules.play(&mut pos, mv);
        }
        pos
    }

    /// Side to move at `id`, derived from the root side and path parity.
    pub fn side_at(&self, id: NodeId, rules: &R, root_pos: &R::Position) -> Color {
        let mut side = rules.side_to_move(root_pos);
        if self.moves_from_root(id).len() % 2 == 1 {
            side = side.opponent();
        }
        side
    }

    /// UCT descent from `from`.
    ///
    /// Stops at the first node that still has unexplored legal moves
    /// (unknown `max_moves`, or fewer children than moves) or that has no
    /// children at all; otherwise steps into the child maximising
    ///
    /// ```text
    /// winrate + sqrt(2 ln parent.visits / child.visits)
    ///         + 0.001 * heuristic_score / child.visits
    /// ```
    ///
    /// where `winrate` is always taken from White's perspective. The first
    /// child reaching the best value wins ties; an unvisited child is
    /// preferred unconditionally.
    pub fn select(&self, from: NodeId, rules: &R, root_pos: &R::Position) -> NodeId {
        let mut cur = from;
        let mut white_to_move = self.side_at(from, rules, root_pos).is_white();

        loop {
            let node = self.get(cur);
            if node.children.is_empty() {
                return cur;
            }
            match node.max_moves {
                None => return cur,
                Some(max) if node.children.len() < max => return cur,
                Some(_) => {}
            }

            let mut chosen = node.children[0];
            let mut best = f64::NEG_INFINITY;
            for &child_id in &node.children {
                let child = self.get(child_id);
                let uct = if child.visits == 0 {
                    f64::INFINITY
                } else {
                    let visits = child.visits as f64;
                    let mut winrate = child.total() / visits;
                    if !white_to_move {
                        winrate = 1.0 - winrate;
                    }
                    winrate
                        + (EXPLORATION * (node.visits as f64).ln() / visits).sqrt()
                        + HEURISTIC_WEIGHT * (child.heuristic_score as f64 / visits)
                };
                if uct > best {
                    best = uct;
                    chosen = child_id;
                }
            }

            white_to_move = !white_to_move;
            cur = chosen;
        }
    }

    /// Expand the next unexplored move of `id`.
    ///
    /// Terminal positions (draw or mate) are returned unchanged, as is a
    /// fully expanded node. `max_moves` is learned on the first expansion
    /// rather than at node creation to avoid a move generation per
    /// allocated node. Children are created in legal-move order, so
    /// `children[i].last_move == legal_moves(pos)[i]`.
    pub fn expand(&mut self, id: NodeId, rules: &R, root_pos: &R::Position) -> NodeId {
        let mut pos = self.position_at(id, rules, root_pos);
        if rules.is_draw(&pos) || rules.is_mate(&pos) {
            return id;
        }

        let moves = rules.legal_moves(&pos);
        let node = self.get_mut(id);
        if node.max_moves.is_none() {
            node.max_moves = Some(moves.len());
        }
        let next = node.children.len();
        if next >= moves.len() || Some(next) >= node.max_moves {
            return id;
        }

        let mv = moves[next];
        rules.play(&mut pos, mv);
        let heuristic_score = -rules.evaluate(&pos).value;
        self.add_child(id, mv, heuristic_score)
    }

    /// Record a playout outcome at `id` and propagate it to the root.
    pub fn update(&mut self, id: NodeId, outcome: Outcome, rules: &R, root_pos: &R::Position) {
        match outcome {
            Outcome::Score(score) => self.normal_update(id, score),
            Outcome::Proven(value) => {
                let white_to_move = self.side_at(id, rules, root_pos).is_white();
                self.proven_update(id, value, white_to_move);
            }
        }
    }

    /// Ordinary update: add `score` to every statistical ancestor, count
    /// the visit everywhere. Proven nodes keep their value untouched.
    pub fn normal_update(&mut self, id: NodeId, score: f64) {
        let mut cur = id;
        loop {
            let node = self.get_mut(cur);
            if let NodeValue::Statistical { sum } = &mut node.value {
                *sum += score;
            }
            node.visits += 1;
            if node.parent.is_none() {
                break;
            }
            cur = node.parent;
        }
    }

    /// Proven update: install an exact mate-distance value at `id` and
    /// propagate it with minimax semantics.
    ///
    /// `white_to_move` is the side to move at `id`. A node already holding
    /// a strictly better proven value for its side keeps it. If the side to
    /// move at `id` is the proven loser, the parent is proven winning for
    /// the opposite side and the value travels up unchanged. If the side to
    /// move is the proven winner, the parent is proven losing only once all
    /// its children are proven for the same winner and it is fully
    /// expanded; the propagated value is then the farthest mate among the
    /// children stepped one ply away from the mate. Otherwise the parent
    /// chain receives an ordinary 1 (White winning) or 0 (Black winning).
    pub fn proven_update(&mut self, id: NodeId, value: Value, white_to_move: bool) {
        {
            let node = self.get_mut(id);
            node.visits += 1;
            let keep_current = match node.value {
                NodeValue::Proven(current) => {
                    (white_to_move && white_wins(value) && current > value)
                        || (!white_to_move && black_wins(value) && current < value)
                }
                NodeValue::Statistical { .. } => false,
            };
            if !keep_current {
                node.value = NodeValue::Proven(value);
            }
        }

        let parent = self.get(id).parent;
        if parent.is_none() {
            return;
        }

        // The side to move here is proven losing: the parent is proven
        // winning for the opposite side.
        if (!white_to_move && white_wins(value)) || (white_to_move && black_wins(value)) {
            self.proven_update(parent, value, !white_to_move);
            return;
        }

        // This node is proven winning for its side to move. The parent is
        // proven losing only if every sibling is proven for the same
        // winner and no legal move remains unexpanded.
        let mut farthest = if black_wins(value) {
            BLACK_MATES
        } else {
            WHITE_MATES
        };
        let parent_node = self.get(parent);
        let mut parent_known_loss = parent_node.fully_expanded();
        if parent_known_loss {
            for &child_id in &parent_node.children {
                match self.get(child_id).value {
                    NodeValue::Proven(child_value)
                        if (white_wins(value) && white_wins(child_value))
                            || (black_wins(value) && black_wins(child_value)) =>
                    {
                        if child_value.abs() < farthest.abs() {
                            farthest = child_value;
                        }
                    }
                    _ => {
                        parent_known_loss = false;
                        break;
                    }
                }
            }
        }

        if parent_known_loss {
            // One more ply to mate at the parent.
            let stepped = if white_to_move {
                clamp_proven(farthest - 1)
            } else {
                clamp_proven(farthest + 1)
            };
            self.proven_update(parent, stepped, !white_to_move);
        } else if white_wins(value) {
            self.normal_update(parent, 1.0);
        } else {
            self.normal_update(parent, 0.0);
        }
    }

    /// The most visited child, ties going to the earliest expanded.
    pub fn best_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<NodeId> = None;
        let mut best_visits = 0u32;
        for &child_id in &node.children {
            let visits = self.get(child_id).visits;
            if best.is_none() || visits > best_visits {
                best = Some(child_id);
                best_visits = visits;
            }
        }
        best
    }

    /// Greedy most-visited chain starting at `id`, as moves.
    pub fn principal_variation(&self, id: NodeId) -> Vec<R::Action> {
        let mut moves = Vec::new();
        if let Some(mv) = self.get(id).last_move {
            moves.push(mv);
        }
        let mut cur = id;
        while let Some(next) = self.best_child(cur) {
            if let Some(mv) = self.get(next).last_move {
                moves.push(mv);
            }
            cur = next;
        }
        moves
    }

    /// Root children sorted by descending visit count (stable).
    pub fn sorted_root_children(&self) -> Vec<NodeId> {
        let mut children = self.get(self.root).children.clone();
        children.sort_by_key(|&id| std::cmp::Reverse(self.get(id).visits));
        children
    }
}

impl<R: Rules> Default for SearchTree<R> {
    fn default() -> Self {
        Self::new()
    }
}
