//! The abstract search tree and its game-backed arena implementation.

use std::collections::HashMap;

use crate::game::{Game, Seat};

/// Well-known node attribute names. Programs may invent their own; these
/// are the ones every fresh node is seeded with or that the driver reads.
pub mod attrs {
    /// Times backpropagation has passed through the node.
    pub const VISIT_COUNT: &str = "visitCount";
    /// Running value estimate maintained by the program.
    pub const VALUE_ESTIMATE: &str = "valueEstimate";
    /// Proof number (0 = proven win for the searcher).
    pub const PROOF_NUMBER: &str = "proofNumber";
    /// Disproof number (0 = proven loss for the searcher).
    pub const DISPROOF_NUMBER: &str = "disproofNumber";
    /// 0.0 at OR/max nodes, 1.0 at AND/min nodes.
    pub const NODE_TYPE: &str = "nodeType";
}

/// Identifies one search invocation; useful when log lines from concurrent
/// searches interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchId(pub u64);

/// Index of a node inside a search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(usize);

/// What the expression evaluator needs from a search tree: structure,
/// depth, and a per-node numeric attribute table.
pub trait SearchTree {
    /// The root node.
    fn root(&self) -> NodeIndex;
    /// Parent of `node`, `None` at the root.
    fn parent(&self, node: NodeIndex) -> Option<NodeIndex>;
    /// Children of `node`, in insertion order.
    fn children(&self, node: NodeIndex) -> &[NodeIndex];
    /// Depth of `node`; the root has depth 0.
    fn depth(&self, node: NodeIndex) -> usize;
    /// Whether the attribute is set on `node`.
    fn has_attr(&self, node: NodeIndex, key: &str) -> bool;
    /// Attribute value, 0.0 when unset.
    fn attr(&self, node: NodeIndex, key: &str) -> f64;
    /// Sets an attribute on `node`.
    fn set_attr(&mut self, node: NodeIndex, key: &str, value: f64);
    /// Drops the node's children (solved-subtree pruning).
    fn discard_children(&mut self, node: NodeIndex);
    /// The seat the search is played for.
    fn seat(&self) -> Seat;
    /// This search invocation's id.
    fn search_id(&self) -> SearchId;
}

#[derive(Debug, Clone)]
struct TreeNode<G: Game> {
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    depth: usize,
    attrs: HashMap<String, f64>,
    state: G::State,
    action: Option<G::Action>,
}

/// Arena-backed search tree over a [`Game`]'s states.
#[derive(Debug)]
pub struct GameTree<G: Game> {
    nodes: Vec<TreeNode<G>>,
    seat: Seat,
    id: SearchId,
}

impl<G: Game> GameTree<G> {
    /// Builds a tree whose root holds `state`, searched on behalf of
    /// `seat`.
    #[must_use]
    pub fn new(game: &G, state: G::State, seat: Seat, id: SearchId) -> Self {
        let mut tree = Self { nodes: Vec::new(), seat, id };
        tree.push_node(game, None, state, None);
        tree
    }

    /// Adds a child of `parent` reached by `action`, seeding the standard
    /// attributes.
    pub fn add_child(
        &mut self,
        game: &G,
        parent: NodeIndex,
        state: G::State,
        action: G::Action,
    ) -> NodeIndex {
        self.push_node(game, Some(parent), state, Some(action))
    }

    fn push_node(
        &mut self,
        game: &G,
        parent: Option<NodeIndex>,
        state: G::State,
        action: Option<G::Action>,
    ) -> NodeIndex {
        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);
        let node_type = if game.mover(&state) == self.seat { 0.0 } else { 1.0 };
        let mut table = HashMap::with_capacity(5);
        table.insert(attrs::VISIT_COUNT.to_owned(), 0.0);
        table.insert(attrs::VALUE_ESTIMATE.to_owned(), 0.0);
        table.insert(attrs::PROOF_NUMBER.to_owned(), 1.0);
        table.insert(attrs::DISPROOF_NUMBER.to_owned(), 1.0);
        table.insert(attrs::NODE_TYPE.to_owned(), node_type);

        let id = NodeIndex(self.nodes.len());
        self.nodes.push(TreeNode {
            parent,
            children: Vec::new(),
            depth,
            attrs: table,
            state,
            action,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    /// The game state at `node`.
    #[must_use]
    pub fn state(&self, node: NodeIndex) -> &G::State {
        &self.nodes[node.0].state
    }

    /// The action that led to `node`, `None` at the root.
    #[must_use]
    pub fn action(&self, node: NodeIndex) -> Option<&G::Action> {
        self.nodes[node.0].action.as_ref()
    }

    /// Total nodes ever allocated (pruned ones included).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<G: Game> SearchTree for GameTree<G> {
    fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.nodes[node.0].children
    }

    fn depth(&self, node: NodeIndex) -> usize {
        self.nodes[node.0].depth
    }

    fn has_attr(&self, node: NodeIndex, key: &str) -> bool {
        self.nodes[node.0].attrs.contains_key(key)
    }

    fn attr(&self, node: NodeIndex, key: &str) -> f64 {
        self.nodes[node.0].attrs.get(key).copied().unwrap_or(0.0)
    }

    fn set_attr(&mut self, node: NodeIndex, key: &str, value: f64) {
        self.nodes[node.0].attrs.insert(key.to_owned(), value);
    }

    fn discard_children(&mut self, node: NodeIndex) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for c in children {
            self.nodes[c.0].parent = None;
        }
    }

    fn seat(&self) -> Seat {
        self.seat
    }

    fn search_id(&self) -> SearchId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TicTacToe;

    fn fresh_tree() -> GameTree<TicTacToe> {
        let game = TicTacToe;
        GameTree::new(&game, game.initial_state(), 0, SearchId(1))
    }

    #[test]
    fn root_is_seeded_with_standard_attrs() {
        let tree = fresh_tree();
        let root = tree.root();
        assert_eq!(tree.attr(root, attrs::VISIT_COUNT), 0.0);
        assert_eq!(tree.attr(root, attrs::PROOF_NUMBER), 1.0);
        assert_eq!(tree.attr(root, attrs::DISPROOF_NUMBER), 1.0);
        assert_eq!(tree.attr(root, attrs::NODE_TYPE), 0.0);
        assert_eq!(tree.depth(root), 0);
    }

    #[test]
    fn children_flip_node_type() {
        let game = TicTacToe;
        let mut tree = fresh_tree();
        let root = tree.root();
        let next = game.apply(tree.state(root), &4);
        let child = tree.add_child(&game, root, next, 4);
        assert_eq!(tree.attr(child, attrs::NODE_TYPE), 1.0);
        assert_eq!(tree.depth(child), 1);
        assert_eq!(tree.parent(child), Some(root));
        assert_eq!(tree.action(child), Some(&4));
    }

    #[test]
    fn discard_children_empties_the_list() {
        let game = TicTacToe;
        let mut tree = fresh_tree();
        let root = tree.root();
        let next = game.apply(tree.state(root), &0);
        tree.add_child(&game, root, next, 0);
        assert_eq!(tree.children(root).len(), 1);
        tree.discard_children(root);
        assert!(tree.children(root).is_empty());
    }
}
