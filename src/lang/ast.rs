//! Arena-backed abstract syntax tree for SADL programs.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`], so
//! cloning a whole tree is a couple of `memcpy`s and parent links survive
//! the clone. The genetic operators lean on this: they clone a tree,
//! splice a subtree in place, and recompile the result.

use std::fmt;

/// Index of a node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Syntactic category of an AST atom or list head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstKind {
    /// Identifier or operator.
    Symbol,
    /// Quoted string.
    Name,
    /// Numeric literal.
    Number,
}

#[derive(Debug, Clone)]
struct AstNode {
    value: String,
    kind: AstKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A SADL syntax tree.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: NodeId,
}

/// Tags whose children print one per line.
const BLOCK_TAGS: &[&str] = &[
    "SearchAlgorithm",
    "Selection",
    "Evaluation",
    "Backpropagation",
    "FinalMoveSelection",
    "Condition",
];

impl Ast {
    /// Creates a tree holding a single root node.
    #[must_use]
    pub fn new(value: impl Into<String>, kind: AstKind) -> Self {
        Self {
            nodes: vec![AstNode {
                value: value.into(),
                kind,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Appends a new child under `parent` and returns its id.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        value: impl Into<String>,
        kind: AstKind,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode {
            value: value.into(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// The node's text.
    #[must_use]
    pub fn value(&self, id: NodeId) -> &str {
        &self.nodes[id.0].value
    }

    /// The node's syntactic kind.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> AstKind {
        self.nodes[id.0].kind
    }

    /// Rewrites the node's text in place.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.nodes[id.0].value = value.into();
    }

    /// The node's children, in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The `i`-th child, if present.
    #[must_use]
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.nodes[id.0].children.get(i).copied()
    }

    /// The node's parent, `None` at the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// All live node ids in preorder. Nodes orphaned by [`Ast::replace`]
    /// are not visited.
    #[must_use]
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &c in self.nodes[id.0].children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ids().len()
    }

    /// Extracts the subtree rooted at `id` into a fresh tree.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Ast {
        let mut out = Ast::new(self.value(id).to_owned(), self.kind(id));
        out.graft_children(self, id, out.root);
        out
    }

    fn graft_children(&mut self, src: &Ast, src_id: NodeId, dst: NodeId) {
        for &c in src.children(src_id) {
            let new = self.add_child(dst, src.value(c).to_owned(), src.kind(c));
            self.graft_children(src, c, new);
        }
    }

    /// Replaces the subtree at `at` with a copy of `replacement`. The old
    /// subtree's nodes become unreachable garbage in the arena; trees are
    /// small and short-lived, so they are never compacted.
    pub fn replace(&mut self, at: NodeId, replacement: &Ast) {
        match self.parent(at) {
            None => *self = replacement.clone(),
            Some(parent) => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(AstNode {
                    value: replacement.value(replacement.root).to_owned(),
                    kind: replacement.kind(replacement.root),
                    parent: Some(parent),
                    children: Vec::new(),
                });
                self.graft_children(replacement, replacement.root, id);
                let slot = self.nodes[parent.0]
                    .children
                    .iter()
                    .position(|&c| c == at);
                if let Some(i) = slot {
                    self.nodes[parent.0].children[i] = id;
                }
                self.nodes[at.0].parent = None;
            }
        }
    }

    /// Structural equality of two subtrees (value, kind, and shape).
    #[must_use]
    pub fn structurally_eq(&self, a: NodeId, other: &Ast, b: NodeId) -> bool {
        if self.value(a) != other.value(b) || self.kind(a) != other.kind(b) {
            return false;
        }
        let ca = self.children(a);
        let cb = other.children(b);
        ca.len() == cb.len()
            && ca
                .iter()
                .zip(cb.iter())
                .all(|(&x, &y)| self.structurally_eq(x, other, y))
    }

    /// The algorithm's quoted display name, empty if absent.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.children(self.root)
            .iter()
            .find(|&&c| self.kind(c) == AstKind::Name)
            .map_or("", |&c| self.value(c))
    }

    /// Rewrites the algorithm's quoted display name.
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        let slot = self
            .children(self.root)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == AstKind::Name);
        match slot {
            Some(c) => self.set_value(c, name),
            None => {
                // insert as the first child
                let id = NodeId(self.nodes.len());
                self.nodes.push(AstNode {
                    value: name.into(),
                    kind: AstKind::Name,
                    parent: Some(self.root),
                    children: Vec::new(),
                });
                self.nodes[self.root.0].children.insert(0, id);
            }
        }
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        indent: usize,
    ) -> fmt::Result {
        let node = &self.nodes[id.0];
        if node.children.is_empty() {
            return match node.kind {
                AstKind::Name => write!(f, "\"{}\"", node.value),
                _ => write!(f, "{}", node.value),
            };
        }
        write!(f, "({}", node.value)?;
        if BLOCK_TAGS.contains(&node.value.as_str()) {
            for &c in &node.children {
                writeln!(f)?;
                for _ in 0..indent + 2 {
                    write!(f, " ")?;
                }
                self.write_node(f, c, indent + 2)?;
            }
        } else {
            for &c in &node.children {
                write!(f, " ")?;
                self.write_node(f, c, indent)?;
            }
        }
        write!(f, ")")
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Ast {
        let mut t = Ast::new("SearchAlgorithm", AstKind::Symbol);
        t.add_child(t.root(), "Tiny", AstKind::Name);
        let def = t.add_child(t.root(), "Define", AstKind::Symbol);
        t.add_child(def, "C", AstKind::Symbol);
        t.add_child(def, "0.6", AstKind::Number);
        t
    }

    #[test]
    fn parent_links_survive_clone() {
        let t = tiny();
        let c = t.clone();
        for id in c.ids() {
            if id != c.root() {
                assert!(c.parent(id).is_some());
            }
        }
        assert_eq!(c.display_name(), "Tiny");
    }

    #[test]
    fn replace_swaps_exactly_one_subtree() {
        let mut t = tiny();
        let def = t.children(t.root())[1];
        let lit = t.children(def)[1];
        let two = Ast::new("2", AstKind::Number);
        t.replace(lit, &two);
        let def = t.children(t.root())[1];
        assert_eq!(t.value(t.children(def)[1]), "2");
        assert_eq!(t.node_count(), 5);
    }

    #[test]
    fn subtree_extraction_is_deep() {
        let t = tiny();
        let def = t.children(t.root())[1];
        let sub = t.subtree(def);
        assert!(sub.structurally_eq(sub.root(), &t, def));
        assert_eq!(sub.node_count(), 3);
    }

    #[test]
    fn block_tags_print_one_child_per_line() {
        let t = tiny();
        let text = t.to_string();
        assert!(text.starts_with("(SearchAlgorithm\n  \"Tiny\"\n  (Define C 0.6)"));
    }
}
