//! Arena-backed expression tree.

use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Index of a node inside its [`QueryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    RegexMatch,
    RegexNotMatch,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::RegexMatch => "=~",
            CompareOp::RegexNotMatch => "!~",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "string '{s}'"),
            Literal::Number(n) => write!(f, "number {n}"),
            Literal::Boolean(b) => write!(f, "boolean {b}"),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The root of every tree.
    Script,
    And,
    Or,
    Not,
    /// A subtree whose evaluation was deferred; treated as a negation marker.
    Delayed,
    /// A namespaced function call; children are the arguments in order.
    Function { namespace: String, name: String },
    /// A binary comparison; children are the two operands.
    Comparison(CompareOp),
    Identifier(String),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A read-only query expression tree.
///
/// Nodes live in a vector and refer to each other by [`NodeId`]. The root is
/// always a [`NodeKind::Script`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTree {
    nodes: Vec<Node>,
}

impl Default for QueryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTree {
    /// A tree holding only the script root.
    pub fn new() -> Self {
        QueryTree {
            nodes: vec![Node {
                kind: NodeKind::Script,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a node as the last child of `parent`.
    pub fn add_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Overwrite a node's parent link without touching any child list.
    ///
    /// Only useful for assembling unusual trees by hand.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.parent = parent;
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Function nodes in `namespace`, in creation order.
    pub fn functions<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = (NodeId, &'a str)> + 'a {
        self.nodes.iter().enumerate().filter_map(move |(i, node)| match &node.kind {
            NodeKind::Function { namespace: ns, name } if ns == namespace => Some((NodeId(i), name.as_str())),
            _ => None,
        })
    }

    /// Identifier names in the subtree rooted at `id`, depth first.
    pub fn identifiers_in(&self, id: NodeId) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(id, &mut |kind| {
            if let NodeKind::Identifier(name) = kind {
                out.push(name.as_str());
            }
        });
        out
    }

    /// Literals in the subtree rooted at `id`, depth first.
    pub fn literals_in(&self, id: NodeId) -> Vec<&Literal> {
        let mut out = Vec::new();
        self.walk(id, &mut |kind| {
            if let NodeKind::Literal(lit) = kind {
                out.push(lit);
            }
        });
        out
    }

    fn walk<'a>(&'a self, id: NodeId, visit: &mut dyn FnMut(&'a NodeKind)) {
        let mut stack = vec![id];
        let mut seen = AHashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.node(current) {
                visit(&node.kind);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    /// Whether `id` sits under a negation.
    ///
    /// Climbs toward the root: a `Not` or `Delayed` node on the way negates, as
    /// does an `And` ancestor with a `Delayed` child not already visited by this
    /// climb. A `Not` sibling only negates its own subtree. Reaching the root, or
    /// a node visited twice, means not negated.
    pub fn is_negated(&self, id: NodeId) -> bool {
        let mut seen = AHashSet::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if !seen.insert(node_id) {
                return false;
            }
            let Some(node) = self.node(node_id) else {
                return false;
            };
            match &node.kind {
                NodeKind::Script => return false,
                NodeKind::Not | NodeKind::Delayed => return true,
                NodeKind::And => {
                    let delayed_sibling = node
                        .children
                        .iter()
                        .any(|child| !seen.contains(child) && matches!(self.kind(*child), Some(NodeKind::Delayed)));
                    if delayed_sibling {
                        return true;
                    }
                }
                _ => {}
            }
            current = node.parent;
        }
        false
    }
}

impl QueryTree {
    fn render(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        match &node.kind {
            NodeKind::Script => {
                for child in &node.children {
                    self.render(*child, f)?;
                }
                Ok(())
            }
            NodeKind::And => self.render_joined(&node.children, " && ", f),
            NodeKind::Or => self.render_joined(&node.children, " || ", f),
            NodeKind::Not => {
                f.write_str("!")?;
                for child in &node.children {
                    self.render_operand(*child, f)?;
                }
                Ok(())
            }
            NodeKind::Delayed => {
                f.write_str("((_Delayed_ = true) && (")?;
                for child in &node.children {
                    self.render(*child, f)?;
                }
                f.write_str("))")
            }
            NodeKind::Function { namespace, name } => {
                write!(f, "{namespace}:{name}(")?;
                for (i, child) in node.children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.render_operand(*child, f)?;
                }
                f.write_str(")")
            }
            NodeKind::Comparison(op) => {
                if let [left, right] = node.children.as_slice() {
                    self.render(*left, f)?;
                    write!(f, " {} ", op.symbol())?;
                    self.render(*right, f)?;
                }
                Ok(())
            }
            NodeKind::Identifier(name) => f.write_str(name),
            NodeKind::Literal(Literal::String(s)) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            NodeKind::Literal(Literal::Number(n)) => write!(f, "{n}"),
            NodeKind::Literal(Literal::Boolean(b)) => write!(f, "{b}"),
            NodeKind::Literal(Literal::Null) => f.write_str("null"),
        }
    }

    fn render_joined(&self, children: &[NodeId], separator: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(separator)?;
            }
            self.render_operand(*child, f)?;
        }
        Ok(())
    }

    /// Render `id`, parenthesized when it is a compound expression.
    fn render_operand(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compound = matches!(
            self.kind(id),
            Some(NodeKind::And | NodeKind::Or | NodeKind::Comparison(_))
        );
        if compound {
            f.write_str("(")?;
            self.render(id, f)?;
            f.write_str(")")
        } else {
            self.render(id, f)
        }
    }
}

impl fmt::Display for QueryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(self.root(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(tree: &mut QueryTree, parent: NodeId, name: &str) -> NodeId {
        let f = tree.add_node(
            parent,
            NodeKind::Function {
                namespace: "content".to_string(),
                name: name.to_string(),
            },
        );
        tree.add_node(f, NodeKind::Identifier("TEXT".to_string()));
        tree.add_node(f, NodeKind::Literal(Literal::String("fox".to_string())));
        f
    }

    #[test]
    fn test_top_level_function_not_negated() {
        let mut tree = QueryTree::new();
        let root = tree.root();
        let f = function(&mut tree, root, "phrase");
        assert!(!tree.is_negated(f));
    }

    #[test]
    fn test_not_ancestor() {
        let mut tree = QueryTree::new();
        let root = tree.root();
        let not = tree.add_node(root, NodeKind::Not);
        let f = function(&mut tree, not, "phrase");
        assert!(tree.is_negated(f));
    }

    #[test]
    fn test_delayed_sibling_under_and() {
        let mut tree = QueryTree::new();
        let root = tree.root();
        let and = tree.add_node(root, NodeKind::And);
        let f = function(&mut tree, and, "within");
        let delayed = tree.add_node(and, NodeKind::Delayed);
        tree.add_node(delayed, NodeKind::Identifier("X".to_string()));
        assert!(tree.is_negated(f));
    }

    #[test]
    fn test_or_ancestor_not_negated() {
        let mut tree = QueryTree::new();
        let root = tree.root();
        let or = tree.add_node(root, NodeKind::Or);
        let f = function(&mut tree, or, "adjacent");
        let not = tree.add_node(or, NodeKind::Not);
        tree.add_node(not, NodeKind::Identifier("X".to_string()));
        assert!(!tree.is_negated(f));
    }

    #[test]
    fn test_not_sibling_under_and_not_negated() {
        let mut tree = QueryTree::new();
        let root = tree.root();
        let and = tree.add_node(root, NodeKind::And);
        let f = function(&mut tree, and, "phrase");
        let not = tree.add_node(and, NodeKind::Not);
        let cmp = tree.add_node(not, NodeKind::Comparison(CompareOp::Eq));
        tree.add_node(cmp, NodeKind::Identifier("TITLE".to_string()));
        tree.add_node(cmp, NodeKind::Literal(Literal::String("x".to_string())));
        assert!(!tree.is_negated(f));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut tree = QueryTree::new();
        let root = tree.root();
        let and = tree.add_node(root, NodeKind::And);
        let f = function(&mut tree, and, "phrase");
        tree.set_parent(and, Some(f));
        assert!(!tree.is_negated(f));
    }

    #[test]
    fn test_identifiers_and_literals() {
        let mut tree = QueryTree::new();
        let root = tree.root();
        let f = function(&mut tree, root, "phrase");
        assert_eq!(tree.identifiers_in(f), vec!["TEXT"]);
        assert_eq!(tree.literals_in(f), vec![&Literal::String("fox".to_string())]);
        assert_eq!(tree.functions("content").count(), 1);
        assert_eq!(tree.functions("filter").count(), 0);
    }
}
