//! Depth-first traversal of the syntax tree.

use crate::ast::Node;

/// What the walker should do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Descend into the node's children.
    Continue,
    /// Do not descend; move on to the next sibling.
    Skip,
}

/// A consumer of syntax-tree nodes.
pub trait Visitor {
    fn visit(&mut self, node: &Node) -> Walk;
}

impl<F> Visitor for F
where
    F: FnMut(&Node) -> Walk,
{
    fn visit(&mut self, node: &Node) -> Walk {
        self(node)
    }
}

/// Visit `node` and, unless told to skip, its children in pre-order.
pub fn walk<V: Visitor + ?Sized>(visitor: &mut V, node: &Node) {
    if visitor.visit(node) == Walk::Skip {
        return;
    }
    for child in node.children() {
        walk(visitor, child);
    }
}
