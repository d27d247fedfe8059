//! Semantic checks over a parsed condition.

use std::collections::HashSet;

use crate::ast::{Ident, Node};
use crate::error::SemanticError;
use crate::registry::{ArgKind, PrimitiveTable};
use crate::walker::{walk, Walk};

/// Bare identifiers outside any call, deduplicated by name, in source order.
#[must_use]
pub fn collect_idents(root: &Node) -> Vec<Ident> {
    let mut seen = HashSet::new();
    let mut idents = Vec::new();
    walk(
        &mut |node: &Node| match node {
            Node::Ident(ident) => {
                if seen.insert(ident.name.clone()) {
                    idents.push(ident.clone());
                }
                Walk::Continue
            }
            // the function name of a call is not a free identifier
            Node::Call(_) => Walk::Skip,
            _ => Walk::Continue,
        },
        root,
    );
    idents
}

/// Check every call against `table`: the primitive must exist and its
/// arguments must match the registered kinds. All errors are collected.
#[must_use]
pub fn check<Ctx>(root: &Node, table: &PrimitiveTable<Ctx>) -> Vec<SemanticError> {
    let mut errors = Vec::new();
    walk(
        &mut |node: &Node| {
            if let Node::Call(call) = node {
                let name = &call.fun.name;
                let pos = call.fun.pos;
                let Some(primitive) = table.get(name) else {
                    errors.push(SemanticError::UnknownPrimitive {
                        name: name.clone(),
                        pos,
                    });
                    return Walk::Skip;
                };

                let expected = primitive.args();
                if expected.len() != call.args.len() {
                    errors.push(SemanticError::ArgumentCount {
                        name: name.clone(),
                        pos,
                        expected: expected.len(),
                        got: call.args.len(),
                    });
                    return Walk::Skip;
                }

                for (index, (kind, arg)) in expected.iter().zip(&call.args).enumerate() {
                    if kind.token_kind() != arg.kind {
                        errors.push(SemanticError::ArgumentKind {
                            name: name.clone(),
                            pos: arg.pos,
                            index,
                            expected: kind.name(),
                            got: ArgKind::name_of(arg.kind),
                        });
                    }
                }
                return Walk::Skip;
            }
            Walk::Continue
        },
        root,
    );
    errors
}
