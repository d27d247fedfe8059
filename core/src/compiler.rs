//! Condition compiler: text → parse → free-variable check → semantic check →
//! executable [`Condition`].
//!
//! Building is all-or-nothing. Either every call compiles and a complete tree
//! is returned, or the first problem is returned as a [`BuildError`].

use crate::ast::Node;
use crate::checker::check;
use crate::condition::{BinaryOp, UnaryOp};
use crate::error::{BuildError, SemanticError};
use crate::parser::parse;
use crate::registry::{Args, PrimitiveTable};
use crate::Condition;

/// Compiles condition text against one primitive table.
///
/// A compiler holds nothing but a reference to the table, so it is cheap to
/// create per call and safe to share between threads.
///
/// # Example
///
/// ```
/// use gatecond::{register_core_primitives, BuildError, Compiler, PrimitiveTableBuilder};
///
/// let table = register_core_primitives(PrimitiveTableBuilder::<()>::new()).build();
/// let compiler = Compiler::new(&table);
///
/// assert!(compiler.build("default_t() || !default_t()").unwrap().matches(&()));
/// assert!(matches!(
///     compiler.build("a && b"),
///     Err(BuildError::UnresolvedVariable { .. })
/// ));
/// ```
pub struct Compiler<'t, Ctx> {
    table: &'t PrimitiveTable<Ctx>,
}

impl<Ctx> Clone for Compiler<'_, Ctx> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Ctx> Copy for Compiler<'_, Ctx> {}

impl<'t, Ctx> Compiler<'t, Ctx> {
    #[must_use]
    pub fn new(table: &'t PrimitiveTable<Ctx>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &'t PrimitiveTable<Ctx> {
        self.table
    }

    /// Build a condition from text.
    ///
    /// # Errors
    ///
    /// - [`BuildError::Syntax`] / [`BuildError::DepthExceeded`] from parsing
    /// - [`BuildError::UnresolvedVariable`] for the first bare identifier
    /// - [`BuildError::Semantic`] listing every unknown primitive or bad
    ///   argument list
    /// - [`BuildError::InvalidArgument`] when a primitive rejects a literal
    pub fn build(&self, text: &str) -> Result<Condition<Ctx>, BuildError> {
        match self.try_build(text) {
            Ok(cond) => {
                log::debug!(
                    "built condition `{text}` ({} nodes, depth {})",
                    cond.len(),
                    cond.depth()
                );
                Ok(cond)
            }
            Err(err) => {
                log::debug!("rejected condition `{text}`: {err}");
                Err(err)
            }
        }
    }

    fn try_build(&self, text: &str) -> Result<Condition<Ctx>, BuildError> {
        let parsed = parse(text)?;

        if let Some(ident) = parsed.free_idents.first() {
            return Err(BuildError::UnresolvedVariable {
                name: ident.name.clone(),
                pos: ident.pos,
            });
        }

        let errors = check(&parsed.root, self.table);
        if !errors.is_empty() {
            return Err(BuildError::Semantic(errors));
        }

        self.compile(&parsed.root)
    }

    /// Compile an already checked syntax tree.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build), minus parsing.
    pub fn compile(&self, node: &Node) -> Result<Condition<Ctx>, BuildError> {
        match node {
            Node::Paren(p) => self.compile(&p.x),
            Node::Unary(u) => {
                let op = UnaryOp::from_token(u.op).ok_or_else(|| BuildError::UnsupportedOperator {
                    op: u.op.to_string(),
                    pos: u.op_pos,
                })?;
                let cond = self.compile(&u.x)?;
                Ok(match op {
                    UnaryOp::Not => Condition::not(cond),
                })
            }
            Node::Binary(b) => {
                let op =
                    BinaryOp::from_token(b.op).ok_or_else(|| BuildError::UnsupportedOperator {
                        op: b.op.to_string(),
                        pos: b.op_pos,
                    })?;
                let conds = b
                    .operands
                    .iter()
                    .map(|x| self.compile(x))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Condition::run(op, conds))
            }
            Node::Call(call) => {
                let name = &call.fun.name;
                let primitive = self.table.get(name).ok_or_else(|| {
                    BuildError::Semantic(vec![SemanticError::UnknownPrimitive {
                        name: name.clone(),
                        pos: call.fun.pos,
                    }])
                })?;
                primitive
                    .construct(&Args::new(call))
                    .map_err(|source| BuildError::InvalidArgument {
                        primitive: name.clone(),
                        pos: call.fun.pos,
                        source,
                    })
            }
            Node::Ident(ident) => Err(BuildError::UnresolvedVariable {
                name: ident.name.clone(),
                pos: ident.pos,
            }),
            Node::BasicLit(lit) => Err(BuildError::Syntax {
                pos: lit.pos,
                msg: format!("literal {lit} is not a condition"),
            }),
        }
    }
}
