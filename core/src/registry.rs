//! Primitive table: the one source of truth for primitive names, their
//! argument signatures, and how to build them.
//!
//! The semantic checker reads the signatures; the compiler calls the
//! constructors. Both look at the same entry, so they cannot disagree.
//!
//! # Architecture (axum `BoxedIntoRoute` pattern)
//!
//! Each constructor is a closure erased behind `Box<dyn Fn>` at registration
//! time and invoked once per call expression at build time.
//!
//! # Example
//!
//! ```
//! use gatecond::{ArgKind, Condition, PrimitiveTableBuilder};
//!
//! let table = PrimitiveTableBuilder::<()>::new()
//!     .primitive("always", &[], |_| Ok(Condition::DefaultTrue))
//!     .build();
//!
//! assert!(table.contains("always"));
//! assert_eq!(table.get("always").unwrap().signature(), "always()");
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::ast::{BasicLit, CallExpr};
use crate::token::{Pos, TokenKind};
use crate::{Condition, ValueError};

// ═══════════════════════════════════════════════════════════════════════════════
// Arguments
// ═══════════════════════════════════════════════════════════════════════════════

/// Kind of a literal argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Str,
    Bool,
    Int,
}

impl ArgKind {
    /// The token kind a literal of this kind has.
    #[must_use]
    pub fn token_kind(self) -> TokenKind {
        match self {
            Self::Str => TokenKind::String,
            Self::Bool => TokenKind::Bool,
            Self::Int => TokenKind::Int,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Bool => "bool",
            Self::Int => "int",
        }
    }

    /// Name of the kind of literal a token is, for error messages.
    #[must_use]
    pub fn name_of(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::String => "string",
            TokenKind::Bool => "bool",
            TokenKind::Int => "int",
            _ => "non-literal",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checked literal arguments of one call, handed to a constructor.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    args: &'a [BasicLit],
    pos: Pos,
}

impl<'a> Args<'a> {
    pub(crate) fn new(call: &'a CallExpr) -> Self {
        Self {
            args: &call.args,
            pos: call.fun.pos,
        }
    }

    /// Build from bare literals, for calling a constructor outside a parse.
    #[must_use]
    pub fn from_literals(args: &'a [BasicLit], pos: Pos) -> Self {
        Self { args, pos }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Position of the call.
    #[must_use]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    fn get(&self, index: usize, kind: TokenKind) -> Result<&'a BasicLit, ValueError> {
        self.args
            .get(index)
            .filter(|lit| lit.kind == kind)
            .ok_or(ValueError::Argument(index))
    }

    /// String argument `index`.
    ///
    /// # Errors
    ///
    /// [`ValueError::Argument`] if absent or not a string.
    pub fn str(&self, index: usize) -> Result<&'a str, ValueError> {
        Ok(&self.get(index, TokenKind::String)?.value)
    }

    /// Bool argument `index`.
    ///
    /// # Errors
    ///
    /// [`ValueError::Argument`] if absent or not a bool.
    pub fn bool(&self, index: usize) -> Result<bool, ValueError> {
        Ok(self.get(index, TokenKind::Bool)?.value == "true")
    }

    /// Integer argument `index`.
    ///
    /// # Errors
    ///
    /// [`ValueError::Argument`] if absent, not an integer, or out of range.
    pub fn int(&self, index: usize) -> Result<i64, ValueError> {
        self.get(index, TokenKind::Int)?
            .value
            .parse()
            .map_err(|_| ValueError::Argument(index))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Table
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-erased constructor closure.
type BoxedConstructor<Ctx> =
    Box<dyn Fn(&Args<'_>) -> Result<Condition<Ctx>, ValueError> + Send + Sync>;

/// One registered primitive.
pub struct Primitive<Ctx> {
    name: String,
    args: Vec<ArgKind>,
    constructor: BoxedConstructor<Ctx>,
}

impl<Ctx> Primitive<Ctx> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected argument kinds, in order.
    #[must_use]
    pub fn args(&self) -> &[ArgKind] {
        &self.args
    }

    /// `name(kind, kind, ...)`
    #[must_use]
    pub fn signature(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(|k| k.name()).collect();
        format!("{}({})", self.name, args.join(", "))
    }

    /// Run the constructor.
    ///
    /// # Errors
    ///
    /// Whatever the constructor rejects about its literal arguments.
    pub fn construct(&self, args: &Args<'_>) -> Result<Condition<Ctx>, ValueError> {
        (self.constructor)(args)
    }
}

impl<Ctx> fmt::Debug for Primitive<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Builder for a [`PrimitiveTable`].
///
/// # Immutability after build
///
/// No registration is possible once [`build()`](Self::build) returns.
pub struct PrimitiveTableBuilder<Ctx> {
    primitives: HashMap<String, Primitive<Ctx>>,
}

impl<Ctx: 'static> PrimitiveTableBuilder<Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            primitives: HashMap::new(),
        }
    }

    /// Register `name` with its argument signature and constructor.
    /// Registering a name twice replaces the earlier entry.
    #[must_use]
    pub fn primitive<F>(mut self, name: &str, args: &[ArgKind], constructor: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Condition<Ctx>, ValueError> + Send + Sync + 'static,
    {
        self.primitives.insert(
            name.to_owned(),
            Primitive {
                name: name.to_owned(),
                args: args.to_vec(),
                constructor: Box::new(constructor),
            },
        );
        self
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> PrimitiveTable<Ctx> {
        PrimitiveTable {
            primitives: self.primitives,
        }
    }
}

impl<Ctx: 'static> Default for PrimitiveTableBuilder<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the context-independent primitives (`default_t`).
///
/// Domain tables call this first and add their own primitives on top.
#[must_use]
pub fn register_core_primitives<Ctx: 'static>(
    builder: PrimitiveTableBuilder<Ctx>,
) -> PrimitiveTableBuilder<Ctx> {
    builder.primitive("default_t", &[], |_| Ok(Condition::DefaultTrue))
}

/// Immutable primitive table.
pub struct PrimitiveTable<Ctx> {
    primitives: HashMap<String, Primitive<Ctx>>,
}

impl<Ctx> PrimitiveTable<Ctx> {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Primitive<Ctx>> {
        self.primitives.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.primitives.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// All primitive names (sorted).
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.primitives.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All primitives, sorted by name.
    #[must_use]
    pub fn primitives(&self) -> Vec<&Primitive<Ctx>> {
        let mut all: Vec<&Primitive<Ctx>> = self.primitives.values().collect();
        all.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

impl<Ctx> fmt::Debug for PrimitiveTable<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.primitives()).finish()
    }
}
