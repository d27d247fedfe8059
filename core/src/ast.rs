//! Syntax tree produced by the [parser](crate::parser).

use std::fmt;

use crate::token::{Pos, TokenKind};

/// A bare identifier, or the function name of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

/// A literal call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicLit {
    /// `String`, `Bool`, or `Int`.
    pub kind: TokenKind,
    /// Decoded value for strings, source text otherwise.
    pub value: String,
    pub pos: Pos,
}

impl fmt::Display for BasicLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "{:?}", self.value),
            _ => f.write_str(&self.value),
        }
    }
}

/// `name(arg, ...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub fun: Ident,
    pub lparen: Pos,
    pub args: Vec<BasicLit>,
    pub rparen: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpr {
    /// Operator token (`Not`).
    pub op: TokenKind,
    pub op_pos: Pos,
    pub x: Box<Node>,
}

/// A run of one binary operator, `x op y op z ...`, held flat so a long
/// chain never nests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    /// Operator token (`And` / `Or`).
    pub op: TokenKind,
    /// Position of the first operator in the run.
    pub op_pos: Pos,
    /// At least two operands, left to right.
    pub operands: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenExpr {
    pub lparen: Pos,
    pub x: Box<Node>,
    pub rparen: Pos,
}

/// An unchecked expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Ident(Ident),
    BasicLit(BasicLit),
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Paren(ParenExpr),
}

impl Node {
    /// Position of the first token of this node.
    #[must_use]
    pub fn pos(&self) -> Pos {
        match self {
            Self::Ident(i) => i.pos,
            Self::BasicLit(l) => l.pos,
            Self::Call(c) => c.fun.pos,
            Self::Unary(u) => u.op_pos,
            Self::Binary(b) => b.operands.first().map_or(b.op_pos, Node::pos),
            Self::Paren(p) => p.lparen,
        }
    }

    /// Immediate children, left to right.
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Self::Ident(_) | Self::BasicLit(_) | Self::Call(_) => Vec::new(),
            Self::Unary(u) => vec![&u.x],
            Self::Binary(b) => b.operands.iter().collect(),
            Self::Paren(p) => vec![&p.x],
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(i) => f.write_str(&i.name),
            Self::BasicLit(l) => fmt::Display::fmt(l, f),
            Self::Call(c) => {
                write!(f, "{}(", c.fun.name)?;
                for (i, arg) in c.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt::Display::fmt(arg, f)?;
                }
                f.write_str(")")
            }
            Self::Unary(u) => write!(f, "{}{}", u.op, u.x),
            Self::Binary(b) => {
                for (i, x) in b.operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", b.op)?;
                    }
                    fmt::Display::fmt(x, f)?;
                }
                Ok(())
            }
            Self::Paren(p) => write!(f, "({})", p.x),
        }
    }
}
