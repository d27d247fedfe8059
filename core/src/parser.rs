//! Recursive-descent parser for the condition language.
//!
//! ```text
//! expr      := orExpr
//! orExpr    := andExpr ( "||" andExpr )*
//! andExpr   := unary ( "&&" unary )*
//! unary     := "!" unary | primary
//! primary   := "(" expr ")" | IDENT | call
//! call      := IDENT "(" ( literal ("," literal)* )? ")"
//! literal   := STRING | BOOL | INT
//! ```
//!
//! Every call to [`parse`] owns its own scanner and parser state, so any number
//! of parses may run concurrently.

use crate::ast::{BasicLit, BinaryExpr, CallExpr, Ident, Node, ParenExpr, UnaryExpr};
use crate::checker::collect_idents;
use crate::error::BuildError;
use crate::scanner::tokenize;
use crate::token::{Token, TokenKind};
use crate::MAX_DEPTH;

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Root of the syntax tree.
    pub root: Node,
    /// Bare identifiers outside any call, deduplicated, in source order.
    pub free_idents: Vec<Ident>,
}

/// Parse condition text into an unchecked syntax tree.
///
/// # Errors
///
/// Returns [`BuildError::Syntax`] for the earliest lexical or grammatical
/// error, or [`BuildError::DepthExceeded`] when parentheses and negations nest
/// deeper than [`MAX_DEPTH`].
pub fn parse(src: &str) -> Result<Parsed, BuildError> {
    let (tokens, lex_errors) = tokenize(src);
    let first_lex_error = lex_errors.into_iter().min_by_key(|(pos, _)| *pos);

    let mut parser = Parser::new(tokens);
    let result = parser.parse_file();

    match (first_lex_error, result) {
        (Some((pos, msg)), Err(BuildError::Syntax { pos: gpos, msg: gmsg })) => {
            if gpos < pos {
                Err(BuildError::Syntax { pos: gpos, msg: gmsg })
            } else {
                Err(BuildError::Syntax { pos, msg })
            }
        }
        (Some((pos, msg)), _) => Err(BuildError::Syntax { pos, msg }),
        (None, Err(e)) => Err(e),
        (None, Ok(root)) => {
            let free_idents = collect_idents(&root);
            Ok(Parsed { root, free_idents })
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    nesting: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            idx: 0,
            nesting: 0,
        }
    }

    fn peek(&self) -> &Token {
        // tokenize always ends with Eof, and advance never moves past it
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            self.idx += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, BuildError> {
        let tok = self.advance();
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(unexpected(&tok, &format!("`{kind}`")))
        }
    }

    fn parse_file(&mut self) -> Result<Node, BuildError> {
        if self.peek().kind == TokenKind::Eof {
            return Err(BuildError::Syntax {
                pos: self.peek().pos,
                msg: "empty condition".to_string(),
            });
        }
        let root = self.parse_or()?;
        let trailing = self.peek();
        if trailing.kind != TokenKind::Eof {
            return Err(unexpected(trailing, "end of condition"));
        }
        Ok(root)
    }

    fn parse_or(&mut self) -> Result<Node, BuildError> {
        self.parse_run(TokenKind::Or, Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Node, BuildError> {
        self.parse_run(TokenKind::And, Self::parse_unary)
    }

    /// `operand ( op operand )*`, gathered into one flat node.
    fn parse_run(
        &mut self,
        op: TokenKind,
        operand: fn(&mut Self) -> Result<Node, BuildError>,
    ) -> Result<Node, BuildError> {
        let first = operand(self)?;
        if self.peek().kind != op {
            return Ok(first);
        }
        let op_pos = self.peek().pos;
        let mut operands = vec![first];
        while self.peek().kind == op {
            self.advance();
            operands.push(operand(self)?);
        }
        Ok(Node::Binary(BinaryExpr {
            op,
            op_pos,
            operands,
        }))
    }

    fn parse_unary(&mut self) -> Result<Node, BuildError> {
        if self.peek().kind != TokenKind::Not {
            return self.parse_primary();
        }
        let op = self.advance();
        self.enter()?;
        let x = self.parse_unary();
        self.nesting -= 1;
        Ok(Node::Unary(UnaryExpr {
            op: op.kind,
            op_pos: op.pos,
            x: Box::new(x?),
        }))
    }

    fn parse_primary(&mut self) -> Result<Node, BuildError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::LParen => {
                self.enter()?;
                let x = self.parse_or();
                self.nesting -= 1;
                let x = x?;
                let rparen = self.expect(TokenKind::RParen)?;
                Ok(Node::Paren(ParenExpr {
                    lparen: tok.pos,
                    x: Box::new(x),
                    rparen: rparen.pos,
                }))
            }
            TokenKind::Ident => {
                let ident = Ident {
                    name: tok.text,
                    pos: tok.pos,
                };
                if self.peek().kind == TokenKind::LParen {
                    self.parse_call(ident)
                } else {
                    Ok(Node::Ident(ident))
                }
            }
            _ => Err(unexpected(&tok, "expression")),
        }
    }

    fn parse_call(&mut self, fun: Ident) -> Result<Node, BuildError> {
        let lparen = self.expect(TokenKind::LParen)?.pos;
        let mut args = Vec::new();

        if self.peek().kind != TokenKind::RParen {
            loop {
                args.push(self.parse_literal()?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let rparen = self.expect(TokenKind::RParen)?.pos;
        Ok(Node::Call(CallExpr {
            fun,
            lparen,
            args,
            rparen,
        }))
    }

    fn parse_literal(&mut self) -> Result<BasicLit, BuildError> {
        let tok = self.advance();
        if tok.kind.is_literal() {
            Ok(BasicLit {
                kind: tok.kind,
                value: tok.text,
                pos: tok.pos,
            })
        } else {
            Err(unexpected(&tok, "literal argument"))
        }
    }

    fn enter(&mut self) -> Result<(), BuildError> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(BuildError::DepthExceeded {
                depth: self.nesting,
                max: MAX_DEPTH,
            });
        }
        Ok(())
    }
}

fn unexpected(tok: &Token, wanted: &str) -> BuildError {
    let found = match tok.kind {
        TokenKind::Eof => "end of condition".to_string(),
        TokenKind::Ident | TokenKind::Int | TokenKind::Bool | TokenKind::Illegal => {
            format!("`{}`", tok.text)
        }
        TokenKind::String => format!("{:?}", tok.text),
        other => format!("`{other}`"),
    };
    BuildError::Syntax {
        pos: tok.pos,
        msg: format!("expected {wanted}, found {found}"),
    }
}
