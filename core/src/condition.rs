//! `Condition`: the executable form of a condition expression.
//!
//! A condition tree is built once and then evaluated many times, possibly from
//! many threads at once. Nothing in the tree changes after it is built.
//! [`VariableCond`] writes captured path variables into the context it is
//! evaluated against; that context belongs to one request.

use std::fmt::{self, Debug};

use crate::token::TokenKind;
use crate::trace::ConditionTrace;
use crate::variable::VariableCond;
use crate::{Fetcher, ValueMatcher};

/// A fetcher paired with a matcher, named after the primitive that built it.
///
/// # INV: fetch error → false
///
/// If the fetcher fails, the condition does not match. The error never
/// reaches the caller.
pub struct PrimitiveCond<Ctx> {
    name: String,
    fetcher: Box<dyn Fetcher<Ctx>>,
    matcher: Box<dyn ValueMatcher>,
}

impl<Ctx> PrimitiveCond<Ctx> {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        fetcher: Box<dyn Fetcher<Ctx>>,
        matcher: Box<dyn ValueMatcher>,
    ) -> Self {
        Self {
            name: name.into(),
            fetcher,
            matcher,
        }
    }

    /// Primitive name, e.g. `req_path_in`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fetcher(&self) -> &dyn Fetcher<Ctx> {
        &*self.fetcher
    }

    #[must_use]
    pub fn matcher(&self) -> &dyn ValueMatcher {
        &*self.matcher
    }

    pub fn matches(&self, ctx: &Ctx) -> bool {
        match self.fetcher.fetch(ctx) {
            Ok(value) => self.matcher.matches(&value),
            Err(err) => {
                log::trace!("{}: fetch failed, not matching: {err}", self.name);
                false
            }
        }
    }

    #[must_use]
    pub fn trace(&self, ctx: &Ctx) -> ConditionTrace {
        let fetched = self.fetcher.fetch(ctx);
        let matched = fetched
            .as_ref()
            .is_ok_and(|value| self.matcher.matches(value));
        ConditionTrace::Primitive {
            matched,
            name: self.name.clone(),
            fetcher: format!("{:?}", self.fetcher),
            value: match fetched {
                Ok(value) => format!("{value:?}"),
                Err(err) => format!("error: {err}"),
            },
            matcher: format!("{:?}", self.matcher),
        }
    }
}

impl<Ctx> Debug for PrimitiveCond<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveCond")
            .field("name", &self.name)
            .field("fetcher", &self.fetcher)
            .field("matcher", &self.matcher)
            .finish()
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

impl UnaryOp {
    /// The operator for a token, if there is one.
    #[must_use]
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Not => Some(Self::Not),
            _ => None,
        }
    }
}

/// Binary operators. Both short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
}

impl BinaryOp {
    /// The operator for a token, if there is one.
    #[must_use]
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::And => Some(Self::And),
            TokenKind::Or => Some(Self::Or),
            _ => None,
        }
    }
}

pub struct UnaryCond<Ctx> {
    pub op: UnaryOp,
    pub cond: Box<Condition<Ctx>>,
}

/// A run of conditions joined by one operator, evaluated left to right.
pub struct BinaryCond<Ctx> {
    pub op: BinaryOp,
    pub conds: Vec<Condition<Ctx>>,
}

/// A compiled condition.
///
/// # Example
///
/// ```
/// use gatecond::{BoolMatcher, Condition, FetchError, Fetcher, Value};
///
/// #[derive(Debug)]
/// struct Flag;
/// impl Fetcher<bool> for Flag {
///     fn fetch(&self, ctx: &bool) -> Result<Value, FetchError> {
///         Ok(Value::Bool(*ctx))
///     }
/// }
///
/// let cond: Condition<bool> = Condition::not(Condition::primitive(
///     "flag",
///     Box::new(Flag),
///     Box::new(BoolMatcher::new(true)),
/// ));
/// assert!(cond.matches(&false));
/// assert!(!cond.matches(&true));
/// ```
pub enum Condition<Ctx> {
    /// Always true.
    DefaultTrue,
    /// Fetch a value and test it.
    Primitive(PrimitiveCond<Ctx>),
    /// `!cond`
    Unary(UnaryCond<Ctx>),
    /// `a && b && ...`, `a || b || ...`
    Binary(BinaryCond<Ctx>),
    /// Match a path template and record its variables.
    Variable(VariableCond<Ctx>),
}

impl<Ctx> Condition<Ctx> {
    #[must_use]
    pub fn primitive(
        name: impl Into<String>,
        fetcher: Box<dyn Fetcher<Ctx>>,
        matcher: Box<dyn ValueMatcher>,
    ) -> Self {
        Self::Primitive(PrimitiveCond::new(name, fetcher, matcher))
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(cond: Self) -> Self {
        Self::Unary(UnaryCond {
            op: UnaryOp::Not,
            cond: Box::new(cond),
        })
    }

    #[must_use]
    pub fn and(lc: Self, rc: Self) -> Self {
        Self::binary(BinaryOp::And, lc, rc)
    }

    #[must_use]
    pub fn or(lc: Self, rc: Self) -> Self {
        Self::binary(BinaryOp::Or, lc, rc)
    }

    /// Join two conditions. A run of the same operator on the left is
    /// extended rather than nested.
    #[must_use]
    pub fn binary(op: BinaryOp, lc: Self, rc: Self) -> Self {
        match lc {
            Self::Binary(mut run) if run.op == op => {
                run.conds.push(rc);
                Self::Binary(run)
            }
            lc => Self::Binary(BinaryCond {
                op,
                conds: vec![lc, rc],
            }),
        }
    }

    /// Join a run of conditions with one operator.
    ///
    /// An empty run is `DefaultTrue` for `And` and never matches for `Or`;
    /// a single condition is returned as is.
    #[must_use]
    pub fn run(op: BinaryOp, mut conds: Vec<Self>) -> Self {
        match conds.len() {
            0 => match op {
                BinaryOp::And => Self::DefaultTrue,
                BinaryOp::Or => Self::not(Self::DefaultTrue),
            },
            1 => conds.remove(0),
            _ => Self::Binary(BinaryCond { op, conds }),
        }
    }

    /// Evaluate against `ctx`.
    ///
    /// `&&` and `||` short-circuit: evaluation of a run stops at the first
    /// operand that decides the result, and later operands have no side
    /// effects.
    pub fn matches(&self, ctx: &Ctx) -> bool {
        match self {
            Self::DefaultTrue => true,
            Self::Primitive(p) => p.matches(ctx),
            Self::Unary(u) => match u.op {
                UnaryOp::Not => !u.cond.matches(ctx),
            },
            Self::Binary(b) => match b.op {
                BinaryOp::And => b.conds.iter().all(|c| c.matches(ctx)),
                BinaryOp::Or => b.conds.iter().any(|c| c.matches(ctx)),
            },
            Self::Variable(v) => v.matches(ctx),
        }
    }

    /// Evaluate with a full record of every sub-result.
    ///
    /// Unlike [`matches()`](Self::matches), every operand of `&&` and `||`
    /// is evaluated. The overall result is the same.
    #[must_use]
    pub fn trace(&self, ctx: &Ctx) -> ConditionTrace {
        match self {
            Self::DefaultTrue => ConditionTrace::DefaultTrue,
            Self::Primitive(p) => p.trace(ctx),
            Self::Unary(u) => {
                let inner = u.cond.trace(ctx);
                ConditionTrace::Not {
                    matched: !inner.matched(),
                    inner: Box::new(inner),
                }
            }
            Self::Binary(b) => {
                let children: Vec<ConditionTrace> = b.conds.iter().map(|c| c.trace(ctx)).collect();
                match b.op {
                    BinaryOp::And => ConditionTrace::And {
                        matched: children.iter().all(ConditionTrace::matched),
                        children,
                    },
                    BinaryOp::Or => ConditionTrace::Or {
                        matched: children.iter().any(ConditionTrace::matched),
                        children,
                    },
                }
            }
            Self::Variable(v) => v.trace(ctx),
        }
    }

    /// Height of the tree; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::DefaultTrue | Self::Primitive(_) | Self::Variable(_) => 1,
            Self::Unary(u) => 1 + u.cond.depth(),
            Self::Binary(b) => 1 + b.conds.iter().map(Self::depth).max().unwrap_or(0),
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::DefaultTrue | Self::Primitive(_) | Self::Variable(_) => 1,
            Self::Unary(u) => 1 + u.cond.len(),
            Self::Binary(b) => 1 + b.conds.iter().map(Self::len).sum::<usize>(),
        }
    }

    /// Always `false`; a condition has at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<Ctx> Debug for Condition<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultTrue => f.write_str("DefaultTrue"),
            Self::Primitive(p) => f.debug_tuple("Primitive").field(&p.name).finish(),
            Self::Unary(u) => f.debug_tuple("Not").field(&u.cond).finish(),
            Self::Binary(b) => {
                let mut t = f.debug_tuple(match b.op {
                    BinaryOp::And => "And",
                    BinaryOp::Or => "Or",
                });
                for c in &b.conds {
                    t.field(c);
                }
                t.finish()
            }
            Self::Variable(v) => f.debug_tuple("Variable").field(v).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoolMatcher, ExactMatcher, FetchError, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Ctx {
        a: bool,
        b: bool,
    }

    struct Field(fn(&Ctx) -> bool, Arc<AtomicUsize>);

    impl Debug for Field {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Field")
        }
    }

    impl Fetcher<Ctx> for Field {
        fn fetch(&self, ctx: &Ctx) -> Result<Value, FetchError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Bool((self.0)(ctx)))
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Fetcher<Ctx> for Failing {
        fn fetch(&self, _: &Ctx) -> Result<Value, FetchError> {
            Err(FetchError::NoSession)
        }
    }

    fn flag(f: fn(&Ctx) -> bool, calls: &Arc<AtomicUsize>) -> Condition<Ctx> {
        Condition::primitive(
            "flag",
            Box::new(Field(f, Arc::clone(calls))),
            Box::new(BoolMatcher::new(true)),
        )
    }

    #[test]
    fn default_true() {
        let c: Condition<Ctx> = Condition::DefaultTrue;
        assert!(c.matches(&Ctx { a: false, b: false }));
    }

    #[test]
    fn fetch_error_is_false() {
        let c = Condition::primitive("x", Box::new(Failing), Box::new(ExactMatcher::new("", false)));
        assert!(!c.matches(&Ctx { a: true, b: true }));
        assert!(!c.trace(&Ctx { a: true, b: true }).matched());
        let negated = Condition::not(c);
        assert!(negated.matches(&Ctx { a: true, b: true }));
    }

    #[test]
    fn truth_tables() {
        let calls = Arc::new(AtomicUsize::new(0));
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let ctx = Ctx { a, b };
            let and = Condition::and(flag(|c| c.a, &calls), flag(|c| c.b, &calls));
            let or = Condition::or(flag(|c| c.a, &calls), flag(|c| c.b, &calls));
            assert_eq!(and.matches(&ctx), a && b);
            assert_eq!(or.matches(&ctx), a || b);
            assert_eq!(and.trace(&ctx).matched(), a && b);
            assert_eq!(or.trace(&ctx).matched(), a || b);
        }
    }

    #[test]
    fn and_short_circuits() {
        let left = Arc::new(AtomicUsize::new(0));
        let right = Arc::new(AtomicUsize::new(0));
        let c = Condition::and(flag(|c| c.a, &left), flag(|c| c.b, &right));
        assert!(!c.matches(&Ctx { a: false, b: true }));
        assert_eq!(left.load(Ordering::SeqCst), 1);
        assert_eq!(right.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn or_short_circuits() {
        let left = Arc::new(AtomicUsize::new(0));
        let right = Arc::new(AtomicUsize::new(0));
        let c = Condition::or(flag(|c| c.a, &left), flag(|c| c.b, &right));
        assert!(c.matches(&Ctx { a: true, b: false }));
        assert_eq!(right.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn runs_stay_flat() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Condition::and(
            Condition::and(flag(|c| c.a, &calls), flag(|c| c.b, &calls)),
            Condition::or(flag(|c| c.a, &calls), flag(|c| c.b, &calls)),
        );
        let Condition::Binary(run) = &c else {
            panic!("expected binary");
        };
        assert_eq!(run.conds.len(), 3);
        assert_eq!(c.depth(), 3);
    }

    #[test]
    fn run_of_one_or_none() {
        let ctx = Ctx { a: false, b: false };
        assert!(Condition::<Ctx>::run(BinaryOp::And, Vec::new()).matches(&ctx));
        assert!(!Condition::<Ctx>::run(BinaryOp::Or, Vec::new()).matches(&ctx));
        let calls = Arc::new(AtomicUsize::new(0));
        let single = Condition::run(BinaryOp::Or, vec![flag(|c| c.a, &calls)]);
        assert!(matches!(single, Condition::Primitive(_)));
    }

    #[test]
    fn long_run_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Condition::run(
            BinaryOp::Or,
            (0..10_000).map(|_| flag(|c| c.a, &calls)).collect(),
        );
        assert!(!c.matches(&Ctx { a: false, b: false }));
        assert_eq!(calls.load(Ordering::SeqCst), 10_000);
        calls.store(0, Ordering::SeqCst);
        assert!(c.matches(&Ctx { a: true, b: false }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.depth(), 2);
        assert_eq!(c.len(), 10_001);
    }

    #[test]
    fn trace_evaluates_both_sides() {
        let left = Arc::new(AtomicUsize::new(0));
        let right = Arc::new(AtomicUsize::new(0));
        let c = Condition::or(flag(|c| c.a, &left), flag(|c| c.b, &right));
        let trace = c.trace(&Ctx { a: true, b: false });
        assert!(trace.matched());
        assert_eq!(right.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn depth_and_len() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Condition::and(
            Condition::not(flag(|c| c.a, &calls)),
            Condition::or(flag(|c| c.a, &calls), Condition::DefaultTrue),
        );
        assert_eq!(c.depth(), 3);
        assert_eq!(c.len(), 6);
    }

    #[test]
    fn operators_from_tokens() {
        assert_eq!(UnaryOp::from_token(TokenKind::Not), Some(UnaryOp::Not));
        assert_eq!(UnaryOp::from_token(TokenKind::And), None);
        assert_eq!(BinaryOp::from_token(TokenKind::Or), Some(BinaryOp::Or));
        assert_eq!(BinaryOp::from_token(TokenKind::Comma), None);
    }

    #[test]
    fn debug_is_compact() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Condition::not(flag(|c| c.a, &calls));
        assert_eq!(format!("{c:?}"), "Not(Primitive(\"flag\"))");
    }

    #[test]
    fn conditions_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Condition<Ctx>>();
    }
}
