//! Evaluation trace types for debugging condition behavior.
//!
//! Trace types mirror the runtime types ([`Condition`](crate::Condition),
//! [`RuleSet`](crate::RuleSet)) but capture evaluation results instead of
//! inputs.
//!
//! # Two Levels of Trace
//!
//! - [`ConditionTrace`]: per-condition: which sub-expressions matched, and
//!   what each primitive fetched?
//! - [`EvalTrace`]: per-rule-set: which rules were tried, which one fired?
//!
//! # Example
//!
//! ```ignore
//! let trace = rules.evaluate_with_trace(&req);
//! println!("Result: {:?}", trace.result);
//! for step in &trace.steps {
//!     println!("  rule[{}]: matched={}", step.index, step.matched);
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Trace of a condition evaluation.
///
/// In `And`/`Or`, EVERY operand is evaluated (no short-circuit) for maximum
/// debugging value. The `matched` result is still correct.
#[derive(Clone, PartialEq, Eq)]
pub enum ConditionTrace {
    /// `default_t()`.
    DefaultTrue,
    /// A fetcher/matcher pair.
    Primitive {
        matched: bool,
        /// Primitive name, e.g. `req_host_in`.
        name: String,
        /// Debug description of the fetcher.
        fetcher: String,
        /// The fetched value (Debug format), or the fetch error.
        value: String,
        /// Debug description of the matcher.
        matcher: String,
    },
    /// A path-variable condition. Tracing never records the captures into
    /// the context.
    Variable {
        matched: bool,
        template: String,
        /// Captured variables when matched.
        captures: BTreeMap<String, String>,
    },
    Not {
        matched: bool,
        inner: Box<ConditionTrace>,
    },
    And {
        matched: bool,
        children: Vec<ConditionTrace>,
    },
    Or {
        matched: bool,
        children: Vec<ConditionTrace>,
    },
}

impl ConditionTrace {
    /// Get the overall match result.
    #[must_use]
    pub fn matched(&self) -> bool {
        match self {
            Self::DefaultTrue => true,
            Self::Primitive { matched, .. }
            | Self::Variable { matched, .. }
            | Self::Not { matched, .. }
            | Self::And { matched, .. }
            | Self::Or { matched, .. } => *matched,
        }
    }

    /// Names of the primitives that matched, left to right.
    #[must_use]
    pub fn matched_primitives(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_matched(&mut out);
        out
    }

    fn collect_matched<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::DefaultTrue => out.push("default_t"),
            Self::Primitive { matched, name, .. } => {
                if *matched {
                    out.push(name);
                }
            }
            Self::Variable { .. } => {}
            Self::Not { inner, .. } => inner.collect_matched(out),
            Self::And { children, .. } | Self::Or { children, .. } => {
                for child in children {
                    child.collect_matched(out);
                }
            }
        }
    }
}

impl fmt::Debug for ConditionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultTrue => f.write_str("DefaultTrue"),
            Self::Primitive {
                matched,
                name,
                fetcher,
                value,
                matcher,
            } => f
                .debug_struct("Primitive")
                .field("matched", matched)
                .field("name", name)
                .field("fetcher", fetcher)
                .field("value", value)
                .field("matcher", matcher)
                .finish(),
            Self::Variable {
                matched,
                template,
                captures,
            } => f
                .debug_struct("Variable")
                .field("matched", matched)
                .field("template", template)
                .field("captures", captures)
                .finish(),
            Self::Not { matched, inner } => f
                .debug_struct("Not")
                .field("matched", matched)
                .field("inner", inner)
                .finish(),
            Self::And { matched, children } => f
                .debug_struct("And")
                .field("matched", matched)
                .field("children", children)
                .finish(),
            Self::Or { matched, children } => f
                .debug_struct("Or")
                .field("matched", matched)
                .field("children", children)
                .finish(),
        }
    }
}

/// Trace of a full [`RuleSet`](crate::RuleSet) evaluation.
///
/// # INV: `result` == `evaluate()` result
pub struct EvalTrace<A> {
    /// The final result (identical to what `evaluate()` returns).
    pub result: Option<A>,
    /// Each rule that was tried, in order. Stops after the first match.
    pub steps: Vec<EvalStep>,
    /// Whether the default action was used.
    pub used_default: bool,
}

impl<A: fmt::Debug> fmt::Debug for EvalTrace<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalTrace")
            .field("result", &self.result)
            .field("steps", &self.steps)
            .field("used_default", &self.used_default)
            .finish()
    }
}

/// One rule's evaluation in a trace.
#[derive(Debug)]
pub struct EvalStep {
    /// Index of the rule (0-based).
    pub index: usize,
    pub matched: bool,
    pub condition: ConditionTrace,
}
