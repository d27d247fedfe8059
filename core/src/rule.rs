//! Rule sets: ordered `(condition, action)` pairs with first-match-wins
//! evaluation.
//!
//! This is the shape policy modules consume the language in. A module loads
//! its rules once per configuration generation, then asks the rule set which
//! action applies to each request.

use std::fmt::{self, Debug};

use crate::trace::{EvalStep, EvalTrace};
use crate::Condition;

/// One condition gating one action.
pub struct Rule<Ctx, A> {
    pub condition: Condition<Ctx>,
    pub action: A,
}

impl<Ctx, A> Rule<Ctx, A> {
    #[must_use]
    pub fn new(condition: Condition<Ctx>, action: A) -> Self {
        Self { condition, action }
    }

    pub fn matches(&self, ctx: &Ctx) -> bool {
        self.condition.matches(ctx)
    }
}

impl<Ctx, A: Debug> Debug for Rule<Ctx, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("condition", &self.condition)
            .field("action", &self.action)
            .finish()
    }
}

/// Ordered rules plus an optional default action.
///
/// # INV: First-match-wins
///
/// Rules are evaluated in order. The first matching condition terminates
/// evaluation, even if later conditions would also match. The default is
/// returned only when no rule matches.
///
/// # Example
///
/// ```
/// use gatecond::{register_core_primitives, Compiler, PrimitiveTableBuilder, Rule, RuleSet};
///
/// let table = register_core_primitives(PrimitiveTableBuilder::<()>::new()).build();
/// let compiler = Compiler::new(&table);
///
/// let rules = RuleSet::new(
///     vec![
///         Rule::new(compiler.build("!default_t()").unwrap(), "never"),
///         Rule::new(compiler.build("default_t()").unwrap(), "always"),
///     ],
///     Some("fallback"),
/// );
/// assert_eq!(rules.evaluate(&()), Some("always"));
/// ```
pub struct RuleSet<Ctx, A: Clone + Send + Sync + 'static> {
    rules: Vec<Rule<Ctx, A>>,
    default: Option<A>,
}

impl<Ctx, A: Clone + Send + Sync + 'static> RuleSet<Ctx, A> {
    #[must_use]
    pub fn new(rules: Vec<Rule<Ctx, A>>, default: Option<A>) -> Self {
        Self { rules, default }
    }

    /// No rules and no default: every evaluation returns `None`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            default: None,
        }
    }

    /// Action of the first matching rule, else the default.
    pub fn evaluate(&self, ctx: &Ctx) -> Option<A> {
        self.rules
            .iter()
            .find(|rule| rule.matches(ctx))
            .map(|rule| rule.action.clone())
            .or_else(|| self.default.clone())
    }

    /// Like [`evaluate`](Self::evaluate), recording every rule tried.
    ///
    /// Conditions are traced with [`Condition::trace`], so path-variable
    /// conditions do not record captures into the context here.
    pub fn evaluate_with_trace(&self, ctx: &Ctx) -> EvalTrace<A> {
        let mut steps = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let condition = rule.condition.trace(ctx);
            let matched = condition.matched();
            steps.push(EvalStep {
                index,
                matched,
                condition,
            });
            if matched {
                return EvalTrace {
                    result: Some(rule.action.clone()),
                    steps,
                    used_default: false,
                };
            }
        }
        EvalTrace {
            result: self.default.clone(),
            steps,
            used_default: self.default.is_some(),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule<Ctx, A>] {
        &self.rules
    }

    #[must_use]
    pub fn default_action(&self) -> Option<&A> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl<Ctx, A: Clone + Send + Sync + Debug + 'static> Debug for RuleSet<Ctx, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .field("default", &self.default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExactMatcher, FetchError, Fetcher, Value};

    #[derive(Debug)]
    struct Path;

    impl Fetcher<&'static str> for Path {
        fn fetch(&self, ctx: &&'static str) -> Result<Value, FetchError> {
            Ok(Value::Str((*ctx).to_string()))
        }
    }

    fn is(path: &str) -> Condition<&'static str> {
        Condition::primitive("is", Box::new(Path), Box::new(ExactMatcher::new(path, false)))
    }

    fn rules(default: Option<&'static str>) -> RuleSet<&'static str, &'static str> {
        RuleSet::new(
            vec![
                Rule::new(is("/api"), "api"),
                Rule::new(Condition::or(is("/api"), is("/static")), "either"),
                Rule::new(is("/static"), "static"),
            ],
            default,
        )
    }

    #[test]
    fn first_match_wins() {
        let rules = rules(None);
        assert_eq!(rules.evaluate(&"/api"), Some("api"));
        // `/static` matches rules 1 and 2; the earlier one wins
        assert_eq!(rules.evaluate(&"/static"), Some("either"));
        assert_eq!(rules.evaluate(&"/other"), None);
    }

    #[test]
    fn default_only_on_no_match() {
        let rules = rules(Some("fallback"));
        assert_eq!(rules.evaluate(&"/api"), Some("api"));
        assert_eq!(rules.evaluate(&"/other"), Some("fallback"));
        assert!(rules.has_default());
        assert_eq!(rules.default_action(), Some(&"fallback"));
    }

    #[test]
    fn empty_rule_set() {
        let rules: RuleSet<&'static str, &'static str> = RuleSet::empty();
        assert!(rules.is_empty());
        assert_eq!(rules.evaluate(&"/api"), None);
    }

    #[test]
    fn trace_agrees_with_evaluate() {
        let rules = rules(Some("fallback"));
        for path in ["/api", "/static", "/other"] {
            let trace = rules.evaluate_with_trace(&path);
            assert_eq!(trace.result, rules.evaluate(&path), "{path}");
        }
    }

    #[test]
    fn trace_stops_at_first_match() {
        let rules = rules(Some("fallback"));
        let trace = rules.evaluate_with_trace(&"/static");
        assert_eq!(trace.steps.len(), 2);
        assert!(!trace.steps[0].matched);
        assert!(trace.steps[1].matched);
        assert!(!trace.used_default);

        let trace = rules.evaluate_with_trace(&"/other");
        assert_eq!(trace.steps.len(), 3);
        assert!(trace.used_default);
    }

    #[test]
    fn rule_set_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet<String, String>>();
    }
}
