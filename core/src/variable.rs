//! Path-template conditions that capture named variables.
//!
//! A template such as `/user/{userId}/info/{infoId}` compiles to the anchored
//! regex `^/user/(?P<v0>[^/]+)/info/(?P<v1>[^/]+)$`. In prefix mode the trailing
//! `$` is dropped, so longer paths match too.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};

use regex::Regex;

use crate::trace::ConditionTrace;
use crate::{Fetcher, ValueError};

/// Compiled path template.
///
/// ```
/// use gatecond::VariableMatcher;
///
/// let m = VariableMatcher::new("/user/{id}", false).unwrap();
/// let vars = m.extract("/user/42").unwrap();
/// assert_eq!(vars["id"], "42");
/// assert!(m.extract("/user/42/x").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct VariableMatcher {
    template: String,
    regex: Regex,
    names: Vec<String>,
}

impl VariableMatcher {
    /// # Errors
    ///
    /// - [`ValueError::Template`] for unbalanced or nested braces, or an empty
    ///   variable name
    /// - [`ValueError::DuplicateVariable`] if a name appears twice
    pub fn new(template: &str, prefix: bool) -> Result<Self, ValueError> {
        let bad = |reason: &str| ValueError::Template {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut pattern = String::from("^");
        let mut names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut var: Option<String> = None;

        for c in template.chars() {
            match (c, var.as_mut()) {
                ('{', Some(_)) => return Err(bad("nested `{`")),
                ('{', None) => {
                    pattern.push_str(&regex::escape(&literal));
                    literal.clear();
                    var = Some(String::new());
                }
                ('}', None) => return Err(bad("unbalanced `}`")),
                ('}', Some(name)) => {
                    if name.is_empty() {
                        return Err(bad("empty variable name"));
                    }
                    if names.contains(name) {
                        return Err(ValueError::DuplicateVariable { name: name.clone() });
                    }
                    pattern.push_str(&format!("(?P<v{}>[^/]+)", names.len()));
                    names.push(std::mem::take(name));
                    var = None;
                }
                (c, Some(name)) => name.push(c),
                (c, None) => literal.push(c),
            }
        }
        if var.is_some() {
            return Err(bad("unbalanced `{`"));
        }

        pattern.push_str(&regex::escape(&literal));
        if !prefix {
            pattern.push('$');
        }

        let regex = Regex::new(&pattern).map_err(|e| bad(&e.to_string()))?;
        Ok(Self {
            template: template.to_string(),
            regex,
            names,
        })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Variable names in template order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Captured variables if `path` matches; `None` otherwise. A template
    /// without variables yields an empty map on match.
    #[must_use]
    pub fn extract(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    caps.name(&format!("v{i}"))
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

/// Receives the variables captured by a matching [`VariableCond`].
///
/// The sink writes into per-request state reachable from the context.
pub trait VariableSink<Ctx>: Send + Sync + Debug {
    fn record(&self, ctx: &Ctx, vars: HashMap<String, String>);
}

/// Matches a fetched path against a template and records the captures.
///
/// # INV: no match → no mutation
pub struct VariableCond<Ctx> {
    fetcher: Box<dyn Fetcher<Ctx>>,
    matcher: VariableMatcher,
    sink: Box<dyn VariableSink<Ctx>>,
}

impl<Ctx> VariableCond<Ctx> {
    #[must_use]
    pub fn new(
        fetcher: Box<dyn Fetcher<Ctx>>,
        matcher: VariableMatcher,
        sink: Box<dyn VariableSink<Ctx>>,
    ) -> Self {
        Self {
            fetcher,
            matcher,
            sink,
        }
    }

    #[must_use]
    pub fn matcher(&self) -> &VariableMatcher {
        &self.matcher
    }

    fn captures(&self, ctx: &Ctx) -> Option<HashMap<String, String>> {
        let value = match self.fetcher.fetch(ctx) {
            Ok(value) => value,
            Err(err) => {
                log::trace!("{}: fetch failed, not matching: {err}", self.matcher.template);
                return None;
            }
        };
        self.matcher.extract(value.as_str()?)
    }

    pub fn matches(&self, ctx: &Ctx) -> bool {
        match self.captures(ctx) {
            Some(vars) => {
                self.sink.record(ctx, vars);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn trace(&self, ctx: &Ctx) -> ConditionTrace {
        let captures = self.captures(ctx);
        ConditionTrace::Variable {
            matched: captures.is_some(),
            template: self.matcher.template.clone(),
            captures: captures
                .map(|c| c.into_iter().collect::<BTreeMap<_, _>>())
                .unwrap_or_default(),
        }
    }
}

impl<Ctx> Debug for VariableCond<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableCond")
            .field("fetcher", &self.fetcher)
            .field("template", &self.matcher.template)
            .field("sink", &self.sink)
            .finish()
    }
}
