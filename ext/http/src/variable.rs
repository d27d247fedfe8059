//! Path-variable conditions over [`Request`].

use std::collections::HashMap;

use gatecond::{BuildError, Condition, VariableCond, VariableMatcher, VariableSink};

use crate::fetchers::PATH;
use crate::Request;

/// Records captures into the request's per-request context.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestVariableSink;

impl VariableSink<Request> for RequestVariableSink {
    fn record(&self, req: &Request, vars: HashMap<String, String>) {
        req.record_path_variables(vars);
    }
}

/// Build a condition matching the request path against `template`.
///
/// `/user/{id}` matches `/user/42` and records `id = "42"` into
/// [`Request::path_variables`]. With `prefix`, trailing path segments are
/// allowed.
///
/// # Errors
///
/// Unbalanced or nested braces, an empty variable name, or a name used twice.
pub fn variable_condition(template: &str, prefix: bool) -> Result<Condition<Request>, BuildError> {
    let matcher = VariableMatcher::new(template, prefix).map_err(|source| {
        BuildError::InvalidArgument {
            primitive: "path_template".to_string(),
            pos: gatecond::token::Pos::default(),
            source,
        }
    })?;
    log::debug!("built path-variable condition {template:?} (prefix: {prefix})");
    Ok(Condition::Variable(VariableCond::new(
        Box::new(PATH),
        matcher,
        Box::new(RequestVariableSink),
    )))
}
