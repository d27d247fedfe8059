//! Condition fixture runner
//!
//! A fixture names one condition and the requests it should (or should not)
//! match. A fixture with `expect_error: true` must fail to build instead.
//!
//! ```yaml
//! name: path prefix
//! cond: 'req_path_prefix_in("/api/", false)'
//! cases:
//!   - name: api path
//!     request: { uri: /api/users }
//!     expect: true
//! ```

use std::collections::HashMap;

use gatecond::{BuildError, Condition};
use gatecond_http::{variable_condition, Request};
use serde::Deserialize;

use crate::RequestSpec;

/// A complete test fixture.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Condition text. Ignored when `template` is set.
    #[serde(default)]
    pub cond: String,
    /// Path-variable template to build instead of `cond`.
    #[serde(default)]
    pub template: Option<TemplateConfig>,
    #[serde(default)]
    pub expect_error: bool,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateConfig {
    pub path: String,
    #[serde(default)]
    pub prefix: bool,
}

/// One request and its expected outcome.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub request: RequestSpec,
    pub expect: bool,
    /// Path variables the request must hold after matching.
    #[serde(default)]
    pub variables: Option<HashMap<String, String>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case.
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: bool,
    pub actual: bool,
    /// Recorded path variables; `None` when no template matched.
    pub variables: Option<HashMap<String, String>>,
}

/// Why a fixture could not run.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("fixture `{fixture}`: {source}")]
    Build {
        fixture: String,
        #[source]
        source: BuildError,
    },

    #[error("fixture `{fixture}` built, but a build error was expected")]
    UnexpectedBuild { fixture: String },

    #[error("fixture `{fixture}` case `{case}`: {source}")]
    Request {
        fixture: String,
        case: String,
        #[source]
        source: crate::SpecError,
    },
}

impl Fixture {
    /// Parse a fixture from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators.
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    fn build(&self) -> Result<Condition<Request>, BuildError> {
        match &self.template {
            Some(t) => variable_condition(&t.path, t.prefix),
            None => gatecond_http::build(&self.cond),
        }
    }

    /// Build the condition and run every case.
    ///
    /// A fixture expecting a build error yields no case results.
    pub fn run(&self) -> Result<Vec<CaseResult>, FixtureError> {
        let cond = match (self.build(), self.expect_error) {
            (Ok(cond), false) => cond,
            (Err(_), true) => return Ok(Vec::new()),
            (Ok(_), true) => {
                return Err(FixtureError::UnexpectedBuild {
                    fixture: self.name.clone(),
                })
            }
            (Err(source), false) => {
                return Err(FixtureError::Build {
                    fixture: self.name.clone(),
                    source,
                })
            }
        };

        self.cases
            .iter()
            .map(|case| {
                let req = case.request.clone().into_request().map_err(|source| {
                    FixtureError::Request {
                        fixture: self.name.clone(),
                        case: case.name.clone(),
                        source,
                    }
                })?;
                let actual = cond.matches(&req);
                let variables = req.path_variables();
                let vars_ok = case
                    .variables
                    .as_ref()
                    .map_or(true, |v| variables.as_ref() == Some(v));
                Ok(CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == case.expect && vars_ok,
                    expected: case.expect,
                    actual,
                    variables,
                })
            })
            .collect()
    }

    /// Run all test cases and panic on the first failure.
    pub fn run_and_assert(&self) {
        let results = self.run().unwrap_or_else(|e| panic!("{e}"));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {}, got {} (variables {:?})",
                self.name, result.case_name, result.expected, result.actual, result.variables
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_inline_fixture() {
        let fixture = Fixture::from_yaml(
            r#"
name: method
cond: 'req_method_in("GET|HEAD")'
cases:
  - name: get
    expect: true
  - name: post
    request: { method: POST }
    expect: false
"#,
        )
        .unwrap();
        let results = fixture.run().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn expected_error_fixture() {
        let fixture = Fixture::from_yaml(
            r#"
name: bad
cond: 'req_path_in("/a")'
expect_error: true
"#,
        )
        .unwrap();
        assert!(fixture.run().unwrap().is_empty());

        let wrong = Fixture::from_yaml("name: ok\ncond: default_t()\nexpect_error: true\n").unwrap();
        assert!(matches!(
            wrong.run(),
            Err(FixtureError::UnexpectedBuild { .. })
        ));
    }

    #[test]
    fn template_fixture_checks_variables() {
        let fixture = Fixture::from_yaml(
            r#"
name: user template
template: { path: "/user/{id}" }
cases:
  - name: hit
    request: { uri: /user/7 }
    expect: true
    variables: { id: "7" }
"#,
        )
        .unwrap();
        fixture.run_and_assert();
    }
}
