//! Rule-file fixture runner.
//!
//! Exercises the production loading path: YAML → [`RuleSetConfig`] →
//! [`RuleSetConfig::load`] against the HTTP table → first-match-wins
//! evaluation. Actions are plain strings.

use gatecond::{LoadError, RuleSetConfig};
use serde::Deserialize;

use crate::RequestSpec;

/// A rule-set fixture.
#[derive(Debug, Deserialize)]
pub struct RuleFixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub config: RuleSetConfig<String>,
    #[serde(default)]
    pub cases: Vec<RuleCase>,
    /// The rule index that must fail to load.
    #[serde(default)]
    pub expect_error_at: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RuleCase {
    pub name: String,
    #[serde(default)]
    pub request: RequestSpec,
    pub expect: Option<String>,
}

impl RuleFixture {
    /// Parse multiple fixtures from a YAML file with `---` separators.
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Load the rule set and check every case, panicking on the first failure.
    pub fn run_and_assert(self) {
        let name = self.name;
        let loaded = self.config.load(gatecond_http::table());

        match (loaded, self.expect_error_at) {
            (Err(LoadError::Rule { index, .. }), Some(expected)) => {
                assert_eq!(index, expected, "Fixture '{name}' failed at the wrong rule");
            }
            (Err(e), _) => panic!("Fixture '{name}' failed to load: {e}"),
            (Ok(_), Some(expected)) => {
                panic!("Fixture '{name}' loaded, but rule {expected} should have failed")
            }
            (Ok(rules), None) => {
                for case in self.cases {
                    let req = case
                        .request
                        .into_request()
                        .unwrap_or_else(|e| panic!("Fixture '{name}' case '{}': {e}", case.name));
                    let actual = rules.evaluate(&req);
                    assert_eq!(
                        actual, case.expect,
                        "Fixture '{name}' case '{}' failed",
                        case.name
                    );
                }
            }
        }
    }
}
