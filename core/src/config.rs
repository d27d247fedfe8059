//! Rule files: serde-deserializable rule sets.
//!
//! A rule file is an ordered list of `{ cond, action }` entries plus an
//! optional `default` action:
//!
//! ```yaml
//! rules:
//!   - cond: 'req_host_in("api.example.com") && req_path_prefix_in("/v1", false)'
//!     action: api_v1
//!   - cond: 'req_cip_trusted()'
//!     action: internal
//! default: deny
//! ```
//!
//! Loading is all-or-nothing. If any rule fails to build, the whole file is
//! rejected and the error names the rule index, so the previously loaded rule
//! set stays in force.
//!
//! | Config type | Runtime type |
//! |-------------|-------------|
//! | [`RuleSetConfig`] | [`RuleSet`] |
//! | [`RuleConfig`] | [`Rule`] |

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{BuildError, Compiler, PrimitiveTable, Rule, RuleSet, MAX_RULES};

/// Configuration for a [`RuleSet`].
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
pub struct RuleSetConfig<A> {
    /// Rules in evaluation order (first-match-wins).
    pub rules: Vec<RuleConfig<A>>,

    /// Action when no rule matches.
    #[serde(default)]
    pub default: Option<A>,
}

/// Configuration for one [`Rule`].
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
pub struct RuleConfig<A> {
    /// Condition text.
    pub cond: String,
    pub action: A,
}

/// Error loading a rule file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid YAML rule file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON rule file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rule {index} `{cond}`: {source}")]
    Rule {
        index: usize,
        cond: String,
        #[source]
        source: BuildError,
    },

    #[error("rule file has {count} rules, but the maximum is {max}")]
    TooManyRules { count: usize, max: usize },
}

impl<A: DeserializeOwned> RuleSetConfig<A> {
    /// # Errors
    ///
    /// [`LoadError::Yaml`] if the text does not deserialize.
    pub fn from_yaml(text: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// # Errors
    ///
    /// [`LoadError::Json`] if the text does not deserialize.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl<A: Clone + Send + Sync + 'static> RuleSetConfig<A> {
    /// Build every rule against `table`.
    ///
    /// # Errors
    ///
    /// - [`LoadError::TooManyRules`] over [`MAX_RULES`]
    /// - [`LoadError::Rule`] for the first rule that fails to build
    pub fn load<Ctx>(self, table: &PrimitiveTable<Ctx>) -> Result<RuleSet<Ctx, A>, LoadError> {
        if self.rules.len() > MAX_RULES {
            return Err(LoadError::TooManyRules {
                count: self.rules.len(),
                max: MAX_RULES,
            });
        }

        let compiler = Compiler::new(table);
        let rules = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| match compiler.build(&rule.cond) {
                Ok(condition) => Ok(Rule::new(condition, rule.action)),
                Err(source) => Err(LoadError::Rule {
                    index,
                    cond: rule.cond,
                    source,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "loaded rule set: {} rules, default {}",
            rules.len(),
            if self.default.is_some() { "set" } else { "unset" }
        );
        Ok(RuleSet::new(rules, self.default))
    }
}

/// Deserialize a YAML rule file and build it against `table`.
///
/// # Errors
///
/// See [`RuleSetConfig::from_yaml`] and [`RuleSetConfig::load`].
pub fn load_yaml<Ctx, A>(text: &str, table: &PrimitiveTable<Ctx>) -> Result<RuleSet<Ctx, A>, LoadError>
where
    A: DeserializeOwned + Clone + Send + Sync + 'static,
{
    RuleSetConfig::from_yaml(text)?.load(table)
}

/// Deserialize a JSON rule file and build it against `table`.
///
/// # Errors
///
/// See [`RuleSetConfig::from_json`] and [`RuleSetConfig::load`].
pub fn load_json<Ctx, A>(text: &str, table: &PrimitiveTable<Ctx>) -> Result<RuleSet<Ctx, A>, LoadError>
where
    A: DeserializeOwned + Clone + Send + Sync + 'static,
{
    RuleSetConfig::from_json(text)?.load(table)
}
