//! gatecond - condition language for L7 routing and policy rules
//!
//! Operators write boolean expressions over request attributes:
//!
//! ```text
//! req_host_in("www.example.com|example.com") && !req_cip_trusted()
//!     || req_path_prefix_in("/static/", false)
//! ```
//!
//! An expression is compiled once against a table of primitives and then
//! evaluated per request, from any number of threads.
//!
//! # Architecture
//!
//! The crate is split into a context-free front end and a context-generic
//! back end:
//!
//! - [`scanner`] / [`parser`]: text → tokens → [`ast::Node`]
//! - [`walker`] / [`checker`]: free-variable and signature checks
//! - [`PrimitiveTable<Ctx>`]: name → argument kinds + constructor
//! - [`Compiler<Ctx>`]: text → [`Condition<Ctx>`], all-or-nothing
//! - [`Fetcher<Ctx>`]: domain-specific extraction, returns a [`Value`]
//! - [`ValueMatcher`]: domain-agnostic matching (non-generic, shareable)
//! - [`RuleSet<Ctx, A>`]: ordered rules with first-match-wins semantics
//!
//! # Key Invariants
//!
//! 1. **Fetch error → false**: when a [`Fetcher`] cannot produce a value, the
//!    primitive does not match. Errors never escape [`Condition::matches`].
//!
//! 2. **Immutable after build**: a [`Condition`] holds no interior state and
//!    is `Send + Sync` whenever its context type allows.
//!
//! # Example
//!
//! ```
//! use gatecond::prelude::*;
//!
//! #[derive(Debug)]
//! struct Request { path: String }
//!
//! #[derive(Debug)]
//! struct PathFetcher;
//!
//! impl Fetcher<Request> for PathFetcher {
//!     fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
//!         Ok(Value::Str(req.path.clone()))
//!     }
//! }
//!
//! let table = register_core_primitives(PrimitiveTableBuilder::<Request>::new())
//!     .primitive("path_in", &[ArgKind::Str], |args| {
//!         Ok(Condition::primitive(
//!             "path_in",
//!             Box::new(PathFetcher),
//!             Box::new(InMatcher::new(args.str(0)?, false)),
//!         ))
//!     })
//!     .build();
//!
//! let cond = Compiler::new(&table).build(r#"path_in("/a|/b") && default_t()"#).unwrap();
//! assert!(cond.matches(&Request { path: "/b".to_string() }));
//! assert!(!cond.matches(&Request { path: "/c".to_string() }));
//! ```
//!
//! # Extensions
//!
//! - [`gatecond-http`](https://docs.rs/gatecond-http): HTTP request model and
//!   the full primitive table
//! - [`gatecond-test`](https://docs.rs/gatecond-test): conformance fixtures

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

pub mod ast;
pub mod checker;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod walker;

mod compiler;
mod condition;
mod error;
mod fetcher;
mod hash_matcher;
mod ip_matcher;
mod registry;
mod rule;
mod time_matcher;
mod trace;
mod value;
mod value_matcher;
mod variable;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use compiler::Compiler;
pub use condition::{BinaryCond, BinaryOp, Condition, PrimitiveCond, UnaryCond, UnaryOp};
pub use error::{BuildError, FetchError, SemanticError, ValueError};
pub use fetcher::{FnFetcher, Fetcher};
pub use registry::{
    register_core_primitives, ArgKind, Args, Primitive, PrimitiveTable, PrimitiveTableBuilder,
};
pub use rule::{Rule, RuleSet};
pub use value::Value;
pub use variable::{VariableCond, VariableMatcher, VariableSink};

// Rule files (feature-gated)
#[cfg(feature = "config")]
pub use config::{load_json, load_yaml, LoadError, RuleConfig, RuleSetConfig};

// Trace types
pub use trace::{ConditionTrace, EvalStep, EvalTrace};

// Concrete matchers
pub use hash_matcher::{bucket, murmur3_x64_128, HashValueMatcher, HASH_BUCKETS};
pub use ip_matcher::{ip_bytes, parse_ip, IpInMatcher, IpRangeMatcher};
pub use time_matcher::{parse_time, parse_time_of_day, zone_offset, PeriodicTimeMatcher, TimeMatcher};
pub use value_matcher::{
    split_patterns, BoolMatcher, ContainMatcher, ExactMatcher, InMatcher,
    PathElementPrefixMatcher, PrefixInMatcher, RegMatcher, SuffixInMatcher, ValueMatcher,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use gatecond::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        register_core_primitives, ArgKind, Args, BuildError, Compiler, Condition,
        ConditionTrace, EvalTrace, FetchError, Fetcher, FnFetcher, PrimitiveTable,
        PrimitiveTableBuilder, Rule, RuleSet, Value, ValueError, ValueMatcher,
        // Matchers
        BoolMatcher, ContainMatcher, ExactMatcher, HashValueMatcher, InMatcher, IpInMatcher,
        IpRangeMatcher, PathElementPrefixMatcher, PeriodicTimeMatcher, PrefixInMatcher,
        RegMatcher, SuffixInMatcher, TimeMatcher, VariableMatcher,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting of parentheses and `!` in one condition.
///
/// This limit protects the recursive-descent parser and the evaluator against
/// stack overflow. Flat `&&`/`||` chains are not counted.
pub const MAX_DEPTH: usize = 64;

/// Maximum number of rules in a single [`RuleSet`] loaded from a file.
pub const MAX_RULES: usize = 4096;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Condition<String>>();
        assert_send_sync::<PrimitiveTable<String>>();
    }
}
