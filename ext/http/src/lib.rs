//! gatecond-http: the HTTP request model and primitive table
//!
//! This crate instantiates the generic `gatecond` engine for HTTP:
//!
//! - [`Request`]: method, URI, headers, session and TLS state, response,
//!   tags, and a per-request context that path-variable conditions write to
//! - [`fetchers`]: one fetcher per request attribute
//! - [`register_http_primitives`]: every `req_*`, `ses_*` and `res_*` primitive
//! - [`build`]: compile condition text against the process-wide table
//!
//! # Example
//!
//! ```
//! use gatecond_http::{build, Request};
//!
//! let cond = build(r#"req_host_in("example.com") && req_path_prefix_in("/api/", false)"#)
//!     .unwrap();
//!
//! let req = Request::builder()
//!     .uri("http://example.com/api/users")
//!     .build()
//!     .unwrap();
//! assert!(cond.matches(&req));
//! ```

mod context;
pub mod fetchers;
mod primitives;
mod request;
mod variable;

use std::sync::OnceLock;

use gatecond::{BuildError, Compiler, Condition, PrimitiveTable, PrimitiveTableBuilder};

pub use context::{decode_component, parse_cookies, parse_query, split_host_port};
pub use primitives::register_http_primitives;
pub use request::{Request, RequestBuilder, RequestContext, Response, Session, TlsState};
pub use variable::{variable_condition, RequestVariableSink};

#[cfg(feature = "config")]
pub use rules::{load_rules_json, load_rules_yaml};

/// The process-wide HTTP primitive table, built on first use.
pub fn table() -> &'static PrimitiveTable<Request> {
    static TABLE: OnceLock<PrimitiveTable<Request>> = OnceLock::new();
    TABLE.get_or_init(|| register_http_primitives(PrimitiveTableBuilder::new()).build())
}

/// Compile condition text against the HTTP primitive table.
///
/// # Errors
///
/// Any syntax, free-variable, semantic, or argument error. No partial
/// condition is ever returned.
pub fn build(text: &str) -> Result<Condition<Request>, BuildError> {
    Compiler::new(table()).build(text)
}

#[cfg(feature = "config")]
mod rules {
    use gatecond::{LoadError, RuleSet, RuleSetConfig};
    use serde::de::DeserializeOwned;

    use crate::Request;

    /// Load a YAML rule file against the HTTP primitive table.
    ///
    /// # Errors
    ///
    /// Malformed YAML, too many rules, or any rule failing to build.
    pub fn load_rules_yaml<A>(text: &str) -> Result<RuleSet<Request, A>, LoadError>
    where
        A: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        RuleSetConfig::<A>::from_yaml(text)?.load(super::table())
    }

    /// Load a JSON rule file against the HTTP primitive table.
    ///
    /// # Errors
    ///
    /// Malformed JSON, too many rules, or any rule failing to build.
    pub fn load_rules_json<A>(text: &str) -> Result<RuleSet<Request, A>, LoadError>
    where
        A: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        RuleSetConfig::<A>::from_json(text)?.load(super::table())
    }

}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        build, register_http_primitives, table, variable_condition, Request, RequestBuilder,
        Response, Session, TlsState,
    };
    pub use gatecond::prelude::*;
}
