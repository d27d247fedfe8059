//! Error types.
//!
//! Every failure of [`Compiler::build`](crate::Compiler::build) is a single
//! [`BuildError`]. [`FetchError`] never escapes a condition: a failed fetch is
//! a non-match.

use crate::token::Pos;

/// Why a condition could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Lexical or grammatical error. The earliest one in the source wins.
    #[error("syntax error at {pos}: {msg}")]
    Syntax { pos: Pos, msg: String },

    /// A bare identifier that is not a primitive call.
    #[error("found unresolved variable `{name}` at `{pos}`")]
    UnresolvedVariable { name: String, pos: Pos },

    /// One or more calls failed the semantic check.
    #[error("{}", join_semantic(.0))]
    Semantic(Vec<SemanticError>),

    /// A well-typed literal argument was rejected by its primitive.
    #[error("invalid argument to `{primitive}` at {pos}: {source}")]
    InvalidArgument {
        primitive: String,
        pos: Pos,
        #[source]
        source: ValueError,
    },

    /// The compiler met an operator it has no combinator for.
    #[error("unsupported operator `{op}` at {pos}")]
    UnsupportedOperator { op: String, pos: Pos },

    /// Nesting exceeds the compiler's depth limit.
    #[error("condition nesting depth {depth} exceeds maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },
}

fn join_semantic(errors: &[SemanticError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A call expression that does not fit the primitive table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("unknown primitive `{name}` at {pos}")]
    UnknownPrimitive { name: String, pos: Pos },

    #[error("`{name}` at {pos} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        name: String,
        pos: Pos,
        expected: usize,
        got: usize,
    },

    #[error("argument {index} of `{name}` at {pos} must be {expected}, got {got}")]
    ArgumentKind {
        name: String,
        pos: Pos,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },
}

/// A literal argument that is well-typed but semantically invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("invalid regex `{pattern}`: {reason}")]
    Regex { pattern: String, reason: String },

    #[error("invalid IP address `{0}`")]
    Ip(String),

    #[error("IP range `{start}`..`{end}` mixes IPv4 and IPv6")]
    IpFamilyMismatch { start: String, end: String },

    #[error("IP range start `{start}` is greater than end `{end}`")]
    IpRangeInverted { start: String, end: String },

    #[error("hash section `{0}` is not a number or number range")]
    HashSection(String),

    #[error("hash bucket {value} out of range, must be below {max}")]
    HashOutOfRange { value: u64, max: u64 },

    #[error("hash range start {start} is greater than end {end}")]
    HashRangeInverted { start: u64, end: u64 },

    #[error("host pattern `{0}` must not contain a port")]
    HostWithPort(String),

    #[error("invalid time `{0}`")]
    Time(String),

    #[error("time range start `{start}` is after end `{end}`")]
    TimeRangeInverted { start: String, end: String },

    #[error("unsupported period `{0}`, only daily (\"\") is supported")]
    Period(String),

    #[error("invalid port `{0}`")]
    Port(String),

    #[error("invalid status code `{0}`")]
    StatusCode(String),

    #[error("invalid path template `{template}`: {reason}")]
    Template { template: String, reason: String },

    #[error("duplicate variable `{name}` in path template")]
    DuplicateVariable { name: String },

    /// The primitive constructor read an argument the table did not declare.
    #[error("argument {0} missing or of the wrong kind")]
    Argument(usize),
}

/// Why a fetcher could not produce a value. Swallowed as non-match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("no session")]
    NoSession,
    #[error("session has no {0} address")]
    NoSessionAddr(&'static str),
    #[error("no TLS state")]
    NoTlsState,
    #[error("TLS state has no {0}")]
    NoTlsValue(&'static str),
    #[error("no URL")]
    NoUrl,
    #[error("no header `{0}`")]
    NoHeader(String),
    #[error("no cookie `{0}`")]
    NoCookie(String),
    #[error("no query key `{0}`")]
    NoQueryKey(String),
    #[error("no response")]
    NoResponse,
    #[error("no client IP")]
    NoClientIp,
    #[error("no host tag")]
    NoHostTag,
    #[error("no tag `{0}`")]
    NoTag(String),
    #[error("no context value `{0}`")]
    NoContextKey(String),
    #[error("bad debug time `{0}`")]
    BadDebugTime(String),
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_variable_message() {
        let err = BuildError::UnresolvedVariable {
            name: "a".into(),
            pos: Pos(0),
        };
        assert_eq!(err.to_string(), "found unresolved variable `a` at `0`");
    }

    #[test]
    fn semantic_errors_are_joined() {
        let err = BuildError::Semantic(vec![
            SemanticError::UnknownPrimitive {
                name: "foo".into(),
                pos: Pos(0),
            },
            SemanticError::ArgumentCount {
                name: "bar".into(),
                pos: Pos(10),
                expected: 2,
                got: 1,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "unknown primitive `foo` at 0; `bar` at 10 expects 2 argument(s), got 1"
        );
    }

    #[test]
    fn invalid_argument_carries_source() {
        let err = BuildError::InvalidArgument {
            primitive: "req_cip_range".into(),
            pos: Pos(0),
            source: ValueError::Ip("x".into()),
        };
        assert!(err.to_string().contains("invalid IP address `x`"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
