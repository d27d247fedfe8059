//! `Fetcher` implementations for [`Request`].
//!
//! Attributes that need no configuration are [`FnFetcher`] constants; keyed
//! attributes (a header name, a query key, ...) are small structs. Every
//! fetcher returns an error when its prerequisite is missing, which the
//! condition turns into a non-match.

use chrono::Utc;
use gatecond::{parse_time, FetchError, Fetcher, FnFetcher, Value};
use http::header::{COOKIE, USER_AGENT};
use http::{HeaderMap, Version};

use crate::context::{parse_cookies, query_keys, query_values};
use crate::request::{header_value, Request, Session, TlsState};

/// Header that overrides the request time, for reproducible time-range
/// tests. The value is an absolute time literal (`yyyyMMddhhmmssZ`).
pub const DEBUG_TIME_HEADER: &str = "x-debug-time";

fn session(req: &Request) -> Result<&Session, FetchError> {
    req.session().ok_or(FetchError::NoSession)
}

fn tls(req: &Request) -> Result<&TlsState, FetchError> {
    session(req)?.tls.as_ref().ok_or(FetchError::NoTlsState)
}

fn names(headers: &HeaderMap) -> Value {
    Value::StrList(headers.keys().map(|k| k.as_str().to_string()).collect())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request line and host
// ═══════════════════════════════════════════════════════════════════════════════

/// Protocol version as `HTTP/x.y`.
pub const PROTO: FnFetcher<Request> = FnFetcher::new("proto", |req| {
    let proto = match req.version() {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    };
    Ok(Value::from(proto))
});

pub const METHOD: FnFetcher<Request> =
    FnFetcher::new("method", |req| Ok(Value::from(req.method().as_str())));

/// Explicit port, else 443 or 80 by the session's secure flag.
pub const PORT: FnFetcher<Request> = FnFetcher::new("port", |req| {
    let port = match req.port() {
        Some(port) => port,
        None if session(req)?.secure => 443,
        None => 80,
    };
    Ok(Value::Str(port.to_string()))
});

/// Lower-cased host without port.
pub const HOST: FnFetcher<Request> = FnFetcher::new("host", |req| {
    req.host()
        .map(Value::Str)
        .ok_or_else(|| FetchError::NoHeader("host".to_string()))
});

pub const HOST_TAG: FnFetcher<Request> = FnFetcher::new("host_tag", |req| {
    req.host_tag().map(Value::from).ok_or(FetchError::NoHostTag)
});

/// Path without the query string.
pub const PATH: FnFetcher<Request> = FnFetcher::new("path", |req| Ok(Value::from(req.path())));

/// Request target: path plus query string.
pub const URL: FnFetcher<Request> = FnFetcher::new("url", |req| {
    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.path(), |pq| pq.as_str());
    Ok(Value::from(target))
});

pub const USER_AGENT_VALUE: FnFetcher<Request> = FnFetcher::new("user_agent", |req| {
    header_value(req.headers(), USER_AGENT.as_str())
        .map(Value::Str)
        .ok_or_else(|| FetchError::NoHeader(USER_AGENT.as_str().to_string()))
});

/// Request time: now, unless the request carries [`DEBUG_TIME_HEADER`].
pub const TIME: FnFetcher<Request> = FnFetcher::new("time", |req| {
    match header_value(req.headers(), DEBUG_TIME_HEADER) {
        Some(raw) => parse_time(&raw)
            .map(Value::Time)
            .map_err(|_| FetchError::BadDebugTime(raw)),
        None => Ok(Value::Time(Utc::now().fixed_offset())),
    }
});

// ═══════════════════════════════════════════════════════════════════════════════
// Addresses and session
// ═══════════════════════════════════════════════════════════════════════════════

pub const CLIENT_IP: FnFetcher<Request> = FnFetcher::new("client_ip", |req| {
    req.client_ip().map(Value::Ip).ok_or(FetchError::NoClientIp)
});

pub const CLIENT_TRUSTED: FnFetcher<Request> =
    FnFetcher::new("client_trusted", |req| Ok(Value::Bool(session(req)?.trusted)));

pub const SECURE: FnFetcher<Request> =
    FnFetcher::new("secure", |req| Ok(Value::Bool(session(req)?.secure)));

pub const VIP: FnFetcher<Request> = FnFetcher::new("vip", |req| {
    session(req)?
        .vip
        .map(Value::Ip)
        .ok_or(FetchError::NoSessionAddr("virtual"))
});

pub const PEER_IP: FnFetcher<Request> = FnFetcher::new("peer_ip", |req| {
    session(req)?
        .peer_ip
        .map(Value::Ip)
        .ok_or(FetchError::NoSessionAddr("peer"))
});

pub const TLS_SNI: FnFetcher<Request> =
    FnFetcher::new("tls_sni", |req| Ok(Value::Str(tls(req)?.sni.clone())));

pub const TLS_CLIENT_AUTH: FnFetcher<Request> =
    FnFetcher::new("tls_client_auth", |req| Ok(Value::Bool(tls(req)?.client_auth)));

pub const TLS_CLIENT_CA: FnFetcher<Request> = FnFetcher::new("tls_client_ca", |req| {
    tls(req)?
        .client_ca_name
        .clone()
        .map(Value::Str)
        .ok_or(FetchError::NoTlsValue("client CA name"))
});

// ═══════════════════════════════════════════════════════════════════════════════
// Query, cookies, headers
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether the query string is non-empty.
pub const QUERY_EXIST: FnFetcher<Request> = FnFetcher::new("query_exist", |req| {
    Ok(Value::Bool(req.query().is_some_and(|q| !q.is_empty())))
});

pub const QUERY_KEYS: FnFetcher<Request> = FnFetcher::new("query_keys", |req| {
    Ok(Value::StrList(query_keys(req.query().unwrap_or_default())))
});

pub const COOKIE_KEYS: FnFetcher<Request> = FnFetcher::new("cookie_keys", |req| {
    let mut keys: Vec<String> = Vec::new();
    for header in req.headers().get_all(COOKIE) {
        let Ok(header) = header.to_str() else { continue };
        for (name, _) in parse_cookies(header) {
            if !keys.iter().any(|k| k == name) {
                keys.push(name.to_string());
            }
        }
    }
    Ok(Value::StrList(keys))
});

pub const HEADER_KEYS: FnFetcher<Request> =
    FnFetcher::new("header_keys", |req| Ok(names(req.headers())));

/// Every value of one query key.
#[derive(Debug, Clone)]
pub struct QueryValueFetcher {
    key: String,
}

impl QueryValueFetcher {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Fetcher<Request> for QueryValueFetcher {
    fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
        query_values(req.query().unwrap_or_default(), &self.key)
            .map(Value::StrList)
            .ok_or_else(|| FetchError::NoQueryKey(self.key.clone()))
    }
}

/// Value of the first cookie with a given name.
#[derive(Debug, Clone)]
pub struct CookieValueFetcher {
    name: String,
}

impl CookieValueFetcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Fetcher<Request> for CookieValueFetcher {
    fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
        req.headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(|h| {
                parse_cookies(h)
                    .into_iter()
                    .find(|(name, _)| *name == self.name)
                    .map(|(_, value)| Value::from(value))
            })
            .ok_or_else(|| FetchError::NoCookie(self.name.clone()))
    }
}

/// First value of a request header. Names are case-insensitive.
#[derive(Debug, Clone)]
pub struct HeaderValueFetcher {
    name: String,
}

impl HeaderValueFetcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
        }
    }
}

impl Fetcher<Request> for HeaderValueFetcher {
    fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
        header_value(req.headers(), &self.name)
            .map(Value::Str)
            .ok_or_else(|| FetchError::NoHeader(self.name.clone()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tags and context
// ═══════════════════════════════════════════════════════════════════════════════

/// Every value of one request tag.
#[derive(Debug, Clone)]
pub struct TagFetcher {
    name: String,
}

impl TagFetcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Fetcher<Request> for TagFetcher {
    fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
        req.tag(&self.name)
            .map(|values| Value::StrList(values.to_vec()))
            .ok_or_else(|| FetchError::NoTag(self.name.clone()))
    }
}

/// A value from the per-request context.
#[derive(Debug, Clone)]
pub struct ContextValueFetcher {
    key: String,
}

impl ContextValueFetcher {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Fetcher<Request> for ContextValueFetcher {
    fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
        req.context_value(&self.key)
            .map(Value::Str)
            .ok_or_else(|| FetchError::NoContextKey(self.key.clone()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Response status code as a decimal string.
pub const RES_CODE: FnFetcher<Request> = FnFetcher::new("res_code", |req| {
    let res = req.response().ok_or(FetchError::NoResponse)?;
    Ok(Value::from(res.status.as_str()))
});

pub const RES_HEADER_KEYS: FnFetcher<Request> = FnFetcher::new("res_header_keys", |req| {
    let res = req.response().ok_or(FetchError::NoResponse)?;
    Ok(names(&res.headers))
});

/// First value of a response header.
#[derive(Debug, Clone)]
pub struct ResHeaderValueFetcher {
    name: String,
}

impl ResHeaderValueFetcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
        }
    }
}

impl Fetcher<Request> for ResHeaderValueFetcher {
    fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
        let res = req.response().ok_or(FetchError::NoResponse)?;
        header_value(&res.headers, &self.name)
            .map(Value::Str)
            .ok_or_else(|| FetchError::NoHeader(self.name.clone()))
    }
}
