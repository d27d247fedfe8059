//! gatecond-test: conformance fixtures for the HTTP primitives
//!
//! [`RequestSpec`] is a plain description of a request (method, URI, headers,
//! cookies, addresses, session and TLS state, response, tags, context) that
//! turns into a [`Request`]. With the `fixtures` feature it deserializes from
//! YAML, and the [`fixture`] and [`rule_fixture`] modules run condition and
//! rule-file fixtures against the HTTP primitive table.
//!
//! # Example
//!
//! ```
//! use gatecond_test::prelude::*;
//!
//! let req = RequestSpec::new()
//!     .uri("/api/users?page=2")
//!     .header("X-Env", "prod")
//!     .into_request()
//!     .unwrap();
//!
//! let cond = build(r#"req_header_value_in("x-env", "prod", false)"#).unwrap();
//! assert!(cond.matches(&req));
//! ```

use std::collections::BTreeMap;
use std::net::IpAddr;

use gatecond_http::{Request, Response, Session, TlsState};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};

#[cfg(feature = "fixtures")]
pub mod fixture;
#[cfg(feature = "fixtures")]
pub mod rule_fixture;

/// Why a [`RequestSpec`] could not become a [`Request`].
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error(transparent)]
    Http(#[from] http::Error),

    #[error("unknown protocol version `{0}`")]
    Version(String),

    #[error("invalid status code {0}")]
    Status(u16),
}

/// Description of one request.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "fixtures", derive(serde::Deserialize), serde(default))]
pub struct RequestSpec {
    pub method: Option<String>,
    pub uri: Option<String>,
    /// `HTTP/1.0`, `HTTP/1.1`, `HTTP/2.0`, ...
    pub version: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub client_ip: Option<IpAddr>,
    pub session: Option<SessionSpec>,
    pub response: Option<ResponseSpec>,
    pub host_tag: Option<String>,
    pub tags: BTreeMap<String, Vec<String>>,
    pub context: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "fixtures", derive(serde::Deserialize), serde(default))]
pub struct SessionSpec {
    pub peer_ip: Option<IpAddr>,
    pub vip: Option<IpAddr>,
    pub secure: bool,
    pub trusted: bool,
    pub tls: Option<TlsSpec>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "fixtures", derive(serde::Deserialize), serde(default))]
pub struct TlsSpec {
    pub sni: String,
    pub client_auth: bool,
    pub client_ca: Option<String>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "fixtures", derive(serde::Deserialize), serde(default))]
pub struct ResponseSpec {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
        }
    }
}

impl RequestSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    #[must_use]
    pub fn session(mut self, session: SessionSpec) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the described [`Request`].
    ///
    /// # Errors
    ///
    /// An invalid method, URI, header, protocol version, or status code.
    pub fn into_request(self) -> Result<Request, SpecError> {
        let mut builder = Request::builder();
        if let Some(method) = &self.method {
            builder = builder.method(method.as_str());
        }
        if let Some(uri) = &self.uri {
            builder = builder.uri(uri.as_str());
        }
        if let Some(version) = &self.version {
            builder = builder.version(parse_version(version)?);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in &self.cookies {
            builder = builder.cookie(name, value);
        }
        if let Some(ip) = self.client_ip {
            builder = builder.client_ip(ip);
        }
        if let Some(session) = self.session {
            builder = builder.session(session.into_session());
        }
        if let Some(response) = self.response {
            builder = builder.response(response.into_response()?);
        }
        if let Some(tag) = self.host_tag {
            builder = builder.host_tag(tag);
        }
        for (name, values) in self.tags {
            for value in values {
                builder = builder.tag(name.clone(), value);
            }
        }
        for (key, value) in self.context {
            builder = builder.context_value(key, value);
        }
        Ok(builder.build()?)
    }
}

impl SessionSpec {
    fn into_session(self) -> Session {
        Session {
            peer_ip: self.peer_ip,
            vip: self.vip,
            secure: self.secure,
            trusted: self.trusted,
            tls: self.tls.map(|tls| TlsState {
                sni: tls.sni,
                client_auth: tls.client_auth,
                client_ca_name: tls.client_ca,
            }),
        }
    }
}

impl ResponseSpec {
    fn into_response(self) -> Result<Response, SpecError> {
        let status = StatusCode::from_u16(self.status).map_err(|_| SpecError::Status(self.status))?;
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str()).map_err(http::Error::from)?;
            let value = HeaderValue::try_from(value.as_str()).map_err(http::Error::from)?;
            headers.append(name, value);
        }
        Ok(Response { status, headers })
    }
}

fn parse_version(s: &str) -> Result<Version, SpecError> {
    match s {
        "HTTP/0.9" => Ok(Version::HTTP_09),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/2" | "HTTP/2.0" => Ok(Version::HTTP_2),
        "HTTP/3" | "HTTP/3.0" => Ok(Version::HTTP_3),
        other => Err(SpecError::Version(other.to_string())),
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{RequestSpec, ResponseSpec, SessionSpec, SpecError, TlsSpec};
    pub use gatecond_http::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_is_default_request() {
        let req = RequestSpec::new().into_request().unwrap();
        assert_eq!(*req.method(), http::Method::GET);
        assert_eq!(req.path(), "/");
        assert!(req.session().is_none());
    }

    #[test]
    fn spec_carries_every_part() {
        let mut spec = RequestSpec::new()
            .method("PUT")
            .uri("http://example.com:8080/a?b=c")
            .header("X-Env", "prod")
            .cookie("uid", "42")
            .client_ip("10.0.0.1".parse().unwrap())
            .session(SessionSpec {
                secure: true,
                tls: Some(TlsSpec {
                    sni: "example.com".into(),
                    ..TlsSpec::default()
                }),
                ..SessionSpec::default()
            });
        spec.version = Some("HTTP/2.0".into());
        spec.response = Some(ResponseSpec {
            status: 404,
            headers: BTreeMap::from([("Server".to_string(), "edge".to_string())]),
        });
        spec.tags.insert("zone".into(), vec!["a".into(), "b".into()]);
        spec.context.insert("tenant".into(), "acme".into());

        let req = spec.into_request().unwrap();
        assert_eq!(*req.method(), http::Method::PUT);
        assert_eq!(req.version(), Version::HTTP_2);
        assert_eq!(req.port(), Some(8080));
        assert_eq!(req.header("x-env").as_deref(), Some("prod"));
        assert_eq!(req.client_ip(), Some("10.0.0.1".parse().unwrap()));
        assert_eq!(req.response().unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(req.tag("zone").unwrap().len(), 2);
        assert_eq!(req.context_value("tenant").as_deref(), Some("acme"));
        assert_eq!(req.session().unwrap().tls.as_ref().unwrap().sni, "example.com");
    }

    #[test]
    fn invalid_parts_are_reported() {
        let mut spec = RequestSpec::new();
        spec.version = Some("SPDY/3".into());
        assert!(matches!(spec.into_request(), Err(SpecError::Version(_))));

        let mut spec = RequestSpec::new();
        spec.response = Some(ResponseSpec {
            status: 42,
            ..ResponseSpec::default()
        });
        assert!(matches!(spec.into_request(), Err(SpecError::Status(42))));

        let spec = RequestSpec::new().header("bad header", "x");
        assert!(matches!(spec.into_request(), Err(SpecError::Http(_))));
    }
}
