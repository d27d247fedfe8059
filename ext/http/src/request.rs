//! `Request`: the HTTP request model conditions are evaluated against.
//!
//! A request carries what a reverse proxy knows about one in-flight
//! exchange: the request line and headers, routing tags, the resolved client
//! address, the downstream session, and (once available) the upstream
//! response. Everything but the per-request [`RequestContext`] is read-only
//! during matching.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri, Version};

/// TLS state of a downstream session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsState {
    /// Server name sent by the client, empty if none.
    pub sni: String,
    /// Whether the client presented a verified certificate.
    pub client_auth: bool,
    /// Common name of the CA that issued the client certificate.
    pub client_ca_name: Option<String>,
}

/// Downstream connection state shared by every request on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Address of the connecting peer.
    pub peer_ip: Option<IpAddr>,
    /// Virtual IP the connection was accepted on.
    pub vip: Option<IpAddr>,
    /// Connection arrived over TLS.
    pub secure: bool,
    /// Peer is a trusted source (internal network, trusted LB).
    pub trusted: bool,
    pub tls: Option<TlsState>,
}

/// Upstream response, present once the backend has answered.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Mutable per-request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Arbitrary values set by earlier processing stages.
    pub values: HashMap<String, String>,
    /// Variables captured by path-template conditions. `None` until a
    /// template matches; a template without variables records an empty map.
    pub path_variables: Option<HashMap<String, String>>,
}

/// One HTTP request.
///
/// # Example
///
/// ```
/// use gatecond_http::Request;
///
/// let req = Request::builder()
///     .method("POST")
///     .uri("/api/users?id=7")
///     .header("host", "example.com:8080")
///     .build()
///     .unwrap();
///
/// assert_eq!(req.path(), "/api/users");
/// assert_eq!(req.host(), Some("example.com".to_string()));
/// assert_eq!(req.port(), Some(8080));
/// ```
#[derive(Debug, Default)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    host_tag: Option<String>,
    tags: HashMap<String, Vec<String>>,
    client_ip: Option<IpAddr>,
    session: Option<Session>,
    response: Option<Response>,
    context: Mutex<RequestContext>,
}

impl Request {
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name` (case-insensitive). Values that are not
    /// visible ASCII are decoded lossily.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        header_value(&self.headers, name)
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Host from the `Host` header, else from the URI authority, lower-cased
    /// and without port.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        let (host, _) = self.authority()?;
        Some(host.to_ascii_lowercase())
    }

    /// Explicit port from the `Host` header or the URI authority.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        let (_, port) = self.authority()?;
        port?.parse().ok()
    }

    fn authority(&self) -> Option<(String, Option<String>)> {
        let raw = self
            .header("host")
            .or_else(|| self.uri.authority().map(|a| a.as_str().to_string()))?;
        let (host, port) = crate::context::split_host_port(&raw);
        Some((host.to_string(), port.map(str::to_string)))
    }

    #[must_use]
    pub fn host_tag(&self) -> Option<&str> {
        self.host_tag.as_deref()
    }

    /// Values of tag `name`.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&[String]> {
        self.tags.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    fn context(&self) -> MutexGuard<'_, RequestContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Context value set by an earlier stage.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<String> {
        self.context().values.get(key).cloned()
    }

    pub fn set_context_value(&self, key: impl Into<String>, value: impl Into<String>) {
        self.context().values.insert(key.into(), value.into());
    }

    /// Variables captured by path-template conditions so far, or `None` if
    /// no template has matched this request.
    #[must_use]
    pub fn path_variables(&self) -> Option<HashMap<String, String>> {
        self.context().path_variables.clone()
    }

    /// Merge captured variables; a later capture of the same name wins.
    pub fn record_path_variables(&self, vars: HashMap<String, String>) {
        self.context()
            .path_variables
            .get_or_insert_with(HashMap::new)
            .extend(vars);
    }

    /// Snapshot of the whole per-request context.
    #[must_use]
    pub fn context_snapshot(&self) -> RequestContext {
        self.context().clone()
    }
}

pub(crate) fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Builder for [`Request`].
///
/// Like [`http::request::Builder`], the first invalid part is kept and
/// reported by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RequestBuilder {
    request: Request,
    error: Option<http::Error>,
}

impl RequestBuilder {
    fn try_set<T, E: Into<http::Error>>(
        mut self,
        value: Result<T, E>,
        set: impl FnOnce(&mut Request, T),
    ) -> Self {
        if self.error.is_none() {
            match value {
                Ok(value) => set(&mut self.request, value),
                Err(err) => self.error = Some(err.into()),
            }
        }
        self
    }

    #[must_use]
    pub fn method<T>(self, method: T) -> Self
    where
        Method: TryFrom<T>,
        <Method as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.try_set(Method::try_from(method), |r, m| r.method = m)
    }

    #[must_use]
    pub fn uri<T>(self, uri: T) -> Self
    where
        Uri: TryFrom<T>,
        <Uri as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.try_set(Uri::try_from(uri), |r, u| r.uri = u)
    }

    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.request.version = version;
        self
    }

    /// Append a header.
    #[must_use]
    pub fn header<K, V>(self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let pair: Result<(HeaderName, HeaderValue), http::Error> = HeaderName::try_from(name)
            .map_err(Into::into)
            .and_then(|n| HeaderValue::try_from(value).map(|v| (n, v)).map_err(Into::into));
        self.try_set(pair, |r, (n, v)| {
            r.headers.append(n, v);
        })
    }

    /// Append a `name=value` pair to the `Cookie` header.
    #[must_use]
    pub fn cookie(self, name: &str, value: &str) -> Self {
        self.header(http::header::COOKIE, format!("{name}={value}"))
    }

    #[must_use]
    pub fn host_tag(mut self, tag: impl Into<String>) -> Self {
        self.request.host_tag = Some(tag.into());
        self
    }

    /// Add a value to tag `name`.
    #[must_use]
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .tags
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    #[must_use]
    pub fn client_ip(mut self, ip: IpAddr) -> Self {
        self.request.client_ip = Some(ip);
        self
    }

    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.request.session = Some(session);
        self
    }

    #[must_use]
    pub fn response(mut self, response: Response) -> Self {
        self.request.response = Some(response);
        self
    }

    #[must_use]
    pub fn context_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .context
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .insert(key.into(), value.into());
        self
    }

    /// # Errors
    ///
    /// The first invalid method, URI, or header given to the builder.
    pub fn build(self) -> Result<Request, http::Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.request),
        }
    }
}
