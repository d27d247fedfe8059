//! `Fetcher`: domain-specific value extraction.

use std::fmt::Debug;

use crate::{FetchError, Value};

/// Extracts one typed [`Value`] from a context.
///
/// A fetcher returns an error, never partial data, when something it needs is
/// absent from the context (no session, no such header, ...). The caller treats
/// that as a non-match.
///
/// Fetchers are pure reads of the context.
///
/// # Example
///
/// ```
/// use gatecond::{FetchError, Fetcher, Value};
///
/// #[derive(Debug)]
/// struct Request { path: Option<String> }
///
/// #[derive(Debug)]
/// struct PathFetcher;
///
/// impl Fetcher<Request> for PathFetcher {
///     fn fetch(&self, req: &Request) -> Result<Value, FetchError> {
///         req.path.clone().map(Value::Str).ok_or(FetchError::NoUrl)
///     }
/// }
///
/// let req = Request { path: Some("/a".into()) };
/// assert_eq!(PathFetcher.fetch(&req), Ok(Value::from("/a")));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Fetcher<{Ctx}>`",
    label = "this type cannot fetch values from `{Ctx}`",
    note = "Fetcher<Ctx> extracts a value from one specific context type"
)]
pub trait Fetcher<Ctx>: Send + Sync + Debug {
    /// Extract the value from `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] naming the missing prerequisite.
    fn fetch(&self, ctx: &Ctx) -> Result<Value, FetchError>;
}

#[diagnostic::do_not_recommend]
impl<Ctx> Fetcher<Ctx> for Box<dyn Fetcher<Ctx>> {
    fn fetch(&self, ctx: &Ctx) -> Result<Value, FetchError> {
        (**self).fetch(ctx)
    }
}

/// A fetcher backed by a plain function.
///
/// Handy for contexts whose fields can be read without configuration.
pub struct FnFetcher<Ctx> {
    name: &'static str,
    f: fn(&Ctx) -> Result<Value, FetchError>,
}

impl<Ctx> FnFetcher<Ctx> {
    #[must_use]
    pub const fn new(name: &'static str, f: fn(&Ctx) -> Result<Value, FetchError>) -> Self {
        Self { name, f }
    }
}

impl<Ctx> Debug for FnFetcher<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl<Ctx> Fetcher<Ctx> for FnFetcher<Ctx> {
    fn fetch(&self, ctx: &Ctx) -> Result<Value, FetchError> {
        (self.f)(ctx)
    }
}
