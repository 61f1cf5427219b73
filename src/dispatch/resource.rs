use crate::dispatch::context::RequestContext;
use crate::error::BoxError;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http::{Method, Response};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Methods the dispatcher is willing to serve. Anything else is 501.
///
/// Variant order is alphabetical so ordered collections of verbs come out
/// in `Allow` header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Delete,
    Get,
    Head,
    Options,
    Post,
    Put,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Delete,
        Verb::Get,
        Verb::Head,
        Verb::Options,
        Verb::Post,
        Verb::Put,
    ];

    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::DELETE => Some(Verb::Delete),
            Method::GET => Some(Verb::Get),
            Method::HEAD => Some(Verb::Head),
            Method::OPTIONS => Some(Verb::Options),
            Method::POST => Some(Verb::Post),
            Method::PUT => Some(Verb::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Delete => "DELETE",
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
            Verb::Post => "POST",
            Verb::Put => "PUT",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Verb::Delete => Method::DELETE,
            Verb::Get => Method::GET,
            Verb::Head => Method::HEAD,
            Verb::Options => Method::OPTIONS,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported http method '{}'", s))
    }
}

/// Future returned by an operation.
pub type OperationFuture = BoxFuture<'static, Result<Response<Bytes>, BoxError>>;

/// A single verb implementation of a resource.
pub type Operation = Arc<dyn Fn(RequestContext) -> OperationFuture + Send + Sync>;

/// The handler bound to a route: a set of verb operations.
///
/// ```ignore
/// let items = Resource::new()
///     .get(|ctx| async move { Ok(text_response(StatusCode::OK, ctx.var("id").unwrap_or(""))) })
///     .delete(|_| async { Ok(empty_response(StatusCode::NO_CONTENT)) });
/// ```
#[derive(Clone, Default)]
pub struct Resource {
    operations: BTreeMap<Verb, Operation>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource whose only operation is GET.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        Self::new().get(f)
    }

    /// Register (or replace) the operation for `verb`.
    pub fn on<F, Fut>(mut self, verb: Verb, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        let op: Operation = Arc::new(move |ctx| f(ctx).boxed());
        self.operations.insert(verb, op);
        self
    }

    pub fn get<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        self.on(Verb::Get, f)
    }

    pub fn post<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        self.on(Verb::Post, f)
    }

    pub fn put<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        self.on(Verb::Put, f)
    }

    pub fn delete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        self.on(Verb::Delete, f)
    }

    pub fn head<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        self.on(Verb::Head, f)
    }

    pub fn options<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>, BoxError>> + Send + 'static,
    {
        self.on(Verb::Options, f)
    }

    /// Drop the operation for `verb`, if any.
    pub fn without(mut self, verb: Verb) -> Self {
        self.operations.remove(&verb);
        self
    }

    pub fn handles(&self, verb: Verb) -> bool {
        self.operations.contains_key(&verb)
    }

    pub fn operation(&self, verb: Verb) -> Option<&Operation> {
        self.operations.get(&verb)
    }

    /// Implemented verbs, alphabetical.
    pub fn verbs(&self) -> impl Iterator<Item = Verb> + '_ {
        self.operations.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Value of the `Allow` header: `OPTIONS` first, then the implemented
    /// verbs alphabetically, with `HEAD` whenever `GET` is implemented.
    pub fn allow_header(&self) -> String {
        let mut allowed: Vec<Verb> = self.verbs().filter(|v| *v != Verb::Options).collect();
        if self.handles(Verb::Get) && !self.handles(Verb::Head) {
            allowed.push(Verb::Head);
            allowed.sort();
        }

        let mut out = String::from(Verb::Options.as_str());
        for verb in allowed {
            out.push(',');
            out.push_str(verb.as_str());
        }
        out
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("verbs", &self.verbs().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::context::empty_response;
    use http::StatusCode;

    fn ok(resource: Resource, verb: Verb) -> Resource {
        resource.on(verb, |_| async { Ok(empty_response(StatusCode::OK)) })
    }

    #[test]
    fn test_verb_from_method() {
        assert_eq!(Verb::from_method(&Method::GET), Some(Verb::Get));
        assert_eq!(Verb::from_method(&Method::PATCH), None);
        assert_eq!(Verb::from_method(&Method::TRACE), None);
    }

    #[test]
    fn test_verb_from_str_case_insensitive() {
        assert_eq!("get".parse::<Verb>(), Ok(Verb::Get));
        assert_eq!("Delete".parse::<Verb>(), Ok(Verb::Delete));
        assert!("PATCH".parse::<Verb>().is_err());
    }

    #[test]
    fn test_verb_round_trip() {
        for verb in Verb::ALL {
            assert_eq!(Verb::from_method(&verb.method()), Some(verb));
        }
    }

    #[test]
    fn test_allow_get_adds_head() {
        let r = ok(Resource::new(), Verb::Get);
        assert_eq!(r.allow_header(), "OPTIONS,GET,HEAD");
    }

    #[test]
    fn test_allow_post_only() {
        let r = ok(Resource::new(), Verb::Post);
        assert_eq!(r.allow_header(), "OPTIONS,POST");
    }

    #[test]
    fn test_allow_is_alphabetical_and_deduplicated() {
        let mut r = Resource::new();
        for verb in [Verb::Put, Verb::Options, Verb::Get, Verb::Head, Verb::Delete] {
            r = ok(r, verb);
        }
        assert_eq!(r.allow_header(), "OPTIONS,DELETE,GET,HEAD,PUT");
    }

    #[test]
    fn test_empty_resource() {
        let r = Resource::new();
        assert!(r.is_empty());
        assert_eq!(r.allow_header(), "OPTIONS");
    }

    #[test]
    fn test_from_fn_is_get() {
        let r = Resource::from_fn(|_| async { Ok(empty_response(StatusCode::OK)) });
        assert_eq!(r.verbs().collect::<Vec<_>>(), vec![Verb::Get]);
    }

    #[test]
    fn test_without() {
        let r = ok(ok(Resource::new(), Verb::Get), Verb::Post).without(Verb::Get);
        assert!(!r.handles(Verb::Get));
        assert!(r.handles(Verb::Post));
    }
}
