use crate::dispatch::context::RequestContext;
use crate::error::BoxError;
use bytes::Bytes;
use futures_util::future::{self, BoxFuture};
use http::Response;
use std::sync::Arc;

/// Outcome of one middleware step.
pub enum Flow {
    /// Continue to the next middleware, then the operation.
    Continue,
    /// Short-circuit: return this response immediately.
    Respond(Response<Bytes>),
    /// Abort the request as an internal error.
    Fail(BoxError),
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Continue => f.write_str("Continue"),
            Flow::Respond(resp) => f.debug_tuple("Respond").field(&resp.status()).finish(),
            Flow::Fail(err) => f.debug_tuple("Fail").field(&err.to_string()).finish(),
        }
    }
}

/// A step run before the operation of a route.
///
/// Middlewares run in registration order and may rewrite the request or
/// path variables in `ctx` before the operation sees them.
pub trait Middleware: Send + Sync {
    fn on_request<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Flow>;
}

pub type SharedMiddleware = Arc<dyn Middleware>;

struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut RequestContext) -> Flow + Send + Sync,
{
    fn on_request<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Flow> {
        Box::pin(future::ready((self.0)(ctx)))
    }
}

/// Wrap a synchronous closure as a middleware.
pub fn from_fn<F>(f: F) -> SharedMiddleware
where
    F: Fn(&mut RequestContext) -> Flow + Send + Sync + 'static,
{
    Arc::new(FnMiddleware(f))
}
