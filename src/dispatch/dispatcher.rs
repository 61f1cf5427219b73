use crate::dispatch::context::{empty_response, RequestContext};
use crate::dispatch::middleware::Flow;
use crate::dispatch::resource::{Operation, Verb};
use crate::dispatch::router::{Endpoint, RejectionResponder};
use crate::error::{DispatchError, LookupError, UrlError};
use crate::routing::{PathVariables, RouteTable};
use arc_swap::ArcSwap;
use bytes::Bytes;
use futures_util::FutureExt;
use http::header::{HeaderValue, ALLOW};
use http::{Method, Request, Response, StatusCode};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Handled,
    MiddlewareShortCircuit,
    SynthesizedHead,
    SynthesizedOptions,
    MethodNotAllowed,
    NotImplemented,
    NotFound,
    UriTooLong,
    BadRequest,
    InternalError,
}

impl Terminal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Terminal::Handled => "handled",
            Terminal::MiddlewareShortCircuit => "middleware_short_circuit",
            Terminal::SynthesizedHead => "synthesized_head",
            Terminal::SynthesizedOptions => "synthesized_options",
            Terminal::MethodNotAllowed => "method_not_allowed",
            Terminal::NotImplemented => "not_implemented",
            Terminal::NotFound => "not_found",
            Terminal::UriTooLong => "uri_too_long",
            Terminal::BadRequest => "bad_request",
            Terminal::InternalError => "internal_error",
        }
    }

    fn of(err: &DispatchError) -> Self {
        match err {
            DispatchError::UriTooLong(_) => Terminal::UriTooLong,
            DispatchError::NotFound(_) => Terminal::NotFound,
            DispatchError::BadRequest(_) => Terminal::BadRequest,
            DispatchError::NotImplemented(_) => Terminal::NotImplemented,
            DispatchError::MethodNotAllowed { .. } => Terminal::MethodNotAllowed,
            DispatchError::Middleware(_) | DispatchError::Handler(_) | DispatchError::Panic(_) => {
                Terminal::InternalError
            }
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a dispatch that did not fail.
#[derive(Debug)]
pub enum Dispatch {
    /// A response was committed, together with the state that produced it.
    Response {
        response: Response<Bytes>,
        terminal: Terminal,
    },
    /// No route matched and not-found handling is off; the request is
    /// handed back untouched.
    Fallthrough(Request<Bytes>),
}

impl Dispatch {
    pub fn response(&self) -> Option<&Response<Bytes>> {
        match self {
            Dispatch::Response { response, .. } => Some(response),
            Dispatch::Fallthrough(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response<Bytes>> {
        match self {
            Dispatch::Response { response, .. } => Some(response),
            Dispatch::Fallthrough(_) => None,
        }
    }

    pub fn terminal(&self) -> Option<Terminal> {
        match self {
            Dispatch::Response { terminal, .. } => Some(*terminal),
            Dispatch::Fallthrough(_) => None,
        }
    }
}

enum Outcome {
    Committed(Response<Bytes>, Terminal),
    Fallthrough(Request<Bytes>),
    Failed(DispatchError),
}

struct Inner {
    table: RouteTable<Endpoint>,
    handle_not_found: bool,
    propagate_errors: bool,
    on_rejection: Option<RejectionResponder>,
}

/// Frozen route table plus dispatch policy. Cheap to clone, safe to share
/// across tasks; nothing on the request path takes a lock.
///
/// Per request:
/// 1. URI length
/// 2. Route lookup and path variable decoding
/// 3. Server method allow-list
/// 4. Resource verb (synthesized HEAD / OPTIONS, else 405)
/// 5. Middlewares in registration order
/// 6. Operation
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub(crate) fn new(
        table: RouteTable<Endpoint>,
        handle_not_found: bool,
        propagate_errors: bool,
        on_rejection: Option<RejectionResponder>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                table,
                handle_not_found,
                propagate_errors,
                on_rejection,
            }),
        }
    }

    pub fn table(&self) -> &RouteTable<Endpoint> {
        &self.inner.table
    }

    /// Dispatch one request.
    ///
    /// With `propagate_errors` off every failure is answered with a
    /// response; with it on, failures come back as `Err`.
    pub async fn dispatch(&self, req: Request<Bytes>) -> Result<Dispatch, DispatchError> {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let outcome = self.run(req).await;

        let (result, terminal, status) = match outcome {
            Outcome::Committed(response, terminal) => {
                let status = response.status();
                (
                    Ok(Dispatch::Response { response, terminal }),
                    Some(terminal),
                    Some(status),
                )
            }
            Outcome::Fallthrough(req) => (Ok(Dispatch::Fallthrough(req)), None, None),
            Outcome::Failed(err) => {
                let terminal = Terminal::of(&err);
                let status = err.status();
                if terminal == Terminal::InternalError {
                    error!("dispatch: request failed, method={}, path={}, error={}", method, path, err);
                }
                if self.inner.propagate_errors {
                    (Err(err), Some(terminal), Some(status))
                } else {
                    let response = self.reject(&err);
                    let status = response.status();
                    (
                        Ok(Dispatch::Response { response, terminal }),
                        Some(terminal),
                        Some(status),
                    )
                }
            }
        };

        record(&method, terminal, status, start);
        debug!(
            "dispatch: request completed, method={}, path={}, terminal={}, status={}",
            method,
            path,
            terminal.map_or("fallthrough", |t| t.as_str()),
            status.map_or(0, |s| s.as_u16()),
        );

        result
    }

    async fn run(&self, req: Request<Bytes>) -> Outcome {
        let target = req
            .uri()
            .path_and_query()
            .map_or("/", |pq| pq.as_str());

        let matched = match self.inner.table.lookup(target) {
            Ok(m) => m,
            Err(LookupError::NotFound(_)) if !self.inner.handle_not_found => {
                return Outcome::Fallthrough(req);
            }
            Err(e) => return Outcome::Failed(e.into()),
        };

        let method = req.method().clone();
        let Some(verb) = Verb::from_method(&method) else {
            return Outcome::Failed(DispatchError::NotImplemented(method));
        };

        let endpoint = matched.route.target();
        let resource = endpoint.resource();
        let (op, synthesized_head) = match resource.operation(verb) {
            Some(op) => (op.clone(), false),
            None => match (verb, resource.operation(Verb::Get)) {
                (Verb::Head, Some(get)) => (get.clone(), true),
                (Verb::Options, _) => {
                    let mut resp = empty_response(StatusCode::NO_CONTENT);
                    insert_allow(&mut resp, &resource.allow_header());
                    return Outcome::Committed(resp, Terminal::SynthesizedOptions);
                }
                _ => {
                    return Outcome::Failed(DispatchError::MethodNotAllowed {
                        method,
                        allow: resource.allow_header(),
                    });
                }
            },
        };

        let ctx = RequestContext::new(
            req,
            matched.path_variables,
            matched.route.path().to_string(),
            matched.name.map(str::to_string),
        );

        let invoked = AssertUnwindSafe(invoke(endpoint, op, ctx))
            .catch_unwind()
            .await;
        match invoked {
            Ok(Outcome::Committed(resp, terminal)) if synthesized_head => {
                let (parts, _) = resp.into_parts();
                let terminal = match terminal {
                    Terminal::Handled => Terminal::SynthesizedHead,
                    other => other,
                };
                Outcome::Committed(Response::from_parts(parts, Bytes::new()), terminal)
            }
            Ok(outcome) => outcome,
            Err(payload) => Outcome::Failed(DispatchError::Panic(panic_message(payload))),
        }
    }

    fn reject(&self, err: &DispatchError) -> Response<Bytes> {
        let mut resp = match self.inner.on_rejection {
            Some(ref responder) => responder(err),
            None => empty_response(err.status()),
        };
        if let DispatchError::MethodNotAllowed { allow, .. } = err {
            if !resp.headers().contains_key(ALLOW) {
                insert_allow(&mut resp, allow);
            }
        }
        resp
    }

    pub fn resolve<I, K, V>(&self, alias_or_path: &str, vars: I) -> Result<String, UrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.inner.table.resolve(alias_or_path, vars)
    }

    pub fn path_variables(&self, url: &str) -> Result<PathVariables, LookupError> {
        self.inner.table.path_variables(url)
    }

    pub fn child_urls(&self, url: &str) -> Result<IndexMap<String, Option<String>>, LookupError> {
        self.inner.table.child_urls(url)
    }

    pub fn named_child_urls(&self, url: &str) -> Result<IndexMap<String, String>, LookupError> {
        self.inner.table.named_child_urls(url)
    }

    pub fn parent_url(&self, url: &str) -> Result<String, UrlError> {
        self.inner.table.parent_url(url)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.inner.table.len())
            .field("handle_not_found", &self.inner.handle_not_found)
            .field("propagate_errors", &self.inner.propagate_errors)
            .finish()
    }
}

/// Middlewares, then the operation.
async fn invoke(endpoint: &Endpoint, op: Operation, mut ctx: RequestContext) -> Outcome {
    for mw in endpoint.middlewares() {
        match mw.on_request(&mut ctx).await {
            Flow::Continue => {}
            Flow::Respond(resp) => {
                return Outcome::Committed(resp, Terminal::MiddlewareShortCircuit);
            }
            Flow::Fail(e) => return Outcome::Failed(DispatchError::Middleware(e)),
        }
    }

    match op(ctx).await {
        Ok(resp) => Outcome::Committed(resp, Terminal::Handled),
        Err(e) => Outcome::Failed(DispatchError::Handler(e)),
    }
}

fn insert_allow(resp: &mut Response<Bytes>, allow: &str) {
    match HeaderValue::from_str(allow) {
        Ok(v) => {
            resp.headers_mut().insert(ALLOW, v);
        }
        Err(e) => warn!("dispatch: invalid allow header, value={}, error={}", allow, e),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn record(method: &Method, terminal: Option<Terminal>, status: Option<StatusCode>, start: Instant) {
    let mut buf = itoa::Buffer::new();
    let status_str = match status {
        Some(s) => buf.format(s.as_u16()),
        None => "none",
    };
    let terminal_str = terminal.map_or("fallthrough", |t| t.as_str());

    metrics::counter!(
        "dispatch_requests_total",
        "terminal" => terminal_str,
        "method" => method.as_str().to_owned(),
        "status_code" => status_str.to_owned(),
    )
    .increment(1);

    metrics::histogram!(
        "dispatch_duration_seconds",
        "terminal" => terminal_str,
    )
    .record(start.elapsed().as_secs_f64());
}

/// Hot-swappable handle to the current dispatcher.
///
/// In-flight requests keep the snapshot they loaded; `replace` only
/// affects requests that start afterwards.
#[derive(Clone)]
pub struct SharedDispatcher {
    current: Arc<ArcSwap<Dispatcher>>,
}

impl SharedDispatcher {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(dispatcher)),
        }
    }

    pub fn load(&self) -> Arc<Dispatcher> {
        self.current.load_full()
    }

    pub fn replace(&self, dispatcher: Dispatcher) {
        self.current.store(Arc::new(dispatcher));
        debug!("dispatch: installed new route table, count={}", self.current.load().table().len());
    }

    pub async fn dispatch(&self, req: Request<Bytes>) -> Result<Dispatch, DispatchError> {
        let snapshot = self.load();
        snapshot.dispatch(req).await
    }
}
