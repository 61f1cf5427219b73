use crate::config::{DispatchConfig, StaticResponse};
use crate::dispatch::context::RequestContext;
use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::middleware::SharedMiddleware;
use crate::dispatch::resource::{Resource, Verb};
use crate::error::{BoxError, DispatchError, NameError, RouteError};
use crate::routing::{self, Precedence, RouteTable, TableOptions, DEFAULT_MAX_URI_LENGTH};
use anyhow::Context as _;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Transforms every resource at registration time.
pub type Decorator = Arc<dyn Fn(Resource) -> Resource + Send + Sync>;

/// Builds the response for a failed dispatch (404, 405, 414, ...).
pub type RejectionResponder = Arc<dyn Fn(&DispatchError) -> Response<Bytes> + Send + Sync>;

/// What a route points at: the resource plus its middleware chain.
pub struct Endpoint {
    resource: Resource,
    middlewares: Vec<SharedMiddleware>,
}

impl Endpoint {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn middlewares(&self) -> &[SharedMiddleware] {
        &self.middlewares
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("resource", &self.resource)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub mount_path: String,
    pub case_sensitive: bool,
    pub max_uri_length: usize,
    pub precedence: Precedence,
    pub handle_not_found: bool,
    pub propagate_errors: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            mount_path: "/".to_string(),
            case_sensitive: true,
            max_uri_length: DEFAULT_MAX_URI_LENGTH,
            precedence: Precedence::RegistrationOrder,
            handle_not_found: true,
            propagate_errors: false,
        }
    }
}

impl From<&DispatchConfig> for RouterOptions {
    fn from(cfg: &DispatchConfig) -> Self {
        Self {
            mount_path: cfg.mount_path.clone(),
            case_sensitive: cfg.case_sensitive,
            max_uri_length: cfg.max_uri_length,
            precedence: cfg.precedence,
            handle_not_found: cfg.handle_not_found,
            propagate_errors: cfg.propagate_errors,
        }
    }
}

/// Mutable registration front-end. `build()` freezes it into a `Dispatcher`.
pub struct Router {
    table: RouteTable<Endpoint>,
    mount_path: String,
    handle_not_found: bool,
    propagate_errors: bool,
    decorator: Option<Decorator>,
    on_rejection: Option<RejectionResponder>,
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        let mount_path = routing::normalize(&options.mount_path);
        let table = RouteTable::new(TableOptions {
            root: mount_path.clone(),
            case_sensitive: options.case_sensitive,
            max_uri_length: options.max_uri_length,
            precedence: options.precedence,
        });
        Self {
            table,
            mount_path,
            handle_not_found: options.handle_not_found,
            propagate_errors: options.propagate_errors,
            decorator: None,
            on_rejection: None,
        }
    }

    /// Register every route of `cfg`, in file order, as a static resource.
    pub fn from_config(cfg: &DispatchConfig) -> anyhow::Result<Self> {
        let mut router = Router::new(RouterOptions::from(cfg));
        for route in &cfg.routes {
            let mut resource = Resource::new();
            for (method, resp) in &route.methods {
                let verb: Verb = method
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("route '{}': {}", route.path, e))?;
                resource = resource.on(verb, static_operation(resp.clone()));
            }
            let handle = router
                .route(&route.path, resource)
                .with_context(|| format!("failed to register route '{}'", route.path))?;
            if let Some(ref name) = route.name {
                handle
                    .named(name)
                    .with_context(|| format!("failed to name route '{}'", route.path))?;
            }
        }
        Ok(router)
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub fn table(&self) -> &RouteTable<Endpoint> {
        &self.table
    }

    /// Register `resource` at `path` (relative to the mount path).
    pub fn route(&mut self, path: &str, resource: Resource) -> Result<RouteHandle<'_>, RouteError> {
        self.route_with(path, resource, Vec::new())
    }

    /// Register `resource` at `path` with a middleware chain run before
    /// every operation.
    pub fn route_with(
        &mut self,
        path: &str,
        resource: Resource,
        middlewares: Vec<SharedMiddleware>,
    ) -> Result<RouteHandle<'_>, RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path.to_string()));
        }
        let full = routing::join(&self.mount_path, path);

        let resource = match self.decorator {
            Some(ref decorate) => decorate(resource),
            None => resource,
        };
        if resource.is_empty() {
            return Err(RouteError::HandlerHasNoHttpMethods(full));
        }

        let route = self.table.insert(
            &full,
            Endpoint {
                resource,
                middlewares,
            },
        )?;
        let source = route.path().to_string();

        metrics::counter!("routing_routes_registered_total").increment(1);

        Ok(RouteHandle {
            router: self,
            path: source,
        })
    }

    /// Alias an already registered path (relative to the mount path).
    pub fn name(&mut self, path: &str, alias: &str) -> Result<(), RouteError> {
        let full = self.full_path(path);
        self.table.name(&full, alias)?;
        Ok(())
    }

    /// Append `middlewares` to every route in `targets`, given as paths or
    /// aliases. Either all targets exist and are updated, or nothing is.
    pub fn before<I, S>(&mut self, targets: I, middlewares: Vec<SharedMiddleware>) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = Vec::new();
        for target in targets {
            let target = target.as_ref();
            let path = if target.starts_with('/') {
                self.full_path(target)
            } else {
                self.table
                    .names()
                    .path_of(target)
                    .map(str::to_string)
                    .ok_or_else(|| NameError::PathDoesNotExist(target.to_string()))?
            };
            if self.table.route(&path).is_none() {
                return Err(NameError::PathDoesNotExist(target.to_string()).into());
            }
            paths.push(path);
        }

        for path in paths {
            if let Some(route) = self.table.route_mut(&path) {
                route
                    .target_mut()
                    .middlewares
                    .extend(middlewares.iter().cloned());
            }
        }
        Ok(())
    }

    /// Apply `f` to every resource registered from now on.
    pub fn decorate<F>(&mut self, f: F)
    where
        F: Fn(Resource) -> Resource + Send + Sync + 'static,
    {
        self.decorator = Some(Arc::new(f));
    }

    /// Replace the default empty-body failure responses.
    pub fn on_rejection<F>(&mut self, f: F)
    where
        F: Fn(&DispatchError) -> Response<Bytes> + Send + Sync + 'static,
    {
        self.on_rejection = Some(Arc::new(f));
    }

    pub fn build(self) -> Dispatcher {
        tracing::info!(
            "routing: compiled route table, count={}, named={}, mount_path={}",
            self.table.len(),
            self.table.names().len(),
            self.mount_path,
        );
        Dispatcher::new(
            self.table,
            self.handle_not_found,
            self.propagate_errors,
            self.on_rejection,
        )
    }

    fn full_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            routing::join(&self.mount_path, path)
        } else {
            path.to_string()
        }
    }
}

/// Returned by `Router::route`; lets the new route be named in place.
pub struct RouteHandle<'r> {
    router: &'r mut Router,
    path: String,
}

impl RouteHandle<'_> {
    /// Full pattern of the registered route, mount path included.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn named(self, alias: &str) -> Result<(), RouteError> {
        self.router.table.name(&self.path, alias)?;
        Ok(())
    }
}

fn static_operation(
    resp: StaticResponse,
) -> impl Fn(RequestContext) -> futures_util::future::Ready<Result<Response<Bytes>, BoxError>>
       + Send
       + Sync
       + 'static {
    move |ctx| futures_util::future::ready(render_static(&resp, &ctx))
}

/// Build a canned response, filling `{name}` placeholders from path variables.
fn render_static(resp: &StaticResponse, ctx: &RequestContext) -> Result<Response<Bytes>, BoxError> {
    let mut body = resp.body.clone();
    for (name, value) in &ctx.path_variables {
        body = body.replace(&format!("{{{}}}", name), value);
    }

    let mut out = Response::new(Bytes::from(body));
    *out.status_mut() = StatusCode::from_u16(resp.status)?;
    for (k, v) in &resp.headers {
        out.headers_mut()
            .insert(HeaderName::from_bytes(k.as_bytes())?, HeaderValue::from_str(v)?);
    }
    Ok(out)
}
