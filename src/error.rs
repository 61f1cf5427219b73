use std::fmt;

/// Boxed error returned by handler operations and middlewares.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A route pattern could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    InvalidPath(String),
    EmptyCaptureName(String),
    DuplicateCapture(String),
    RestCaptureNotLast(String),
    Regex(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::InvalidPath(p) => write!(f, "pattern must begin with '/': {}", p),
            PatternError::EmptyCaptureName(p) => write!(f, "capture without a name in {}", p),
            PatternError::DuplicateCapture(name) => {
                write!(f, "capture name '{}' used more than once", name)
            }
            PatternError::RestCaptureNotLast(name) => {
                write!(f, "rest capture '{}' must be the last segment", name)
            }
            PatternError::Regex(msg) => write!(f, "pattern compile error: {}", msg),
        }
    }
}

impl std::error::Error for PatternError {}

/// Malformed percent-encoding in a captured path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodingError {
    pub raw: String,
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode path variable '{}'", self.raw)
    }
}

impl std::error::Error for DecodingError {}

/// Errors raised by alias management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    InvalidName(String),
    PathDoesNotExist(String),
    DuplicateName(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::InvalidName(name) => write!(f, "invalid route name '{}'", name),
            NameError::PathDoesNotExist(path) => {
                write!(f, "cannot name a path that doesn't exist: {}", path)
            }
            NameError::DuplicateName(name) => write!(f, "route name '{}' is already taken", name),
        }
    }
}

impl std::error::Error for NameError {}

/// Registration-time errors. Always surfaced synchronously, and a failed
/// registration leaves the route table untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    ParentDoesNotExist(String),
    DuplicateRoute(String),
    HandlerHasNoHttpMethods(String),
    InvalidName(String),
    InvalidPath(String),
    Pattern(PatternError),
    Name(NameError),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::ParentDoesNotExist(path) => {
                write!(f, "route {} does not have a parent route defined", path)
            }
            RouteError::DuplicateRoute(path) => write!(f, "route {} is already registered", path),
            RouteError::HandlerHasNoHttpMethods(path) => {
                write!(f, "handler for {} implements no http methods", path)
            }
            RouteError::InvalidName(name) => write!(f, "invalid route name '{}'", name),
            RouteError::InvalidPath(path) => write!(f, "route path must begin with '/': {}", path),
            RouteError::Pattern(e) => write!(f, "{}", e),
            RouteError::Name(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RouteError {}

impl From<PatternError> for RouteError {
    fn from(e: PatternError) -> Self {
        match e {
            PatternError::InvalidPath(p) => RouteError::InvalidPath(p),
            other => RouteError::Pattern(other),
        }
    }
}

impl From<NameError> for RouteError {
    fn from(e: NameError) -> Self {
        match e {
            NameError::InvalidName(n) => RouteError::InvalidName(n),
            other => RouteError::Name(other),
        }
    }
}

/// Request-time lookup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    NotFound(String),
    UriTooLong(usize),
    Decoding(DecodingError),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::NotFound(path) => write!(f, "no route matched {}", path),
            LookupError::UriTooLong(len) => write!(f, "request uri too long ({} bytes)", len),
            LookupError::Decoding(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LookupError {}

impl From<DecodingError> for LookupError {
    fn from(e: DecodingError) -> Self {
        LookupError::Decoding(e)
    }
}

/// Errors from url generation and navigation helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    UnknownVariableName(String),
    MissingVariable(String),
    NotFound(String),
    NoParentUrl(String),
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlError::UnknownVariableName(name) => write!(f, "unknown variable name '{}'", name),
            UrlError::MissingVariable(name) => write!(f, "missing variable '{}'", name),
            UrlError::NotFound(what) => write!(f, "unknown route or name '{}'", what),
            UrlError::NoParentUrl(path) => write!(f, "{} has no parent url", path),
        }
    }
}

impl std::error::Error for UrlError {}

/// A dispatch that did not produce a handler response. In the default mode
/// these are turned into responses; with `propagate_errors` they are
/// returned to the caller.
#[derive(Debug)]
pub enum DispatchError {
    UriTooLong(usize),
    NotFound(String),
    BadRequest(DecodingError),
    NotImplemented(http::Method),
    MethodNotAllowed { method: http::Method, allow: String },
    Middleware(BoxError),
    Handler(BoxError),
    Panic(String),
}

impl DispatchError {
    pub fn status(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            DispatchError::UriTooLong(_) => StatusCode::URI_TOO_LONG,
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::Middleware(_)
            | DispatchError::Handler(_)
            | DispatchError::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UriTooLong(len) => write!(f, "request uri too long ({} bytes)", len),
            DispatchError::NotFound(path) => write!(f, "not found: {}", path),
            DispatchError::BadRequest(e) => write!(f, "bad request: {}", e),
            DispatchError::NotImplemented(m) => write!(f, "method {} not implemented", m),
            DispatchError::MethodNotAllowed { method, allow } => {
                write!(f, "method {} not allowed, allow: {}", method, allow)
            }
            DispatchError::Middleware(e) => write!(f, "middleware error: {}", e),
            DispatchError::Handler(e) => write!(f, "handler error: {}", e),
            DispatchError::Panic(msg) => write!(f, "handler panicked: {}", msg),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::BadRequest(e) => Some(e),
            DispatchError::Middleware(e) | DispatchError::Handler(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<LookupError> for DispatchError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::NotFound(path) => DispatchError::NotFound(path),
            LookupError::UriTooLong(len) => DispatchError::UriTooLong(len),
            LookupError::Decoding(e) => DispatchError::BadRequest(e),
        }
    }
}
