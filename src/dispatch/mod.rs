pub mod context;
pub mod dispatcher;
pub mod middleware;
pub mod resource;
pub mod router;

pub use context::{empty_response, error_response, json_response, text_response, RequestContext};
pub use dispatcher::{Dispatch, Dispatcher, SharedDispatcher, Terminal};
pub use middleware::{Flow, Middleware, SharedMiddleware};
pub use resource::{Operation, OperationFuture, Resource, Verb};
pub use router::{Decorator, Endpoint, RejectionResponder, RouteHandle, Router, RouterOptions};
