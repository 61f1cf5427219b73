use crate::routing::PathVariables;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};

/// Everything an operation or middleware sees about one matched request.
#[derive(Debug)]
pub struct RequestContext {
    pub request: Request<Bytes>,
    pub path_variables: PathVariables,
    /// Pattern of the matched route, e.g. `/items/*id`.
    pub route_path: String,
    pub route_name: Option<String>,
}

impl RequestContext {
    pub fn new(
        request: Request<Bytes>,
        path_variables: PathVariables,
        route_path: String,
        route_name: Option<String>,
    ) -> Self {
        Self {
            request,
            path_variables,
            route_path,
            route_name,
        }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Decoded value of a path variable.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.path_variables.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }
}

pub fn empty_response(status: StatusCode) -> Response<Bytes> {
    let mut resp = Response::new(Bytes::new());
    *resp.status_mut() = status;
    resp
}

pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Bytes> {
    let mut resp = Response::new(body.into());
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

pub fn json_response(status: StatusCode, value: &serde_json::Value) -> Response<Bytes> {
    let mut resp = Response::new(Bytes::from(value.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

/// `{"error": msg}` with the given status.
pub fn error_response(status: StatusCode, msg: &str) -> Response<Bytes> {
    json_response(status, &serde_json::json!({ "error": msg }))
}
