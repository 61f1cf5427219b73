use crate::config::DispatchConfig;
use crate::dispatch::{Dispatch, Dispatcher, Router};
use crate::metrics::Metrics;
use anyhow::{Context, Result};
use bytes::Bytes;
use http::{Method, Request};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::io::Write;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// CLI arguments forwarded from `main()`.
pub struct BootstrapArgs {
    pub config_path: PathBuf,
    pub command: Command,
}

/// One inspection or dispatch against the configured table.
#[derive(Debug, Clone)]
pub enum Command {
    Match { url: String },
    Dispatch { method: String, url: String, body: Option<String>, metrics: bool },
    Url { target: String, vars: Vec<(String, String)> },
    Children { url: String },
    Parent { url: String },
    Routes,
}

/// load config → build table → run one command → print JSON.
pub async fn run(args: BootstrapArgs) -> Result<()> {
    // Dropped on return, which flushes buffered log lines.
    let _log_guard = init_tracing();

    // The recorder has to be in place before routes are registered.
    let metrics = match args.command {
        Command::Dispatch { metrics: true, .. } => Some(Metrics::install()?),
        _ => None,
    };

    let config = DispatchConfig::load(&args.config_path)?;
    let dispatcher = build_dispatcher(&config)?;

    let output = execute(&dispatcher, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(metrics) = metrics {
        print!("{}", metrics.render());
    }
    Ok(())
}

fn init_tracing() -> WorkerGuard {
    let (non_blocking, guard) = log_writer(std::io::stderr());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .json(),
        )
        .init();

    guard
}

/// Background writer for log lines. Lines still queued are written out when
/// the returned guard is dropped.
fn log_writer<W: Write + Send + 'static>(sink: W) -> (NonBlocking, WorkerGuard) {
    tracing_appender::non_blocking::NonBlockingBuilder::default()
        .buffered_lines_limit(128_000)
        .lossy(true)
        .finish(sink)
}

pub fn build_dispatcher(config: &DispatchConfig) -> Result<Dispatcher> {
    let (routes, named) = config.route_counts();
    tracing::debug!("bootstrap: registering routes, count={}, named={}", routes, named);
    Ok(Router::from_config(config)?.build())
}

/// Run `command` and describe the result as JSON.
pub async fn execute(dispatcher: &Dispatcher, command: Command) -> Result<Value> {
    match command {
        Command::Match { url } => {
            let m = dispatcher.table().lookup(&url)?;
            Ok(json!({
                "route": m.route.path(),
                "name": m.name,
                "path": m.path,
                "path_variables": m.path_variables,
            }))
        }
        Command::Dispatch { method, url, body, .. } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method '{}'", method))?;
            let req = Request::builder()
                .method(method)
                .uri(url.as_str())
                .body(body.map(Bytes::from).unwrap_or_default())
                .with_context(|| format!("invalid request uri '{}'", url))?;

            match dispatcher.dispatch(req).await? {
                Dispatch::Response { response, terminal } => {
                    let headers: Map<String, Value> = response
                        .headers()
                        .iter()
                        .map(|(k, v)| {
                            (
                                k.as_str().to_string(),
                                Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()),
                            )
                        })
                        .collect();
                    Ok(json!({
                        "terminal": terminal.as_str(),
                        "status": response.status().as_u16(),
                        "headers": headers,
                        "body": String::from_utf8_lossy(response.body()),
                    }))
                }
                Dispatch::Fallthrough(req) => Ok(json!({
                    "terminal": "fallthrough",
                    "uri": req.uri().to_string(),
                })),
            }
        }
        Command::Url { target, vars } => {
            let url = dispatcher.resolve(&target, vars)?;
            Ok(json!({ "url": url }))
        }
        Command::Children { url } => {
            let children = dispatcher.child_urls(&url)?;
            Ok(json!(children))
        }
        Command::Parent { url } => {
            let parent = dispatcher.parent_url(&url)?;
            Ok(json!({ "url": parent }))
        }
        Command::Routes => {
            let table = dispatcher.table();
            let routes: Vec<Value> = table
                .routes()
                .map(|route| {
                    let resource = route.target().resource();
                    json!({
                        "path": route.path(),
                        "name": table.names().name_of(route.path()),
                        "methods": resource.verbs().map(|v| v.as_str()).collect::<Vec<_>>(),
                        "allow": resource.allow_header(),
                        "middlewares": route.target().middlewares().len(),
                    })
                })
                .collect();
            Ok(Value::Array(routes))
        }
    }
}
