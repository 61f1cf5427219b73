#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hermes_dispatch::bootstrap::{self, BootstrapArgs, Command};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hermes-dispatch", about = "URL routing table inspector and dispatcher")]
struct Cli {
    /// Path to route config file (.toml or .json)
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Show which route a URL resolves to and its path variables
    Match { url: String },
    /// Dispatch a request and print the response
    Dispatch {
        method: String,
        url: String,
        /// Request body
        #[arg(long)]
        body: Option<String>,
        /// Print Prometheus metrics after the response
        #[arg(long)]
        metrics: bool,
    },
    /// Build a URL from a route name or pattern
    Url {
        target: String,
        /// Path variables as name=value
        #[arg(value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
    /// List the child URLs of a URL
    Children { url: String },
    /// Print the parent URL of a URL
    Parent { url: String },
    /// List registered routes
    Routes,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Cmd::Match { url } => Command::Match { url },
        Cmd::Dispatch {
            method,
            url,
            body,
            metrics,
        } => Command::Dispatch {
            method,
            url,
            body,
            metrics,
        },
        Cmd::Url { target, vars } => Command::Url { target, vars },
        Cmd::Children { url } => Command::Children { url },
        Cmd::Parent { url } => Command::Parent { url },
        Cmd::Routes => Command::Routes,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(bootstrap::run(BootstrapArgs {
        config_path: cli.config,
        command,
    }))
}
