pub mod types;


pub use types::*;

use crate::dispatch::Verb;
use crate::routing::Precedence;
use anyhow::Result;
use http::{HeaderName, HeaderValue, StatusCode};
use std::collections::HashSet;
use std::path::Path;

impl DispatchConfig {
    /// Load configuration from a file (if it exists) and apply environment
    /// variable overrides. When the file does not exist, built-in defaults
    /// are used, which gives an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: DispatchConfig = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => toml::from_str(&content)?,
                Some("json") => serde_json::from_str(&content)?,
                Some(ext) => anyhow::bail!("unsupported config format: .{ext}, use .toml or .json"),
                None => anyhow::bail!("config file has no extension, use .toml or .json"),
            }
        } else {
            tracing::info!("config file not found at {}, using defaults", path.display());
            DispatchConfig::default()
        };

        config.apply_env_overrides();

        config.validate()?;
        tracing::info!(
            routes = config.routes.len(),
            mount_path = %config.mount_path,
            "loaded dispatch configuration"
        );
        Ok(config)
    }

    /// Environment overrides for dispatcher behaviour. Routes themselves
    /// only come from the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HERMES_DISPATCH_MOUNT_PATH") {
            self.mount_path = v;
        }
        if let Ok(v) = std::env::var("HERMES_DISPATCH_MAX_URI_LENGTH") {
            if let Ok(n) = v.parse::<usize>() {
                self.max_uri_length = n;
            }
        }
        if let Ok(v) = std::env::var("HERMES_DISPATCH_CASE_SENSITIVE") {
            self.case_sensitive = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("HERMES_DISPATCH_HANDLE_NOT_FOUND") {
            self.handle_not_found = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("HERMES_DISPATCH_PROPAGATE_ERRORS") {
            self.propagate_errors = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("HERMES_DISPATCH_PRECEDENCE") {
            match v.as_str() {
                "registration_order" => self.precedence = Precedence::RegistrationOrder,
                "specificity" => self.precedence = Precedence::Specificity,
                other => tracing::warn!("config: ignoring unknown precedence '{}'", other),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mount_path.starts_with('/') {
            anyhow::bail!("mount_path '{}' must begin with '/'", self.mount_path);
        }
        if self.max_uri_length == 0 {
            anyhow::bail!("max_uri_length must be greater than 0");
        }

        let mut paths = HashSet::new();
        let mut names = HashSet::new();
        for route in &self.routes {
            if !route.path.starts_with('/') {
                anyhow::bail!("route path '{}' must begin with '/'", route.path);
            }
            if !paths.insert(route.path.as_str()) {
                anyhow::bail!("route path '{}' is defined more than once", route.path);
            }
            if let Some(ref name) = route.name {
                if name.is_empty() || name.starts_with('/') {
                    anyhow::bail!("route '{}' has invalid name '{}'", route.path, name);
                }
                if !names.insert(name.as_str()) {
                    anyhow::bail!("route name '{}' is used more than once", name);
                }
            }
            if route.methods.is_empty() {
                anyhow::bail!("route '{}' defines no methods", route.path);
            }
            for (method, resp) in &route.methods {
                if let Err(e) = method.parse::<Verb>() {
                    anyhow::bail!("route '{}': {}", route.path, e);
                }
                if StatusCode::from_u16(resp.status).is_err() {
                    anyhow::bail!(
                        "route '{}' method {}: invalid status {}",
                        route.path, method, resp.status
                    );
                }
                for (k, v) in &resp.headers {
                    if HeaderName::from_bytes(k.as_bytes()).is_err()
                        || HeaderValue::from_str(v).is_err()
                    {
                        anyhow::bail!(
                            "route '{}' method {}: invalid header '{}'",
                            route.path, method, k
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Count of routes and named routes, for startup logging.
    pub fn route_counts(&self) -> (usize, usize) {
        let named = self.routes.iter().filter(|r| r.name.is_some()).count();
        (self.routes.len(), named)
    }
}
