use crate::routing::{Precedence, DEFAULT_MAX_URI_LENGTH};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a `T` that implements `Default`; treats JSON `null` the same as
/// a missing field (returns `T::default()`).  Use with:
///   `#[serde(default, deserialize_with = "deserialize_null_default")]`
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Top-level dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Every route path is joined onto this prefix; it is also the root
    /// that needs no parent.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    #[serde(default = "default_max_uri_length")]
    pub max_uri_length: usize,

    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    #[serde(default)]
    pub precedence: Precedence,

    /// When false, unmatched requests are handed back to the caller instead
    /// of answered with 404.
    #[serde(default = "default_true")]
    pub handle_not_found: bool,

    /// When true, failures are returned as `DispatchError` instead of being
    /// turned into responses.
    #[serde(default)]
    pub propagate_errors: bool,

    /// Registered in file order, so parents must come before children.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub routes: Vec<RouteConfig>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mount_path: default_mount_path(),
            max_uri_length: default_max_uri_length(),
            case_sensitive: true,
            precedence: Precedence::default(),
            handle_not_found: true,
            propagate_errors: false,
            routes: Vec::new(),
        }
    }
}

fn default_mount_path() -> String {
    "/".to_string()
}

fn default_max_uri_length() -> usize {
    DEFAULT_MAX_URI_LENGTH
}

fn default_true() -> bool {
    true
}

/// A declaratively configured route serving canned responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteConfig {
    pub path: String,

    #[serde(default)]
    pub name: Option<String>,

    /// HTTP method (case-insensitive) -> response.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub methods: IndexMap<String, StaticResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticResponse {
    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub headers: IndexMap<String, String>,

    /// `{name}` placeholders are replaced by the decoded path variable.
    #[serde(default)]
    pub body: String,
}

impl Default for StaticResponse {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: IndexMap::new(),
            body: String::new(),
        }
    }
}

fn default_status() -> u16 {
    200
}
