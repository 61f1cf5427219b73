use crate::error::{LookupError, NameError, RouteError, UrlError};
use crate::routing::extract::{encode_rest, encode_segment, extract};
use crate::routing::names::NameIndex;
use crate::routing::pattern::{self, CompiledPattern, MatchOptions, Segment};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Requests longer than this are rejected before any matching.
pub const DEFAULT_MAX_URI_LENGTH: usize = 4096;

/// Ordered, decoded path variables of one match.
pub type PathVariables = IndexMap<String, String>;

/// Tie-break rule between pattern routes that match the same path.
/// Exact routes always win over pattern routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// First registered pattern wins.
    #[default]
    RegistrationOrder,
    /// More literal segments win, then the longer literal prefix, then
    /// registration order.
    Specificity,
}

#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Canonical mount path; the only path allowed to have no parent.
    pub root: String,
    pub case_sensitive: bool,
    pub max_uri_length: usize,
    pub precedence: Precedence,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            case_sensitive: true,
            max_uri_length: DEFAULT_MAX_URI_LENGTH,
            precedence: Precedence::RegistrationOrder,
        }
    }
}

impl TableOptions {
    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
        }
    }
}

/// A registered route: compiled pattern plus whatever the caller routes to.
#[derive(Debug)]
pub struct Route<T> {
    pattern: CompiledPattern,
    target: T,
}

impl<T> Route<T> {
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn path(&self) -> &str {
        self.pattern.source()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}

/// Result of a successful lookup. Produced per request, never stored.
#[derive(Debug)]
pub struct MatchResult<'a, T> {
    pub route: &'a Route<T>,
    pub name: Option<&'a str>,
    /// The normalized request path that was matched.
    pub path: String,
    pub path_variables: PathVariables,
}

/// The route table: exact routes in a hash map, pattern routes in a
/// precedence-ordered list.
///
/// Matching order:
/// 1. Exact literal path (O(1) HashMap lookup)
/// 2. Pattern routes, first structural match under the configured
///    `Precedence`
///
/// Every route but the root must have its immediate parent registered, so
/// the table always forms a tree of routable paths.
#[derive(Debug)]
pub struct RouteTable<T> {
    routes: Vec<Route<T>>,
    /// Literal key -> index into `routes`.
    exact: HashMap<String, usize>,
    /// Indices of pattern routes, in match order.
    patterns: Vec<usize>,
    /// Pattern shape (`shape_key`) -> index, for both literal and pattern
    /// routes.
    sources: HashMap<String, usize>,
    names: NameIndex,
    options: TableOptions,
}

impl<T> RouteTable<T> {
    pub fn new(mut options: TableOptions) -> Self {
        options.root = pattern::collapse(&options.root);
        Self {
            routes: Vec::new(),
            exact: HashMap::new(),
            patterns: Vec::new(),
            sources: HashMap::new(),
            names: NameIndex::new(),
            options,
        }
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// All routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route<T>> {
        self.routes.iter()
    }

    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    /// Register a route. On error the table is left unchanged.
    pub fn insert(&mut self, path: &str, target: T) -> Result<&mut Route<T>, RouteError> {
        let compiled = pattern::compile(path, self.options.match_options())?;
        let source_key = compiled.shape_key();

        if self.sources.contains_key(&source_key) {
            return Err(RouteError::DuplicateRoute(compiled.source().to_string()));
        }

        if !self.is_root(compiled.source()) {
            let has_parent = compiled
                .parent_source()
                .map_or(false, |parent| self.contains(&parent));
            if !has_parent {
                return Err(RouteError::ParentDoesNotExist(compiled.source().to_string()));
            }
        }

        let idx = self.routes.len();
        if compiled.is_literal() {
            self.exact.insert(compiled.literal_key(), idx);
        } else {
            let pos = match self.options.precedence {
                Precedence::RegistrationOrder => self.patterns.len(),
                Precedence::Specificity => {
                    let spec = compiled.specificity();
                    self.patterns
                        .iter()
                        .position(|&i| self.routes[i].pattern.specificity() < spec)
                        .unwrap_or(self.patterns.len())
                }
            };
            self.patterns.insert(pos, idx);
        }
        self.sources.insert(source_key, idx);

        tracing::debug!(
            "routing: registered route, path={}, captures={}",
            compiled.source(),
            compiled.capture_count(),
        );

        self.routes.push(Route {
            pattern: compiled,
            target,
        });
        Ok(&mut self.routes[idx])
    }

    /// Match a request URL.
    pub fn lookup(&self, url: &str) -> Result<MatchResult<'_, T>, LookupError> {
        if url.len() > self.options.max_uri_length {
            return Err(LookupError::UriTooLong(url.len()));
        }
        let path = pattern::normalize(url);
        let idx = self
            .find(&path)
            .ok_or_else(|| LookupError::NotFound(path.clone()))?;
        let route = &self.routes[idx];
        let path_variables = extract(&route.pattern, &path)?;
        Ok(MatchResult {
            route,
            name: self.names.name_of(route.path()),
            path,
            path_variables,
        })
    }

    /// Decoded path variables of the route matching `url`.
    pub fn path_variables(&self, url: &str) -> Result<PathVariables, LookupError> {
        Ok(self.lookup(url)?.path_variables)
    }

    /// Find a route by its pattern (`/items/*id`) or by a concrete path it
    /// matches (`/items/42`).
    pub fn route(&self, path_or_url: &str) -> Option<&Route<T>> {
        self.index_of(path_or_url).map(|i| &self.routes[i])
    }

    pub fn route_mut(&mut self, path_or_url: &str) -> Option<&mut Route<T>> {
        let idx = self.index_of(path_or_url)?;
        Some(&mut self.routes[idx])
    }

    /// Give the route behind `path_or_url` an alias.
    pub fn name(&mut self, path_or_url: &str, alias: &str) -> Result<(), NameError> {
        NameIndex::check_name(alias)?;
        let idx = self
            .index_of(path_or_url)
            .ok_or_else(|| NameError::PathDoesNotExist(path_or_url.to_string()))?;
        let source = self.routes[idx].path().to_string();
        self.names.insert(&source, alias)?;
        tracing::debug!("routing: named route, path={}, name={}", source, alias);
        Ok(())
    }

    /// Build a concrete URL for an alias or route pattern, substituting
    /// every capture with the supplied (percent-encoded) value.
    pub fn resolve<I, K, V>(&self, alias_or_path: &str, vars: I) -> Result<String, UrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let path = pattern::normalize(&self.path_if_name(alias_or_path)?);
        let route = self
            .sources
            .get(&self.shape(&path))
            .map(|&i| &self.routes[i])
            .ok_or_else(|| UrlError::NotFound(path.clone()))?;

        let supplied: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        for name in supplied.keys() {
            if !route.pattern.capture_names().any(|c| c == name) {
                return Err(UrlError::UnknownVariableName(name.clone()));
            }
        }

        render(&route.pattern, |name| supplied.get(name).map(String::as_str))
    }

    /// One level of descendants of the route matching `url`, as concrete
    /// URLs under the matched path, valued by alias.
    ///
    /// Children ending in a capture need a value `url` does not carry and
    /// are skipped.
    pub fn child_urls(&self, url: &str) -> Result<IndexMap<String, Option<String>>, LookupError> {
        let matched = self.lookup(url)?;
        let parent_shape = matched.route.pattern.shape_key();

        let mut children = IndexMap::new();
        for route in &self.routes {
            if std::ptr::eq(route, matched.route) {
                continue;
            }
            let is_child = route
                .pattern
                .parent_source()
                .map_or(false, |p| self.shape(&p) == parent_shape);
            if !is_child {
                continue;
            }
            if let Some(Segment::Literal(last)) = route.pattern.segments().last() {
                let alias = self.names.name_of(route.path()).map(str::to_string);
                children.insert(pattern::join(&matched.path, last), alias);
            }
        }
        Ok(children)
    }

    /// Like `child_urls`, keyed by alias and restricted to named children.
    pub fn named_child_urls(&self, url: &str) -> Result<IndexMap<String, String>, LookupError> {
        Ok(self
            .child_urls(url)?
            .into_iter()
            .filter_map(|(child, alias)| alias.map(|a| (a, child)))
            .collect())
    }

    /// The URL one segment up from `url`.
    pub fn parent_url(&self, url: &str) -> Result<String, UrlError> {
        let path = pattern::normalize(url);
        if self.is_root(&path) {
            return Err(UrlError::NoParentUrl(path));
        }
        pattern::parent_path(&path).ok_or(UrlError::NoParentUrl(path))
    }

    fn path_if_name(&self, alias_or_path: &str) -> Result<String, UrlError> {
        if alias_or_path.starts_with('/') {
            return Ok(alias_or_path.to_string());
        }
        self.names
            .path_of(alias_or_path)
            .map(str::to_string)
            .ok_or_else(|| UrlError::NotFound(alias_or_path.to_string()))
    }

    fn is_root(&self, path: &str) -> bool {
        self.key(path) == self.key(&self.options.root)
    }

    fn contains(&self, path_or_url: &str) -> bool {
        self.index_of(path_or_url).is_some()
    }

    fn index_of(&self, path_or_url: &str) -> Option<usize> {
        let path = pattern::normalize(path_or_url);
        self.sources
            .get(&self.shape(&path))
            .copied()
            .or_else(|| self.find(&path))
    }

    fn find(&self, path: &str) -> Option<usize> {
        if let Some(&idx) = self.exact.get(self.key(path).as_ref()) {
            return Some(idx);
        }
        self.patterns
            .iter()
            .copied()
            .find(|&idx| self.routes[idx].pattern.is_match(path))
    }

    fn shape(&self, path: &str) -> String {
        pattern::shape_key(path, self.options.case_sensitive)
    }

    fn key<'p>(&self, path: &'p str) -> Cow<'p, str> {
        if self.options.case_sensitive {
            Cow::Borrowed(path)
        } else {
            Cow::Owned(path.to_lowercase())
        }
    }
}

/// Substitute captures of `pattern` with values from `value_of`.
fn render<'v>(
    pattern: &CompiledPattern,
    value_of: impl Fn(&str) -> Option<&'v str>,
) -> Result<String, UrlError> {
    let mut out = String::new();
    for segment in pattern.segments() {
        out.push('/');
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Capture(name) | Segment::Rest(name) => {
                let value = value_of(name)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| UrlError::MissingVariable(name.clone()))?;
                let encoded = if matches!(segment, Segment::Rest(_)) {
                    encode_rest(value)
                } else {
                    encode_segment(value)
                };
                if encoded.is_empty() {
                    return Err(UrlError::MissingVariable(name.clone()));
                }
                out.push_str(&encoded);
            }
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        RouteTable::new(TableOptions::default())
    }

    fn with_routes(routes: &[(&str, &'static str)]) -> RouteTable<&'static str> {
        let mut t = table();
        for &(path, target) in routes {
            t.insert(path, target).unwrap();
        }
        t
    }

    #[test]
    fn test_exact_lookup() {
        let t = with_routes(&[("/", "root"), ("/items", "items")]);
        assert_eq!(*t.lookup("/items").unwrap().route.target(), "items");
        assert_eq!(*t.lookup("/").unwrap().route.target(), "root");
    }

    #[test]
    fn test_lookup_normalizes() {
        let t = with_routes(&[("/", "root"), ("/items", "items")]);
        assert_eq!(*t.lookup("//items/?page=2").unwrap().route.target(), "items");
        assert_eq!(t.lookup("/items#x").unwrap().path, "/items");
    }

    #[test]
    fn test_not_found() {
        let t = with_routes(&[("/", "root")]);
        assert_eq!(
            t.lookup("/missing").unwrap_err(),
            LookupError::NotFound("/missing".to_string())
        );
    }

    #[test]
    fn test_empty_table_not_found() {
        let t = table();
        assert!(matches!(t.lookup("/"), Err(LookupError::NotFound(_))));
    }

    #[test]
    fn test_pattern_lookup_extracts_vars() {
        let t = with_routes(&[("/", "root"), ("/items", "items"), ("/items/*id", "item")]);
        let m = t.lookup("/items/42").unwrap();
        assert_eq!(*m.route.target(), "item");
        assert_eq!(m.route.path(), "/items/*id");
        assert_eq!(m.path_variables["id"], "42");
    }

    #[test]
    fn test_exact_beats_pattern() {
        let t = with_routes(&[
            ("/", "root"),
            ("/items", "items"),
            ("/items/*id", "item"),
            ("/items/new", "new"),
        ]);
        assert_eq!(*t.lookup("/items/new").unwrap().route.target(), "new");
        assert_eq!(*t.lookup("/items/old").unwrap().route.target(), "item");
    }

    #[test]
    fn test_parent_required() {
        let mut t = with_routes(&[("/", "root")]);
        assert_eq!(
            t.insert("/a/b", "ab").unwrap_err(),
            RouteError::ParentDoesNotExist("/a/b".to_string())
        );
        assert_eq!(
            t.insert("/a/*id", "aid").unwrap_err(),
            RouteError::ParentDoesNotExist("/a/*id".to_string())
        );
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_root_needs_no_parent_but_others_need_root() {
        let mut t = table();
        assert!(matches!(
            t.insert("/items", "items"),
            Err(RouteError::ParentDoesNotExist(_))
        ));
        t.insert("/", "root").unwrap();
        t.insert("/items", "items").unwrap();
    }

    #[test]
    fn test_parent_may_be_pattern() {
        let mut t = with_routes(&[("/", "root"), ("/items", "items"), ("/items/*id", "item")]);
        t.insert("/items/*id/parts", "parts").unwrap();
        let m = t.lookup("/items/7/parts").unwrap();
        assert_eq!(*m.route.target(), "parts");
        assert_eq!(m.path_variables["id"], "7");
    }

    #[test]
    fn test_only_immediate_parent_checked() {
        let mut t = with_routes(&[("/", "root"), ("/a", "a"), ("/a/*x", "ax")]);
        // "/a/*x" matches "/a/b", so "/a/b/c" has a routable parent.
        t.insert("/a/b/c", "abc").unwrap();
    }

    #[test]
    fn test_duplicate_literal_rejected() {
        let mut t = with_routes(&[("/", "root"), ("/items", "items")]);
        assert_eq!(
            t.insert("/items/", "again").unwrap_err(),
            RouteError::DuplicateRoute("/items".to_string())
        );
        assert_eq!(*t.lookup("/items").unwrap().route.target(), "items");
    }

    #[test]
    fn test_duplicate_pattern_rejected() {
        let mut t = with_routes(&[("/", "root"), ("/*id", "id")]);
        assert!(matches!(
            t.insert("/*id", "again"),
            Err(RouteError::DuplicateRoute(_))
        ));
    }

    #[test]
    fn test_duplicate_shape_rejected() {
        let mut t = with_routes(&[("/", "root"), ("/items", "items"), ("/items/*id", "item")]);
        assert_eq!(
            t.insert("/items/:id", "colon").unwrap_err(),
            RouteError::DuplicateRoute("/items/:id".to_string())
        );
        assert!(matches!(
            t.insert("/items/*name", "renamed"),
            Err(RouteError::DuplicateRoute(_))
        ));
        assert_eq!(t.len(), 3);
        assert_eq!(*t.lookup("/items/7").unwrap().route.target(), "item");
    }

    #[test]
    fn test_invalid_path_rejected() {
        let mut t = table();
        assert_eq!(
            t.insert("items", "x").unwrap_err(),
            RouteError::InvalidPath("items".to_string())
        );
    }

    #[test]
    fn test_duplicate_capture_rejected() {
        let mut t = with_routes(&[("/", "root"), ("/*a", "a")]);
        assert!(matches!(
            t.insert("/*a/*a", "aa"),
            Err(RouteError::Pattern(_))
        ));
    }

    #[test]
    fn test_uri_too_long() {
        let t = with_routes(&[("/", "root"), ("/*any", "any")]);
        let long = format!("/{}", "a".repeat(DEFAULT_MAX_URI_LENGTH));
        assert_eq!(
            t.lookup(&long).unwrap_err(),
            LookupError::UriTooLong(DEFAULT_MAX_URI_LENGTH + 1)
        );
        let exact = format!("/{}", "a".repeat(DEFAULT_MAX_URI_LENGTH - 1));
        assert!(t.lookup(&exact).is_ok());
    }

    #[test]
    fn test_registration_order_precedence() {
        let t = with_routes(&[
            ("/", "root"),
            ("/*section", "section"),
            ("/*section/*page", "generic"),
            ("/docs", "docs"),
            ("/docs/*page", "docs-page"),
        ]);
        // Both pattern routes match; the earlier registration wins.
        assert_eq!(*t.lookup("/docs/intro").unwrap().route.target(), "generic");
    }

    #[test]
    fn test_specificity_precedence() {
        let mut t = RouteTable::new(TableOptions {
            precedence: Precedence::Specificity,
            ..TableOptions::default()
        });
        for (path, target) in [
            ("/", "root"),
            ("/*section", "section"),
            ("/*section/*page", "generic"),
            ("/docs", "docs"),
            ("/docs/*page", "docs-page"),
        ] {
            t.insert(path, target).unwrap();
        }
        assert_eq!(*t.lookup("/docs/intro").unwrap().route.target(), "docs-page");
        assert_eq!(*t.lookup("/blog/intro").unwrap().route.target(), "generic");
    }

    #[test]
    fn test_specificity_ties_keep_registration_order() {
        let mut t = RouteTable::new(TableOptions {
            precedence: Precedence::Specificity,
            ..TableOptions::default()
        });
        for (path, target) in [
            ("/", "root"),
            ("/*a", "a"),
            ("/*a/x", "ax"),
            ("/*a/*b", "ab"),
            ("/*a/x/*b", "first"),
            ("/*a/*b/x", "second"),
        ] {
            t.insert(path, target).unwrap();
        }
        // Same literal count, same (empty) literal prefix.
        assert_eq!(*t.lookup("/1/x/x").unwrap().route.target(), "first");
    }

    #[test]
    fn test_case_insensitive_table() {
        let mut t = RouteTable::new(TableOptions {
            case_sensitive: false,
            ..TableOptions::default()
        });
        t.insert("/", "root").unwrap();
        t.insert("/About", "about").unwrap();
        t.insert("/About/*id", "item").unwrap();
        assert_eq!(*t.lookup("/ABOUT").unwrap().route.target(), "about");
        assert_eq!(t.lookup("/about/X").unwrap().path_variables["id"], "X");
        assert!(matches!(
            t.insert("/about", "dup"),
            Err(RouteError::DuplicateRoute(_))
        ));
    }

    #[test]
    fn test_mount_root() {
        let mut t = RouteTable::new(TableOptions {
            root: "/api/".to_string(),
            ..TableOptions::default()
        });
        t.insert("/api", "api").unwrap();
        t.insert("/api/items", "items").unwrap();
        assert_eq!(
            t.parent_url("/api").unwrap_err(),
            UrlError::NoParentUrl("/api".to_string())
        );
        assert_eq!(t.parent_url("/api/items").unwrap(), "/api");
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let t = with_routes(&[("/", "root"), ("/*id", "id")]);
        let a = t.lookup("/x%20y").unwrap();
        let b = t.lookup("/x%20y").unwrap();
        assert!(std::ptr::eq(a.route, b.route));
        assert_eq!(a.path_variables, b.path_variables);
        assert_eq!(a.path_variables["id"], "x y");
    }

    #[test]
    fn test_lookup_decoding_error() {
        let t = with_routes(&[("/", "root"), ("/*id", "id")]);
        assert!(matches!(t.lookup("/%zz"), Err(LookupError::Decoding(_))));
    }

    #[test]
    fn test_name_and_resolve() {
        let mut t = with_routes(&[("/", "root"), ("/items", "items"), ("/items/*id", "item")]);
        t.name("/items/*id", "item").unwrap();
        assert_eq!(t.resolve("item", [("id", "42")]).unwrap(), "/items/42");
        assert_eq!(t.resolve("/items/*id", [("id", "a b")]).unwrap(), "/items/a%20b");
        assert_eq!(t.lookup("/items/9").unwrap().name, Some("item"));
    }

    #[test]
    fn test_name_by_concrete_url() {
        let mut t = with_routes(&[("/", "root"), ("/*id", "id")]);
        t.name("/42", "thing").unwrap();
        assert_eq!(t.names().path_of("thing"), Some("/*id"));
    }

    #[test]
    fn test_name_errors() {
        let mut t = with_routes(&[("/", "root")]);
        assert_eq!(
            t.name("/", "/root"),
            Err(NameError::InvalidName("/root".to_string()))
        );
        assert_eq!(
            t.name("/nope", "nope"),
            Err(NameError::PathDoesNotExist("/nope".to_string()))
        );
    }

    #[test]
    fn test_resolve_errors() {
        let t = with_routes(&[("/", "root"), ("/items", "items"), ("/items/*id", "item")]);
        assert_eq!(
            t.resolve("/items/*id", [("id", "1"), ("extra", "2")]),
            Err(UrlError::UnknownVariableName("extra".to_string()))
        );
        assert_eq!(
            t.resolve("/items/*id", Vec::<(&str, &str)>::new()),
            Err(UrlError::MissingVariable("id".to_string()))
        );
        assert_eq!(
            t.resolve("/items/*id", [("id", "")]),
            Err(UrlError::MissingVariable("id".to_string()))
        );
        assert_eq!(
            t.resolve("nobody", Vec::<(&str, &str)>::new()),
            Err(UrlError::NotFound("nobody".to_string()))
        );
        assert_eq!(
            t.resolve("/elsewhere", Vec::<(&str, &str)>::new()),
            Err(UrlError::NotFound("/elsewhere".to_string()))
        );
        assert_eq!(
            t.resolve("/items/42", Vec::<(&str, &str)>::new()),
            Err(UrlError::NotFound("/items/42".to_string()))
        );
    }

    #[test]
    fn test_resolve_literal() {
        let t = with_routes(&[("/", "root"), ("/items", "items")]);
        assert_eq!(t.resolve("/items", Vec::<(&str, &str)>::new()).unwrap(), "/items");
        assert_eq!(t.resolve("/", Vec::<(&str, &str)>::new()).unwrap(), "/");
    }

    #[test]
    fn test_resolve_lookup_round_trip() {
        let t = with_routes(&[
            ("/", "root"),
            ("/*a", "a"),
            ("/*a/x", "ax"),
            ("/*a/x/*b", "axb"),
            ("/*a/x/*b/**rest", "rest"),
        ]);
        let samples = [
            vec![("a", "1")],
            vec![("a", "hello world"), ("b", "ü/ß?#%")],
            vec![("a", "p"), ("b", "q"), ("rest", "deep/er/path")],
        ];
        let patterns = ["/*a", "/*a/x/*b", "/*a/x/*b/**rest"];
        for (pattern, vars) in patterns.iter().zip(samples.iter()) {
            let url = t.resolve(pattern, vars.iter().copied()).unwrap();
            let m = t.lookup(&url).unwrap();
            assert_eq!(m.route.path(), *pattern);
            let expected: PathVariables = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            assert_eq!(m.path_variables, expected);
        }
    }

    #[test]
    fn test_child_urls() {
        let mut t = with_routes(&[
            ("/", "root"),
            ("/items", "items"),
            ("/items/*id", "item"),
            ("/items/*id/parts", "parts"),
            ("/items/*id/owner", "owner"),
            ("/items/*id/parts/*part", "part"),
            ("/about", "about"),
        ]);
        t.name("/items/*id/owner", "owner").unwrap();

        let kids = t.child_urls("/items/9").unwrap();
        let keys: Vec<&str> = kids.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/items/9/parts", "/items/9/owner"]);
        assert_eq!(kids["/items/9/parts"], None);
        assert_eq!(kids["/items/9/owner"], Some("owner".to_string()));

        // "/items/*id" needs an id that "/items" does not carry.
        assert!(t.child_urls("/items").unwrap().is_empty());

        let root_kids = t.child_urls("/").unwrap();
        let keys: Vec<&str> = root_kids.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/items", "/about"]);

        let named = t.named_child_urls("/items/9").unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named["owner"], "/items/9/owner");
    }

    #[test]
    fn test_child_urls_across_capture_names() {
        let t = with_routes(&[("/", "root"), ("/a", "a"), ("/a/*x", "ax"), ("/a/*y/c", "ayc")]);
        let m = t.lookup("/a/5/c").unwrap();
        assert_eq!(*m.route.target(), "ayc");
        assert_eq!(m.path_variables["y"], "5");

        let kids = t.child_urls("/a/5").unwrap();
        let keys: Vec<&str> = kids.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/a/5/c"]);
    }

    #[test]
    fn test_child_urls_unknown() {
        let t = with_routes(&[("/", "root")]);
        assert!(matches!(t.child_urls("/nope"), Err(LookupError::NotFound(_))));
    }

    #[test]
    fn test_parent_url() {
        let t = with_routes(&[("/", "root")]);
        assert_eq!(t.parent_url("/items/42?x=1").unwrap(), "/items");
        assert_eq!(t.parent_url("/items").unwrap(), "/");
        assert_eq!(
            t.parent_url("/").unwrap_err(),
            UrlError::NoParentUrl("/".to_string())
        );
    }

    #[test]
    fn test_route_mut_by_url() {
        let mut t = with_routes(&[("/", "root"), ("/*id", "id")]);
        *t.route_mut("/5").unwrap().target_mut() = "changed";
        assert_eq!(*t.lookup("/6").unwrap().route.target(), "changed");
    }

    #[test]
    fn test_path_variables_shorthand() {
        let t = with_routes(&[("/", "root"), ("/*a", "a"), ("/*a/*b", "ab")]);
        let vars = t.path_variables("/x/y").unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["a"], "x");
        assert_eq!(vars["b"], "y");
    }
}
