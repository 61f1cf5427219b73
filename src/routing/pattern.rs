use crate::error::PatternError;
use regex::Regex;
use std::collections::HashSet;

/// Options that change how literal segments compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub case_sensitive: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

/// One segment of a route pattern.
///
/// - `items`: literal
/// - `*id` or `:id`: capture, matches exactly one non-slash segment
/// - `**rest`: rest capture, only as the last segment, matches one or more
///   remaining segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Capture(String),
    Rest(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix("**") {
            Segment::Rest(name.to_string())
        } else if let Some(name) = raw.strip_prefix('*').or_else(|| raw.strip_prefix(':')) {
            Segment::Capture(name.to_string())
        } else {
            Segment::Literal(raw.to_string())
        }
    }

    pub fn capture_name(&self) -> Option<&str> {
        match self {
            Segment::Capture(name) | Segment::Rest(name) => Some(name),
            Segment::Literal(_) => None,
        }
    }
}

/// A route pattern compiled once at registration time.
///
/// Literal patterns carry no regex: they are served from the exact-match
/// partition of the route table. Patterns with at least one capture carry an
/// anchored regex that matches a whole normalized path in one pass.
#[derive(Debug)]
pub struct CompiledPattern {
    source: String,
    segments: Vec<Segment>,
    matcher: Option<Regex>,
    case_sensitive: bool,
}

impl CompiledPattern {
    /// The canonical pattern text, e.g. `/items/*id`.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_literal(&self) -> bool {
        self.matcher.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Capture names in declaration order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::capture_name)
    }

    pub fn capture_count(&self) -> usize {
        self.capture_names().count()
    }

    /// Key used by the exact-match partition.
    pub fn literal_key(&self) -> String {
        literal_key(&self.source, self.case_sensitive)
    }

    /// Match a normalized path against the whole pattern.
    pub fn is_match(&self, path: &str) -> bool {
        match &self.matcher {
            Some(re) => re.is_match(path),
            None => literal_key(path, self.case_sensitive) == self.literal_key(),
        }
    }

    /// Ordering key for `Precedence::Specificity`: number of literal
    /// segments, then length of the leading literal run. Higher sorts first.
    pub fn specificity(&self) -> (usize, usize) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        let prefix = self
            .segments
            .iter()
            .take_while(|s| matches!(s, Segment::Literal(_)))
            .count();
        (literals, prefix)
    }

    /// Canonical path of the pattern with its last segment removed.
    pub fn parent_source(&self) -> Option<String> {
        parent_path(&self.source)
    }

    pub fn shape_key(&self) -> String {
        shape_key(&self.source, self.case_sensitive)
    }
}

/// Compile a route pattern.
pub fn compile(pattern: &str, options: MatchOptions) -> Result<CompiledPattern, PatternError> {
    if !pattern.starts_with('/') {
        return Err(PatternError::InvalidPath(pattern.to_string()));
    }
    let source = collapse(pattern);
    let raw = split_segments(&source);

    let mut segments = Vec::with_capacity(raw.len());
    let mut seen = HashSet::new();
    for (idx, part) in raw.iter().enumerate() {
        let segment = Segment::parse(part);
        if let Some(name) = segment.capture_name() {
            if name.is_empty() {
                return Err(PatternError::EmptyCaptureName(source.clone()));
            }
            if !seen.insert(name.to_string()) {
                return Err(PatternError::DuplicateCapture(name.to_string()));
            }
            if matches!(segment, Segment::Rest(_)) && idx + 1 != raw.len() {
                return Err(PatternError::RestCaptureNotLast(name.to_string()));
            }
        }
        segments.push(segment);
    }

    let matcher = if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
        None
    } else {
        Some(build_regex(&segments, options.case_sensitive)?)
    };

    Ok(CompiledPattern {
        source,
        segments,
        matcher,
        case_sensitive: options.case_sensitive,
    })
}

fn build_regex(segments: &[Segment], case_sensitive: bool) -> Result<Regex, PatternError> {
    let mut re = String::from(if case_sensitive { "^" } else { "(?i)^" });
    for segment in segments {
        re.push('/');
        match segment {
            Segment::Literal(s) => re.push_str(&regex::escape(s)),
            Segment::Capture(_) => re.push_str("([^/]+)"),
            Segment::Rest(_) => re.push_str("(.+)"),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| PatternError::Regex(e.to_string()))
}

fn literal_key(path: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        path.to_string()
    } else {
        path.to_lowercase()
    }
}

/// Pattern path with capture names erased: `*id` and `:id` become `*`,
/// `**rest` becomes `**`. Patterns with the same shape match the same paths.
///
/// "/items/:id/**rest" -> "/items/*/**"
pub fn shape_key(path: &str, case_sensitive: bool) -> String {
    let mut out = String::new();
    for raw in split_segments(path) {
        out.push('/');
        match Segment::parse(raw) {
            Segment::Literal(s) => out.push_str(&literal_key(&s, case_sensitive)),
            Segment::Capture(_) => out.push('*'),
            Segment::Rest(_) => out.push_str("**"),
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Reduce a request URL to its canonical path.
///
/// "http://host/a//b/?x=1#top" -> "/a/b"
/// "" -> "/"
pub fn normalize(url: &str) -> String {
    let mut rest = url;
    if let Some(idx) = rest.find("://") {
        let scheme = &rest[..idx];
        let is_scheme = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if is_scheme {
            let after = &rest[idx + 3..];
            rest = match after.find(['/', '?', '#']) {
                Some(i) => &after[i..],
                None => "",
            };
        }
    }
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    collapse(&rest[..end])
}

/// Collapse repeated slashes and drop the trailing slash. Root stays `/`.
pub fn collapse(path: &str) -> String {
    join_segments(split_segments(path))
}

/// Slash-join a base path and a relative path into a canonical path.
pub fn join(base: &str, path: &str) -> String {
    join_segments(split_segments(base).into_iter().chain(split_segments(path)))
}

/// "/a/b" -> ["a", "b"], "/" -> []
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical path with its last segment removed; `None` for the root.
pub fn parent_path(path: &str) -> Option<String> {
    let mut segments = split_segments(path);
    if segments.pop().is_none() {
        return None;
    }
    Some(join_segments(segments))
}

fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for s in segments {
        out.push('/');
        out.push_str(s);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
