use crate::error::DecodingError;
use crate::routing::pattern::{split_segments, CompiledPattern, Segment};
use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when a variable is substituted into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Pull the path variables of `pattern` out of an already matched,
/// normalized `path`.
///
/// Captures are walked structurally in declaration order, so the returned
/// map has exactly one entry per capture, in the order they appear in the
/// pattern. Each value is percent-decoded.
pub fn extract(
    pattern: &CompiledPattern,
    path: &str,
) -> Result<IndexMap<String, String>, DecodingError> {
    let parts = split_segments(path);
    let mut vars = IndexMap::with_capacity(pattern.capture_count());

    for (idx, segment) in pattern.segments().iter().enumerate() {
        match segment {
            Segment::Literal(_) => {}
            Segment::Capture(name) => {
                let raw = parts.get(idx).copied().unwrap_or_default();
                vars.insert(name.clone(), decode(raw)?);
            }
            Segment::Rest(name) => {
                let raw = parts.get(idx..).map(|r| r.join("/")).unwrap_or_default();
                vars.insert(name.clone(), decode(&raw)?);
            }
        }
    }

    Ok(vars)
}

/// Strict percent-decoding: a `%` must be followed by two hex digits and
/// the decoded bytes must be UTF-8.
pub fn decode(raw: &str) -> Result<String, DecodingError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return Err(DecodingError {
                    raw: raw.to_string(),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| DecodingError {
            raw: raw.to_string(),
        })
}

/// Escape a value for use as a single path segment.
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Escape a value for a rest capture: slashes stay separators.
pub fn encode_rest(value: &str) -> String {
    value
        .split('/')
        .filter(|s| !s.is_empty())
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern::{compile, MatchOptions};

    fn vars(pattern: &str, path: &str) -> IndexMap<String, String> {
        let p = compile(pattern, MatchOptions::default()).unwrap();
        assert!(p.is_match(path), "{} should match {}", pattern, path);
        extract(&p, path).unwrap()
    }

    #[test]
    fn test_single_capture() {
        let v = vars("/items/*id", "/items/42");
        assert_eq!(v.len(), 1);
        assert_eq!(v["id"], "42");
    }

    #[test]
    fn test_declaration_order() {
        let v = vars("/*zeta/x/*alpha/*mid", "/1/x/2/3");
        let names: Vec<&str> = v.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        let values: Vec<&str> = v.values().map(|k| k.as_str()).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_literal_pattern_has_no_vars() {
        assert!(vars("/items", "/items").is_empty());
    }

    #[test]
    fn test_percent_decoding() {
        let v = vars("/users/*name", "/users/J%C3%BCrgen%20K");
        assert_eq!(v["name"], "Jürgen K");
    }

    #[test]
    fn test_plus_is_not_space() {
        let v = vars("/q/*term", "/q/a+b");
        assert_eq!(v["term"], "a+b");
    }

    #[test]
    fn test_rest_capture() {
        let v = vars("/files/*bucket/**path", "/files/b1/a/b%20c/d.txt");
        assert_eq!(v["bucket"], "b1");
        assert_eq!(v["path"], "a/b c/d.txt");
    }

    #[test]
    fn test_malformed_encoding_fails() {
        let p = compile("/items/*id", MatchOptions::default()).unwrap();
        let err = extract(&p, "/items/%zz").unwrap_err();
        assert_eq!(err.raw, "%zz");
        assert!(extract(&p, "/items/abc%").is_err());
        assert!(extract(&p, "/items/abc%4").is_err());
    }

    #[test]
    fn test_invalid_utf8_fails() {
        assert_eq!(
            decode("%ff%fe").unwrap_err(),
            DecodingError {
                raw: "%ff%fe".to_string()
            }
        );
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(encode_segment("plain-42"), "plain-42");
        assert_eq!(decode(&encode_segment("100% ünïcode/x")).unwrap(), "100% ünïcode/x");
    }

    #[test]
    fn test_encode_rest_keeps_separators() {
        assert_eq!(encode_rest("a b/c"), "a%20b/c");
    }
}
