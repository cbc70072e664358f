//! Property path utilities.
//!
//! A property path addresses a node of a state tree with dot and bracket
//! notation: `a.b[0].c`, `list[-1]`, `["key.with.dots"]`. Integer steps stay
//! symbolic until they meet a concrete array, so negative steps always count
//! from the end of the array *as it is at resolution time*.
//!
//! # Example
//!
//! ```
//! use auto_immutable_path::{parse_property_path, resolve};
//! use serde_json::json;
//!
//! let doc = json!({"a": {"b": [1, 2, 3]}});
//!
//! let path = parse_property_path("a.b[-1]");
//! let reference = resolve(&path, &doc);
//! assert!(reference.exists);
//! assert_eq!(reference.value.as_deref(), Some(&json!(3)));
//! assert_eq!(reference.key.as_deref(), Some("2"));
//! ```

use serde_json::Value;
use std::borrow::Cow;

pub mod types;
pub use types::{parse_integer, PropertyPath, Reference, Token, FULL_STATE_SELECTOR};

/// Parse a property path string into tokens.
///
/// - `.` separates steps and `[...]` wraps a step
/// - bracketed steps may be quoted with `'` or `"` to carry dots or brackets
/// - empty steps are dropped
/// - the empty string and [`FULL_STATE_SELECTOR`] yield [`PropertyPath::Whole`]
///
/// Parsing never fails: an unterminated bracket takes the rest of the input
/// as its step.
///
/// # Example
///
/// ```
/// use auto_immutable_path::{parse_property_path, PropertyPath, Token};
///
/// let path = parse_property_path("a.b[0][-2]");
/// assert_eq!(
///     path,
///     PropertyPath::Tokens(vec![
///         Token::new("a"),
///         Token::new("b"),
///         Token::new("0"),
///         Token::new("-2"),
///     ])
/// );
/// assert!(parse_property_path("@@STATE").is_whole());
/// ```
pub fn parse_property_path(path: &str) -> PropertyPath {
    if path == FULL_STATE_SELECTOR {
        return PropertyPath::Whole;
    }
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => flush(&mut current, &mut tokens),
            '[' => {
                flush(&mut current, &mut tokens);
                let mut step = String::new();
                match chars.peek() {
                    Some(&quote) if quote == '"' || quote == '\'' => {
                        chars.next();
                        for c in chars.by_ref() {
                            if c == quote {
                                break;
                            }
                            step.push(c);
                        }
                        // skip to the closing bracket
                        for c in chars.by_ref() {
                            if c == ']' {
                                break;
                            }
                        }
                    }
                    _ => {
                        for c in chars.by_ref() {
                            if c == ']' {
                                break;
                            }
                            step.push(c);
                        }
                    }
                }
                flush(&mut step, &mut tokens);
            }
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);

    if tokens.is_empty() || (tokens.len() == 1 && tokens[0].as_str() == FULL_STATE_SELECTOR) {
        PropertyPath::Whole
    } else {
        PropertyPath::Tokens(tokens)
    }
}

fn flush(step: &mut String, tokens: &mut Vec<Token>) {
    if !step.is_empty() {
        tokens.push(Token::new(std::mem::take(step)));
    }
}

/// Format a property path back into its string form.
///
/// Integer steps render in brackets, keys that would not survive a re-parse
/// render quoted.
///
/// # Example
///
/// ```
/// use auto_immutable_path::{format_property_path, parse_property_path};
///
/// assert_eq!(format_property_path(&parse_property_path("a.0.b")), "a[0].b");
/// assert_eq!(format_property_path(&parse_property_path("['x.y']")), "[\"x.y\"]");
/// assert_eq!(format_property_path(&parse_property_path("")), "@@STATE");
/// ```
pub fn format_property_path(path: &PropertyPath) -> String {
    let tokens = path.tokens();
    if tokens.is_empty() {
        return FULL_STATE_SELECTOR.to_string();
    }
    let mut out = String::new();
    for token in tokens {
        let text = token.as_str();
        if token.index().is_some() {
            out.push_str(&token.to_string());
        } else if text.contains(['.', '[', ']']) {
            out.push_str("[\"");
            out.push_str(text);
            out.push_str("\"]");
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(text);
        }
    }
    out
}

/// Resolve a path against a tree.
///
/// Integer steps against arrays are resolved against the current length,
/// negative steps counting from the end. An index outside `[0, length)` stops
/// resolution. A trailing `length` step against an array yields its length.
/// Any other non-integer step against an array does not exist.
pub fn resolve<'a>(path: &PropertyPath, root: &'a Value) -> Reference<'a> {
    let tokens = path.tokens();
    if tokens.is_empty() {
        return Reference {
            exists: true,
            value: Some(Cow::Borrowed(root)),
            container: None,
            key: None,
            trail: Vec::new(),
        };
    }

    let missing = |container: &'a Value, key: &str, trail: Vec<String>| Reference {
        exists: false,
        value: None,
        container: Some(container),
        key: Some(key.to_string()),
        trail,
    };

    let mut current = root;
    let mut trail = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let last = i + 1 == tokens.len();
        let (key, next) = match current {
            Value::Array(arr) => {
                if token.index().is_some() {
                    match token.resolve_index(arr.len()) {
                        Some(idx) => (idx.to_string(), &arr[idx]),
                        None => return missing(current, token.as_str(), trail),
                    }
                } else if last && token.as_str() == "length" {
                    return Reference {
                        exists: true,
                        value: Some(Cow::Owned(Value::from(arr.len()))),
                        container: Some(current),
                        key: Some(token.as_str().to_string()),
                        trail,
                    };
                } else {
                    return missing(current, token.as_str(), trail);
                }
            }
            Value::Object(map) => match map.get(token.as_str()) {
                Some(next) => (token.as_str().to_string(), next),
                None => return missing(current, token.as_str(), trail),
            },
            _ => return missing(current, token.as_str(), trail),
        };
        if last {
            return Reference {
                exists: true,
                value: Some(Cow::Borrowed(next)),
                container: Some(current),
                key: Some(key),
                trail,
            };
        }
        trail.push(key);
        current = next;
    }
    unreachable!("non-empty token list always returns from the loop")
}

/// Get the value at `path`, if it exists.
pub fn get<'a>(path: &PropertyPath, root: &'a Value) -> Option<Cow<'a, Value>> {
    resolve(path, root).value
}

/// Check if `ancestor` is a proper prefix of `path`.
///
/// The whole-tree sentinel is the ancestor of every other path. Steps are
/// compared by their text.
///
/// # Example
///
/// ```
/// use auto_immutable_path::{is_ancestor, parse_property_path as p};
///
/// assert!(is_ancestor(&p("a"), &p("a.b")));
/// assert!(is_ancestor(&p("@@STATE"), &p("a")));
/// assert!(!is_ancestor(&p("a.b"), &p("a")));
/// assert!(!is_ancestor(&p("a"), &p("a")));
/// ```
pub fn is_ancestor(ancestor: &PropertyPath, path: &PropertyPath) -> bool {
    let a = ancestor.tokens();
    let p = path.tokens();
    a.len() < p.len() && a.iter().zip(p).all(|(x, y)| x.as_str() == y.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> PropertyPath {
        parse_property_path(s)
    }

    fn texts(path: &PropertyPath) -> Vec<&str> {
        path.tokens().iter().map(Token::as_str).collect()
    }

    #[test]
    fn test_parse_dotted() {
        assert_eq!(texts(&p("a.b.c")), vec!["a", "b", "c"]);
        assert_eq!(texts(&p("a..b.")), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_brackets() {
        assert_eq!(texts(&p("a[0].b[-1]")), vec!["a", "0", "b", "-1"]);
        assert_eq!(texts(&p("[1][2]")), vec!["1", "2"]);
        assert_eq!(texts(&p("a.0")), texts(&p("a[0]")));
    }

    #[test]
    fn test_parse_quoted() {
        assert_eq!(texts(&p("a['x.y'].z")), vec!["a", "x.y", "z"]);
        assert_eq!(texts(&p("a[\"[b]\"]")), vec!["a", "[b]"]);
    }

    #[test]
    fn test_parse_unterminated_bracket() {
        assert_eq!(texts(&p("a[12")), vec!["a", "12"]);
    }

    #[test]
    fn test_parse_whole() {
        assert!(p("").is_whole());
        assert!(p("@@STATE").is_whole());
        assert!(p("[@@STATE]").is_whole());
        assert!(p(".").is_whole());
        assert!(!p("@@STATE.a").is_whole());
    }

    #[test]
    fn test_format_roundtrip() {
        for s in ["a", "a.b", "a[0]", "a[-1].b", "[3]", "a[\"x.y\"].z", "@@STATE"] {
            assert_eq!(format_property_path(&p(s)), s, "roundtrip of {s:?}");
        }
    }

    #[test]
    fn test_resolve_whole() {
        let doc = json!({"a": 1});
        let r = resolve(&PropertyPath::Whole, &doc);
        assert!(r.exists);
        assert_eq!(r.value.as_deref(), Some(&doc));
        assert!(r.container.is_none());
        assert!(r.key.is_none());
    }

    #[test]
    fn test_resolve_nested() {
        let doc = json!({"a": {"b": [{"c": 7}]}});
        let r = resolve(&p("a.b[0].c"), &doc);
        assert!(r.exists);
        assert_eq!(r.value.as_deref(), Some(&json!(7)));
        assert_eq!(r.container, Some(&json!({"c": 7})));
        assert_eq!(r.key.as_deref(), Some("c"));
        assert_eq!(r.trail, vec!["a", "b", "0"]);
        assert_eq!(r.concrete_path(), vec!["a", "b", "0", "c"]);
    }

    #[test]
    fn test_resolve_negative_index() {
        let doc = json!({"list": [1, 2, 3]});
        let r = resolve(&p("list[-1]"), &doc);
        assert_eq!(r.value.as_deref(), Some(&json!(3)));
        assert_eq!(r.key.as_deref(), Some("2"));

        let r = resolve(&p("list[-4]"), &doc);
        assert!(!r.exists);
        assert_eq!(r.container, Some(&json!([1, 2, 3])));
        assert_eq!(r.key.as_deref(), Some("-4"));
        assert_eq!(r.trail, vec!["list"]);
    }

    #[test]
    fn test_resolve_same_path_after_length_change() {
        let path = p("list[-1]");
        let before = json!({"list": [1, 2, 3]});
        let after = json!({"list": [1, 2]});
        assert_eq!(resolve(&path, &before).value.as_deref(), Some(&json!(3)));
        assert_eq!(resolve(&path, &after).value.as_deref(), Some(&json!(2)));
    }

    #[test]
    fn test_resolve_missing_reports_deepest_ancestor() {
        let doc = json!({"a": {"b": 1}});
        let r = resolve(&p("a.x.y"), &doc);
        assert!(!r.exists);
        assert_eq!(r.container, Some(&json!({"b": 1})));
        assert_eq!(r.key.as_deref(), Some("x"));
        assert_eq!(r.trail, vec!["a"]);
        assert_eq!(r.value_or_null(), Value::Null);
    }

    #[test]
    fn test_resolve_through_scalar() {
        let doc = json!({"a": 5});
        let r = resolve(&p("a.b"), &doc);
        assert!(!r.exists);
        assert_eq!(r.container, Some(&json!(5)));
    }

    #[test]
    fn test_resolve_array_length_and_keys() {
        let doc = json!({"list": [1, 2, 3]});
        assert_eq!(get(&p("list.length"), &doc).as_deref(), Some(&json!(3)));
        assert!(get(&p("list.size"), &doc).is_none());
        assert!(get(&p("list.length.x"), &doc).is_none());
    }

    #[test]
    fn test_resolve_integer_key_on_map() {
        let doc = json!({"m": {"0": "zero", "-1": "minus"}});
        assert_eq!(get(&p("m[0]"), &doc).as_deref(), Some(&json!("zero")));
        assert_eq!(get(&p("m[-1]"), &doc).as_deref(), Some(&json!("minus")));
    }

    #[test]
    fn test_explicit_null_exists() {
        let doc = json!({"a": null});
        let r = resolve(&p("a"), &doc);
        assert!(r.exists);
        assert_eq!(r.value.as_deref(), Some(&Value::Null));
    }
}
