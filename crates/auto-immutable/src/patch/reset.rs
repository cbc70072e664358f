//! Reset-diff synthesis.
//!
//! Turns "restore these paths to their original values" into an ordinary
//! patch request built from REPLACE and DELETE tags.

use indexmap::IndexMap;
use serde_json::Value;

use auto_immutable_path::{is_ancestor, parse_property_path, resolve, PropertyPath};
use auto_immutable_util::is_empty_value;

use super::types::{Patch, PatchMap, Tag};

/// Synthesize the request restoring `paths` to their values in `original`.
///
/// - no paths: an empty request
/// - the whole-tree sentinel: REPLACE with `original`, or CLEAR when
///   `original` is empty
/// - a path present in `original`: REPLACE with its original value
/// - a path absent from `original`: DELETE of the first missing key at the
///   deepest existing ancestor, siblings sharing one DELETE list; when that
///   ancestor is a scalar, REPLACE of the ancestor instead
///
/// Paths below another requested path are covered by it and skipped.
///
/// # Example
///
/// ```
/// use auto_immutable::patch::{synthesize_reset, to_json};
/// use serde_json::json;
///
/// let original = json!({"a": 1, "b": {"x": 2}});
/// let patch = synthesize_reset(&original, &["a", "b.c"]);
/// assert_eq!(
///     to_json(&patch),
///     json!({"a": {"@@REPLACE": 1}, "b": {"@@DELETE": ["c"]}})
/// );
/// ```
pub fn synthesize_reset<S: AsRef<str>>(original: &Value, paths: &[S]) -> Patch {
    let mut parsed: Vec<PropertyPath> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = parse_property_path(path.as_ref());
        if !parsed.contains(&path) {
            parsed.push(path);
        }
    }
    if parsed.is_empty() {
        return Patch::empty();
    }
    if parsed.iter().any(PropertyPath::is_whole) {
        return if is_empty_value(original) {
            Patch::clear()
        } else {
            Patch::tag(Tag::Replace(original.clone()))
        };
    }

    let mut root = ResetNode::default();
    for path in parsed.iter().filter(|p| !parsed.iter().any(|other| is_ancestor(other, p))) {
        let reference = resolve(path, original);
        if reference.exists {
            let key = reference.key.clone().unwrap_or_default();
            if let Some(seq @ Value::Array(_)) = reference.container {
                if auto_immutable_path::parse_integer(&key).is_none() {
                    // a sequence's length resets with the whole sequence
                    reset_container(&mut root, &reference.trail, seq);
                    continue;
                }
            }
            let value = reference.value_or_null();
            root.at(&reference.trail).child(key).replace = Some(value);
            continue;
        }
        let Some(container) = reference.container else {
            continue;
        };
        let missing = reference.key.clone().unwrap_or_default();
        match container {
            Value::Array(_) => match auto_immutable_path::parse_integer(&missing) {
                // out of range counting from the end: nothing in the original to restore
                Some(index) if index < 0 => {}
                Some(index) => root.at(&reference.trail).deletes.push(Value::from(index)),
                None => root.at(&reference.trail).deletes.push(Value::String(missing)),
            },
            Value::Object(_) => {
                root.at(&reference.trail).deletes.push(Value::String(missing));
            }
            scalar => reset_container(&mut root, &reference.trail, scalar),
        }
        tracing::trace!(path = %path, "reset of a path missing from the original");
    }
    root.into_patch()
}

/// REPLACE the value found at `trail` with its original.
fn reset_container(root: &mut ResetNode, trail: &[String], original: &Value) {
    let node = match trail.split_last() {
        Some((last, parents)) => root.at(parents).child(last.clone()),
        None => root,
    };
    node.replace = Some(original.clone());
}

#[derive(Debug, Default)]
struct ResetNode {
    replace: Option<Value>,
    deletes: Vec<Value>,
    children: IndexMap<String, ResetNode>,
}

impl ResetNode {
    fn child(&mut self, key: String) -> &mut ResetNode {
        self.children.entry(key).or_default()
    }

    fn at(&mut self, trail: &[String]) -> &mut ResetNode {
        trail.iter().fold(self, |node, key| node.child(key.clone()))
    }

    fn into_patch(self) -> Patch {
        let mut node = PatchMap::new();
        if let Some(value) = self.replace {
            // a replaced node needs nothing below it
            return Patch::Map(node.with_tag(Tag::Replace(value)));
        }
        if !self.deletes.is_empty() {
            node.set_tag(Tag::Delete(Value::Array(self.deletes)));
        }
        for (key, child) in self.children {
            node.insert(key, child.into_patch());
        }
        Patch::Map(node)
    }
}
