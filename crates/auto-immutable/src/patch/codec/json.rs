//! JSON codec for patch requests.
//!
//! Tag commands travel as reserved object keys (`{"@@PUSH": [1, 2]}`). A
//! string equal to a tag name is shorthand for that tag with a `null`
//! argument, so `"@@CLEAR"` and `{"@@CLEAR": null}` are the same request.
//! Tag arguments are never decoded further: a tag name inside a REPLACE
//! payload is literal data.

use serde_json::{Map, Value};

use crate::patch::types::{Patch, PatchMap, Tag, TagName};

/// Decode a request from its JSON form.
pub fn from_json(value: Value) -> Patch {
    match value {
        Value::String(s) => match TagName::parse(&s) {
            Some(name) => Patch::tag(Tag::from_parts(name, Value::Null)),
            None => Patch::Value(Value::String(s)),
        },
        Value::Array(items) => Patch::Seq(items.into_iter().map(from_json).collect()),
        Value::Object(obj) => {
            let mut node = PatchMap::new();
            for (key, val) in obj {
                match TagName::parse(&key) {
                    Some(name) => node.set_tag(Tag::from_parts(name, val)),
                    None => {
                        node.insert(key, from_json(val));
                    }
                }
            }
            Patch::Map(node)
        }
        scalar => Patch::Value(scalar),
    }
}

/// Encode a request to its JSON form.
///
/// A computed SET has no JSON form and is written with a `null` argument.
pub fn to_json(patch: &Patch) -> Value {
    match patch {
        Patch::Value(v) => v.clone(),
        Patch::Seq(items) => Value::Array(items.iter().map(to_json).collect()),
        Patch::Map(node) => {
            let mut obj = Map::new();
            if let Some(tag) = node.tag() {
                obj.insert(tag.name().as_str().to_string(), tag.arg());
            }
            for (key, child) in node.entries() {
                obj.insert(key.clone(), to_json(child));
            }
            Value::Object(obj)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shorthand_tag_string() {
        let patch = from_json(json!("@@CLEAR"));
        let node = patch.as_map().unwrap();
        assert!(matches!(node.tag(), Some(Tag::Clear)));
        assert!(node.entries().is_empty());
    }

    #[test]
    fn plain_string_stays_literal() {
        assert!(matches!(from_json(json!("CLEAR")), Patch::Value(Value::String(_))));
    }

    #[test]
    fn tag_keys_are_split_from_fields() {
        let patch = from_json(json!({"@@PUSH": [1], "0": {"x": 1}}));
        let node = patch.as_map().unwrap();
        assert!(matches!(node.tag(), Some(Tag::Push(v)) if v == &json!([1])));
        assert_eq!(node.entries().len(), 1);
        assert!(node.get("0").is_some());
    }

    #[test]
    fn tag_arguments_are_not_decoded() {
        let patch = from_json(json!({"@@REPLACE": {"@@CLEAR": null}}));
        let node = patch.as_map().unwrap();
        assert!(matches!(node.tag(), Some(Tag::Replace(v)) if v == &json!({"@@CLEAR": null})));
    }

    #[test]
    fn several_tags_keep_the_highest_priority() {
        let patch = from_json(json!({"@@SPLICE": [0, 1], "@@MOVE": [0, 1], "@@SET": 4}));
        assert_eq!(patch.as_map().unwrap().tag().map(Tag::name), Some(TagName::Set));
    }

    #[test]
    fn json_roundtrip() {
        let doc = json!({"a": {"@@DELETE": [0, 2]}, "b": [1, "@@CLEAR"], "c": null});
        let encoded = to_json(&from_json(doc.clone()));
        assert_eq!(
            encoded,
            json!({"a": {"@@DELETE": [0, 2]}, "b": [1, {"@@CLEAR": null}], "c": null})
        );
    }

    #[test]
    fn computed_set_encodes_null() {
        let patch = Patch::tag(Tag::compute(|v| v));
        assert_eq!(to_json(&patch), json!({"@@SET": null}));
    }
}
