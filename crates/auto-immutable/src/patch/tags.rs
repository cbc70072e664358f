//! Tag command handlers.
//!
//! Each handler works on one slot of the tree. Handlers never fail on a
//! target of the wrong shape or an index out of range; they leave the tree
//! alone. Only a malformed argument is an error.

use std::collections::HashSet;

use serde_json::Value;

use auto_immutable_path::parse_integer;
use auto_immutable_util::deep_equal;

use super::slot::Slot;
use super::types::{ChangeStats, PatchError, SetArg, Tag, TagName};

/// Execute `tag` against `slot`.
pub(crate) fn execute(tag: &Tag, slot: &mut Slot<'_>, stats: &mut ChangeStats) -> Result<(), PatchError> {
    tracing::trace!(tag = %tag.name(), "executing tag");
    match tag {
        Tag::Clear => clear(slot, stats),
        Tag::Delete(arg) => delete(slot, arg, stats)?,
        Tag::Move(arg) => move_items(slot, arg, stats)?,
        Tag::Push(arg) => push(slot, arg, stats)?,
        Tag::Replace(arg) => replace(slot, arg, stats),
        Tag::Set(SetArg::Value(arg)) => replace(slot, arg, stats),
        Tag::Set(SetArg::Compute(f)) => {
            let current = slot.get().cloned().unwrap_or(Value::Null);
            replace(slot, &f(current), stats);
        }
        Tag::Splice(arg) => splice(slot, arg, stats)?,
    }
    Ok(())
}

fn clear(slot: &mut Slot<'_>, stats: &mut ChangeStats) {
    let Some(value) = slot.get_mut() else {
        return;
    };
    match value {
        Value::String(s) if !s.is_empty() => s.clear(),
        Value::Array(arr) if !arr.is_empty() => arr.clear(),
        Value::Object(map) if !map.is_empty() => map.clear(),
        Value::Bool(_) | Value::Number(_) => *value = Value::Null,
        _ => return,
    }
    stats.changed = true;
}

/// Key text of a DELETE argument entry: strings as-is, integral numbers in
/// decimal.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => integer_of(value).map(|i| i.to_string()).or_else(|| Some(n.to_string())),
        _ => None,
    }
}

/// Integer value of a number or an integer string.
fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15).map(|f| f as i64)),
        Value::String(s) => parse_integer(s),
        _ => None,
    }
}

/// Resolves a possibly negative index against `len`; `None` when outside
/// `[0, len)`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { len as i64 + index } else { index };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

fn delete(slot: &mut Slot<'_>, arg: &Value, stats: &mut ChangeStats) -> Result<(), PatchError> {
    let Value::Array(keys) = arg else {
        return Err(PatchError::invalid(TagName::Delete, "an array of keys", arg));
    };
    match slot.get_mut() {
        Some(Value::Object(map)) => {
            let mut seen = HashSet::with_capacity(keys.len());
            for key in keys.iter().filter_map(key_of) {
                if seen.insert(key.clone()) && map.shift_remove(&key).is_some() {
                    stats.changed = true;
                }
            }
        }
        Some(Value::Array(arr)) => {
            let len = arr.len();
            let doomed: HashSet<usize> = keys
                .iter()
                .filter_map(integer_of)
                .filter_map(|i| resolve_index(i, len))
                .collect();
            if doomed.is_empty() {
                return Ok(());
            }
            let survivors = std::mem::take(arr)
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !doomed.contains(i))
                .map(|(_, v)| v)
                .collect();
            *arr = survivors;
            stats.changed = true;
        }
        _ => {}
    }
    Ok(())
}

fn move_items(slot: &mut Slot<'_>, arg: &Value, stats: &mut ChangeStats) -> Result<(), PatchError> {
    let Value::Array(args) = arg else {
        return Err(PatchError::invalid(TagName::Move, "an array [from, to, count?]", arg));
    };
    let from = positional(TagName::Move, args.first())?;
    let to = positional(TagName::Move, args.get(1))?;
    let count = match args.get(2) {
        None => 1,
        Some(v) => match integer_of_number(v) {
            Some(c) if c > 0 => c as usize,
            _ => return Ok(()),
        },
    };
    let Some(Value::Array(arr)) = slot.get_mut() else {
        return Ok(());
    };
    let len = arr.len();
    let (Some(from), Some(to)) = (resolve_index(from, len), resolve_index(to, len)) else {
        return Ok(());
    };
    if from == to {
        return Ok(());
    }
    let count = count.min(len - from);
    // insertion point once the moved run is out of the array
    let to = to.min(len - count);
    if to == from {
        return Ok(());
    }
    let moved: Vec<Value> = arr.drain(from..from + count).collect();
    arr.splice(to..to, moved);
    stats.changed = true;
    Ok(())
}

fn push(slot: &mut Slot<'_>, arg: &Value, stats: &mut ChangeStats) -> Result<(), PatchError> {
    let Value::Array(items) = arg else {
        return Err(PatchError::invalid(TagName::Push, "an array of items", arg));
    };
    if items.is_empty() {
        return Ok(());
    }
    if let Some(Value::Array(arr)) = slot.get_mut() {
        arr.extend(items.iter().cloned());
        stats.changed = true;
    }
    Ok(())
}

fn replace(slot: &mut Slot<'_>, arg: &Value, stats: &mut ChangeStats) {
    if slot.get().is_some_and(|current| deep_equal(current, arg)) {
        return;
    }
    slot.set(arg.clone());
    stats.changed = true;
}

fn splice(slot: &mut Slot<'_>, arg: &Value, stats: &mut ChangeStats) -> Result<(), PatchError> {
    let Value::Array(args) = arg else {
        return Err(PatchError::invalid(TagName::Splice, "an array [start, delete_count, ...items]", arg));
    };
    if args.len() < 2 {
        return Err(PatchError::invalid(TagName::Splice, "at least [start, delete_count]", arg));
    }
    let start = positional(TagName::Splice, args.first())?;
    let delete_count = positional(TagName::Splice, args.get(1))?;
    let mut items = &args[2..];
    if delete_count < 1 && items.is_empty() {
        return Ok(());
    }
    let Some(Value::Array(arr)) = slot.get_mut() else {
        return Ok(());
    };
    let len = arr.len();
    let mut start = if start < 0 {
        (len as i64 + start).max(0) as usize
    } else {
        (start as usize).min(len)
    };
    let mut delete_count = (delete_count.max(0) as usize).min(len - start);

    // leading items already in place need neither removal nor insertion
    while delete_count > 0 && !items.is_empty() && deep_equal(&arr[start], &items[0]) {
        start += 1;
        delete_count -= 1;
        items = &items[1..];
    }
    if delete_count == 0 && items.is_empty() {
        return Ok(());
    }
    arr.splice(start..start + delete_count, items.iter().cloned());
    stats.changed = true;
    Ok(())
}

/// A required integer argument of MOVE or SPLICE.
fn positional(tag: TagName, value: Option<&Value>) -> Result<i64, PatchError> {
    match value {
        Some(v) => integer_of_number(v).ok_or_else(|| PatchError::invalid(tag, "integer positions", v)),
        None => Err(PatchError::invalid(tag, "integer positions", &Value::Null)),
    }
}

fn integer_of_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => integer_of(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Runs `tag` against `root["t"]`, returning the new tree and change flag.
    fn run(root: Value, tag: Tag) -> Result<(Value, bool), PatchError> {
        let Value::Object(mut map) = root else {
            panic!("test root must be an object");
        };
        let mut stats = ChangeStats::default();
        execute(&tag, &mut Slot::Field(&mut map, "t"), &mut stats)?;
        Ok((Value::Object(map), stats.changed))
    }

    fn ok(root: Value, tag: Tag) -> (Value, bool) {
        run(root, tag).expect("tag should apply")
    }

    #[test]
    fn clear_containers_and_scalars() {
        assert_eq!(ok(json!({"t": "abc"}), Tag::Clear), (json!({"t": ""}), true));
        assert_eq!(ok(json!({"t": [1, 2]}), Tag::Clear), (json!({"t": []}), true));
        assert_eq!(ok(json!({"t": {"a": 1}}), Tag::Clear), (json!({"t": {}}), true));
        assert_eq!(ok(json!({"t": 42}), Tag::Clear), (json!({"t": null}), true));
        assert_eq!(ok(json!({"t": true}), Tag::Clear), (json!({"t": null}), true));
    }

    #[test]
    fn clear_at_default_is_noop() {
        for v in [json!(""), json!([]), json!({}), json!(null)] {
            assert_eq!(ok(json!({"t": v.clone()}), Tag::Clear), (json!({"t": v}), false));
        }
        assert_eq!(ok(json!({}), Tag::Clear), (json!({}), false));
    }

    #[test]
    fn delete_from_map() {
        let (tree, changed) = ok(json!({"t": {"a": 1, "b": 2, "c": 3}}), Tag::Delete(json!(["a", "c", "a", "z"])));
        assert_eq!(tree, json!({"t": {"b": 2}}));
        assert!(changed);
    }

    #[test]
    fn delete_numeric_key_from_map() {
        let (tree, _) = ok(json!({"t": {"1": "x", "2": "y"}}), Tag::Delete(json!([1])));
        assert_eq!(tree, json!({"t": {"2": "y"}}));
    }

    #[test]
    fn delete_indices() {
        let (tree, changed) = ok(json!({"t": ["a", "b", "c", "d"]}), Tag::Delete(json!([0, 2])));
        assert_eq!(tree, json!({"t": ["b", "d"]}));
        assert!(changed);

        let (tree, _) = ok(json!({"t": ["a", "b", "c", "d"]}), Tag::Delete(json!([-4, -2])));
        assert_eq!(tree, json!({"t": ["b", "d"]}));

        let (tree, _) = ok(json!({"t": ["a", "b", "c", "d"]}), Tag::Delete(json!([2, "0", -2])));
        assert_eq!(tree, json!({"t": ["b", "d"]}));
    }

    #[test]
    fn delete_unmatched_is_noop() {
        assert_eq!(
            ok(json!({"t": [1, 2]}), Tag::Delete(json!([5, -3]))),
            (json!({"t": [1, 2]}), false)
        );
        assert_eq!(ok(json!({"t": 5}), Tag::Delete(json!([0]))), (json!({"t": 5}), false));
    }

    #[test]
    fn delete_requires_array() {
        let err = run(json!({"t": [1]}), Tag::Delete(json!(0))).unwrap_err();
        assert_eq!(
            err,
            PatchError::InvalidArgument {
                tag: TagName::Delete,
                expected: "an array of keys",
                found: "number"
            }
        );
    }

    #[test]
    fn move_single_item() {
        let (tree, changed) = ok(json!({"t": ["a", "b", "c", "d", "e"]}), Tag::Move(json!([0, 2])));
        assert_eq!(tree, json!({"t": ["b", "c", "a", "d", "e"]}));
        assert!(changed);
    }

    #[test]
    fn move_run_with_negative_indices() {
        let (tree, _) = ok(json!({"t": ["a", "b", "c", "d", "e"]}), Tag::Move(json!([-2, 0, 2])));
        assert_eq!(tree, json!({"t": ["d", "e", "a", "b", "c"]}));
    }

    #[test]
    fn move_truncates_count() {
        let (tree, changed) = ok(json!({"t": ["a", "b", "c", "d", "e"]}), Tag::Move(json!([3, 0, 5])));
        assert_eq!(tree, json!({"t": ["d", "e", "a", "b", "c"]}));
        assert!(changed);

        // the truncated run already ends the array
        assert_eq!(
            ok(json!({"t": [1, 2, 3, 4, 5]}), Tag::Move(json!([2, 4, 3]))),
            (json!({"t": [1, 2, 3, 4, 5]}), false)
        );
    }

    #[test]
    fn move_noops() {
        let tree = json!({"t": [1, 2, 3]});
        for args in [json!([1, 1]), json!([3, 0]), json!([0, -4]), json!([0, 1, 0]), json!([0, 1, 1.5])] {
            assert_eq!(ok(tree.clone(), Tag::Move(args)), (tree.clone(), false));
        }
        assert_eq!(ok(json!({"t": []}), Tag::Move(json!([0, 0]))), (json!({"t": []}), false));
        assert_eq!(ok(json!({"t": "str"}), Tag::Move(json!([0, 1]))), (json!({"t": "str"}), false));
    }

    #[test]
    fn move_rejects_bad_arguments() {
        assert!(run(json!({"t": [1, 2]}), Tag::Move(json!("0,1"))).is_err());
        assert!(run(json!({"t": [1, 2]}), Tag::Move(json!(["0", 1]))).is_err());
        assert!(run(json!({"t": [1, 2]}), Tag::Move(json!([0]))).is_err());
    }

    #[test]
    fn push_appends() {
        let (tree, changed) = ok(json!({"t": [1]}), Tag::Push(json!([2, {"x": 3}])));
        assert_eq!(tree, json!({"t": [1, 2, {"x": 3}]}));
        assert!(changed);
        assert_eq!(ok(json!({"t": [1]}), Tag::Push(json!([]))), (json!({"t": [1]}), false));
        assert_eq!(ok(json!({"t": {}}), Tag::Push(json!([1]))), (json!({"t": {}}), false));
        assert!(run(json!({"t": [1]}), Tag::Push(json!({"0": 1}))).is_err());
    }

    #[test]
    fn replace_values() {
        assert_eq!(ok(json!({"t": {"a": 1, "b": 2}}), Tag::Replace(json!({"c": 3}))), (json!({"t": {"c": 3}}), true));
        assert_eq!(ok(json!({"t": [1, 2, 3]}), Tag::Replace(json!([9]))), (json!({"t": [9]}), true));
        assert_eq!(ok(json!({}), Tag::Replace(json!(1))), (json!({"t": 1}), true));
        assert_eq!(ok(json!({"t": [1.0]}), Tag::Replace(json!([1]))), (json!({"t": [1.0]}), false));
    }

    #[test]
    fn set_literal_and_computed() {
        assert_eq!(
            ok(json!({"t": 1}), Tag::from_parts(TagName::Set, json!(2))),
            (json!({"t": 2}), true)
        );
        let inc = Tag::compute(|v| json!(v.as_i64().unwrap_or(0) + 1));
        assert_eq!(ok(json!({"t": 1}), inc.clone()), (json!({"t": 2}), true));
        assert_eq!(ok(json!({}), inc), (json!({"t": 1}), true));
        let same = Tag::compute(|v| v);
        assert_eq!(ok(json!({"t": [1]}), same), (json!({"t": [1]}), false));
    }

    #[test]
    fn splice_matches_native_semantics() {
        let nine = json!({"t": [1, 2, 3, 4, 5, 6, 7, 8, 9]});
        let (tree, changed) = ok(nine.clone(), Tag::Splice(json!([4, 4, 33, 88])));
        assert_eq!(tree, json!({"t": [1, 2, 3, 4, 33, 88, 9]}));
        assert!(changed);

        let (tree, _) = ok(nine.clone(), Tag::Splice(json!([-3, 1])));
        assert_eq!(tree, json!({"t": [1, 2, 3, 4, 5, 6, 8, 9]}));

        let (tree, _) = ok(nine.clone(), Tag::Splice(json!([-20, 2, 0])));
        assert_eq!(tree, json!({"t": [0, 3, 4, 5, 6, 7, 8, 9]}));

        let (tree, _) = ok(nine.clone(), Tag::Splice(json!([20, 5, 10])));
        assert_eq!(tree, json!({"t": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]}));

        let (tree, _) = ok(nine, Tag::Splice(json!([1, 0, "x"])));
        assert_eq!(tree, json!({"t": [1, "x", 2, 3, 4, 5, 6, 7, 8, 9]}));
    }

    #[test]
    fn splice_skips_items_already_in_place() {
        let (tree, changed) = ok(json!({"t": [1, 2, 3, 4]}), Tag::Splice(json!([1, 2, 2, 3])));
        assert_eq!(tree, json!({"t": [1, 2, 3, 4]}));
        assert!(!changed);

        let (tree, changed) = ok(json!({"t": [1, 2, 3, 4]}), Tag::Splice(json!([1, 2, 2, 9])));
        assert_eq!(tree, json!({"t": [1, 2, 9, 4]}));
        assert!(changed);
    }

    #[test]
    fn splice_noops_and_errors() {
        let tree = json!({"t": [1, 2]});
        assert_eq!(ok(tree.clone(), Tag::Splice(json!([0, 0]))), (tree.clone(), false));
        assert_eq!(ok(json!({"t": {}}), Tag::Splice(json!([0, 1]))), (json!({"t": {}}), false));
        assert!(run(tree.clone(), Tag::Splice(json!([0]))).is_err());
        assert!(run(tree.clone(), Tag::Splice(json!([0.5, 1]))).is_err());
        assert!(run(tree, Tag::Splice(json!(null))).is_err());
    }

    #[test]
    fn helper_key_of() {
        assert_eq!(key_of(&json!("a")), Some("a".to_string()));
        assert_eq!(key_of(&json!(3)), Some("3".to_string()));
        assert_eq!(key_of(&json!(null)), None);
    }
}
