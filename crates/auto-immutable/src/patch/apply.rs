//! Patch apply logic.
//!
//! The request is walked against the live tree. At every node a tag, if
//! present, executes first; the node's remaining fields then merge into the
//! (possibly rewritten) value underneath.

use serde_json::{Map, Value};

use auto_immutable_path::parse_integer;

use super::slot::{Shape, Slot};
use super::tags;
use super::types::{ChangeStats, Patch, PatchError, PatchMap};

/// Apply `request` to `tree` in place.
///
/// Returns `true` when any leaf, sequence length or container content
/// changed. On error the tree keeps the changes made by the fields that
/// were processed before the failing tag.
///
/// # Example
///
/// ```
/// use auto_immutable::patch::{apply_patch, Patch};
/// use serde_json::json;
///
/// let mut tree = json!({"a": {"b": [1, 2, 3]}, "c": 1});
/// let request = Patch::from(json!({"a": {"b": {"@@DELETE": [0]}}, "c": 1}));
/// assert!(apply_patch(&mut tree, &request).unwrap());
/// assert_eq!(tree, json!({"a": {"b": [2, 3]}, "c": 1}));
///
/// // applying a request equal to the state changes nothing
/// assert!(!apply_patch(&mut tree, &Patch::from(json!({"c": 1}))).unwrap());
/// ```
pub fn apply_patch(tree: &mut Value, request: &Patch) -> Result<bool, PatchError> {
    let mut stats = ChangeStats::default();
    merge_request(tree, request, &mut stats)?;
    Ok(stats.changed)
}

/// Like [`apply_patch`], but records into caller-owned stats so that the
/// change flag survives an error.
pub fn merge_request(tree: &mut Value, request: &Patch, stats: &mut ChangeStats) -> Result<(), PatchError> {
    // the root is merged as slot 0 of a holder so that a root-level tag can
    // rewrite the whole tree like any other slot
    let mut holder = vec![std::mem::take(tree)];
    let result = merge_slot(&mut Slot::Index(&mut holder, 0), request, stats);
    *tree = holder.pop().unwrap_or_default();
    tracing::debug!(changed = stats.changed, ok = result.is_ok(), "merged patch request");
    result
}

fn merge_slot(slot: &mut Slot<'_>, patch: &Patch, stats: &mut ChangeStats) -> Result<(), PatchError> {
    if slot.get().is_some_and(|current| patch.eq_value(current)) {
        return Ok(());
    }
    match patch {
        Patch::Value(value) => {
            slot.set(value.clone());
            stats.changed = true;
        }
        Patch::Seq(items) => {
            if slot.shape() != Shape::Seq {
                slot.set(Value::Array(Vec::new()));
                stats.changed = true;
            }
            if let Some(Value::Array(arr)) = slot.get_mut() {
                merge_seq(arr, items, stats)?;
            }
        }
        Patch::Map(node) => {
            let tag_fired = match node.tag() {
                Some(tag) => {
                    tags::execute(tag, slot, stats)?;
                    true
                }
                None => false,
            };
            if node.entries().is_empty() {
                return Ok(());
            }
            match slot.shape() {
                Shape::Seq if node.is_indexed() => {
                    if let Some(Value::Array(arr)) = slot.get_mut() {
                        merge_indexed(arr, node, stats)?;
                    }
                }
                Shape::Map => {
                    if let Some(Value::Object(map)) = slot.get_mut() {
                        merge_map(map, node, stats)?;
                    }
                }
                _ if tag_fired => {}
                _ => {
                    slot.set(Value::Object(Map::new()));
                    stats.changed = true;
                    if let Some(Value::Object(map)) = slot.get_mut() {
                        merge_map(map, node, stats)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn merge_map(map: &mut Map<String, Value>, node: &PatchMap, stats: &mut ChangeStats) -> Result<(), PatchError> {
    for (key, child) in node.entries() {
        merge_slot(&mut Slot::Field(&mut *map, key), child, stats)?;
    }
    Ok(())
}

/// The target takes the request's length, then merges index by index.
fn merge_seq(arr: &mut Vec<Value>, items: &[Patch], stats: &mut ChangeStats) -> Result<(), PatchError> {
    if arr.len() != items.len() {
        arr.resize(items.len(), Value::Null);
        stats.changed = true;
    }
    for (i, item) in items.iter().enumerate() {
        merge_slot(&mut Slot::Index(&mut *arr, i), item, stats)?;
    }
    Ok(())
}

/// Merges a map whose keys are (possibly negative) indices into a sequence.
/// Negative keys resolve against the length the sequence has now; keys that
/// stay negative are skipped.
fn merge_indexed(arr: &mut Vec<Value>, node: &PatchMap, stats: &mut ChangeStats) -> Result<(), PatchError> {
    let len = arr.len() as i64;
    let targets: Vec<(usize, &Patch)> = node
        .entries()
        .iter()
        .filter_map(|(key, child)| {
            let index = parse_integer(key)?;
            let index = if index < 0 { len + index } else { index };
            (index >= 0).then_some((index as usize, child))
        })
        .collect();
    if let Some(max) = targets.iter().map(|(i, _)| *i).max() {
        if max >= arr.len() {
            grow(arr, max)?;
            stats.changed = true;
        }
    }
    for (index, child) in targets {
        merge_slot(&mut Slot::Index(&mut *arr, index), child, stats)?;
    }
    Ok(())
}

/// Pads `arr` with `null`s so that `index` is in bounds, failing instead of
/// aborting when the allocation cannot be made.
fn grow(arr: &mut Vec<Value>, index: usize) -> Result<(), PatchError> {
    let overflow = || PatchError::SequenceOverflow { index };
    let len = index.checked_add(1).ok_or_else(overflow)?;
    arr.try_reserve(len - arr.len()).map_err(|_| overflow())?;
    arr.resize(len, Value::Null);
    Ok(())
}
