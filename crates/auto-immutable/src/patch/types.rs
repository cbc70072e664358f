//! Core types for patch requests.
//!
//! A [`Patch`] mirrors the shape of the state tree it is applied to. Any map
//! node may carry one [`Tag`] command next to (or instead of) literal fields.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use auto_immutable_util::deep_equal;

// ── Tag names ─────────────────────────────────────────────────────────────

pub const CLEAR_TAG: &str = "@@CLEAR";
pub const DELETE_TAG: &str = "@@DELETE";
pub const MOVE_TAG: &str = "@@MOVE";
pub const PUSH_TAG: &str = "@@PUSH";
pub const REPLACE_TAG: &str = "@@REPLACE";
pub const SET_TAG: &str = "@@SET";
pub const SPLICE_TAG: &str = "@@SPLICE";

/// The seven tag commands.
///
/// Declaration order is execution priority: when several tags are attached
/// to one node only the highest-priority one is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagName {
    Clear,
    Delete,
    Replace,
    Set,
    Move,
    Push,
    Splice,
}

impl TagName {
    pub const ALL: [TagName; 7] = [
        TagName::Clear,
        TagName::Delete,
        TagName::Replace,
        TagName::Set,
        TagName::Move,
        TagName::Push,
        TagName::Splice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagName::Clear => CLEAR_TAG,
            TagName::Delete => DELETE_TAG,
            TagName::Replace => REPLACE_TAG,
            TagName::Set => SET_TAG,
            TagName::Move => MOVE_TAG,
            TagName::Push => PUSH_TAG,
            TagName::Splice => SPLICE_TAG,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        TagName::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tags ──────────────────────────────────────────────────────────────────

/// Function computing a SET payload from a clone of the current value.
pub type ComputeFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Argument of a SET command.
#[derive(Clone)]
pub enum SetArg {
    Value(Value),
    Compute(ComputeFn),
}

impl fmt::Debug for SetArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetArg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            SetArg::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// A tag command with its argument.
///
/// Arguments are kept as received and validated when the command executes,
/// so a malformed argument only fails the request that carries it.
#[derive(Debug, Clone)]
pub enum Tag {
    Clear,
    /// Keys (maps) or indices (sequences) to remove.
    Delete(Value),
    /// `[from, to, count = 1]`
    Move(Value),
    /// Items to append.
    Push(Value),
    Replace(Value),
    Set(SetArg),
    /// `[start, delete_count, ...items]`
    Splice(Value),
}

impl Tag {
    pub fn name(&self) -> TagName {
        match self {
            Tag::Clear => TagName::Clear,
            Tag::Delete(_) => TagName::Delete,
            Tag::Move(_) => TagName::Move,
            Tag::Push(_) => TagName::Push,
            Tag::Replace(_) => TagName::Replace,
            Tag::Set(_) => TagName::Set,
            Tag::Splice(_) => TagName::Splice,
        }
    }

    /// Builds a tag from its name and raw argument. CLEAR ignores the argument.
    pub fn from_parts(name: TagName, arg: Value) -> Self {
        match name {
            TagName::Clear => Tag::Clear,
            TagName::Delete => Tag::Delete(arg),
            TagName::Move => Tag::Move(arg),
            TagName::Push => Tag::Push(arg),
            TagName::Replace => Tag::Replace(arg),
            TagName::Set => Tag::Set(SetArg::Value(arg)),
            TagName::Splice => Tag::Splice(arg),
        }
    }

    /// SET with a computed value.
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Tag::Set(SetArg::Compute(Arc::new(f)))
    }

    /// The argument as it would be serialized. A computed SET has none.
    pub fn arg(&self) -> Value {
        match self {
            Tag::Clear => Value::Null,
            Tag::Delete(v) | Tag::Move(v) | Tag::Push(v) | Tag::Replace(v) | Tag::Splice(v) => {
                v.clone()
            }
            Tag::Set(SetArg::Value(v)) => v.clone(),
            Tag::Set(SetArg::Compute(_)) => Value::Null,
        }
    }
}

// ── Patch tree ────────────────────────────────────────────────────────────

/// A map node of a patch: literal fields plus at most one tag.
#[derive(Debug, Clone, Default)]
pub struct PatchMap {
    tag: Option<Tag>,
    entries: IndexMap<String, Patch>,
}

impl PatchMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    pub fn entries(&self) -> &IndexMap<String, Patch> {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Patch> {
        self.entries.get(key)
    }

    /// `true` when the node has neither a tag nor fields.
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.entries.is_empty()
    }

    /// Attaches `tag`, keeping whichever of the existing and the new tag has
    /// the higher priority.
    pub fn set_tag(&mut self, tag: Tag) {
        match self.tag.as_ref().map(Tag::name) {
            Some(current) if current <= tag.name() => {
                tracing::debug!(kept = %current, dropped = %tag.name(), "ignoring lower-priority tag");
            }
            Some(current) => {
                tracing::debug!(kept = %tag.name(), dropped = %current, "ignoring lower-priority tag");
                self.tag = Some(tag);
            }
            None => self.tag = Some(tag),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, patch: impl Into<Patch>) -> Option<Patch> {
        self.entries.insert(key.into(), patch.into())
    }

    /// Builder form of [`PatchMap::set_tag`].
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.set_tag(tag);
        self
    }

    /// Builder form of [`PatchMap::insert`].
    pub fn with(mut self, key: impl Into<String>, patch: impl Into<Patch>) -> Self {
        self.insert(key, patch);
        self
    }

    /// `true` when every field key is an integer literal, i.e. the node can
    /// address the slots of a sequence.
    pub(crate) fn is_indexed(&self) -> bool {
        self.entries
            .keys()
            .all(|k| auto_immutable_path::parse_integer(k).is_some())
    }
}

/// A patch request.
#[derive(Debug, Clone)]
pub enum Patch {
    /// A literal leaf.
    Value(Value),
    /// A sequence patched index by index; its length becomes the target's length.
    Seq(Vec<Patch>),
    Map(PatchMap),
}

impl Patch {
    /// A patch that changes nothing.
    pub fn empty() -> Self {
        Patch::Map(PatchMap::new())
    }

    /// A node carrying only `tag`.
    pub fn tag(tag: Tag) -> Self {
        Patch::Map(PatchMap::new().with_tag(tag))
    }

    /// The zero-argument CLEAR shorthand.
    pub fn clear() -> Self {
        Patch::tag(Tag::Clear)
    }

    pub fn as_map(&self) -> Option<&PatchMap> {
        match self {
            Patch::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Patch::Map(m) if m.is_empty())
    }

    /// Deep equality against a tree value. A node carrying a tag never
    /// equals a value.
    pub fn eq_value(&self, value: &Value) -> bool {
        match (self, value) {
            (Patch::Value(v), value) => deep_equal(v, value),
            (Patch::Seq(items), Value::Array(arr)) => {
                items.len() == arr.len() && items.iter().zip(arr).all(|(p, v)| p.eq_value(v))
            }
            (Patch::Map(m), Value::Object(obj)) => {
                m.tag.is_none()
                    && m.entries.len() == obj.len()
                    && m.entries
                        .iter()
                        .all(|(k, p)| obj.get(k).is_some_and(|v| p.eq_value(v)))
            }
            _ => false,
        }
    }

    /// Check whether applying this patch can affect the value at `path`.
    ///
    /// `tree` is the state the patch was applied to, read after the merge.
    /// A path is touched when the walk along it meets a tag, a literal, a
    /// sequence patch that does not reach the addressed index, or arrives at
    /// a patch node. Index keys are compared by the position they address in
    /// the current sequence. A map node that replaced a sequence or a leaf
    /// touches everything that used to lie below it.
    pub fn touches(&self, path: &auto_immutable_path::PropertyPath, tree: &Value) -> bool {
        let mut node = self;
        let mut current = Some(tree);
        for token in path.tokens() {
            let next = match current {
                Some(Value::Object(obj)) => obj.get(token.as_str()),
                Some(Value::Array(arr)) => token.resolve_index(arr.len()).and_then(|i| arr.get(i)),
                _ => None,
            };
            node = match node {
                Patch::Value(_) => return true,
                Patch::Seq(items) => match token.resolve_index(items.len()) {
                    Some(i) => &items[i],
                    None => return true,
                },
                Patch::Map(m) => {
                    if m.tag.is_some() {
                        return true;
                    }
                    match current {
                        Some(Value::Object(obj)) => match m.entries.get(token.as_str()) {
                            Some(child) => child,
                            // fields without a tag never remove keys, so a
                            // missing key means the merge rewrote this node
                            None => return !obj.contains_key(token.as_str()),
                        },
                        Some(Value::Array(arr)) if m.is_indexed() => match m.entry_at(token, arr.len()) {
                            IndexedEntry::Hit(child) => child,
                            IndexedEntry::Ambiguous => return true,
                            IndexedEntry::Miss => return false,
                        },
                        _ => return true,
                    }
                }
            };
            current = next;
        }
        true
    }
}

/// Outcome of looking up a path step among the keys of an indexed node.
enum IndexedEntry<'a> {
    Hit(&'a Patch),
    /// A negative key was resolved against the length before the merge,
    /// which may differ from `len` when the same node grew the sequence.
    Ambiguous,
    Miss,
}

impl PatchMap {
    fn entry_at(&self, token: &auto_immutable_path::Token, len: usize) -> IndexedEntry<'_> {
        let Some(target) = token.resolve_index(len) else {
            return IndexedEntry::Miss;
        };
        let mut ambiguous = false;
        for (key, child) in &self.entries {
            let Some(index) = auto_immutable_path::parse_integer(key) else {
                continue;
            };
            if index < 0 {
                let grew = self
                    .entries
                    .keys()
                    .filter_map(|k| auto_immutable_path::parse_integer(k))
                    .any(|i| i >= 0 && i as usize + 1 == len);
                if len as i64 + index == target as i64 && !grew {
                    return IndexedEntry::Hit(child);
                }
                ambiguous |= grew;
            } else if index as usize == target {
                return IndexedEntry::Hit(child);
            }
        }
        if ambiguous {
            IndexedEntry::Ambiguous
        } else {
            IndexedEntry::Miss
        }
    }
}

impl From<PatchMap> for Patch {
    fn from(map: PatchMap) -> Self {
        Patch::Map(map)
    }
}

impl From<Tag> for Patch {
    fn from(tag: Tag) -> Self {
        Patch::tag(tag)
    }
}

impl From<Value> for Patch {
    fn from(value: Value) -> Self {
        super::codec::json::from_json(value)
    }
}

// ── Change tracking ───────────────────────────────────────────────────────

/// Records whether a merge changed anything. Created per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub changed: bool,
}

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("{tag} expects {expected}, got {found}")]
    InvalidArgument {
        tag: TagName,
        expected: &'static str,
        found: &'static str,
    },
    #[error("cannot grow a sequence to reach index {index}")]
    SequenceOverflow { index: usize },
}

impl PatchError {
    pub(crate) fn invalid(tag: TagName, expected: &'static str, found: &Value) -> Self {
        PatchError::InvalidArgument {
            tag,
            expected,
            found: kind_of(found),
        }
    }
}

/// Short type name of a value, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
