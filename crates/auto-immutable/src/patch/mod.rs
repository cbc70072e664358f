//! Patch requests: types, the JSON codec, the merge engine and reset-diff
//! synthesis.

pub mod apply;
pub mod codec;
pub mod reset;
pub(crate) mod slot;
pub(crate) mod tags;
pub mod types;

pub use apply::{apply_patch, merge_request};
pub use codec::json::{from_json, to_json};
pub use reset::synthesize_reset;
pub use types::{
    kind_of, ChangeStats, ComputeFn, Patch, PatchError, PatchMap, SetArg, Tag, TagName, CLEAR_TAG, DELETE_TAG,
    MOVE_TAG, PUSH_TAG, REPLACE_TAG, SET_TAG, SPLICE_TAG,
};
