//! auto-immutable: a state tree updated through declarative patch requests,
//! with per-path snapshot caching for observers.
//!
//! - [`patch`]: patch requests, tag commands, the merge engine and reset
//!   synthesis
//! - [`cache`]: atoms, accessors and the cache that keeps client views
//!   current
//! - [`Store`]: the façade tying a tree to its cache, listeners and original
//!   snapshot

pub mod cache;
pub mod options;
pub mod patch;
pub mod storage;
pub mod store;

pub use cache::{lookup, Cache, Snapshot};
pub use options::{CacheOptions, StoreOptions};
pub use patch::{apply_patch, synthesize_reset, ChangeStats, Patch, PatchError, PatchMap, Tag, TagName};
pub use storage::{MemoryStorage, Storage};
pub use store::{ClientId, ListenerId, Store, StoreError};

pub use auto_immutable_path::{parse_property_path, PropertyPath, FULL_STATE_SELECTOR};
