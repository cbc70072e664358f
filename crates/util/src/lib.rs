//! auto-immutable-util - value helpers shared by the auto-immutable crates.
//!
//! Trees are plain `serde_json::Value`s. Equality follows the numeric model of
//! the patch language, where `1` and `1.0` denote the same number.

pub mod is_empty;
pub mod json_equal;

pub use is_empty::{is_empty_container, is_empty_value};
pub use json_equal::{deep_equal, number_equal};
