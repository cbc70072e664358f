//! JSON equality utilities.
//!
//! Provides deep equality comparison for trees and patch payloads.

mod deep_equal;

pub use deep_equal::{deep_equal, number_equal};
