#![allow(dead_code)]

use auto_immutable::Patch;
use serde_json::{json, Value};

/// A small registry-like document used across the workflow tests.
pub fn source_tree() -> Value {
    json!({
        "a": {
            "b": [
                {"x": 7, "y": 8, "z": 9},
                {"x": 17, "y": 18, "z": 19}
            ]
        },
        "j": 10,
        "profile": {
            "name": {"first": "Ada", "last": "Lovelace"},
            "tags": ["math", "engines"]
        }
    })
}

pub fn patch(value: Value) -> Patch {
    Patch::from(value)
}
