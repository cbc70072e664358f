//! A writable position inside a container: a map field or a sequence slot.

use serde_json::{Map, Value};

pub(crate) enum Slot<'a> {
    Field(&'a mut Map<String, Value>, &'a str),
    Index(&'a mut Vec<Value>, usize),
}

impl<'a> Slot<'a> {
    pub(crate) fn get(&self) -> Option<&Value> {
        match self {
            Slot::Field(map, key) => map.get(*key),
            Slot::Index(arr, idx) => arr.get(*idx),
        }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut Value> {
        match self {
            Slot::Field(map, key) => map.get_mut(*key),
            Slot::Index(arr, idx) => arr.get_mut(*idx),
        }
    }

    /// Writes `value`, growing a sequence with `null`s when the slot lies
    /// past its end.
    pub(crate) fn set(&mut self, value: Value) {
        match self {
            Slot::Field(map, key) => {
                map.insert((*key).to_string(), value);
            }
            Slot::Index(arr, idx) => {
                if *idx >= arr.len() {
                    arr.resize(*idx + 1, Value::Null);
                }
                arr[*idx] = value;
            }
        }
    }

    pub(crate) fn shape(&self) -> Shape {
        match self.get() {
            Some(Value::Array(_)) => Shape::Seq,
            Some(Value::Object(_)) => Shape::Map,
            Some(_) => Shape::Leaf,
            None => Shape::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Absent,
    Leaf,
    Seq,
    Map,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_past_end_pads_with_null() {
        let mut arr = vec![json!(1)];
        Slot::Index(&mut arr, 3).set(json!(4));
        assert_eq!(arr, vec![json!(1), json!(null), json!(null), json!(4)]);
    }

    #[test]
    fn field_shape() {
        let mut map = Map::new();
        map.insert("a".into(), json!([1]));
        assert_eq!(Slot::Field(&mut map, "a").shape(), Shape::Seq);
        assert_eq!(Slot::Field(&mut map, "b").shape(), Shape::Absent);
    }
}
