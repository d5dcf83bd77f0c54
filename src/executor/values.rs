use std::{cell::RefCell, cmp::Ordering, fmt::Display, rc::Rc};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{
    constants::MAX_COPY_DEPTH,
    utils::formatting::{fmt_collection, fmt_entries},
    ExecutionError,
};

/// A runtime value of the traced language. Lists and maps have reference
/// semantics: cloning a `Value` clones the handle, not the contents, so
/// aliasing and in-place mutation behave the way a dynamic scripting
/// language expects. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Boolean(bool),
    String(String),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<Vec<(String, Value)>>>),
}

impl Value {
    pub fn new_list<I: IntoIterator<Item = T>, T: Into<Value>>(values: I) -> Value {
        Value::List(Rc::new(RefCell::new(
            values.into_iter().map(|value| value.into()).collect(),
        )))
    }

    pub fn new_map<I: IntoIterator<Item = (String, Value)>>(entries: I) -> Value {
        Value::Map(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Snapshot copy: recursively clones lists and maps so later mutation of
    /// the source is not visible through the copy. Copying stops at a fixed
    /// depth and shares the remaining substructure instead, so cyclic values
    /// degrade to reference copies rather than hanging.
    pub fn deep_copy(&self) -> Value {
        self.deep_copy_with_depth(0)
    }

    fn deep_copy_with_depth(&self, depth: usize) -> Value {
        if depth >= MAX_COPY_DEPTH {
            return self.clone();
        }

        match self {
            Value::List(values) => Value::List(Rc::new(RefCell::new(
                values
                    .borrow()
                    .iter()
                    .map(|value| value.deep_copy_with_depth(depth + 1))
                    .collect(),
            ))),
            Value::Map(entries) => Value::Map(Rc::new(RefCell::new(
                entries
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.deep_copy_with_depth(depth + 1)))
                    .collect(),
            ))),
            other => other.clone(),
        }
    }

    pub fn get_entry(&self, key: &str) -> Option<Value> {
        let Value::Map(entries) = self else {
            return None;
        };
        entries
            .borrow()
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value.clone())
    }

    pub fn set_entry(&self, key: &str, value: Value) -> Result<(), ExecutionError> {
        let Value::Map(entries) = self else {
            return Err(format!("Cannot set entry {key} on a value of type {}", self.type_name()).into());
        };
        let mut entries = entries.borrow_mut();
        if let Some(entry) = entries.iter_mut().find(|(entry_key, _)| entry_key == key) {
            entry.1 = value;
        } else {
            entries.push((key.to_owned(), value));
        }
        return Ok(());
    }

    /// Membership check used by the `in`/`not_in` query operators: element of
    /// a list, substring of a string, or key of a map. Returns `None` when
    /// the right-hand side is not a container.
    pub fn contains(&self, value: &Value) -> Option<bool> {
        match self {
            Value::List(values) => Some(values.borrow().iter().any(|item| item == value)),
            Value::String(string) => match value {
                Value::String(needle) => Some(string.contains(needle.as_str())),
                _ => Some(false),
            },
            Value::Map(entries) => match value {
                Value::String(key) => Some(entries.borrow().iter().any(|(k, _)| k == key)),
                _ => Some(false),
            },
            _ => None,
        }
    }

    /// Ordering across values of the same comparable type. Mixed or
    /// non-comparable types yield `None`, which query conditions treat as
    /// "condition false" and sorts treat as equal.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => Some(left.cmp(right)),
            (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
            (Value::Boolean(left), Value::Boolean(right)) => Some(left.cmp(right)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(value) => serde_json::Value::from(*value),
            Value::Boolean(value) => serde_json::Value::from(*value),
            Value::String(value) => serde_json::Value::from(value.clone()),
            Value::List(values) => {
                serde_json::Value::Array(values.borrow().iter().map(|v| v.to_json()).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Value, ExecutionError> {
        Ok(match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Boolean(*value),
            serde_json::Value::Number(number) => Value::Integer(
                number
                    .as_i64()
                    .ok_or::<ExecutionError>(format!("Unsupported number: {number}").into())?,
            ),
            serde_json::Value::String(value) => Value::String(value.clone()),
            serde_json::Value::Array(values) => Value::List(Rc::new(RefCell::new(
                values
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ))),
            serde_json::Value::Object(entries) => Value::Map(Rc::new(RefCell::new(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), Value::from_json(value)?)))
                    .collect::<Result<Vec<_>, ExecutionError>>()?,
            ))),
        })
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null")?,
            Value::Integer(data) => data.fmt(f)?,
            Value::Boolean(data) => data.fmt(f)?,
            Value::String(data) => {
                f.write_str("\"")?;
                f.write_str(&data.replace("\"", "\\\""))?;
                f.write_str("\"")?;
            }
            Value::List(data) => fmt_collection("[", ", ", "]", data.borrow().iter(), f)?,
            Value::Map(data) => fmt_entries(
                "{",
                ", ",
                "}",
                data.borrow().iter().map(|(key, value)| (key.as_str(), value)),
                f,
            )?,
        };

        return Ok(());
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::List(values) => {
                let values = values.borrow();
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values.iter() {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let entries = entries.borrow();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_copy_should_not_observe_later_mutation() {
        let list = Value::new_list(vec![1, 2, 3]);
        let copy = list.deep_copy();

        let Value::List(ref values) = list else {
            panic!("expected list");
        };
        values.borrow_mut()[0] = Value::Integer(99);

        assert_eq!(copy, Value::new_list(vec![1, 2, 3]));
        assert_eq!(
            list,
            Value::new_list(vec![99, 2, 3]),
            "original should reflect the mutation"
        );
    }

    #[test]
    fn deep_copy_should_copy_nested_containers() {
        let inner = Value::new_list(vec![1]);
        let outer = Value::new_list([inner.clone()]);
        let copy = outer.deep_copy();

        let Value::List(ref values) = inner else {
            panic!("expected list");
        };
        values.borrow_mut().push(Value::Integer(2));

        assert_eq!(copy, Value::new_list([Value::new_list(vec![1])]));
    }

    #[test]
    fn deep_copy_should_terminate_on_cyclic_lists() {
        let list = Rc::new(RefCell::new(Vec::new()));
        list.borrow_mut().push(Value::List(list.clone()));
        let value = Value::List(list);

        // The copy shares structure past the depth limit instead of hanging.
        let copy = value.deep_copy();
        assert!(matches!(copy, Value::List(_)));
    }

    #[test]
    fn clone_should_share_list_storage() {
        let list = Value::new_list(vec![1]);
        let alias = list.clone();

        let Value::List(ref values) = alias else {
            panic!("expected list");
        };
        values.borrow_mut().push(Value::Integer(2));

        assert_eq!(list, Value::new_list(vec![1, 2]));
    }

    #[test]
    fn should_format_values_as_source_text() {
        assert_eq!(Value::new_list(vec![0, 2, 4]).to_string(), "[0, 2, 4]");
        assert_eq!(Value::from("hi \"there\"").to_string(), "\"hi \\\"there\\\"\"");
        assert_eq!(
            Value::new_map([("a".to_owned(), Value::Integer(1))]).to_string(),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn contains_should_match_container_semantics() {
        let list = Value::new_list(vec![1, 2]);
        assert_eq!(list.contains(&Value::Integer(2)), Some(true));
        assert_eq!(list.contains(&Value::Integer(5)), Some(false));
        assert_eq!(Value::from("hello").contains(&Value::from("ell")), Some(true));
        assert_eq!(Value::Integer(1).contains(&Value::Integer(1)), None);
    }

    #[test]
    fn json_round_trip_should_preserve_shape() {
        let json = serde_json::json!({"arr": [5, 2], "flag": true, "name": "x"});
        let value = Value::from_json(&json).unwrap();
        assert_eq!(value.to_json(), json);
    }
}
