// Rows and Data Objects
//
// Rows are positional sequences of scalars matching the table schema
// at write time. A data object is an immutable batch of rows for one
// table, written before the owning transaction commits.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key prefix shared by every data object.
pub const TABLE_PREFIX: &str = "_table_";

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

pub type Row = Vec<Value>;

/// Build a row from heterogeneous literals.
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::data::Value::from($value)),*]
    };
}

/// Serialized body of a data object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataObject {
    pub table: String,
    pub rows: Vec<Row>,
}

impl DataObject {
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Key for the `seq`-th data object flushed by transaction `txn_id`.
pub fn data_object_key(table: &str, txn_id: Uuid, seq: u64) -> String {
    format!("{TABLE_PREFIX}{table}_{}_{seq:06}", txn_id.simple())
}

/// Table names double as key fragments, so they are kept to a
/// conservative alphabet.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_use_plain_json_scalars() {
        let object = DataObject {
            table: "users".into(),
            rows: vec![row![1, "Alice"], vec![Value::Null, Value::Bool(true)]],
        };

        let json = String::from_utf8(object.encode().unwrap()).unwrap();
        assert_eq!(json, r#"{"table":"users","rows":[[1,"Alice"],[null,true]]}"#);
        assert_eq!(DataObject::decode(json.as_bytes()).unwrap(), object);
    }

    #[test]
    fn integers_and_floats_stay_distinct() {
        let row: Row = serde_json::from_str("[3, 3.5]").unwrap();
        assert_eq!(row, vec![Value::Int(3), Value::Float(3.5)]);
    }

    #[test]
    fn object_keys_are_unique_per_sequence() {
        let id = Uuid::new_v4();
        let a = data_object_key("t", id, 0);
        let b = data_object_key("t", id, 1);

        assert!(a.starts_with("_table_t_"));
        assert_ne!(a, b);
    }

    #[test]
    fn table_name_alphabet() {
        assert!(is_valid_table_name("users_2024-v1"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("a/b"));
        assert!(!is_valid_table_name("sp ace"));
    }
}
