//! Document model: attribute values and primary keys
//!
//! `AttributeValue` is the externally-tagged wire representation
//! (`{"S": "..."}`, `{"N": "12"}`, ...). `KeyValue` is the orderable subset
//! used for primary keys; items are stored in key order.

use std::cmp::Ordering;
use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::table::ScalarAttributeType;

/// A single attribute value in the wire shape clients send and receive.
///
/// Binary values (`B`, `BS`) are base64 strings on the wire and stay encoded
/// in memory; they are only decoded where byte ordering matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number, kept as the decimal string the client sent
    N(String),
    /// Binary, base64-encoded
    B(String),
    /// Boolean
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker
    #[serde(rename = "NULL")]
    Null(bool),
    /// List
    L(Vec<AttributeValue>),
    /// Map
    M(HashMap<String, AttributeValue>),
    /// String set
    SS(Vec<String>),
    /// Number set
    NS(Vec<String>),
    /// Binary set
    BS(Vec<String>),
}

impl AttributeValue {
    /// The scalar type of this value, if it is one of the key-eligible kinds.
    pub const fn scalar_type(&self) -> Option<ScalarAttributeType> {
        match self {
            Self::S(_) => Some(ScalarAttributeType::S),
            Self::N(_) => Some(ScalarAttributeType::N),
            Self::B(_) => Some(ScalarAttributeType::B),
            _ => None,
        }
    }

    /// Borrow the string payload of an `S` value.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the decimal payload of an `N` value.
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }
}

/// An item is a named collection of attribute values.
pub type Item = HashMap<String, AttributeValue>;

/// The orderable subset of attribute values usable in a primary key.
///
/// Strings sort lexicographically, numbers numerically (`total_cmp` over the
/// parsed value; only finite numbers pass validation), binary by decoded
/// bytes.
#[derive(Debug, Clone)]
pub enum KeyValue {
    /// String key
    S(String),
    /// Number key, parsed from its decimal string
    N(f64),
    /// Binary key, decoded bytes
    B(Vec<u8>),
}

impl KeyValue {
    /// Convert a wire attribute into a key value, enforcing the declared
    /// scalar type. Numbers must parse to a finite float; binary values must
    /// be valid base64.
    pub fn from_attribute(
        value: &AttributeValue,
        expected: ScalarAttributeType,
    ) -> Result<Self, DomainError> {
        match (value, expected) {
            (AttributeValue::S(s), ScalarAttributeType::S) => Ok(Self::S(s.clone())),
            (AttributeValue::N(n), ScalarAttributeType::N) => {
                let parsed: f64 = n.parse().map_err(|_| {
                    DomainError::Validation(format!("invalid numeric key value: {n}"))
                })?;
                if parsed.is_finite() {
                    Ok(Self::N(parsed))
                } else {
                    Err(DomainError::Validation(format!(
                        "numeric key value is not finite: {n}"
                    )))
                }
            },
            (AttributeValue::B(b), ScalarAttributeType::B) => {
                let bytes = BASE64.decode(b).map_err(|_| {
                    DomainError::Validation("binary key value is not valid base64".to_string())
                })?;
                Ok(Self::B(bytes))
            },
            _ => Err(DomainError::Validation(
                "key attribute type does not match the table schema".to_string(),
            )),
        }
    }

    const fn type_rank(&self) -> u8 {
        match self {
            Self::S(_) => 0,
            Self::N(_) => 1,
            Self::B(_) => 2,
        }
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::S(a), Self::S(b)) => a.cmp(b),
            (Self::N(a), Self::N(b)) => a.total_cmp(b),
            (Self::B(a), Self::B(b)) => a.cmp(b),
            // Mixed types cannot occur within one table; rank keeps the
            // ordering total anyway.
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fully resolved primary key of one item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrimaryKey {
    /// Hash (partition) portion
    pub hash: KeyValue,
    /// Range (sort) portion, when the table declares one
    pub range: Option<KeyValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_value_wire_shape() {
        let value = AttributeValue::S("hello".to_string());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"S":"hello"}"#);
    }

    #[test]
    fn number_value_wire_shape() {
        let value = AttributeValue::N("42".to_string());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"N":"42"}"#);
    }

    #[test]
    fn bool_value_wire_shape() {
        let value = AttributeValue::Bool(true);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"BOOL":true}"#);
    }

    #[test]
    fn null_value_wire_shape() {
        let value = AttributeValue::Null(true);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"NULL":true}"#);
    }

    #[test]
    fn nested_map_round_trip() {
        let mut inner = HashMap::new();
        inner.insert("count".to_string(), AttributeValue::N("3".to_string()));
        let value = AttributeValue::M(inner);
        let json = serde_json::to_string(&value).unwrap();
        let parsed: AttributeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn list_round_trip() {
        let value = AttributeValue::L(vec![
            AttributeValue::S("a".to_string()),
            AttributeValue::N("1".to_string()),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        let parsed: AttributeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn scalar_type_of_key_eligible_values() {
        assert_eq!(
            AttributeValue::S(String::new()).scalar_type(),
            Some(ScalarAttributeType::S)
        );
        assert_eq!(
            AttributeValue::N(String::new()).scalar_type(),
            Some(ScalarAttributeType::N)
        );
        assert_eq!(
            AttributeValue::B(String::new()).scalar_type(),
            Some(ScalarAttributeType::B)
        );
        assert_eq!(AttributeValue::Bool(false).scalar_type(), None);
    }

    #[test]
    fn string_keys_sort_lexicographically() {
        let a = KeyValue::S("apple".to_string());
        let b = KeyValue::S("banana".to_string());
        assert!(a < b);
    }

    #[test]
    fn number_keys_sort_numerically_not_lexically() {
        let two = KeyValue::from_attribute(
            &AttributeValue::N("2".to_string()),
            ScalarAttributeType::N,
        )
        .unwrap();
        let ten = KeyValue::from_attribute(
            &AttributeValue::N("10".to_string()),
            ScalarAttributeType::N,
        )
        .unwrap();
        assert!(two < ten);
    }

    #[test]
    fn binary_keys_sort_by_decoded_bytes() {
        let a = KeyValue::from_attribute(
            &AttributeValue::B(BASE64.encode([0x01])),
            ScalarAttributeType::B,
        )
        .unwrap();
        let b = KeyValue::from_attribute(
            &AttributeValue::B(BASE64.encode([0x02])),
            ScalarAttributeType::B,
        )
        .unwrap();
        assert!(a < b);
    }

    #[test]
    fn key_type_mismatch_is_validation_error() {
        let err = KeyValue::from_attribute(
            &AttributeValue::S("oops".to_string()),
            ScalarAttributeType::N,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_numeric_number_key_is_rejected() {
        let err = KeyValue::from_attribute(
            &AttributeValue::N("not-a-number".to_string()),
            ScalarAttributeType::N,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn infinite_number_key_is_rejected() {
        let err = KeyValue::from_attribute(
            &AttributeValue::N("inf".to_string()),
            ScalarAttributeType::N,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn invalid_base64_binary_key_is_rejected() {
        let err = KeyValue::from_attribute(
            &AttributeValue::B("!!not base64!!".to_string()),
            ScalarAttributeType::B,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn primary_key_orders_by_hash_then_range() {
        let early = PrimaryKey {
            hash: KeyValue::S("a".to_string()),
            range: Some(KeyValue::N(9.0)),
        };
        let late = PrimaryKey {
            hash: KeyValue::S("b".to_string()),
            range: Some(KeyValue::N(1.0)),
        };
        assert!(early < late);

        let first = PrimaryKey {
            hash: KeyValue::S("a".to_string()),
            range: Some(KeyValue::N(1.0)),
        };
        assert!(first < early);
    }
}
