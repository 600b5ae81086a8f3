//! Property-based tests for the document model
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::table::ScalarAttributeType;
use domain::{AttributeValue, KeyValue};
use proptest::prelude::*;

// ============================================================================
// AttributeValue wire-shape Property Tests
// ============================================================================

mod attribute_value_tests {
    use super::*;

    fn scalar_value() -> impl Strategy<Value = AttributeValue> {
        prop_oneof![
            any::<String>().prop_map(AttributeValue::S),
            any::<i64>().prop_map(|n| AttributeValue::N(n.to_string())),
            any::<bool>().prop_map(AttributeValue::Bool),
            Just(AttributeValue::Null(true)),
            proptest::collection::vec(any::<String>(), 0..4).prop_map(AttributeValue::SS),
        ]
    }

    proptest! {
        #[test]
        fn scalar_values_round_trip_through_json(value in scalar_value()) {
            let json = serde_json::to_string(&value).unwrap();
            let parsed: AttributeValue = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, value);
        }

        #[test]
        fn string_values_serialize_externally_tagged(s in any::<String>()) {
            let json = serde_json::to_value(AttributeValue::S(s.clone())).unwrap();
            prop_assert_eq!(json["S"].as_str(), Some(s.as_str()));
        }
    }
}

// ============================================================================
// KeyValue ordering Property Tests
// ============================================================================

mod key_ordering_tests {
    use super::*;

    proptest! {
        #[test]
        fn numeric_keys_order_like_their_values(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let ka = KeyValue::from_attribute(
                &AttributeValue::N(a.to_string()),
                ScalarAttributeType::N,
            ).unwrap();
            let kb = KeyValue::from_attribute(
                &AttributeValue::N(b.to_string()),
                ScalarAttributeType::N,
            ).unwrap();
            prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
        }

        #[test]
        fn string_keys_order_lexicographically(a in any::<String>(), b in any::<String>()) {
            let ka = KeyValue::from_attribute(
                &AttributeValue::S(a.clone()),
                ScalarAttributeType::S,
            ).unwrap();
            let kb = KeyValue::from_attribute(
                &AttributeValue::S(b.clone()),
                ScalarAttributeType::S,
            ).unwrap();
            prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
        }

        #[test]
        fn key_equality_agrees_with_ordering(a in -1000i64..1000) {
            let first = KeyValue::from_attribute(
                &AttributeValue::N(a.to_string()),
                ScalarAttributeType::N,
            ).unwrap();
            let second = KeyValue::from_attribute(
                &AttributeValue::N(a.to_string()),
                ScalarAttributeType::N,
            ).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.cmp(&second), std::cmp::Ordering::Equal);
        }
    }
}
