//! Table schema types and key resolution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeValue, Item, KeyValue, PrimaryKey};
use crate::errors::DomainError;

/// Scalar type of a key-eligible attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    /// String
    S,
    /// Number
    N,
    /// Binary
    B,
}

/// Role of a key schema element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    /// Partition key
    Hash,
    /// Sort key
    Range,
}

/// Declares the type of one attribute referenced by the key schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarAttributeType,
}

/// One element of a table's key schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

/// Provisioned read/write capacity. The engine records but never enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: u64,
    pub write_capacity_units: u64,
}

impl Default for ProvisionedThroughput {
    fn default() -> Self {
        Self {
            read_capacity_units: 10,
            write_capacity_units: 10,
        }
    }
}

/// What a change record carries for each write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamViewType {
    KeysOnly,
    NewImage,
    OldImage,
    NewAndOldImages,
}

/// Stream settings supplied at table creation or update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamSpecification {
    pub stream_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_view_type: Option<StreamViewType>,
}

/// Table lifecycle status. Tables are active immediately; delayed transient
/// statuses are not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Active,
    Deleting,
}

/// Client-visible description of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescription {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub table_status: TableStatus,
    pub creation_date_time: DateTime<Utc>,
    pub provisioned_throughput: ProvisionedThroughput,
    pub item_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_stream_id: Option<String>,
}

/// Resolved key layout of a table: which attributes form the key and what
/// scalar type each must carry. Built once at table creation and reused for
/// every item-level validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    hash_name: String,
    hash_type: ScalarAttributeType,
    range: Option<(String, ScalarAttributeType)>,
}

impl KeyDefinition {
    /// Resolve and validate a key schema against the attribute definitions.
    pub fn from_schema(
        definitions: &[AttributeDefinition],
        schema: &[KeySchemaElement],
    ) -> Result<Self, DomainError> {
        let lookup = |name: &str| -> Result<ScalarAttributeType, DomainError> {
            definitions
                .iter()
                .find(|def| def.attribute_name == name)
                .map(|def| def.attribute_type)
                .ok_or_else(|| {
                    DomainError::Validation(format!(
                        "key schema attribute {name} has no attribute definition"
                    ))
                })
        };

        let mut hash = None;
        let mut range = None;
        for element in schema {
            match element.key_type {
                KeyType::Hash => {
                    if hash.is_some() {
                        return Err(DomainError::Validation(
                            "key schema declares more than one hash key".to_string(),
                        ));
                    }
                    hash = Some((
                        element.attribute_name.clone(),
                        lookup(&element.attribute_name)?,
                    ));
                },
                KeyType::Range => {
                    if range.is_some() {
                        return Err(DomainError::Validation(
                            "key schema declares more than one range key".to_string(),
                        ));
                    }
                    range = Some((
                        element.attribute_name.clone(),
                        lookup(&element.attribute_name)?,
                    ));
                },
            }
        }

        let (hash_name, hash_type) = hash.ok_or_else(|| {
            DomainError::Validation("key schema must declare a hash key".to_string())
        })?;

        Ok(Self {
            hash_name,
            hash_type,
            range,
        })
    }

    /// Name of the hash key attribute.
    pub fn hash_name(&self) -> &str {
        &self.hash_name
    }

    /// Name of the range key attribute, when the table has one.
    pub fn range_name(&self) -> Option<&str> {
        self.range.as_ref().map(|(name, _)| name.as_str())
    }

    /// Extract the primary key of a full item. All key attributes must be
    /// present and carry the declared scalar type.
    pub fn key_of_item(&self, item: &Item) -> Result<PrimaryKey, DomainError> {
        let hash_value = item.get(&self.hash_name).ok_or_else(|| {
            DomainError::Validation(format!("item is missing key attribute {}", self.hash_name))
        })?;
        let hash = KeyValue::from_attribute(hash_value, self.hash_type)?;

        let range = match &self.range {
            None => None,
            Some((name, scalar)) => {
                let value = item.get(name).ok_or_else(|| {
                    DomainError::Validation(format!("item is missing key attribute {name}"))
                })?;
                Some(KeyValue::from_attribute(value, *scalar)?)
            },
        };

        Ok(PrimaryKey { hash, range })
    }

    /// Resolve a key map (as sent by get/delete/update item). The map must
    /// contain exactly the key attributes, nothing more.
    pub fn key_of_map(&self, key: &Item) -> Result<PrimaryKey, DomainError> {
        let expected = 1 + usize::from(self.range.is_some());
        if key.len() != expected {
            return Err(DomainError::Validation(
                "provided key does not match the table key schema".to_string(),
            ));
        }
        self.key_of_item(key)
    }

    /// Convert a resolved key back into its wire attribute map.
    pub fn key_attributes(&self, item: &Item) -> Item {
        let mut out = Item::new();
        if let Some(value) = item.get(&self.hash_name) {
            out.insert(self.hash_name.clone(), value.clone());
        }
        if let Some((name, _)) = &self.range {
            if let Some(value) = item.get(name) {
                out.insert(name.clone(), value.clone());
            }
        }
        out
    }

    /// Hash-key equality helper used by query evaluation.
    pub fn hash_key_from_value(&self, value: &AttributeValue) -> Result<KeyValue, DomainError> {
        KeyValue::from_attribute(value, self.hash_type)
    }

    /// Range-key resolution helper used by query evaluation.
    pub fn range_key_from_value(&self, value: &AttributeValue) -> Result<KeyValue, DomainError> {
        let (_, scalar) = self.range.as_ref().ok_or_else(|| {
            DomainError::Validation("table has no range key".to_string())
        })?;
        KeyValue::from_attribute(value, *scalar)
    }
}
