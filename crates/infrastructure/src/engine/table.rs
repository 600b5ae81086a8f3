//! Per-table state and item semantics

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use domain::requests::{
    AttributeAction, AttributeValueUpdate, ComparisonOperator, Condition, QueryInput, QueryOutput,
    RecordEventName, ScanInput, ScanOutput,
};
use domain::table::{
    AttributeDefinition, KeyDefinition, KeySchemaElement, ProvisionedThroughput,
    StreamSpecification, TableDescription, TableStatus,
};
use domain::{AttributeValue, DomainError, Item, KeyValue, PrimaryKey};

use super::stream::StreamState;

/// One table: schema, items in key order, and the optional change stream.
#[derive(Debug)]
pub(crate) struct TableState {
    name: String,
    attribute_definitions: Vec<AttributeDefinition>,
    key_schema: Vec<KeySchemaElement>,
    key: KeyDefinition,
    throughput: ProvisionedThroughput,
    created_at: DateTime<Utc>,
    items: BTreeMap<PrimaryKey, Item>,
    stream: Option<StreamState>,
}

impl TableState {
    pub fn create(
        name: String,
        attribute_definitions: Vec<AttributeDefinition>,
        key_schema: Vec<KeySchemaElement>,
        throughput: Option<ProvisionedThroughput>,
        stream_specification: Option<StreamSpecification>,
    ) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::Validation(
                "table name must not be empty".to_string(),
            ));
        }
        let key = KeyDefinition::from_schema(&attribute_definitions, &key_schema)?;
        let stream = match stream_specification {
            Some(spec) if spec.stream_enabled => {
                let view_type = spec.stream_view_type.ok_or_else(|| {
                    DomainError::Validation(
                        "an enabled stream requires a stream view type".to_string(),
                    )
                })?;
                Some(StreamState::new(&name, view_type))
            },
            _ => None,
        };
        Ok(Self {
            name,
            attribute_definitions,
            key_schema,
            key,
            throughput: throughput.unwrap_or_default(),
            created_at: Utc::now(),
            items: BTreeMap::new(),
            stream,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream(&self) -> Option<&StreamState> {
        self.stream.as_ref()
    }

    pub fn describe(&self) -> TableDescription {
        TableDescription {
            table_name: self.name.clone(),
            attribute_definitions: self.attribute_definitions.clone(),
            key_schema: self.key_schema.clone(),
            table_status: TableStatus::Active,
            creation_date_time: self.created_at,
            provisioned_throughput: self.throughput,
            item_count: self.items.len() as u64,
            latest_stream_id: self.stream.as_ref().map(|s| s.id().to_string()),
        }
    }

    pub fn set_throughput(&mut self, throughput: ProvisionedThroughput) {
        self.throughput = throughput;
    }

    pub fn apply_stream_specification(
        &mut self,
        spec: StreamSpecification,
    ) -> Result<(), DomainError> {
        if spec.stream_enabled {
            if self.stream.is_some() {
                return Err(DomainError::Validation(
                    "table already has an enabled stream".to_string(),
                ));
            }
            let view_type = spec.stream_view_type.ok_or_else(|| {
                DomainError::Validation("an enabled stream requires a stream view type".to_string())
            })?;
            self.stream = Some(StreamState::new(&self.name, view_type));
        } else {
            self.stream = None;
        }
        Ok(())
    }

    /// Store an item, returning the previous image if one existed.
    pub fn put(&mut self, item: Item) -> Result<Option<Item>, DomainError> {
        let key = self.key.key_of_item(&item)?;
        let keys = self.key.key_attributes(&item);
        let old = self.items.insert(key, item.clone());
        if let Some(stream) = &mut self.stream {
            let event = if old.is_some() {
                RecordEventName::Modify
            } else {
                RecordEventName::Insert
            };
            stream.append(event, keys, old.clone(), Some(item));
        }
        Ok(old)
    }

    pub fn get(&self, key_map: &Item) -> Result<Option<Item>, DomainError> {
        let key = self.key.key_of_map(key_map)?;
        Ok(self.items.get(&key).cloned())
    }

    /// Remove an item, returning its image. Deleting a missing item is not
    /// an error and records nothing.
    pub fn delete(&mut self, key_map: &Item) -> Result<Option<Item>, DomainError> {
        let key = self.key.key_of_map(key_map)?;
        let old = self.items.remove(&key);
        if let Some(old_item) = &old {
            let keys = self.key.key_attributes(old_item);
            if let Some(stream) = &mut self.stream {
                stream.append(RecordEventName::Remove, keys, old.clone(), None);
            }
        }
        Ok(old)
    }

    /// Apply legacy attribute updates, upserting when the item is absent.
    /// Returns the old image (if any) and the new image.
    pub fn update(
        &mut self,
        key_map: &Item,
        updates: &HashMap<String, AttributeValueUpdate>,
    ) -> Result<(Option<Item>, Item), DomainError> {
        let key = self.key.key_of_map(key_map)?;
        let old = self.items.get(&key).cloned();
        let mut item = old.clone().unwrap_or_else(|| key_map.clone());

        for (name, update) in updates {
            if name == self.key.hash_name() || Some(name.as_str()) == self.key.range_name() {
                return Err(DomainError::Validation(format!(
                    "cannot update attribute {name}: it is part of the key"
                )));
            }
            match update.action.unwrap_or_default() {
                AttributeAction::Put => {
                    let value = update.value.clone().ok_or_else(|| {
                        DomainError::Validation(format!("PUT update of {name} requires a value"))
                    })?;
                    item.insert(name.clone(), value);
                },
                AttributeAction::Delete => match &update.value {
                    None => {
                        item.remove(name);
                    },
                    Some(value) => Self::delete_from_set(&mut item, name, value)?,
                },
                AttributeAction::Add => {
                    let value = update.value.clone().ok_or_else(|| {
                        DomainError::Validation(format!("ADD update of {name} requires a value"))
                    })?;
                    Self::add_value(&mut item, name, value)?;
                },
            }
        }

        let keys = self.key.key_attributes(&item);
        self.items.insert(key, item.clone());
        if let Some(stream) = &mut self.stream {
            let event = if old.is_some() {
                RecordEventName::Modify
            } else {
                RecordEventName::Insert
            };
            stream.append(event, keys, old.clone(), Some(item.clone()));
        }
        Ok((old, item))
    }

    fn delete_from_set(item: &mut Item, name: &str, value: &AttributeValue) -> Result<(), DomainError> {
        let remove_elements = |existing: &mut Vec<String>, elements: &[String]| {
            existing.retain(|e| !elements.contains(e));
        };
        let emptied = match (item.get_mut(name), value) {
            (Some(AttributeValue::SS(existing)), AttributeValue::SS(elements))
            | (Some(AttributeValue::NS(existing)), AttributeValue::NS(elements))
            | (Some(AttributeValue::BS(existing)), AttributeValue::BS(elements)) => {
                remove_elements(existing, elements);
                existing.is_empty()
            },
            (None, _) => false,
            _ => {
                return Err(DomainError::Validation(format!(
                    "DELETE update of {name} requires a matching set type"
                )));
            },
        };
        if emptied {
            item.remove(name);
        }
        Ok(())
    }

    fn add_value(item: &mut Item, name: &str, value: AttributeValue) -> Result<(), DomainError> {
        if !item.contains_key(name) {
            return match value {
                AttributeValue::N(_)
                | AttributeValue::SS(_)
                | AttributeValue::NS(_)
                | AttributeValue::BS(_) => {
                    item.insert(name.to_string(), value);
                    Ok(())
                },
                _ => Err(DomainError::Validation(format!(
                    "ADD update of {name} requires a number or set value"
                ))),
            };
        }
        let merge_sets = |existing: &mut Vec<String>, elements: Vec<String>| {
            for element in elements {
                if !existing.contains(&element) {
                    existing.push(element);
                }
            }
        };
        match (item.get_mut(name), value) {
            (Some(AttributeValue::N(existing)), AttributeValue::N(delta)) => {
                let sum = parse_number(existing)? + parse_number(&delta)?;
                *existing = format_number(sum);
                Ok(())
            },
            (Some(AttributeValue::SS(existing)), AttributeValue::SS(elements))
            | (Some(AttributeValue::NS(existing)), AttributeValue::NS(elements))
            | (Some(AttributeValue::BS(existing)), AttributeValue::BS(elements)) => {
                merge_sets(existing, elements);
                Ok(())
            },
            _ => Err(DomainError::Validation(format!(
                "ADD update of {name} requires a number or set value matching the existing type"
            ))),
        }
    }

    pub fn query(&self, input: &QueryInput) -> Result<QueryOutput, DomainError> {
        let hash_condition = input
            .key_conditions
            .get(self.key.hash_name())
            .ok_or_else(|| {
                DomainError::Validation(
                    "query requires an equality condition on the hash key".to_string(),
                )
            })?;
        if hash_condition.comparison_operator != ComparisonOperator::Eq {
            return Err(DomainError::Validation(
                "the hash key condition must use EQ".to_string(),
            ));
        }
        let hash_value = single_value(hash_condition)?;
        let hash_key = self.key.hash_key_from_value(hash_value)?;

        let range_condition = self
            .key
            .range_name()
            .and_then(|name| input.key_conditions.get(name));
        let recognized = 1 + usize::from(range_condition.is_some());
        if input.key_conditions.len() != recognized {
            return Err(DomainError::Validation(
                "query conditions may only reference key attributes".to_string(),
            ));
        }
        let range_predicate = range_condition
            .map(|condition| RangePredicate::compile(condition, &self.key))
            .transpose()?;

        let mut matches: Vec<(&PrimaryKey, &Item)> = self
            .items
            .iter()
            .filter(|(key, _)| key.hash == hash_key)
            .filter(|(key, _)| {
                range_predicate
                    .as_ref()
                    .is_none_or(|predicate| predicate.matches(key.range.as_ref()))
            })
            .collect();

        let forward = input.scan_index_forward.unwrap_or(true);
        if !forward {
            matches.reverse();
        }

        if let Some(start_map) = &input.exclusive_start_key {
            let start = self.key.key_of_map(start_map)?;
            matches.retain(|(key, _)| {
                if forward {
                    **key > start
                } else {
                    **key < start
                }
            });
        }

        let (items, last_evaluated_key) = self.paginate(matches, input.limit);
        Ok(QueryOutput {
            count: items.len(),
            items,
            last_evaluated_key,
        })
    }

    pub fn scan(&self, input: &ScanInput) -> Result<ScanOutput, DomainError> {
        let mut matches: Vec<(&PrimaryKey, &Item)> = self.items.iter().collect();
        if let Some(start_map) = &input.exclusive_start_key {
            let start = self.key.key_of_map(start_map)?;
            matches.retain(|(key, _)| **key > start);
        }
        let (items, last_evaluated_key) = self.paginate(matches, input.limit);
        Ok(ScanOutput {
            count: items.len(),
            scanned_count: items.len(),
            items,
            last_evaluated_key,
        })
    }

    fn paginate(
        &self,
        matches: Vec<(&PrimaryKey, &Item)>,
        limit: Option<usize>,
    ) -> (Vec<Item>, Option<Item>) {
        let truncated = limit.is_some_and(|limit| matches.len() > limit);
        let taken = match limit {
            Some(limit) => &matches[..limit.min(matches.len())],
            None => &matches[..],
        };
        let items: Vec<Item> = taken.iter().map(|(_, item)| (*item).clone()).collect();
        let last_evaluated_key = if truncated {
            items.last().map(|item| self.key.key_attributes(item))
        } else {
            None
        };
        (items, last_evaluated_key)
    }
}

/// Pre-resolved range condition, checked per stored key.
enum RangePredicate {
    Compare(ComparisonOperator, KeyValue, Option<KeyValue>),
    BeginsWith(String),
}

impl RangePredicate {
    fn compile(condition: &Condition, key: &KeyDefinition) -> Result<Self, DomainError> {
        match condition.comparison_operator {
            ComparisonOperator::Between => {
                let [low, high] = condition.attribute_value_list.as_slice() else {
                    return Err(DomainError::Validation(
                        "BETWEEN requires exactly two values".to_string(),
                    ));
                };
                Ok(Self::Compare(
                    ComparisonOperator::Between,
                    key.range_key_from_value(low)?,
                    Some(key.range_key_from_value(high)?),
                ))
            },
            ComparisonOperator::BeginsWith => {
                let value = single_value(condition)?;
                match value {
                    AttributeValue::S(prefix) => Ok(Self::BeginsWith(prefix.clone())),
                    _ => Err(DomainError::Validation(
                        "BEGINS_WITH requires a string value".to_string(),
                    )),
                }
            },
            operator => Ok(Self::Compare(
                operator,
                key.range_key_from_value(single_value(condition)?)?,
                None,
            )),
        }
    }

    fn matches(&self, range: Option<&KeyValue>) -> bool {
        let Some(range) = range else {
            return false;
        };
        match self {
            Self::Compare(operator, bound, high) => match operator {
                ComparisonOperator::Eq => range == bound,
                ComparisonOperator::Lt => range < bound,
                ComparisonOperator::Le => range <= bound,
                ComparisonOperator::Gt => range > bound,
                ComparisonOperator::Ge => range >= bound,
                ComparisonOperator::Between => {
                    high.as_ref().is_some_and(|high| range >= bound && range <= high)
                },
                ComparisonOperator::BeginsWith => false,
            },
            Self::BeginsWith(prefix) => match range {
                KeyValue::S(value) => value.starts_with(prefix.as_str()),
                _ => false,
            },
        }
    }
}

fn single_value(condition: &Condition) -> Result<&AttributeValue, DomainError> {
    let [value] = condition.attribute_value_list.as_slice() else {
        return Err(DomainError::Validation(
            "condition requires exactly one value".to_string(),
        ));
    };
    Ok(value)
}

fn parse_number(text: &str) -> Result<f64, DomainError> {
    let parsed: f64 = text
        .parse()
        .map_err(|_| DomainError::Validation(format!("invalid numeric value: {text}")))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(DomainError::Validation(format!(
            "numeric value is not finite: {text}"
        )))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
