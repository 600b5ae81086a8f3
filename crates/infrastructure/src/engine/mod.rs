//! In-memory data engine
//!
//! Implements the `DataEnginePort` collaborator over a table map guarded by
//! one read-write lock. The engine exists so the interception layer can be
//! exercised end-to-end; it is deliberately a stand-in, not a database.

mod stream;
mod table;

use std::collections::HashMap;

use async_trait::async_trait;
use application::ports::DataEnginePort;
use domain::requests::{
    BatchGetItemInput, BatchGetItemOutput, BatchWriteItemInput, BatchWriteItemOutput,
    CreateTableInput, CreateTableOutput, DeleteItemInput, DeleteItemOutput, DeleteTableInput,
    DeleteTableOutput, DescribeStreamInput, DescribeStreamOutput, DescribeTableInput,
    DescribeTableOutput, GetItemInput, GetItemOutput, GetRecordsInput, GetRecordsOutput,
    GetShardIteratorInput, GetShardIteratorOutput, ListStreamsInput, ListStreamsOutput,
    ListTablesInput, ListTablesOutput, PutItemInput, PutItemOutput, QueryInput, QueryOutput,
    ReturnValues, ScanInput, ScanOutput, StreamSummary, UpdateItemInput, UpdateItemOutput,
    UpdateTableInput, UpdateTableOutput,
};
use domain::{DomainError, Item};
use parking_lot::RwLock;

use stream::{SHARD_ID, decode_iterator};
use table::TableState;

/// Table map behind the collaborator port. Default engine of the façade.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    tables: RwLock<HashMap<String, TableState>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(name: &str) -> DomainError {
        DomainError::ResourceNotFound(format!("table not found: {name}"))
    }
}

#[async_trait]
impl DataEnginePort for MemoryEngine {
    async fn create_table(
        &self,
        input: CreateTableInput,
    ) -> Result<CreateTableOutput, DomainError> {
        let mut tables = self.tables.write();
        if tables.contains_key(&input.table_name) {
            return Err(DomainError::ResourceInUse(format!(
                "table already exists: {}",
                input.table_name
            )));
        }
        let table = TableState::create(
            input.table_name.clone(),
            input.attribute_definitions,
            input.key_schema,
            input.provisioned_throughput,
            input.stream_specification,
        )?;
        let description = table.describe();
        tables.insert(input.table_name, table);
        Ok(CreateTableOutput {
            table_description: description,
        })
    }

    async fn delete_table(
        &self,
        input: DeleteTableInput,
    ) -> Result<DeleteTableOutput, DomainError> {
        let mut tables = self.tables.write();
        let table = tables
            .remove(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        Ok(DeleteTableOutput {
            table_description: table.describe(),
        })
    }

    async fn update_table(
        &self,
        input: UpdateTableInput,
    ) -> Result<UpdateTableOutput, DomainError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        if let Some(throughput) = input.provisioned_throughput {
            table.set_throughput(throughput);
        }
        if let Some(spec) = input.stream_specification {
            table.apply_stream_specification(spec)?;
        }
        Ok(UpdateTableOutput {
            table_description: table.describe(),
        })
    }

    async fn describe_table(
        &self,
        input: DescribeTableInput,
    ) -> Result<DescribeTableOutput, DomainError> {
        let tables = self.tables.read();
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        Ok(DescribeTableOutput {
            table: table.describe(),
        })
    }

    async fn list_tables(&self, input: ListTablesInput) -> Result<ListTablesOutput, DomainError> {
        let tables = self.tables.read();
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        if let Some(start) = &input.exclusive_start_table_name {
            names.retain(|name| name > start);
        }
        let truncated = input.limit.is_some_and(|limit| names.len() > limit);
        if let Some(limit) = input.limit {
            names.truncate(limit);
        }
        let last_evaluated_table_name = if truncated {
            names.last().cloned()
        } else {
            None
        };
        Ok(ListTablesOutput {
            table_names: names,
            last_evaluated_table_name,
        })
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, DomainError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        let old = table.put(input.item)?;
        let attributes = match input.return_values.unwrap_or_default() {
            ReturnValues::AllOld => old,
            _ => None,
        };
        Ok(PutItemOutput { attributes })
    }

    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, DomainError> {
        let tables = self.tables.read();
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        Ok(GetItemOutput {
            item: table.get(&input.key)?,
        })
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, DomainError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        let old = table.delete(&input.key)?;
        let attributes = match input.return_values.unwrap_or_default() {
            ReturnValues::AllOld => old,
            _ => None,
        };
        Ok(DeleteItemOutput { attributes })
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, DomainError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        let (old, new) = table.update(&input.key, &input.attribute_updates)?;
        let attributes = match input.return_values.unwrap_or_default() {
            ReturnValues::AllOld => old,
            ReturnValues::AllNew => Some(new),
            ReturnValues::None => None,
        };
        Ok(UpdateItemOutput { attributes })
    }

    async fn batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> Result<BatchGetItemOutput, DomainError> {
        let tables = self.tables.read();
        let mut responses: HashMap<String, Vec<Item>> = HashMap::new();
        for (table_name, request) in input.request_items {
            let table = tables
                .get(&table_name)
                .ok_or_else(|| Self::missing(&table_name))?;
            let mut found = Vec::new();
            for key in &request.keys {
                if let Some(item) = table.get(key)? {
                    found.push(item);
                }
            }
            responses.insert(table_name, found);
        }
        Ok(BatchGetItemOutput {
            responses,
            unprocessed_keys: HashMap::new(),
        })
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, DomainError> {
        let mut tables = self.tables.write();
        for (table_name, requests) in input.request_items {
            let table = tables
                .get_mut(&table_name)
                .ok_or_else(|| Self::missing(&table_name))?;
            for request in requests {
                match (request.put_request, request.delete_request) {
                    (Some(put), None) => {
                        table.put(put.item)?;
                    },
                    (None, Some(delete)) => {
                        table.delete(&delete.key)?;
                    },
                    _ => {
                        return Err(DomainError::Validation(
                            "a write request must carry exactly one of PutRequest or DeleteRequest"
                                .to_string(),
                        ));
                    },
                }
            }
        }
        Ok(BatchWriteItemOutput {
            unprocessed_items: HashMap::new(),
        })
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DomainError> {
        let tables = self.tables.read();
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        table.query(&input)
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, DomainError> {
        let tables = self.tables.read();
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| Self::missing(&input.table_name))?;
        table.scan(&input)
    }

    async fn describe_stream(
        &self,
        input: DescribeStreamInput,
    ) -> Result<DescribeStreamOutput, DomainError> {
        let tables = self.tables.read();
        for table in tables.values() {
            if let Some(stream) = table.stream() {
                if stream.id() == input.stream_id {
                    return Ok(DescribeStreamOutput {
                        stream_description: stream.describe(table.name()),
                    });
                }
            }
        }
        Err(DomainError::ResourceNotFound(format!(
            "stream not found: {}",
            input.stream_id
        )))
    }

    async fn list_streams(
        &self,
        input: ListStreamsInput,
    ) -> Result<ListStreamsOutput, DomainError> {
        let tables = self.tables.read();
        let mut streams: Vec<StreamSummary> = tables
            .values()
            .filter(|table| {
                input
                    .table_name
                    .as_deref()
                    .is_none_or(|name| name == table.name())
            })
            .filter_map(|table| {
                table.stream().map(|stream| StreamSummary {
                    stream_id: stream.id().to_string(),
                    table_name: table.name().to_string(),
                })
            })
            .collect();
        streams.sort_by(|a, b| a.stream_id.cmp(&b.stream_id));
        Ok(ListStreamsOutput { streams })
    }

    async fn get_shard_iterator(
        &self,
        input: GetShardIteratorInput,
    ) -> Result<GetShardIteratorOutput, DomainError> {
        let tables = self.tables.read();
        for table in tables.values() {
            if let Some(stream) = table.stream() {
                if stream.id() == input.stream_id {
                    if input.shard_id != SHARD_ID {
                        return Err(DomainError::ResourceNotFound(format!(
                            "shard not found: {}",
                            input.shard_id
                        )));
                    }
                    let position = stream.position_for(
                        input.shard_iterator_type,
                        input.sequence_number.as_deref(),
                    )?;
                    return Ok(GetShardIteratorOutput {
                        shard_iterator: stream.encode_iterator(position),
                    });
                }
            }
        }
        Err(DomainError::ResourceNotFound(format!(
            "stream not found: {}",
            input.stream_id
        )))
    }

    async fn get_records(&self, input: GetRecordsInput) -> Result<GetRecordsOutput, DomainError> {
        let (stream_id, shard_id, position) = decode_iterator(&input.shard_iterator)?;
        if shard_id != SHARD_ID {
            return Err(DomainError::ResourceNotFound(format!(
                "shard not found: {shard_id}"
            )));
        }
        let tables = self.tables.read();
        for table in tables.values() {
            if let Some(stream) = table.stream() {
                if stream.id() == stream_id {
                    let (records, next_position) = stream.read_from(position, input.limit);
                    return Ok(GetRecordsOutput {
                        records,
                        next_shard_iterator: Some(stream.encode_iterator(next_position)),
                    });
                }
            }
        }
        Err(DomainError::ResourceNotFound(format!(
            "stream not found: {stream_id}"
        )))
    }
}
