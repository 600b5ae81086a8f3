//! Data engine port
//!
//! The collaborator that actually implements table and item semantics. The
//! intercepting handler forwards to it whenever no injected failure applies;
//! its errors are propagated verbatim, never wrapped or masked.

use async_trait::async_trait;
use domain::DomainError;
use domain::requests::{
    BatchGetItemInput, BatchGetItemOutput, BatchWriteItemInput, BatchWriteItemOutput,
    CreateTableInput, CreateTableOutput, DeleteItemInput, DeleteItemOutput, DeleteTableInput,
    DeleteTableOutput, DescribeStreamInput, DescribeStreamOutput, DescribeTableInput,
    DescribeTableOutput, GetItemInput, GetItemOutput, GetRecordsInput, GetRecordsOutput,
    GetShardIteratorInput, GetShardIteratorOutput, ListStreamsInput, ListStreamsOutput,
    ListTablesInput, ListTablesOutput, PutItemInput, PutItemOutput, QueryInput, QueryOutput,
    ScanInput, ScanOutput, UpdateItemInput, UpdateItemOutput, UpdateTableInput, UpdateTableOutput,
};
#[cfg(test)]
use mockall::automock;

/// Port for the key-value/document engine behind the interception layer.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataEnginePort: Send + Sync {
    async fn create_table(&self, input: CreateTableInput)
    -> Result<CreateTableOutput, DomainError>;

    async fn delete_table(&self, input: DeleteTableInput)
    -> Result<DeleteTableOutput, DomainError>;

    async fn update_table(&self, input: UpdateTableInput)
    -> Result<UpdateTableOutput, DomainError>;

    async fn describe_table(
        &self,
        input: DescribeTableInput,
    ) -> Result<DescribeTableOutput, DomainError>;

    async fn list_tables(&self, input: ListTablesInput) -> Result<ListTablesOutput, DomainError>;

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, DomainError>;

    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, DomainError>;

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, DomainError>;

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, DomainError>;

    async fn batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> Result<BatchGetItemOutput, DomainError>;

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, DomainError>;

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DomainError>;

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, DomainError>;

    async fn describe_stream(
        &self,
        input: DescribeStreamInput,
    ) -> Result<DescribeStreamOutput, DomainError>;

    async fn list_streams(
        &self,
        input: ListStreamsInput,
    ) -> Result<ListStreamsOutput, DomainError>;

    async fn get_shard_iterator(
        &self,
        input: GetShardIteratorInput,
    ) -> Result<GetShardIteratorOutput, DomainError>;

    async fn get_records(&self, input: GetRecordsInput) -> Result<GetRecordsOutput, DomainError>;
}
