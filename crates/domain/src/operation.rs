//! The closed set of wire operations
//!
//! Every request the transport can decode becomes one `Operation` variant;
//! every engine response becomes one `OperationOutput` variant. The
//! `OperationKind` tag is what failure conditions match against.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::requests::{
    BatchGetItemInput, BatchGetItemOutput, BatchWriteItemInput, BatchWriteItemOutput,
    CreateTableInput, CreateTableOutput, DeleteItemInput, DeleteItemOutput, DeleteTableInput,
    DeleteTableOutput, DescribeStreamInput, DescribeStreamOutput, DescribeTableInput,
    DescribeTableOutput, GetItemInput, GetItemOutput, GetRecordsInput, GetRecordsOutput,
    GetShardIteratorInput, GetShardIteratorOutput, ListStreamsInput, ListStreamsOutput,
    ListTablesInput, ListTablesOutput, PutItemInput, PutItemOutput, QueryInput, QueryOutput,
    ScanInput, ScanOutput, UpdateItemInput, UpdateItemOutput, UpdateTableInput, UpdateTableOutput,
};

/// Identity of one request kind. The set is closed; condition matching is a
/// tag comparison, never structural guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateTable,
    DeleteTable,
    UpdateTable,
    DescribeTable,
    ListTables,
    PutItem,
    GetItem,
    DeleteItem,
    UpdateItem,
    BatchGetItem,
    BatchWriteItem,
    Query,
    Scan,
    DescribeStream,
    ListStreams,
    GetShardIterator,
    GetRecords,
}

impl OperationKind {
    /// All kinds, in wire-documentation order.
    pub const ALL: [Self; 17] = [
        Self::CreateTable,
        Self::DeleteTable,
        Self::UpdateTable,
        Self::DescribeTable,
        Self::ListTables,
        Self::PutItem,
        Self::GetItem,
        Self::DeleteItem,
        Self::UpdateItem,
        Self::BatchGetItem,
        Self::BatchWriteItem,
        Self::Query,
        Self::Scan,
        Self::DescribeStream,
        Self::ListStreams,
        Self::GetShardIterator,
        Self::GetRecords,
    ];

    /// Wire name of the operation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTable => "CreateTable",
            Self::DeleteTable => "DeleteTable",
            Self::UpdateTable => "UpdateTable",
            Self::DescribeTable => "DescribeTable",
            Self::ListTables => "ListTables",
            Self::PutItem => "PutItem",
            Self::GetItem => "GetItem",
            Self::DeleteItem => "DeleteItem",
            Self::UpdateItem => "UpdateItem",
            Self::BatchGetItem => "BatchGetItem",
            Self::BatchWriteItem => "BatchWriteItem",
            Self::Query => "Query",
            Self::Scan => "Scan",
            Self::DescribeStream => "DescribeStream",
            Self::ListStreams => "ListStreams",
            Self::GetShardIterator => "GetShardIterator",
            Self::GetRecords => "GetRecords",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {s}"))
    }
}

/// One decoded request with its typed payload.
#[derive(Debug, Clone)]
pub enum Operation {
    CreateTable(CreateTableInput),
    DeleteTable(DeleteTableInput),
    UpdateTable(UpdateTableInput),
    DescribeTable(DescribeTableInput),
    ListTables(ListTablesInput),
    PutItem(PutItemInput),
    GetItem(GetItemInput),
    DeleteItem(DeleteItemInput),
    UpdateItem(UpdateItemInput),
    BatchGetItem(BatchGetItemInput),
    BatchWriteItem(BatchWriteItemInput),
    Query(QueryInput),
    Scan(ScanInput),
    DescribeStream(DescribeStreamInput),
    ListStreams(ListStreamsInput),
    GetShardIterator(GetShardIteratorInput),
    GetRecords(GetRecordsInput),
}

impl Operation {
    /// Tag identity of this request.
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::CreateTable(_) => OperationKind::CreateTable,
            Self::DeleteTable(_) => OperationKind::DeleteTable,
            Self::UpdateTable(_) => OperationKind::UpdateTable,
            Self::DescribeTable(_) => OperationKind::DescribeTable,
            Self::ListTables(_) => OperationKind::ListTables,
            Self::PutItem(_) => OperationKind::PutItem,
            Self::GetItem(_) => OperationKind::GetItem,
            Self::DeleteItem(_) => OperationKind::DeleteItem,
            Self::UpdateItem(_) => OperationKind::UpdateItem,
            Self::BatchGetItem(_) => OperationKind::BatchGetItem,
            Self::BatchWriteItem(_) => OperationKind::BatchWriteItem,
            Self::Query(_) => OperationKind::Query,
            Self::Scan(_) => OperationKind::Scan,
            Self::DescribeStream(_) => OperationKind::DescribeStream,
            Self::ListStreams(_) => OperationKind::ListStreams,
            Self::GetShardIterator(_) => OperationKind::GetShardIterator,
            Self::GetRecords(_) => OperationKind::GetRecords,
        }
    }
}

/// One engine response. Serializes untagged: the wire body is the inner
/// output struct alone.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    CreateTable(CreateTableOutput),
    DeleteTable(DeleteTableOutput),
    UpdateTable(UpdateTableOutput),
    DescribeTable(DescribeTableOutput),
    ListTables(ListTablesOutput),
    PutItem(PutItemOutput),
    GetItem(GetItemOutput),
    DeleteItem(DeleteItemOutput),
    UpdateItem(UpdateItemOutput),
    BatchGetItem(BatchGetItemOutput),
    BatchWriteItem(BatchWriteItemOutput),
    Query(QueryOutput),
    Scan(ScanOutput),
    DescribeStream(DescribeStreamOutput),
    ListStreams(ListStreamsOutput),
    GetShardIterator(GetShardIteratorOutput),
    GetRecords(GetRecordsOutput),
}
