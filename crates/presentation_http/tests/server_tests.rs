//! End-to-end tests of the server façade over the wire protocol
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{create_table_input, start_server, string_item};
use domain::requests::{
    CreateTableOutput, DeleteTableInput, DeleteTableOutput, GetItemInput, GetItemOutput,
    GetRecordsInput, GetRecordsOutput, GetShardIteratorInput, GetShardIteratorOutput,
    ListStreamsInput, ListStreamsOutput, ListTablesInput, ListTablesOutput, PutItemInput,
    PutItemOutput, ShardIteratorType,
};
use domain::table::{StreamSpecification, StreamViewType};
use domain::{AttributeValue, OperationKind};

#[tokio::test]
async fn create_put_get_round_trips() {
    let mut ctx = start_server().await;

    let _: CreateTableOutput = ctx
        .client
        .call(OperationKind::CreateTable, &create_table_input("tableName", "key"))
        .await
        .unwrap();

    let _: PutItemOutput = ctx
        .client
        .call(
            OperationKind::PutItem,
            &PutItemInput {
                table_name: "tableName".to_string(),
                item: string_item(&[("key", "k1"), ("field", "f1")]),
                return_values: None,
            },
        )
        .await
        .unwrap();

    let found: GetItemOutput = ctx
        .client
        .call(
            OperationKind::GetItem,
            &GetItemInput {
                table_name: "tableName".to_string(),
                key: string_item(&[("key", "k1")]),
                consistent_read: None,
            },
        )
        .await
        .unwrap();

    let item = found.item.expect("the item should exist");
    assert_eq!(item["field"], AttributeValue::S("f1".to_string()));

    ctx.server.stop().await.unwrap();
}

#[tokio::test]
async fn list_tables_sees_created_tables() {
    let mut ctx = start_server().await;

    let _: CreateTableOutput = ctx
        .client
        .call(OperationKind::CreateTable, &create_table_input("tableName", "key"))
        .await
        .unwrap();

    let tables: ListTablesOutput = ctx
        .client
        .call(OperationKind::ListTables, &ListTablesInput::default())
        .await
        .unwrap();
    assert_eq!(tables.table_names, vec!["tableName".to_string()]);

    ctx.server.stop().await.unwrap();
}

#[tokio::test]
async fn missing_table_surfaces_resource_not_found() {
    let mut ctx = start_server().await;

    let err = ctx
        .client
        .call::<_, DeleteTableOutput>(
            OperationKind::DeleteTable,
            &DeleteTableInput {
                table_name: "ghost".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.error_code(), Some("ResourceNotFoundException"));

    ctx.server.stop().await.unwrap();
}

#[tokio::test]
async fn reset_wipes_tables_through_the_wire() {
    let mut ctx = start_server().await;

    for name in ["first", "second"] {
        let _: CreateTableOutput = ctx
            .client
            .call(OperationKind::CreateTable, &create_table_input(name, "key"))
            .await
            .unwrap();
    }
    ctx.server.fails_with_status(501);

    ctx.server.reset().await.unwrap();

    // Failure cleared and zero tables remain, observable by listing.
    let tables: ListTablesOutput = ctx
        .client
        .call(OperationKind::ListTables, &ListTablesInput::default())
        .await
        .unwrap();
    assert!(tables.table_names.is_empty());

    ctx.server.stop().await.unwrap();
}

#[tokio::test]
async fn two_servers_run_concurrently_and_independently() {
    let mut first = start_server().await;
    let mut second = start_server().await;
    assert_ne!(first.server.port(), second.server.port());

    // A table on the first server is invisible to the second.
    let _: CreateTableOutput = first
        .client
        .call(OperationKind::CreateTable, &create_table_input("tableName", "key"))
        .await
        .unwrap();
    let tables: ListTablesOutput = second
        .client
        .call(OperationKind::ListTables, &ListTablesInput::default())
        .await
        .unwrap();
    assert!(tables.table_names.is_empty());

    // A failure on the first server does not affect the second.
    first.server.fails_with_status(501);
    let _: ListTablesOutput = second
        .client
        .call(OperationKind::ListTables, &ListTablesInput::default())
        .await
        .unwrap();

    first.server.stop().await.unwrap();
    second.server.stop().await.unwrap();
}

#[tokio::test]
async fn stop_twice_is_idempotent() {
    let mut ctx = start_server().await;
    ctx.server.stop().await.unwrap();
    ctx.server.stop().await.unwrap();
}

#[tokio::test]
async fn change_records_are_readable_over_the_wire() {
    let mut ctx = start_server().await;

    let mut input = create_table_input("tableName", "key");
    input.stream_specification = Some(StreamSpecification {
        stream_enabled: true,
        stream_view_type: Some(StreamViewType::NewImage),
    });
    let created: CreateTableOutput = ctx
        .client
        .call(OperationKind::CreateTable, &input)
        .await
        .unwrap();
    assert!(created.table_description.latest_stream_id.is_some());

    let _: PutItemOutput = ctx
        .client
        .call(
            OperationKind::PutItem,
            &PutItemInput {
                table_name: "tableName".to_string(),
                item: string_item(&[("key", "k1")]),
                return_values: None,
            },
        )
        .await
        .unwrap();

    let streams: ListStreamsOutput = ctx
        .client
        .call(OperationKind::ListStreams, &ListStreamsInput::default())
        .await
        .unwrap();
    assert_eq!(streams.streams.len(), 1);

    let iterator: GetShardIteratorOutput = ctx
        .client
        .call(
            OperationKind::GetShardIterator,
            &GetShardIteratorInput {
                stream_id: streams.streams[0].stream_id.clone(),
                shard_id: "shard-0".to_string(),
                shard_iterator_type: ShardIteratorType::TrimHorizon,
                sequence_number: None,
            },
        )
        .await
        .unwrap();

    let records: GetRecordsOutput = ctx
        .client
        .call(
            OperationKind::GetRecords,
            &GetRecordsInput {
                shard_iterator: iterator.shard_iterator,
                limit: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(records.records.len(), 1);
    assert!(records.records[0].stream_record.new_image.is_some());

    ctx.server.stop().await.unwrap();
}
