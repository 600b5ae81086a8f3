//! Intercepting handler
//!
//! Wraps the data engine. Every inbound operation first consults the failure
//! state: with no active failure (or an inert one) the request is forwarded
//! untouched and the engine's result or error returned verbatim; with a
//! matching active failure the configured error is raised instead and the
//! engine is never called.

use std::sync::Arc;

use domain::{Operation, OperationOutput};
use tracing::debug;

use crate::error::ApplicationError;
use crate::fault_state::FailureState;
use crate::ports::DataEnginePort;

/// Dispatch layer between the transport and the engine.
#[derive(Clone)]
pub struct InterceptingHandler {
    engine: Arc<dyn DataEnginePort>,
    failure: Arc<FailureState>,
}

impl InterceptingHandler {
    /// Wrap an engine with the given failure state.
    pub fn new(engine: Arc<dyn DataEnginePort>, failure: Arc<FailureState>) -> Self {
        Self { engine, failure }
    }

    /// The shared failure state this handler consults.
    pub fn failure_state(&self) -> &Arc<FailureState> {
        &self.failure
    }

    /// Handle one operation: inject the active failure when it applies,
    /// forward to the engine otherwise. Never mutates the failure state.
    pub async fn handle(&self, op: Operation) -> Result<OperationOutput, ApplicationError> {
        if let Some(spec) = self.failure.snapshot() {
            if spec.applies_to(&op) {
                debug!(
                    kind = %op.kind(),
                    status = spec.status_code,
                    code = %spec.error_code,
                    "raising injected failure"
                );
                return Err(ApplicationError::Injected {
                    status_code: spec.status_code,
                    error_code: spec.error_code.clone(),
                    error_message: spec.error_message.clone(),
                });
            }
        }
        self.forward(op).await
    }

    async fn forward(&self, op: Operation) -> Result<OperationOutput, ApplicationError> {
        let output = match op {
            Operation::CreateTable(input) => {
                OperationOutput::CreateTable(self.engine.create_table(input).await?)
            },
            Operation::DeleteTable(input) => {
                OperationOutput::DeleteTable(self.engine.delete_table(input).await?)
            },
            Operation::UpdateTable(input) => {
                OperationOutput::UpdateTable(self.engine.update_table(input).await?)
            },
            Operation::DescribeTable(input) => {
                OperationOutput::DescribeTable(self.engine.describe_table(input).await?)
            },
            Operation::ListTables(input) => {
                OperationOutput::ListTables(self.engine.list_tables(input).await?)
            },
            Operation::PutItem(input) => {
                OperationOutput::PutItem(self.engine.put_item(input).await?)
            },
            Operation::GetItem(input) => {
                OperationOutput::GetItem(self.engine.get_item(input).await?)
            },
            Operation::DeleteItem(input) => {
                OperationOutput::DeleteItem(self.engine.delete_item(input).await?)
            },
            Operation::UpdateItem(input) => {
                OperationOutput::UpdateItem(self.engine.update_item(input).await?)
            },
            Operation::BatchGetItem(input) => {
                OperationOutput::BatchGetItem(self.engine.batch_get_item(input).await?)
            },
            Operation::BatchWriteItem(input) => {
                OperationOutput::BatchWriteItem(self.engine.batch_write_item(input).await?)
            },
            Operation::Query(input) => OperationOutput::Query(self.engine.query(input).await?),
            Operation::Scan(input) => OperationOutput::Scan(self.engine.scan(input).await?),
            Operation::DescribeStream(input) => {
                OperationOutput::DescribeStream(self.engine.describe_stream(input).await?)
            },
            Operation::ListStreams(input) => {
                OperationOutput::ListStreams(self.engine.list_streams(input).await?)
            },
            Operation::GetShardIterator(input) => {
                OperationOutput::GetShardIterator(self.engine.get_shard_iterator(input).await?)
            },
            Operation::GetRecords(input) => {
                OperationOutput::GetRecords(self.engine.get_records(input).await?)
            },
        };
        Ok(output)
    }
}

impl std::fmt::Debug for InterceptingHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptingHandler")
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use domain::requests::{
        CreateTableInput, DeleteTableInput, DeleteTableOutput, ListTablesInput, ListTablesOutput,
    };
    use domain::table::{
        AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput,
        ScalarAttributeType, TableDescription, TableStatus,
    };
    use domain::{DomainError, ErrorCondition, ErrorSpec};

    use super::*;
    use crate::ports::MockDataEnginePort;

    fn handler_with(
        engine: MockDataEnginePort,
        failure: &Arc<FailureState>,
    ) -> InterceptingHandler {
        InterceptingHandler::new(Arc::new(engine), Arc::clone(failure))
    }

    fn create_table_op(name: &str) -> Operation {
        Operation::CreateTable(CreateTableInput {
            table_name: name.to_string(),
            attribute_definitions: vec![AttributeDefinition {
                attribute_name: "id".to_string(),
                attribute_type: ScalarAttributeType::S,
            }],
            key_schema: vec![KeySchemaElement {
                attribute_name: "id".to_string(),
                key_type: KeyType::Hash,
            }],
            provisioned_throughput: None,
            stream_specification: None,
        })
    }

    fn list_tables_op() -> Operation {
        Operation::ListTables(ListTablesInput::default())
    }

    fn table_description(name: &str) -> TableDescription {
        TableDescription {
            table_name: name.to_string(),
            attribute_definitions: Vec::new(),
            key_schema: Vec::new(),
            table_status: TableStatus::Active,
            creation_date_time: chrono::Utc::now(),
            provisioned_throughput: ProvisionedThroughput::default(),
            item_count: 0,
            latest_stream_id: None,
        }
    }

    #[tokio::test]
    async fn clear_state_forwards_to_the_engine() {
        let mut engine = MockDataEnginePort::new();
        engine
            .expect_list_tables()
            .times(1)
            .returning(|_| {
                Ok(ListTablesOutput {
                    table_names: vec!["orders".to_string()],
                    last_evaluated_table_name: None,
                })
            });
        let failure = Arc::new(FailureState::new());
        let handler = handler_with(engine, &failure);

        let output = handler.handle(list_tables_op()).await.unwrap();
        let OperationOutput::ListTables(out) = output else {
            unreachable!("expected a ListTables output");
        };
        assert_eq!(out.table_names, vec!["orders".to_string()]);
    }

    #[tokio::test]
    async fn forwards_the_input_verbatim() {
        let mut engine = MockDataEnginePort::new();
        engine
            .expect_delete_table()
            .withf(|input| input.table_name == "orders")
            .times(1)
            .returning(|_| {
                Ok(DeleteTableOutput {
                    table_description: TableDescription {
                        table_name: "orders".to_string(),
                        attribute_definitions: Vec::new(),
                        key_schema: Vec::new(),
                        table_status: TableStatus::Deleting,
                        creation_date_time: chrono::Utc::now(),
                        provisioned_throughput: ProvisionedThroughput::default(),
                        item_count: 0,
                        latest_stream_id: None,
                    },
                })
            });
        let failure = Arc::new(FailureState::new());
        let handler = handler_with(engine, &failure);

        let op = Operation::DeleteTable(DeleteTableInput {
            table_name: "orders".to_string(),
        });
        handler.handle(op).await.unwrap();
    }

    #[tokio::test]
    async fn engine_errors_propagate_unchanged() {
        let mut engine = MockDataEnginePort::new();
        engine
            .expect_create_table()
            .returning(|input| Err(DomainError::ResourceInUse(input.table_name)));
        let failure = Arc::new(FailureState::new());
        let handler = handler_with(engine, &failure);

        let err = handler.handle(create_table_op("orders")).await.unwrap_err();
        let ApplicationError::Engine(DomainError::ResourceInUse(name)) = err else {
            unreachable!("expected the engine error verbatim");
        };
        assert_eq!(name, "orders");
    }

    #[tokio::test]
    async fn unconditioned_failure_blocks_every_kind() {
        // The engine must never be reached; no expectations are set.
        let engine = MockDataEnginePort::new();
        let failure = Arc::new(FailureState::new());
        failure.force(
            ErrorSpec::new(501)
                .with_error_code("errorCode")
                .with_error_message("errorMessage"),
        );
        let handler = handler_with(engine, &failure);

        for op in [create_table_op("t"), list_tables_op()] {
            let err = handler.handle(op).await.unwrap_err();
            let ApplicationError::Injected {
                status_code,
                error_code,
                error_message,
            } = err
            else {
                unreachable!("expected the injected failure");
            };
            assert_eq!(status_code, 501);
            assert_eq!(error_code, "errorCode");
            assert_eq!(error_message, "errorMessage");
        }
    }

    #[tokio::test]
    async fn conditioned_failure_is_inert_for_other_kinds() {
        let mut engine = MockDataEnginePort::new();
        engine.expect_list_tables().times(1).returning(|_| {
            Ok(ListTablesOutput {
                table_names: Vec::new(),
                last_evaluated_table_name: None,
            })
        });
        let failure = Arc::new(FailureState::new());
        failure.force(
            ErrorSpec::new(501).with_condition(ErrorCondition::create_table(|_| true)),
        );
        let handler = handler_with(engine, &failure);

        // ListTables passes through; CreateTable is rejected.
        handler.handle(list_tables_op()).await.unwrap();
        let err = handler.handle(create_table_op("t")).await.unwrap_err();
        assert!(err.is_injected());
    }

    #[tokio::test]
    async fn false_predicate_forwards_to_the_engine() {
        let mut engine = MockDataEnginePort::new();
        engine
            .expect_create_table()
            .times(1)
            .returning(|input| {
                let name = input.table_name;
                Ok(domain::requests::CreateTableOutput {
                    table_description: table_description(&name),
                })
            });
        let failure = Arc::new(FailureState::new());
        failure.force(ErrorSpec::new(501).with_condition(ErrorCondition::create_table(
            |input| input.table_name == "poison",
        )));
        let handler = handler_with(engine, &failure);

        handler.handle(create_table_op("fine")).await.unwrap();
    }

    #[tokio::test]
    async fn clearing_restores_forwarding() {
        let mut engine = MockDataEnginePort::new();
        engine.expect_list_tables().times(1).returning(|_| {
            Ok(ListTablesOutput {
                table_names: Vec::new(),
                last_evaluated_table_name: None,
            })
        });
        let failure = Arc::new(FailureState::new());
        failure.force(ErrorSpec::new(503));
        let handler = handler_with(engine, &failure);

        assert!(handler.handle(list_tables_op()).await.is_err());
        failure.clear();
        handler.handle(list_tables_op()).await.unwrap();
    }

    #[tokio::test]
    async fn handler_never_mutates_the_failure_state() {
        let engine = MockDataEnginePort::new();
        let failure = Arc::new(FailureState::new());
        failure.force(ErrorSpec::new(501));
        let handler = handler_with(engine, &failure);

        let _ = handler.handle(list_tables_op()).await;
        let _ = handler.handle(create_table_op("t")).await;
        assert!(failure.is_active());
        assert_eq!(failure.snapshot().unwrap().status_code, 501);
    }
}
