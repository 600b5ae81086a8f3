//! Domain layer for MimicDB
//!
//! Contains the operation model, the document model, fault-injection value
//! types, and domain errors. This layer has no async machinery and no I/O.

pub mod attribute;
pub mod errors;
pub mod fault;
pub mod operation;
pub mod requests;
pub mod table;

pub use attribute::{AttributeValue, Item, KeyValue, PrimaryKey};
pub use errors::DomainError;
pub use fault::{ErrorCondition, ErrorSpec, ServiceErrorKind};
pub use operation::{Operation, OperationKind, OperationOutput};
pub use requests::*;
pub use table::{
    AttributeDefinition, KeyDefinition, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType, StreamSpecification, StreamViewType, TableDescription, TableStatus,
};
