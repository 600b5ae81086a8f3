//! Fault-injection value types
//!
//! `ErrorSpec` describes one synthetic failure; `ErrorCondition` scopes it to
//! a single operation kind; `ServiceErrorKind` is the catalog of predefined
//! failures. All three are immutable values — deriving a new spec never
//! mutates the one it came from.

use std::fmt;
use std::sync::Arc;

use crate::operation::{Operation, OperationKind};
use crate::requests::{
    BatchGetItemInput, BatchWriteItemInput, CreateTableInput, DeleteItemInput, DeleteTableInput,
    DescribeStreamInput, DescribeTableInput, GetItemInput, GetRecordsInput, GetShardIteratorInput,
    ListStreamsInput, ListTablesInput, PutItemInput, QueryInput, ScanInput, UpdateItemInput,
    UpdateTableInput,
};

/// Predicate over requests of one specific operation kind.
///
/// Construction goes through a kind-specific constructor, so the captured tag
/// always agrees with the input type the closure sees. A request of any other
/// kind short-circuits to "does not apply" before the closure runs.
#[derive(Clone)]
pub struct ErrorCondition {
    kind: OperationKind,
    predicate: Arc<dyn Fn(&Operation) -> bool + Send + Sync>,
}

macro_rules! condition_constructors {
    ($(($name:ident, $variant:ident, $input:ty)),+ $(,)?) => {
        $(
            #[doc = concat!("Condition scoped to `", stringify!($variant), "` requests.")]
            pub fn $name<F>(predicate: F) -> Self
            where
                F: Fn(&$input) -> bool + Send + Sync + 'static,
            {
                Self {
                    kind: OperationKind::$variant,
                    predicate: Arc::new(move |op| match op {
                        Operation::$variant(input) => predicate(input),
                        _ => false,
                    }),
                }
            }
        )+
    };
}

impl ErrorCondition {
    condition_constructors![
        (create_table, CreateTable, CreateTableInput),
        (delete_table, DeleteTable, DeleteTableInput),
        (update_table, UpdateTable, UpdateTableInput),
        (describe_table, DescribeTable, DescribeTableInput),
        (list_tables, ListTables, ListTablesInput),
        (put_item, PutItem, PutItemInput),
        (get_item, GetItem, GetItemInput),
        (delete_item, DeleteItem, DeleteItemInput),
        (update_item, UpdateItem, UpdateItemInput),
        (batch_get_item, BatchGetItem, BatchGetItemInput),
        (batch_write_item, BatchWriteItem, BatchWriteItemInput),
        (query, Query, QueryInput),
        (scan, Scan, ScanInput),
        (describe_stream, DescribeStream, DescribeStreamInput),
        (list_streams, ListStreams, ListStreamsInput),
        (get_shard_iterator, GetShardIterator, GetShardIteratorInput),
        (get_records, GetRecords, GetRecordsInput),
    ];

    /// The operation kind this condition applies to.
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Whether the condition fires for this request. The kind check comes
    /// first; the predicate is never evaluated against a foreign kind.
    pub fn matches(&self, op: &Operation) -> bool {
        self.kind == op.kind() && (self.predicate)(op)
    }
}

impl fmt::Debug for ErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCondition")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// One synthetic failure: status, code, message, and an optional scope.
#[derive(Debug, Clone)]
pub struct ErrorSpec {
    pub status_code: u16,
    pub error_code: String,
    pub error_message: String,
    pub condition: Option<ErrorCondition>,
}

impl ErrorSpec {
    /// A bare failure carrying only a status code.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            error_code: String::new(),
            error_message: String::new(),
            condition: None,
        }
    }

    /// Derive a spec with a different status code.
    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Derive a spec with a different error code.
    #[must_use]
    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = error_code.into();
        self
    }

    /// Derive a spec with a different error message.
    #[must_use]
    pub fn with_error_message(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = error_message.into();
        self
    }

    /// Derive a spec scoped by a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ErrorCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Whether this spec fires for the given request. An unconditioned spec
    /// applies to everything; a conditioned one only to matching requests of
    /// its own kind.
    pub fn applies_to(&self, op: &Operation) -> bool {
        match &self.condition {
            None => true,
            Some(condition) => condition.matches(op),
        }
    }
}

/// Catalog of predefined service failures. The single source of truth for
/// the status/code/message triples — nothing else repeats them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Throttling,
    ProvisionedThroughputExceeded,
    ConditionalCheckFailed,
    LimitExceeded,
    ResourceInUse,
    ResourceNotFound,
    Validation,
    MissingAuthenticationToken,
    InternalFailure,
    InternalServerError,
    ServiceUnavailable,
}

impl ServiceErrorKind {
    /// HTTP status of the catalog entry.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Throttling
            | Self::ProvisionedThroughputExceeded
            | Self::ConditionalCheckFailed
            | Self::LimitExceeded
            | Self::ResourceInUse
            | Self::ResourceNotFound
            | Self::Validation => 400,
            Self::MissingAuthenticationToken => 403,
            Self::InternalFailure | Self::InternalServerError => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    /// Wire error code of the catalog entry.
    pub const fn error_code(self) -> &'static str {
        match self {
            Self::Throttling => "ThrottlingException",
            Self::ProvisionedThroughputExceeded => "ProvisionedThroughputExceededException",
            Self::ConditionalCheckFailed => "ConditionalCheckFailedException",
            Self::LimitExceeded => "LimitExceededException",
            Self::ResourceInUse => "ResourceInUseException",
            Self::ResourceNotFound => "ResourceNotFoundException",
            Self::Validation => "ValidationException",
            Self::MissingAuthenticationToken => "MissingAuthenticationTokenException",
            Self::InternalFailure => "InternalFailure",
            Self::InternalServerError => "InternalServerError",
            Self::ServiceUnavailable => "ServiceUnavailableException",
        }
    }

    /// Human-readable message of the catalog entry.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Throttling => "Rate of requests exceeds the allowed throughput.",
            Self::ProvisionedThroughputExceeded => {
                "You exceeded your maximum allowed provisioned throughput."
            },
            Self::ConditionalCheckFailed => "The conditional request failed.",
            Self::LimitExceeded => "Too many operations for a given subscriber.",
            Self::ResourceInUse => "The resource which you are attempting to change is in use.",
            Self::ResourceNotFound => "The resource which is being requested does not exist.",
            Self::Validation => "One or more parameter values were invalid.",
            Self::MissingAuthenticationToken => {
                "Request must contain a valid (registered) access key ID."
            },
            Self::InternalFailure | Self::InternalServerError => {
                "The server encountered an internal error trying to fulfill the request."
            },
            Self::ServiceUnavailable => "The service is currently unavailable or busy.",
        }
    }

    /// The unconditioned spec for this catalog entry.
    pub fn spec(self) -> ErrorSpec {
        ErrorSpec::new(self.status_code())
            .with_error_code(self.error_code())
            .with_error_message(self.message())
    }
}
