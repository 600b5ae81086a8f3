//! HTTP middleware components

mod request_id;

pub use request_id::{RequestIdLayer, RequestIdService};
