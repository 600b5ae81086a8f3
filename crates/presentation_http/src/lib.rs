//! MimicDB HTTP presentation layer
//!
//! The wire transport in front of the intercepting handler, plus the
//! embeddable `MimicServer` façade test code drives.

pub mod client;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod wire;

pub use client::{WireClient, WireError};
pub use error::ApiError;
pub use middleware::RequestIdLayer;
pub use routes::create_router;
pub use server::{InjectedFailure, MimicServer, ServerError};
pub use state::AppState;
