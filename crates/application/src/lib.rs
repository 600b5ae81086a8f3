//! Application layer - dispatch and failure injection
//!
//! Contains the data-engine port, the process-wide failure state, and the
//! intercepting handler that sits between the transport and the engine.

pub mod error;
pub mod fault_state;
pub mod interceptor;
pub mod ports;

pub use error::ApplicationError;
pub use fault_state::FailureState;
pub use interceptor::InterceptingHandler;
pub use ports::*;
