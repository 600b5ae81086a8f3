//! Port definitions for the application layer
//!
//! Ports are interfaces that define how the dispatch layer interacts with
//! external systems. Adapters in the infrastructure layer implement them.

mod data_engine;

#[cfg(test)]
pub use data_engine::MockDataEnginePort;
pub use data_engine::DataEnginePort;
