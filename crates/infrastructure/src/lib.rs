//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: the in-memory data
//! engine, the storage bootstrap strategies, and application configuration.

pub mod bootstrap;
pub mod config;
pub mod engine;

pub use bootstrap::{BootstrapError, BundledBootstrap, NativeLibraryBootstrap, StorageBootstrap};
pub use config::{AcceleratorConfig, AppConfig, ServerConfig};
pub use engine::MemoryEngine;
