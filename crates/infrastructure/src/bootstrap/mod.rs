//! Storage bootstrap strategies
//!
//! The engine becomes usable after a platform-specific initialization step.
//! Which step that is depends on the build: the default in-memory engine is
//! statically linked and needs nothing, while an accelerated build has to
//! locate and load a native library before serving. Both live behind the
//! same interface so the façade does not care which one it runs.

mod native_library;

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

pub use native_library::NativeLibraryBootstrap;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The search exhausted every candidate directory.
    #[error("no loadable {library} found anywhere under {root}")]
    LibraryNotFound { library: String, root: PathBuf },

    /// The search anchor could not be determined.
    #[error("cannot determine the library search root: {0}")]
    NoSearchRoot(String),
}

/// Startup precondition of the storage engine. Implementations must be
/// idempotent: `start()` may run them any number of times.
pub trait StorageBootstrap: Send + Sync {
    fn ensure_ready(&self) -> Result<(), BootstrapError>;
}

/// Bootstrap for the statically linked in-memory engine. Probing trivially
/// succeeds; this is the default strategy of the façade.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledBootstrap;

impl BundledBootstrap {
    pub const fn new() -> Self {
        Self
    }
}

impl StorageBootstrap for BundledBootstrap {
    fn ensure_ready(&self) -> Result<(), BootstrapError> {
        debug!("storage engine is statically linked, nothing to load");
        Ok(())
    }
}
