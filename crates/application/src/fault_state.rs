//! Process-wide injected-failure state
//!
//! One atomically-replaceable slot holding either nothing or the active
//! `ErrorSpec`. Writers replace the whole value; readers take a single
//! consistent snapshot per dispatched request, so no request ever observes a
//! half-written spec or straddles two generations of state.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use domain::ErrorSpec;

/// Shared failure slot, written by the façade and read by every worker.
#[derive(Debug, Default)]
pub struct FailureState {
    active: ArcSwapOption<ErrorSpec>,
}

impl FailureState {
    /// A state with no injected failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a failure spec, replacing whatever was active.
    /// Last writer wins; there is no merging and no queue.
    pub fn force(&self, spec: ErrorSpec) {
        self.active.store(Some(Arc::new(spec)));
    }

    /// Remove any active failure.
    pub fn clear(&self) {
        self.active.store(None);
    }

    /// Snapshot of the active failure, if any. One atomic load.
    pub fn snapshot(&self) -> Option<Arc<ErrorSpec>> {
        self.active.load_full()
    }

    /// Whether a failure is currently active.
    pub fn is_active(&self) -> bool {
        self.active.load().is_some()
    }
}
