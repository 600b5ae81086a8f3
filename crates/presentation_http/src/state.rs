//! Application state shared across handlers

use std::sync::Arc;

use application::InterceptingHandler;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dispatch layer every wire request goes through
    pub handler: Arc<InterceptingHandler>,
}
