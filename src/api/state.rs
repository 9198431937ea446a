//! Application state for the API server

use crate::{Config, DebridTracker};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the tracker instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The tracker service
    pub tracker: Arc<DebridTracker>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(tracker: Arc<DebridTracker>, config: Arc<Config>) -> Self {
        Self { tracker, config }
    }
}
