pub mod cli;
pub mod config;
pub mod focus;
pub mod ipc;
pub mod model;
pub mod store;

use std::sync::Arc;

use config::DaemonConfig;
use store::TaskStore;

/// Shared application state passed to every connection task.
///
/// Built once in `main` (or a test harness) and cloned into each spawned
/// connection handler — there is no ambient global state anywhere in the
/// daemon.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    /// The single task store instance. All connection tasks share it and
    /// rely on its internal lock for safety.
    pub store: Arc<TaskStore>,
}

impl AppContext {
    pub fn new(config: Arc<DaemonConfig>, store: Arc<TaskStore>) -> Self {
        Self { config, store }
    }
}
