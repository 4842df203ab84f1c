/// Shared application state for the webserver
///
/// Route handlers reach the Mist engine and the configuration through here.
use crate::config::Config;
use crate::engine::Mist;
use std::sync::Arc;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration snapshot taken at startup
    pub config: Arc<Config>,

    /// Component and connection registries, store and renderer
    pub mist: Arc<Mist>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: Config, mist: Arc<Mist>) -> Self {
        Self {
            config: Arc::new(config),
            mist,
            startup_time: chrono::Utc::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }
}
