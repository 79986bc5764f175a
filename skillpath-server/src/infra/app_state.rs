use std::{fmt, sync::Arc};

use skillpath_config::Config;
use skillpath_core::{
    AppUnitOfWork, TrackingEngine, database::PostgresDatabase,
    domain::WatchPolicy,
};

#[derive(Clone)]
pub struct AppState {
    pub engine: TrackingEngine,
    pub config: Arc<Config>,
    /// Absent when the server runs on the in-memory adapters.
    pub postgres: Option<Arc<PostgresDatabase>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("policy", &self.engine.policy())
            .field("postgres", &self.postgres.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        unit_of_work: &AppUnitOfWork,
        policy: WatchPolicy,
        config: Arc<Config>,
        postgres: Option<Arc<PostgresDatabase>>,
    ) -> Self {
        Self {
            engine: TrackingEngine::new(unit_of_work, policy),
            config,
            postgres,
        }
    }

    pub fn engine(&self) -> &TrackingEngine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
