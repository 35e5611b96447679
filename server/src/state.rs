//! Application state shared by the route handlers

use ontotag::config::Config;
use ontotag::OntologyStore;
use std::time::Instant;

pub struct AppState {
    pub store: OntologyStore,
    pub started: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: OntologyStore::new(config),
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        self.store.config()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
