use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
