use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::SyncEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub index_file: PathBuf,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            engine: Arc::new(SyncEngine::new(config.limits)),
            index_file: config.public_dir.join("index.html"),
        }
    }
}
