use std::path::{Path, PathBuf};
use std::sync::Arc;

use assess_pilot::PilotConfig;

pub struct CliContext {
    config: Arc<PilotConfig>,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: PilotConfig, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &PilotConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
