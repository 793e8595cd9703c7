//! Metrics port for the executor

use crate::types::ActionPath;

/// Receives executor events; implementations must be cheap and non-blocking
pub trait ExecutorObserver: Send + Sync {
    fn record_path(&self, path: ActionPath);
    fn record_failure(&self, kind: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExecutorObserver for NoopObserver {
    fn record_path(&self, _path: ActionPath) {}
    fn record_failure(&self, _kind: &str) {}
}
