use std::path::Path;
use std::sync::Arc;

use action_cache::ActionCache;
use action_flow::ResilientExecutor;
use action_primitives::Actuator;
use anyhow::{Context, Result};
use answer_engine::{AnswerResolver, Oracle};
use assess_pilot::metrics::{self, PrometheusObserver};
use assess_pilot::{AssessmentSession, PilotConfig, SessionReport, SessionSettings};
use tracing::info;

/// Wire executor, cache and resolver around `actuator` and run one session
pub async fn execute(
    config: &PilotConfig,
    actuator: Arc<dyn Actuator>,
    oracle: Arc<dyn Oracle>,
    settings: SessionSettings,
) -> Result<SessionReport> {
    let cache = Arc::new(ActionCache::with_ttl(config.cache_ttl()));
    let executor = ResilientExecutor::new(actuator, cache, config.executor_config())
        .with_observer(Arc::new(PrometheusObserver));
    let resolver = AnswerResolver::new(oracle).with_matcher(config.matcher());
    let mut session = AssessmentSession::new(executor, resolver, settings);

    let outcome = session.run().await;

    let totals = metrics::summary();
    info!(
        session = %session.id(),
        cached = totals.cached,
        direct = totals.direct,
        fallback = totals.fallback,
        answered = totals.questions_answered,
        failed = totals.questions_failed,
        "run totals"
    );
    Ok(outcome?)
}

pub fn print_report(report: &SessionReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

pub async fn write_metrics(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, metrics::render()?)
        .await
        .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    info!(path = %path.display(), "metrics written");
    Ok(())
}
