//! Prometheus counters for action paths, question outcomes and cache state

use action_cache::CacheStats;
use action_flow::{ActionPath, ExecutorObserver};
use answer_engine::AnswerResponse;
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use serde::Serialize;
use tracing::{debug, error};

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();
static ACTION_PATHS: OnceCell<IntCounterVec> = OnceCell::new();
static ACTION_FAILURES: OnceCell<IntCounterVec> = OnceCell::new();
static QUESTIONS: OnceCell<IntCounterVec> = OnceCell::new();
static ANSWERS: OnceCell<IntCounterVec> = OnceCell::new();
static CACHE_STATS: OnceCell<IntGaugeVec> = OnceCell::new();

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        let registry = global_registry();
        register_counter(
            registry,
            &ACTION_PATHS,
            "pilot_action_path_total",
            "Completed actions grouped by the path that succeeded",
            &["path"],
        );
        register_counter(
            registry,
            &ACTION_FAILURES,
            "pilot_action_failures_total",
            "Failed actuator calls grouped by error kind",
            &["kind"],
        );
        register_counter(
            registry,
            &QUESTIONS,
            "pilot_questions_total",
            "Assessment questions grouped by outcome",
            &["result"],
        );
        register_counter(
            registry,
            &ANSWERS,
            "pilot_answers_total",
            "Resolved answers grouped by source and mapping",
            &["source", "mapping"],
        );

        let gauges = IntGaugeVec::new(
            Opts::new("pilot_cache_stats", "Action cache counters at the end of a run"),
            &["stat"],
        )
        .expect("create cache stats gauge");
        if let Err(err) = registry.register(Box::new(gauges.clone())) {
            error!(?err, "failed to register cache stats gauge");
        }
        let _ = CACHE_STATS.set(gauges);
    });
}

fn register_counter(
    registry: &Registry,
    cell: &OnceCell<IntCounterVec>,
    name: &str,
    help: &str,
    labels: &[&str],
) {
    let counter = IntCounterVec::new(Opts::new(name, help), labels).expect("create counter");
    if let Err(err) = registry.register(Box::new(counter.clone())) {
        error!(?err, metric = name, "failed to register counter");
    }
    let _ = cell.set(counter);
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

pub fn record_action_path(path: ActionPath) {
    register_metrics();
    if let Some(counter) = ACTION_PATHS.get() {
        counter.with_label_values(&[path.as_str()]).inc();
    }
}

pub fn record_action_failure(kind: &str) {
    register_metrics();
    if let Some(counter) = ACTION_FAILURES.get() {
        counter.with_label_values(&[kind]).inc();
    }
    debug!(%kind, "action failure metric");
}

pub fn record_question(answered: bool) {
    register_metrics();
    if let Some(counter) = QUESTIONS.get() {
        let result = if answered { "answered" } else { "failed" };
        counter.with_label_values(&[result]).inc();
    }
}

pub fn record_answer(response: &AnswerResponse) {
    register_metrics();
    if let Some(counter) = ANSWERS.get() {
        let mapping = if response.is_unmapped() {
            "unmapped"
        } else {
            "mapped"
        };
        counter
            .with_label_values(&[response.source.as_str(), mapping])
            .inc();
    }
}

pub fn set_cache_stats(stats: &CacheStats) {
    register_metrics();
    if let Some(gauges) = CACHE_STATS.get() {
        for (stat, value) in [
            ("hits", stats.hits),
            ("misses", stats.misses),
            ("stores", stats.stores),
            ("invalidations", stats.invalidations),
            ("expired", stats.expired),
        ] {
            gauges
                .with_label_values(&[stat])
                .set(i64::try_from(value).unwrap_or(i64::MAX));
        }
    }
}

/// Process-wide totals for the end-of-run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSummary {
    pub cached: u64,
    pub direct: u64,
    pub fallback: u64,
    pub questions_answered: u64,
    pub questions_failed: u64,
}

pub fn summary() -> MetricsSummary {
    register_metrics();
    let path = |label: &str| {
        ACTION_PATHS
            .get()
            .map(|counter| counter.with_label_values(&[label]).get())
            .unwrap_or_default()
    };
    let questions = |label: &str| {
        QUESTIONS
            .get()
            .map(|counter| counter.with_label_values(&[label]).get())
            .unwrap_or_default()
    };
    MetricsSummary {
        cached: path(ActionPath::Cached.as_str()),
        direct: path(ActionPath::Direct.as_str()),
        fallback: path(ActionPath::Fallback.as_str()),
        questions_answered: questions("answered"),
        questions_failed: questions("failed"),
    }
}

/// Text exposition of every registered metric
pub fn render() -> anyhow::Result<String> {
    register_metrics();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&global_registry().gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Forwards executor events into the process registry
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusObserver;

impl ExecutorObserver for PrometheusObserver {
    fn record_path(&self, path: ActionPath) {
        record_action_path(path);
    }

    fn record_failure(&self, kind: &str) {
        record_action_failure(kind);
    }
}
