//! Session configuration
//!
//! Every section deserializes with defaults so a partial YAML file (or none
//! at all) yields a usable configuration. Secrets can be supplied through
//! `PILOT_*` environment variables instead of the file.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use action_flow::{ExecutorConfig, RetryPolicy};
use answer_engine::{OpenAiConfig, OptionMatcher};
use pilot_core_types::Instruction;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

const REDACTED: &str = "***";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid portal.login_url: {0}")]
    LoginUrl(#[from] url::ParseError),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub portal: PortalConfig,
    pub credentials: CredentialsConfig,
    pub assessment: AssessmentConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub timing: TimingConfig,
    pub matching: MatchingConfig,
    pub oracle: OracleConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub login_url: String,
    /// Substring of the landing page location; still seeing it after
    /// navigation means the menu clicks did not take effect
    pub home_marker: String,
    /// Instructions performed in order to reach the assessment list
    pub navigation: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: "https://grms.gardencity.university/login.htm".to_string(),
            home_marker: "home.htm".to_string(),
            navigation: vec![
                "Click on Academic Functions in the navigation menu".to_string(),
                "Click on Online Assessment in the Academic Functions menu".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub key: Option<String>,
    pub question_count: u32,
    pub max_consecutive_failures: u32,
    /// Safety cap on the assessment loop; unset means "until none are left"
    pub max_assessments: Option<u32>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            key: None,
            question_count: 10,
            max_consecutive_failures: 3,
            max_assessments: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cache/action-cache.json"),
            ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub click_attempts: u32,
    pub navigation_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            click_attempts: 3,
            navigation_attempts: 5,
            base_delay_ms: 1000,
        }
    }
}

/// Waits, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub settle_ms: u64,
    pub mark_settle_ms: u64,
    pub transition_ms: u64,
    pub probe_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub login_wait_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 1000,
            mark_settle_ms: 500,
            transition_ms: 2000,
            probe_timeout_ms: 10_000,
            poll_interval_ms: 500,
            login_wait_ms: 10_000,
        }
    }
}

impl TimingConfig {
    /// Every wait set to zero; for in-process actuators
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            mark_settle_ms: 0,
            transition_ms: 0,
            probe_timeout_ms: 0,
            poll_interval_ms: 0,
            login_wait_ms: 0,
        }
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn login_wait(&self) -> Duration {
        Duration::from_millis(self.login_wait_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub min_token_len: usize,
    pub similarity_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let matcher = OptionMatcher::default();
        Self {
            min_token_len: matcher.min_token_len,
            similarity_threshold: matcher.similarity_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let defaults = OpenAiConfig::default();
        Self {
            api_keys: defaults.api_keys,
            model: defaults.model,
            api_base: defaults.api_base,
            temperature: defaults.temperature,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4010".to_string(),
            timeout_secs: 60,
        }
    }
}

impl PilotConfig {
    /// Overlay `PILOT_*` environment variables onto the loaded values
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_value("PILOT_USERNAME") {
            self.credentials.username = value;
        }
        if let Some(value) = env_value("PILOT_PASSWORD") {
            self.credentials.password = value;
        }
        if let Some(value) = env_value("PILOT_ASSESSMENT_KEY") {
            self.assessment.key = Some(value);
        }
        if let Some(value) = env_value("PILOT_DRIVER_URL") {
            self.driver.endpoint = value;
        }
        if let Some(value) = env_value("PILOT_ORACLE_API_KEY") {
            self.oracle.api_keys = value
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = env_value("PILOT_ORACLE_MODEL") {
            self.oracle.model = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.portal.login_url.trim().is_empty() {
            return Err(ConfigError::invalid("portal.login_url", "must not be empty"));
        }
        Url::parse(&self.portal.login_url)?;
        if self.portal.home_marker.trim().is_empty() {
            return Err(ConfigError::invalid("portal.home_marker", "must not be empty"));
        }
        for step in &self.portal.navigation {
            Instruction::try_new(step.as_str())
                .map_err(|err| ConfigError::invalid("portal.navigation", err.to_string()))?;
        }
        if self.assessment.question_count == 0 {
            return Err(ConfigError::invalid(
                "assessment.question_count",
                "must be at least 1",
            ));
        }
        if self.assessment.max_consecutive_failures == 0 {
            return Err(ConfigError::invalid(
                "assessment.max_consecutive_failures",
                "must be at least 1",
            ));
        }
        if self.retry.click_attempts == 0 || self.retry.navigation_attempts == 0 {
            return Err(ConfigError::invalid("retry", "attempt counts must be at least 1"));
        }
        let threshold = self.matching.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::invalid(
                "matching.similarity_threshold",
                format!("{threshold} is outside (0, 1]"),
            ));
        }
        Ok(())
    }

    /// Copy safe to print: secrets replaced by a placeholder
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.credentials.password.is_empty() {
            copy.credentials.password = REDACTED.to_string();
        }
        if copy.assessment.key.is_some() {
            copy.assessment.key = Some(REDACTED.to_string());
        }
        copy.oracle.api_keys = copy
            .oracle
            .api_keys
            .iter()
            .map(|_| REDACTED.to_string())
            .collect();
        copy
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            settle: Duration::from_millis(self.timing.settle_ms),
            mark_settle: Duration::from_millis(self.timing.mark_settle_ms),
            poll_interval: Duration::from_millis(self.timing.poll_interval_ms),
        }
    }

    pub fn click_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.click_attempts, self.base_delay())
    }

    pub fn navigation_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.navigation_attempts, self.base_delay())
    }

    pub fn matcher(&self) -> OptionMatcher {
        OptionMatcher::new(self.matching.min_token_len, self.matching.similarity_threshold)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_keys: self.oracle.api_keys.clone(),
            model: self.oracle.model.clone(),
            api_base: self.oracle.api_base.clone(),
            temperature: self.oracle.temperature,
            timeout: Duration::from_secs(self.oracle.timeout_secs),
        }
    }

    fn base_delay(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }
}

fn env_value(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            debug!(variable = name, "configuration overridden from environment");
            Some(value.trim().to_string())
        }
        _ => None,
    }
}
