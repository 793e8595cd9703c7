use std::path::PathBuf;
use std::time::Duration;

use action_flow::{ActionOutcome, ActionRequest, FlowError, ResilientExecutor, RetryPolicy};
use answer_engine::{AnswerResolver, QuestionExtractor};
use pilot_core_types::{Fingerprint, Instruction, Location, SessionId};
use tracing::{debug, error, info, instrument, warn};

use super::state::{SessionReport, SessionState, WorkflowState};
use crate::config::PilotConfig;
use crate::errors::WorkflowError;
use crate::metrics;

/// Workflow parameters taken from the configuration at session start
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub login_location: Location,
    pub home_marker: String,
    pub navigation: Vec<Instruction>,
    pub username: String,
    pub password: String,
    pub assessment_key: Option<String>,
    pub question_count: u32,
    pub max_consecutive_failures: u32,
    pub max_assessments: Option<u32>,
    pub click_policy: RetryPolicy,
    pub navigation_policy: RetryPolicy,
    pub transition: Duration,
    pub probe_timeout: Duration,
    pub login_wait: Duration,
    /// Cache file restored before and persisted after the run
    pub cache_path: Option<PathBuf>,
}

impl SessionSettings {
    pub fn from_config(config: &PilotConfig) -> Self {
        Self {
            login_location: Location::new(config.portal.login_url.clone()),
            home_marker: config.portal.home_marker.clone(),
            navigation: config
                .portal
                .navigation
                .iter()
                .map(|step| Instruction::new(step.clone()))
                .collect(),
            username: config.credentials.username.clone(),
            password: config.credentials.password.clone(),
            assessment_key: config.assessment.key.clone(),
            question_count: config.assessment.question_count,
            max_consecutive_failures: config.assessment.max_consecutive_failures.max(1),
            max_assessments: config.assessment.max_assessments,
            click_policy: config.click_policy(),
            navigation_policy: config.navigation_policy(),
            transition: config.timing.transition(),
            probe_timeout: config.timing.probe_timeout(),
            login_wait: config.timing.login_wait(),
            cache_path: Some(config.cache.path.clone()),
        }
    }

    pub fn without_cache_file(mut self) -> Self {
        self.cache_path = None;
        self
    }
}

/// Drives one login-to-logout pass over the assessment portal
pub struct AssessmentSession {
    id: SessionId,
    pub(super) executor: ResilientExecutor,
    pub(super) resolver: AnswerResolver,
    pub(super) extractor: QuestionExtractor,
    pub(super) settings: SessionSettings,
    pub(super) state: SessionState,
}

impl AssessmentSession {
    pub fn new(
        executor: ResilientExecutor,
        resolver: AnswerResolver,
        settings: SessionSettings,
    ) -> Self {
        Self {
            id: SessionId::new(),
            executor,
            resolver,
            extractor: QuestionExtractor::default(),
            settings,
            state: SessionState::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: QuestionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> WorkflowState {
        self.state.state
    }

    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    pub fn report(&self) -> SessionReport {
        self.state.report()
    }

    pub fn executor(&self) -> &ResilientExecutor {
        &self.executor
    }

    /// Run the whole workflow; the cache file is restored first and
    /// persisted afterwards whatever the outcome
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn run(&mut self) -> Result<SessionReport, WorkflowError> {
        self.state = SessionState::default();
        if let Some(path) = &self.settings.cache_path {
            let restored = self.executor.cache().restore(path).await;
            info!(path = %path.display(), restored, "action cache restored");
        }

        let result = self.drive().await;

        if let Some(path) = &self.settings.cache_path {
            self.executor.cache().persist(path).await;
        }
        metrics::set_cache_stats(&self.executor.cache().stats());

        match result {
            Ok(()) => {
                let report = self.report();
                info!(
                    assessments = report.assessments_completed,
                    answered = report.questions_answered,
                    failed = report.questions_failed,
                    unmapped = report.unmapped_answers,
                    "session finished"
                );
                Ok(report)
            }
            Err(mut err) => {
                self.attach_capture(&mut err).await;
                error!(%err, "session failed");
                self.enter(WorkflowState::Failed);
                Err(err)
            }
        }
    }

    async fn drive(&mut self) -> Result<(), WorkflowError> {
        let mut next = WorkflowState::Authenticating;
        while !self.state.state.is_terminal() {
            self.enter(next);
            next = match next {
                WorkflowState::LoggedOut => WorkflowState::Authenticating,
                WorkflowState::Authenticating => {
                    self.authenticate().await?;
                    WorkflowState::Navigating
                }
                WorkflowState::Navigating => {
                    self.open_assessment_list().await?;
                    WorkflowState::AssessmentAvailable
                }
                WorkflowState::AssessmentAvailable => {
                    if self.assessment_available().await? {
                        WorkflowState::KeyVerification
                    } else {
                        WorkflowState::Done
                    }
                }
                WorkflowState::KeyVerification => {
                    self.start_assessment().await?;
                    WorkflowState::AssessmentRunning
                }
                WorkflowState::AssessmentRunning => {
                    self.answer_questions().await?;
                    WorkflowState::AssessmentEnding
                }
                WorkflowState::AssessmentEnding => {
                    self.end_assessment().await?;
                    self.state.assessments_completed += 1;
                    WorkflowState::AssessmentAvailable
                }
                WorkflowState::Done | WorkflowState::Failed => next,
            };
        }
        Ok(())
    }

    pub(super) fn enter(&mut self, state: WorkflowState) {
        if self.state.state != state {
            info!(from = %self.state.state, to = %state, "workflow transition");
            self.state.state = state;
        }
    }

    /// Best-effort diagnostic capture after a structural failure. Whatever
    /// the interface shows as an error is appended to the reason; a failed
    /// capture leaves the error untouched.
    async fn attach_capture(&self, err: &mut WorkflowError) {
        let WorkflowError::Structural { step, reason } = err else {
            return;
        };
        match self.executor.actuator().capture(step.as_str()).await {
            Ok(Some(shown)) => {
                info!(step = %step, %shown, "interface reported an error");
                reason.push_str("; portal shows: ");
                reason.push_str(&shown);
            }
            Ok(None) => debug!(step = %step, "diagnostic capture recorded"),
            Err(capture_err) => warn!(step = %step, %capture_err, "diagnostic capture failed"),
        }
    }

    pub(super) fn structural(&self, reason: impl ToString) -> WorkflowError {
        WorkflowError::structural(self.state.state, reason.to_string())
    }

    /// Read the live location and remember it
    pub(super) async fn read_location(&mut self) -> Result<Location, FlowError> {
        let location = self.executor.actuator().read_location().await?;
        self.state.current_location = Some(location.clone());
        Ok(location)
    }

    /// Perform under `policy`, scoped to the current location
    pub(super) async fn perform(
        &mut self,
        request: &ActionRequest,
        policy: &RetryPolicy,
    ) -> Result<ActionOutcome, FlowError> {
        let location = self.read_location().await?;
        let fingerprint = Fingerprint::new(location, request.instruction.clone());
        self.executor
            .perform_with_retry(request, &fingerprint, policy)
            .await
    }

    /// A structural click: cacheable, retried with the click policy
    pub(super) async fn click(
        &mut self,
        instruction: &str,
        target: &str,
    ) -> Result<ActionOutcome, WorkflowError> {
        let request = ActionRequest::new(instruction).with_locate_hint(target);
        let policy = self.settings.click_policy;
        self.perform(&request, &policy)
            .await
            .map_err(|err| self.structural(err))
    }

    /// Whether `target` shows up within the probe timeout
    pub(super) async fn is_present(&self, target: &str) -> Result<bool, WorkflowError> {
        let found = self
            .executor
            .probe_until(&Instruction::new(target), self.settings.probe_timeout)
            .await
            .map_err(|err| self.structural(err))?;
        if found.is_empty() {
            debug!(probe = target, "nothing found within probe timeout");
        }
        Ok(!found.is_empty())
    }
}
