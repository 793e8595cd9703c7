use std::time::Duration;

use action_flow::{ActionRequest, FlowError};
use answer_engine::ExtractError;
use pilot_core_types::Location;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::instructions as text;
use super::session::AssessmentSession;
use crate::errors::WorkflowError;
use crate::metrics;

/// A single question that could not be answered; counted, not fatal
#[derive(Debug, Error)]
pub(super) enum QuestionError {
    #[error("location unavailable: {0}")]
    Location(#[source] FlowError),

    #[error("left the assessment (now at {0})")]
    LeftAssessment(Location),

    #[error("question extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("could not select '{option}': {source}")]
    Select {
        option: String,
        #[source]
        source: FlowError,
    },

    #[error("could not save the answer: {0}")]
    Save(#[source] FlowError),
}

impl AssessmentSession {
    /// Answer `question_count` questions, tolerating isolated failures
    #[instrument(skip_all, fields(assessment = self.state.assessments_completed + 1))]
    pub(super) async fn answer_questions(&mut self) -> Result<(), WorkflowError> {
        self.state.consecutive_failures = 0;
        for number in 1..=self.settings.question_count {
            match self.answer_question(number).await {
                Ok(()) => {
                    self.state.questions_answered += 1;
                    self.state.consecutive_failures = 0;
                    metrics::record_question(true);
                }
                Err(err) => {
                    self.state.questions_failed += 1;
                    self.state.consecutive_failures += 1;
                    metrics::record_question(false);
                    warn!(
                        question = number,
                        consecutive = self.state.consecutive_failures,
                        %err,
                        "question failed"
                    );
                    if self.state.consecutive_failures >= self.settings.max_consecutive_failures {
                        return Err(WorkflowError::TooManyFailures {
                            consecutive: self.state.consecutive_failures,
                            last_question: number,
                        });
                    }
                    self.skip_question().await;
                }
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn answer_question(&mut self, number: u32) -> Result<(), QuestionError> {
        let location = self.read_location().await.map_err(QuestionError::Location)?;
        if location.contains(&self.settings.home_marker) {
            return Err(QuestionError::LeftAssessment(location));
        }

        let question = self
            .extractor
            .extract(self.executor.actuator().as_ref())
            .await?;
        let (response, ()) = tokio::join!(
            self.resolver.resolve(&question),
            pause(self.settings.transition)
        );
        metrics::record_answer(&response);
        if response.is_unmapped() {
            self.state.unmapped_answers += 1;
        }

        let policy = self.settings.click_policy;
        for option in response.selection_targets(&question) {
            let request = ActionRequest::volatile(text::select_option(&option));
            self.perform(&request, &policy)
                .await
                .map_err(|source| QuestionError::Select { option, source })?;
        }

        let save = ActionRequest::volatile(text::CLICK_SAVE_NEXT)
            .with_locate_hint(text::SAVE_NEXT_BUTTON);
        self.perform(&save, &policy)
            .await
            .map_err(QuestionError::Save)?;
        info!(
            question = number,
            selections = response.selections.len(),
            multi = response.is_multi_select,
            "question answered"
        );
        Ok(())
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
