use action_flow::{ActionRequest, RetryPolicy};
use tracing::{info, instrument, warn};

use super::instructions as text;
use super::session::AssessmentSession;
use crate::errors::WorkflowError;

impl AssessmentSession {
    /// `false` ends the assessment loop
    #[instrument(skip_all, fields(completed = self.state.assessments_completed))]
    pub(super) async fn assessment_available(&mut self) -> Result<bool, WorkflowError> {
        if let Some(limit) = self.settings.max_assessments {
            if self.state.assessments_completed >= limit {
                warn!(limit, "assessment limit reached; stopping");
                return Ok(false);
            }
        }
        let available = self.is_present(text::START_BUTTON).await?;
        if !available {
            info!(
                completed = self.state.assessments_completed,
                "no further assessments available"
            );
        }
        Ok(available)
    }

    /// Start the assessment, passing the key prompt when one appears
    #[instrument(skip_all)]
    pub(super) async fn start_assessment(&mut self) -> Result<(), WorkflowError> {
        self.click(text::CLICK_START, text::START_BUTTON).await?;

        if self.is_present(text::KEY_FIELD).await? {
            let Some(key) = self.settings.assessment_key.clone() else {
                return Err(self.structural("assessment key requested but none is configured"));
            };
            let request = ActionRequest::sensitive(text::type_assessment_key(&key), text::KEY_FIELD)
                .with_input(key);
            let policy = self.settings.click_policy;
            self.perform(&request, &policy)
                .await
                .map_err(|err| self.structural(err))?;
            self.click(text::CLICK_VERIFY, text::VERIFY_BUTTON).await?;
            info!("assessment key submitted");
        }

        if self.is_present(text::START_ASSESSMENT_BUTTON).await? {
            self.click(text::CLICK_START_ASSESSMENT, text::START_ASSESSMENT_BUTTON)
                .await?;
        }

        let location = self.read_location().await.map_err(|err| self.structural(err))?;
        if location.contains(&self.settings.home_marker) {
            return Err(self.structural(format!(
                "returned to the landing page ({location}) instead of starting"
            )));
        }
        info!(%location, "assessment started");
        Ok(())
    }

    /// End the test and confirm the prompt when it appears
    #[instrument(skip_all)]
    pub(super) async fn end_assessment(&mut self) -> Result<(), WorkflowError> {
        let policy = self.settings.click_policy;
        let end = ActionRequest::volatile(text::CLICK_END_TEST).with_locate_hint(text::END_TEST_BUTTON);
        self.perform(&end, &policy)
            .await
            .map_err(|err| self.structural(err))?;

        if self.is_present(text::CONFIRM_END_PROMPT).await? {
            let confirm = ActionRequest::volatile(text::CLICK_CONFIRM_YES)
                .with_locate_hint(text::CONFIRM_YES_BUTTON);
            self.perform(&confirm, &policy)
                .await
                .map_err(|err| self.structural(err))?;
        } else {
            warn!("no confirmation prompt after End Test");
        }
        info!(
            completed = self.state.assessments_completed + 1,
            "assessment ended"
        );
        Ok(())
    }

    /// Best effort: move past a question that could not be answered
    pub(super) async fn skip_question(&mut self) {
        let request = ActionRequest::volatile(text::CLICK_SAVE_NEXT).with_locate_hint(text::SAVE_NEXT_BUTTON);
        if let Err(err) = self.perform(&request, &RetryPolicy::single()).await {
            warn!(%err, "could not advance past failed question");
        }
    }
}
