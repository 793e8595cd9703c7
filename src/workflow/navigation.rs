use action_flow::ActionRequest;
use tracing::{info, instrument};

use super::session::AssessmentSession;
use crate::errors::WorkflowError;

impl AssessmentSession {
    /// Walk the configured menu steps from the landing page to the
    /// assessment list
    #[instrument(skip_all)]
    pub(super) async fn open_assessment_list(&mut self) -> Result<(), WorkflowError> {
        let policy = self.settings.click_policy;
        for step in self.settings.navigation.clone() {
            let request = ActionRequest::new(step);
            self.perform(&request, &policy)
                .await
                .map_err(|err| self.structural(err))?;
        }

        let location = self.read_location().await.map_err(|err| self.structural(err))?;
        if location.contains(&self.settings.home_marker) {
            return Err(self.structural(format!(
                "still on the landing page ({location}) after navigation"
            )));
        }
        info!(%location, "assessment list open");
        Ok(())
    }
}
