use action_flow::ActionRequest;
use action_primitives::{wait_until, WaitCondition};
use tracing::{debug, info, instrument};

use super::instructions as text;
use super::session::AssessmentSession;
use crate::errors::WorkflowError;

impl AssessmentSession {
    /// Reach the login page, submit credentials and confirm the portal let
    /// us past it
    #[instrument(skip_all)]
    pub(super) async fn authenticate(&mut self) -> Result<(), WorkflowError> {
        if self.settings.username.is_empty() || self.settings.password.is_empty() {
            return Err(self.structural("username and password must be configured"));
        }
        let login = self.settings.login_location.clone();

        let here = self.read_location().await.map_err(|err| self.structural(err))?;
        if here != login {
            debug!(%here, %login, "opening login page");
            let request = ActionRequest::volatile(text::navigate_to(&login));
            let policy = self.settings.navigation_policy;
            self.perform(&request, &policy)
                .await
                .map_err(|err| self.structural(err))?;
        }

        let policy = self.settings.click_policy;
        let username = ActionRequest::sensitive(
            text::type_username(&self.settings.username),
            text::USERNAME_FIELD,
        )
        .with_input(self.settings.username.clone());
        let password = ActionRequest::sensitive(
            text::type_password(&self.settings.password),
            text::PASSWORD_FIELD,
        )
        .with_input(self.settings.password.clone());
        for request in [username, password] {
            self.perform(&request, &policy)
                .await
                .map_err(|err| self.structural(err))?;
        }
        self.click(text::CLICK_LOGIN, text::LOGIN_BUTTON).await?;

        let condition = WaitCondition::LocationChanged {
            from: login.clone(),
        };
        let changed = wait_until(
            self.executor.actuator().as_ref(),
            &condition,
            self.settings.login_wait,
        )
        .await
        .map_err(|err| self.structural(err))?;

        let after = self.read_location().await.map_err(|err| self.structural(err))?;
        if after == login {
            return Err(self.structural(format!(
                "still at {login} after submitting credentials"
            )));
        }
        info!(location = %after, changed, "logged in");
        Ok(())
    }
}
