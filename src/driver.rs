//! JSON-over-HTTP bridge to an external UI driver process
//!
//! The driver owns the real interface (browser, agent, whatever it is) and
//! exposes one endpoint per actuator operation:
//!
//! | operation       | request                         | response                     |
//! |-----------------|---------------------------------|------------------------------|
//! | `act`           | `POST /act {instruction}`       | any 2xx                      |
//! | `locate`        | `POST /locate {instruction}`    | `{"candidates": [..]}`       |
//! | `invoke`        | `POST /invoke {descriptor}`     | any 2xx                      |
//! | `fill`          | `POST /fill {descriptor, text}` | any 2xx                      |
//! | `read_text`     | `POST /text {descriptor}`       | `{"text": ".."}`             |
//! | `wait_for`      | `POST /wait {condition, timeout_ms}` | 2xx, or 408 on timeout  |
//! | `mark`          | `POST /mark {candidates}`       | any 2xx                      |
//! | `clear_marks`   | `POST /clear`                   | any 2xx                      |
//! | `capture`       | `POST /capture {label}`         | `{"text": ".." or null}`     |
//! | `read_location` | `GET /location`                 | `{"location": ".."}`         |

use std::time::Duration;

use action_primitives::{
    ActionError, Actuator, Descriptor, Instruction, Location, WaitCondition,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::DriverConfig;

pub struct HttpActuator {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct LocateResponse {
    #[serde(default)]
    candidates: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    location: String,
}

#[derive(Debug, Serialize)]
struct WaitRequest<'a> {
    condition: &'a WaitCondition,
    timeout_ms: u64,
}

impl HttpActuator {
    pub fn new(config: &DriverConfig) -> Result<Self, ActionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ActionError::Internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        on_status: fn(String) -> ActionError,
    ) -> Result<Response, ActionError> {
        let response = request
            .send()
            .await
            .map_err(|err| ActionError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response unavailable>".to_string());
        Err(classify_status(status, body, on_status))
    }

    async fn post_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        on_status: fn(String) -> ActionError,
    ) -> Result<(), ActionError> {
        self.send(self.client.post(self.url(path)).json(body), on_status)
            .await
            .map(|_| ())
    }

    async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        on_status: fn(String) -> ActionError,
    ) -> Result<R, ActionError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .send(self.client.post(self.url(path)).json(body), on_status)
            .await?;
        response
            .json()
            .await
            .map_err(|err| ActionError::Internal(format!("invalid {path} response: {err}")))
    }
}

fn classify_status(
    status: StatusCode,
    body: String,
    on_status: fn(String) -> ActionError,
) -> ActionError {
    let message = format!("driver returned {status}: {body}");
    match status.as_u16() {
        408 | 504 => ActionError::WaitTimeout(message),
        501 => ActionError::Unsupported(message),
        _ if status.is_server_error() => ActionError::Transport(message),
        _ => on_status(message),
    }
}

#[async_trait]
impl Actuator for HttpActuator {
    #[instrument(skip_all, fields(instruction = %instruction))]
    async fn act(&self, instruction: &Instruction) -> Result<(), ActionError> {
        self.post_unit("act", &json!({ "instruction": instruction }), ActionError::ActFailed)
            .await
    }

    #[instrument(skip_all, fields(instruction = %instruction))]
    async fn locate(&self, instruction: &Instruction) -> Result<Vec<Descriptor>, ActionError> {
        let response: LocateResponse = self
            .post_json(
                "locate",
                &json!({ "instruction": instruction }),
                ActionError::LocateFailed,
            )
            .await?;
        debug!(candidates = response.candidates.len(), "driver located candidates");
        Ok(response.candidates.into_iter().map(Descriptor::new).collect())
    }

    async fn invoke(&self, descriptor: &Descriptor) -> Result<(), ActionError> {
        self.post_unit(
            "invoke",
            &json!({ "descriptor": descriptor.as_value() }),
            ActionError::InvokeFailed,
        )
        .await
    }

    async fn fill(&self, descriptor: &Descriptor, text: &str) -> Result<(), ActionError> {
        self.post_unit(
            "fill",
            &json!({ "descriptor": descriptor.as_value(), "text": text }),
            ActionError::InvokeFailed,
        )
        .await
    }

    async fn read_location(&self) -> Result<Location, ActionError> {
        let response = self
            .send(self.client.get(self.url("location")), ActionError::Transport)
            .await?;
        let body: LocationResponse = response
            .json()
            .await
            .map_err(|err| ActionError::Internal(format!("invalid location response: {err}")))?;
        Location::try_new(body.location).map_err(|err| ActionError::Internal(err.to_string()))
    }

    async fn wait_for(
        &self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), ActionError> {
        let body = WaitRequest {
            condition,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };
        self.post_unit("wait", &body, ActionError::WaitTimeout).await
    }

    async fn read_text(&self, descriptor: &Descriptor) -> Result<String, ActionError> {
        let response: TextResponse = self
            .post_json(
                "text",
                &json!({ "descriptor": descriptor.as_value() }),
                ActionError::LocateFailed,
            )
            .await?;
        Ok(response.text)
    }

    async fn mark(&self, candidates: &[Descriptor]) -> Result<(), ActionError> {
        let values: Vec<&Value> = candidates.iter().map(Descriptor::as_value).collect();
        self.post_unit("mark", &json!({ "candidates": values }), ActionError::Internal)
            .await
    }

    async fn clear_marks(&self) -> Result<(), ActionError> {
        self.post_unit("clear", &json!({}), ActionError::Internal).await
    }

    #[instrument(skip_all, fields(label = %label))]
    async fn capture(&self, label: &str) -> Result<Option<String>, ActionError> {
        let response: CaptureResponse = self
            .post_json("capture", &json!({ "label": label }), ActionError::Internal)
            .await?;
        Ok(response.text.filter(|text| !text.trim().is_empty()))
    }
}
