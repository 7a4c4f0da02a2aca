//! The dispatcher every view goes through to reach the public API.
//!
//! Each call is keyed by its call name and URI in the [`RequestTracker`], so
//! firing the same call again (a user typing into search, say) cancels the
//! one still on the wire. Only the latest call of a key gets to write
//! its status to the [`StatusBoard`].

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::config::Settings;
use crate::error::ApiError;
use crate::network::{HttpTransport, Response, Transport, TransportError};
use crate::status::{CallName, CallStatus, StatusBoard};
use crate::tracker::{RequestKey, RequestTracker};
use crate::utils::final_log_line;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A response arrived and was classified.
    Completed {
        status: CallStatus,
        http_status: u16,
        status_text: String,
        data: Option<Value>,
    },
    /// The server could not be reached.
    Failed { message: String },
    /// A newer call with the same key took over. Status was left alone.
    Canceled,
}

impl Outcome {
    pub fn data(&self) -> Option<&Value> {
        match self {
            Outcome::Completed { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    /// The status this outcome wrote, if it wrote one.
    pub fn status(&self) -> Option<CallStatus> {
        match self {
            Outcome::Completed { status, .. } => Some(*status),
            Outcome::Failed { .. } => Some(CallStatus::Error),
            Outcome::Canceled => None,
        }
    }
}

pub struct ApiClient {
    settings: Settings,
    transport: Arc<dyn Transport>,
    tracker: RequestTracker,
    statuses: StatusBoard,
}

impl ApiClient {
    pub fn new(settings: Settings, transport: Arc<dyn Transport>) -> Self {
        Self { settings, transport, tracker: RequestTracker::new(), statuses: StatusBoard::new() }
    }

    /// Client over a real HTTP transport.
    pub fn from_settings(settings: Settings) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(settings.csrf_token.as_deref())
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self::new(settings, Arc::new(transport)))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn statuses(&self) -> &StatusBoard {
        &self.statuses
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// GETs `uri` under `call`, cancelling any earlier identical call still running.
    pub async fn dispatch(&self, uri: &str, call: CallName) -> Outcome {
        let started = Instant::now();
        let request = self.tracker.begin_request(RequestKey::for_call(call.as_str(), uri));
        self.statuses.set(call, CallStatus::Loading);

        let url = self.settings.api_url(uri);
        if self.settings.console_debug {
            tracing::debug!(%url, %call, "calling endpoint");
        }

        let result = self.transport.get(&url, &request.token).await;

        let outcome = match result {
            Err(TransportError::Canceled) => None,
            Err(TransportError::Network(message)) => self.tracker.complete(&request, || {
                self.statuses.set(call, CallStatus::Error);
                Outcome::Failed { message }
            }),
            Ok(response) => self.tracker.complete(&request, || {
                let status = classify(&response);
                self.statuses.set(call, status);
                Outcome::Completed {
                    status,
                    http_status: response.status,
                    status_text: response.status_text,
                    data: response.body,
                }
            }),
        };
        // Harmless if `complete` already dropped it.
        self.tracker.end_request(&request);

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => {
                if self.settings.console_debug {
                    tracing::debug!(%url, %call, "request aborted");
                }
                return Outcome::Canceled;
            }
        };

        match &outcome {
            Outcome::Failed { message } => tracing::warn!(%url, %call, error = %message, "API error"),
            Outcome::Completed { status: CallStatus::Error, http_status, status_text, .. } => {
                tracing::warn!(%url, %call, status = http_status, text = %status_text, "API call failed")
            }
            _ => {}
        }
        if self.settings.console_logging {
            let message = status_message(&outcome);
            tracing::info!("{}", final_log_line(call.as_str(), &url, started.elapsed().as_millis(), &message));
        }
        outcome
    }

    /// Plain GET keyed by method and URL. Leaves the status board alone.
    pub async fn get(&self, uri: &str) -> Result<Response, ApiError> {
        let url = self.settings.api_url(uri);
        let request = self.tracker.begin_request(RequestKey::from_method("get", &url));
        if self.settings.console_debug {
            tracing::debug!(%url, "calling endpoint");
        }
        let result = self.transport.get(&url, &request.token).await;
        let current = self.tracker.complete(&request, || ()).is_some();
        self.tracker.end_request(&request);
        match result {
            Err(TransportError::Canceled) => Err(ApiError::Canceled),
            Err(TransportError::Network(message)) => Err(ApiError::Transport(message)),
            Ok(_) if !current => Err(ApiError::Canceled),
            Ok(response) => Ok(response),
        }
    }
}

/// 200 with a structurally empty body is `Empty`, any other 200 is `Success`, the rest `Error`.
pub fn classify(response: &Response) -> CallStatus {
    match (response.status, &response.body) {
        (200, Some(body)) if is_empty_payload(body) => CallStatus::Empty,
        (200, _) => CallStatus::Success,
        _ => CallStatus::Error,
    }
}

/// `[]`, `{}`, or an envelope whose `data` has nothing in it.
pub fn is_empty_payload(body: &Value) -> bool {
    match body {
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty() || fields.get("data").is_some_and(is_zero_length),
        _ => false,
    }
}

fn is_zero_length(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn status_message(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Completed { status: CallStatus::Error, status_text, .. } => {
            format!("Status: error - Error: {status_text}")
        }
        Outcome::Completed { status, .. } => format!("Status: {status}"),
        Outcome::Failed { message } => format!("Status: error - Error: {message}"),
        Outcome::Canceled => "Status: canceled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_with_no_rows_is_empty() {
        assert!(is_empty_payload(&json!({ "data": [], "total": 0 })));
        assert!(is_empty_payload(&json!([])));
        assert!(is_empty_payload(&json!({})));
        assert!(!is_empty_payload(&json!({ "data": [{ "id": 1 }], "total": 1 })));
        assert!(!is_empty_payload(&json!({ "id": 1, "label_eng": "Chair" })));
        assert!(!is_empty_payload(&json!(0)));
    }

    #[test]
    fn classification_follows_status_then_shape() {
        assert_eq!(classify(&Response::ok(json!({ "data": [] }))), CallStatus::Empty);
        assert_eq!(classify(&Response::ok(json!({ "data": [1] }))), CallStatus::Success);
        assert_eq!(classify(&Response::new(200, None)), CallStatus::Success);
        assert_eq!(classify(&Response::new(404, Some(json!({ "data": [] })))), CallStatus::Error);
        assert_eq!(classify(&Response::new(201, Some(json!({ "id": 3 })))), CallStatus::Error);
    }

    #[test]
    fn status_message_names_the_failure() {
        let outcome = Outcome::Completed {
            status: CallStatus::Error,
            http_status: 500,
            status_text: "Internal Server Error".into(),
            data: None,
        };
        assert_eq!(status_message(&outcome), "Status: error - Error: Internal Server Error");
        assert_eq!(outcome.status(), Some(CallStatus::Error));
        assert_eq!(Outcome::Canceled.status(), None);
    }
}
