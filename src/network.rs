use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// What came back from the server, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON body; `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl Response {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self { status, status_text, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("request canceled")]
    Canceled,
    #[error("{0}")]
    Network(String),
}

/// Issues GET requests that stop as soon as `cancel` fires.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Response, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(csrf_token: Option<&str>) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        match csrf_token {
            Some(token) => {
                let value = HeaderValue::from_str(token)
                    .map_err(|e| TransportError::Network(format!("invalid CSRF token: {e}")))?;
                headers.insert("X-CSRF-TOKEN", value);
            }
            None => tracing::warn!("CSRF token not configured"),
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Response, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Canceled);
        }
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Canceled),
            result = request => {
                let (status, bytes) = result.map_err(|e| TransportError::Network(e.to_string()))?;
                let body = serde_json::from_slice::<Value>(&bytes).ok();
                Ok(Response {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_follows_code() {
        assert_eq!(Response::new(503, None).status_text, "Service Unavailable");
        assert_eq!(Response::ok(Value::Null).status_text, "OK");
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let transport = HttpTransport::new(Some("token")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = transport.get("http://127.0.0.1:9/never", &cancel).await;
        assert_eq!(result, Err(TransportError::Canceled));
    }
}
