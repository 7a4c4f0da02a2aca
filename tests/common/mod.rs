#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use shopfront::api::ApiClient;
use shopfront::config::Settings;
use shopfront::network::{Response, Transport, TransportError};

pub const HOST: &str = "http://shop.test";

pub enum Step {
    Respond(Response),
    Fail(String),
    /// Waits for the sender, but gives up when the request is cancelled.
    Hold(oneshot::Receiver<Response>),
    /// Waits for the sender and ignores cancellation, like a transport that
    /// cannot abort once the bytes are on their way.
    Stubborn(oneshot::Receiver<Response>),
}

/// Transport that replays scripted steps per URL, in order.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, uri: &str, step: Step) {
        let url = Settings::with_host(HOST).api_url(uri);
        self.steps.lock().unwrap().entry(url).or_default().push_back(step);
    }

    pub fn respond(&self, uri: &str, status: u16, body: Option<Value>) {
        self.push(uri, Step::Respond(Response::new(status, body)));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Response, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        let step = self.steps.lock().unwrap().get_mut(url).and_then(VecDeque::pop_front);
        match step {
            None => Err(TransportError::Network(format!("nothing scripted for {url}"))),
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(TransportError::Network(message)),
            Some(Step::Hold(rx)) => tokio::select! {
                _ = cancel.cancelled() => Err(TransportError::Canceled),
                response = rx => response.map_err(|_| TransportError::Network("sender dropped".into())),
            },
            Some(Step::Stubborn(rx)) => rx.await.map_err(|_| TransportError::Network("sender dropped".into())),
        }
    }
}

pub fn client(transport: Arc<ScriptedTransport>) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(Settings::with_host(HOST), transport))
}

/// Lets spawned tasks run until `done` holds.
pub async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
