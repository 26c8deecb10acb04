//! In-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use ipam::{ApiRequest, ApiResponse, ApiTransport, HttpMethod, IpamError, ServiceConfig};
use tokio::time::Instant;

/// Configuration pointing at `https://athena.test:443`.
pub fn config() -> ServiceConfig {
    ServiceConfig::new("athena.test", 443, "admin", "secret")
}

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub at: Instant,
}

/// Replays scripted responses per `(method, url)`.
///
/// Responses for one key are served in order; the last one repeats forever.
/// A request with no script fails with [`IpamError::Transport`].
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<(HttpMethod, String), VecDeque<ApiResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: HttpMethod, url: &str, status: u16, body: serde_json::Value) {
        self.respond_raw(method, url, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: HttpMethod, url: &str, status: u16, body: &str) {
        self.scripts
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(ApiResponse {
                status,
                body: body.to_string(),
            });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: HttpMethod, url: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.url == url)
            .collect()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, IpamError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method,
            url: request.url.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            at: Instant::now(),
        });

        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(&(request.method, request.url.clone()))
            .filter(|q| !q.is_empty())
            .ok_or_else(|| IpamError::Transport {
                method: request.method,
                url: request.url.clone(),
                message: "no scripted response".to_string(),
            })?;
        let response = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue[0].clone()
        };
        Ok(response)
    }
}
