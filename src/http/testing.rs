//! Scripted transport for unit tests

use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned outcomes in order and records every request
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then(self, outcome: Result<HttpResponse>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub(crate) fn then_status(self, status: u16) -> Self {
        self.then(Ok(HttpResponse::new(status, "")))
    }

    pub(crate) fn then_timeout(self) -> Self {
        self.then(Err(Error::Timeout { timeout_ms: 60_000 }))
    }

    pub(crate) fn then_page(self, results: Vec<Value>, next: Option<&str>) -> Self {
        let body = json!({ "results": results, "next": next }).to_string();
        self.then(Ok(HttpResponse::new(200, body)))
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other(format!("unscripted request to {}", request.url))))
    }
}

/// Records `{"id": i, "date_filed": date}` for ids in `ids`
pub(crate) fn opinions(ids: std::ops::Range<u64>, date: &str) -> Vec<Value> {
    ids.map(|id| json!({ "id": id, "date_filed": date })).collect()
}
