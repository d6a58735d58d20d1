//! Scripted LLM doubles for pipeline tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::llm_mocks::ScriptedLlm;
//!
//! // Replies in order, then empty strings.
//! let llm = ScriptedLlm::new(vec!["Frostbrand", r#"{"rarity":"rare"}"#]);
//!
//! // Replies chosen by a substring of the system prompt.
//! let llm = ScriptedLlm::routed(vec![("short item name", "Frostbrand")]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

/// LLM double that replays canned completions and records every request.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<String>>,
    routes: Vec<(String, String)>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    /// Reply with `responses` in order; once exhausted every reply is empty.
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(String::from).collect()),
            routes: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with an empty completion.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Reply with the first route whose needle occurs in the system prompt.
    /// Unmatched requests get an empty completion.
    pub fn routed(routes: Vec<(&str, &str)>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            routes: routes
                .into_iter()
                .map(|(needle, reply)| (needle.to_string(), reply.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    /// Number of requests whose system prompt contains `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.system_prompt.as_deref().unwrap_or("").contains(needle))
            .count()
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let system = request.system_prompt.clone().unwrap_or_default();
        self.requests.lock().expect("requests lock").push(request);

        let content = if self.routes.is_empty() {
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_default()
        } else {
            self.routes
                .iter()
                .find(|(needle, _)| system.contains(needle.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_default()
        };

        Ok(LlmResponse {
            content,
            usage: None,
        })
    }
}

/// LLM double that always fails with the same error.
pub struct FailingLlm {
    error: LlmError,
    calls: AtomicUsize,
}

impl FailingLlm {
    pub fn new(error: LlmError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmPort for FailingLlm {
    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}
