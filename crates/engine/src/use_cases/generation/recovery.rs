//! Recovery of structured records from model output that may not parse.
//!
//! Recovery is an ordered list of [`RepairStrategy`] values. Each produces a
//! candidate text from the raw output; [`run_cascade`] parses candidates in
//! order and stops at the first mapping. When every stage fails the caller's
//! fallback is returned, so recovery itself never fails.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lootforge_domain::ParsedRecord;

use super::prompts::{FIX_JSON_MAX_TOKENS, FIX_JSON_SYSTEM};
use crate::repositories::BackendClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStage {
    /// Parse the raw text as-is
    Direct,
    /// Ask the text backend to rewrite it as valid JSON
    BackendRepair,
    /// Escape stray backslashes and quotes
    Sanitize,
}

impl RepairStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::BackendRepair => "backend_repair",
            Self::Sanitize => "sanitize",
        }
    }
}

impl fmt::Display for RepairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: RepairStage,
    pub reason: String,
}

/// What a cascade run produced: the first successful stage (if any) and every
/// failure before it.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub recovered: Option<(RepairStage, ParsedRecord)>,
    pub failures: Vec<StageFailure>,
}

/// One step of the cascade.
#[async_trait]
pub trait RepairStrategy: Send + Sync {
    fn stage(&self) -> RepairStage;

    /// Text to parse for this stage, or `None` if the stage produced nothing.
    async fn candidate(&self, raw: &str) -> Option<String>;
}

pub struct DirectParse;

#[async_trait]
impl RepairStrategy for DirectParse {
    fn stage(&self) -> RepairStage {
        RepairStage::Direct
    }

    async fn candidate(&self, raw: &str) -> Option<String> {
        Some(raw.trim().to_string())
    }
}

pub struct BackendRepair {
    backend: Arc<BackendClient>,
}

impl BackendRepair {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl RepairStrategy for BackendRepair {
    fn stage(&self) -> RepairStage {
        RepairStage::BackendRepair
    }

    async fn candidate(&self, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }
        let repaired = self
            .backend
            .generate_text(FIX_JSON_SYSTEM, raw, FIX_JSON_MAX_TOKENS)
            .await;
        if repaired.is_empty() {
            return None;
        }
        Some(extract_json_block(&repaired))
    }
}

pub struct Sanitize;

#[async_trait]
impl RepairStrategy for Sanitize {
    fn stage(&self) -> RepairStage {
        RepairStage::Sanitize
    }

    async fn candidate(&self, raw: &str) -> Option<String> {
        Some(sanitize_json(raw.trim()))
    }
}

/// Try each strategy in order; stop at the first candidate that parses to a mapping.
pub async fn run_cascade(raw: &str, strategies: &[Box<dyn RepairStrategy>]) -> CascadeOutcome {
    let mut failures = Vec::new();

    for strategy in strategies {
        let stage = strategy.stage();
        let Some(candidate) = strategy.candidate(raw).await else {
            failures.push(StageFailure {
                stage,
                reason: "stage produced no candidate".to_string(),
            });
            continue;
        };

        match ParsedRecord::parse(&candidate) {
            Ok(record) => {
                return CascadeOutcome {
                    recovered: Some((stage, record)),
                    failures,
                }
            }
            Err(e) => failures.push(StageFailure {
                stage,
                reason: e.to_string(),
            }),
        }
    }

    CascadeOutcome {
        recovered: None,
        failures,
    }
}

/// Always returns a usable mapping.
pub struct RecoveryEngine {
    strategies: Vec<Box<dyn RepairStrategy>>,
}

impl RecoveryEngine {
    /// Direct parse, then backend repair, then sanitizer.
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self::with_strategies(vec![
            Box::new(DirectParse),
            Box::new(BackendRepair::new(backend)),
            Box::new(Sanitize),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn RepairStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn recover(&self, raw: &str, fallback: ParsedRecord) -> ParsedRecord {
        let outcome = run_cascade(raw, &self.strategies).await;

        for failure in &outcome.failures {
            tracing::warn!(
                stage = %failure.stage,
                reason = %failure.reason,
                "Recovery stage failed"
            );
        }

        match outcome.recovered {
            Some((stage, record)) => {
                if stage != RepairStage::Direct {
                    tracing::info!(stage = %stage, "Recovered structured output");
                }
                record
            }
            None => {
                tracing::error!(
                    raw_len = raw.len(),
                    stages = outcome.failures.len(),
                    "All recovery stages failed, using fallback"
                );
                fallback
            }
        }
    }
}

/// Escape every backslash that does not start a JSON escape, then every
/// double quote not already preceded by a backslash.
pub fn sanitize_json(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        escaped.push(c);
        if c == '\\'
            && !matches!(
                chars.peek(),
                Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')
            )
        {
            escaped.push('\\');
        }
    }

    let mut out = String::with_capacity(escaped.len());
    let mut prev = None;
    for c in escaped.chars() {
        if c == '"' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Extract JSON from a response that might have markdown code blocks or extra text.
pub fn extract_json_block(response: &str) -> String {
    if let Some(start) = response.find("```json") {
        if let Some(end) = response[start + 7..].find("```") {
            return response[start + 7..start + 7 + end].trim().to_string();
        }
    }

    if let Some(start) = response.find("```") {
        if let Some(end) = response[start + 3..].find("```") {
            return response[start + 3..start + 3 + end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return response[start..=end].to_string();
        }
    }

    response.trim().to_string()
}
