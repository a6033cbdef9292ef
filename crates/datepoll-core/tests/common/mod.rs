//! Stub text generators shared by the async test files.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use datepoll_core::{DateParseError, Result, SanitizedPrompt, TextGenerator};

/// Replays scripted responses in order and counts calls. Once the script is
/// exhausted the last response repeats.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<SanitizedPrompt>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(body: &str) -> Arc<Self> {
        Self::new(vec![Ok(body.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<SanitizedPrompt> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

fn clone_result(r: &Result<String>) -> Result<String> {
    match r {
        Ok(s) => Ok(s.clone()),
        Err(DateParseError::ExternalService(m)) => Err(DateParseError::ExternalService(m.clone())),
        Err(DateParseError::Timeout(d)) => Err(DateParseError::Timeout(*d)),
        Err(DateParseError::SchemaViolation(m)) => Err(DateParseError::SchemaViolation(m.clone())),
        Err(DateParseError::Validation(m)) => Err(DateParseError::Validation(m.clone())),
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &SanitizedPrompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());

        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            clone_result(script.front().expect("script must not be empty"))
        }
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledGenerator {
    pub calls: AtomicUsize,
}

impl StalledGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for StalledGenerator {
    async fn generate(&self, _prompt: &SanitizedPrompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("{}".to_string())
    }
}

pub const CONFIDENT_FRIDAY: &str = r#"{
    "title": "Picnic",
    "confidence": 0.9,
    "dateRanges": [{"start": "2025-01-10", "end": "2025-01-10", "times": ["18:00"]}]
}"#;

pub const REFUSAL: &str = r#"{"title": "", "confidence": 0.05, "dateRanges": []}"#;
