//! Test drivers and draft builders for the quality crate.

#![allow(dead_code)]

use async_trait::async_trait;
use chronicler_core::{GenerateRequest, GenerateResponse, Usage};
use chronicler_error::{ChroniclerResult, GenerationError, GenerationErrorKind};
use chronicler_interface::GenerationDriver;
use chronicler_models::GenerationClient;
use chronicler_rate_limit::{RateLimitConfig, RateLimiter, RetryPolicy};
use std::collections::VecDeque;
use std::sync::Mutex;

const DIALOGUE_LINE: &str = "\"Hold the gate until the bells ring again,\" Mira said.";
const INTERIOR_LINE: &str = "She wondered whether the old wall would hold through the night.";
const DESCRIPTION_LINE: &str = "Rain drummed on the slate roofs of the lower town below.";

/// A draft of `dialogue` speech lines (8 quoted words plus a 2-word tag),
/// `interior` thought lines and `description` lines (11 words each), one
/// paragraph per line.
pub fn chapter(dialogue: usize, interior: usize, description: usize) -> String {
    let mut lines = Vec::new();
    lines.extend(std::iter::repeat_n(DIALOGUE_LINE, dialogue));
    lines.extend(std::iter::repeat_n(INTERIOR_LINE, interior));
    lines.extend(std::iter::repeat_n(DESCRIPTION_LINE, description));
    lines.join("\n\n")
}

/// Driver that replays scripted texts and records every prompt.
pub struct EditorDriver {
    replies: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl EditorDriver {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `text` once the script runs out.
    pub fn with_fallback(mut self, text: String) -> Self {
        self.fallback = Some(text);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("lock")
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl GenerationDriver for EditorDriver {
    async fn generate(&self, req: &GenerateRequest) -> ChroniclerResult<GenerateResponse> {
        self.requests.lock().expect("lock").push(req.clone());
        let next = self.replies.lock().expect("lock").pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(text) => Ok(GenerateResponse {
                text,
                usage: Usage::default(),
            }),
            None => Err(GenerationError::new(GenerationErrorKind::InvalidInput(
                "script exhausted".to_string(),
            ))
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "editor"
    }

    fn model_name(&self) -> &str {
        "editor-model"
    }
}

pub fn client(driver: EditorDriver) -> GenerationClient<EditorDriver> {
    let limiter = RateLimiter::new(&RateLimitConfig::default()).expect("valid limiter");
    GenerationClient::new(driver, limiter, RetryPolicy::default())
}
