//! Scripted driver shared by the generation client tests.

use async_trait::async_trait;
use chronicler_core::{EmbeddingTask, GenerateRequest, GenerateResponse, Usage};
use chronicler_error::{ChroniclerResult, GenerationError, GenerationErrorKind};
use chronicler_interface::{Embeddings, GenerationDriver};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(GenerationErrorKind),
    Hang,
}

/// Driver that replays a script and records when it was called.
pub struct ScriptedDriver {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    dimensions: usize,
    failing_inputs: Vec<String>,
}

impl ScriptedDriver {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Reply::Text("default reply".to_string()),
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
            dimensions: 4,
            failing_inputs: Vec::new(),
        }
    }

    /// Embedding calls containing any of these inputs fail with invalid input.
    pub fn with_failing_inputs(mut self, inputs: &[&str]) -> Self {
        self.failing_inputs = inputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn gaps(&self) -> Vec<Duration> {
        let times = self.call_times.lock().expect("lock");
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    fn next_reply(&self) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().expect("lock").push(Instant::now());
        self.script
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl GenerationDriver for ScriptedDriver {
    async fn generate(&self, req: &GenerateRequest) -> ChroniclerResult<GenerateResponse> {
        match self.next_reply() {
            Reply::Text(text) => Ok(GenerateResponse {
                text,
                usage: Usage {
                    prompt_tokens: req.prompt.len() as u64 / 4,
                    output_tokens: 10,
                },
            }),
            Reply::Fail(kind) => Err(GenerationError::new(kind).into()),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(GenerateResponse {
                    text: "too late".to_string(),
                    usage: Usage::default(),
                })
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

#[async_trait]
impl Embeddings for ScriptedDriver {
    async fn embed(
        &self,
        inputs: &[String],
        _task: EmbeddingTask,
    ) -> ChroniclerResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if inputs.iter().any(|i| self.failing_inputs.contains(i)) {
            return Err(GenerationError::new(GenerationErrorKind::InvalidInput(
                "unembeddable input".to_string(),
            ))
            .into());
        }
        Ok(inputs
            .iter()
            .map(|i| vec![i.len() as f32; self.dimensions])
            .collect())
    }

    fn embedding_dimensions(&self) -> usize {
        self.dimensions
    }

    fn max_batch_size(&self) -> usize {
        3
    }
}
