//! In-memory index and model doubles shared by unit tests.

use crate::llm::semantic_search::{ScoredDocument, VectorIndex};
use crate::providers::traits::{Completion, CompletionProvider, Prompt};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

pub struct StubIndex {
    documents: Vec<ScoredDocument>,
    unavailable: bool,
    queries: Mutex<Vec<(String, u64)>>,
}

impl StubIndex {
    pub fn with_texts(texts: &[&str]) -> Self {
        let documents = texts
            .iter()
            .enumerate()
            .map(|(rank, text)| ScoredDocument {
                text: text.to_string(),
                score: 1.0 - rank as f32 * 0.1,
            })
            .collect();
        Self { documents, unavailable: false, queries: Mutex::new(Vec::new()) }
    }

    pub fn unavailable() -> Self {
        Self { documents: Vec::new(), unavailable: true, queries: Mutex::new(Vec::new()) }
    }

    pub fn queries(&self) -> Vec<(String, u64)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn search(&self, query: &str, k: u64) -> Result<Vec<ScoredDocument>> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        if self.unavailable {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.documents.iter().take(k as usize).cloned().collect())
    }
}

type Responder = Box<dyn Fn(&Prompt) -> Result<Completion> + Send + Sync>;

/// Records every prompt and answers through a deterministic responder.
pub struct StubModel {
    responder: Responder,
    prompts: Mutex<Vec<Prompt>>,
}

impl StubModel {
    pub fn new(responder: impl Fn(&Prompt) -> Result<Completion> + Send + Sync + 'static) -> Self {
        Self { responder: Box::new(responder), prompts: Mutex::new(Vec::new()) }
    }

    /// Grounded prompts get a fixed answer, critique prompts a "Yes" verdict,
    /// and any other raw prompt is echoed back.
    pub fn scripted() -> Self {
        Self::new(|prompt| {
            Ok(match prompt {
                Prompt::Messages(_) => Completion::text("Common symptoms include thirst and fatigue."),
                Prompt::Text(text) if text.starts_with("Question: ") => {
                    Completion::text("Yes. The answer addresses the question directly.")
                }
                Prompt::Text(text) => Completion::text(format!("Direct reply to: {}", text)),
            })
        })
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for StubModel {
    async fn complete(&self, prompt: &Prompt) -> Result<Completion> {
        self.prompts.lock().unwrap().push(prompt.clone());
        (self.responder)(prompt)
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}
