//! Shared test helpers for agent loop tests.

use incant_core::backend::{Backend, BackendReply, ToolSpec};
use incant_core::error::{MemoryError, ProviderError};
use incant_core::message::Message;
use incant_core::store::ConversationStore;
use incant_memory::BufferMemory;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the backend was handed on one call.
#[derive(Clone)]
pub struct RecordedCall {
    pub turns: Vec<Message>,
    pub tools: Vec<ToolSpec>,
}

/// A mock backend that returns a sequence of scripted replies.
///
/// Each call to `generate` returns the next reply in the queue and records
/// the turns and catalog it was given.
/// Panics if more calls are made than replies provided.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<BackendReply, ProviderError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<BackendReply>) -> Self {
        Self::with_results(replies.into_iter().map(Ok).collect())
    }

    pub fn with_results(replies: Vec<Result<BackendReply, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A backend that answers once with `text`.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![BackendReply::text(text)])
    }

    /// A backend that first calls `tool`, then answers with `answer`.
    pub fn tool_then_answer(tool: &str, arguments: Value, answer: &str) -> Self {
        Self::new(vec![
            BackendReply::tool_call(tool, object(arguments)),
            BackendReply::text(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(
        &self,
        turns: &[Message],
        tools: &[ToolSpec],
    ) -> Result<BackendReply, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedCall {
            turns: turns.to_vec(),
            tools: tools.to_vec(),
        });

        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            panic!(
                "ScriptedBackend: no more replies (call #{})",
                calls.len()
            )
        })
    }
}

/// A buffer store that also counts `save` calls and remembers their arguments.
#[derive(Default)]
pub struct CountingStore {
    pub inner: BufferMemory,
    saves: Mutex<Vec<(String, String)>>,
}

impl CountingStore {
    pub fn with_history(messages: Vec<Message>) -> Self {
        Self {
            inner: BufferMemory::with_history(messages),
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn saves(&self) -> Vec<(String, String)> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ConversationStore for CountingStore {
    fn name(&self) -> &str {
        "counting"
    }

    async fn load(&self) -> Result<Vec<Message>, MemoryError> {
        self.inner.load().await
    }

    async fn save(&self, input: &str, output: &str) -> Result<(), MemoryError> {
        self.saves
            .lock()
            .unwrap()
            .push((input.to_string(), output.to_string()));
        self.inner.save(input, output).await
    }
}

/// Unwrap a `json!` object literal into an argument map.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
