//! Buffer memory: the reference conversation store.
//!
//! Keeps every exchange in process memory. Each `save` appends one `user`
//! and one `model` message under a single write lock, so concurrent
//! invocations sharing one buffer never interleave half an exchange.

use async_trait::async_trait;
use incant_core::error::MemoryError;
use incant_core::message::Message;
use incant_core::store::ConversationStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// An in-memory conversation buffer. Cloning shares the same buffer.
#[derive(Clone, Default)]
pub struct BufferMemory {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl BufferMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a buffer with existing history.
    pub fn with_history(messages: Vec<Message>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(messages)),
        }
    }

    /// Number of stored messages.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Drop all history.
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }
}

#[async_trait]
impl ConversationStore for BufferMemory {
    fn name(&self) -> &str {
        "buffer"
    }

    async fn load(&self) -> Result<Vec<Message>, MemoryError> {
        Ok(self.messages.read().await.clone())
    }

    async fn save(&self, input: &str, output: &str) -> Result<(), MemoryError> {
        let mut messages = self.messages.write().await;
        messages.push(Message::user(input));
        messages.push(Message::model(output));
        debug!(total = messages.len(), "Saved exchange to buffer memory");
        Ok(())
    }
}
