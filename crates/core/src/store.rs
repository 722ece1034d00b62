//! Conversation store trait: where an agent's history lives.
//!
//! The agent itself is stateless. If a store is configured, the loop loads
//! the prior conversation at the start of every invocation and saves the net
//! `(input, final answer)` pair once the model produces free text. Tool
//! traffic generated mid-loop is never handed to the store.
//!
//! Implementations that are shared by concurrent invocations must make each
//! `save` atomic on their own; the loop does not lock around load/save.

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::message::Message;

/// The core ConversationStore trait.
///
/// Implementations: `BufferMemory` (in-process buffer).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The store name (e.g., "buffer").
    fn name(&self) -> &str;

    /// Everything accumulated so far, oldest first. Empty on a fresh store.
    async fn load(&self) -> std::result::Result<Vec<Message>, MemoryError>;

    /// Record one completed exchange. The store decides how many messages
    /// the exchange becomes.
    async fn save(&self, input: &str, output: &str) -> std::result::Result<(), MemoryError>;
}
