//! Error types for the Incant domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator of the agent loop has its own error enum.

use thiserror::Error;

/// The top-level error type for all Incant operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Backend errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Conversation store errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Data model ---
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // --- Loop control ---
    #[error("Agent loop exceeded {limit} backend calls without a final answer")]
    IterationLimit { limit: u32 },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
