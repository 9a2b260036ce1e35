//! Error types for the support desk.
//!
//! Per-turn failures (a flaky completion backend, a bad handoff target, a
//! blocked reply) are recovered inside the orchestrator so the console loop
//! never dies on a single turn. The only fatal error is missing configuration
//! at startup.

use thiserror::Error;

/// Result type alias for the support desk.
pub type Result<T> = std::result::Result<T, SupportError>;

/// Main error type for the support desk.
#[derive(Debug, Error)]
pub enum SupportError {
    /// Error from the completion backend's API client.
    #[error("completion API error: {0}")]
    CompletionApi(#[from] async_openai::error::OpenAIError),

    /// The completion backend returned something we could not use.
    #[error("malformed completion response: {message}")]
    MalformedResponse { message: String },

    /// The completion backend did not answer within the configured deadline.
    #[error("completion timed out after {seconds}s")]
    CompletionTimeout { seconds: u64 },

    /// The completion backend is unreachable or rate limited.
    #[error("completion service unavailable: {message}")]
    CompletionUnavailable { message: String },

    /// A tool was requested that is not in the registry.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// An agent was referenced that is not in the roster.
    #[error("unknown agent: {name}")]
    UnknownAgent { name: String },

    /// A tool's action function failed while executing.
    #[error("tool execution error: {message}")]
    ToolExecutionError { message: String },

    /// Too many handoffs within a single turn.
    #[error("handoff limit exceeded: {max_handoffs}")]
    HandoffLimitExceeded { max_handoffs: usize },

    /// Required configuration is absent. Fatal at startup.
    #[error("missing configuration: {name}")]
    ConfigurationMissing { name: String },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
