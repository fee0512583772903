use async_trait::async_trait;

use crate::CompletionRequest;

/// Abstraction over the model backend.
///
/// The orchestrator only needs "given this history, produce the next
/// assistant message"; transport, streaming, and authentication live behind
/// concrete implementations outside this workspace.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name for status display.
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Produce the next assistant message for the given history.
    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String>;
}
