use async_trait::async_trait;

use vidar_protocol::{ToolCall, ToolSyntax};

/// The result of executing a tool.
///
/// `is_error` marks non-fatal failures: the content is still folded back
/// into the conversation so the model can adapt.  Nothing a tool returns
/// aborts the orchestration loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: false }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { content: msg.into(), is_error: true }
    }
}

/// Trait that every built-in and user-defined tool must implement.
///
/// `syntax()` declares the XML wire shape: it drives both the parser's
/// required-parameter validation and the tool-use section of the system
/// prompt.  Errors should be wrapped in [`ToolOutput::err`], never
/// propagated.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn syntax(&self) -> ToolSyntax;
    async fn execute(&self, call: &ToolCall) -> ToolOutput;
}
