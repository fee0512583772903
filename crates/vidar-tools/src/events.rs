use crate::todo::TodoItem;

/// Events emitted by stateful tools to communicate changes back to the
/// agent loop.  The agent translates these into `AgentEvent` variants for
/// its consumers.
#[derive(Debug, Clone)]
pub enum ToolEvent {
    TodoUpdate(Vec<TodoItem>),
    ModeChanged(String),
}
