mod batch;
mod builtin;
mod diff;
mod gate;
mod registry;
mod todo;
mod tool;

pub mod events;

pub use batch::{apply_batch, ApprovalHandler, ApprovalResponse, ApproveAll, FileDiff, FilePreview, PathOutcome, PathStatus};
pub use diff::{apply_diff, parse_blocks, AppliedDiff, DiffBlock, DiffError, FailedBlock};
pub use gate::{CommandDecision, CommandPolicy, Decision, PermissionGate};
pub use registry::ToolRegistry;
pub use todo::{TodoError, TodoItem, TodoList, TodoStatus};
pub use tool::{Tool, ToolOutput};

pub use builtin::ask_followup::AskFollowupTool;
pub use builtin::attempt_completion::AttemptCompletionTool;
pub use builtin::apply_diff::ApplyDiffTool;
pub use builtin::execute_command::ExecuteCommandTool;
pub use builtin::list_files::ListFilesTool;
pub use builtin::read_file::ReadFileTool;
pub use builtin::search_files::SearchFilesTool;
pub use builtin::switch_mode::SwitchModeTool;
pub use builtin::update_todo::UpdateTodoTool;
pub use builtin::write_file::WriteFileTool;
