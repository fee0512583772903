// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use tracing::debug;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::tool::{Tool, ToolOutput};

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_to_file"
    }

    fn description(&self) -> &str {
        "Write full content to a file, creating it (and any missing parent \
         directories) if needed and replacing what was there. Always provide \
         the COMPLETE intended content — no truncation, no placeholders. For \
         targeted edits to an existing file prefer apply_diff."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("write_to_file")
            .required("path", "File path here")
            .required("content", "Full file content here")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(path) = call.param("path") else {
            return ToolOutput::err("missing required parameter 'path'");
        };
        let Some(content) = call.param("content") else {
            return ToolOutput::err("missing required parameter 'content'");
        };

        debug!(path = %path, bytes = content.len(), "write_to_file tool");

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return ToolOutput::err(format!("cannot create {}: {e}", parent.display()));
                }
            }
        }

        match tokio::fs::write(path, content).await {
            Ok(()) => ToolOutput::ok(format!("Wrote {} bytes to {path}", content.len())),
            Err(e) => ToolOutput::err(format!("write error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn call(pairs: &[(&str, &str)]) -> ToolCall {
        let params: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ToolCall { name: "write_to_file".into(), params }
    }

    #[tokio::test]
    async fn writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let out = WriteFileTool
            .execute(&call(&[("path", path.to_str().unwrap()), ("content", "hello")]))
            .await;
        assert!(!out.is_error, "{}", out.content);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        let out = WriteFileTool
            .execute(&call(&[("path", path.to_str().unwrap()), ("content", "deep")]))
            .await;
        assert!(!out.is_error);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "deep");
    }

    #[tokio::test]
    async fn overwrites_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "old").unwrap();
        WriteFileTool
            .execute(&call(&[("path", path.to_str().unwrap()), ("content", "new")]))
            .await;
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[tokio::test]
    async fn missing_content_is_error() {
        let out = WriteFileTool.execute(&call(&[("path", "/tmp/x.txt")])).await;
        assert!(out.is_error);
        assert!(out.content.contains("'content'"));
    }
}
