//! Push-channel payloads shared by the polling task and the HTTP layer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportEventKind {
    /// Per-show progress inside a run.
    ImportProgress,
    /// Run-level lifecycle.
    ImportStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Started,
    Running,
    Completed,
    Error,
}

/// `{ type, showId?, status, message?, timestamp }`, timestamp in epoch millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEvent {
    #[serde(rename = "type")]
    pub kind: ImportEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_id: Option<i64>,
    pub status: ImportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: i64,
}

impl ImportEvent {
    pub fn status(status: ImportStatus, message: Option<String>) -> Self {
        Self {
            kind: ImportEventKind::ImportStatus,
            show_id: None,
            status,
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn progress(show_id: i64, status: ImportStatus, message: Option<String>) -> Self {
        Self {
            kind: ImportEventKind::ImportProgress,
            show_id: Some(show_id),
            status,
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// SSE event name; matches the `type` field.
    pub fn event_name(&self) -> &'static str {
        match self.kind {
            ImportEventKind::ImportProgress => "import_progress",
            ImportEventKind::ImportStatus => "import_status",
        }
    }
}
