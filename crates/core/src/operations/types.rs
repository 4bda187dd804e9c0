//! Operation records and status events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Correlation id of one trigger run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What started an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Manual save-as-file.
    SaveAsFile,
    /// Manual add-version.
    AddVersion,
    /// A viewer header button.
    HeaderAction { id: String },
}

impl Trigger {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Trigger::SaveAsFile => "save_as_file",
            Trigger::AddVersion => "add_version",
            Trigger::HeaderAction { .. } => "header_action",
        }
    }
}

/// Lifecycle state of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OperationStatus {
    Running,
    Succeeded { detail: String },
    Failed { error: String },
    Cancelled,
}

impl OperationStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, OperationStatus::Running)
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            OperationStatus::Running => "running",
            OperationStatus::Succeeded { .. } => "succeeded",
            OperationStatus::Failed { .. } => "failed",
            OperationStatus::Cancelled => "cancelled",
        }
    }
}

/// One trigger run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub trigger: Trigger,
    pub status: OperationStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Broadcast on the status channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OperationEvent {
    Started { operation: Operation },
    Finished { operation: Operation },
}

impl OperationEvent {
    pub fn operation(&self) -> &Operation {
        match self {
            OperationEvent::Started { operation } | OperationEvent::Finished { operation } => {
                operation
            }
        }
    }
}

/// Result of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The operation was running and has been signalled.
    Requested,
    /// The operation had already finished.
    AlreadyFinished,
    /// No such operation in the history.
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_parses_its_display() {
        let id = OperationId::new();
        let parsed: OperationId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<OperationId>().is_err());
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = OperationEvent::Finished {
            operation: Operation {
                id: OperationId::new(),
                trigger: Trigger::HeaderAction {
                    id: "export-annotations".into(),
                },
                status: OperationStatus::Failed {
                    error: "boom".into(),
                },
                started_at: Utc::now(),
                finished_at: Some(Utc::now()),
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "finished");
        assert_eq!(json["operation"]["trigger"]["type"], "header_action");
        assert_eq!(json["operation"]["trigger"]["id"], "export-annotations");
        assert_eq!(json["operation"]["status"]["state"], "failed");
        assert_eq!(json["operation"]["status"]["error"], "boom");
    }

    #[test]
    fn test_running_omits_finished_at() {
        let op = Operation {
            id: OperationId::new(),
            trigger: Trigger::SaveAsFile,
            status: OperationStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert!(json.get("finished_at").is_none());
        assert!(!op.status.is_finished());
    }
}
