/// Server→client message envelope for the WebSocket channel
///
/// Every live push is a JSON envelope of the form
/// `{ type, data, projectId?, taskId?, eventId?, notification? }`.
/// The `type` discriminator names the mutation that happened; `data` carries
/// the mutated entity (or `{ id }` for deletions); the optional id fields let
/// clients invalidate caches without parsing `data`; `notification` carries a
/// toast for the in-app notification dropdown.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::models::event::Event;
use crate::models::membership::ProjectMember;
use crate::models::project::Project;
use crate::models::task::Task;

/// Envelope discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    ProjectMemberAdded,
    ProjectMemberRemoved,
    EventCreated,
    EventUpdated,
    EventDeleted,
    Notification,
    /// Reply to the client's explicit authenticate handshake
    Authenticated,
}

/// Severity of a toast notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Toast payload shown by the browser's notification dropdown
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    /// Client-side dedup id
    pub id: String,

    /// Severity
    #[serde(rename = "type")]
    pub kind: ToastKind,

    /// Short title
    pub title: String,

    /// Message body
    pub message: String,

    /// Whether the toast dismisses itself
    pub auto_close: bool,

    /// Display duration in milliseconds
    pub duration: u64,
}

impl Toast {
    /// Generic info toast with the default 6 second display
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: ToastKind::Info,
            title: title.into(),
            message: message.into(),
            auto_close: true,
            duration: 6000,
        }
    }

    /// Toast for a first-time task assignment
    pub fn task_assigned(task_title: &str, project_name: &str) -> Self {
        let mut toast = Self::info(
            "New Task Assigned",
            format!(
                "You have been assigned to \"{}\" in {}",
                task_title, project_name
            ),
        );
        toast.duration = 8000;
        toast
    }

    /// Toast for a task reassigned to a new user
    pub fn task_reassigned(task_title: &str, project_name: &str) -> Self {
        let mut toast = Self::info(
            "Task Reassigned",
            format!(
                "\"{}\" has been reassigned to you in {}",
                task_title, project_name
            ),
        );
        toast.duration = 8000;
        toast
    }

    /// Toast for a completed task, shown to the task's creator
    pub fn task_completed(task_title: &str) -> Self {
        Self::info(
            "Task Completed",
            format!("\"{}\" has been completed", task_title),
        )
    }
}

/// The server→client JSON envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    /// Mutation discriminator
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Mutated entity, or `{ id }` for deletions
    pub data: JsonValue,

    /// Project the mutation belongs to, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,

    /// Task the mutation belongs to, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,

    /// Calendar event the mutation belongs to, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,

    /// Toast payload, only on `notification` envelopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Toast>,
}

impl ServerMessage {
    fn new(kind: MessageKind, data: JsonValue) -> Self {
        Self {
            kind,
            data,
            project_id: None,
            task_id: None,
            event_id: None,
            notification: None,
        }
    }

    pub fn project_created(project: &Project) -> Self {
        let mut msg = Self::new(
            MessageKind::ProjectCreated,
            serde_json::to_value(project).unwrap_or_default(),
        );
        msg.project_id = Some(project.id);
        msg
    }

    pub fn project_updated(project: &Project) -> Self {
        let mut msg = Self::new(
            MessageKind::ProjectUpdated,
            serde_json::to_value(project).unwrap_or_default(),
        );
        msg.project_id = Some(project.id);
        msg
    }

    pub fn project_deleted(project_id: Uuid) -> Self {
        let mut msg = Self::new(MessageKind::ProjectDeleted, json!({ "id": project_id }));
        msg.project_id = Some(project_id);
        msg
    }

    pub fn task_created(task: &Task) -> Self {
        let mut msg = Self::new(
            MessageKind::TaskCreated,
            serde_json::to_value(task).unwrap_or_default(),
        );
        msg.project_id = Some(task.project_id);
        msg.task_id = Some(task.id);
        msg
    }

    pub fn task_updated(task: &Task) -> Self {
        let mut msg = Self::new(
            MessageKind::TaskUpdated,
            serde_json::to_value(task).unwrap_or_default(),
        );
        msg.project_id = Some(task.project_id);
        msg.task_id = Some(task.id);
        msg
    }

    pub fn task_deleted(task_id: Uuid, project_id: Uuid) -> Self {
        let mut msg = Self::new(MessageKind::TaskDeleted, json!({ "id": task_id }));
        msg.project_id = Some(project_id);
        msg.task_id = Some(task_id);
        msg
    }

    pub fn member_added(project_id: Uuid, member: &ProjectMember) -> Self {
        let mut msg = Self::new(
            MessageKind::ProjectMemberAdded,
            serde_json::to_value(member).unwrap_or_default(),
        );
        msg.project_id = Some(project_id);
        msg
    }

    pub fn member_removed(project_id: Uuid, user_id: Uuid) -> Self {
        let mut msg = Self::new(MessageKind::ProjectMemberRemoved, json!({ "id": user_id }));
        msg.project_id = Some(project_id);
        msg
    }

    pub fn event_created(event: &Event) -> Self {
        let mut msg = Self::new(
            MessageKind::EventCreated,
            serde_json::to_value(event).unwrap_or_default(),
        );
        msg.event_id = Some(event.id);
        msg.project_id = event.project_id;
        msg
    }

    pub fn event_updated(event: &Event) -> Self {
        let mut msg = Self::new(
            MessageKind::EventUpdated,
            serde_json::to_value(event).unwrap_or_default(),
        );
        msg.event_id = Some(event.id);
        msg.project_id = event.project_id;
        msg
    }

    pub fn event_deleted(event_id: Uuid) -> Self {
        let mut msg = Self::new(MessageKind::EventDeleted, json!({ "id": event_id }));
        msg.event_id = Some(event_id);
        msg
    }

    /// Toast-only envelope
    pub fn notification(toast: Toast) -> Self {
        let mut msg = Self::new(MessageKind::Notification, json!({ "id": toast.id }));
        msg.notification = Some(toast);
        msg
    }

    /// Handshake acknowledgment
    pub fn authenticated(user_id: Uuid) -> Self {
        Self::new(MessageKind::Authenticated, json!({ "userId": user_id }))
    }
}
