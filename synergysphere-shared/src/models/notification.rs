/// Persisted notification model and database operations
///
/// A notification row is the durable record of an event for a user,
/// written independently of whether a live push ever reached a socket.
/// The notifications list endpoint is the authoritative source; the
/// WebSocket push is an optional enhancement on top.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_kind AS ENUM ('task_assigned', 'task_completed', 'project_updated');
///
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     kind notification_kind NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     message TEXT NOT NULL,
///     data JSONB NOT NULL DEFAULT '{}',
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of persisted notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned or reassigned to the user
    TaskAssigned,

    /// A task the user created was completed
    TaskCompleted,

    /// A project the user belongs to was updated
    ProjectUpdated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::TaskCompleted => "task_completed",
            NotificationKind::ProjectUpdated => "project_updated",
        }
    }
}

/// Persisted notification row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    /// Notification kind
    pub kind: NotificationKind,

    /// Short title
    pub title: String,

    /// Human-readable message
    pub message: String,

    /// Structured payload (task/project references)
    pub data: JsonValue,

    /// Whether the user has read the notification
    pub read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: JsonValue,
}

impl Notification {
    /// Creates a persisted notification
    ///
    /// Written before any live push so the durable record survives a crash
    /// between the two; the paths are deliberately not transactional.
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, kind, title, message, data, read, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.kind)
        .bind(data.title)
        .bind(data.message)
        .bind(data.data)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Finds a notification by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, message, data, read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Lists all notifications for a user, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, message, data, read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Lists unread notifications for a user, newest first
    pub async fn list_unread(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, message, data, read, created_at
            FROM notifications
            WHERE user_id = $1 AND read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Counts unread notifications for a user
    pub async fn count_unread(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Marks a notification as read
    ///
    /// Idempotent: marking an already-read notification leaves the row
    /// unchanged and still returns it. Returns None if the row doesn't exist.
    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1
            RETURNING id, user_id, kind, title, message, data, read, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_as_str() {
        assert_eq!(NotificationKind::TaskAssigned.as_str(), "task_assigned");
        assert_eq!(NotificationKind::TaskCompleted.as_str(), "task_completed");
        assert_eq!(NotificationKind::ProjectUpdated.as_str(), "project_updated");
    }

    #[test]
    fn test_notification_kind_serde() {
        let json = serde_json::to_string(&NotificationKind::TaskAssigned).unwrap();
        assert_eq!(json, "\"task_assigned\"");
    }
}
