/// Calendar event model and database operations
///
/// Events are created by a user and may optionally be tied to a project
/// and/or a task. Project-associated events are visible to all project
/// members; standalone events only to their creator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Display color for calendar events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_color", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    Sky,
    Amber,
    Violet,
    Rose,
    Emerald,
    Orange,
}

/// Calendar event model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    /// Unique event ID
    pub id: Uuid,

    /// Event title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Start timestamp
    pub start_at: DateTime<Utc>,

    /// End timestamp
    pub end_at: DateTime<Utc>,

    /// Whether the event spans the whole day
    pub all_day: bool,

    /// Display color
    pub color: EventColor,

    /// Optional location
    pub location: Option<String>,

    /// Associated project (optional)
    pub project_id: Option<Uuid>,

    /// Associated task (optional)
    pub task_id: Option<Uuid>,

    /// Creator
    pub created_by: Uuid,

    /// When the event was created
    pub created_at: DateTime<Utc>,

    /// When the event was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: Option<bool>,
    pub color: Option<EventColor>,
    pub location: Option<String>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// Input for updating an event; only non-None fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub color: Option<EventColor>,
    pub location: Option<String>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

impl Event {
    /// Creates a new event
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, start_at, end_at, all_day, color,
                                location, project_id, task_id, created_by)
            VALUES ($1, $2, $3, $4, COALESCE($5, FALSE), COALESCE($6, 'sky'),
                    $7, $8, $9, $10)
            RETURNING id, title, description, start_at, end_at, all_day, color,
                      location, project_id, task_id, created_by, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.start_at)
        .bind(data.end_at)
        .bind(data.all_day)
        .bind(data.color)
        .bind(data.location)
        .bind(data.project_id)
        .bind(data.task_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(event)
    }

    /// Finds an event by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, start_at, end_at, all_day, color,
                   location, project_id, task_id, created_by, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(event)
    }

    /// Lists events visible to the user: their own, plus events in their projects
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT DISTINCT e.id, e.title, e.description, e.start_at, e.end_at, e.all_day,
                   e.color, e.location, e.project_id, e.task_id, e.created_by,
                   e.created_at, e.updated_at
            FROM events e
            LEFT JOIN project_members pm ON pm.project_id = e.project_id
            WHERE e.created_by = $1 OR pm.user_id = $1
            ORDER BY e.start_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// Lists visible events starting within [start, end], ascending
    pub async fn list_in_range(
        pool: &PgPool,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT DISTINCT e.id, e.title, e.description, e.start_at, e.end_at, e.all_day,
                   e.color, e.location, e.project_id, e.task_id, e.created_by,
                   e.created_at, e.updated_at
            FROM events e
            LEFT JOIN project_members pm ON pm.project_id = e.project_id
            WHERE (e.created_by = $1 OR pm.user_id = $1)
              AND e.start_at >= $2 AND e.start_at <= $3
            ORDER BY e.start_at ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// Updates an event; only the provided fields change
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateEvent,
    ) -> Result<Option<Self>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_at = COALESCE($4, start_at),
                end_at = COALESCE($5, end_at),
                all_day = COALESCE($6, all_day),
                color = COALESCE($7, color),
                location = COALESCE($8, location),
                project_id = COALESCE($9, project_id),
                task_id = COALESCE($10, task_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, start_at, end_at, all_day, color,
                      location, project_id, task_id, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.start_at)
        .bind(data.end_at)
        .bind(data.all_day)
        .bind(data.color)
        .bind(data.location)
        .bind(data.project_id)
        .bind(data.task_id)
        .fetch_optional(pool)
        .await?;

        Ok(event)
    }

    /// Deletes an event
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_color_serde() {
        let json = serde_json::to_string(&EventColor::Emerald).unwrap();
        assert_eq!(json, "\"emerald\"");

        let parsed: EventColor = serde_json::from_str("\"rose\"").unwrap();
        assert_eq!(parsed, EventColor::Rose);
    }
}
