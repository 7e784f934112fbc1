/// Calendar event endpoints
///
/// Events may be standalone (visible to their creator) or tied to a project
/// (visible to all members). Creation into a project requires membership;
/// updating or deleting requires being the creator or a member of the
/// associated project.
///
/// # Endpoints
///
/// - `GET    /v1/events` - Events visible to the caller
/// - `POST   /v1/events` - Create event
/// - `GET    /v1/events/range?start=..&end=..` - Events in a time range
/// - `GET    /v1/events/deadlines/tasks` - Task deadlines for the calendar
/// - `GET    /v1/events/deadlines/projects` - Project deadlines for the calendar
/// - `GET    /v1/events/:id` - Get one event
/// - `PUT    /v1/events/:id` - Update event
/// - `DELETE /v1/events/:id` - Delete event

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synergysphere_shared::{
    auth::{authorization::require_member, middleware::AuthContext},
    models::{
        event::{CreateEvent, Event, EventColor, UpdateEvent},
        membership::ProjectMember,
        project::Project,
        task::Task,
    },
    realtime::ServerMessage,
};
use uuid::Uuid;
use validator::Validate;

/// Create event request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: Option<bool>,
    pub color: Option<EventColor>,
    pub location: Option<String>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Update event request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
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

/// Time-range query parameters
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Deletion acknowledgment
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Lists events visible to the caller
pub async fn list_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Event>>> {
    let events = Event::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(events))
}

/// Lists visible events starting within a time range
pub async fn list_events_in_range(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    if range.end < range.start {
        return Err(ApiError::BadRequest(
            "Range end must not precede start".to_string(),
        ));
    }

    let events = Event::list_in_range(&state.db, auth.user_id, range.start, range.end).await?;
    Ok(Json(events))
}

/// Lists task deadlines across the caller's projects
pub async fn list_task_deadlines(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_deadlines_for_user(&state.db, auth.user_id).await?;
    Ok(Json(tasks))
}

/// Lists project deadlines across the caller's projects
pub async fn list_project_deadlines(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_deadlines_for_user(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Gets one event
pub async fn get_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let event = Event::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    check_event_access(&state, &event, auth.user_id).await?;

    Ok(Json(event))
}

/// Creates an event
///
/// Association with a project requires membership of that project.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<Json<Event>> {
    req.validate()?;

    if req.end_at < req.start_at {
        return Err(ApiError::BadRequest(
            "Event end must not precede start".to_string(),
        ));
    }

    if let Some(project_id) = req.project_id {
        Project::find_by_id(&state.db, project_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
        require_member(&state.db, project_id, auth.user_id).await?;
    }

    let event = Event::create(
        &state.db,
        CreateEvent {
            title: req.title,
            description: req.description,
            start_at: req.start_at,
            end_at: req.end_at,
            all_day: req.all_day,
            color: req.color,
            location: req.location,
            project_id: req.project_id,
            task_id: req.task_id,
            created_by: auth.user_id,
        },
    )
    .await?;

    broadcast_event(&state, &event, auth.user_id, ServerMessage::event_created(&event)).await;

    Ok(Json(event))
}

/// Updates an event (creator or project member)
pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    req.validate()?;

    let existing = Event::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    check_event_access(&state, &existing, auth.user_id).await?;

    let event = Event::update(
        &state.db,
        id,
        UpdateEvent {
            title: req.title,
            description: req.description,
            start_at: req.start_at,
            end_at: req.end_at,
            all_day: req.all_day,
            color: req.color,
            location: req.location,
            project_id: req.project_id,
            task_id: req.task_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    broadcast_event(&state, &event, auth.user_id, ServerMessage::event_updated(&event)).await;

    Ok(Json(event))
}

/// Deletes an event (creator or project member)
///
/// The deletion broadcast only reaches the creator: the project association
/// is gone with the row, so members are not resolvable afterwards.
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let event = Event::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    check_event_access(&state, &event, auth.user_id).await?;

    Event::delete(&state.db, id).await?;

    state
        .notifier
        .notify_user(event.created_by, &ServerMessage::event_deleted(event.id));

    Ok(Json(DeleteResponse { success: true }))
}

/// Creator or member of the associated project
async fn check_event_access(
    state: &AppState,
    event: &Event,
    user_id: Uuid,
) -> Result<(), ApiError> {
    if event.created_by == user_id {
        return Ok(());
    }

    if let Some(project_id) = event.project_id {
        if ProjectMember::has_access(&state.db, project_id, user_id).await? {
            return Ok(());
        }
    }

    Err(ApiError::Forbidden(
        "You do not have access to this event".to_string(),
    ))
}

/// Pushes an event mutation to its creator and, when associated, the project
async fn broadcast_event(state: &AppState, event: &Event, actor: Uuid, message: ServerMessage) {
    state.notifier.notify_user(actor, &message);

    if let Some(project_id) = event.project_id {
        state.notifier.notify_project(project_id, &message).await;
    }
}
