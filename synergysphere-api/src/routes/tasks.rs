/// Task endpoints
///
/// CRUD for tasks plus the notification side effects: assignment and
/// completion changes persist a Notification row first, then attempt the
/// live push. The two paths are not transactionally linked; the row is the
/// durable record and the push is best-effort.
///
/// An assignee who is not yet a member of the task's project is auto-added
/// as a member; that repair never fails the task mutation itself.
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - All tasks of the caller's projects
/// - `POST   /v1/tasks` - Create task
/// - `GET    /v1/tasks/mine` - Tasks assigned to the caller
/// - `GET    /v1/tasks/:id` - Get one task
/// - `PUT    /v1/tasks/:id` - Update task
/// - `DELETE /v1/tasks/:id` - Delete task
/// - `GET    /v1/projects/:id/tasks` - Tasks of one project

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use synergysphere_shared::{
    auth::{authorization::require_member, middleware::AuthContext},
    models::{
        membership::ProjectMember,
        notification::{CreateNotification, Notification, NotificationKind},
        project::{Priority, Project},
        task::{CreateTask, Task, TaskStatus, UpdateTask},
    },
    realtime::{ServerMessage, Toast},
};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub deadline: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub deadline: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

/// Deletion acknowledgment
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Lists all tasks in projects the caller belongs to
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(tasks))
}

/// Lists tasks assigned to the caller
pub async fn list_my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_assigned_to(&state.db, auth.user_id).await?;
    Ok(Json(tasks))
}

/// Lists tasks of one project
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_member(&state.db, project_id, auth.user_id).await?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;
    Ok(Json(tasks))
}

/// Gets one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_member(&state.db, task.project_id, auth.user_id).await?;

    Ok(Json(task))
}

/// Creates a task
///
/// When the task is assigned to someone other than the creator, the assignee
/// gets a persisted notification plus a live toast.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let project = Project::find_by_id(&state.db, req.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_member(&state.db, req.project_id, auth.user_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: req.project_id,
            assignee_id: req.assignee_id,
            created_by: Some(auth.user_id),
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            deadline: req.deadline,
            tags: req.tags,
        },
    )
    .await?;

    if let Some(assignee_id) = task.assignee_id {
        if assignee_id != auth.user_id {
            ensure_assignee_membership(&state, task.project_id, assignee_id).await;
        }
    }

    state
        .notifier
        .notify_project(task.project_id, &ServerMessage::task_created(&task))
        .await;

    if let Some(assignee_id) = task.assignee_id {
        if assignee_id != auth.user_id {
            notify_assignment(
                &state,
                assignee_id,
                &task,
                Toast::task_assigned(&task.title, &project.name),
            )
            .await?;
        }
    }

    Ok(Json(task))
}

/// Updates a task
///
/// Side effects:
/// - A changed assignee (other than the actor) gets an assignment or
///   reassignment notification, and is auto-added as a project member.
/// - A transition into `completed` notifies the task's creator, unless the
///   creator is the assignee.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let existing = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_member(&state.db, existing.project_id, auth.user_id).await?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            assignee_id: req.assignee_id,
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            deadline: req.deadline,
            tags: req.tags,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if let Some(assignee_id) = req.assignee_id {
        if assignee_id != auth.user_id {
            ensure_assignee_membership(&state, task.project_id, assignee_id).await;
        }
    }

    state
        .notifier
        .notify_project(task.project_id, &ServerMessage::task_updated(&task))
        .await;

    // Assignment / reassignment notification
    if let Some(assignee_id) = req.assignee_id {
        if assignee_id != auth.user_id && Some(assignee_id) != existing.assignee_id {
            let project = Project::find_by_id(&state.db, task.project_id).await?;
            let project_name = project.map(|p| p.name).unwrap_or_else(|| "a project".to_string());

            let toast = if existing.assignee_id.is_some() {
                Toast::task_reassigned(&task.title, &project_name)
            } else {
                Toast::task_assigned(&task.title, &project_name)
            };

            notify_assignment(&state, assignee_id, &task, toast).await?;
        }
    }

    // Completion notification to the creator
    if task.status == TaskStatus::Completed && existing.status != TaskStatus::Completed {
        if let Some(creator_id) = existing.created_by {
            if existing.created_by != existing.assignee_id {
                let toast = Toast::task_completed(&task.title);
                Notification::create(
                    &state.db,
                    CreateNotification {
                        user_id: creator_id,
                        kind: NotificationKind::TaskCompleted,
                        title: toast.title.clone(),
                        message: toast.message.clone(),
                        data: json!({ "taskId": task.id, "projectId": task.project_id }),
                    },
                )
                .await?;

                state
                    .notifier
                    .notify_user(creator_id, &ServerMessage::notification(toast));
            }
        }
    }

    Ok(Json(task))
}

/// Deletes a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_member(&state.db, task.project_id, auth.user_id).await?;

    Task::delete(&state.db, id).await?;

    state
        .notifier
        .notify_project(
            task.project_id,
            &ServerMessage::task_deleted(task.id, task.project_id),
        )
        .await;

    Ok(Json(DeleteResponse { success: true }))
}

/// Auto-adds an assignee as a project member if missing
///
/// The membership repair must never fail the task mutation itself, so
/// failures are logged and swallowed.
async fn ensure_assignee_membership(state: &AppState, project_id: Uuid, assignee_id: Uuid) {
    match ProjectMember::ensure_member(&state.db, project_id, assignee_id).await {
        Ok(true) => {
            tracing::debug!(%project_id, %assignee_id, "Added task assignee as project member");
        }
        Ok(false) => {}
        Err(e) => {
            warn!(%project_id, %assignee_id, error = %e,
                "Failed to add task assignee as project member");
        }
    }
}

/// Persists an assignment notification, then attempts the live toast
///
/// The row is written first; a crash between the write and the push loses
/// only the push. The assignee sees the row on their next fetch either way.
async fn notify_assignment(
    state: &AppState,
    assignee_id: Uuid,
    task: &Task,
    toast: Toast,
) -> Result<(), ApiError> {
    Notification::create(
        &state.db,
        CreateNotification {
            user_id: assignee_id,
            kind: NotificationKind::TaskAssigned,
            title: toast.title.clone(),
            message: toast.message.clone(),
            data: json!({ "taskId": task.id, "projectId": task.project_id }),
        },
    )
    .await?;

    state
        .notifier
        .notify_user(assignee_id, &ServerMessage::notification(toast));

    Ok(())
}
