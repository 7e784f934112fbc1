/// Project endpoints
///
/// CRUD for projects plus member management. Every mutation performs the
/// authorization check first, then the persistence write, then fires a
/// best-effort live broadcast. Broadcast outcomes are intentionally ignored:
/// the persisted state is authoritative and the client re-synchronizes on its
/// next fetch.
///
/// # Endpoints
///
/// - `GET    /v1/projects` - Projects the caller is a member of
/// - `POST   /v1/projects` - Create project (caller becomes owner + manager)
/// - `GET    /v1/projects/:id` - Get one project
/// - `PUT    /v1/projects/:id` - Update (any member)
/// - `DELETE /v1/projects/:id` - Delete (owner only)
/// - `POST   /v1/projects/:id/members` - Add member (owner/manager)
/// - `DELETE /v1/projects/:id/members/:user_id` - Remove member (owner/manager)

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
use synergysphere_shared::{
    auth::{
        authorization::{require_member, require_role, AuthzError},
        middleware::AuthContext,
    },
    models::{
        membership::{CreateProjectMember, ProjectMember, ProjectRole},
        project::{CreateProject, Priority, Project, ProjectStatus, UpdateProject},
    },
    realtime::ServerMessage,
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

/// Update project request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<ProjectStatus>,
    pub deadline: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub manager_id: Option<Uuid>,
}

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,

    /// Role to grant; owners can only be created through project creation
    #[serde(default = "default_member_role")]
    pub role: ProjectRole,
}

fn default_member_role() -> ProjectRole {
    ProjectRole::Member
}

/// Deletion acknowledgment
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Lists projects the caller is a member of
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Creates a project; the caller becomes the owner member and initial manager
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            priority: req.priority,
            deadline: req.deadline,
            tags: req.tags,
            manager_id: Some(auth.user_id),
        },
    )
    .await?;

    ProjectMember::create(
        &state.db,
        CreateProjectMember {
            project_id: project.id,
            user_id: auth.user_id,
            role: ProjectRole::Owner,
        },
    )
    .await?;

    // The creator is the only member so far; push to them directly.
    state
        .notifier
        .notify_user(auth.user_id, &ServerMessage::project_created(&project));

    Ok(Json(project))
}

/// Gets one project
///
/// Returns 404 when the project does not exist and 403 when the caller is
/// not a member, keeping the two conditions distinguishable.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_member(&state.db, id, auth.user_id).await?;

    Ok(Json(project))
}

/// Updates a project (any member)
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_member(&state.db, id, auth.user_id).await?;

    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
            priority: req.priority,
            status: req.status,
            deadline: req.deadline,
            tags: req.tags,
            manager_id: req.manager_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    state
        .notifier
        .notify_project(project.id, &ServerMessage::project_updated(&project))
        .await;

    Ok(Json(project))
}

/// Deletes a project (owner only)
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    match require_role(&state.db, id, auth.user_id, ProjectRole::Owner).await {
        Ok(_) => {}
        Err(AuthzError::DatabaseError(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ApiError::Forbidden(
                "Only project owners can delete projects".to_string(),
            ))
        }
    }

    // Membership rows cascade away with the project; snapshot the recipient
    // set first so the deletion broadcast still reaches them.
    let members = ProjectMember::list_user_ids(&state.db, id).await?;

    Project::delete(&state.db, id).await?;

    state
        .notifier
        .notify_users(&members, &ServerMessage::project_deleted(id));

    Ok(Json(DeleteResponse { success: true }))
}

/// Adds a member to a project (owner/manager)
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<ProjectMember>> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_role(&state.db, id, auth.user_id, ProjectRole::Manager).await?;

    if req.role == ProjectRole::Owner {
        return Err(ApiError::BadRequest(
            "Ownership is granted at project creation and cannot be assigned".to_string(),
        ));
    }

    let member = ProjectMember::create(
        &state.db,
        CreateProjectMember {
            project_id: id,
            user_id: req.user_id,
            role: req.role,
        },
    )
    .await?;

    let message = ServerMessage::member_added(id, &member);
    state.notifier.notify_user(member.user_id, &message);
    state.notifier.notify_project(id, &message).await;

    Ok(Json(member))
}

/// Removes a member from a project (owner/manager)
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<DeleteResponse>> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_role(&state.db, id, auth.user_id, ProjectRole::Manager).await?;

    let removed = ProjectMember::delete(&state.db, id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    // The removed user no longer resolves through the project, so push to
    // them directly in addition to the remaining members.
    let message = ServerMessage::member_removed(id, user_id);
    state.notifier.notify_user(user_id, &message);
    state.notifier.notify_project(id, &message).await;

    Ok(Json(DeleteResponse { success: true }))
}
