/// Persisted notification endpoints
///
/// The notifications table is the authoritative record of what happened;
/// live WebSocket toasts are only an enhancement. A user who was offline
/// when a task was assigned sees the row here on their next load.
///
/// # Endpoints
///
/// - `GET /v1/notifications` - All notifications for the caller
/// - `GET /v1/notifications/unread` - Unread count + list
/// - `PUT /v1/notifications/:id/read` - Mark one notification read (idempotent)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use synergysphere_shared::{
    auth::middleware::AuthContext,
    models::notification::Notification,
};
use uuid::Uuid;

/// Unread notifications response
#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    /// Number of unread notifications
    pub count: i64,

    /// The unread notifications, newest first
    pub notifications: Vec<Notification>,
}

/// Lists all notifications for the caller, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = Notification::list_by_user(&state.db, auth.user_id).await?;
    Ok(Json(notifications))
}

/// Lists unread notifications with their count
pub async fn list_unread(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UnreadResponse>> {
    let notifications = Notification::list_unread(&state.db, auth.user_id).await?;
    let count = notifications.len() as i64;

    Ok(Json(UnreadResponse {
        count,
        notifications,
    }))
}

/// Marks a notification as read
///
/// Idempotent: marking twice yields the same persisted state as marking
/// once. Only the owner may mark their notification.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = Notification::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    if notification.user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You cannot mark another user's notification".to_string(),
        ));
    }

    let notification = Notification::mark_read(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}
