/// User directory endpoints
///
/// Exposes public profiles only; assignee pickers in the dashboard use
/// the directory to resolve names and avatars.
///
/// # Endpoints
///
/// - `GET /v1/users` - List all user profiles
/// - `GET /v1/users/me` - The authenticated user's profile

use crate::{app::AppState, error::{ApiError, ApiResult}};
use axum::{extract::State, Extension, Json};
use synergysphere_shared::{
    auth::middleware::AuthContext,
    models::user::{PublicUser, User},
};

/// Lists public profiles of all users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = User::list_profiles(&state.db).await?;
    Ok(Json(users))
}

/// Returns the authenticated user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicUser::from(user)))
}
