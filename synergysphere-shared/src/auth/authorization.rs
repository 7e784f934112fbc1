/// Authorization helpers and permission checks
///
/// This module provides utilities for role-based access control within
/// projects.
///
/// # Permission Model
///
/// 1. **Project Membership**: User must be a member of the project
/// 2. **Role-Based Permissions**: Defined by ProjectRole (Owner, Manager, Member)
///
/// # Example
///
/// ```no_run
/// use synergysphere_shared::auth::authorization::{require_member, require_role};
/// use synergysphere_shared::models::membership::ProjectRole;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Any member may read and mutate tasks
/// require_member(pool, project_id, user_id).await?;
///
/// // Only owners and managers may manage the member list
/// require_role(pool, project_id, user_id, ProjectRole::Manager).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{ProjectMember, ProjectRole};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// User doesn't have required role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: ProjectRole,
        actual: ProjectRole,
    },

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks that a user is a member of a project (any role)
///
/// # Errors
///
/// Returns `AuthzError::NotMember` if the user has no membership row
pub async fn require_member(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectMember, AuthzError> {
    ProjectMember::find(pool, project_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(project_id))
}

/// Checks that a user holds at least `required_role` in a project
///
/// Role hierarchy: Owner > Manager > Member.
///
/// # Errors
///
/// Returns error if the user is not a member or the role is insufficient
pub async fn require_role(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    required_role: ProjectRole,
) -> Result<ProjectMember, AuthzError> {
    let membership = require_member(pool, project_id, user_id).await?;

    if !membership.role.has_permission(required_role) {
        return Err(AuthzError::InsufficientRole {
            required: required_role,
            actual: membership.role,
        });
    }

    Ok(membership)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authz_error_display() {
        let id = Uuid::new_v4();
        let err = AuthzError::NotMember(id);
        assert_eq!(err.to_string(), format!("Not a member of project {}", id));

        let err = AuthzError::InsufficientRole {
            required: ProjectRole::Owner,
            actual: ProjectRole::Member,
        };
        assert!(err.to_string().contains("Owner"));
        assert!(err.to_string().contains("Member"));
    }

    // Database-backed checks are covered by the API integration tests
}
